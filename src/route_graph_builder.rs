// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::config::RouteGraphConfig;
use crate::error::{RouteGraphError, StoreError};
use crate::models::{GraphNode, Route, RouteGraphLink};
use crate::polyline_projector::project_on_polyline;
use crate::route_geometry::polyline_from_geojson;
use crate::route_locks::RouteLocks;
use crate::store::RouteGraphStore;
use ahash::AHashSet;
use geo::Point;
use std::sync::Arc;
use tracing::debug;

/// Writes refused because the route was edited mid-build are retried this many times.
const MAX_WRITE_ATTEMPTS: usize = 3;

struct Candidate<'a> {
    node_id: &'a str,
    cum_dist: f64,
}

/// Links every node within `threshold_m` of the polyline, in order along it.
///
/// Nodes are sorted by distance from the route's start, then duplicate node ids
/// are dropped keeping the first one in that order. The sort is stable so nodes
/// at the same distance keep their input order.
pub fn match_nodes_to_route(
    route_id: &str,
    coords: &[Point<f64>],
    nodes: &[GraphNode],
    threshold_m: f64,
) -> Vec<RouteGraphLink> {
    let mut candidates: Vec<Candidate> = nodes
        .iter()
        .filter_map(|node| {
            let projection = project_on_polyline(coords, node.position())?;

            // NaN distances fail this comparison and are dropped
            (projection.distance <= threshold_m).then_some(Candidate {
                node_id: node.id.as_str(),
                cum_dist: projection.cum_dist,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.cum_dist.total_cmp(&b.cum_dist));

    let mut seen: AHashSet<&str> = AHashSet::new();

    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.node_id))
        .enumerate()
        .map(|(i, candidate)| RouteGraphLink {
            route_id: route_id.to_string(),
            node_id: candidate.node_id.to_string(),
            order_index: i as i32 + 1,
            distance_from_start: candidate.cum_dist.round() as i32,
        })
        .collect()
}

/// Produces and persists the canonical link set of a route.
pub struct RouteGraphBuilder<S> {
    store: Arc<S>,
    locks: RouteLocks,
    config: RouteGraphConfig,
}

impl<S: RouteGraphStore> RouteGraphBuilder<S> {
    pub fn new(store: Arc<S>, config: RouteGraphConfig) -> Self {
        Self {
            store,
            locks: RouteLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &RouteGraphConfig {
        &self.config
    }

    /// Computes the link set without writing it.
    pub fn compute_links(
        &self,
        route: &Route,
        nodes: &[GraphNode],
    ) -> Result<Vec<RouteGraphLink>, RouteGraphError> {
        let coords = route_polyline(route)?;

        Ok(match_nodes_to_route(
            &route.id,
            &coords,
            nodes,
            self.config.proximity_threshold_m,
        ))
    }

    /// Re-reads the route, recomputes its links and replaces the stored set.
    /// Returns the number of links written.
    ///
    /// Bad geometry is reported before the node table is loaded.
    pub async fn rebuild(&self, route_id: &str) -> Result<usize, RouteGraphError> {
        self.rebuild_route(route_id, None).await
    }

    /// Same as [`Self::rebuild`] with an already loaded node set.
    pub async fn rebuild_with_nodes(
        &self,
        route_id: &str,
        nodes: &[GraphNode],
    ) -> Result<usize, RouteGraphError> {
        self.rebuild_route(route_id, Some(nodes)).await
    }

    async fn rebuild_route(
        &self,
        route_id: &str,
        nodes: Option<&[GraphNode]>,
    ) -> Result<usize, RouteGraphError> {
        // held from reading the route until its links are written
        let route_guard = self.locks.lock(route_id).await;

        let result = self.rebuild_locked(route_id, nodes).await;

        drop(route_guard);
        self.locks.prune();

        result
    }

    async fn rebuild_locked(
        &self,
        route_id: &str,
        nodes: Option<&[GraphNode]>,
    ) -> Result<usize, RouteGraphError> {
        let mut route = self.fetch_eligible_route(route_id).await?;
        route_polyline(&route)?;

        let loaded_nodes;
        let nodes = match nodes {
            Some(nodes) => nodes,
            None => {
                loaded_nodes = self.store.fetch_nodes().await?;
                &loaded_nodes
            }
        };

        let mut attempt = 1;

        loop {
            let links = self.compute_links(&route, nodes)?;
            let count = links.len();

            let written = self
                .store
                .replace_links(route_id, route.geometry.as_ref(), links)
                .await;

            match written {
                Ok(()) => {
                    debug!(route_id = %route_id, count, "replaced route graph links");
                    return Ok(count);
                }
                Err(StoreError::GeometryChanged(_)) if attempt < MAX_WRITE_ATTEMPTS => {
                    attempt += 1;
                    debug!(route_id = %route_id, attempt, "route geometry changed, recomputing");
                    route = self.fetch_eligible_route(route_id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn fetch_eligible_route(&self, route_id: &str) -> Result<Route, RouteGraphError> {
        let route = self
            .store
            .fetch_route(route_id)
            .await?
            .ok_or_else(|| RouteGraphError::RouteNotFound(route_id.to_string()))?;

        if !route.is_eligible() {
            return Err(RouteGraphError::RouteNotEligible(route.id));
        }

        Ok(route)
    }
}

fn route_polyline(route: &Route) -> Result<Vec<Point<f64>>, RouteGraphError> {
    polyline_from_geojson(route.geometry.as_ref()).map_err(|source| {
        RouteGraphError::InvalidGeometry {
            route_id: route.id.clone(),
            source,
        }
    })
}
