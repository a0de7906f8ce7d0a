// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::error::StoreError;
use crate::models::{GraphNode, Route, RouteGraphLink};
use crate::store::RouteGraphStore;
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
struct MemoryState {
    routes: Vec<Route>,
    nodes: Vec<GraphNode>,
    links: AHashMap<String, Vec<RouteGraphLink>>,
}

/// In-process store for tests and local runs.
///
/// Failures can be injected to exercise error paths. An injected insert failure
/// happens after the delete, so the route is left without links.
#[derive(Default)]
pub struct MemoryRouteGraphStore {
    state: RwLock<MemoryState>,
    fail_node_reads: AtomicBool,
    fail_inserts_for: RwLock<AHashSet<String>>,
    replace_calls: AtomicUsize,
}

impl MemoryRouteGraphStore {
    pub fn new(routes: Vec<Route>, nodes: Vec<GraphNode>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                routes,
                nodes,
                links: AHashMap::new(),
            }),
            ..Default::default()
        }
    }

    pub fn set_links(&self, route_id: &str, links: Vec<RouteGraphLink>) {
        if let Ok(mut state) = self.state.write() {
            state.links.insert(route_id.to_string(), links);
        }
    }

    /// Edits a route's geometry in place, as an editor saving a new shape would.
    pub fn set_route_geometry(&self, route_id: &str, geometry: Option<Value>) {
        if let Ok(mut state) = self.state.write() {
            if let Some(route) = state.routes.iter_mut().find(|route| route.id == route_id) {
                route.geometry = geometry;
            }
        }
    }

    pub fn links_for(&self, route_id: &str) -> Vec<RouteGraphLink> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.links.get(route_id).cloned())
            .unwrap_or_default()
    }

    pub fn set_fail_node_reads(&self, fail: bool) {
        self.fail_node_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts_for(&self, route_id: &str) {
        if let Ok(mut failing) = self.fail_inserts_for.write() {
            failing.insert(route_id.to_string());
        }
    }

    /// How many times `replace_links` has been called.
    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable(String::from("memory store lock poisoned"))
    }
}

impl RouteGraphStore for MemoryRouteGraphStore {
    async fn fetch_active_routes(&self) -> Result<Vec<Route>, StoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;

        Ok(state
            .routes
            .iter()
            .filter(|route| route.is_eligible() && route.geometry.is_some())
            .cloned()
            .collect())
    }

    async fn fetch_route(&self, route_id: &str) -> Result<Option<Route>, StoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;

        Ok(state.routes.iter().find(|route| route.id == route_id).cloned())
    }

    async fn fetch_nodes(&self) -> Result<Vec<GraphNode>, StoreError> {
        if self.fail_node_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("node source unavailable")));
        }

        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.nodes.clone())
    }

    async fn replace_links(
        &self,
        route_id: &str,
        source_geometry: Option<&Value>,
        links: Vec<RouteGraphLink>,
    ) -> Result<(), StoreError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);

        let insert_fails = self
            .fail_inserts_for
            .read()
            .map_err(|_| Self::poisoned())?
            .contains(route_id);

        // delete and insert under one write guard
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        let current_geometry = state
            .routes
            .iter()
            .find(|route| route.id == route_id)
            .map(|route| route.geometry.as_ref());
        if current_geometry != Some(source_geometry) {
            return Err(StoreError::GeometryChanged(route_id.to_string()));
        }

        state.links.remove(route_id);

        if insert_fails {
            return Err(StoreError::Unavailable(format!(
                "insert into route_graph_links failed for {}",
                route_id
            )));
        }

        if !links.is_empty() {
            state.links.insert(route_id.to_string(), links);
        }

        Ok(())
    }

    async fn fetch_links(&self, route_id: &str) -> Result<Vec<RouteGraphLink>, StoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;

        let mut links = state.links.get(route_id).cloned().unwrap_or_default();
        links.sort_by_key(|link| link.order_index);
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryRouteGraphStore {
        MemoryRouteGraphStore::new(
            vec![Route {
                id: String::from("r"),
                geometry: Some(json!({
                    "type": "LineString",
                    "coordinates": [[0.0, 0.0], [0.0, 0.01]]
                })),
                status: String::from("active"),
                deleted_at: None,
            }],
            vec![],
        )
    }

    fn link(node_id: &str) -> RouteGraphLink {
        RouteGraphLink {
            route_id: String::from("r"),
            node_id: node_id.to_string(),
            order_index: 1,
            distance_from_start: 0,
        }
    }

    #[tokio::test]
    async fn replace_refuses_links_from_an_old_geometry() {
        let store = store();
        store.set_links("r", vec![link("current")]);
        let old_geometry = store.fetch_route("r").await.unwrap().unwrap().geometry;

        store.set_route_geometry(
            "r",
            Some(json!({"type": "LineString", "coordinates": [[1.0, 0.0], [1.0, 0.01]]})),
        );

        let err = store
            .replace_links("r", old_geometry.as_ref(), vec![link("stale")])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::GeometryChanged(ref id) if id == "r"));
        assert_eq!(store.links_for("r"), vec![link("current")]);
    }

    #[tokio::test]
    async fn replace_of_an_unknown_route_is_refused() {
        let store = store();
        let geometry = json!({"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 0.01]]});

        let err = store
            .replace_links("gone", Some(&geometry), vec![link("a")])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::GeometryChanged(_)));
        assert!(store.links_for("gone").is_empty());
    }
}
