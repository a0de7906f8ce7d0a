// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::error::RouteGraphError;
use crate::route_graph_builder::RouteGraphBuilder;
use crate::store::RouteGraphStore;
use std::sync::Arc;
use tracing::info;

/// Rebuilds one route on demand, e.g. after its geometry was edited.
pub struct SingleRouteHandler<S> {
    builder: Arc<RouteGraphBuilder<S>>,
}

impl<S: RouteGraphStore> SingleRouteHandler<S> {
    pub fn new(builder: Arc<RouteGraphBuilder<S>>) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &Arc<RouteGraphBuilder<S>> {
        &self.builder
    }

    /// Returns the number of links written for the route.
    pub async fn handle(&self, route_id: Option<&str>) -> Result<usize, RouteGraphError> {
        let route_id = route_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(RouteGraphError::MissingRouteId)?;

        let count = self.builder.rebuild(route_id).await?;

        info!(route_id = %route_id, count, "rebuilt route graph");

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteGraphConfig;
    use crate::error::GeometryError;
    use crate::models::{GraphNode, Route};
    use crate::store::MemoryRouteGraphStore;
    use serde_json::json;

    fn fixture_store() -> MemoryRouteGraphStore {
        let routes = vec![
            Route {
                id: String::from("line-1"),
                geometry: Some(json!({
                    "type": "LineString",
                    "coordinates": [[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]]
                })),
                status: String::from("active"),
                deleted_at: None,
            },
            Route {
                id: String::from("shape-is-polygon"),
                geometry: Some(json!({
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                })),
                status: String::from("active"),
                deleted_at: None,
            },
            Route {
                id: String::from("old-line"),
                geometry: Some(json!({
                    "type": "LineString",
                    "coordinates": [[0.0, 0.0], [0.0, 1.0]]
                })),
                status: String::from("Deprecated"),
                deleted_at: None,
            },
        ];

        let nodes = vec![
            GraphNode {
                id: String::from("n1"),
                lat: 0.5,
                lon: 0.0001,
            },
            GraphNode {
                id: String::from("n2"),
                lat: 1.0,
                lon: 0.0,
            },
            GraphNode {
                id: String::from("off-route"),
                lat: 1.5,
                lon: 0.01,
            },
        ];

        MemoryRouteGraphStore::new(routes, nodes)
    }

    fn handler() -> SingleRouteHandler<MemoryRouteGraphStore> {
        SingleRouteHandler::new(Arc::new(RouteGraphBuilder::new(
            Arc::new(fixture_store()),
            RouteGraphConfig::default(),
        )))
    }

    #[tokio::test]
    async fn builds_requested_route() {
        let handler = handler();

        let count = handler.handle(Some("line-1")).await.unwrap();

        assert_eq!(count, 2);
        let links = handler.builder().store().links_for("line-1");
        assert_eq!(links[0].node_id, "n1");
        assert_eq!(links[1].node_id, "n2");
        // n2 sits on the middle vertex, one degree of latitude in
        assert_eq!(links[1].distance_from_start, 111_195);
    }

    #[tokio::test]
    async fn missing_or_blank_route_id() {
        let handler = handler();

        assert!(matches!(
            handler.handle(None).await,
            Err(RouteGraphError::MissingRouteId)
        ));
        assert!(matches!(
            handler.handle(Some("   ")).await,
            Err(RouteGraphError::MissingRouteId)
        ));
    }

    #[tokio::test]
    async fn unknown_route() {
        let err = handler().handle(Some("nope")).await.unwrap_err();

        assert!(matches!(err, RouteGraphError::RouteNotFound(ref id) if id == "nope"));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn non_linestring_route_is_an_input_error() {
        let handler = handler();

        let err = handler.handle(Some("shape-is-polygon")).await.unwrap_err();

        assert!(matches!(
            err,
            RouteGraphError::InvalidGeometry {
                source: GeometryError::NotLineString(_),
                ..
            }
        ));
        assert_eq!(handler.builder().store().replace_calls(), 0);
    }

    #[tokio::test]
    async fn deprecated_route_is_rejected() {
        let err = handler().handle(Some("old-line")).await.unwrap_err();

        assert!(matches!(err, RouteGraphError::RouteNotEligible(_)));
    }

    #[tokio::test]
    async fn node_source_outage_is_a_processing_error() {
        let handler = handler();
        handler.builder().store().set_fail_node_reads(true);

        let err = handler.handle(Some("line-1")).await.unwrap_err();

        assert!(!err.is_input_error());
        assert_eq!(handler.builder().store().replace_calls(), 0);
    }

    #[tokio::test]
    async fn edited_route_is_rebuilt_from_its_new_geometry() {
        let handler = handler();
        handler.handle(Some("line-1")).await.unwrap();

        handler.builder().store().set_route_geometry(
            "line-1",
            Some(json!({
                "type": "LineString",
                "coordinates": [[0.01, 1.0], [0.01, 2.0]]
            })),
        );
        let count = handler.handle(Some("line-1")).await.unwrap();

        assert_eq!(count, 1);
        let links = handler.builder().store().links_for("line-1");
        assert_eq!(links[0].node_id, "off-route");
        assert_eq!(links[0].order_index, 1);
    }
}
