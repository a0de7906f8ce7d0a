// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::error::RouteGraphError;
use crate::route_graph_builder::RouteGraphBuilder;
use crate::store::RouteGraphStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Compute and log link counts without writing anything.
    pub dry_run: bool,
    /// Restrict the run to these route ids. Empty means every eligible route.
    pub route_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    /// routes with missing or non-LineString geometry, or removed mid-run
    pub skipped: usize,
    pub failed: usize,
    pub links_written: usize,
}

/// Rebuilds the link set of every eligible route.
pub struct BatchRunner<S> {
    builder: Arc<RouteGraphBuilder<S>>,
}

impl<S: RouteGraphStore> BatchRunner<S> {
    pub fn new(builder: Arc<RouteGraphBuilder<S>>) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &Arc<RouteGraphBuilder<S>> {
        &self.builder
    }

    /// Routes and nodes are loaded once up front; failing to load them ends the run.
    /// After that a failing route is logged and counted, and the run moves on.
    /// Each route row is read again under its lock before its links are written.
    pub async fn run(&self, options: &BatchOptions) -> Result<BatchSummary, RouteGraphError> {
        let store = self.builder.store();

        let mut routes = store.fetch_active_routes().await?;
        if !options.route_ids.is_empty() {
            routes.retain(|route| options.route_ids.contains(&route.id));
        }

        let nodes = store.fetch_nodes().await?;

        info!(
            routes = routes.len(),
            nodes = nodes.len(),
            dry_run = options.dry_run,
            "starting route graph batch"
        );

        let mut summary = BatchSummary::default();

        for route in &routes {
            summary.processed += 1;

            let result = if options.dry_run {
                self.builder
                    .compute_links(route, &nodes)
                    .map(|links| links.len())
            } else {
                self.builder.rebuild_with_nodes(&route.id, &nodes).await
            };

            match result {
                Ok(count) => {
                    summary.succeeded += 1;
                    summary.links_written += count;
                    info!(route_id = %route.id, count, "linked route");
                }
                Err(RouteGraphError::InvalidGeometry { route_id, source }) => {
                    summary.skipped += 1;
                    warn!(route_id = %route_id, reason = %source, "skipping route");
                }
                Err(
                    err @ (RouteGraphError::RouteNotFound(_) | RouteGraphError::RouteNotEligible(_)),
                ) => {
                    summary.skipped += 1;
                    warn!(route_id = %route.id, reason = %err, "route changed since the batch started");
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(route_id = %route.id, error = %err, "failed to link route");
                }
            }
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            links = summary.links_written,
            "route graph batch finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteGraphConfig;
    use crate::models::{GraphNode, Route};
    use crate::store::MemoryRouteGraphStore;
    use serde_json::json;

    fn line(id: &str, lon: f64) -> Route {
        Route {
            id: id.to_string(),
            geometry: Some(json!({
                "type": "LineString",
                "coordinates": [[lon, 0.0], [lon, 0.01], [lon, 0.02]]
            })),
            status: String::from("active"),
            deleted_at: None,
        }
    }

    fn fixture() -> MemoryRouteGraphStore {
        let mut deleted = line("deleted", 0.0);
        deleted.deleted_at = Some(chrono::Utc::now());

        let broken = Route {
            id: String::from("broken"),
            geometry: Some(json!({"type": "Point", "coordinates": [0.0, 0.0]})),
            status: String::from("active"),
            deleted_at: None,
        };

        let routes = vec![line("east", 0.1), broken, line("west", 0.0), deleted];

        let nodes = vec![
            GraphNode {
                id: String::from("w1"),
                lat: 0.005,
                lon: 0.0001,
            },
            GraphNode {
                id: String::from("w2"),
                lat: 0.015,
                lon: -0.0001,
            },
            GraphNode {
                id: String::from("e1"),
                lat: 0.012,
                lon: 0.1002,
            },
        ];

        MemoryRouteGraphStore::new(routes, nodes)
    }

    fn runner(store: MemoryRouteGraphStore) -> BatchRunner<MemoryRouteGraphStore> {
        BatchRunner::new(Arc::new(RouteGraphBuilder::new(
            Arc::new(store),
            RouteGraphConfig::default(),
        )))
    }

    #[tokio::test]
    async fn links_every_eligible_route_and_skips_bad_geometry() {
        let runner = runner(fixture());

        let summary = runner.run(&BatchOptions::default()).await.unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                processed: 3,
                succeeded: 2,
                skipped: 1,
                failed: 0,
                links_written: 3,
            }
        );

        let store = runner.builder().store();
        assert_eq!(store.links_for("west").len(), 2);
        assert_eq!(store.links_for("east").len(), 1);
        assert!(store.links_for("deleted").is_empty());
    }

    #[tokio::test]
    async fn one_failing_route_does_not_stop_the_batch() {
        let store = fixture();
        store.fail_inserts_for("east");
        let runner = runner(store);

        let summary = runner.run(&BatchOptions::default()).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(runner.builder().store().links_for("west").len(), 2);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let runner = runner(fixture());

        let summary = runner
            .run(&BatchOptions {
                dry_run: true,
                route_ids: vec![],
            })
            .await
            .unwrap();

        assert_eq!(summary.links_written, 3);
        assert_eq!(runner.builder().store().replace_calls(), 0);
    }

    #[tokio::test]
    async fn restricted_to_requested_routes() {
        let runner = runner(fixture());

        let summary = runner
            .run(&BatchOptions {
                dry_run: false,
                route_ids: vec![String::from("west")],
            })
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert!(runner.builder().store().links_for("east").is_empty());
    }

    #[tokio::test]
    async fn node_outage_fails_the_run() {
        let store = fixture();
        store.set_fail_node_reads(true);

        assert!(runner(store).run(&BatchOptions::default()).await.is_err());
    }
}
