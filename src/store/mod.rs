// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Read and write access to routes, graph nodes and route graph links.

pub mod memory;
pub mod postgres;

use crate::error::StoreError;
use crate::models::{GraphNode, Route, RouteGraphLink};
use serde_json::Value;
use std::future::Future;

pub use memory::MemoryRouteGraphStore;
pub use postgres::PgRouteGraphStore;

pub trait RouteGraphStore: Send + Sync {
    /// Routes that are not soft-deleted, not deprecated and have a geometry.
    fn fetch_active_routes(&self) -> impl Future<Output = Result<Vec<Route>, StoreError>> + Send;

    /// A single route by id, regardless of its status.
    fn fetch_route(
        &self,
        route_id: &str,
    ) -> impl Future<Output = Result<Option<Route>, StoreError>> + Send;

    fn fetch_nodes(&self) -> impl Future<Output = Result<Vec<GraphNode>, StoreError>> + Send;

    /// Swaps the route's whole link set for `links`.
    ///
    /// Readers see either the old set or the new one, never a mix. Writers of the
    /// same route are serialized, and the write is refused with
    /// [`StoreError::GeometryChanged`] when the route's current geometry is not
    /// `source_geometry`.
    fn replace_links(
        &self,
        route_id: &str,
        source_geometry: Option<&Value>,
        links: Vec<RouteGraphLink>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The persisted links of a route ordered by `order_index`.
    fn fetch_links(
        &self,
        route_id: &str,
    ) -> impl Future<Output = Result<Vec<RouteGraphLink>, StoreError>> + Send;
}
