// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Links transit routes to the graph nodes (stops, intersections) lying along them.
//!
//! For each route the node universe is projected onto the route polyline, nodes
//! within the proximity threshold are kept, ordered by distance from the start of
//! the route, deduplicated and written as the route's full link set.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

pub mod batch;
pub mod config;
pub mod error;
pub mod geo_math;
pub mod http_api;
pub mod models;
pub mod polyline_projector;
pub mod postgres_tools;
pub mod route_geometry;
pub mod route_graph_builder;
pub mod route_locks;
pub mod schema;
pub mod single_route;
pub mod store;

pub use batch::{BatchOptions, BatchRunner, BatchSummary};
pub use config::RouteGraphConfig;
pub use error::{GeometryError, RouteGraphError, StoreError};
pub use route_graph_builder::RouteGraphBuilder;
pub use single_route::SingleRouteHandler;
