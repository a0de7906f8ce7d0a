// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use diesel::prelude::*;
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEPRECATED_STATUS: &str = "deprecated";

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::routes)]
pub struct Route {
    pub id: String,
    /// GeoJSON geometry object, expected to be a LineString
    pub geometry: Option<Value>,
    pub status: String,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Route {
    /// Not soft-deleted and not deprecated.
    pub fn is_eligible(&self) -> bool {
        self.deleted_at.is_none() && !self.status.eq_ignore_ascii_case(DEPRECATED_STATUS)
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::graph_nodes)]
pub struct GraphNode {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl GraphNode {
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::route_graph_links)]
pub struct RouteGraphLink {
    pub route_id: String,
    pub node_id: String,
    /// 1-based position along the route
    pub order_index: i32,
    /// meters from the route's first vertex
    pub distance_from_start: i32,
}
