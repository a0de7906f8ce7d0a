// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use thiserror::Error;

/// Why a route's stored geometry cannot be used as a polyline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("route has no geometry")]
    Missing,
    #[error("geometry is not valid GeoJSON: {0}")]
    Malformed(String),
    #[error("geometry is a {0}, expected LineString")]
    NotLineString(String),
    #[error("LineString needs at least 2 vertices, found {0}")]
    TooFewVertices(usize),
    #[error("position {0} is not a finite (lon, lat) pair")]
    BadPosition(usize),
}

/// Failures of the backing route/node/link store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not get a database connection: {0}")]
    Pool(String),
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The route's geometry no longer matches the one the links were computed from.
    #[error("geometry of route {0} changed during the rebuild")]
    GeometryChanged(String),
}

#[derive(Error, Debug)]
pub enum RouteGraphError {
    #[error("routeId is required")]
    MissingRouteId,
    #[error("route {0} not found")]
    RouteNotFound(String),
    #[error("route {0} is deleted or deprecated")]
    RouteNotEligible(String),
    #[error("route {route_id} has unusable geometry: {source}")]
    InvalidGeometry {
        route_id: String,
        #[source]
        source: GeometryError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RouteGraphError {
    /// Errors caused by the caller's input rather than by processing.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, RouteGraphError::Store(_))
    }
}
