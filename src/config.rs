// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

/// Nodes further than this from every segment of a route are never linked to it.
pub const DEFAULT_PROXIMITY_THRESHOLD_M: f64 = 50.0;

/// Rows per INSERT statement, well under the Postgres bind parameter limit.
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteGraphConfig {
    /// Inclusive, in meters.
    pub proximity_threshold_m: f64,
    /// Rows per INSERT when writing a link set.
    pub insert_chunk_size: usize,
}

impl Default for RouteGraphConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: DEFAULT_PROXIMITY_THRESHOLD_M,
            insert_chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
        }
    }
}
