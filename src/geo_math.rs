// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Distance and projection primitives over (lon, lat) degree coordinates.
//!
//! Distances are great-circle (haversine). Projection is done in the planar
//! (lon, lat) plane, which is accurate enough at city scale and matches the
//! link distances already stored for existing routes.

use geo::{Distance, HaversineMeasure, Point};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn earth() -> HaversineMeasure {
    HaversineMeasure::new(EARTH_RADIUS_M)
}

/// Great-circle distance in meters between two points given as (lon, lat) degrees.
///
/// NaN input propagates as a NaN result.
pub fn distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    earth().distance(p1, p2)
}

/// Orthogonal projection of `point` onto the segment `[a, b]`, clamped to the segment.
///
/// A zero-length segment projects everything onto `a`.
pub fn project_onto_segment(point: Point<f64>, a: Point<f64>, b: Point<f64>) -> Point<f64> {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let length_squared = dx * dx + dy * dy;

    if length_squared == 0.0 {
        return a;
    }

    let t = ((point.x() - a.x()) * dx + (point.y() - a.y()) * dy) / length_squared;
    let t = t.clamp(0.0, 1.0);

    Point::new(a.x() + t * dx, a.y() + t * dy)
}
