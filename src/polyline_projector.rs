// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::geo_math::{distance, project_onto_segment};
use geo::Point;
use itertools::Itertools;

/// Where a point lands on a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// Meters along the polyline from its first vertex to `projected_point`.
    pub cum_dist: f64,
    pub projected_point: Point<f64>,
    /// Meters from the input point to `projected_point`.
    pub distance: f64,
    /// Index of the winning segment, 0 being `coords[0]..coords[1]`.
    pub segment_index: usize,
}

/// Sum of haversine segment lengths in meters.
pub fn polyline_length(coords: &[Point<f64>]) -> f64 {
    coords
        .iter()
        .tuple_windows()
        .map(|(a, b)| distance(*a, *b))
        .sum()
}

/// Projects `point` onto every segment of `coords` and keeps the segment with the
/// smallest perpendicular distance. Equal distances keep the earlier segment.
///
/// Returns `None` when the polyline has fewer than two vertices.
pub fn project_on_polyline(coords: &[Point<f64>], point: Point<f64>) -> Option<PolylineProjection> {
    if coords.len() < 2 {
        return None;
    }

    let mut best: Option<PolylineProjection> = None;
    let mut length_before_segment = 0.0;

    for (segment_index, (a, b)) in coords.iter().copied().tuple_windows().enumerate() {
        let segment_length = distance(a, b);
        let projected_point = project_onto_segment(point, a, b);
        let perpendicular = distance(point, projected_point);

        let better = match &best {
            None => true,
            Some(current) => {
                perpendicular < current.distance
                    || (current.distance.is_nan() && !perpendicular.is_nan())
            }
        };

        if better {
            // planar projection vs haversine length can disagree by a hair
            let along_segment = distance(a, projected_point).min(segment_length);

            best = Some(PolylineProjection {
                cum_dist: length_before_segment + along_segment,
                projected_point,
                distance: perpendicular,
                segment_index,
            });
        }

        length_before_segment += segment_length;
    }

    best
}
