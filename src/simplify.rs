//! Ramer-Douglas-Peucker track simplification with adaptive tolerance.
//!
//! # Units
//!
//! `epsilon` is compared against *squared* planar distances (see
//! [`crate::geometry`]). Passing a linear distance, e.g. the degree
//! equivalent of some metres, silently over-simplifies by orders of
//! magnitude. Prefer [`compute_adaptive_tolerance`] or [`simplify_adaptive`]
//! over hand-rolled values.

use crate::geometry::{perpendicular_squared_distance, squared_distance};
use crate::model::TrackPoint;

/// Tracks shorter than this are never simplified.
pub const MIN_POINTS_FOR_SIMPLIFICATION: usize = 10;

/// Base tolerance as a fraction of the mean squared spacing.
const BASE_TOLERANCE_RATIO: f64 = 0.1;

/// Pick a tolerance (squared units) from the track's own point spacing.
///
/// Returns 0 for tracks with fewer than [`MIN_POINTS_FOR_SIMPLIFICATION`]
/// points. Otherwise 10% of the mean squared distance between consecutive
/// points, scaled ×1.5 above 500 points and ×2 above 1000.
pub fn compute_adaptive_tolerance(points: &[TrackPoint]) -> f64 {
    if points.len() < MIN_POINTS_FOR_SIMPLIFICATION {
        return 0.0;
    }

    let total: f64 = points
        .windows(2)
        .map(|pair| squared_distance(&pair[0], &pair[1]))
        .sum();
    let mean_spacing = total / (points.len() - 1) as f64;

    let scale = match points.len() {
        n if n > 1000 => 2.0,
        n if n > 500 => 1.5,
        _ => 1.0,
    };

    mean_spacing * BASE_TOLERANCE_RATIO * scale
}

/// Simplify a track, keeping the points whose squared distance to the local
/// chord exceeds `epsilon`.
///
/// The output is a subsequence of the input: first and last point are
/// always kept, nothing is reordered or synthesized. Inputs of two points
/// or fewer come back unchanged.
pub fn simplify(points: &[TrackPoint], epsilon: f64) -> Vec<TrackPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    simplify_indices(points, epsilon)
        .into_iter()
        .map(|i| points[i].clone())
        .collect()
}

/// Indices (ascending) of the points [`simplify`] keeps.
///
/// Works through an explicit stack of index ranges instead of recursing, so
/// a pathological track cannot exhaust the call stack.
pub fn simplify_indices(points: &[TrackPoint], epsilon: f64) -> Vec<usize> {
    let n = points.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut ranges = vec![(0, n - 1)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }

        let (index, distance) = farthest_from_chord(points, start, end);
        if distance > epsilon {
            keep[index] = true;
            ranges.push((index, end));
            ranges.push((start, index));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

/// Compute the adaptive tolerance and simplify with it.
pub fn simplify_adaptive(points: &[TrackPoint]) -> (Vec<TrackPoint>, f64) {
    let tolerance = compute_adaptive_tolerance(points);
    (simplify(points, tolerance), tolerance)
}

/// Interior point farthest from the chord `start..end`.
/// Ties go to the lowest index. Requires `end >= start + 2`.
fn farthest_from_chord(points: &[TrackPoint], start: usize, end: usize) -> (usize, f64) {
    let first = &points[start];
    let last = &points[end];

    let mut max_index = start + 1;
    let mut max_distance = perpendicular_squared_distance(&points[max_index], first, last);

    for (offset, point) in points[start + 2..end].iter().enumerate() {
        let distance = perpendicular_squared_distance(point, first, last);
        if distance > max_distance {
            max_distance = distance;
            max_index = start + 2 + offset;
        }
    }

    (max_index, max_distance)
}
