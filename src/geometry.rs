//! Planar distance primitives.
//!
//! Longitude is treated as x and latitude as y. All distances are *squared*
//! coordinate-degree distances, never square-rooted, so tolerances handed to
//! the simplifier must be in the same squared unit.
//!
//! The planar approximation is only meaningful at track scale. It breaks down
//! near the poles and for tracks crossing the antimeridian.

use crate::model::TrackPoint;

/// Squared planar distance between two points.
pub fn squared_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let dx = b.longitude - a.longitude;
    let dy = b.latitude - a.latitude;
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `start..end`.
///
/// The projection is clamped to the segment, not the infinite line. A
/// zero-length segment degrades to the distance to `start`.
pub fn perpendicular_squared_distance(p: &TrackPoint, start: &TrackPoint, end: &TrackPoint) -> f64 {
    let dx = end.longitude - start.longitude;
    let dy = end.latitude - start.latitude;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return squared_distance(p, start);
    }

    let t = (((p.longitude - start.longitude) * dx + (p.latitude - start.latitude) * dy) / len_sq)
        .clamp(0.0, 1.0);

    let cx = start.longitude + t * dx;
    let cy = start.latitude + t * dy;
    let ex = p.longitude - cx;
    let ey = p.latitude - cy;
    ex * ex + ey * ey
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> TrackPoint {
        TrackPoint::new(lat, lon, 0)
    }

    #[test]
    fn test_squared_distance() {
        assert!((squared_distance(&pt(0.0, 0.0), &pt(3.0, 4.0)) - 25.0).abs() < 1e-12);
        assert_eq!(squared_distance(&pt(1.0, 1.0), &pt(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_point_on_segment() {
        let d = perpendicular_squared_distance(&pt(1.0, 1.0), &pt(0.0, 0.0), &pt(3.0, 3.0));
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn test_perpendicular_offset() {
        // Segment along x (longitude) axis, point one unit above it
        let d = perpendicular_squared_distance(&pt(1.0, 2.0), &pt(0.0, 0.0), &pt(0.0, 4.0));
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_projection_clamped_to_segment() {
        // Beyond the end: distance to the endpoint, not to the infinite line
        let d = perpendicular_squared_distance(&pt(0.0, 6.0), &pt(0.0, 0.0), &pt(0.0, 4.0));
        assert!((d - 4.0).abs() < 1e-12);

        let d = perpendicular_squared_distance(&pt(1.0, -1.0), &pt(0.0, 0.0), &pt(0.0, 4.0));
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_segment() {
        let d = perpendicular_squared_distance(&pt(3.0, 4.0), &pt(0.0, 0.0), &pt(0.0, 0.0));
        assert!((d - 25.0).abs() < 1e-12);
    }
}
