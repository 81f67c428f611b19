//! GPX session upload: parse, flatten, simplify.
//!
//! The result is handed back to the caller for persistence, typically via a
//! store's `replace_track`, which drops whatever the session held before.

use log::{debug, warn};

use crate::error::GpxError;
use crate::gpx_types::GpxData;
use crate::model::{TrackPoint, Waypoint};
use crate::options::ImportOptions;
use crate::parser::parse_gpx;
use crate::simplify::{compute_adaptive_tolerance, simplify};

/// A parsed and reduced GPX upload, ready to be stored.
#[derive(Debug, Clone)]
pub struct TrackImport {
    /// Kept track points, sequences as numbered before simplification.
    pub points: Vec<TrackPoint>,
    pub waypoints: Vec<Waypoint>,
    /// Tolerance actually applied, in squared coordinate-degrees.
    pub tolerance: f64,
    pub original_point_count: usize,
}

pub fn import_gpx(
    xml: &str,
    session_id: &str,
    opts: &ImportOptions,
) -> Result<TrackImport, GpxError> {
    let data = parse_gpx(xml)?;
    Ok(import_parsed(&data, session_id, opts))
}

pub fn import_parsed(data: &GpxData, session_id: &str, opts: &ImportOptions) -> TrackImport {
    let points = data.track_points();
    let original_point_count = points.len();
    let (points, tolerance) = reduce_track(points, opts);
    let waypoints = data.session_waypoints(session_id);

    debug!(
        "session {session_id}: kept {}/{original_point_count} track points (tolerance {tolerance:e}), {} waypoints",
        points.len(),
        waypoints.len()
    );

    TrackImport {
        points,
        waypoints,
        tolerance,
        original_point_count,
    }
}

/// Simplify `points` according to `opts`, returning the kept points and the
/// tolerance used. A tolerance of 0, whether configured or chosen adaptively
/// for a short track, leaves the track untouched.
pub fn reduce_track(points: Vec<TrackPoint>, opts: &ImportOptions) -> (Vec<TrackPoint>, f64) {
    if !opts.simplify {
        return (points, 0.0);
    }

    let tolerance = match opts.tolerance {
        Some(t) if t.is_finite() && t >= 0.0 => t,
        Some(t) => {
            warn!("ignoring invalid tolerance {t}, using adaptive tolerance");
            compute_adaptive_tolerance(&points)
        }
        None => compute_adaptive_tolerance(&points),
    };

    // Zero means "leave as is": even exactly colinear points are kept
    if tolerance == 0.0 {
        return (points, 0.0);
    }

    (simplify(&points, tolerance), tolerance)
}
