pub mod converter;
pub mod error;
pub mod geometry;
pub mod gpx_types;
pub mod import;
pub mod location_query;
pub mod model;
pub mod options;
pub mod parser;
pub mod resolver;
pub mod simplify;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use wasm_bindgen::prelude::*;

pub use crate::error::GpxError;
pub use crate::location_query::{LocationQuery, MemoryLocationStore};
pub use crate::model::{PositionConfidence, TrackPoint, Waypoint, WaypointSource};
pub use crate::options::{ConvertOptions, ImportOptions};
pub use crate::resolver::{PositionCandidate, PositionResolver, Resolution};
pub use crate::simplify::{compute_adaptive_tolerance, simplify};

/// Convert GPX string to (simplified) GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = gpxToGeoJson)]
pub fn gpx_to_geojson(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let gpx_data = parser::parse_gpx(gpx_string)?;
    let fc = converter::to_feature_collection(&gpx_data, &opts);
    serde_wasm_bindgen::to_value(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert GPX string to (simplified) GeoJSON, returned as a JSON string.
#[wasm_bindgen(js_name = gpxToGeoJsonString)]
pub fn gpx_to_geojson_string(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let gpx_data = parser::parse_gpx(gpx_string)?;
    let fc = converter::to_feature_collection(&gpx_data, &opts);
    serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Simplify an array of track points. Without `epsilon` (squared degrees)
/// the adaptive tolerance is used.
#[wasm_bindgen(js_name = simplifyTrack)]
pub fn simplify_track(points: JsValue, epsilon: Option<f64>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = parse_points(points)?;
    let simplified = match epsilon {
        Some(eps) => simplify(&points, eps),
        None => import::reduce_track(points, &ImportOptions::default()).0,
    };
    serde_wasm_bindgen::to_value(&simplified).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Adaptive tolerance (squared degrees) for an array of track points.
#[wasm_bindgen(js_name = computeAdaptiveTolerance)]
pub fn compute_adaptive_tolerance_js(points: JsValue) -> Result<f64, JsValue> {
    let points = parse_points(points)?;
    Ok(compute_adaptive_tolerance(&points))
}

fn parse_options(options: JsValue) -> Result<ConvertOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ConvertOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn parse_points(points: JsValue) -> Result<Vec<TrackPoint>, JsValue> {
    if points.is_undefined() || points.is_null() {
        return Ok(Vec::new());
    }
    let points: Vec<TrackPoint> =
        serde_wasm_bindgen::from_value(points).map_err(|e| JsValue::from_str(&e.to_string()))?;
    match points.iter().find(|p| !p.is_valid()) {
        Some(bad) => Err(JsValue::from_str(&format!(
            "Invalid coordinates ({}, {}) at sequence {}",
            bad.latitude, bad.longitude, bad.sequence
        ))),
        None => Ok(points),
    }
}
