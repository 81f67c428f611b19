use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::gpx_types::*;
use crate::import::reduce_track;
use crate::model::{PositionConfidence, TrackPoint, Waypoint, WaypointSource};
use crate::options::{ConvertOptions, GpxElementType};

/// Convert parsed GPX data to a GeoJSON FeatureCollection.
///
/// Each track becomes one feature with its segments joined, simplified per
/// `opts.simplification`.
pub fn to_feature_collection(data: &GpxData, opts: &ConvertOptions) -> FeatureCollection {
    let mut features = Vec::new();

    if opts.should_include(GpxElementType::Waypoint) {
        for wpt in &data.waypoints {
            features.push(waypoint_to_feature(wpt, opts));
        }
    }

    if opts.should_include(GpxElementType::Track) {
        features.extend(data.tracks.iter().filter_map(|trk| track_to_feature(trk, opts)));
    }

    collection(features)
}

/// Session waypoints (any source) as Point features.
pub fn waypoints_to_feature_collection(waypoints: &[Waypoint]) -> FeatureCollection {
    let features = waypoints
        .iter()
        .map(|wpt| {
            let mut coords = vec![wpt.longitude, wpt.latitude];
            coords.extend(wpt.altitude);

            let mut props = Map::new();
            props.insert("sessionId".to_string(), JsonValue::String(wpt.session_id.clone()));
            insert_provenance(&mut props, wpt.source, wpt.position_confidence);
            insert_optional(&mut props, "name", &wpt.name);
            insert_optional(&mut props, "description", &wpt.description);

            feature(Value::Point(coords), props)
        })
        .collect();

    collection(features)
}

/// A stored track as a LineString, or a Point if it holds a single point.
pub fn track_points_to_feature(points: &[TrackPoint]) -> Option<Feature> {
    let geometry = match points {
        [] => return None,
        [only] => Value::Point(track_point_coords(only, true)),
        _ => Value::LineString(points.iter().map(|p| track_point_coords(p, true)).collect()),
    };

    let mut props = Map::new();
    props.insert("pointCount".to_string(), JsonValue::Number(points.len().into()));
    insert_coordinate_times(&mut props, points);

    Some(feature(geometry, props))
}

fn waypoint_to_feature(pt: &GpxPoint, opts: &ConvertOptions) -> Feature {
    let coords = point_coords(pt, opts.include_elevation);

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("waypoint".to_string()),
    );
    insert_provenance(&mut props, WaypointSource::Gpx, PositionConfidence::Gps);

    if opts.include_metadata {
        insert_point_metadata(&mut props, pt);
    }

    feature(Value::Point(coords), props)
}

fn track_to_feature(trk: &GpxTrack, opts: &ConvertOptions) -> Option<Feature> {
    let points = trk.track_points();
    let original_count = points.len();
    let (points, tolerance) = reduce_track(points, &opts.simplification);

    let geometry = match points.as_slice() {
        [] => return None,
        [only] => Value::Point(track_point_coords(only, opts.include_elevation)),
        _ => Value::LineString(
            points
                .iter()
                .map(|p| track_point_coords(p, opts.include_elevation))
                .collect(),
        ),
    };

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("track".to_string()),
    );

    if opts.include_metadata {
        insert_optional(&mut props, "name", &trk.name);
        insert_optional(&mut props, "desc", &trk.desc);
        insert_optional(&mut props, "type", &trk.track_type);
    }

    props.insert(
        "originalPointCount".to_string(),
        JsonValue::Number(original_count.into()),
    );
    props.insert("pointCount".to_string(), JsonValue::Number(points.len().into()));
    if let Some(tol) = serde_json::Number::from_f64(tolerance) {
        props.insert("tolerance".to_string(), JsonValue::Number(tol));
    }

    if opts.include_time {
        insert_coordinate_times(&mut props, &points);
    }

    Some(feature(geometry, props))
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array.
fn point_coords(pt: &GpxPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.ele) {
        (true, Some(ele)) => vec![pt.lon, pt.lat, ele],
        _ => vec![pt.lon, pt.lat],
    }
}

fn track_point_coords(pt: &TrackPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.altitude) {
        (true, Some(alt)) => vec![pt.longitude, pt.latitude, alt],
        _ => vec![pt.longitude, pt.latitude],
    }
}

fn insert_provenance(
    props: &mut Map<String, JsonValue>,
    source: WaypointSource,
    confidence: PositionConfidence,
) {
    props.insert("source".to_string(), JsonValue::String(source.as_str().to_string()));
    props.insert(
        "positionConfidence".to_string(),
        JsonValue::String(confidence.as_str().to_string()),
    );
}

fn insert_point_metadata(props: &mut Map<String, JsonValue>, pt: &GpxPoint) {
    insert_optional(props, "name", &pt.name);
    insert_optional(props, "cmt", &pt.cmt);
    insert_optional(props, "desc", &pt.desc);
    insert_optional(props, "sym", &pt.sym);
    insert_optional(props, "type", &pt.point_type);
    if let Some(ele) = pt.ele.and_then(serde_json::Number::from_f64) {
        props.insert("ele".to_string(), JsonValue::Number(ele));
    }
    if let Some(time) = pt.time {
        props.insert("time".to_string(), JsonValue::String(time.to_rfc3339()));
    }
}

fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}

fn insert_coordinate_times(props: &mut Map<String, JsonValue>, points: &[TrackPoint]) {
    let times: Vec<JsonValue> = points
        .iter()
        .map(|pt| match pt.timestamp {
            Some(t) => JsonValue::String(t.to_rfc3339()),
            None => JsonValue::Null,
        })
        .collect();

    // Only include if at least one time is present
    if times.iter().any(|t| !t.is_null()) {
        let mut coord_props = Map::new();
        coord_props.insert("times".to_string(), JsonValue::Array(times));
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }
}
