use chrono::{DateTime, Utc};

use crate::model::{PositionConfidence, TrackPoint, Waypoint, WaypointSource};

/// Parsed GPX upload: standalone waypoints and recorded tracks.
#[derive(Debug, Default)]
pub struct GpxData {
    pub waypoints: Vec<GpxPoint>,
    pub tracks: Vec<GpxTrack>,
}

impl GpxData {
    /// All track points of all tracks and segments, in document order,
    /// numbered from 0.
    pub fn track_points(&self) -> Vec<TrackPoint> {
        self.tracks
            .iter()
            .flat_map(|trk| trk.segments.iter())
            .flat_map(|seg| seg.points.iter())
            .enumerate()
            .map(|(i, pt)| pt.to_track_point(i as u64))
            .collect()
    }

    /// GPX waypoints as session waypoints. Their coordinates come straight
    /// from the file, so they carry `gps` confidence.
    pub fn session_waypoints(&self, session_id: &str) -> Vec<Waypoint> {
        self.waypoints
            .iter()
            .map(|pt| Waypoint {
                latitude: pt.lat,
                longitude: pt.lon,
                altitude: pt.ele,
                position_confidence: PositionConfidence::Gps,
                source: WaypointSource::Gpx,
                session_id: session_id.to_string(),
                name: pt.name.clone(),
                description: pt.desc.clone(),
            })
            .collect()
    }
}

/// A single GPX point (used for wpt and trkpt).
#[derive(Debug, Clone)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub sym: Option<String>,
    pub point_type: Option<String>,
}

impl GpxPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            time: None,
            name: None,
            cmt: None,
            desc: None,
            sym: None,
            point_type: None,
        }
    }

    pub fn to_track_point(&self, sequence: u64) -> TrackPoint {
        TrackPoint {
            latitude: self.lat,
            longitude: self.lon,
            altitude: self.ele,
            sequence,
            timestamp: self.time,
        }
    }
}

/// A GPX track (<trk>).
#[derive(Debug, Default)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub track_type: Option<String>,
    pub segments: Vec<GpxSegment>,
}

impl GpxTrack {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(|s| s.points.len()).sum()
    }

    /// Segments joined into one sequence, numbered from 0.
    pub fn track_points(&self) -> Vec<TrackPoint> {
        let mut points = Vec::with_capacity(self.point_count());
        let joined = self.segments.iter().flat_map(|seg| seg.points.iter());
        for (i, pt) in joined.enumerate() {
            points.push(pt.to_track_point(i as u64));
        }
        points
    }
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Default)]
pub struct GpxSegment {
    pub points: Vec<GpxPoint>,
}
