use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded or uploaded geographic sample.
///
/// `sequence` defines the original order within a track. `timestamp` is set
/// for tracked locations and usually absent for raw GPX points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, sequence: u64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            sequence,
            timestamp: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Finite coordinates inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// How a waypoint's coordinate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionConfidence {
    /// Embedded in the source (GPX waypoint or photo EXIF).
    Gps,
    /// Closest tracked location within the time window of the photo.
    TimeMatched,
    /// Most recent tracked location of the session.
    Tracked,
    /// Last point of the session's uploaded GPX track.
    GpxTrack,
    /// Most recent location of the user in any session.
    LastKnown,
    /// Nothing found; the user has to place it by hand.
    Manual,
}

impl PositionConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::TimeMatched => "time_matched",
            Self::Tracked => "tracked",
            Self::GpxTrack => "gpx_track",
            Self::LastKnown => "last_known",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for PositionConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointSource {
    Gpx,
    Photo,
    Manual,
}

impl WaypointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Photo => "photo",
            Self::Manual => "manual",
        }
    }
}

/// A point of interest together with its positioning provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    pub position_confidence: PositionConfidence,
    pub source: WaypointSource,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_labels() {
        assert_eq!(PositionConfidence::TimeMatched.as_str(), "time_matched");
        assert_eq!(PositionConfidence::GpxTrack.to_string(), "gpx_track");
        let json = serde_json::to_string(&PositionConfidence::LastKnown).unwrap();
        assert_eq!(json, "\"last_known\"");
    }

    #[test]
    fn test_point_validity() {
        assert!(TrackPoint::new(35.0, 139.0, 0).is_valid());
        assert!(!TrackPoint::new(91.0, 0.0, 0).is_valid());
        assert!(!TrackPoint::new(0.0, -180.5, 0).is_valid());
        assert!(!TrackPoint::new(f64::NAN, 0.0, 0).is_valid());
    }

    #[test]
    fn test_point_serde_camel_case() {
        let pt = TrackPoint::new(35.0, 139.0, 7).with_altitude(12.5);
        let json = serde_json::to_value(&pt).unwrap();
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["altitude"], 12.5);
        assert!(json.get("timestamp").is_none());

        let back: TrackPoint =
            serde_json::from_str(r#"{"latitude":1.0,"longitude":2.0}"#).unwrap();
        assert_eq!(back.sequence, 0);
        assert!(back.altitude.is_none());
    }
}
