//! Read-only lookups the position resolver needs from location storage.

use std::collections::HashMap;
use std::convert::Infallible;

use chrono::{DateTime, Utc};

use crate::model::TrackPoint;

/// The four idempotent lookups behind [`crate::resolver::PositionResolver`].
///
/// An empty result is `Ok(None)` / `Ok(vec![])`. `Err` is reserved for real
/// failures of the backing store; the resolver surfaces it unchanged.
pub trait LocationQuery {
    type Error: std::error::Error;

    /// Tracked locations of `session_id` with `from <= timestamp <= to`,
    /// ascending by timestamp.
    fn locations_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TrackPoint>, Self::Error>;

    /// Most recent tracked location of the session.
    fn last_location(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error>;

    /// GPX track point of the session with the highest sequence.
    fn last_gpx_point(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error>;

    /// Most recent tracked location of the user in any session.
    fn last_location_for_user(&self, user_id: &str) -> Result<Option<TrackPoint>, Self::Error>;
}

impl<T: LocationQuery + ?Sized> LocationQuery for &T {
    type Error = T::Error;

    fn locations_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TrackPoint>, Self::Error> {
        (**self).locations_in_window(session_id, from, to)
    }

    fn last_location(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        (**self).last_location(session_id)
    }

    fn last_gpx_point(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        (**self).last_gpx_point(session_id)
    }

    fn last_location_for_user(&self, user_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        (**self).last_location_for_user(user_id)
    }
}

#[derive(Debug, Clone)]
struct TrackedLocation {
    session_id: String,
    user_id: String,
    point: TrackPoint,
}

/// In-process location storage.
///
/// Tracked locations without a timestamp are ignored by every time-based
/// lookup.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    locations: Vec<TrackedLocation>,
    tracks: HashMap<String, Vec<TrackPoint>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a location ping for a session owned by `user_id`.
    pub fn record_location(&mut self, session_id: &str, user_id: &str, point: TrackPoint) {
        self.locations.push(TrackedLocation {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            point,
        });
    }

    /// Replace the session's GPX track. Previous points are discarded.
    pub fn replace_track(&mut self, session_id: &str, points: Vec<TrackPoint>) {
        self.tracks.insert(session_id.to_string(), points);
    }

    pub fn track(&self, session_id: &str) -> &[TrackPoint] {
        self.tracks.get(session_id).map(Vec::as_slice).unwrap_or_default()
    }

    fn latest(&self, filter: impl Fn(&TrackedLocation) -> bool) -> Option<TrackPoint> {
        self.locations
            .iter()
            .filter(|loc| filter(loc) && loc.point.timestamp.is_some())
            // max_by_key keeps the last of equal maxima: the latest recorded wins
            .max_by_key(|loc| loc.point.timestamp)
            .map(|loc| loc.point.clone())
    }
}

impl LocationQuery for MemoryLocationStore {
    type Error = Infallible;

    fn locations_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TrackPoint>, Self::Error> {
        let mut points: Vec<TrackPoint> = self
            .locations
            .iter()
            .filter(|loc| loc.session_id == session_id)
            .filter(|loc| matches!(loc.point.timestamp, Some(ts) if ts >= from && ts <= to))
            .map(|loc| loc.point.clone())
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    fn last_location(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        Ok(self.latest(|loc| loc.session_id == session_id))
    }

    fn last_gpx_point(&self, session_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        Ok(self
            .tracks
            .get(session_id)
            .and_then(|pts| pts.iter().max_by_key(|p| p.sequence))
            .cloned())
    }

    fn last_location_for_user(&self, user_id: &str) -> Result<Option<TrackPoint>, Self::Error> {
        Ok(self.latest(|loc| loc.user_id == user_id))
    }
}
