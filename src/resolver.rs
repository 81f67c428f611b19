//! Best-effort positioning for photo waypoints without GPS EXIF data.
//!
//! Tiers are tried in a fixed order and the first hit wins:
//!
//! | Tier | Lookup                                              | Label          |
//! |------|-----------------------------------------------------|----------------|
//! | 1    | session location closest to the photo time, ±30 min | `time_matched` |
//! | 2    | latest tracked location of the session              | `tracked`      |
//! | 3    | last GPX track point of the session                 | `gpx_track`    |
//! | 4    | latest location of the user, any session            | `last_known`   |
//!
//! When every tier comes back empty the result is [`Resolution::NotFound`]
//! (label `manual`), which is an expected outcome rather than an error. Query
//! errors abort the chain and are returned unchanged.

use chrono::{DateTime, TimeDelta, Utc};

use crate::location_query::LocationQuery;
use crate::model::{PositionConfidence, TrackPoint, Waypoint, WaypointSource};

/// Half-width of the time-matching window around the photo timestamp.
pub const TIME_MATCH_WINDOW_MINUTES: i64 = 30;

/// A coordinate chosen by one of the tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCandidate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub confidence: PositionConfidence,
}

impl PositionCandidate {
    fn from_point(point: &TrackPoint, confidence: PositionConfidence) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: point.altitude,
            confidence,
        }
    }

    pub fn into_waypoint(self, session_id: &str, source: WaypointSource) -> Waypoint {
        Waypoint {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            position_confidence: self.confidence,
            source,
            session_id: session_id.to_string(),
            name: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(PositionCandidate),
    /// No tier produced a coordinate; the caller has to ask for manual placement.
    NotFound,
}

impl Resolution {
    pub fn confidence(&self) -> PositionConfidence {
        match self {
            Self::Found(candidate) => candidate.confidence,
            Self::NotFound => PositionConfidence::Manual,
        }
    }

    pub fn candidate(&self) -> Option<&PositionCandidate> {
        match self {
            Self::Found(candidate) => Some(candidate),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// GPS fix read from a photo's EXIF block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// What the upload handler extracted from a photo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub gps: Option<GpsFix>,
    pub taken_at: Option<DateTime<Utc>>,
}

struct ResolveRequest<'a> {
    session_id: &'a str,
    user_id: &'a str,
    photo_time: Option<DateTime<Utc>>,
}

type Tier<Q> =
    fn(&Q, &ResolveRequest<'_>) -> Result<Option<TrackPoint>, <Q as LocationQuery>::Error>;

fn tiers<Q: LocationQuery>() -> [(PositionConfidence, Tier<Q>); 4] {
    [
        (PositionConfidence::TimeMatched, time_matched::<Q>),
        (PositionConfidence::Tracked, last_tracked::<Q>),
        (PositionConfidence::GpxTrack, last_gpx::<Q>),
        (PositionConfidence::LastKnown, last_known::<Q>),
    ]
}

fn time_matched<Q: LocationQuery>(
    query: &Q,
    req: &ResolveRequest<'_>,
) -> Result<Option<TrackPoint>, Q::Error> {
    let Some(photo_time) = req.photo_time else {
        return Ok(None);
    };

    let window = TimeDelta::minutes(TIME_MATCH_WINDOW_MINUTES);
    let from = photo_time
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let to = photo_time
        .checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let candidates = query.locations_in_window(req.session_id, from, to)?;

    // Stores may widen the window when rounding; the bound is enforced here.
    // Smallest time difference, earliest location on ties
    Ok(candidates
        .into_iter()
        .filter_map(|p| p.timestamp.map(|ts| ((ts - photo_time).abs(), ts, p)))
        .filter(|(diff, _, _)| *diff <= window)
        .min_by_key(|(diff, ts, _)| (*diff, *ts))
        .map(|(_, _, p)| p))
}

fn last_tracked<Q: LocationQuery>(
    query: &Q,
    req: &ResolveRequest<'_>,
) -> Result<Option<TrackPoint>, Q::Error> {
    query.last_location(req.session_id)
}

fn last_gpx<Q: LocationQuery>(
    query: &Q,
    req: &ResolveRequest<'_>,
) -> Result<Option<TrackPoint>, Q::Error> {
    query.last_gpx_point(req.session_id)
}

fn last_known<Q: LocationQuery>(
    query: &Q,
    req: &ResolveRequest<'_>,
) -> Result<Option<TrackPoint>, Q::Error> {
    query.last_location_for_user(req.user_id)
}

/// Chooses a position for photos lacking GPS data.
///
/// Holds no state besides the query backend.
#[derive(Debug, Clone)]
pub struct PositionResolver<Q> {
    query: Q,
}

impl<Q: LocationQuery> PositionResolver<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    /// Run the tier chain for a photo in `session_id` taken by `user_id`.
    ///
    /// Tier 1 is skipped when `photo_time` is `None`.
    pub fn resolve(
        &self,
        session_id: &str,
        photo_time: Option<DateTime<Utc>>,
        user_id: &str,
    ) -> Result<Resolution, Q::Error> {
        let request = ResolveRequest {
            session_id,
            user_id,
            photo_time,
        };

        for (confidence, tier) in tiers::<Q>() {
            if let Some(point) = tier(&self.query, &request)? {
                return Ok(Resolution::Found(PositionCandidate::from_point(
                    &point, confidence,
                )));
            }
        }

        Ok(Resolution::NotFound)
    }

    /// Position a photo: its own EXIF fix if usable, the tier chain otherwise.
    pub fn place_photo(
        &self,
        session_id: &str,
        user_id: &str,
        photo: &PhotoMetadata,
    ) -> Result<Resolution, Q::Error> {
        if let Some(fix) = photo.gps.filter(is_usable_fix) {
            return Ok(Resolution::Found(PositionCandidate {
                latitude: fix.latitude,
                longitude: fix.longitude,
                altitude: fix.altitude,
                confidence: PositionConfidence::Gps,
            }));
        }

        self.resolve(session_id, photo.taken_at, user_id)
    }
}

fn is_usable_fix(fix: &GpsFix) -> bool {
    fix.latitude.is_finite()
        && fix.longitude.is_finite()
        && (-90.0..=90.0).contains(&fix.latitude)
        && (-180.0..=180.0).contains(&fix.longitude)
}

/// One-shot form of [`PositionResolver::resolve`].
pub fn resolve_position<Q: LocationQuery + ?Sized>(
    query: &Q,
    session_id: &str,
    photo_time: Option<DateTime<Utc>>,
    user_id: &str,
) -> Result<Resolution, Q::Error> {
    PositionResolver::new(query).resolve(session_id, photo_time, user_id)
}
