use std::cell::RefCell;

use chrono::{DateTime, TimeZone, Utc};
use gpx_trail_wasm::resolver::{resolve_position, GpsFix, PhotoMetadata};
use gpx_trail_wasm::{
    LocationQuery, MemoryLocationStore, PositionConfidence, PositionResolver, Resolution,
    TrackPoint,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, hour, minute, 0).unwrap()
}

fn ping(lat: f64, lon: f64, time: DateTime<Utc>) -> TrackPoint {
    TrackPoint::new(lat, lon, 0).with_timestamp(time)
}

#[test]
fn time_match_beats_more_recent_tracking() {
    let mut store = MemoryLocationStore::new();
    store.record_location("S", "U", ping(46.50, 7.80, at(9, 50)));
    store.record_location("S", "U", ping(46.70, 7.90, at(12, 0)));

    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::TimeMatched);
    let c = res.candidate().unwrap();
    assert_eq!((c.latitude, c.longitude), (46.50, 7.80));
}

#[test]
fn closest_in_time_wins_and_ties_go_to_earliest() {
    let mut store = MemoryLocationStore::new();
    // Recorded out of order on purpose
    store.record_location("S", "U", ping(3.0, 0.0, at(10, 5)));
    store.record_location("S", "U", ping(1.0, 0.0, at(9, 40)));
    store.record_location("S", "U", ping(2.0, 0.0, at(9, 55)));

    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.candidate().unwrap().latitude, 2.0);

    let res = resolve_position(&store, "S", Some(at(10, 3)), "U").unwrap();
    assert_eq!(res.candidate().unwrap().latitude, 3.0);
}

#[test]
fn falls_through_to_tracked_outside_window() {
    let mut store = MemoryLocationStore::new();
    store.record_location("S", "U", ping(1.0, 1.0, at(8, 0)));
    store.record_location("S", "U", ping(2.0, 2.0, at(8, 30)));

    let res = resolve_position(&store, "S", Some(at(14, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::Tracked);
    assert_eq!(res.candidate().unwrap().latitude, 2.0);
}

#[test]
fn falls_through_to_gpx_track() {
    let mut store = MemoryLocationStore::new();
    store.replace_track(
        "S",
        vec![
            TrackPoint::new(1.0, 1.0, 0),
            TrackPoint::new(2.0, 2.0, 1).with_altitude(850.0),
        ],
    );
    // Other sessions of the same user must not win over the GPX tier
    store.record_location("other", "U", ping(9.0, 9.0, at(10, 0)));

    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::GpxTrack);
    let c = res.candidate().unwrap();
    assert_eq!(c.latitude, 2.0);
    assert_eq!(c.altitude, Some(850.0));
}

#[test]
fn falls_through_to_last_known_location_of_user() {
    let mut store = MemoryLocationStore::new();
    store.record_location("old-1", "U", ping(5.0, 5.0, at(6, 0)));
    store.record_location("old-2", "U", ping(6.0, 6.0, at(7, 0)));
    store.record_location("foreign", "V", ping(7.0, 7.0, at(11, 0)));

    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::LastKnown);
    assert_eq!(res.candidate().unwrap().latitude, 6.0);
}

#[test]
fn exhausted_tiers_yield_manual() {
    let store = MemoryLocationStore::new();
    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res, Resolution::NotFound);
    assert_eq!(res.confidence(), PositionConfidence::Manual);
    assert!(!res.is_found());
}

#[test]
fn photo_with_exif_skips_lookups() {
    let store = FailingStore::default();
    let resolver = PositionResolver::new(&store);
    let photo = PhotoMetadata {
        gps: Some(GpsFix {
            latitude: 46.0,
            longitude: 7.0,
            altitude: None,
        }),
        taken_at: Some(at(10, 0)),
    };
    let res = resolver.place_photo("S", "U", &photo).unwrap();
    assert_eq!(res.confidence(), PositionConfidence::Gps);
    assert!(store.calls.borrow().is_empty());
}

#[test]
fn photo_without_exif_uses_chain() {
    let mut store = MemoryLocationStore::new();
    store.record_location("S", "U", ping(1.0, 1.0, at(10, 10)));
    let resolver = PositionResolver::new(&store);
    let photo = PhotoMetadata {
        gps: None,
        taken_at: Some(at(10, 0)),
    };
    let res = resolver.place_photo("S", "U", &photo).unwrap();
    assert_eq!(res.confidence(), PositionConfidence::TimeMatched);
}

#[derive(Debug)]
struct StoreDown;

impl std::fmt::Display for StoreDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store unavailable")
    }
}

impl std::error::Error for StoreDown {}

/// Empty for every lookup except the ones listed in `fail_on`, which error.
#[derive(Default)]
struct FailingStore {
    fail_on: Vec<&'static str>,
    calls: RefCell<Vec<&'static str>>,
}

impl FailingStore {
    fn lookup<T>(&self, name: &'static str, empty: T) -> Result<T, StoreDown> {
        self.calls.borrow_mut().push(name);
        if self.fail_on.contains(&name) {
            Err(StoreDown)
        } else {
            Ok(empty)
        }
    }
}

impl LocationQuery for FailingStore {
    type Error = StoreDown;

    fn locations_in_window(
        &self,
        _session_id: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<TrackPoint>, StoreDown> {
        self.lookup("window", Vec::new())
    }

    fn last_location(&self, _session_id: &str) -> Result<Option<TrackPoint>, StoreDown> {
        self.lookup("tracked", None)
    }

    fn last_gpx_point(&self, _session_id: &str) -> Result<Option<TrackPoint>, StoreDown> {
        self.lookup("gpx", None)
    }

    fn last_location_for_user(&self, _user_id: &str) -> Result<Option<TrackPoint>, StoreDown> {
        self.lookup("user", None)
    }
}

#[test]
fn query_error_is_propagated_not_masked() {
    let store = FailingStore {
        fail_on: vec!["gpx"],
        ..Default::default()
    };
    let res = resolve_position(&store, "S", Some(at(10, 0)), "U");
    assert!(res.is_err());
    // The chain stops at the failing tier
    assert_eq!(*store.calls.borrow(), vec!["window", "tracked", "gpx"]);
}

#[test]
fn all_tiers_consulted_in_order_when_empty() {
    let store = FailingStore::default();
    let res = resolve_position(&store, "S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res, Resolution::NotFound);
    assert_eq!(*store.calls.borrow(), vec!["window", "tracked", "gpx", "user"]);
}

#[test]
fn time_tier_not_queried_without_photo_time() {
    let store = FailingStore {
        fail_on: vec!["window"],
        ..Default::default()
    };
    let res = resolve_position(&store, "S", None, "U").unwrap();
    assert_eq!(res, Resolution::NotFound);
    assert_eq!(*store.calls.borrow(), vec!["tracked", "gpx", "user"]);
}
