//! Resolver running against the SQLite store.
//!
//! Run with: `cargo test --features sqlite --test sqlite_store`
#![cfg(feature = "sqlite")]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use gpx_trail_wasm::import::import_gpx;
use gpx_trail_wasm::sqlite::SqliteLocationStore;
use gpx_trail_wasm::{ImportOptions, PositionConfidence, PositionResolver, TrackPoint};
use tempfile::TempDir;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, hour, minute, 0).unwrap()
}

fn ping(lat: f64, time: DateTime<Utc>) -> TrackPoint {
    TrackPoint::new(lat, 7.0, 0).with_timestamp(time)
}

#[test]
fn tier_priority_against_sqlite() {
    let mut store = SqliteLocationStore::in_memory().unwrap();
    let gpx = std::fs::read_to_string("tests/fixtures/hike_with_spike.gpx").unwrap();
    let import = import_gpx(&gpx, "S", &ImportOptions::default()).unwrap();
    store.replace_track("S", &import.points).unwrap();

    // No pings yet: the uploaded track answers
    let res = PositionResolver::new(&store).resolve("S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::GpxTrack);

    store.record_location("S", "U", &ping(46.0, at(12, 0))).unwrap();
    let res = PositionResolver::new(&store).resolve("S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::Tracked);

    store.record_location("S", "U", &ping(45.0, at(9, 50))).unwrap();
    let res = PositionResolver::new(&store).resolve("S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::TimeMatched);
    assert_eq!(res.candidate().unwrap().latitude, 45.0);
}

#[test]
fn last_known_and_manual_against_sqlite() {
    let store = SqliteLocationStore::in_memory().unwrap();
    let resolver = PositionResolver::new(&store);

    let res = resolver.resolve("S", None, "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::Manual);

    store.record_location("earlier", "U", &ping(44.0, at(8, 0))).unwrap();
    let res = resolver.resolve("S", None, "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::LastKnown);
}

#[test]
fn reupload_replaces_track_on_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("locations.db");

    {
        let mut store = SqliteLocationStore::open(path.to_str().unwrap()).unwrap();
        let pts: Vec<TrackPoint> = (0..4).map(|i| TrackPoint::new(i as f64, 0.0, i)).collect();
        store.replace_track("S", &pts).unwrap();
        store.replace_track("S", &pts[..2]).unwrap();
    }

    let store = SqliteLocationStore::open(path.to_str().unwrap()).unwrap();
    assert_eq!(store.track("S").unwrap().len(), 2);
}

#[test]
fn sub_millisecond_photo_time_stays_inside_window() {
    let store = SqliteLocationStore::in_memory().unwrap();
    store.record_location("S", "U", &ping(46.0, at(9, 30))).unwrap();

    // 30 min plus 600 microseconds before the photo
    let photo = at(10, 0) + TimeDelta::microseconds(600);
    let res = PositionResolver::new(&store).resolve("S", Some(photo), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::Tracked);

    let res = PositionResolver::new(&store).resolve("S", Some(at(10, 0)), "U").unwrap();
    assert_eq!(res.confidence(), PositionConfidence::TimeMatched);
}
