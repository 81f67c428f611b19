//! SQLite-backed location storage.
//!
//! Timestamps are stored as integer milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};

use crate::location_query::LocationQuery;
use crate::model::TrackPoint;

pub struct SqliteLocationStore {
    db: Connection,
}

impl SqliteLocationStore {
    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: &str) -> SqlResult<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqlResult<Self> {
        Self::open(":memory:")
    }

    fn init_schema(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            r#"
            -- Tracked location pings
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                altitude REAL,
                recorded_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_locations_session_time
                ON locations(session_id, recorded_at);
            CREATE INDEX IF NOT EXISTS idx_locations_user_time
                ON locations(user_id, recorded_at);

            -- Uploaded GPX track points, replaced wholesale on re-upload
            CREATE TABLE IF NOT EXISTS gpx_points (
                session_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                altitude REAL,
                recorded_at INTEGER,
                PRIMARY KEY (session_id, sequence)
            );
            "#,
        )
    }

    /// Record a location ping. Points without a timestamp are rejected by
    /// the NOT NULL constraint.
    pub fn record_location(
        &self,
        session_id: &str,
        user_id: &str,
        point: &TrackPoint,
    ) -> SqlResult<()> {
        self.db.execute(
            "INSERT INTO locations (session_id, user_id, latitude, longitude, altitude, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                user_id,
                point.latitude,
                point.longitude,
                point.altitude,
                point.timestamp.map(|t| t.timestamp_millis()),
            ],
        )?;
        Ok(())
    }

    /// Replace the session's GPX track in a single transaction.
    pub fn replace_track(&mut self, session_id: &str, points: &[TrackPoint]) -> SqlResult<()> {
        let tx = self.db.transaction()?;
        let removed = tx.execute(
            "DELETE FROM gpx_points WHERE session_id = ?1",
            params![session_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO gpx_points (session_id, sequence, latitude, longitude, altitude, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for p in points {
                stmt.execute(params![
                    session_id,
                    p.sequence as i64,
                    p.latitude,
                    p.longitude,
                    p.altitude,
                    p.timestamp.map(|t| t.timestamp_millis()),
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "session {session_id}: replaced {removed} track points with {}",
            points.len()
        );
        Ok(())
    }

    /// Stored GPX track of the session, in sequence order.
    pub fn track(&self, session_id: &str) -> SqlResult<Vec<TrackPoint>> {
        let mut stmt = self.db.prepare(
            "SELECT latitude, longitude, altitude, sequence, recorded_at
             FROM gpx_points WHERE session_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt.query_map(params![session_id], row_to_point)?;
        rows.collect()
    }

    fn query_one(&self, sql: &str, key: &str) -> SqlResult<Option<TrackPoint>> {
        self.db
            .query_row(sql, params![key], row_to_point)
            .optional()
    }
}

/// Columns: latitude, longitude, altitude, sequence, recorded_at.
fn row_to_point(row: &Row<'_>) -> SqlResult<TrackPoint> {
    let recorded_at: Option<i64> = row.get(4)?;
    Ok(TrackPoint {
        latitude: row.get(0)?,
        longitude: row.get(1)?,
        altitude: row.get(2)?,
        sequence: row.get::<_, i64>(3)?.max(0) as u64,
        timestamp: recorded_at.and_then(DateTime::<Utc>::from_timestamp_millis),
    })
}

impl LocationQuery for SqliteLocationStore {
    type Error = rusqlite::Error;

    fn locations_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SqlResult<Vec<TrackPoint>> {
        let mut stmt = self.db.prepare(
            "SELECT latitude, longitude, altitude, id, recorded_at
             FROM locations
             WHERE session_id = ?1 AND recorded_at BETWEEN ?2 AND ?3
             ORDER BY recorded_at, id",
        )?;
        let rows = stmt.query_map(
            params![session_id, from.timestamp_millis(), to.timestamp_millis()],
            row_to_point,
        )?;
        rows.collect()
    }

    fn last_location(&self, session_id: &str) -> SqlResult<Option<TrackPoint>> {
        self.query_one(
            "SELECT latitude, longitude, altitude, id, recorded_at
             FROM locations WHERE session_id = ?1
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
            session_id,
        )
    }

    fn last_gpx_point(&self, session_id: &str) -> SqlResult<Option<TrackPoint>> {
        self.query_one(
            "SELECT latitude, longitude, altitude, sequence, recorded_at
             FROM gpx_points WHERE session_id = ?1
             ORDER BY sequence DESC LIMIT 1",
            session_id,
        )
    }

    fn last_location_for_user(&self, user_id: &str) -> SqlResult<Option<TrackPoint>> {
        self.query_one(
            "SELECT latitude, longitude, altitude, id, recorded_at
             FROM locations WHERE user_id = ?1
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
            user_id,
        )
    }
}
