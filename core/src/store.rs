//! SQLite persistence for mission runs: the run record, the script event
//! log and periodic snapshots.
//!
//! RULE: Only store.rs talks to the database.

use rusqlite::{Connection, OptionalExtension, Row, params};
use crate::{
    error::ScriptResult,
    event::EventLogEntry,
    types::Tick,
};

const SCHEMA: &str = include_str!("../../migrations/001_foundation.sql");

pub struct ScriptStore {
    conn: Connection,
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<EventLogEntry> {
    Ok(EventLogEntry {
        id:         Some(row.get(0)?),
        run_id:     row.get(1)?,
        tick:       row.get::<_, i64>(2)? as Tick,
        source:     row.get(3)?,
        event_type: row.get(4)?,
        payload:    row.get(5)?,
    })
}

impl ScriptStore {
    /// Opens (or creates) the run database at `path`.
    pub fn open(path: &str) -> ScriptResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// In-memory database for tests and throwaway runs.
    pub fn in_memory() -> ScriptResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ScriptResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Creates the schema. Safe to call on an existing database.
    pub fn migrate(&self) -> ScriptResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, mission: &str, version: &str) -> ScriptResult<()> {
        let started_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO run (run_id, mission, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, mission, version, started_at],
        )?;
        log::debug!("run {run_id} registered for mission '{mission}'");
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> ScriptResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.run_id, entry.tick as i64, entry.source, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    /// Events logged during `tick`, in the order they happened.
    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> ScriptResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![run_id, tick as i64], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every event of one type across the run, oldest first.
    pub fn events_of_type(&self, run_id: &str, event_type: &str) -> ScriptResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND event_type = ?2
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![run_id, event_type], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn event_count_of_type(&self, run_id: &str, event_type: &str) -> ScriptResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Tick of the first logged event of `event_type`, if any.
    pub fn first_tick_of_type(&self, run_id: &str, event_type: &str) -> ScriptResult<Option<Tick>> {
        let tick: Option<i64> = self.conn.query_row(
            "SELECT MIN(tick) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(tick.map(|t| t as Tick))
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, tick: Tick, state_json: &str) -> ScriptResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (run_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, tick as i64, state_json],
        )?;
        Ok(())
    }

    /// The newest snapshot taken at or before `tick`.
    pub fn latest_snapshot_before(&self, run_id: &str, tick: Tick) -> ScriptResult<Option<(Tick, String)>> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT tick, state_json FROM snapshot
                 WHERE run_id = ?1 AND tick <= ?2
                 ORDER BY tick DESC LIMIT 1",
                params![run_id, tick as i64],
                |row| Ok((row.get::<_, i64>(0)? as Tick, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(snapshot)
    }
}
