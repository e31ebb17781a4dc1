//! SQLite-backed focus history.
//!
//! Records every focus interval the timer reports (paused stretches and
//! completed phases) and summarises them.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::timer::{FocusInterval, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub id: i64,
    pub phase: Phase,
    pub duration_secs: u64,
    /// True when the phase ran out, false when it was paused.
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_intervals: u64,
    pub total_focus_secs: u64,
    pub total_break_secs: u64,
    pub completed_pomodoros: u64,
    pub today_intervals: u64,
    pub today_focus_secs: u64,
}

/// SQLite database for focus intervals.
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at `<data dir>/torch.db`, creating it if needed.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("torch.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS focus_intervals (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                phase         TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed     INTEGER NOT NULL DEFAULT 0,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_focus_intervals_ended_at ON focus_intervals(ended_at);
            CREATE INDEX IF NOT EXISTS idx_focus_intervals_phase ON focus_intervals(phase);",
        )?;
        Ok(())
    }

    /// Record one reported interval. Returns the new row id.
    pub fn record_interval(&self, interval: &FocusInterval, completed: bool) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO focus_intervals (phase, duration_secs, completed, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                phase_key(interval.phase),
                interval.duration_secs(),
                completed,
                interval.started_at.to_rfc3339(),
                interval.ended_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, ?interval.phase, completed, "focus interval recorded");
        Ok(id)
    }

    /// Most recent intervals first.
    pub fn recent(&self, limit: usize) -> Result<Vec<IntervalRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phase, duration_secs, completed, started_at, ended_at
             FROM focus_intervals
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, phase, duration_secs, completed, started_at, ended_at) = row?;
            records.push(IntervalRecord {
                id,
                phase: parse_phase(&phase),
                duration_secs,
                completed,
                started_at: parse_time(&started_at)?,
                ended_at: parse_time(&ended_at)?,
            });
        }
        Ok(records)
    }

    pub fn stats_today(&self) -> Result<Stats> {
        self.stats_since(Some(today_start()))
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let mut stats = self.stats_since(None)?;
        let today = self.stats_today()?;
        stats.today_intervals = today.today_intervals;
        stats.today_focus_secs = today.today_focus_secs;
        Ok(stats)
    }

    fn stats_since(&self, since: Option<String>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(duration_secs), 0), COALESCE(SUM(completed), 0)
             FROM focus_intervals
             WHERE ?1 IS NULL OR ended_at >= ?1
             GROUP BY phase",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (phase, count, secs, completed) = row?;
            stats.total_intervals += count;
            if parse_phase(&phase) == Phase::Work {
                stats.total_focus_secs += secs;
                stats.completed_pomodoros += completed;
                if since.is_some() {
                    stats.today_intervals += count;
                    stats.today_focus_secs += secs;
                }
            } else {
                stats.total_break_secs += secs;
            }
        }
        Ok(stats)
    }
}

fn phase_key(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "work",
        Phase::ShortBreak => "short_break",
        Phase::LongBreak => "long_break",
    }
}

fn parse_phase(key: &str) -> Phase {
    match key {
        "short_break" => Phase::ShortBreak,
        "long_break" => Phase::LongBreak,
        _ => Phase::Work,
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{raw}': {e}")).into())
}

fn today_start() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn interval(phase: Phase, secs: i64) -> FocusInterval {
        let ended_at = Utc::now();
        FocusInterval {
            phase,
            started_at: ended_at - Duration::seconds(secs),
            ended_at,
        }
    }

    #[test]
    fn record_and_query() {
        let db = HistoryDb::open_memory().unwrap();
        db.record_interval(&interval(Phase::Work, 1500), true).unwrap();
        db.record_interval(&interval(Phase::Work, 300), false).unwrap();
        db.record_interval(&interval(Phase::ShortBreak, 300), true)
            .unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_intervals, 3);
        assert_eq!(stats.total_focus_secs, 1800);
        assert_eq!(stats.total_break_secs, 300);
        assert_eq!(stats.completed_pomodoros, 1);
        assert_eq!(stats.today_focus_secs, 1800);
        assert_eq!(stats.today_intervals, 2);
    }

    #[test]
    fn today_excludes_older_intervals() {
        let db = HistoryDb::open_memory().unwrap();
        let ended_at = Utc::now() - Duration::days(3);
        db.record_interval(
            &FocusInterval {
                phase: Phase::Work,
                started_at: ended_at - Duration::seconds(60),
                ended_at,
            },
            true,
        )
        .unwrap();
        db.record_interval(&interval(Phase::Work, 120), true).unwrap();

        let today = db.stats_today().unwrap();
        assert_eq!(today.today_intervals, 1);
        assert_eq!(today.today_focus_secs, 120);

        let all = db.stats_all().unwrap();
        assert_eq!(all.total_focus_secs, 180);
        assert_eq!(all.today_focus_secs, 120);
    }

    #[test]
    fn recent_returns_newest_first() {
        let db = HistoryDb::open_memory().unwrap();
        let first = db.record_interval(&interval(Phase::Work, 10), false).unwrap();
        let second = db
            .record_interval(&interval(Phase::LongBreak, 20), true)
            .unwrap();

        let records = db.recent(10).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.id == first));
        let newest = records.iter().find(|r| r.id == second).unwrap();
        assert_eq!(newest.phase, Phase::LongBreak);
        assert_eq!(newest.duration_secs, 20);
        assert!(newest.completed);
    }
}
