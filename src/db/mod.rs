//! Database module - SQLite storage for sessions, history and feedback

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};

use tracing::warn;

use crate::history::{ProgramCredit, SessionLog, SessionSummary, WorkoutLog};
use crate::session::{PersistenceGateway, SessionRecord};
use crate::workouts::{self, FeedbackRating, SPECIAL_PROGRAM_DAYS};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Throwaway database, nothing touches the disk
    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_state (
                workout_id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workout_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                workout_id TEXT NOT NULL,
                completed INTEGER NOT NULL,
                total INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exercise_feedback (
                exercise TEXT PRIMARY KEY,
                rating TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exercise_executions (
                exercise TEXT PRIMARY KEY,
                count INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS program_progress (
                stage_id INTEGER PRIMARY KEY,
                days INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS special_program (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_day INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Ids of workouts with an unfinished session
    pub fn pending_sessions(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT workout_id FROM session_state ORDER BY updated_at DESC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Workout log grouped by day, most recent first
    pub fn get_workout_history(&self) -> Result<Vec<WorkoutLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, workout_id, completed, total FROM workout_sessions ORDER BY date DESC, id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let date: String = row.get(0)?;
                Ok((
                    date,
                    SessionLog {
                        workout_id: row.get(1)?,
                        completed: row.get(2)?,
                        total: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut logs: Vec<WorkoutLog> = Vec::new();
        for (date, session) in rows {
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .with_context(|| format!("bad date in workout_sessions: {}", date))?;
            match logs.last_mut() {
                Some(log) if log.date == date => log.sessions.push(session),
                _ => logs.push(WorkoutLog { date, sessions: vec![session] }),
            }
        }
        Ok(logs)
    }

    pub fn get_feedback(&self) -> Result<BTreeMap<String, FeedbackRating>> {
        let mut stmt = self
            .conn
            .prepare("SELECT exercise, rating FROM exercise_feedback")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(exercise, rating)| -> Result<(String, FeedbackRating)> {
                Ok((exercise, rating.parse()?))
            })
            .collect()
    }

    /// How many times each exercise was completed
    pub fn get_execution_counts(&self) -> Result<BTreeMap<String, u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT exercise, count FROM exercise_executions")?;
        let counts: BTreeMap<String, u32> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        Ok(counts)
    }

    /// Training days done per recovery stage
    pub fn get_program_progress(&self) -> Result<BTreeMap<u32, u32>> {
        read_progress(&self.conn)
    }

    /// Current day of the 30-day course, starting at 1
    pub fn get_special_program_day(&self) -> Result<u32> {
        let day: Option<u32> = self
            .conn
            .query_row("SELECT current_day FROM special_program WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        Ok(day.unwrap_or(1))
    }

    #[cfg(test)]
    pub(crate) fn put_raw_session(&self, workout_id: &str, raw: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session_state (workout_id, record, updated_at) VALUES (?1, ?2, ?3)",
            params![workout_id, raw, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn read_progress(conn: &Connection) -> Result<BTreeMap<u32, u32>> {
    let mut stmt = conn.prepare("SELECT stage_id, days FROM program_progress")?;
    let progress: BTreeMap<u32, u32> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;
    Ok(progress)
}

impl PersistenceGateway for Database {
    fn load_session(&self, workout_id: &str) -> Result<Option<SessionRecord>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM session_state WHERE workout_id = ?1",
                params![workout_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Discarding unreadable session for '{}': {}", workout_id, e);
                self.clear_session(workout_id)?;
                Ok(None)
            }
        }
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO session_state (workout_id, record, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(workout_id) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at",
            params![record.workout_id, raw, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear_session(&self, workout_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM session_state WHERE workout_id = ?1",
            params![workout_id],
        )?;
        Ok(())
    }

    /// Session row, execution counters and plan progress in one transaction
    fn append_history(&self, date: NaiveDate, summary: &SessionSummary) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO workout_sessions (date, workout_id, completed, total) VALUES (?1, ?2, ?3, ?4)",
            params![
                date.format(DATE_FORMAT).to_string(),
                summary.workout_id,
                summary.completed,
                summary.total,
            ],
        )?;

        for exercise in &summary.completed_exercises {
            tx.execute(
                "INSERT INTO exercise_executions (exercise, count) VALUES (?1, 1)
                 ON CONFLICT(exercise) DO UPDATE SET count = count + 1",
                params![exercise],
            )?;
        }

        let stage_id = match summary.credit {
            ProgramCredit::Stage(id) => Some(id),
            ProgramCredit::CurrentStage => Some(workouts::current_stage(&read_progress(&tx)?).id),
            ProgramCredit::SpecialDay | ProgramCredit::None => None,
        };
        if let Some(stage_id) = stage_id {
            tx.execute(
                "INSERT INTO program_progress (stage_id, days) VALUES (?1, 1)
                 ON CONFLICT(stage_id) DO UPDATE SET days = days + 1",
                params![stage_id],
            )?;
        }

        if summary.credit == ProgramCredit::SpecialDay {
            tx.execute(
                "INSERT INTO special_program (id, current_day) VALUES (1, MIN(2, ?1))
                 ON CONFLICT(id) DO UPDATE SET current_day = MIN(current_day + 1, ?1)",
                params![SPECIAL_PROGRAM_DAYS],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn record_feedback(&self, exercise: &str, rating: FeedbackRating) -> Result<()> {
        self.conn.execute(
            "INSERT INTO exercise_feedback (exercise, rating) VALUES (?1, ?2)
             ON CONFLICT(exercise) DO UPDATE SET rating = excluded.rating",
            params![exercise, rating.as_str()],
        )?;
        Ok(())
    }
}
