use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{
    Interview, InterviewStatus, InterviewUpdate, NewInterview, Stage, TimeEntry, Transcription,
};
use crate::store::{InterviewStore, StageStore};

const INTERVIEW_COLUMNS: &str = "id, company_name, position, job_link, interviewer_name,
     interviewee_name, interview_date, stage_id, status, profile_id,
     created_at, updated_at, last_edited_at";

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS stages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS interviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                position TEXT NOT NULL,
                job_link TEXT,
                interviewer_name TEXT NOT NULL,
                interviewee_name TEXT NOT NULL,
                interview_date TEXT NOT NULL,
                stage_id INTEGER NOT NULL REFERENCES stages(id),
                status TEXT NOT NULL DEFAULT 'scheduled'
                    CHECK (status IN ('scheduled', 'rescheduled', 'done', 'canceled')),
                profile_id TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_edited_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS time_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                interview_id INTEGER NOT NULL REFERENCES interviews(id) ON DELETE CASCADE,
                stage_id INTEGER NOT NULL REFERENCES stages(id),
                tracked_date TEXT NOT NULL,
                duration_minutes INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS transcriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                interview_id INTEGER NOT NULL REFERENCES interviews(id) ON DELETE CASCADE,
                stage_id INTEGER NOT NULL REFERENCES stages(id),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_interviews_stage ON interviews(stage_id);
            CREATE INDEX IF NOT EXISTS idx_interviews_date ON interviews(interview_date);
            CREATE INDEX IF NOT EXISTS idx_time_entries_interview ON time_entries(interview_id);
            CREATE INDEX IF NOT EXISTS idx_transcriptions_interview ON transcriptions(interview_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='interviews'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(Error::validation(
                "database not initialized; run 'pipeline init' first",
            ));
        }
        Ok(())
    }

    // --- Stage operations ---

    pub fn get_stage(&self, id: i64) -> Result<Option<Stage>> {
        self.conn
            .query_row(
                "SELECT id, name, position, created_at FROM stages WHERE id = ?1",
                [id],
                Self::row_to_stage,
            )
            .optional()
            .map_err(Error::from)
    }

    /// Appends a user-defined stage after every existing one.
    pub fn add_custom_stage(&self, name: &str) -> Result<Stage> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("stage name is required"));
        }

        let stages = self.list_stages()?;
        if stages.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(Error::StageExists(name.to_string()));
        }
        let max_order = stages.iter().map(|s| s.order).max().unwrap_or(0);
        self.insert_stage(name, max_order + 1)
    }

    /// Applies explicit `(id, order)` pairs in one transaction.
    pub fn reorder_stages(&self, orders: &[(i64, i64)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (id, order) in orders {
            let changed = tx.execute(
                "UPDATE stages SET position = ?1 WHERE id = ?2",
                params![order, id],
            )?;
            if changed == 0 {
                return Err(Error::not_found("stage", id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Moves one stage to `position` (1-based) and renumbers all stages 1..n.
    pub fn move_stage(&self, id: i64, position: usize) -> Result<Vec<Stage>> {
        let mut stages = self.list_stages()?;
        let from = stages
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::not_found("stage", id))?;
        let stage = stages.remove(from);
        let to = position.clamp(1, stages.len() + 1) - 1;
        stages.insert(to, stage);

        let orders: Vec<(i64, i64)> = stages
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i as i64 + 1))
            .collect();
        self.reorder_stages(&orders)?;
        self.list_stages()
    }

    fn row_to_stage(row: &rusqlite::Row) -> rusqlite::Result<Stage> {
        Ok(Stage {
            id: row.get(0)?,
            name: row.get(1)?,
            order: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // --- Interview operations ---

    pub fn get_interview(&self, id: i64) -> Result<Option<Interview>> {
        let sql = format!("SELECT {} FROM interviews WHERE id = ?1", INTERVIEW_COLUMNS);
        self.conn
            .query_row(&sql, [id], Self::row_to_interview)
            .optional()
            .map_err(Error::from)
    }

    pub fn create_interview(&self, new: &NewInterview) -> Result<Interview> {
        if new.company_name.trim().is_empty() || new.position.trim().is_empty() {
            return Err(Error::validation("company and position are required"));
        }
        self.conn.execute(
            "INSERT INTO interviews (company_name, position, job_link, interviewer_name,
                                     interviewee_name, interview_date, stage_id, status, profile_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.company_name.trim(),
                new.position.trim(),
                new.job_link,
                new.interviewer_name,
                new.interviewee_name,
                new.interview_date,
                new.stage_id,
                InterviewStatus::Scheduled,
                new.profile_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, company = %new.company_name, "created interview");
        self.get_interview(id)?
            .ok_or_else(|| Error::not_found("interview", id))
    }

    /// Writes only the fields present in `update`; bumps both edit timestamps.
    pub fn update_interview(&self, id: i64, update: &InterviewUpdate) -> Result<Interview> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let mut push = |column: &str, value: Box<dyn rusqlite::ToSql>| {
            values.push(value);
            sets.push(format!("{} = ?{}", column, values.len()));
        };

        if let Some(v) = &update.company_name {
            push("company_name", Box::new(v.clone()));
        }
        if let Some(v) = &update.position {
            push("position", Box::new(v.clone()));
        }
        if let Some(v) = &update.job_link {
            push("job_link", Box::new(v.clone()));
        }
        if let Some(v) = &update.interviewer_name {
            push("interviewer_name", Box::new(v.clone()));
        }
        if let Some(v) = &update.interviewee_name {
            push("interviewee_name", Box::new(v.clone()));
        }
        if let Some(v) = update.interview_date {
            push("interview_date", Box::new(v));
        }
        if let Some(v) = update.stage_id {
            push("stage_id", Box::new(v));
        }
        if let Some(v) = update.status {
            push("status", Box::new(v));
        }
        if let Some(v) = &update.profile_id {
            push("profile_id", Box::new(v.clone()));
        }

        sets.push("updated_at = datetime('now')".to_string());
        sets.push("last_edited_at = datetime('now')".to_string());
        values.push(Box::new(id));

        let sql = format!(
            "UPDATE interviews SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        let changed = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        if changed == 0 {
            return Err(Error::not_found("interview", id));
        }
        tracing::debug!(id, "updated interview");
        self.get_interview(id)?
            .ok_or_else(|| Error::not_found("interview", id))
    }

    pub fn delete_interview(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM interviews WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::not_found("interview", id));
        }
        tracing::info!(id, "deleted interview");
        Ok(())
    }

    /// Case-insensitive substring match on company, position and interviewer.
    pub fn search_interviews(&self, query: &str) -> Result<Vec<Interview>> {
        let sql = format!(
            "SELECT {} FROM interviews
             WHERE company_name LIKE ?1 OR position LIKE ?1 OR interviewer_name LIKE ?1
             ORDER BY updated_at DESC, id DESC",
            INTERVIEW_COLUMNS
        );
        let pattern = format!("%{}%", query.trim());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([pattern], Self::row_to_interview)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    pub fn list_interviews_for_profile(&self, profile_id: &str) -> Result<Vec<Interview>> {
        let sql = format!(
            "SELECT {} FROM interviews WHERE profile_id = ?1 ORDER BY interview_date DESC, id DESC",
            INTERVIEW_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([profile_id], Self::row_to_interview)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Interviews dated within `start..=end`.
    pub fn interviews_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Interview>> {
        let sql = format!(
            "SELECT {} FROM interviews
             WHERE interview_date >= ?1 AND interview_date <= ?2
             ORDER BY updated_at DESC, id DESC",
            INTERVIEW_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![start, end], Self::row_to_interview)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn row_to_interview(row: &rusqlite::Row) -> rusqlite::Result<Interview> {
        Ok(Interview {
            id: row.get(0)?,
            company_name: row.get(1)?,
            position: row.get(2)?,
            job_link: row.get(3)?,
            interviewer_name: row.get(4)?,
            interviewee_name: row.get(5)?,
            interview_date: row.get(6)?,
            stage_id: row.get(7)?,
            status: row.get(8)?,
            profile_id: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            last_edited_at: row.get(12)?,
        })
    }

    // --- Time tracking and transcriptions ---

    pub fn add_time_entry(
        &self,
        interview_id: i64,
        stage_id: i64,
        tracked_date: NaiveDate,
        duration_minutes: Option<i64>,
    ) -> Result<TimeEntry> {
        self.conn.execute(
            "INSERT INTO time_entries (interview_id, stage_id, tracked_date, duration_minutes)
             VALUES (?1, ?2, ?3, ?4)",
            params![interview_id, stage_id, tracked_date, duration_minutes],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, interview_id, stage_id, tracked_date, duration_minutes, created_at
                 FROM time_entries WHERE id = ?1",
                [id],
                Self::row_to_time_entry,
            )
            .map_err(Error::from)
    }

    pub fn time_entries_for(&self, interview_id: i64) -> Result<Vec<TimeEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, interview_id, stage_id, tracked_date, duration_minutes, created_at
             FROM time_entries WHERE interview_id = ?1
             ORDER BY tracked_date DESC, id DESC",
        )?;
        let rows = stmt.query_map([interview_id], Self::row_to_time_entry)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn row_to_time_entry(row: &rusqlite::Row) -> rusqlite::Result<TimeEntry> {
        Ok(TimeEntry {
            id: row.get(0)?,
            interview_id: row.get(1)?,
            stage_id: row.get(2)?,
            tracked_date: row.get(3)?,
            duration_minutes: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn add_transcription(
        &self,
        interview_id: i64,
        stage_id: i64,
        content: &str,
    ) -> Result<Transcription> {
        if content.trim().is_empty() {
            return Err(Error::validation("transcription is empty"));
        }
        self.conn.execute(
            "INSERT INTO transcriptions (interview_id, stage_id, content) VALUES (?1, ?2, ?3)",
            params![interview_id, stage_id, content],
        )?;
        self.get_transcription(self.conn.last_insert_rowid())
    }

    pub fn update_transcription(&self, id: i64, content: &str) -> Result<Transcription> {
        let changed = self.conn.execute(
            "UPDATE transcriptions SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![content, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("transcription", id));
        }
        self.get_transcription(id)
    }

    fn get_transcription(&self, id: i64) -> Result<Transcription> {
        self.conn
            .query_row(
                "SELECT id, interview_id, stage_id, content, created_at, updated_at
                 FROM transcriptions WHERE id = ?1",
                [id],
                Self::row_to_transcription,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("transcription", id))
    }

    pub fn transcriptions_for(&self, interview_id: i64) -> Result<Vec<Transcription>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, interview_id, stage_id, content, created_at, updated_at
             FROM transcriptions WHERE interview_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([interview_id], Self::row_to_transcription)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn row_to_transcription(row: &rusqlite::Row) -> rusqlite::Result<Transcription> {
        Ok(Transcription {
            id: row.get(0)?,
            interview_id: row.get(1)?,
            stage_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl StageStore for Database {
    fn list_stages(&self) -> Result<Vec<Stage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, position, created_at FROM stages ORDER BY position, id",
        )?;
        let rows = stmt.query_map([], Self::row_to_stage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn insert_stage(&self, name: &str, order: i64) -> Result<Stage> {
        self.conn.execute(
            "INSERT INTO stages (name, position) VALUES (?1, ?2)",
            params![name, order],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, name, order, "inserted stage");
        self.get_stage(id)?.ok_or_else(|| Error::not_found("stage", id))
    }

    fn rename_stage(&self, id: i64, name: &str) -> Result<Stage> {
        let changed = self
            .conn
            .execute("UPDATE stages SET name = ?1 WHERE id = ?2", params![name, id])?;
        if changed == 0 {
            return Err(Error::not_found("stage", id));
        }
        self.get_stage(id)?.ok_or_else(|| Error::not_found("stage", id))
    }
}

impl InterviewStore for Database {
    fn list_interviews(&self) -> Result<Vec<Interview>> {
        let sql = format!(
            "SELECT {} FROM interviews ORDER BY updated_at DESC, id DESC",
            INTERVIEW_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_interview)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn set_stage(&self, id: i64, stage_id: i64) -> Result<Interview> {
        let changed = self.conn.execute(
            "UPDATE interviews SET stage_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![stage_id, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("interview", id));
        }
        self.get_interview(id)?
            .ok_or_else(|| Error::not_found("interview", id))
    }

    fn set_stage_batch(&self, ids: &[i64], stage_id: i64) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for id in ids {
            let changed = tx.execute(
                "UPDATE interviews SET stage_id = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![stage_id, id],
            )?;
            if changed == 0 {
                // dropping tx rolls back the moves issued so far
                return Err(Error::not_found("interview", id));
            }
        }
        tx.commit()?;
        Ok(ids.len())
    }
}
