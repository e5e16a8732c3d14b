//! Collaborator seams consumed by the pipeline service.
//!
//! [`crate::db::Database`] is the production implementation; tests plug in
//! in-memory fakes.

use crate::error::Result;
use crate::models::{Interview, Stage};

pub trait StageStore {
    /// All stages, ordered by position.
    fn list_stages(&self) -> Result<Vec<Stage>>;
    fn insert_stage(&self, name: &str, order: i64) -> Result<Stage>;
    fn rename_stage(&self, id: i64, name: &str) -> Result<Stage>;
}

pub trait InterviewStore {
    fn list_interviews(&self) -> Result<Vec<Interview>>;

    /// Moves one interview and bumps its `updated_at`.
    fn set_stage(&self, id: i64, stage_id: i64) -> Result<Interview>;

    /// Moves every interview in `ids` or none of them.
    ///
    /// The default issues one `set_stage` per id and is only all-or-nothing
    /// when the implementor has nothing to roll back; `Database` overrides it
    /// with a transaction.
    fn set_stage_batch(&self, ids: &[i64], stage_id: i64) -> Result<usize> {
        for id in ids {
            self.set_stage(*id, stage_id)?;
        }
        Ok(ids.len())
    }
}
