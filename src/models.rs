use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: i64,
    pub name: String,
    pub order: i64, // 1-based column position
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Rescheduled,
    Done,
    Canceled,
}

impl InterviewStatus {
    pub const ALL: [InterviewStatus; 4] = [
        InterviewStatus::Scheduled,
        InterviewStatus::Rescheduled,
        InterviewStatus::Done,
        InterviewStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Rescheduled => "rescheduled",
            InterviewStatus::Done => "done",
            InterviewStatus::Canceled => "canceled",
        }
    }

    /// Next status in the cycle used by the board browser.
    pub fn cycle(self) -> Self {
        match self {
            InterviewStatus::Scheduled => InterviewStatus::Rescheduled,
            InterviewStatus::Rescheduled => InterviewStatus::Done,
            InterviewStatus::Done => InterviewStatus::Canceled,
            InterviewStatus::Canceled => InterviewStatus::Scheduled,
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for InterviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(InterviewStatus::Scheduled),
            "rescheduled" => Ok(InterviewStatus::Rescheduled),
            "done" => Ok(InterviewStatus::Done),
            "canceled" | "cancelled" => Ok(InterviewStatus::Canceled),
            other => {
                let expected: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                Err(format!(
                    "unknown status '{}' (expected {})",
                    other,
                    expected.join(", ")
                ))
            }
        }
    }
}

impl ToSql for InterviewStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InterviewStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub company_name: String,
    pub position: String,
    pub job_link: Option<String>,
    pub interviewer_name: String,
    pub interviewee_name: String,
    pub interview_date: NaiveDate,
    pub stage_id: i64,
    pub status: InterviewStatus,
    pub profile_id: Option<String>, // loose link into profiles.json
    pub created_at: String,
    pub updated_at: String,
    pub last_edited_at: String,
}

/// Fields required to open a new interview card.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub company_name: String,
    pub position: String,
    pub job_link: Option<String>,
    pub interviewer_name: String,
    pub interviewee_name: String,
    pub interview_date: NaiveDate,
    pub stage_id: i64,
    pub profile_id: Option<String>,
}

/// Partial edit; `None` leaves the column untouched. For the nullable
/// columns, `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct InterviewUpdate {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub job_link: Option<Option<String>>,
    pub interviewer_name: Option<String>,
    pub interviewee_name: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub stage_id: Option<i64>,
    pub status: Option<InterviewStatus>,
    pub profile_id: Option<Option<String>>,
}

impl InterviewUpdate {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.position.is_none()
            && self.job_link.is_none()
            && self.interviewer_name.is_none()
            && self.interviewee_name.is_none()
            && self.interview_date.is_none()
            && self.stage_id.is_none()
            && self.status.is_none()
            && self.profile_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub interview_id: i64,
    pub stage_id: i64,
    pub tracked_date: NaiveDate,
    pub duration_minutes: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub id: i64,
    pub interview_id: i64,
    pub stage_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_both_spellings() {
        assert_eq!("done".parse::<InterviewStatus>(), Ok(InterviewStatus::Done));
        assert_eq!(
            "Cancelled".parse::<InterviewStatus>(),
            Ok(InterviewStatus::Canceled)
        );
        assert!("pending".parse::<InterviewStatus>().is_err());
    }

    #[test]
    fn status_cycle_visits_every_value() {
        let mut status = InterviewStatus::Scheduled;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(status);
            status = status.cycle();
        }
        assert_eq!(status, InterviewStatus::Scheduled);
        assert_eq!(seen, InterviewStatus::ALL.to_vec());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&InterviewStatus::Rescheduled).unwrap();
        assert_eq!(json, "\"rescheduled\"");
    }
}
