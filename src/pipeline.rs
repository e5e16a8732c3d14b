//! Board bootstrap, stale-interview promotion and summary metrics.
//!
//! Every read of the board goes through [`load_board`], which first makes
//! sure the canonical stages exist, then moves stale interviews into
//! Reminder, then groups and counts what is left.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dates;
use crate::error::{Error, Result};
use crate::models::{Interview, InterviewStatus, Stage};
use crate::store::{InterviewStore, StageStore};

pub const REMINDER_STAGE: &str = "Reminder";

/// Default columns and the position each one is expected to hold.
pub const CANONICAL_STAGES: [(&str, i64); 8] = [
    ("Intro", 1),
    ("Recruiter Screen", 2),
    ("Hiring Manager", 3),
    ("Technical Loop", 4),
    ("CTO", 5),
    ("CEO", 6),
    ("Offer", 7),
    (REMINDER_STAGE, 8),
];

#[derive(Debug, Clone, Copy)]
pub struct BoardOptions {
    pub stale_after_days: i64,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            stale_after_days: dates::DEFAULT_STALE_AFTER_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub today: usize,
    pub week: usize,
    pub month: usize,
    pub total: usize,
    pub done: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub stages: Vec<Stage>,
    pub interviews_by_stage: BTreeMap<i64, Vec<Interview>>,
    pub metrics: Metrics,
    pub reminder_count: usize,
}

impl Board {
    pub fn column(&self, stage_id: i64) -> &[Interview] {
        self.interviews_by_stage
            .get(&stage_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reminder_stage(&self) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == REMINDER_STAGE)
    }

    /// Drops cards the filter rejects. Columns, metrics and the reminder
    /// count still describe the whole board.
    pub fn apply_filter(&mut self, filter: &BoardFilter, today: NaiveDate) {
        if filter.is_empty() {
            return;
        }
        for column in self.interviews_by_stage.values_mut() {
            column.retain(|i| filter.matches(i, today));
        }
    }
}

/// Date window for the cards shown on a board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoardView {
    #[default]
    All,
    /// Monday through Sunday of the current week.
    Week,
    /// First through last day of the current month.
    Month,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub view: BoardView,
    pub profile_id: Option<String>,
}

impl BoardFilter {
    pub fn is_empty(&self) -> bool {
        self.view == BoardView::All && self.profile_id.is_none()
    }

    pub fn matches(&self, interview: &Interview, today: NaiveDate) -> bool {
        let in_view = match self.view {
            BoardView::All => true,
            BoardView::Week => dates::is_current_week(interview.interview_date, today),
            BoardView::Month => dates::is_current_month(interview.interview_date, today),
        };
        in_view
            && self
                .profile_id
                .as_deref()
                .is_none_or(|id| interview.profile_id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub moved: Vec<i64>,
}

/// Ensures all canonical stages exist and returns the refreshed stage list.
///
/// A stage sitting at a canonical position under a non-canonical name is
/// renamed when its canonical name is free. Names still missing afterwards
/// are appended after the current highest position, in canonical order.
pub fn reconcile_stages<S: StageStore + ?Sized>(store: &S) -> Result<Vec<Stage>> {
    let mut stages = store.list_stages()?;
    let mut renamed = false;

    for (name, expected_order) in CANONICAL_STAGES {
        if stages.iter().any(|s| s.name == name) {
            continue;
        }
        let Some(at_position) = stages.iter().find(|s| s.order == expected_order) else {
            continue;
        };
        // never take a name away from another canonical column
        if is_canonical(&at_position.name) {
            continue;
        }

        tracing::info!(
            id = at_position.id,
            from = %at_position.name,
            to = name,
            "renaming stage to canonical name"
        );
        let id = at_position.id;
        let updated = store.rename_stage(id, name)?;
        if let Some(slot) = stages.iter_mut().find(|s| s.id == id) {
            *slot = updated;
        }
        renamed = true;
    }

    if renamed {
        stages = store.list_stages()?;
    }

    let missing: Vec<&str> = CANONICAL_STAGES
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !stages.iter().any(|s| s.name == *name))
        .collect();

    if missing.is_empty() {
        return Ok(stages);
    }

    let max_order = stages.iter().map(|s| s.order).max().unwrap_or(0);
    for (index, name) in missing.iter().enumerate() {
        let order = max_order + 1 + index as i64;
        tracing::info!(name, order, "inserting missing stage");
        store.insert_stage(name, order)?;
    }

    store.list_stages()
}

fn is_canonical(name: &str) -> bool {
    CANONICAL_STAGES.iter().any(|(canonical, _)| *canonical == name)
}

/// Moves every stale interview into the Reminder stage as one batch.
///
/// Without a Reminder stage nothing is written. The caller reloads the
/// interview list to observe the moves.
pub fn promote_stale_interviews<S: InterviewStore + ?Sized>(
    store: &S,
    stages: &[Stage],
    interviews: &[Interview],
    today: NaiveDate,
    options: BoardOptions,
) -> Result<PromotionOutcome> {
    let Some(reminder) = stages.iter().find(|s| s.name == REMINDER_STAGE) else {
        tracing::debug!("no Reminder stage; skipping promotion");
        return Ok(PromotionOutcome::default());
    };

    let moved: Vec<i64> = interviews
        .iter()
        .filter(|i| i.stage_id != reminder.id)
        .filter(|i| dates::is_stale(i.interview_date, today, options.stale_after_days))
        .map(|i| i.id)
        .collect();

    if !moved.is_empty() {
        store.set_stage_batch(&moved, reminder.id)?;
        tracing::info!(count = moved.len(), "moved stale interviews to Reminder");
    }

    Ok(PromotionOutcome { moved })
}

/// Groups interviews by stage and computes the board metrics.
pub fn summarize(
    stages: &[Stage],
    interviews: &[Interview],
    today: NaiveDate,
) -> (BTreeMap<i64, Vec<Interview>>, Metrics) {
    let mut grouped: BTreeMap<i64, Vec<Interview>> =
        stages.iter().map(|s| (s.id, Vec::new())).collect();
    for interview in interviews {
        if let Some(column) = grouped.get_mut(&interview.stage_id) {
            column.push(interview.clone());
        }
    }

    (grouped, compute_metrics(interviews, today))
}

pub fn compute_metrics(interviews: &[Interview], today: NaiveDate) -> Metrics {
    let week_start = dates::week_start(today);
    let month_start = dates::month_start(today);

    let mut metrics = Metrics {
        total: interviews.len(),
        ..Default::default()
    };
    for interview in interviews {
        let date = interview.interview_date;
        if date == today {
            metrics.today += 1;
        }
        if date >= week_start {
            metrics.week += 1;
        }
        if date >= month_start {
            metrics.month += 1;
        }
        if interview.status == InterviewStatus::Done {
            metrics.done += 1;
        }
    }

    metrics.pass_rate = if metrics.total > 0 {
        (metrics.done as f64 / metrics.total as f64 * 10000.0).round() / 100.0
    } else {
        0.0
    };
    metrics
}

/// The full read: reconcile, promote, reload, group and count.
pub fn load_board<S>(store: &S, today: NaiveDate, options: BoardOptions) -> Result<Board>
where
    S: StageStore + InterviewStore + ?Sized,
{
    let stages = reconcile_stages(store)?;
    let mut interviews = store.list_interviews()?;

    let outcome = promote_stale_interviews(store, &stages, &interviews, today, options)?;
    if !outcome.moved.is_empty() {
        interviews = store.list_interviews()?;
    }

    let (interviews_by_stage, metrics) = summarize(&stages, &interviews, today);
    let reminder_count = stages
        .iter()
        .find(|s| s.name == REMINDER_STAGE)
        .and_then(|s| interviews_by_stage.get(&s.id))
        .map_or(0, Vec::len);

    Ok(Board {
        stages,
        interviews_by_stage,
        metrics,
        reminder_count,
    })
}

/// Resolves a stage by exact, then case-insensitive name, or by numeric id.
pub fn find_stage<'a>(stages: &'a [Stage], query: &str) -> Result<&'a Stage> {
    let query = query.trim();
    if let Some(stage) = stages.iter().find(|s| s.name == query) {
        return Ok(stage);
    }
    if let Some(stage) = stages.iter().find(|s| s.name.eq_ignore_ascii_case(query)) {
        return Ok(stage);
    }
    if let Ok(id) = query.parse::<i64>() {
        if let Some(stage) = stages.iter().find(|s| s.id == id) {
            return Ok(stage);
        }
    }

    let lowered = query.to_lowercase();
    let suggestion = stages
        .iter()
        .map(|s| (s, strsim::jaro_winkler(&lowered, &s.name.to_lowercase())))
        .filter(|(_, score)| *score >= 0.75)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(s, _)| s.name.clone());

    Err(Error::UnknownStage {
        name: query.to_string(),
        suggestion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::NewInterview;
    use std::cell::{Cell, RefCell};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    fn names(stages: &[Stage]) -> Vec<String> {
        stages.iter().map(|s| s.name.clone()).collect()
    }

    fn interview(id: i64, stage_id: i64, date: &str, status: InterviewStatus) -> Interview {
        Interview {
            id,
            company_name: format!("Company {}", id),
            position: "Engineer".into(),
            job_link: None,
            interviewer_name: "Dana".into(),
            interviewee_name: "Sam".into(),
            interview_date: d(date),
            stage_id,
            status,
            profile_id: None,
            created_at: String::new(),
            updated_at: String::new(),
            last_edited_at: String::new(),
        }
    }

    fn stage(id: i64, name: &str, order: i64) -> Stage {
        Stage {
            id,
            name: name.into(),
            order,
            created_at: String::new(),
        }
    }

    /// In-memory store that counts writes.
    #[derive(Default)]
    struct FakeStore {
        stages: RefCell<Vec<Stage>>,
        interviews: RefCell<Vec<Interview>>,
        writes: Cell<usize>,
        fail_moves: bool,
    }

    impl StageStore for FakeStore {
        fn list_stages(&self) -> Result<Vec<Stage>> {
            let mut stages = self.stages.borrow().clone();
            stages.sort_by_key(|s| (s.order, s.id));
            Ok(stages)
        }

        fn insert_stage(&self, name: &str, order: i64) -> Result<Stage> {
            self.writes.set(self.writes.get() + 1);
            let mut stages = self.stages.borrow_mut();
            if stages.iter().any(|s| s.name == name) {
                return Err(Error::StageExists(name.into()));
            }
            let id = stages.iter().map(|s| s.id).max().unwrap_or(0) + 1;
            let created = stage(id, name, order);
            stages.push(created.clone());
            Ok(created)
        }

        fn rename_stage(&self, id: i64, name: &str) -> Result<Stage> {
            self.writes.set(self.writes.get() + 1);
            let mut stages = self.stages.borrow_mut();
            let s = stages
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| Error::not_found("stage", id))?;
            s.name = name.into();
            Ok(s.clone())
        }
    }

    impl InterviewStore for FakeStore {
        fn list_interviews(&self) -> Result<Vec<Interview>> {
            Ok(self.interviews.borrow().clone())
        }

        fn set_stage(&self, id: i64, stage_id: i64) -> Result<Interview> {
            self.writes.set(self.writes.get() + 1);
            if self.fail_moves {
                return Err(Error::validation("store unavailable"));
            }
            let mut interviews = self.interviews.borrow_mut();
            let i = interviews
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| Error::not_found("interview", id))?;
            i.stage_id = stage_id;
            Ok(i.clone())
        }
    }

    fn canonical_names() -> Vec<String> {
        CANONICAL_STAGES.iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn empty_store_gets_canonical_stages_in_order() {
        let db = test_db();
        let stages = reconcile_stages(&db).unwrap();
        assert_eq!(names(&stages), canonical_names());
        let orders: Vec<i64> = stages.iter().map(|s| s.order).collect();
        assert_eq!(orders, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let db = test_db();
        db.insert_stage("Intro", 1).unwrap();
        db.insert_stage("Phone Screen", 2).unwrap();
        db.insert_stage("Take-home", 12).unwrap();

        let first = reconcile_stages(&db).unwrap();
        let second = reconcile_stages(&db).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn second_reconcile_performs_no_writes() {
        let store = FakeStore::default();
        reconcile_stages(&store).unwrap();
        let after_first = store.writes.get();
        assert_eq!(after_first, 8);

        reconcile_stages(&store).unwrap();
        assert_eq!(store.writes.get(), after_first);
    }

    #[test]
    fn wrong_names_at_canonical_positions_are_repaired() {
        let db = test_db();
        for (i, name) in ["Start", "Screen", "HM", "Loop", "Tech", "Exec", "Deal", "Ping"]
            .iter()
            .enumerate()
        {
            db.insert_stage(name, i as i64 + 1).unwrap();
        }

        let stages = reconcile_stages(&db).unwrap();
        assert_eq!(names(&stages), canonical_names());
    }

    #[test]
    fn partially_seeded_store_is_completed_by_appending() {
        let db = test_db();
        db.insert_stage("Intro", 1).unwrap();
        db.insert_stage("Recruiter Screen", 2).unwrap();
        db.insert_stage("Offer", 7).unwrap();

        let stages = reconcile_stages(&db).unwrap();
        for name in canonical_names() {
            assert_eq!(stages.iter().filter(|s| s.name == name).count(), 1, "{}", name);
        }
        let hiring = stages.iter().find(|s| s.name == "Hiring Manager").unwrap();
        // appended after Offer rather than slotted at position 3
        assert_eq!(hiring.order, 8);
        let reminder = stages.iter().find(|s| s.name == REMINDER_STAGE).unwrap();
        assert_eq!(reminder.order, 12);
    }

    #[test]
    fn custom_stage_off_canonical_positions_survives() {
        let db = test_db();
        reconcile_stages(&db).unwrap();
        let custom = db.add_custom_stage("Take-home").unwrap();

        let stages = reconcile_stages(&db).unwrap();
        let kept = stages.iter().find(|s| s.id == custom.id).unwrap();
        assert_eq!(kept.name, "Take-home");
        assert_eq!(stages.len(), 9);
    }

    #[test]
    fn canonical_names_are_not_stolen_between_columns() {
        // "Intro" sits at position 2; it must not be renamed to "Recruiter Screen"
        let store = FakeStore::default();
        store.stages.borrow_mut().push(stage(1, "Intro", 2));

        let stages = reconcile_stages(&store).unwrap();
        assert_eq!(stages.iter().find(|s| s.id == 1).unwrap().name, "Intro");
        assert_eq!(stages.len(), 8);
    }

    #[test]
    fn stale_interviews_move_to_reminder() {
        let store = FakeStore::default();
        let stages = reconcile_stages(&store).unwrap();
        let intro = stages[0].id;
        let reminder = stages.iter().find(|s| s.name == REMINDER_STAGE).unwrap().id;
        let today = d("2024-05-15");

        store.interviews.borrow_mut().extend([
            interview(1, intro, "2024-05-13", InterviewStatus::Scheduled),
            interview(2, intro, "2024-05-14", InterviewStatus::Scheduled),
            interview(3, reminder, "2024-01-01", InterviewStatus::Scheduled),
            interview(4, intro, "2024-05-20", InterviewStatus::Scheduled),
        ]);
        let interviews = store.list_interviews().unwrap();

        let outcome =
            promote_stale_interviews(&store, &stages, &interviews, today, BoardOptions::default())
                .unwrap();
        assert_eq!(outcome.moved, vec![1]);

        let after = store.list_interviews().unwrap();
        assert_eq!(after[0].stage_id, reminder);
        assert_eq!(after[1].stage_id, intro);
    }

    #[test]
    fn no_reminder_stage_means_no_writes() {
        let store = FakeStore::default();
        store.stages.borrow_mut().push(stage(1, "Intro", 1));
        store
            .interviews
            .borrow_mut()
            .push(interview(1, 1, "2020-01-01", InterviewStatus::Scheduled));

        let stages = store.list_stages().unwrap();
        let interviews = store.list_interviews().unwrap();
        let outcome = promote_stale_interviews(
            &store,
            &stages,
            &interviews,
            d("2024-05-15"),
            BoardOptions::default(),
        )
        .unwrap();

        assert!(outcome.moved.is_empty());
        assert_eq!(store.writes.get(), 0);
    }

    #[test]
    fn promotion_failure_propagates() {
        let store = FakeStore {
            fail_moves: true,
            ..Default::default()
        };
        let stages = vec![stage(1, "Intro", 1), stage(2, REMINDER_STAGE, 2)];
        let interviews = vec![interview(1, 1, "2020-01-01", InterviewStatus::Scheduled)];

        let result =
            promote_stale_interviews(&store, &stages, &interviews, d("2024-05-15"), BoardOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn metrics_follow_calendar_windows() {
        // 2024-05-15 is a Wednesday; week starts 05-13, month 05-01
        let today = d("2024-05-15");
        let interviews = vec![
            interview(1, 1, "2024-05-15", InterviewStatus::Done),
            interview(2, 1, "2024-05-14", InterviewStatus::Scheduled),
            interview(3, 1, "2024-05-07", InterviewStatus::Done),
            interview(4, 1, "2024-04-05", InterviewStatus::Canceled),
        ];

        let metrics = compute_metrics(&interviews, today);
        assert_eq!(
            metrics,
            Metrics {
                today: 1,
                week: 2,
                month: 3,
                total: 4,
                done: 2,
                pass_rate: 50.0,
            }
        );
    }

    #[test]
    fn pass_rate_rounds_to_two_places() {
        let today = d("2024-05-15");
        let interviews = vec![
            interview(1, 1, "2024-05-15", InterviewStatus::Done),
            interview(2, 1, "2024-05-15", InterviewStatus::Scheduled),
            interview(3, 1, "2024-05-15", InterviewStatus::Scheduled),
        ];
        assert_eq!(compute_metrics(&interviews, today).pass_rate, 33.33);
    }

    #[test]
    fn empty_board_has_zero_pass_rate() {
        let metrics = compute_metrics(&[], d("2024-05-15"));
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.pass_rate, 0.0);
    }

    #[test]
    fn every_stage_gets_a_column() {
        let stages = vec![stage(1, "Intro", 1), stage(2, "Offer", 2), stage(3, "Reminder", 3)];
        let interviews = vec![interview(1, 1, "2024-05-15", InterviewStatus::Scheduled)];

        let (grouped, _) = summarize(&stages, &interviews, d("2024-05-15"));
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[&1].len(), 1);
        assert!(grouped[&2].is_empty());
        assert!(grouped[&3].is_empty());
    }

    #[test]
    fn load_board_runs_the_whole_read() {
        let db = test_db();
        let today = d("2024-05-15");
        let stages = reconcile_stages(&db).unwrap();
        let intro = stages[0].id;

        for (company, date) in [("Acme", "2024-05-15"), ("Globex", "2024-05-10")] {
            db.create_interview(&NewInterview {
                company_name: company.into(),
                position: "Engineer".into(),
                job_link: None,
                interviewer_name: "Dana".into(),
                interviewee_name: "Sam".into(),
                interview_date: d(date),
                stage_id: intro,
                profile_id: None,
            })
            .unwrap();
        }

        let board = load_board(&db, today, BoardOptions::default()).unwrap();
        assert_eq!(board.stages.len(), 8);
        assert_eq!(board.interviews_by_stage.len(), 8);
        assert_eq!(board.reminder_count, 1);
        assert_eq!(board.column(intro).len(), 1);
        assert_eq!(board.column(intro)[0].company_name, "Acme");
        assert_eq!(board.metrics.total, 2);

        let json = serde_json::to_value(&board).unwrap();
        assert!(json["interviews_by_stage"].is_object());
    }

    #[test]
    fn stale_threshold_is_configurable() {
        let db = test_db();
        let today = d("2024-05-15");
        let stages = reconcile_stages(&db).unwrap();
        db.create_interview(&NewInterview {
            company_name: "Acme".into(),
            position: "Engineer".into(),
            job_link: None,
            interviewer_name: "Dana".into(),
            interviewee_name: "Sam".into(),
            interview_date: d("2024-05-12"),
            stage_id: stages[0].id,
            profile_id: None,
        })
        .unwrap();

        let lenient = BoardOptions { stale_after_days: 7 };
        assert_eq!(load_board(&db, today, lenient).unwrap().reminder_count, 0);
        assert_eq!(
            load_board(&db, today, BoardOptions::default()).unwrap().reminder_count,
            1
        );
    }

    #[test]
    fn stage_lookup_suggests_close_names() {
        let stages = vec![stage(1, "Intro", 1), stage(4, "Technical Loop", 4)];
        assert_eq!(find_stage(&stages, "intro").unwrap().id, 1);
        assert_eq!(find_stage(&stages, "4").unwrap().id, 4);

        match find_stage(&stages, "Technical Lop") {
            Err(Error::UnknownStage { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("Technical Loop"));
            }
            other => panic!("expected unknown stage, got {:?}", other),
        }
    }

    #[test]
    fn board_filter_limits_cards_but_not_metrics() {
        let today = d("2024-05-15"); // Wednesday
        let stages = vec![stage(1, "Intro", 1), stage(2, "Offer", 2)];
        let mut sunday = interview(1, 1, "2024-05-19", InterviewStatus::Scheduled);
        sunday.profile_id = Some("p-1".into());
        let last_week = interview(2, 1, "2024-05-12", InterviewStatus::Done);
        let mut next_month = interview(3, 2, "2024-06-01", InterviewStatus::Scheduled);
        next_month.profile_id = Some("p-1".into());
        let interviews = vec![sunday, last_week, next_month];

        let (interviews_by_stage, metrics) = summarize(&stages, &interviews, today);
        let board = Board {
            stages,
            interviews_by_stage,
            metrics,
            reminder_count: 0,
        };
        let ids = |b: &Board| -> Vec<i64> {
            b.interviews_by_stage.values().flatten().map(|i| i.id).collect()
        };

        let mut week = board.clone();
        week.apply_filter(
            &BoardFilter {
                view: BoardView::Week,
                profile_id: None,
            },
            today,
        );
        assert_eq!(ids(&week), vec![1]);
        assert_eq!(week.metrics, board.metrics);
        assert!(week.column(2).is_empty());

        let mut month = board.clone();
        month.apply_filter(
            &BoardFilter {
                view: BoardView::Month,
                profile_id: None,
            },
            today,
        );
        assert_eq!(ids(&month), vec![1, 2]);

        let mut profile = board.clone();
        profile.apply_filter(
            &BoardFilter {
                view: BoardView::All,
                profile_id: Some("p-1".into()),
            },
            today,
        );
        assert_eq!(ids(&profile), vec![1, 3]);

        let mut unfiltered = board.clone();
        unfiltered.apply_filter(&BoardFilter::default(), today);
        assert_eq!(ids(&unfiltered), vec![1, 2, 3]);
    }
}
