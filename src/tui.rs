use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::{Duration, Instant};

use crate::dates;
use crate::db::Database;
use crate::models::{Interview, InterviewStatus, InterviewUpdate, TimeEntry, Transcription};
use crate::pipeline::{self, Board, BoardFilter, BoardOptions, REMINDER_STAGE};

struct AppState {
    board: Board,
    filter: BoardFilter,
    column: usize,
    row: usize,
    scroll_offset: u16,
    time_entries: Vec<TimeEntry>,
    transcriptions: Vec<Transcription>,
    message: Option<String>,
}

impl AppState {
    fn new(mut board: Board, filter: BoardFilter) -> Self {
        board.apply_filter(&filter, dates::today());
        Self {
            board,
            filter,
            column: 0,
            row: 0,
            scroll_offset: 0,
            time_entries: Vec::new(),
            transcriptions: Vec::new(),
            message: None,
        }
    }

    fn cards(&self) -> &[Interview] {
        match self.board.stages.get(self.column) {
            Some(stage) => self.board.column(stage.id),
            None => &[],
        }
    }

    fn current(&self) -> Option<&Interview> {
        self.cards().get(self.row)
    }

    /// Swaps in a fresh board, keeping the selection on the same card if it still exists.
    fn replace_board(&mut self, mut board: Board) {
        board.apply_filter(&self.filter, dates::today());
        let selected = self.current().map(|i| i.id);
        self.board = board;
        if let Some(id) = selected {
            if let Some((col, row)) = self.locate(id) {
                self.column = col;
                self.row = row;
                return;
            }
        }
        self.clamp();
    }

    fn locate(&self, interview_id: i64) -> Option<(usize, usize)> {
        self.board.stages.iter().enumerate().find_map(|(col, stage)| {
            self.board
                .column(stage.id)
                .iter()
                .position(|i| i.id == interview_id)
                .map(|row| (col, row))
        })
    }

    fn clamp(&mut self) {
        let columns = self.board.stages.len();
        if columns == 0 {
            self.column = 0;
        } else if self.column >= columns {
            self.column = columns - 1;
        }
        let rows = self.cards().len();
        if rows == 0 {
            self.row = 0;
        } else if self.row >= rows {
            self.row = rows - 1;
        }
    }

    fn load_detail(&mut self, db: &Database) {
        let Some(id) = self.current().map(|i| i.id) else {
            self.time_entries.clear();
            self.transcriptions.clear();
            return;
        };
        self.time_entries = db.time_entries_for(id).unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "loading time entries failed");
            Vec::new()
        });
        self.transcriptions = db.transcriptions_for(id).unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "loading transcriptions failed");
            Vec::new()
        });
    }

    fn left(&mut self) {
        if self.column > 0 {
            self.column -= 1;
            self.row = 0;
            self.scroll_offset = 0;
        }
    }

    fn right(&mut self) {
        if self.column + 1 < self.board.stages.len() {
            self.column += 1;
            self.row = 0;
            self.scroll_offset = 0;
        }
    }

    fn next(&mut self) {
        if self.row + 1 < self.cards().len() {
            self.row += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_board(
    db: &Database,
    options: BoardOptions,
    filter: BoardFilter,
    refresh: Duration,
) -> Result<()> {
    let board = pipeline::load_board(db, dates::today(), options)?;
    let mut state = AppState::new(board, filter);
    state.load_detail(db);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db, options, refresh);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

enum KeyOutcome {
    Continue,
    Refreshed,
    Quit,
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
    options: BoardOptions,
    refresh: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    loop {
        terminal.draw(|frame| draw(frame, state))?;

        let timeout = refresh.saturating_sub(last_refresh.elapsed());
        if !event::poll(timeout)? {
            state.message = None;
            reload(state, db, options);
            last_refresh = Instant::now();
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match handle_key(state, db, options, key.code) {
                KeyOutcome::Quit => break,
                KeyOutcome::Refreshed => last_refresh = Instant::now(),
                KeyOutcome::Continue => {}
            }
        }
    }
    Ok(())
}

fn handle_key(
    state: &mut AppState,
    db: &Database,
    options: BoardOptions,
    code: KeyCode,
) -> KeyOutcome {
    let prev_selected = state.current().map(|i| i.id);
    // a message stays up until the next key
    state.message = None;
    let mut outcome = KeyOutcome::Continue;
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Left | KeyCode::Char('h') => state.left(),
        KeyCode::Right | KeyCode::Char('l') => state.right(),
        KeyCode::Down | KeyCode::Char('j') => state.next(),
        KeyCode::Up | KeyCode::Char('k') => state.prev(),
        KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
        KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
        KeyCode::Char('H') => move_card(state, db, -1),
        KeyCode::Char('L') => move_card(state, db, 1),
        KeyCode::Char('s') => {
            if let Some((id, status)) = state.current().map(|i| (i.id, i.status)) {
                let update = InterviewUpdate {
                    status: Some(status.cycle()),
                    ..Default::default()
                };
                if let Err(e) = db.update_interview(id, &update) {
                    state.message = Some(format!("Status change failed: {}", e));
                }
            }
            reload(state, db, options);
        }
        KeyCode::Char('r') => {
            reload(state, db, options);
            outcome = KeyOutcome::Refreshed;
        }
        _ => {}
    }
    if state.current().map(|i| i.id) != prev_selected {
        state.load_detail(db);
    }
    outcome
}

fn reload(state: &mut AppState, db: &Database, options: BoardOptions) {
    match pipeline::load_board(db, dates::today(), options) {
        Ok(board) => {
            state.replace_board(board);
            state.load_detail(db);
        }
        Err(e) => {
            tracing::warn!(error = %e, "board refresh failed");
            state.message = Some(format!("Refresh failed: {}", e));
        }
    }
}

/// Moves the selected card one column left or right and follows it.
fn move_card(state: &mut AppState, db: &Database, delta: isize) {
    let Some(interview_id) = state.current().map(|i| i.id) else { return };
    let target = state.column as isize + delta;
    if target < 0 || target as usize >= state.board.stages.len() {
        return;
    }
    let (stage_id, stage_name) = {
        let stage = &state.board.stages[target as usize];
        (stage.id, stage.name.clone())
    };
    let update = InterviewUpdate {
        stage_id: Some(stage_id),
        ..Default::default()
    };
    match db.update_interview(interview_id, &update) {
        Ok(moved) => {
            state.message = Some(format!("Moved {} to {}", moved.company_name, stage_name));
            // keep the selection on the moved card until the next reload
            for column in state.board.interviews_by_stage.values_mut() {
                column.retain(|i| i.id != interview_id);
            }
            if let Some(column) = state.board.interviews_by_stage.get_mut(&stage_id) {
                column.insert(0, moved);
            }
            state.column = target as usize;
            state.row = 0;
        }
        Err(e) => state.message = Some(format!("Move failed: {}", e)),
    }
}

fn status_style(status: InterviewStatus) -> Style {
    match status {
        InterviewStatus::Scheduled => Style::default().fg(Color::Cyan),
        InterviewStatus::Rescheduled => Style::default().fg(Color::Yellow),
        InterviewStatus::Done => Style::default().fg(Color::Green),
        InterviewStatus::Canceled => Style::default().fg(Color::DarkGray),
    }
}

fn draw(frame: &mut Frame, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(60),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Metrics bar
    let m = &state.board.metrics;
    let metrics = Paragraph::new(format!(
        " Today {}  Week {}  Month {}  Total {}  Done {}  Pass {:.2}%  Reminders {}",
        m.today, m.week, m.month, m.total, m.done, m.pass_rate, state.board.reminder_count
    ))
    .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(metrics, rows[0]);

    draw_columns(frame, state, rows[1]);

    let detail = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail, rows[2]);

    let footer = state.message.clone().unwrap_or_else(|| {
        " h/l:column  j/k:card  H/L:move card  s:status  J/K:scroll  r:refresh  q:quit".to_string()
    });
    let help = Paragraph::new(footer).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[3]);
}

fn draw_columns(frame: &mut Frame, state: &AppState, area: Rect) {
    let count = state.board.stages.len().max(1) as u32;
    let constraints: Vec<Constraint> = (0..count).map(|_| Constraint::Ratio(1, count)).collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (index, stage) in state.board.stages.iter().enumerate() {
        let cards = state.board.column(stage.id);
        let items: Vec<ListItem> = cards
            .iter()
            .map(|i| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        truncate(&i.company_name, 18),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(truncate(&i.position, 18)),
                    Line::from(Span::styled(
                        format!("{} {}", i.interview_date.format("%m-%d"), i.status),
                        status_style(i.status),
                    )),
                ])
            })
            .collect();

        let focused = index == state.column;
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else if stage.name == REMINDER_STAGE && !cards.is_empty() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" {} ({}) ", stage.name, cards.len())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));

        let mut list_state = ListState::default();
        if focused && !cards.is_empty() {
            list_state.select(Some(state.row));
        }
        frame.render_stateful_widget(list, columns[index], &mut list_state);
    }
}

fn build_detail(state: &AppState) -> Text<'_> {
    let Some(interview) = state.current() else {
        return Text::raw("No interview selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!("{} - {}", interview.company_name, interview.position),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let today = dates::today();
    let when = if interview.interview_date == today {
        " (today)"
    } else if dates::is_current_week(interview.interview_date, today) {
        " (this week)"
    } else if dates::is_current_month(interview.interview_date, today) {
        " (this month)"
    } else {
        ""
    };
    lines.push(Line::from(format!(
        "{} with {} on {}{}",
        interview.interviewee_name,
        interview.interviewer_name,
        dates::format_date(interview.interview_date),
        when
    )));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", interview.status),
        status_style(interview.status),
    )));
    if let Some(link) = &interview.job_link {
        lines.push(Line::from(format!("Link: {}", link)));
    }
    if let Some(profile) = &interview.profile_id {
        lines.push(Line::from(format!("Profile: {}", profile)));
    }

    if !state.time_entries.is_empty() {
        let minutes: i64 = state
            .time_entries
            .iter()
            .filter_map(|e| e.duration_minutes)
            .sum();
        lines.push(Line::from(format!(
            "Time tracked: {}h{:02}m over {} entries",
            minutes / 60,
            minutes % 60,
            state.time_entries.len()
        )));
    }

    if let Some(latest) = state.transcriptions.first() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Transcription ({})", latest.updated_at),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(&latest.content, 90).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
    }

    Text::from(lines)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewInterview;

    fn board_with_one_card() -> (Database, Board) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let stages = pipeline::reconcile_stages(&db).unwrap();
        db.create_interview(&NewInterview {
            company_name: "Acme".into(),
            position: "Engineer".into(),
            job_link: None,
            interviewer_name: "Dana".into(),
            interviewee_name: "Sam".into(),
            interview_date: dates::today(),
            stage_id: stages[0].id,
            profile_id: Some("p-1".into()),
        })
        .unwrap();
        let board = pipeline::load_board(&db, dates::today(), BoardOptions::default()).unwrap();
        (db, board)
    }

    #[test]
    fn move_message_clears_on_next_key() {
        let (db, board) = board_with_one_card();
        let mut state = AppState::new(board, BoardFilter::default());
        let options = BoardOptions::default();

        handle_key(&mut state, &db, options, KeyCode::Char('L'));
        assert_eq!(state.column, 1);
        assert_eq!(state.message.as_deref(), Some("Moved Acme to Recruiter Screen"));

        handle_key(&mut state, &db, options, KeyCode::Char('j'));
        assert!(state.message.is_none());
        assert_eq!(state.current().map(|i| i.company_name.as_str()), Some("Acme"));
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let (db, board) = board_with_one_card();
        let mut state = AppState::new(board, BoardFilter::default());
        assert!(matches!(
            handle_key(&mut state, &db, BoardOptions::default(), KeyCode::Char('q')),
            KeyOutcome::Quit
        ));
        assert!(matches!(
            handle_key(&mut state, &db, BoardOptions::default(), KeyCode::Char('r')),
            KeyOutcome::Refreshed
        ));
    }

    #[test]
    fn filter_survives_reload() {
        let (db, board) = board_with_one_card();
        let filter = BoardFilter {
            profile_id: Some("someone-else".into()),
            ..Default::default()
        };
        let mut state = AppState::new(board, filter);
        assert!(state.current().is_none());

        reload(&mut state, &db, BoardOptions::default());
        assert!(state.current().is_none());
        assert_eq!(state.board.metrics.total, 1);
    }

    #[test]
    fn detail_load_failure_leaves_empty_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        let db = Database::open(&path).unwrap();
        db.init().unwrap();
        let stages = pipeline::reconcile_stages(&db).unwrap();
        let created = db
            .create_interview(&NewInterview {
                company_name: "Acme".into(),
                position: "Engineer".into(),
                job_link: None,
                interviewer_name: "Dana".into(),
                interviewee_name: "Sam".into(),
                interview_date: dates::today(),
                stage_id: stages[0].id,
                profile_id: None,
            })
            .unwrap();
        db.add_time_entry(created.id, stages[0].id, dates::today(), Some(30))
            .unwrap();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE transcriptions;")
            .unwrap();

        let board = pipeline::load_board(&db, dates::today(), BoardOptions::default()).unwrap();
        let mut state = AppState::new(board, BoardFilter::default());
        state.load_detail(&db);
        assert_eq!(state.time_entries.len(), 1);
        assert!(state.transcriptions.is_empty());
    }
}
