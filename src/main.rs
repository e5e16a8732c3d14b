mod config;
mod dates;
mod db;
mod error;
mod jsonfile;
mod models;
mod pipeline;
mod profiles;
mod prompts;
mod store;
mod tui;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use config::Config;
use db::Database;
use models::{Interview, InterviewStatus, InterviewUpdate, NewInterview, Stage};
use pipeline::{Board, BoardFilter, BoardOptions, BoardView};
use profiles::{PersonalInfo, ProfileDraft, ProfileStore};
use prompts::PromptStore;
use std::path::PathBuf;
use std::time::Duration;
use store::StageStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Interview pipeline tracker - stages, interviews, reminders")]
struct Cli {
    /// Database file (overrides config)
    #[arg(long, global = true, env = "PIPELINE_DB")]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and seed the default stages
    Init,

    /// Print the board, one column per stage
    Board {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Interactive board with periodic refresh
    Browse {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Add an interview
    Add {
        #[arg(short, long)]
        company: String,

        #[arg(short, long)]
        position: String,

        /// Interviewer name
        #[arg(long)]
        interviewer: String,

        /// Interviewee name
        #[arg(long)]
        interviewee: String,

        /// Interview date (YYYY-MM-DD, today, yesterday, tomorrow)
        #[arg(short, long, default_value = "today")]
        date: String,

        /// Job posting URL
        #[arg(short, long)]
        link: Option<String>,

        /// Starting stage
        #[arg(short, long, default_value = "Intro")]
        stage: String,

        /// Profile id to attach
        #[arg(long)]
        profile: Option<String>,
    },

    /// Show interview details
    Show {
        /// Interview ID
        id: i64,
    },

    /// Edit interview fields
    Edit {
        /// Interview ID
        id: i64,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        link: Option<String>,

        /// Remove the job link
        #[arg(long, conflicts_with = "link")]
        clear_link: bool,

        #[arg(long)]
        interviewer: Option<String>,

        #[arg(long)]
        interviewee: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        profile: Option<String>,

        /// Unlink the profile
        #[arg(long, conflicts_with = "profile")]
        clear_profile: bool,
    },

    /// Set interview status (scheduled, rescheduled, done, canceled)
    Status {
        /// Interview ID
        id: i64,
        status: InterviewStatus,
    },

    /// Move an interview to another stage
    Move {
        /// Interview ID
        id: i64,
        /// Stage name or ID
        stage: String,
    },

    /// Delete an interview and its logs
    Delete {
        /// Interview ID
        id: i64,
    },

    /// List interviews
    List {
        /// Filter by stage
        #[arg(short, long)]
        stage: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<InterviewStatus>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Search company, position and interviewer
    Search {
        query: String,
    },

    /// Interviews dated between two days (inclusive)
    Range {
        start: String,
        end: String,
    },

    /// Show today/week/month counts and pass rate
    Metrics {
        #[arg(long)]
        json: bool,
    },

    /// Manage stages
    Stage {
        #[command(subcommand)]
        command: StageCommands,
    },

    /// Track time spent on an interview
    Time {
        #[command(subcommand)]
        command: TimeCommands,
    },

    /// Interview transcriptions
    Transcript {
        #[command(subcommand)]
        command: TranscriptCommands,
    },

    /// Candidate profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Saved prompts and templates
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only interviews dated this week (Monday to Sunday)
    #[arg(long, conflicts_with = "month")]
    week: bool,

    /// Only interviews dated this month
    #[arg(long)]
    month: bool,

    /// Only interviews for this profile (defaults to the active profile)
    #[arg(long, conflicts_with = "all_profiles")]
    profile: Option<String>,

    /// Ignore the active profile
    #[arg(long)]
    all_profiles: bool,
}

impl FilterArgs {
    fn resolve(&self, profiles: &ProfileStore) -> Result<BoardFilter> {
        let view = if self.week {
            BoardView::Week
        } else if self.month {
            BoardView::Month
        } else {
            BoardView::All
        };
        let profile_id = if self.all_profiles {
            None
        } else if let Some(id) = &self.profile {
            warn_if_dangling(profiles, id);
            Some(id.clone())
        } else {
            profiles.active()?.map(|p| p.id)
        };
        Ok(BoardFilter { view, profile_id })
    }
}

#[derive(Subcommand)]
enum StageCommands {
    /// List stages in board order
    List,

    /// Append a custom stage
    Add {
        name: String,
    },

    /// Move a stage to a new position (1-based)
    Move {
        /// Stage name or ID
        stage: String,
        position: usize,
    },

    /// Restore missing or misnamed default stages
    Repair,
}

#[derive(Subcommand)]
enum TimeCommands {
    /// Log time against an interview
    Add {
        /// Interview ID
        id: i64,

        /// Duration, e.g. 45m or 1h30m
        #[arg(short, long)]
        duration: Option<String>,

        /// Day the time was spent
        #[arg(long, default_value = "today")]
        date: String,

        /// Stage to log against (defaults to the interview's current stage)
        #[arg(short, long)]
        stage: Option<String>,
    },

    /// List time entries for an interview
    List {
        /// Interview ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum TranscriptCommands {
    /// Attach a transcription
    Add {
        /// Interview ID
        id: i64,

        /// Transcription text
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read the transcription from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Replace a transcription's text
    Edit {
        /// Transcription ID
        id: i64,
        text: String,
    },

    /// List transcriptions for an interview
    List {
        /// Interview ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Add a profile
    Add {
        name: String,
        email: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        resume: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        linkedin: Option<String>,

        #[arg(long)]
        github: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change profile fields; omitted flags keep their value
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        resume: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List profiles
    List,

    /// Show a profile and its interviews
    Show {
        id: String,
    },

    /// Remove a profile (interviews keep their reference)
    Remove {
        id: String,
    },

    /// Select the profile the board is filtered to; prints it when no id is given
    Use {
        id: Option<String>,

        /// Stop filtering by profile
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum PromptCommands {
    /// Save a prompt
    Add {
        title: String,

        /// Prompt text
        #[arg(conflicts_with = "file")]
        content: Option<String>,

        /// Read the prompt text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Change a prompt's title or text
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List prompts
    List,

    /// Print a prompt
    Show {
        id: String,
    },

    /// Delete a prompt
    Remove {
        id: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    let profiles = ProfileStore::new(config.profiles_path());
    let prompts = PromptStore::new(config.prompts_path());
    let options = BoardOptions {
        stale_after_days: config.stale_after_days,
    };

    match cli.command {
        Commands::Init => {
            db.init()?;
            let stages = pipeline::reconcile_stages(&db)?;
            let path = db.path().unwrap_or(&db_path);
            println!("Database initialized at {}", path.display());
            println!("{} stages ready.", stages.len());
        }

        Commands::Board { json, filter } => {
            db.ensure_initialized()?;
            let filter = filter.resolve(&profiles)?;
            let today = dates::today();
            let mut board = pipeline::load_board(&db, today, options)?;
            board.apply_filter(&filter, today);
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(&board, &filter);
            }
        }

        Commands::Browse { filter } => {
            db.ensure_initialized()?;
            let filter = filter.resolve(&profiles)?;
            tui::run_board(&db, options, filter, Duration::from_secs(config.refresh_secs))?;
        }

        Commands::Add {
            company,
            position,
            interviewer,
            interviewee,
            date,
            link,
            stage,
            profile,
        } => {
            db.ensure_initialized()?;
            let stages = pipeline::reconcile_stages(&db)?;
            let stage = pipeline::find_stage(&stages, &stage)?;
            if let Some(id) = &profile {
                warn_if_dangling(&profiles, id);
            }
            let interview = db.create_interview(&NewInterview {
                company_name: company,
                position,
                job_link: link,
                interviewer_name: interviewer,
                interviewee_name: interviewee,
                interview_date: dates::parse_date(&date, dates::today())?,
                stage_id: stage.id,
                profile_id: profile,
            })?;
            println!("Added interview #{} in {}", interview.id, stage.name);
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            match db.get_interview(id)? {
                Some(interview) => print_interview(&db, &profiles, &interview)?,
                None => println!("Interview #{} not found.", id),
            }
        }

        Commands::Edit {
            id,
            company,
            position,
            link,
            clear_link,
            interviewer,
            interviewee,
            date,
            profile,
            clear_profile,
        } => {
            db.ensure_initialized()?;
            let interview_date = date
                .map(|d| dates::parse_date(&d, dates::today()))
                .transpose()?;
            if let Some(profile_id) = &profile {
                warn_if_dangling(&profiles, profile_id);
            }
            let update = InterviewUpdate {
                company_name: company,
                position,
                job_link: if clear_link { Some(None) } else { link.map(Some) },
                interviewer_name: interviewer,
                interviewee_name: interviewee,
                interview_date,
                profile_id: if clear_profile { Some(None) } else { profile.map(Some) },
                ..Default::default()
            };
            if update.is_empty() {
                println!("Nothing to change.");
            } else {
                let interview = db.update_interview(id, &update)?;
                println!("Updated interview #{}.", interview.id);
            }
        }

        Commands::Status { id, status } => {
            db.ensure_initialized()?;
            let update = InterviewUpdate {
                status: Some(status),
                ..Default::default()
            };
            let interview = db.update_interview(id, &update)?;
            println!("Interview #{} is now {}.", interview.id, interview.status);
        }

        Commands::Move { id, stage } => {
            db.ensure_initialized()?;
            let stages = pipeline::reconcile_stages(&db)?;
            let stage = pipeline::find_stage(&stages, &stage)?;
            let update = InterviewUpdate {
                stage_id: Some(stage.id),
                ..Default::default()
            };
            db.update_interview(id, &update)?;
            println!("Moved interview #{} to {}.", id, stage.name);
        }

        Commands::Delete { id } => {
            db.ensure_initialized()?;
            db.delete_interview(id)?;
            println!("Deleted interview #{}.", id);
        }

        Commands::List {
            stage,
            status,
            filter,
        } => {
            db.ensure_initialized()?;
            let filter = filter.resolve(&profiles)?;
            let today = dates::today();
            let mut board = pipeline::load_board(&db, today, options)?;
            board.apply_filter(&filter, today);
            let stage_filter = stage
                .as_deref()
                .map(|s| pipeline::find_stage(&board.stages, s).map(|st| st.id))
                .transpose()?;
            let interviews: Vec<&Interview> = board
                .stages
                .iter()
                .filter(|s| stage_filter.is_none_or(|id| id == s.id))
                .flat_map(|s| board.column(s.id))
                .filter(|i| status.is_none_or(|st| st == i.status))
                .collect();
            print_interviews(&board.stages, interviews);
        }

        Commands::Search { query } => {
            db.ensure_initialized()?;
            let stages = db.list_stages()?;
            let found = db.search_interviews(&query)?;
            print_interviews(&stages, found.iter().collect());
        }

        Commands::Range { start, end } => {
            db.ensure_initialized()?;
            let today = dates::today();
            let start = dates::parse_date(&start, today)?;
            let end = dates::parse_date(&end, today)?;
            if start > end {
                return Err(anyhow!("Start date {} is after end date {}", start, end));
            }
            let stages = db.list_stages()?;
            let found = db.interviews_between(start, end)?;
            print_interviews(&stages, found.iter().collect());
        }

        Commands::Metrics { json } => {
            db.ensure_initialized()?;
            let board = pipeline::load_board(&db, dates::today(), options)?;
            let m = &board.metrics;
            if json {
                println!("{}", serde_json::to_string_pretty(m)?);
            } else {
                println!("Today:      {}", m.today);
                println!("This week:  {}", m.week);
                println!("This month: {}", m.month);
                println!("Total:      {}", m.total);
                println!("Done:       {}", m.done);
                println!("Pass rate:  {:.2}%", m.pass_rate);
                println!("Reminders:  {}", board.reminder_count);
            }
        }

        Commands::Stage { command } => {
            db.ensure_initialized()?;
            match command {
                StageCommands::List => {
                    let board = pipeline::load_board(&db, dates::today(), options)?;
                    println!("{:<6} {:<6} {:<24} {:>6}", "ID", "ORDER", "NAME", "CARDS");
                    println!("{}", "-".repeat(45));
                    for stage in &board.stages {
                        println!(
                            "{:<6} {:<6} {:<24} {:>6}",
                            stage.id,
                            stage.order,
                            truncate(&stage.name, 22),
                            board.column(stage.id).len()
                        );
                    }
                }

                StageCommands::Add { name } => {
                    let stage = db.add_custom_stage(&name)?;
                    println!("Added stage '{}' at position {}.", stage.name, stage.order);
                }

                StageCommands::Move { stage, position } => {
                    let stages = db.list_stages()?;
                    let id = pipeline::find_stage(&stages, &stage)?.id;
                    let stages = db.move_stage(id, position)?;
                    let order: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
                    println!("{}", order.join(" > "));
                }

                StageCommands::Repair => {
                    let before = db.list_stages()?;
                    let after = pipeline::reconcile_stages(&db)?;
                    let changed = after.iter().filter(|s| !before.contains(s)).count();
                    println!("{} stage(s) added or renamed.", changed);
                }
            }
        }

        Commands::Time { command } => {
            db.ensure_initialized()?;
            match command {
                TimeCommands::Add {
                    id,
                    duration,
                    date,
                    stage,
                } => {
                    let interview = db
                        .get_interview(id)?
                        .ok_or_else(|| anyhow!("Interview #{} not found", id))?;
                    let stage_id = match stage {
                        Some(name) => pipeline::find_stage(&db.list_stages()?, &name)?.id,
                        None => interview.stage_id,
                    };
                    let minutes = duration.as_deref().map(dates::parse_duration).transpose()?;
                    let tracked = dates::parse_date(&date, dates::today())?;
                    let entry = db.add_time_entry(id, stage_id, tracked, minutes)?;
                    println!("Logged time entry #{} for interview #{}.", entry.id, id);
                }

                TimeCommands::List { id } => {
                    let stages = db.list_stages()?;
                    let entries = db.time_entries_for(id)?;
                    if entries.is_empty() {
                        println!("No time entries for interview #{}.", id);
                    } else {
                        println!("{:<6} {:<14} {:<20} {:>8}", "ID", "DATE", "STAGE", "MINUTES");
                        println!("{}", "-".repeat(51));
                        for entry in &entries {
                            println!(
                                "{:<6} {:<14} {:<20} {:>8}",
                                entry.id,
                                dates::format_date(entry.tracked_date),
                                truncate(stage_name(&stages, entry.stage_id), 18),
                                entry
                                    .duration_minutes
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| "-".to_string())
                            );
                        }
                        let total: i64 = entries.iter().filter_map(|e| e.duration_minutes).sum();
                        println!("\nTotal: {}h{:02}m", total / 60, total % 60);
                    }
                }
            }
        }

        Commands::Transcript { command } => {
            db.ensure_initialized()?;
            match command {
                TranscriptCommands::Add { id, text, file } => {
                    let interview = db
                        .get_interview(id)?
                        .ok_or_else(|| anyhow!("Interview #{} not found", id))?;
                    let content = match (text, file) {
                        (Some(text), _) => text,
                        (None, Some(path)) => read_text_file(&path)?,
                        (None, None) => {
                            return Err(anyhow!("Provide transcription text or --file"));
                        }
                    };
                    let t = db.add_transcription(id, interview.stage_id, &content)?;
                    println!("Added transcription #{} to interview #{}.", t.id, id);
                }

                TranscriptCommands::Edit { id, text } => {
                    let t = db.update_transcription(id, &text)?;
                    println!("Updated transcription #{}.", t.id);
                }

                TranscriptCommands::List { id } => {
                    let stages = db.list_stages()?;
                    let transcriptions = db.transcriptions_for(id)?;
                    if transcriptions.is_empty() {
                        println!("No transcriptions for interview #{}.", id);
                    }
                    for t in transcriptions {
                        println!(
                            "#{} [{}] {}",
                            t.id,
                            stage_name(&stages, t.stage_id),
                            t.updated_at
                        );
                        for line in textwrap::fill(&t.content, 78).lines() {
                            println!("  {}", line);
                        }
                        println!();
                    }
                }
            }
        }

        Commands::Profile { command } => match command {
            ProfileCommands::Add {
                name,
                email,
                title,
                resume,
                phone,
                location,
                linkedin,
                github,
                notes,
            } => {
                let profile = profiles.add(ProfileDraft {
                    name,
                    email,
                    title,
                    resume_url: resume,
                    personal_info: PersonalInfo {
                        phone,
                        location,
                        linkedin,
                        github,
                        notes,
                    },
                })?;
                println!("Added profile '{}' ({})", profile.name, profile.id);
            }

            ProfileCommands::Edit {
                id,
                name,
                email,
                title,
                resume,
                location,
                notes,
            } => {
                let current = profiles
                    .get(&id)?
                    .ok_or_else(|| anyhow!("Profile '{}' not found", id))?;
                let mut personal_info = current.personal_info;
                personal_info.location = location.or(personal_info.location);
                personal_info.notes = notes.or(personal_info.notes);
                let updated = profiles.update(
                    &id,
                    ProfileDraft {
                        name: name.unwrap_or(current.name),
                        email: email.unwrap_or(current.email),
                        title: title.or(current.title),
                        resume_url: resume.or(current.resume_url),
                        personal_info,
                    },
                )?;
                println!("Updated profile '{}'.", updated.name);
            }

            ProfileCommands::List => {
                let all = profiles.list()?;
                let active = profiles.active()?.map(|p| p.id);
                if all.is_empty() {
                    println!("No profiles found in {}.", profiles.path().display());
                } else {
                    println!("  {:<38} {:<22} {:<28} {:<20}", "ID", "NAME", "EMAIL", "TITLE");
                    println!("{}", "-".repeat(112));
                    for p in all {
                        let marker = if active.as_deref() == Some(p.id.as_str()) { "*" } else { " " };
                        println!(
                            "{} {:<38} {:<22} {:<28} {:<20}",
                            marker,
                            p.id,
                            truncate(&p.name, 20),
                            truncate(&p.email, 26),
                            truncate(&p.title.unwrap_or_default(), 18)
                        );
                    }
                }
            }

            ProfileCommands::Show { id } => match profiles.get(&id)? {
                Some(p) => {
                    println!("Profile {}", p.id);
                    println!("Name: {}", p.name);
                    println!("Email: {}", p.email);
                    if let Some(title) = &p.title {
                        println!("Title: {}", title);
                    }
                    if let Some(url) = &p.resume_url {
                        println!("Resume: {}", url);
                    }
                    let info = &p.personal_info;
                    for (label, value) in [
                        ("Phone", &info.phone),
                        ("Location", &info.location),
                        ("LinkedIn", &info.linkedin),
                        ("GitHub", &info.github),
                        ("Notes", &info.notes),
                    ] {
                        if let Some(v) = value {
                            println!("{}: {}", label, v);
                        }
                    }

                    if db.ensure_initialized().is_ok() {
                        let stages = db.list_stages()?;
                        let linked = db.list_interviews_for_profile(&p.id)?;
                        if !linked.is_empty() {
                            println!("\nInterviews ({}):", linked.len());
                            for i in linked {
                                println!(
                                    "  #{} - {} / {} ({}, {})",
                                    i.id,
                                    i.company_name,
                                    i.position,
                                    stage_name(&stages, i.stage_id),
                                    i.status
                                );
                            }
                        }
                    }
                }
                None => println!("Profile '{}' not found.", id),
            },

            ProfileCommands::Remove { id } => {
                let removed = profiles.remove(&id)?;
                println!("Removed profile '{}'.", removed.name);
            }

            ProfileCommands::Use { id, clear } => {
                if clear {
                    profiles.clear_active()?;
                    println!("Board no longer filtered by profile.");
                } else if let Some(id) = id {
                    let profile = profiles.set_active(&id)?;
                    println!("Active profile: {} <{}>", profile.name, profile.email);
                } else {
                    match profiles.active()? {
                        Some(p) => println!("Active profile: {} <{}> ({})", p.name, p.email, p.id),
                        None => println!("No active profile."),
                    }
                }
            }
        },

        Commands::Prompt { command } => match command {
            PromptCommands::Add {
                title,
                content,
                file,
            } => {
                let content = match (content, file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => read_text_file(&path)?,
                    (None, None) => return Err(anyhow!("Provide prompt text or --file")),
                };
                let prompt = prompts.add(&title, &content)?;
                println!("Added prompt '{}' ({})", prompt.title, prompt.id);
            }

            PromptCommands::Edit {
                id,
                title,
                content,
                file,
            } => {
                let content = match (content, file) {
                    (Some(text), _) => Some(text),
                    (None, Some(path)) => Some(read_text_file(&path)?),
                    (None, None) => None,
                };
                if title.is_none() && content.is_none() {
                    println!("Nothing to change.");
                } else {
                    let prompt = prompts.update(&id, title.as_deref(), content.as_deref())?;
                    println!("Updated prompt '{}'.", prompt.title);
                }
            }

            PromptCommands::List => {
                let all = prompts.list()?;
                if all.is_empty() {
                    println!("No prompts found in {}.", prompts.path().display());
                } else {
                    println!("{:<38} {:<28} {}", "ID", "TITLE", "PREVIEW");
                    println!("{}", "-".repeat(100));
                    for p in all {
                        let preview = p.content.lines().next().unwrap_or_default();
                        println!(
                            "{:<38} {:<28} {}",
                            p.id,
                            truncate(&p.title, 26),
                            truncate(preview, 32)
                        );
                    }
                }
            }

            PromptCommands::Show { id } => match prompts.get(&id)? {
                Some(p) => {
                    println!("{}\n", p.title);
                    println!("{}", p.content);
                }
                None => println!("Prompt '{}' not found.", id),
            },

            PromptCommands::Remove { id } => {
                let removed = prompts.remove(&id)?;
                println!("Removed prompt '{}'.", removed.title);
            }
        },
    }

    Ok(())
}

fn read_text_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn warn_if_dangling(profiles: &ProfileStore, id: &str) {
    match profiles.get(id) {
        Ok(Some(_)) => {}
        Ok(None) => tracing::warn!(profile = id, "profile not found; keeping the reference"),
        Err(e) => tracing::warn!(error = %e, "could not read profiles"),
    }
}

fn stage_name(stages: &[Stage], id: i64) -> &str {
    stages
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.name.as_str())
        .unwrap_or("?")
}

fn print_board(board: &Board, filter: &BoardFilter) {
    let m = &board.metrics;
    println!(
        "Today {} | Week {} | Month {} | Total {} | Done {} | Pass {:.2}%",
        m.today, m.week, m.month, m.total, m.done, m.pass_rate
    );
    match (filter.view, &filter.profile_id) {
        (BoardView::All, None) => {}
        (view, profile) => {
            let window = match view {
                BoardView::All => "all dates",
                BoardView::Week => "this week",
                BoardView::Month => "this month",
            };
            match profile {
                Some(id) => println!("Showing {} for profile {}.", window, id),
                None => println!("Showing {}.", window),
            }
        }
    }
    if let Some(reminder) = board.reminder_stage() {
        if board.reminder_count > 0 {
            println!(
                "{} interview(s) waiting in {}.",
                board.reminder_count, reminder.name
            );
        }
    }

    for stage in &board.stages {
        let cards = board.column(stage.id);
        println!("\n== {} ({}) ==", stage.name, cards.len());
        for i in cards {
            println!(
                "  #{:<5} {:<22} {:<24} {:<14} {}",
                i.id,
                truncate(&i.company_name, 20),
                truncate(&i.position, 22),
                dates::format_date(i.interview_date),
                i.status
            );
        }
    }
}

fn print_interviews(stages: &[Stage], interviews: Vec<&Interview>) {
    if interviews.is_empty() {
        println!("No interviews found.");
        return;
    }
    println!(
        "{:<6} {:<12} {:<22} {:<24} {:<18} {:<12}",
        "ID", "STATUS", "COMPANY", "POSITION", "STAGE", "DATE"
    );
    println!("{}", "-".repeat(98));
    for i in interviews {
        println!(
            "{:<6} {:<12} {:<22} {:<24} {:<18} {:<12}",
            i.id,
            i.status,
            truncate(&i.company_name, 20),
            truncate(&i.position, 22),
            truncate(stage_name(stages, i.stage_id), 16),
            i.interview_date.to_string()
        );
    }
}

fn print_interview(db: &Database, profiles: &ProfileStore, interview: &Interview) -> Result<()> {
    let stages = db.list_stages()?;
    println!("Interview #{}", interview.id);
    println!("Company: {}", interview.company_name);
    println!("Position: {}", interview.position);
    if let Some(link) = &interview.job_link {
        println!("Link: {}", link);
    }
    println!("Interviewer: {}", interview.interviewer_name);
    println!("Interviewee: {}", interview.interviewee_name);
    println!("Date: {}", dates::format_date(interview.interview_date));
    println!("Stage: {}", stage_name(&stages, interview.stage_id));
    println!("Status: {}", interview.status);
    if let Some(profile_id) = &interview.profile_id {
        match profiles.get(profile_id)? {
            Some(p) => println!("Profile: {} <{}>", p.name, p.email),
            None => println!("Profile: {} (missing)", profile_id),
        }
    }
    println!("Last edited: {}", interview.last_edited_at);

    let entries = db.time_entries_for(interview.id)?;
    if !entries.is_empty() {
        let total: i64 = entries.iter().filter_map(|e| e.duration_minutes).sum();
        println!(
            "\nTime tracked: {}h{:02}m across {} entries",
            total / 60,
            total % 60,
            entries.len()
        );
    }

    let transcriptions = db.transcriptions_for(interview.id)?;
    for t in transcriptions {
        println!(
            "\n--- Transcription #{} ({}) ---",
            t.id,
            stage_name(&stages, t.stage_id)
        );
        println!("{}", textwrap::fill(&t.content, 78));
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
