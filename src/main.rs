//! rehabtrack - guided back-rehab workouts
//!
//! Run `rehabtrack` for the dashboard, or `rehabtrack play <id> --plain`
//! for a line-based player.

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rehabtrack::config::Config;
use rehabtrack::cue::{AudioCue, SilentCue, TerminalBell};
use rehabtrack::db::Database;
use rehabtrack::history::{self, FeedbackStats, History, top_exercises};
use rehabtrack::session::{
    Outcome, PersistenceGateway, Phase, RestDurations, SessionEngine, runner,
};
use rehabtrack::tips;
use rehabtrack::tui::App;
use rehabtrack::workouts::{self, Workout};

#[derive(Parser)]
#[command(name = "rehabtrack")]
#[command(author, version, about = "Guided workouts for a healthy back")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// List available workouts
    List,

    /// Show the exercises of a workout
    Show {
        /// Workout id (e.g., "today", "stage-1")
        workout: String,
    },

    /// Play a workout, resuming saved progress
    Play {
        /// Workout id
        workout: String,

        /// Drop saved progress and start from the first exercise
        #[arg(short, long)]
        restart: bool,

        /// Line-based player on stdin/stdout instead of the TUI
        #[arg(long)]
        plain: bool,
    },

    /// Forget saved progress of a workout
    Discard {
        workout: String,
    },

    /// Show finished sessions
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show exercise ratings
    Feedback,

    /// Print a random tip
    Tip,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level())
        .init();

    let db = Database::open(&config.db)?;
    debug!("Using database {}", config.db);

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(db, &config)?;
            app.run()?;
        }

        Some(Commands::List) => {
            let catalog = config.catalog(db.get_special_program_day()?)?;
            let pending = db.pending_sessions()?;
            println!("Workouts:");
            println!("{:-<60}", "");
            for w in &catalog {
                let marker = if pending.contains(&w.id) { "  (in progress)" } else { "" };
                println!(
                    "{:10} | {:32} | {} ex. | ~{} min{}",
                    w.id,
                    w.title,
                    w.exercises.len(),
                    w.estimated_minutes(),
                    marker
                );
            }
        }

        Some(Commands::Show { workout }) => {
            let catalog = config.catalog(db.get_special_program_day()?)?;
            let workout = lookup(&catalog, &workout)?;
            println!("{} (~{} min)", workout.title, workout.estimated_minutes());
            if !workout.description.is_empty() {
                println!("{}", workout.description);
            }
            println!("{:-<60}", "");
            for (i, e) in workout.exercises.iter().enumerate() {
                let target = if e.is_timed() {
                    format!("{} s", e.duration_secs())
                } else {
                    format!("{} reps", e.display_target())
                };
                println!("{:2}. {:32} | {} x {}", i + 1, e.name, e.total_sets(), target);
            }
        }

        Some(Commands::Play { workout, restart, plain }) => {
            let catalog = config.catalog(db.get_special_program_day()?)?;
            let workout = lookup(&catalog, &workout)?.clone();
            if plain {
                if config.quiet {
                    play_plain(&db, SilentCue, workout, config.rest(), restart).await?;
                } else {
                    play_plain(&db, TerminalBell, workout, config.rest(), restart).await?;
                }
            } else {
                let mut app = App::new(db, &config)?;
                app.run_workout(&workout.id, restart)?;
            }
        }

        Some(Commands::Discard { workout }) => {
            db.clear_session(&workout)?;
            println!("Saved progress for '{}' discarded", workout);
        }

        Some(Commands::History { limit }) => {
            let logs = db.get_workout_history()?;
            let history = History::new(logs.clone());
            let today = Local::now().date_naive();

            println!("Training history");
            println!("{:-<40}", "");
            for log in logs.iter().take(limit) {
                for s in &log.sessions {
                    println!("{} | {:10} | {}/{}", log.date, s.workout_id, s.completed, s.total);
                }
            }
            println!("{:-<40}", "");
            println!("Streak: {} days", history.streak(today));
            println!("Days trained: {}", history.total_days());
            println!("Completion: {:.0}%", history.completion_rate());

            let progress = db.get_program_progress()?;
            let stage = workouts::current_stage(&progress);
            println!("Current stage: {} - {}", stage.id, stage.name);
            println!(
                "30-day course: day {}/{}",
                db.get_special_program_day()?,
                workouts::SPECIAL_PROGRAM_DAYS
            );

            let counts = db.get_execution_counts()?;
            let top = top_exercises(&counts, 5);
            if !top.is_empty() {
                println!("{:-<40}", "");
                println!("Most done:");
                for (exercise, count) in top {
                    println!("{:32} | {}", exercise, count);
                }
            }
        }

        Some(Commands::Feedback) => {
            let feedback = db.get_feedback()?;
            let stats = FeedbackStats::from_feedback(&feedback);
            println!("Rated exercises: {} (good {}, hard {})", stats.total(), stats.good, stats.hard);
            for (exercise, rating) in &feedback {
                println!("{:32} | {}", exercise, rating.name_ru());
            }
            let hard = FeedbackStats::hard_exercises(&feedback);
            if !hard.is_empty() {
                println!();
                println!("Too hard for now: {}", hard.join(", "));
            }
        }

        Some(Commands::Tip) => {
            println!("{}", tips::format_tip(tips::get_random_tip()));
        }
    }

    Ok(())
}

fn lookup<'a>(catalog: &'a [Workout], id: &str) -> Result<&'a Workout> {
    match workouts::find_workout(catalog, id) {
        Some(w) => Ok(w),
        None => bail!("unknown workout '{}', see `rehabtrack list`", id),
    }
}

/// Line-based player: single-letter commands on stdin, status lines on stdout
async fn play_plain<A: AudioCue>(
    db: &Database,
    cue: A,
    workout: Workout,
    rest: RestDurations,
    restart: bool,
) -> Result<()> {
    let mut engine = if restart {
        SessionEngine::restart(workout, db, cue, rest)?
    } else {
        SessionEngine::with_rest(workout, db, cue, rest)?
    };

    println!("{}", engine.workout().title);
    println!("enter/d: done | p: pause | s: skip | b: back | g/h: rate | f: finish | q: leave");

    let (tx, rx) = mpsc::channel(8);
    // plain thread: the process must not wait for another line once the session ends
    std::thread::spawn(move || {
        runner::feed_controls(std::io::stdin().lock(), tx, |line| {
            println!("? unknown command '{}'", line)
        })
    });

    let mut last = None;
    let outcome = runner::drive(&mut engine, rx, |engine| {
        let status = status_line(engine);
        if last.as_ref() != Some(&status) {
            println!("{}", status);
            last = Some(status);
        }
    })
    .await;

    match outcome {
        Outcome::Finished(result) => {
            let workout = engine.workout();
            println!("{:-<40}", "");
            println!("Done: {} of {}, skipped {}", result.completed, result.total, result.skipped);
            let today = Local::now().date_naive();
            if let Err(e) = history::record_finished(db, workout, &result, today) {
                warn!("Failed to record history for '{}': {:#}", workout.id, e);
            }
        }
        Outcome::Abandoned => {
            println!("Progress saved, run `rehabtrack play {}` to continue", engine.workout().id);
        }
    }
    Ok(())
}

/// Status text; time rounds up to tens except for the last three seconds
fn status_line<P: PersistenceGateway, A: AudioCue>(engine: &SessionEngine<P, A>) -> String {
    let exercise = engine.current_exercise();
    let position = format!("[{}/{}]", engine.exercise_index() + 1, engine.workout().exercises.len());
    let paused = if engine.is_playing() { "" } else { " (paused)" };
    let secs = engine.time_left();
    let shown = if secs <= 3 { secs } else { secs.div_ceil(10) * 10 };
    let time = format!("{} s", shown);

    match engine.phase() {
        Phase::Exercising if exercise.is_timed() => format!(
            "{} {} set {}/{}: {}{}",
            position, exercise.name, engine.current_set(), engine.total_sets(), time, paused
        ),
        Phase::Exercising => format!(
            "{} {} set {}/{}: {} reps, enter when done",
            position, exercise.name, engine.current_set(), engine.total_sets(), exercise.display_target()
        ),
        Phase::Resting => {
            let next = if engine.is_set_rest() {
                format!("set {}", engine.current_set() + 1)
            } else {
                engine
                    .next_exercise()
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| "finish".to_string())
            };
            let rate = if engine.accepts_feedback() { ", g/h to rate" } else { "" };
            format!("{} rest: {}{}, next {}{}", position, time, paused, next, rate)
        }
    }
}
