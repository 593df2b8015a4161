use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ledger_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "overlog")]
#[command(about = "Progressive overload workout ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one completed set
    Log {
        #[arg(long)]
        user: String,

        #[arg(long)]
        exercise: String,

        /// Set number within the session (1-based)
        #[arg(long)]
        set: u32,

        /// Weight used (kg or lbs, whichever you track)
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        reps: u32,

        /// Duration in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Distance in meters
        #[arg(long)]
        distance: Option<f64>,

        /// Rate of Perceived Exertion (1-10)
        #[arg(long)]
        rpe: Option<u8>,

        /// Backfill timestamp (RFC 3339), instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Print the stored entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the latest session for an exercise: what to beat
    Last {
        #[arg(long)]
        user: String,

        #[arg(long)]
        exercise: String,

        /// Hours between sets indicating a new session
        #[arg(long)]
        threshold_hours: Option<f64>,

        /// Check a set against the reference (use with --check-reps)
        #[arg(long, requires = "check_reps")]
        check_weight: Option<f64>,

        #[arg(long, requires = "check_weight")]
        check_reps: Option<u32>,

        /// Print the session reference as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent history, newest first
    History {
        #[arg(long)]
        user: String,

        /// Filter by exercise name
        #[arg(long)]
        exercise: Option<String>,

        /// Maximum entries to show
        #[arg(long, default_value_t = 100)]
        limit: usize,

        /// Group entries into sessions (requires --exercise)
        #[arg(long, requires = "exercise")]
        by_session: bool,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export history to a CSV file
    Export {
        #[arg(long)]
        user: String,

        /// Filter by exercise name
        #[arg(long)]
        exercise: Option<String>,

        /// Output path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    ledger_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Commands::Log {
            user,
            exercise,
            set,
            weight,
            reps,
            duration,
            distance,
            rpe,
            at,
            json,
        } => cmd_log(
            &config,
            LogDraft {
                user_id: user,
                exercise_name: exercise,
                set_number: set,
                weight_used: weight,
                reps_completed: reps,
                duration,
                distance,
                rpe,
                timestamp: at,
            },
            json,
        ),
        Commands::Last {
            user,
            exercise,
            threshold_hours,
            check_weight,
            check_reps,
            json,
        } => cmd_last(
            &config,
            &user,
            &exercise,
            threshold_hours,
            check_weight.zip(check_reps),
            json,
        ),
        Commands::History {
            user,
            exercise,
            limit,
            by_session,
            json,
        } => cmd_history(&config, &user, exercise.as_deref(), limit, by_session, json),
        Commands::Export {
            user,
            exercise,
            out,
        } => cmd_export(&config, &user, exercise.as_deref(), &out),
    }
}

fn cmd_log(config: &Config, draft: LogDraft, json: bool) -> Result<()> {
    let mut service = ReferenceService::open(config);
    let entry = service.log_set(draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    println!(
        "✓ Logged {} set {}: {} x {}",
        entry.exercise_name, entry.set_number, entry.weight_used, entry.reps_completed
    );
    Ok(())
}

fn cmd_last(
    config: &Config,
    user: &str,
    exercise: &str,
    threshold_hours: Option<f64>,
    check: Option<(f64, u32)>,
    json: bool,
) -> Result<()> {
    let service = ReferenceService::open(config);
    let reference = service.latest_session_reference(user, exercise, threshold_hours)?;

    let Some(reference) = reference else {
        if json {
            println!("null");
        } else {
            println!("No previous session found for {}.", exercise);
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reference)?);
        return Ok(());
    }

    display_reference(&reference);

    println!("  Volume: {}", progression::volume(&reference));
    if let Some(p) = service.progression(&reference) {
        println!("  Next: {}", p.message);
    }

    if let Some((weight, reps)) = check {
        if service.beats(weight, reps, &reference) {
            println!("  ✓ {} x {} beats this session", weight, reps);
        } else {
            println!("  ✗ {} x {} does not beat this session", weight, reps);
        }
    }

    println!();
    Ok(())
}

fn cmd_history(
    config: &Config,
    user: &str,
    exercise: Option<&str>,
    limit: usize,
    by_session: bool,
    json: bool,
) -> Result<()> {
    let service = ReferenceService::open(config);

    if by_session {
        // requires(exercise) is enforced by clap
        let exercise = exercise.unwrap_or_default();
        let sessions = service.sessions(user, exercise, None)?;
        if sessions.is_empty() {
            println!("No history for {}.", exercise);
            return Ok(());
        }
        for (i, session) in sessions.iter().enumerate() {
            if let Some(first) = session.first() {
                println!(
                    "Session {} — {} ({} sets)",
                    i + 1,
                    first.timestamp.format("%Y-%m-%d %H:%M UTC"),
                    session.len()
                );
            }
            for entry in session {
                println!("  {}", format_entry(entry));
            }
        }
        return Ok(());
    }

    let entries = service.history(user, exercise, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history for {}.", exercise.unwrap_or(user));
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.exercise_name,
            format_entry(entry)
        );
    }
    Ok(())
}

fn cmd_export(
    config: &Config,
    user: &str,
    exercise: Option<&str>,
    out: &std::path::Path,
) -> Result<()> {
    let service = ReferenceService::open(config);
    let entries = service.history(user, exercise, usize::MAX)?;

    let count = history_to_csv(&entries, out)?;
    if count == 0 {
        println!("No entries to export.");
    } else {
        println!("✓ Exported {} entries to {}", count, out.display());
    }
    Ok(())
}

fn display_reference(reference: &SessionReference) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  WHAT TO BEAT — {}", reference.exercise_name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Session: {} ({} sets)",
        reference.session_timestamp.format("%Y-%m-%d %H:%M UTC"),
        reference.total_sets
    );
    println!();

    for set in &reference.sets {
        let mut line = format!(
            "  → Set {}: {} x {}",
            set.set_number, set.weight_used, set.reps_completed
        );
        if let Some(rpe) = set.rpe {
            line.push_str(&format!(" (RPE {})", rpe));
        }
        println!("{}", line);
    }

    println!();
}

fn format_entry(entry: &LogEntry) -> String {
    let mut line = format!(
        "set {}: {} x {}",
        entry.set_number, entry.weight_used, entry.reps_completed
    );
    if let Some(rpe) = entry.rpe {
        line.push_str(&format!(" (RPE {})", rpe));
    }
    line
}
