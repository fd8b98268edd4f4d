use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use lgc_core::export::{export_checkins, export_workouts};
use lgc_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lgc")]
#[command(about = "Lazy Gains Club strength and body-composition tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the user whose records are read and written
    #[arg(long, global = true)]
    user: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a workout or measurement export (CSV)
    Import {
        /// Export file to import
        file: PathBuf,

        /// Commit without asking when existing entries are found
        #[arg(long, conflicts_with = "cancel")]
        yes: bool,

        /// Cancel automatically when existing entries are found
        #[arg(long, conflicts_with = "yes")]
        cancel: bool,

        /// Records per write batch
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Log one exercise's sets for a day (e.g. `lgc log squat 225x5 245x3@8`)
    Log {
        /// Exercise key: squat, bench, deadlift, chinup, row or ohp
        exercise: Exercise,

        /// Sets as WEIGHTxREPS or WEIGHTxREPS@RPE, in the order performed
        #[arg(required = true)]
        sets: Vec<SetInput>,

        /// Day of the workout (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Display name for the exercise
        #[arg(long)]
        name: Option<String>,
    },

    /// Record a daily check-in
    Checkin {
        /// Day of the check-in (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Body weight (lbs)
        #[arg(long)]
        weight: Option<f64>,

        /// Waist circumference (inches)
        #[arg(long)]
        waist: Option<f64>,

        /// Neck circumference (inches)
        #[arg(long)]
        neck: Option<f64>,

        /// Hip circumference (inches)
        #[arg(long)]
        hips: Option<f64>,

        /// Sleep quality, 1 (poor) to 10 (great)
        #[arg(long)]
        sleep: Option<u8>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the training day templates
    Plan {
        /// squat, bench or deadlift (all days when omitted)
        day: Option<DayTemplate>,
    },

    /// Show best lifts, LGC score and this week's wins
    Dashboard,

    /// Show the monthly LGC score trend
    History,

    /// Export stored records to CSV
    Export {
        /// Which records to export
        #[arg(long, value_enum, default_value_t = ExportKind::Workouts)]
        kind: ExportKind,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Workouts,
    Checkins,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    lgc_core::logging::init_with_level(lgc_core::logging::level_for_verbosity(cli.verbose));

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user_id = cli.user.unwrap_or_else(|| config.profile.user_id.clone());
    let mut store = JsonlStore::new(data_dir.join("store"));

    match cli.command {
        Commands::Import {
            file,
            yes,
            cancel,
            batch_size,
        } => {
            let review = if yes {
                Review::AutoCommit
            } else if cancel {
                Review::AutoCancel
            } else {
                Review::Prompt
            };
            let batch_size = batch_size.unwrap_or(config.import.batch_size);
            cmd_import(&mut store, &user_id, &file, review, batch_size)
        }
        Commands::Log {
            exercise,
            sets,
            date,
            name,
        } => {
            let date = date.unwrap_or_else(today);
            cmd_log(&mut store, &user_id, date, exercise, name.as_deref(), &sets)
        }
        Commands::Checkin {
            date,
            weight,
            waist,
            neck,
            hips,
            sleep,
            notes,
        } => {
            let entry = CheckinEntry {
                weight,
                waist,
                neck,
                hips,
                sleep_quality: sleep,
                notes,
            };
            cmd_checkin(&mut store, &user_id, date.unwrap_or_else(today), entry)
        }
        Commands::Plan { day } => cmd_plan(day),
        Commands::Dashboard => cmd_dashboard(&store, &user_id, &config),
        Commands::History => cmd_history(&store, &user_id),
        Commands::Export { kind, out } => cmd_export(&store, &user_id, kind, &out),
    }
}

/// How conflicts are reviewed during an import
#[derive(Clone, Copy)]
enum Review {
    Prompt,
    AutoCommit,
    AutoCancel,
}

/// Prints each log line as it happens
struct ConsoleObserver;

impl ImportObserver for ConsoleObserver {
    fn on_event(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Progress(_) => tracing::debug!("{}", event),
            ImportEvent::Conflict(_) => println!("    {}", event),
            e if e.is_error() => eprintln!("  ! {}", event),
            _ => println!("  {}", event),
        }
    }
}

fn cmd_import(
    store: &mut JsonlStore,
    user_id: &str,
    file: &Path,
    review: Review,
    batch_size: usize,
) -> Result<()> {
    // Exports are not always valid UTF-8; undecodable bytes become U+FFFD
    let bytes = std::fs::read(file)?;
    let text = String::from_utf8_lossy(&bytes);
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let mut resolver = |conflicts: &[ImportConflict]| match review {
        Review::AutoCommit => Decision::Commit,
        Review::AutoCancel => Decision::Cancel,
        Review::Prompt => prompt_decision(conflicts).unwrap_or(Decision::Cancel),
    };

    let summary = Importer::new(store, user_id)
        .with_batch_size(batch_size)
        .run(&file_name, &text, &mut resolver, &mut ConsoleObserver);

    println!();
    match summary.outcome {
        ImportOutcome::Committed => {
            println!("✓ Imported {} of {} entries", summary.imported, summary.extracted);
            if summary.failed_batches > 0 {
                println!("  {} batch(es) failed", summary.failed_batches);
            }
        }
        ImportOutcome::Cancelled => println!("Import cancelled."),
        ImportOutcome::Skipped => println!("Nothing imported: unrecognised file format."),
        ImportOutcome::Aborted(reason) => println!("Import aborted: {}", reason),
    }

    Ok(())
}

fn prompt_decision(conflicts: &[ImportConflict]) -> Result<Decision> {
    let replacing = conflicts
        .iter()
        .filter(|c| c.action == ConflictAction::Replace)
        .count();

    println!("─────────────────────────────────────────");
    println!(
        "{} existing entries: {} would be replaced, {} kept.",
        conflicts.len(),
        replacing,
        conflicts.len() - replacing
    );
    print!("Continue? [y/N] > ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let decision = match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Decision::Commit,
        _ => Decision::Cancel,
    };

    Ok(decision)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn cmd_log(
    store: &mut JsonlStore,
    user_id: &str,
    date: NaiveDate,
    exercise: Exercise,
    name: Option<&str>,
    sets: &[SetInput],
) -> Result<()> {
    let record = log_workout(store, user_id, date, exercise, name, sets)?;

    println!("✓ Logged {} for {}", record.exercise_name, record.date);
    for set in &record.sets {
        match set.rpe {
            Some(rpe) => println!("  Set {}: {} x {} @ RPE {}", set.set_number, set.weight, set.reps, rpe),
            None => println!("  Set {}: {} x {}", set.set_number, set.weight, set.reps),
        }
    }
    println!(
        "  Best set {} x {}, e1RM {}",
        record.best_weight, record.best_reps, record.e1rm
    );

    Ok(())
}

fn cmd_checkin(store: &mut JsonlStore, user_id: &str, date: NaiveDate, entry: CheckinEntry) -> Result<()> {
    let record = log_checkin(store, user_id, date, entry)?;

    println!("✓ Check-in saved for {}", record.date);
    if let Some(w) = record.weight {
        println!("  Weight    {}", w);
    }
    if let Some(w) = record.waist {
        println!("  Waist     {}", w);
    }
    if let Some(n) = record.neck {
        println!("  Neck      {}", n);
    }
    if let Some(h) = record.hips {
        println!("  Hips      {}", h);
    }
    if let Some(q) = record.sleep_quality {
        println!("  Sleep     {}/10", q.get());
    }
    if let Some(notes) = &record.notes {
        println!("  Notes     {}", notes);
    }

    Ok(())
}

fn cmd_plan(day: Option<DayTemplate>) -> Result<()> {
    let days = match day {
        Some(d) => vec![d],
        None => DayTemplate::ALL.to_vec(),
    };

    for day in days {
        println!("{}", day);
        for slot in day.exercises() {
            println!("  {:<26} {} x {}", slot.name, slot.sets, slot.reps);
        }
    }

    Ok(())
}

fn cmd_dashboard(store: &JsonlStore, user_id: &str, config: &Config) -> Result<()> {
    let workouts: Vec<WorkoutRecord> = store.fetch_all(user_id)?;
    let checkins: Vec<CheckinRecord> = store.fetch_all(user_id)?;

    let dash = Dashboard::build(&workouts, &checkins, &config.profile, today());

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  LGC SCORE  {:<28}│", format_score(dash.score));
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Squat     {}", format_lift(dash.lifts.squat));
    println!("  Bench     {}", format_lift(dash.lifts.bench));
    println!("  Deadlift  {}", format_lift(dash.lifts.deadlift));
    println!("  Total     {}", dash.lifts.total());
    println!();
    match dash.waist {
        Some(w) => println!("  Waist     {}", w),
        None => println!("  Waist     -"),
    }
    if let Some(bf) = dash.body_fat {
        println!("  Body fat  {}%", bf);
    }
    println!("  Check-ins this week   {}/7", dash.checkin_streak);
    println!("  Workouts this month   {}", dash.workouts_this_month);

    if !dash.wins.is_empty() {
        println!();
        for win in &dash.wins {
            println!("  ★ {}", win);
        }
    }
    println!();

    Ok(())
}

fn cmd_history(store: &JsonlStore, user_id: &str) -> Result<()> {
    let workouts: Vec<WorkoutRecord> = store.fetch_all(user_id)?;
    let checkins: Vec<CheckinRecord> = store.fetch_all(user_id)?;

    let history = score_history(&workouts, &checkins);
    if history.is_empty() {
        println!("No score history yet - log lifts and waist measurements first.");
        return Ok(());
    }

    println!(
        "{:<10} {:>6} {:>6} {:>6} {:>6} {:>7}",
        "Month", "Squat", "Bench", "Dead", "Waist", "Score"
    );
    for month in &history {
        println!(
            "{:<10} {:>6} {:>6} {:>6} {:>6} {:>7}",
            month.month.format("%b %Y"),
            month.lifts.squat,
            month.lifts.bench,
            month.lifts.deadlift,
            month.waist,
            month.score
        );
    }

    Ok(())
}

fn cmd_export(store: &JsonlStore, user_id: &str, kind: ExportKind, out: &Path) -> Result<()> {
    let count = match kind {
        ExportKind::Workouts => {
            let records: Vec<WorkoutRecord> = store.fetch_all(user_id)?;
            export_workouts(&records, out)?
        }
        ExportKind::Checkins => {
            let records: Vec<CheckinRecord> = store.fetch_all(user_id)?;
            export_checkins(&records, out)?
        }
    };

    println!("✓ Exported {} records to {}", count, out.display());
    Ok(())
}

fn format_score(score: f64) -> String {
    if score > 0.0 {
        format!("{:.1}", score)
    } else {
        "-".to_string()
    }
}

fn format_lift(e1rm: u32) -> String {
    if e1rm > 0 {
        e1rm.to_string()
    } else {
        "-".to_string()
    }
}
