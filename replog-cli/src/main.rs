use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::env;

use replog::dashboard::dashboard_stats;
use replog::db::models::{NewExercise, UpdateExercise};
use replog::db::operations::{
    add_exercise_to_workout, create_exercise, create_workout, delete_archived_workout,
    delete_exercise, delete_workout, get_all_exercises, get_all_workouts, get_exercise,
    get_workout, get_workout_exercises, get_workout_history, remove_exercise_from_workout,
    rename_workout, reorder_workout_exercises, update_archived_workout, update_exercise,
};
use replog::db::seed::seed_database;
use replog::session::{Session, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "replog", version, about = "replog - workout tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the exercise catalog
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Manage workout templates
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Log a workout session
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Review completed workouts
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Totals, day-by-day volume and personal bests over a date range
    Dashboard {
        /// Start date (YYYY-MM-DD), defaults to 30 days ago
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Populate a fresh database with a sample catalog and templates
    Seed {
        /// Empty every table first
        #[arg(long)]
        fresh: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ExerciseCommands {
    /// List all exercises
    List,
    /// Add an exercise to the catalog
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 3)]
        sets: i64,
        #[arg(long, default_value_t = 10)]
        reps: i64,
        #[arg(long, default_value_t = 0.0)]
        weight: f64,
    },
    /// Edit an exercise; omitted fields keep their values
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        sets: Option<i64>,
        #[arg(long)]
        reps: Option<i64>,
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Delete an exercise and its template/history rows
    Rm { id: i64 },
}

#[derive(Subcommand, Debug)]
enum WorkoutCommands {
    /// List workout templates
    List,
    /// Create a workout template
    Create { name: String },
    /// Rename a workout template
    Rename { id: i64, name: String },
    /// Delete a workout template and its exercises
    Rm { id: i64 },
    /// Show a template's exercises in order, with previous-weight hints
    Show { id: i64 },
    /// Append an exercise to a template (defaults come from the catalog)
    AddExercise {
        workout_id: i64,
        exercise_id: i64,
        #[arg(long)]
        sets: Option<i64>,
        #[arg(long)]
        reps: Option<i64>,
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Remove one exercise row from its template
    RmExercise { id: i64 },
    /// Rewrite a template's order to the given row ids
    Reorder {
        workout_id: i64,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum LogCommands {
    /// Start logging against a template
    Start { workout_id: i64 },
    /// Show the in-progress session
    Status,
    /// Edit one entry's numbers locally
    Edit {
        entry_id: i64,
        #[arg(long)]
        sets: i64,
        #[arg(long)]
        reps: i64,
        #[arg(long)]
        weight: f64,
    },
    /// Persist one entry's numbers to the template
    Save { entry_id: i64 },
    /// Archive the session with a 1-5 satisfaction score
    Finish { score: i64 },
    /// Abandon the session without archiving
    Discard,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List completed workouts, newest first
    List,
    /// Delete a completed workout and its exercises
    Rm { id: i64 },
    /// Correct a completed workout's name or date
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn database_url(store: &SessionStore) -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| {
        store.dir().join("replog.db").to_string_lossy().into_owned()
    })
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap()
        .and_utc()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let store = SessionStore::new(SessionStore::default_dir());
    let url = database_url(&store);
    let session = Session::open(&url, store)
        .await
        .with_context(|| format!("failed to open database at {url}"))?;
    let pool = session.pool();

    match args.command {
        Commands::Exercise { command } => match command {
            ExerciseCommands::List => {
                for e in get_all_exercises(pool).await? {
                    println!(
                        "{:>4}  {:<28} {} x {} @ {:.1}kg  {}",
                        e.id,
                        e.name,
                        e.default_sets,
                        e.default_reps,
                        e.default_weight,
                        e.description.as_deref().unwrap_or("")
                    );
                }
            }
            ExerciseCommands::Add { name, description, sets, reps, weight } => {
                let exercise = create_exercise(
                    pool,
                    &NewExercise {
                        name,
                        description,
                        default_sets: sets,
                        default_reps: reps,
                        default_weight: weight,
                    },
                )
                .await?;
                println!("Created exercise {} ({})", exercise.name, exercise.id);
            }
            ExerciseCommands::Edit { id, name, description, sets, reps, weight } => {
                let exercise = update_exercise(
                    pool,
                    id,
                    &UpdateExercise {
                        name,
                        description,
                        default_sets: sets,
                        default_reps: reps,
                        default_weight: weight,
                    },
                )
                .await?;
                println!("Updated exercise {} ({})", exercise.name, exercise.id);
            }
            ExerciseCommands::Rm { id } => {
                delete_exercise(pool, id).await?;
                println!("Deleted exercise {id}");
            }
        },

        Commands::Workout { command } => match command {
            WorkoutCommands::List => {
                for w in get_all_workouts(pool).await? {
                    println!("{:>4}  {}", w.id, w.name);
                }
            }
            WorkoutCommands::Create { name } => {
                let workout = create_workout(pool, &name).await?;
                println!("Created workout {} ({})", workout.name, workout.id);
            }
            WorkoutCommands::Rename { id, name } => {
                let workout = rename_workout(pool, id, &name).await?;
                println!("Renamed workout {} to {}", workout.id, workout.name);
            }
            WorkoutCommands::Rm { id } => {
                delete_workout(pool, id).await?;
                println!("Deleted workout {id}");
            }
            WorkoutCommands::Show { id } => {
                let workout = get_workout(pool, id).await?;
                println!("{} ({})", workout.name, workout.id);
                for row in get_workout_exercises(pool, id).await? {
                    let hint = match row.previous_weight {
                        Some(previous) => format!(
                            "  (last: {:.1}kg, next: {:.1}kg)",
                            previous,
                            replog::session::suggested_weight(previous)
                        ),
                        None => String::new(),
                    };
                    println!(
                        "  [{}] {:>4}  {:<28} {} x {} @ {:.1}kg{}",
                        row.order_index, row.id, row.exercise_name, row.sets, row.reps,
                        row.weight, hint
                    );
                }
            }
            WorkoutCommands::AddExercise { workout_id, exercise_id, sets, reps, weight } => {
                let exercise = get_exercise(pool, exercise_id).await?;
                let row = add_exercise_to_workout(
                    pool,
                    workout_id,
                    exercise_id,
                    sets.unwrap_or(exercise.default_sets),
                    reps.unwrap_or(exercise.default_reps),
                    weight.unwrap_or(exercise.default_weight),
                )
                .await?;
                println!(
                    "Added {} to workout {} at position {}",
                    exercise.name, workout_id, row.order_index
                );
            }
            WorkoutCommands::RmExercise { id } => {
                remove_exercise_from_workout(pool, id).await?;
                println!("Removed workout exercise {id}");
            }
            WorkoutCommands::Reorder { workout_id, ids } => {
                reorder_workout_exercises(pool, workout_id, &ids).await?;
                println!("Reordered {} exercises", ids.len());
            }
        },

        Commands::Log { command } => match command {
            LogCommands::Start { workout_id } => {
                let active = session.start_workout(workout_id).await?;
                println!(
                    "Started '{}' with {} exercises",
                    active.workout.name,
                    active.entries.len()
                );
            }
            LogCommands::Status => match session.active_workout().await {
                Some(active) => {
                    let saved = session.saved_entry_ids();
                    println!("Logging '{}'", active.workout.name);
                    for entry in &active.entries {
                        let mark = if saved.contains(&entry.workout_exercise_id) {
                            "*"
                        } else {
                            " "
                        };
                        println!(
                            "{} {:>4}  {:<28} {} x {} @ {:.1}kg",
                            mark, entry.workout_exercise_id, entry.exercise_name,
                            entry.sets, entry.reps, entry.weight
                        );
                    }
                }
                None => println!("No workout in progress"),
            },
            LogCommands::Edit { entry_id, sets, reps, weight } => {
                let entry = session.update_entry(entry_id, sets, reps, weight).await?;
                println!(
                    "{}: {} x {} @ {:.1}kg",
                    entry.exercise_name, entry.sets, entry.reps, entry.weight
                );
            }
            LogCommands::Save { entry_id } => {
                let entry = session.save_entry(entry_id).await?;
                println!("Saved {}", entry.exercise_name);
            }
            LogCommands::Finish { score } => {
                let archived = session.finish_workout(score).await?;
                println!(
                    "Finished '{}' (archived {}, score {})",
                    archived.name, archived.id, archived.score
                );
            }
            LogCommands::Discard => {
                session.discard_workout().await?;
                println!("Discarded the in-progress workout");
            }
        },

        Commands::History { command } => match command {
            HistoryCommands::List => {
                for entry in get_workout_history(pool).await? {
                    println!(
                        "{:>4}  {}  {:<24} score {}  volume {:.0}kg",
                        entry.workout.id,
                        entry.workout.date.format("%Y-%m-%d"),
                        entry.workout.name,
                        entry.workout.score,
                        entry.volume()
                    );
                    for exercise in &entry.exercises {
                        println!("        {exercise}");
                    }
                }
            }
            HistoryCommands::Rm { id } => {
                delete_archived_workout(pool, id).await?;
                println!("Deleted archived workout {id}");
            }
            HistoryCommands::Edit { id, name, date } => {
                let updated =
                    update_archived_workout(pool, id, name.as_deref(), date.map(day_start))
                        .await?;
                println!(
                    "Updated archived workout {}: {} on {}",
                    updated.id,
                    updated.name,
                    updated.date.format("%Y-%m-%d")
                );
            }
        },

        Commands::Dashboard { from, to } => {
            let end = to.map(day_end).unwrap_or_else(Utc::now);
            let start = from
                .map(day_start)
                .unwrap_or_else(|| end - Duration::days(30));
            let stats = dashboard_stats(pool, start, end).await?;

            if let Some(effective) = stats.effective_start {
                if effective < start {
                    println!(
                        "(no workouts in range, widened to {})",
                        effective.format("%Y-%m-%d")
                    );
                }
            }
            println!("Workouts:   {}", stats.total_workouts);
            println!("Volume:     {:.0}kg", stats.total_volume);
            println!("Avg score:  {:.1}", stats.avg_score);

            if !stats.volume_by_day.is_empty() {
                println!("\nVolume by day:");
                for day in &stats.volume_by_day {
                    println!("  {}  {:.0}kg", day.date, day.volume);
                }
            }
            if !stats.exercise_progress.is_empty() {
                println!("\nTop weight by day:");
                for point in &stats.exercise_progress {
                    println!(
                        "  {}  {:<28} {:.1}kg",
                        point.date, point.exercise_name, point.max_weight
                    );
                }
            }
            if !stats.personal_bests.is_empty() {
                println!("\nPersonal bests:");
                for best in &stats.personal_bests {
                    println!(
                        "  {:<28} {:.1} {} ({})",
                        best.exercise_name,
                        best.value,
                        best.metric.unit(),
                        best.date.format("%Y-%m-%d")
                    );
                }
            }
        }

        Commands::Seed { fresh } => {
            if fresh {
                replog::db::drop_all_tables(pool).await?;
            }
            seed_database(pool).await?;
            println!("Seeded sample exercises and workouts");
        }
    }

    Ok(())
}
