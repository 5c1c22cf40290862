//! Sample data for a fresh database: a small exercise catalog and three
//! templates. Seeding twice surfaces the duplicate-name error rather than
//! silently duplicating the catalog.

use log::info;
use sqlx::SqlitePool;

use crate::db::models::NewExercise;
use crate::db::operations::{add_exercise_to_workout, create_exercise, create_workout};
use crate::error::Result;

struct SeedExercise {
    name: &'static str,
    description: &'static str,
    sets: i64,
    reps: i64,
    weight: f64,
}

const CATALOG: &[SeedExercise] = &[
    SeedExercise { name: "Bench Press", description: "Barbell flat bench", sets: 4, reps: 8, weight: 60.0 },
    SeedExercise { name: "Dumbbell Bench Press", description: "Flat bench, dumbbells", sets: 3, reps: 10, weight: 22.5 },
    SeedExercise { name: "Overhead Press", description: "Standing barbell press", sets: 3, reps: 10, weight: 40.0 },
    SeedExercise { name: "Barbell Row", description: "Bent-over row", sets: 4, reps: 10, weight: 50.0 },
    SeedExercise { name: "Pull Ups", description: "Bodyweight, full hang", sets: 3, reps: 8, weight: 0.0 },
    SeedExercise { name: "Lat Pulldowns", description: "Cable, wide grip", sets: 3, reps: 12, weight: 45.0 },
    SeedExercise { name: "Squats", description: "Barbell back squat", sets: 4, reps: 8, weight: 80.0 },
    SeedExercise { name: "Deadlift", description: "Conventional", sets: 3, reps: 5, weight: 100.0 },
];

const TEMPLATES: &[(&str, &[&str])] = &[
    ("Push Day", &["Bench Press", "Dumbbell Bench Press", "Overhead Press"]),
    ("Pull Day", &["Barbell Row", "Pull Ups", "Lat Pulldowns"]),
    ("Leg Day", &["Squats", "Deadlift"]),
];

pub async fn seed_database(pool: &SqlitePool) -> Result<()> {
    let mut created = Vec::with_capacity(CATALOG.len());
    for seed in CATALOG {
        let exercise = create_exercise(
            pool,
            &NewExercise {
                name: seed.name.to_string(),
                description: Some(seed.description.to_string()),
                default_sets: seed.sets,
                default_reps: seed.reps,
                default_weight: seed.weight,
            },
        )
        .await?;
        created.push(exercise);
    }

    for (workout_name, exercise_names) in TEMPLATES {
        let workout = create_workout(pool, workout_name).await?;
        for name in *exercise_names {
            // Catalog entries above cover every template member.
            if let Some(exercise) = created.iter().find(|e| e.name == *name) {
                add_exercise_to_workout(
                    pool,
                    workout.id,
                    exercise.id,
                    exercise.default_sets,
                    exercise.default_reps,
                    exercise.default_weight,
                )
                .await?;
            }
        }
    }

    info!(
        "Seeded {} exercises and {} workout templates",
        created.len(),
        TEMPLATES.len()
    );
    Ok(())
}
