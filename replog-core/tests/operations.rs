//! CRUD and ordering tests against a temporary database that is cleaned
//! up after each test.

use replog::Error;
use replog::db;
use replog::db::models::{NewExercise, UpdateExercise};
use replog::db::operations::{
    add_exercise_to_workout, create_exercise, create_workout, exercise_name_taken,
    get_workout_exercises, remove_exercise_from_workout, reorder_workout_exercises,
    update_exercise,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");
    let pool = db::connect(path.to_str().unwrap())
        .await
        .expect("Failed to open test database");
    db::init_database(&pool).await.expect("Failed to migrate");
    (dir, pool)
}

fn named(name: &str) -> NewExercise {
    NewExercise {
        name: name.to_string(),
        default_sets: 3,
        default_reps: 10,
        default_weight: 20.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn duplicate_name_is_rejected_case_insensitively() {
    let (_dir, pool) = test_db().await;

    create_exercise(&pool, &named("Squats")).await.unwrap();
    let err = create_exercise(&pool, &named("squats")).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateExerciseName), "got {err:?}");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    assert!(exercise_name_taken(&pool, "SQUATS").await.unwrap());
    assert!(!exercise_name_taken(&pool, "Deadlift").await.unwrap());
}

#[tokio::test]
async fn rename_onto_existing_name_is_rejected() {
    let (_dir, pool) = test_db().await;

    create_exercise(&pool, &named("Squats")).await.unwrap();
    let deadlift = create_exercise(&pool, &named("Deadlift")).await.unwrap();

    let err = update_exercise(
        &pool,
        deadlift.id,
        &UpdateExercise {
            name: Some("SQUATS".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateExerciseName));
}

#[tokio::test]
async fn partial_update_keeps_unspecified_fields() {
    let (_dir, pool) = test_db().await;

    let created = create_exercise(
        &pool,
        &NewExercise {
            name: "Squats".to_string(),
            description: Some("Back squat".to_string()),
            default_sets: 4,
            default_reps: 8,
            default_weight: 80.0,
        },
    )
    .await
    .unwrap();

    let updated = update_exercise(
        &pool,
        created.id,
        &UpdateExercise {
            default_weight: Some(82.5),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Squats");
    assert_eq!(updated.description.as_deref(), Some("Back squat"));
    assert_eq!(updated.default_sets, 4);
    assert_eq!(updated.default_weight, 82.5);
}

#[tokio::test]
async fn appended_exercises_get_dense_order_indices() {
    let (_dir, pool) = test_db().await;

    let workout = create_workout(&pool, "Push Day").await.unwrap();
    for name in ["Bench Press", "Overhead Press", "Dips"] {
        let exercise = create_exercise(&pool, &named(name)).await.unwrap();
        add_exercise_to_workout(&pool, workout.id, exercise.id, 3, 10, 20.0)
            .await
            .unwrap();
    }

    let rows = get_workout_exercises(&pool, workout.id).await.unwrap();
    let indices: Vec<i64> = rows.iter().map(|r| r.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn reorder_rewrites_indices_to_the_submitted_sequence() {
    let (_dir, pool) = test_db().await;

    let workout = create_workout(&pool, "Push Day").await.unwrap();
    let mut row_ids = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let exercise = create_exercise(&pool, &named(name)).await.unwrap();
        let row = add_exercise_to_workout(&pool, workout.id, exercise.id, 3, 10, 20.0)
            .await
            .unwrap();
        row_ids.push(row.id);
    }

    let submitted = vec![row_ids[2], row_ids[0], row_ids[3], row_ids[1]];
    reorder_workout_exercises(&pool, workout.id, &submitted)
        .await
        .unwrap();

    let rows = get_workout_exercises(&pool, workout.id).await.unwrap();
    let read_back: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let indices: Vec<i64> = rows.iter().map(|r| r.order_index).collect();
    assert_eq!(read_back, submitted);
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn reorder_with_a_foreign_id_aborts_the_whole_operation() {
    let (_dir, pool) = test_db().await;

    let push = create_workout(&pool, "Push Day").await.unwrap();
    let pull = create_workout(&pool, "Pull Day").await.unwrap();

    let bench = create_exercise(&pool, &named("Bench Press")).await.unwrap();
    let press = create_exercise(&pool, &named("Overhead Press")).await.unwrap();
    let row = create_exercise(&pool, &named("Barbell Row")).await.unwrap();

    let a = add_exercise_to_workout(&pool, push.id, bench.id, 3, 10, 20.0).await.unwrap();
    let b = add_exercise_to_workout(&pool, push.id, press.id, 3, 10, 20.0).await.unwrap();
    let foreign = add_exercise_to_workout(&pool, pull.id, row.id, 3, 10, 20.0).await.unwrap();

    let err = reorder_workout_exercises(&pool, push.id, &[b.id, foreign.id, a.id])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    // The stored order is untouched.
    let rows = get_workout_exercises(&pool, push.id).await.unwrap();
    let read_back: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(read_back, vec![a.id, b.id]);
}

#[tokio::test]
async fn removal_reindexes_only_the_owning_workout() {
    let (_dir, pool) = test_db().await;

    let push = create_workout(&pool, "Push Day").await.unwrap();
    let pull = create_workout(&pool, "Pull Day").await.unwrap();

    let mut push_rows = Vec::new();
    for name in ["A", "B", "C"] {
        let exercise = create_exercise(&pool, &named(name)).await.unwrap();
        push_rows.push(
            add_exercise_to_workout(&pool, push.id, exercise.id, 3, 10, 20.0)
                .await
                .unwrap(),
        );
    }
    for name in ["D", "E", "F"] {
        let exercise = create_exercise(&pool, &named(name)).await.unwrap();
        add_exercise_to_workout(&pool, pull.id, exercise.id, 3, 10, 20.0)
            .await
            .unwrap();
    }

    // Remove the middle row of the push workout.
    remove_exercise_from_workout(&pool, push_rows[1].id)
        .await
        .unwrap();

    let push_after = get_workout_exercises(&pool, push.id).await.unwrap();
    let indices: Vec<i64> = push_after.iter().map(|r| r.order_index).collect();
    let ids: Vec<i64> = push_after.iter().map(|r| r.id).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(ids, vec![push_rows[0].id, push_rows[2].id]);

    // The other workout keeps its own dense sequence.
    let pull_after = get_workout_exercises(&pool, pull.id).await.unwrap();
    let indices: Vec<i64> = pull_after.iter().map(|r| r.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}
