//! Dashboard range queries and the empty-range fallback, end to end.

use chrono::{DateTime, NaiveDate, Utc};
use replog::dashboard::dashboard_stats;
use replog::db;
use replog::db::models::{NewArchivedExercise, NewExercise};
use replog::db::operations::{
    create_exercise, finish_workout, get_archived_workout, get_recent_activity,
    update_archived_workout,
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

fn at(date: &str, hour: u32) -> DateTime<Utc> {
    date.parse::<NaiveDate>()
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
}

/// Archives one session and backdates it.
async fn archive_session(
    pool: &SqlitePool,
    name: &str,
    date: DateTime<Utc>,
    score: i64,
    exercises: &[NewArchivedExercise],
) {
    let archived = finish_workout(pool, None, name, exercises, score)
        .await
        .unwrap();
    update_archived_workout(pool, archived.id, None, Some(date))
        .await
        .unwrap();
}

fn entry(exercise_id: i64, sets: i64, reps: i64, weight: f64) -> NewArchivedExercise {
    NewArchivedExercise { exercise_id, sets, reps, weight }
}

#[tokio::test]
async fn same_day_sessions_share_one_volume_bucket() {
    let (_dir, pool) = test_db().await;
    let squats = create_exercise(
        &pool,
        &NewExercise { name: "Squats".into(), ..Default::default() },
    )
    .await
    .unwrap();

    archive_session(&pool, "AM", at("2026-08-01", 9), 4, &[entry(squats.id, 3, 10, 20.0)]).await;
    archive_session(&pool, "PM", at("2026-08-01", 18), 5, &[entry(squats.id, 3, 10, 30.0)]).await;
    archive_session(&pool, "Next", at("2026-08-02", 9), 3, &[entry(squats.id, 1, 10, 10.0)]).await;

    let stats = dashboard_stats(&pool, at("2026-08-01", 0), at("2026-08-03", 0))
        .await
        .unwrap();
    assert_eq!(stats.total_workouts, 3);
    assert_eq!(stats.volume_by_day.len(), 2);
    assert_eq!(stats.volume_by_day[0].date.to_string(), "2026-08-01");
    assert_eq!(stats.volume_by_day[0].volume, 1500.0);
    assert_eq!(stats.volume_by_day[1].volume, 100.0);
    assert_eq!(stats.total_volume, 1600.0);
    assert_eq!(stats.avg_score, 4.0);
}

#[tokio::test]
async fn empty_range_widens_to_the_nearest_prior_workout() {
    let (_dir, pool) = test_db().await;
    let squats = create_exercise(
        &pool,
        &NewExercise { name: "Squats".into(), ..Default::default() },
    )
    .await
    .unwrap();

    let july = at("2026-07-01", 9);
    archive_session(&pool, "Old", july, 4, &[entry(squats.id, 3, 10, 50.0)]).await;

    let stats = dashboard_stats(&pool, at("2026-08-01", 0), at("2026-08-20", 0))
        .await
        .unwrap();
    assert_eq!(stats.total_workouts, 1);
    assert_eq!(stats.effective_start, Some(july));
    assert_eq!(stats.total_volume, 1500.0);
}

#[tokio::test]
async fn empty_history_returns_zero_totals_without_looping() {
    let (_dir, pool) = test_db().await;
    let stats = dashboard_stats(&pool, at("2026-08-01", 0), at("2026-08-20", 0))
        .await
        .unwrap();
    assert_eq!(stats.total_workouts, 0);
    assert_eq!(stats.total_volume, 0.0);
    assert_eq!(stats.avg_score, 0.0);
    assert!(stats.volume_by_day.is_empty());
    assert!(stats.effective_start.is_none());
}

#[tokio::test]
async fn workouts_after_the_range_do_not_trigger_the_fallback() {
    let (_dir, pool) = test_db().await;
    let squats = create_exercise(
        &pool,
        &NewExercise { name: "Squats".into(), ..Default::default() },
    )
    .await
    .unwrap();

    // Only a workout after `end` exists; the fallback looks backwards only.
    archive_session(&pool, "Future", at("2026-09-15", 9), 4, &[entry(squats.id, 3, 10, 50.0)]).await;

    let stats = dashboard_stats(&pool, at("2026-08-01", 0), at("2026-08-20", 0))
        .await
        .unwrap();
    assert_eq!(stats.total_workouts, 0);
    assert!(stats.effective_start.is_none());
}

#[tokio::test]
async fn recent_activity_is_newest_first_and_limited() {
    let (_dir, pool) = test_db().await;
    let squats = create_exercise(
        &pool,
        &NewExercise { name: "Squats".into(), ..Default::default() },
    )
    .await
    .unwrap();

    for (name, date) in [
        ("One", "2026-08-01"),
        ("Two", "2026-08-03"),
        ("Three", "2026-08-02"),
    ] {
        archive_session(&pool, name, at(date, 9), 3, &[entry(squats.id, 3, 10, 50.0)]).await;
    }

    let recent = get_recent_activity(&pool, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].name, "Two");
    assert_eq!(recent[1].name, "Three");

    let fetched = get_archived_workout(&pool, recent[0].id).await.unwrap();
    assert_eq!(fetched.name, "Two");
    assert_eq!(fetched.date, at("2026-08-03", 9));
}

#[tokio::test]
async fn personal_bests_follow_name_keyed_metrics_across_sessions() {
    let (_dir, pool) = test_db().await;
    let pull_ups = create_exercise(
        &pool,
        &NewExercise { name: "Pull Ups".into(), ..Default::default() },
    )
    .await
    .unwrap();
    let pulldowns = create_exercise(
        &pool,
        &NewExercise { name: "Lat Pulldowns".into(), ..Default::default() },
    )
    .await
    .unwrap();

    archive_session(
        &pool,
        "One",
        at("2026-08-01", 9),
        4,
        &[entry(pull_ups.id, 3, 12, 0.0), entry(pulldowns.id, 3, 12, 40.0)],
    )
    .await;
    archive_session(
        &pool,
        "Two",
        at("2026-08-03", 9),
        4,
        &[entry(pull_ups.id, 3, 8, 0.0), entry(pulldowns.id, 3, 10, 45.0)],
    )
    .await;

    let stats = dashboard_stats(&pool, at("2026-08-01", 0), at("2026-08-05", 0))
        .await
        .unwrap();

    let pull_up_best = stats
        .personal_bests
        .iter()
        .find(|b| b.exercise_name == "Pull Ups")
        .unwrap();
    // Reps, not weight; the lower-rep later session does not overwrite.
    assert_eq!(pull_up_best.value, 12.0);
    assert_eq!(pull_up_best.date, at("2026-08-01", 9));

    let pulldown_best = stats
        .personal_bests
        .iter()
        .find(|b| b.exercise_name == "Lat Pulldowns")
        .unwrap();
    assert_eq!(pulldown_best.value, 45.0);
    assert_eq!(pulldown_best.date, at("2026-08-03", 9));
}
