use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::models::{
    ArchivedExercise, ArchivedSession, ArchivedWorkout, Exercise, NewArchivedExercise,
    NewExercise, TemplateExercise, UpdateExercise, Workout, WorkoutExercise,
};
use crate::error::{Error, Result};

// Exercises

pub async fn get_all_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>> {
    sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_exercise(pool: &SqlitePool, exercise_id: i64) -> Result<Exercise> {
    sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = ?1")
        .bind(exercise_id)
        .fetch_optional(pool)
        .await?
        .ok_or(Error::not_found("exercise", exercise_id))
}

/// Inserts a catalog row. Duplicate detection relies solely on the
/// case-insensitive unique constraint; there is no pre-check to race.
pub async fn create_exercise(pool: &SqlitePool, new: &NewExercise) -> Result<Exercise> {
    sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (name, description, default_sets, default_reps, default_weight)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.default_sets)
    .bind(new.default_reps)
    .bind(new.default_weight)
    .fetch_one(pool)
    .await
    .map_err(Error::from_exercise_write)
}

pub async fn update_exercise(
    pool: &SqlitePool,
    exercise_id: i64,
    update: &UpdateExercise,
) -> Result<Exercise> {
    sqlx::query_as::<_, Exercise>(
        "UPDATE exercises SET
            name = COALESCE(?1, name),
            description = COALESCE(?2, description),
            default_sets = COALESCE(?3, default_sets),
            default_reps = COALESCE(?4, default_reps),
            default_weight = COALESCE(?5, default_weight),
            updated_at = CAST(strftime('%s','now') AS INTEGER)
         WHERE id = ?6
         RETURNING *",
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.default_sets)
    .bind(update.default_reps)
    .bind(update.default_weight)
    .bind(exercise_id)
    .fetch_optional(pool)
    .await
    .map_err(Error::from_exercise_write)?
    .ok_or(Error::not_found("exercise", exercise_id))
}

pub async fn delete_exercise(pool: &SqlitePool, exercise_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = ?1")
        .bind(exercise_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("exercise", exercise_id));
    }
    Ok(())
}

/// Optimistic UX hint only; the unique constraint remains the source of
/// truth for duplicate names.
pub async fn exercise_name_taken(pool: &SqlitePool, name: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM exercises WHERE name = ?1)")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
}

// Workout templates

pub async fn get_all_workouts(pool: &SqlitePool) -> Result<Vec<Workout>> {
    sqlx::query_as::<_, Workout>("SELECT * FROM workouts ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_workout(pool: &SqlitePool, workout_id: i64) -> Result<Workout> {
    sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = ?1")
        .bind(workout_id)
        .fetch_optional(pool)
        .await?
        .ok_or(Error::not_found("workout", workout_id))
}

pub async fn create_workout(pool: &SqlitePool, name: &str) -> Result<Workout> {
    sqlx::query_as::<_, Workout>("INSERT INTO workouts (name) VALUES (?1) RETURNING *")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
}

pub async fn rename_workout(pool: &SqlitePool, workout_id: i64, name: &str) -> Result<Workout> {
    sqlx::query_as::<_, Workout>(
        "UPDATE workouts SET name = ?1, updated_at = CAST(strftime('%s','now') AS INTEGER)
         WHERE id = ?2 RETURNING *",
    )
    .bind(name)
    .bind(workout_id)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::not_found("workout", workout_id))
}

pub async fn delete_workout(pool: &SqlitePool, workout_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
        .bind(workout_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("workout", workout_id));
    }
    Ok(())
}

// Workout exercises

/// Appends an exercise to a template. The order index is computed inside
/// the insert so concurrent appends cannot collide.
pub async fn add_exercise_to_workout(
    pool: &SqlitePool,
    workout_id: i64,
    exercise_id: i64,
    sets: i64,
    reps: i64,
    weight: f64,
) -> Result<WorkoutExercise> {
    sqlx::query_as::<_, WorkoutExercise>(
        "INSERT INTO workout_exercises (workout_id, exercise_id, sets, reps, weight, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5,
                 (SELECT COALESCE(MAX(order_index) + 1, 0)
                    FROM workout_exercises WHERE workout_id = ?1))
         RETURNING *",
    )
    .bind(workout_id)
    .bind(exercise_id)
    .bind(sets)
    .bind(reps)
    .bind(weight)
    .fetch_one(pool)
    .await
    .map_err(Into::into)
}

/// Persists one row's numbers independently of the rest of the workout.
pub async fn update_workout_exercise(
    pool: &SqlitePool,
    id: i64,
    sets: i64,
    reps: i64,
    weight: f64,
) -> Result<WorkoutExercise> {
    sqlx::query_as::<_, WorkoutExercise>(
        "UPDATE workout_exercises SET sets = ?1, reps = ?2, weight = ?3
         WHERE id = ?4 RETURNING *",
    )
    .bind(sets)
    .bind(reps)
    .bind(weight)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::not_found("workout exercise", id))
}

/// Template rows in display order, each carrying the exercise name and
/// the most recent archived weight for that exercise (when any exists).
pub async fn get_workout_exercises(
    pool: &SqlitePool,
    workout_id: i64,
) -> Result<Vec<TemplateExercise>> {
    sqlx::query_as::<_, TemplateExercise>(
        "SELECT we.id, we.workout_id, we.exercise_id, e.name AS exercise_name,
                we.sets, we.reps, we.weight, we.order_index,
                h.weight AS previous_weight, h.created_at AS last_used_at
         FROM workout_exercises we
         JOIN exercises e ON e.id = we.exercise_id
         LEFT JOIN (
             SELECT exercise_id, weight, created_at,
                    ROW_NUMBER() OVER (
                        PARTITION BY exercise_id
                        ORDER BY created_at DESC, id DESC
                    ) AS rn
             FROM workout_exercises
             WHERE archived_workout_id IS NOT NULL
         ) h ON h.exercise_id = we.exercise_id AND h.rn = 1
         WHERE we.workout_id = ?1
         ORDER BY we.order_index ASC, we.id ASC",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Removes a template row and reindexes the survivors of the same workout
/// to a dense 0..N-1 sequence, all in one transaction.
pub async fn remove_exercise_from_workout(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let workout_id: Option<i64> =
        sqlx::query_scalar("SELECT workout_id FROM workout_exercises WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::not_found("workout exercise", id))?;

    sqlx::query("DELETE FROM workout_exercises WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Archived children carry no meaningful order; only template rows of
    // the owning workout are reindexed.
    if let Some(workout_id) = workout_id {
        let remaining: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM workout_exercises
             WHERE workout_id = ?1 ORDER BY order_index ASC, id ASC",
        )
        .bind(workout_id)
        .fetch_all(&mut *tx)
        .await?;

        for (index, remaining_id) in remaining.iter().enumerate() {
            sqlx::query("UPDATE workout_exercises SET order_index = ?1 WHERE id = ?2")
                .bind(index as i64)
                .bind(remaining_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Rewrites order indices to the ordinal position of each id in `ids`,
/// atomically. An id that does not belong to the workout aborts the whole
/// reorder and leaves the stored order untouched.
pub async fn reorder_workout_exercises(
    pool: &SqlitePool,
    workout_id: i64,
    ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (index, id) in ids.iter().enumerate() {
        let result = sqlx::query(
            "UPDATE workout_exercises SET order_index = ?1
             WHERE id = ?2 AND workout_id = ?3",
        )
        .bind(index as i64)
        .bind(id)
        .bind(workout_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("workout exercise", *id));
        }
    }

    tx.commit().await?;
    Ok(())
}

// Archived workouts

/// Archives a finished session: one archive row plus one child per
/// exercise, in a single transaction.
pub async fn finish_workout(
    pool: &SqlitePool,
    workout_template_id: Option<i64>,
    name: &str,
    exercises: &[NewArchivedExercise],
    score: i64,
) -> Result<ArchivedWorkout> {
    if !(1..=5).contains(&score) {
        return Err(Error::InvalidScore(score));
    }

    let mut tx = pool.begin().await?;

    let archived = sqlx::query_as::<_, ArchivedWorkout>(
        "INSERT INTO archived_workouts (workout_template_id, name, date, score)
         VALUES (?1, ?2, ?3, ?4) RETURNING *",
    )
    .bind(workout_template_id)
    .bind(name)
    .bind(Utc::now())
    .bind(score)
    .fetch_one(&mut *tx)
    .await?;

    for exercise in exercises {
        sqlx::query(
            "INSERT INTO workout_exercises (archived_workout_id, exercise_id, sets, reps, weight)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(archived.id)
        .bind(exercise.exercise_id)
        .bind(exercise.sets)
        .bind(exercise.reps)
        .bind(exercise.weight)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    debug!(
        "Archived workout {} ({} exercises, score {})",
        archived.id,
        exercises.len(),
        score
    );
    Ok(archived)
}

pub async fn get_archived_workout(pool: &SqlitePool, id: i64) -> Result<ArchivedWorkout> {
    sqlx::query_as::<_, ArchivedWorkout>("SELECT * FROM archived_workouts WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(Error::not_found("archived workout", id))
}

pub async fn delete_archived_workout(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM archived_workouts WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("archived workout", id));
    }
    Ok(())
}

/// Name/date correction is the only mutation an archive row permits.
pub async fn update_archived_workout(
    pool: &SqlitePool,
    id: i64,
    name: Option<&str>,
    date: Option<DateTime<Utc>>,
) -> Result<ArchivedWorkout> {
    sqlx::query_as::<_, ArchivedWorkout>(
        "UPDATE archived_workouts SET
            name = COALESCE(?1, name),
            date = COALESCE(?2, date)
         WHERE id = ?3 RETURNING *",
    )
    .bind(name)
    .bind(date)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::not_found("archived workout", id))
}

pub async fn get_recent_activity(pool: &SqlitePool, limit: i64) -> Result<Vec<ArchivedWorkout>> {
    sqlx::query_as::<_, ArchivedWorkout>(
        "SELECT * FROM archived_workouts ORDER BY date DESC, id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Full history, newest first, children attached.
pub async fn get_workout_history(pool: &SqlitePool) -> Result<Vec<ArchivedSession>> {
    let workouts = sqlx::query_as::<_, ArchivedWorkout>(
        "SELECT * FROM archived_workouts ORDER BY date DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    attach_children(pool, workouts).await
}

/// Archived sessions whose date falls in `[start, end]`, ascending.
pub async fn get_sessions_in_range(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ArchivedSession>> {
    let workouts = sqlx::query_as::<_, ArchivedWorkout>(
        "SELECT * FROM archived_workouts
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date ASC, id ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    attach_children(pool, workouts).await
}

/// Date of the most recent archived workout at or before `end`, used by
/// the dashboard's empty-range fallback.
pub async fn nearest_session_date_before(
    pool: &SqlitePool,
    end: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT date FROM archived_workouts
         WHERE date <= ?1 ORDER BY date DESC, id DESC LIMIT 1",
    )
    .bind(end)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

async fn attach_children(
    pool: &SqlitePool,
    workouts: Vec<ArchivedWorkout>,
) -> Result<Vec<ArchivedSession>> {
    if workouts.is_empty() {
        return Ok(Vec::new());
    }

    // One children query for the whole set, grouped in memory.
    let ids: Vec<String> = workouts.iter().map(|w| w.id.to_string()).collect();
    let query = format!(
        "SELECT we.id, we.archived_workout_id, we.exercise_id, e.name AS exercise_name,
                we.sets, we.reps, we.weight, we.created_at
         FROM workout_exercises we
         JOIN exercises e ON e.id = we.exercise_id
         WHERE we.archived_workout_id IN ({})
         ORDER BY we.archived_workout_id ASC, we.order_index ASC, we.id ASC",
        ids.join(",")
    );
    let children = sqlx::query_as::<_, ArchivedExercise>(&query)
        .fetch_all(pool)
        .await?;

    let mut by_parent: HashMap<i64, Vec<ArchivedExercise>> = HashMap::new();
    for child in children {
        by_parent
            .entry(child.archived_workout_id)
            .or_default()
            .push(child);
    }

    Ok(workouts
        .into_iter()
        .map(|workout| {
            let exercises = by_parent.remove(&workout.id).unwrap_or_default();
            ArchivedSession { workout, exercises }
        })
        .collect())
}
