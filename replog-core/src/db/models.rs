use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Master catalog row. `default_*` seed the numbers when the exercise is
/// added to a template.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub default_sets: i64,
    pub default_reps: i64,
    pub default_weight: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub default_sets: i64,
    pub default_reps: i64,
    pub default_weight: f64,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateExercise {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_sets: Option<i64>,
    pub default_reps: Option<i64>,
    pub default_weight: Option<f64>,
}

/// A reusable named list of exercises, not yet performed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Join row: belongs to exactly one parent, a template or an archive.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutExercise {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub archived_workout_id: Option<i64>,
    pub exercise_id: i64,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub order_index: i64,
    pub created_at: i64,
}

/// Template row joined with its exercise and the most recent archived
/// weight for the same exercise, used to seed the logger's hints.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub order_index: i64,
    pub previous_weight: Option<f64>,
    pub last_used_at: Option<i64>,
}

/// Snapshot of one completed session, immutable except for name/date
/// correction. `score` is a 1-5 satisfaction rating.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArchivedWorkout {
    pub id: i64,
    pub workout_template_id: Option<i64>,
    pub name: String,
    pub date: DateTime<Utc>,
    pub score: i64,
    pub created_at: i64,
}

/// The numbers actually performed for one exercise, as handed to
/// finish-workout when a session is archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArchivedExercise {
    pub exercise_id: i64,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
}

/// Archived join row with its exercise name attached.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArchivedExercise {
    pub id: i64,
    pub archived_workout_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub created_at: i64,
}

/// One archived workout with its children, as fetched for history views
/// and the dashboard aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedSession {
    pub workout: ArchivedWorkout,
    pub exercises: Vec<ArchivedExercise>,
}

impl ArchivedSession {
    /// Total weight moved in this session: sum of weight x sets x reps.
    pub fn volume(&self) -> f64 {
        self.exercises
            .iter()
            .map(|e| e.weight * e.sets as f64 * e.reps as f64)
            .sum()
    }
}

impl fmt::Display for ArchivedExercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} x {} @ {:.1}kg",
            self.exercise_name, self.sets, self.reps, self.weight
        )
    }
}
