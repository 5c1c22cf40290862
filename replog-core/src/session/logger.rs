//! The template-to-archive transition: start a session from a template,
//! edit and persist individual entries, then finish with a score.

use serde::{Deserialize, Serialize};

use crate::db::models::{ArchivedWorkout, NewArchivedExercise, TemplateExercise, Workout};
use crate::db::operations::{
    finish_workout, get_workout, get_workout_exercises, update_workout_exercise,
};
use crate::error::{Error, Result};
use crate::session::Session;

/// Next-weight hint: previous weight plus 2.5kg, rounded to the nearest
/// 0.5 (ties away from zero). 47.3 becomes 50.0.
pub fn suggested_weight(previous_weight: f64) -> f64 {
    ((previous_weight + 2.5) * 2.0).round() / 2.0
}

/// One exercise being logged in the active session, seeded from the
/// template and hinted with the most recent archived weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedExercise {
    pub workout_exercise_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub previous_weight: Option<f64>,
    pub suggested_weight: Option<f64>,
    pub last_used_at: Option<i64>,
}

impl From<TemplateExercise> for LoggedExercise {
    fn from(t: TemplateExercise) -> Self {
        LoggedExercise {
            workout_exercise_id: t.id,
            exercise_id: t.exercise_id,
            exercise_name: t.exercise_name,
            sets: t.sets,
            reps: t.reps,
            weight: t.weight,
            previous_weight: t.previous_weight,
            suggested_weight: t.previous_weight.map(suggested_weight),
            last_used_at: t.last_used_at,
        }
    }
}

/// The in-progress session: the selected template and the current edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveWorkout {
    pub workout: Workout,
    pub entries: Vec<LoggedExercise>,
}

impl Session {
    /// Selects a template and starts logging against it, replacing any
    /// session already in progress.
    pub async fn start_workout(&self, workout_id: i64) -> Result<ActiveWorkout> {
        let workout = get_workout(self.pool(), workout_id).await?;
        let rows = get_workout_exercises(self.pool(), workout_id).await?;
        let active = ActiveWorkout {
            workout,
            entries: rows.into_iter().map(LoggedExercise::from).collect(),
        };

        self.store().save_active(&active)?;
        self.store().clear_saved()?;
        *self.active.lock().await = Some(active.clone());
        Ok(active)
    }

    pub async fn active_workout(&self) -> Option<ActiveWorkout> {
        self.active.lock().await.clone()
    }

    /// Edits one entry's numbers locally (mirrored to disk so navigation
    /// away and back resumes the edit) without touching the database.
    pub async fn update_entry(
        &self,
        workout_exercise_id: i64,
        sets: i64,
        reps: i64,
        weight: f64,
    ) -> Result<LoggedExercise> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(Error::NoActiveSession)?;
        let entry = active
            .entries
            .iter_mut()
            .find(|e| e.workout_exercise_id == workout_exercise_id)
            .ok_or(Error::not_found("workout exercise", workout_exercise_id))?;

        entry.sets = sets;
        entry.reps = reps;
        entry.weight = weight;
        let entry = entry.clone();

        self.store().save_active(active)?;
        self.store().unmark_saved(workout_exercise_id)?;
        Ok(entry)
    }

    /// Persists one entry's numbers to its template row, independent of
    /// the other entries, and gives it the "saved" checkmark.
    pub async fn save_entry(&self, workout_exercise_id: i64) -> Result<LoggedExercise> {
        let guard = self.active.lock().await;
        let active = guard.as_ref().ok_or(Error::NoActiveSession)?;
        let entry = active
            .entries
            .iter()
            .find(|e| e.workout_exercise_id == workout_exercise_id)
            .cloned()
            .ok_or(Error::not_found("workout exercise", workout_exercise_id))?;
        drop(guard);

        update_workout_exercise(
            self.pool(),
            entry.workout_exercise_id,
            entry.sets,
            entry.reps,
            entry.weight,
        )
        .await?;
        self.store().mark_saved(workout_exercise_id)?;
        Ok(entry)
    }

    /// Ids of entries saved during this session, for UI checkmarks only.
    pub fn saved_entry_ids(&self) -> std::collections::HashSet<i64> {
        self.store().saved_ids()
    }

    /// Archives the current session with a 1-5 satisfaction score and
    /// clears the in-progress state.
    pub async fn finish_workout(&self, score: i64) -> Result<ArchivedWorkout> {
        let mut guard = self.active.lock().await;
        let active = guard.as_ref().ok_or(Error::NoActiveSession)?;

        let exercises: Vec<NewArchivedExercise> = active
            .entries
            .iter()
            .map(|e| NewArchivedExercise {
                exercise_id: e.exercise_id,
                sets: e.sets,
                reps: e.reps,
                weight: e.weight,
            })
            .collect();

        let archived = finish_workout(
            self.pool(),
            Some(active.workout.id),
            &active.workout.name,
            &exercises,
            score,
        )
        .await?;

        *guard = None;
        self.store().clear_active()?;
        self.store().clear_saved()?;
        Ok(archived)
    }

    /// Abandons the current session without archiving anything.
    pub async fn discard_workout(&self) -> Result<()> {
        *self.active.lock().await = None;
        self.store().clear_active()?;
        self.store().clear_saved()?;
        Ok(())
    }
}
