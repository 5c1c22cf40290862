//! Dashboard aggregation: totals, per-day series and personal bests over
//! a date range of archived sessions.

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::db::models::ArchivedSession;
use crate::db::operations::{get_sessions_in_range, nearest_session_date_before};
use crate::error::Result;

/// Metric a personal best is measured under, keyed by exercise name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestMetric {
    WeightPerRep,
    MaxReps,
    MaxWeight,
}

impl BestMetric {
    pub fn for_exercise(name: &str) -> Self {
        match name {
            "Dumbbell Bench Press" => BestMetric::WeightPerRep,
            "Pull Ups" => BestMetric::MaxReps,
            // "Lat Pulldowns" and everything else track the heaviest weight.
            _ => BestMetric::MaxWeight,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            BestMetric::WeightPerRep => "kg/rep",
            BestMetric::MaxReps => "reps",
            BestMetric::MaxWeight => "kg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalBest {
    pub exercise_name: String,
    pub metric: BestMetric,
    pub value: f64,
    pub date: DateTime<Utc>,
}

/// One calendar-day bucket of the volume series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub volume: f64,
}

/// Highest weight seen for one exercise on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgressPoint {
    pub date: NaiveDate,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub max_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_workouts: i64,
    /// Sum of weight x sets x reps over every exercise, rounded to a whole
    /// number of kilograms.
    pub total_volume: f64,
    /// Average satisfaction score, one decimal.
    pub avg_score: f64,
    pub volume_by_day: Vec<DailyVolume>,
    pub exercise_progress: Vec<ExerciseProgressPoint>,
    pub personal_bests: Vec<PersonalBest>,
    /// Start actually used after the empty-range fallback widened it.
    pub effective_start: Option<DateTime<Utc>>,
}

impl DashboardStats {
    pub fn empty() -> Self {
        DashboardStats {
            total_workouts: 0,
            total_volume: 0.0,
            avg_score: 0.0,
            volume_by_day: Vec::new(),
            exercise_progress: Vec::new(),
            personal_bests: Vec::new(),
            effective_start: None,
        }
    }
}

/// Stats for `[start, end]`. An empty range falls back once to the most
/// recent archived workout dated at or before `end`: the widened range
/// necessarily contains that workout, so the fallback cannot loop. With
/// no history at all, zero totals come back.
pub async fn dashboard_stats(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DashboardStats> {
    let sessions = get_sessions_in_range(pool, start, end).await?;
    if !sessions.is_empty() {
        let mut stats = compute_stats(&sessions);
        stats.effective_start = Some(start);
        return Ok(stats);
    }

    match nearest_session_date_before(pool, end).await? {
        Some(nearest) => {
            debug!("No sessions in range, widening start to {}", nearest);
            let sessions = get_sessions_in_range(pool, nearest, end).await?;
            let mut stats = compute_stats(&sessions);
            stats.effective_start = Some(nearest);
            Ok(stats)
        }
        None => Ok(DashboardStats::empty()),
    }
}

/// Pure aggregation over sessions already ordered ascending by date.
pub fn compute_stats(sessions: &[ArchivedSession]) -> DashboardStats {
    let total_workouts = sessions.len() as i64;
    let total_volume: f64 = sessions.iter().map(ArchivedSession::volume).sum();
    let avg_score = if sessions.is_empty() {
        0.0
    } else {
        let sum: i64 = sessions.iter().map(|s| s.workout.score).sum();
        (sum as f64 / sessions.len() as f64 * 10.0).round() / 10.0
    };

    // Sessions sharing a calendar day share one bucket.
    let mut volume_days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for session in sessions {
        *volume_days.entry(session.workout.date.date_naive()).or_insert(0.0) +=
            session.volume();
    }

    // Per day, per exercise, the heaviest weight used.
    let mut progress_days: BTreeMap<NaiveDate, BTreeMap<i64, (String, f64)>> = BTreeMap::new();
    for session in sessions {
        let day = progress_days
            .entry(session.workout.date.date_naive())
            .or_default();
        for exercise in &session.exercises {
            day.entry(exercise.exercise_id)
                .and_modify(|(_, weight)| {
                    if exercise.weight > *weight {
                        *weight = exercise.weight;
                    }
                })
                .or_insert_with(|| (exercise.exercise_name.clone(), exercise.weight));
        }
    }

    let mut personal_bests: Vec<PersonalBest> = Vec::new();
    for session in sessions {
        for exercise in &session.exercises {
            let metric = BestMetric::for_exercise(&exercise.exercise_name);
            let value = match metric {
                BestMetric::WeightPerRep => {
                    if exercise.reps == 0 {
                        continue;
                    }
                    exercise.weight / exercise.reps as f64
                }
                BestMetric::MaxReps => exercise.reps as f64,
                BestMetric::MaxWeight => exercise.weight,
            };

            match personal_bests
                .iter_mut()
                .find(|best| best.exercise_name == exercise.exercise_name)
            {
                Some(best) => {
                    // A best only moves when a later value under the same
                    // metric strictly exceeds it.
                    if best.metric == metric && value > best.value {
                        best.value = value;
                        best.date = session.workout.date;
                    }
                }
                None => personal_bests.push(PersonalBest {
                    exercise_name: exercise.exercise_name.clone(),
                    metric,
                    value,
                    date: session.workout.date,
                }),
            }
        }
    }

    DashboardStats {
        total_workouts,
        total_volume: total_volume.round(),
        avg_score,
        volume_by_day: volume_days
            .into_iter()
            .map(|(date, volume)| DailyVolume { date, volume })
            .collect(),
        exercise_progress: progress_days
            .into_iter()
            .flat_map(|(date, exercises)| {
                exercises
                    .into_iter()
                    .map(move |(exercise_id, (exercise_name, max_weight))| {
                        ExerciseProgressPoint {
                            date,
                            exercise_id,
                            exercise_name,
                            max_weight,
                        }
                    })
            })
            .collect(),
        personal_bests,
        effective_start: None,
    }
}
