//! Session module: the active-workout state machine and its on-disk
//! resume store.

mod logger;
mod store;

pub use logger::{ActiveWorkout, LoggedExercise, suggested_weight};
pub use store::SessionStore;

use log::info;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::db;
use crate::error::Result;

/// Owns the database pool and the in-progress workout, if any. The
/// active state is mirrored to the session store so a restarted process
/// resumes where it left off.
pub struct Session {
    pool: SqlitePool,
    store: SessionStore,
    pub(crate) active: Mutex<Option<ActiveWorkout>>,
}

impl Session {
    /// Opens the database, applies pending migrations and resumes any
    /// persisted in-progress session.
    pub async fn open(database_url: &str, store: SessionStore) -> Result<Self> {
        let pool = db::connect(database_url).await?;
        db::init_database(&pool).await?;

        let active = store.load_active();
        if let Some(resumed) = &active {
            info!(
                "Resumed in-progress session for workout '{}' ({} exercises)",
                resumed.workout.name,
                resumed.entries.len()
            );
        }

        Ok(Session {
            pool,
            store,
            active: Mutex::new(active),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
