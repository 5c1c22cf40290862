//! On-disk persistence of the in-progress session, the explicit
//! serialize/deserialize boundary replacing the original app's implicit
//! local-storage mirroring. Two files live in the data directory: the
//! active workout (template plus current edits) and the set of entry ids
//! given a transient "saved" checkmark.

use log::warn;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::session::ActiveWorkout;

const ACTIVE_WORKOUT_FILE: &str = "active_workout.json";
const SAVED_EXERCISES_FILE: &str = "saved_exercises.json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SessionStore { dir: dir.into() }
    }

    /// `REPLOG_DATA_DIR` when set, otherwise `~/.replog`.
    pub fn default_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("REPLOG_DATA_DIR") {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .expect("Could not determine home directory")
            .join(".replog")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resumes a persisted session. A missing file means no session; a
    /// corrupt file is discarded rather than wedging every startup.
    pub fn load_active(&self) -> Option<ActiveWorkout> {
        let path = self.dir.join(ACTIVE_WORKOUT_FILE);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(active) => Some(active),
            Err(e) => {
                warn!("Discarding corrupt session file {}: {}", path.display(), e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    pub fn save_active(&self, active: &ActiveWorkout) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(active)?;
        fs::write(self.dir.join(ACTIVE_WORKOUT_FILE), contents)?;
        Ok(())
    }

    pub fn clear_active(&self) -> Result<()> {
        let path = self.dir.join(ACTIVE_WORKOUT_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn saved_ids(&self) -> HashSet<i64> {
        let path = self.dir.join(SAVED_EXERCISES_FILE);
        let Ok(contents) = fs::read_to_string(&path) else {
            return HashSet::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring corrupt saved-exercises file: {}", e);
            HashSet::new()
        })
    }

    pub fn mark_saved(&self, id: i64) -> Result<()> {
        let mut ids = self.saved_ids();
        ids.insert(id);
        self.write_saved(&ids)
    }

    pub fn unmark_saved(&self, id: i64) -> Result<()> {
        let mut ids = self.saved_ids();
        ids.remove(&id);
        self.write_saved(&ids)
    }

    pub fn clear_saved(&self) -> Result<()> {
        let path = self.dir.join(SAVED_EXERCISES_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn write_saved(&self, ids: &HashSet<i64>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string(ids)?;
        fs::write(self.dir.join(SAVED_EXERCISES_FILE), contents)?;
        Ok(())
    }
}
