use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    #[error("an exercise with that name already exists")]
    DuplicateExerciseName,

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("score must be between 1 and 5, got {0}")]
    InvalidScore(i64),

    #[error("no workout session is in progress")]
    NoActiveSession,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(what: &'static str, id: i64) -> Self {
        Error::NotFound { what, id }
    }

    /// Maps a failed catalog write, turning the table's unique-constraint
    /// violation on the name column into [`Error::DuplicateExerciseName`].
    pub(crate) fn from_exercise_write(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::DuplicateExerciseName
            }
            other => Error::Database(other),
        }
    }
}
