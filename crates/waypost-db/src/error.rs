use thiserror::Error;

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Store errors. The domain violations (`DuplicateUsername`,
/// `AlreadyAssigned`, `NotFound`) are caller-inspectable; everything else
/// surfaces as a store failure.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("link already assigned to user")]
    AlreadyAssigned,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("connection lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// True for the SQLITE_CONSTRAINT family (UNIQUE, FK, ...).
    pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
