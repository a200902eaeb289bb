use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("referenced {entity} does not exist: {id}")]
    Reference { entity: &'static str, id: String },

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn reference(entity: &'static str, id: &str) -> Self {
        Self::Reference {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        // Explicit existence checks run before every write; these are the backstop.
        if let rusqlite::Error::SqliteFailure(ref code, ref msg) = err {
            let detail = msg.clone().unwrap_or_default();
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::Reference {
                        entity: "row",
                        id: detail,
                    };
                }
                ffi::SQLITE_CONSTRAINT_UNIQUE => return Self::Conflict(detail),
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}
