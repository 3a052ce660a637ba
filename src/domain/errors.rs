use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("Failed to acquire lock: {0}")]
    AcquireFailed(String),
    #[error("Failed to release lock: {0}")]
    ReleaseFailed(String),
    #[error("Job failed: {0}")]
    BodyFailed(String),
    #[error("Unknown lock name: {0}")]
    UnknownLock(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type LockResult<T> = Result<T, LockError>;

impl LockError {
    /// Tag a store error as having happened while acquiring.
    pub fn during_acquire(self) -> Self {
        match self {
            LockError::Store(msg) => LockError::AcquireFailed(msg),
            other => other,
        }
    }

    /// Tag a store error as having happened while releasing.
    pub fn during_release(self) -> Self {
        match self {
            LockError::Store(msg) => LockError::ReleaseFailed(msg),
            other => other,
        }
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for LockError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                LockError::Store(format!("Database error: {}", db_err.message()))
            }
            sqlx::Error::PoolTimedOut => {
                LockError::Store("Timed out waiting for a database connection".to_string())
            }
            other => LockError::Store(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for LockError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LockError::Store(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            LockError::Store(format!("Connection failed: {}", err))
        } else {
            LockError::Store(format!("Network error: {}", err))
        }
    }
}
