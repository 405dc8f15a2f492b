use thiserror::Error;

use crate::traits::{ConversationManagement, OrderManagement, ProfileManagement, ReviewManagement};

/// The full set of behaviour a storage backend offers the marketplace.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase:
    Clone + OrderManagement + ReviewManagement + ConversationManagement + ProfileManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Close all connections. Used by test harnesses before dropping a scratch database.
    async fn close(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("The write lost a race with a concurrent modification: {0}")]
    Conflict(String),
    #[error("The store is temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("The storage rules rejected the write: {0}")]
    Rejected(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Order {0} is not completed or has already been reviewed")]
    NotReviewable(String),
}

// SQLite primary and extended result codes
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_LOCKED_SHAREDCACHE: &str = "262";
const SQLITE_BUSY_RECOVERY: &str = "261";
const SQLITE_BUSY_SNAPSHOT: &str = "517";
const SQLITE_BUSY_TIMEOUT: &str = "773";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.to_string()).unwrap_or_default();
                match code.as_str() {
                    SQLITE_BUSY | SQLITE_LOCKED | SQLITE_LOCKED_SHAREDCACHE | SQLITE_BUSY_RECOVERY |
                    SQLITE_BUSY_SNAPSHOT | SQLITE_BUSY_TIMEOUT => StoreError::Conflict(db.message().to_string()),
                    _ if db.is_unique_violation() || db.is_check_violation() || db.is_foreign_key_violation() => {
                        StoreError::Rejected(db.message().to_string())
                    },
                    _ => StoreError::DatabaseError(e.to_string()),
                }
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed => {
                StoreError::Unavailable(e.to_string())
            },
            sqlx::Error::RowNotFound => StoreError::NotFound("The requested record".into()),
            _ => StoreError::DatabaseError(e.to_string()),
        }
    }
}
