use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    traits::{collaborators::CollaboratorError, StoreError},
};

/// Every way a marketplace operation can fail.
///
/// The validation failures (`InvalidTransition`, `Forbidden`, `MissingField`, `NotReviewable`, `InvalidInput`) are
/// always detected before anything is written. `Conflict` is retried inside the API where that is safe and only
/// escapes when a caller must re-validate; `AggregationFailed` is what a review submission reports once its retries
/// are exhausted. No variant implies a partially applied write.
#[derive(Debug, Clone, Error)]
pub enum MarketError {
    #[error("An order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("A required field is missing: {0}")]
    MissingField(&'static str),
    #[error("The order cannot be reviewed: {0}")]
    NotReviewable(String),
    #[error("The write lost a race with a concurrent modification: {0}")]
    Conflict(String),
    #[error("The rating could not be recorded after {attempts} attempts")]
    AggregationFailed { attempts: usize },
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl MarketError {
    /// True for validation failures, which are reported before any write is attempted.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            MarketError::InvalidTransition { .. } |
                MarketError::Forbidden(_) |
                MarketError::MissingField(_) |
                MarketError::NotReviewable(_) |
                MarketError::InvalidInput(_)
        )
    }
}

impl From<StoreError> for MarketError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DatabaseError(s) => MarketError::DatabaseError(s),
            StoreError::Conflict(s) => MarketError::Conflict(s),
            StoreError::Unavailable(s) => MarketError::Unavailable(s),
            StoreError::Rejected(s) => MarketError::PermissionDenied(s),
            StoreError::NotFound(s) => MarketError::NotFound(s),
            StoreError::NotReviewable(s) => MarketError::NotReviewable(s),
        }
    }
}

impl From<CollaboratorError> for MarketError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::Unavailable(..) => MarketError::Unavailable(e.to_string()),
            CollaboratorError::Rejected(..) => MarketError::InvalidInput(e.to_string()),
        }
    }
}
