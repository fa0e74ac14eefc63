use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use serde::Serialize;
use uuid::Uuid;

/// Closed set of engine outcomes surfaced to deal-submission callers.
///
/// Everything up to and including commit is all-or-nothing: any of these
/// errors before commit guarantees zero visible side effects. `Replenishment`
/// is the one post-commit channel — the deal it refers to stays committed.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("lot {0} not found for the requested product")]
    LotNotFound(Uuid),

    #[error("lot {lot_id} has only {available} available, {requested} requested")]
    InsufficientQuantity {
        lot_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("concurrent modification of lot {0}")]
    ConcurrencyConflict(Uuid),

    #[error("replenishment failed: {0}")]
    Replenishment(String),

    #[error("database error: {0}")]
    Database(
        #[from]
        #[serde(skip)]
        DbErr,
    ),
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::InvalidInput(err.to_string())
    }
}

impl EngineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }

    /// True for transient failures the coordinator retries with fresh reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ConcurrencyConflict(_))
    }

    /// True when the caller can fix the request and resubmit.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_)
                | EngineError::LotNotFound(_)
                | EngineError::InsufficientQuantity { .. }
        )
    }
}

/// Standard result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
