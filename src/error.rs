//! Crate-level error taxonomy.
//!
//! Errors are classified by what the caller should do with them:
//! - InvalidInput: reject before any store access; never retried
//! - NotFound: the id/key doesn't exist — distinct from an empty result list
//! - Store: backend failure; the caller may offer a retry affordance

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum LeadError {
    /// Malformed caller input (bad bucket key, zero cap). Raised before any
    /// store query executes, so invalid UI state fails fast.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lead not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl LeadError {
    /// Whether retrying the same call could succeed. Invalid input and
    /// missing ids never benefit from a retry; store failures might.
    /// Retry/backoff policy itself belongs to the caller, not this crate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeadError::Store(_))
    }
}
