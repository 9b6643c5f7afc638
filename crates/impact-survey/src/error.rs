//! Error types for the survey store
//!
//! Missing ids on `remove`/`update` are not errors: repeated deletes are an
//! expected race, so those operations report a `bool` instead.

use crate::model::{SurveyId, SurveyStatus};
use crate::store::StoreVersion;

/// Store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Id already present (caller's id generation collided)
    #[error("duplicate survey id: {0}")]
    DuplicateId(SurveyId),

    /// Lifecycle helper addressed a survey that does not exist
    #[error("survey not found: {0}")]
    NotFound(SurveyId),

    /// Status would move backwards or stay in place
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalStatusTransition {
        /// Current status
        from: SurveyStatus,
        /// Requested status
        to: SurveyStatus,
    },

    /// Replacement would lower the collected response count
    #[error("response count of {id} would drop from {from} to {to}")]
    ResponsesDecreased {
        /// Survey being replaced
        id: SurveyId,
        /// Stored count
        from: u64,
        /// Count in the replacement
        to: u64,
    },

    /// Creation with a status other than draft or active
    #[error("surveys must be created as draft or active, got {0:?}")]
    InvalidInitialStatus(SurveyStatus),

    /// Conditional write lost against a newer mutation
    #[error("stale store version: expected {expected}, found {actual}")]
    StaleVersion {
        /// Version the caller read
        expected: StoreVersion,
        /// Version at write time
        actual: StoreVersion,
    },
}

impl StoreError {
    /// Whether the error points at a bug in the caller rather than a race
    #[inline]
    #[must_use]
    pub fn is_caller_bug(&self) -> bool {
        !matches!(self, Self::StaleVersion { .. })
    }
}

/// Failure reported by the persistence provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Network or service unavailable
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Provider refused the request
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Failures of [`crate::SurveySync`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Provider call failed; the local store was not touched
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Local store refused the mutation
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Backend(BackendError::Unavailable(_)) | Self::Store(StoreError::StaleVersion { .. })
        )
    }
}
