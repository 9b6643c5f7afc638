//! Versioned in-memory survey store
//!
//! Provides [`SurveyStore`], the local mirror of the persistence provider:
//! - Newest-first ordering, unique ids
//! - A version counter bumped by every mutation
//! - Snapshot reads only; the backing collection never escapes

use crate::error::StoreError;
use crate::lifecycle::{is_initial_status, validate_status_transition};
use crate::model::{Survey, SurveyId, SurveyStatus};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic mutation counter
///
/// Observers compare versions to detect that the store changed underneath
/// them; an old version never describes the current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreVersion(pub u64);

impl StoreVersion {
    /// Version of an empty, untouched store
    pub const INITIAL: StoreVersion = StoreVersion(0);

    #[inline]
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Items and version read together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Surveys, newest first
    pub items: Vec<Survey>,
    /// Version the items belong to
    pub version: StoreVersion,
}

#[derive(Debug, Default)]
struct StoreState {
    // Index 0 is the newest survey.
    items: IndexMap<SurveyId, Survey>,
    version: StoreVersion,
}

impl StoreState {
    fn bump(&mut self) -> StoreVersion {
        self.version = self.version.next();
        self.version
    }
}

/// Survey collection shared by page handlers and the sync service
#[derive(Debug, Default)]
pub struct SurveyStore {
    inner: RwLock<StoreState>,
}

impl SurveyStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front
    ///
    /// # Errors
    /// - [`StoreError::DuplicateId`] if the id is already present
    /// - [`StoreError::InvalidInitialStatus`] for a completed survey
    pub fn add(&self, survey: Survey) -> Result<StoreVersion, StoreError> {
        if !is_initial_status(survey.status) {
            return Err(StoreError::InvalidInitialStatus(survey.status));
        }

        let mut state = self.inner.write();
        if state.items.contains_key(&survey.id) {
            return Err(StoreError::DuplicateId(survey.id));
        }

        let id = survey.id.clone();
        state.items.shift_insert(0, id.clone(), survey);
        let version = state.bump();
        tracing::debug!(%id, %version, "survey added");
        Ok(version)
    }

    /// Remove by id; `false` when the id was not present
    pub fn remove(&self, id: &SurveyId) -> bool {
        let mut state = self.inner.write();
        if state.items.shift_remove(id).is_none() {
            return false;
        }
        let version = state.bump();
        tracing::debug!(%id, %version, "survey removed");
        true
    }

    /// Check that `survey` may replace the stored entry with the same id
    ///
    /// Returns `Ok(false)` when the id is missing. Staying in the same status
    /// is allowed here, unlike [`SurveyStore::set_status`].
    ///
    /// # Errors
    /// - [`StoreError::IllegalStatusTransition`] if the status would move backwards
    /// - [`StoreError::ResponsesDecreased`] if the response count would drop
    pub fn check_update(&self, survey: &Survey) -> Result<bool, StoreError> {
        let state = self.inner.read();
        match state.items.get(&survey.id) {
            Some(current) => check_replacement(current, survey).map(|()| true),
            None => Ok(false),
        }
    }

    /// Replace in place, keeping the ordering position
    ///
    /// The stored id and creation time are kept. Returns `false` when the id
    /// is missing or when the replacement would move the status backwards or
    /// lower the response count.
    pub fn update(&self, id: &SurveyId, mut survey: Survey) -> bool {
        let mut state = self.inner.write();
        let Some(current) = state.items.get_mut(id) else {
            return false;
        };

        if let Err(err) = check_replacement(current, &survey) {
            tracing::warn!(%id, error = %err, "update refused: lifecycle regression");
            return false;
        }

        survey.id = current.id.clone();
        survey.created_at = current.created_at;
        *current = survey;
        let version = state.bump();
        tracing::debug!(%id, %version, "survey updated");
        true
    }

    /// Move a survey forward in its lifecycle
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if the id is missing
    /// - [`StoreError::IllegalStatusTransition`] if `status` is not ahead of the current one
    pub fn set_status(&self, id: &SurveyId, status: SurveyStatus) -> Result<StoreVersion, StoreError> {
        let mut state = self.inner.write();
        let current = state
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        validate_status_transition(current.status, status)?;
        current.status = status;
        let version = state.bump();
        tracing::debug!(%id, ?status, %version, "survey status changed");
        Ok(version)
    }

    /// Add `count` collected responses
    ///
    /// A zero count leaves the version unchanged.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the id is missing
    pub fn record_responses(&self, id: &SurveyId, count: u64) -> Result<StoreVersion, StoreError> {
        let mut state = self.inner.write();
        let current = state
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if count == 0 {
            return Ok(state.version);
        }
        current.responses = current.responses.saturating_add(count);
        Ok(state.bump())
    }

    /// Replace the whole contents if nothing changed since `expected`
    ///
    /// Used to apply a provider listing that was requested at `expected`.
    /// Duplicate ids in `items` keep the first occurrence.
    ///
    /// # Errors
    /// Returns [`StoreError::StaleVersion`] if another mutation won the race
    pub fn replace_all_if(
        &self,
        expected: StoreVersion,
        items: Vec<Survey>,
    ) -> Result<StoreVersion, StoreError> {
        let mut state = self.inner.write();
        if state.version != expected {
            return Err(StoreError::StaleVersion {
                expected,
                actual: state.version,
            });
        }

        let mut replacement = IndexMap::with_capacity(items.len());
        for survey in items {
            if replacement.contains_key(&survey.id) {
                tracing::warn!(id = %survey.id, "duplicate id in listing dropped");
                continue;
            }
            replacement.insert(survey.id.clone(), survey);
        }
        state.items = replacement;
        let version = state.bump();
        tracing::debug!(%version, count = state.items.len(), "store contents replaced");
        Ok(version)
    }

    /// Lookup by id
    #[must_use]
    pub fn get(&self, id: &SurveyId) -> Option<Survey> {
        self.inner.read().items.get(id).cloned()
    }

    /// Whether a survey with this id exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SurveyId) -> bool {
        self.inner.read().items.contains_key(id)
    }

    /// All surveys, newest first
    #[must_use]
    pub fn all(&self) -> Vec<Survey> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Items and version under one read
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.read();
        StoreSnapshot {
            items: state.items.values().cloned().collect(),
            version: state.version,
        }
    }

    /// Current version
    #[inline]
    #[must_use]
    pub fn version(&self) -> StoreVersion {
        self.inner.read().version
    }

    /// Number of surveys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// Whether the store holds no surveys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }
}

fn check_replacement(current: &Survey, next: &Survey) -> Result<(), StoreError> {
    if next.status < current.status {
        return Err(StoreError::IllegalStatusTransition {
            from: current.status,
            to: next.status,
        });
    }
    if next.responses < current.responses {
        return Err(StoreError::ResponsesDecreased {
            id: current.id.clone(),
            from: current.responses,
            to: next.responses,
        });
    }
    Ok(())
}
