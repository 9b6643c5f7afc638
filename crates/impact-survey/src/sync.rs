//! Pairing of local store mutations with the persistence provider
//!
//! The provider is reached over the network and may fail or lag; the store
//! is only touched after the provider accepted the change. Listings are
//! applied with a version check so a slow response never overwrites newer
//! local state.

use crate::error::{BackendError, StoreError, SyncError};
use crate::model::{Survey, SurveyId};
use crate::store::{StoreVersion, SurveyStore};
use async_trait::async_trait;
use std::sync::Arc;

/// External survey persistence provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SurveyBackend: Send + Sync {
    /// Fetch every survey visible to the current session, newest first
    async fn list(&self) -> Result<Vec<Survey>, BackendError>;

    /// Persist a new survey
    async fn create(&self, survey: &Survey) -> Result<(), BackendError>;

    /// Persist changes to an existing survey
    async fn update(&self, survey: &Survey) -> Result<(), BackendError>;

    /// Delete a survey; deleting a missing survey succeeds
    async fn delete(&self, id: &SurveyId) -> Result<(), BackendError>;
}

/// Keeps a [`SurveyStore`] in step with a [`SurveyBackend`]
#[derive(Debug)]
pub struct SurveySync<B> {
    store: Arc<SurveyStore>,
    backend: B,
}

impl<B: SurveyBackend> SurveySync<B> {
    /// Create a sync service over a shared store
    #[must_use]
    pub fn new(store: Arc<SurveyStore>, backend: B) -> Self {
        Self { store, backend }
    }

    /// The shared store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<SurveyStore> {
        &self.store
    }

    /// Create remotely, then add locally
    ///
    /// # Errors
    /// - [`SyncError::Store`] with `DuplicateId` before any provider call
    /// - [`SyncError::Backend`] if the provider fails
    pub async fn create(&self, survey: Survey) -> Result<StoreVersion, SyncError> {
        if self.store.contains(&survey.id) {
            return Err(StoreError::DuplicateId(survey.id).into());
        }

        self.backend.create(&survey).await?;
        Ok(self.store.add(survey)?)
    }

    /// Update remotely, then replace locally
    ///
    /// Returns `false` without calling the provider when the id is not in
    /// the store.
    ///
    /// # Errors
    /// - [`SyncError::Store`] before any provider call if the replacement
    ///   would move the status backwards or lower the response count
    /// - [`SyncError::Backend`] if the provider fails
    pub async fn save(&self, survey: Survey) -> Result<bool, SyncError> {
        if !self.store.check_update(&survey)? {
            tracing::debug!(id = %survey.id, "save skipped: survey not in store");
            return Ok(false);
        }

        self.backend.update(&survey).await?;
        let id = survey.id.clone();
        Ok(self.store.update(&id, survey))
    }

    /// Delete remotely, then remove locally
    ///
    /// Returns whether a local entry was removed.
    ///
    /// # Errors
    /// Returns [`SyncError::Backend`] if the provider fails
    pub async fn delete(&self, id: &SurveyId) -> Result<bool, SyncError> {
        self.backend.delete(id).await?;
        Ok(self.store.remove(id))
    }

    /// Replace local contents with the provider's listing
    ///
    /// # Errors
    /// - [`SyncError::Backend`] if the provider fails
    /// - [`SyncError::Store`] with `StaleVersion` if the store changed while
    ///   the listing was in flight; the listing is discarded
    pub async fn refresh(&self) -> Result<StoreVersion, SyncError> {
        let seen = self.store.version();
        let items = self.backend.list().await?;

        match self.store.replace_all_if(seen, items) {
            Ok(version) => Ok(version),
            Err(err) => {
                tracing::info!(%seen, error = %err, "discarding stale survey listing");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SurveyStatus;
    use mockall::predicate::eq;

    fn survey(id: &str) -> Survey {
        Survey::new("Nutrition follow-up", "Green Bowl").with_id(id)
    }

    fn shared_store() -> Arc<SurveyStore> {
        Arc::new(SurveyStore::new())
    }

    #[tokio::test]
    async fn create_pairs_backend_and_store() {
        let mut backend = MockSurveyBackend::new();
        backend
            .expect_create()
            .withf(|s| s.id.as_str() == "s-1")
            .times(1)
            .returning(|_| Ok(()));

        let sync = SurveySync::new(shared_store(), backend);
        let version = sync.create(survey("s-1")).await.unwrap();

        assert_eq!(version, StoreVersion(1));
        assert!(sync.store().contains(&SurveyId::from("s-1")));
    }

    #[tokio::test]
    async fn create_duplicate_never_reaches_backend() {
        let mut backend = MockSurveyBackend::new();
        backend.expect_create().times(0);

        let store = shared_store();
        store.add(survey("s-1")).unwrap();
        let sync = SurveySync::new(store, backend);

        let err = sync.create(survey("s-1")).await.unwrap_err();
        assert_eq!(err, SyncError::Store(StoreError::DuplicateId(SurveyId::from("s-1"))));
    }

    #[tokio::test]
    async fn backend_failure_leaves_store_untouched() {
        let mut backend = MockSurveyBackend::new();
        backend
            .expect_create()
            .returning(|_| Err(BackendError::Unavailable("timeout".to_string())));

        let sync = SurveySync::new(shared_store(), backend);
        let err = sync.create(survey("s-1")).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(sync.store().is_empty());
        assert_eq!(sync.store().version(), StoreVersion::INITIAL);
    }

    #[tokio::test]
    async fn delete_pairs_backend_and_store() {
        let mut backend = MockSurveyBackend::new();
        backend
            .expect_delete()
            .with(eq(SurveyId::from("s-1")))
            .times(2)
            .returning(|_| Ok(()));

        let store = shared_store();
        store.add(survey("s-1")).unwrap();
        let sync = SurveySync::new(store, backend);

        assert!(sync.delete(&SurveyId::from("s-1")).await.unwrap());
        assert!(!sync.delete(&SurveyId::from("s-1")).await.unwrap());
    }

    #[tokio::test]
    async fn save_updates_local_copy() {
        let mut backend = MockSurveyBackend::new();
        backend.expect_update().times(1).returning(|_| Ok(()));

        let store = shared_store();
        store.add(survey("s-1")).unwrap();
        let sync = SurveySync::new(store, backend);

        let saved = sync
            .save(survey("s-1").with_status(SurveyStatus::Active))
            .await
            .unwrap();

        assert!(saved);
        let stored = sync.store().get(&SurveyId::from("s-1")).unwrap();
        assert_eq!(stored.status, SurveyStatus::Active);
    }

    #[tokio::test]
    async fn save_regression_never_reaches_backend() {
        let mut backend = MockSurveyBackend::new();
        backend.expect_update().times(0);

        let store = shared_store();
        store.add(survey("s-1")).unwrap();
        store.set_status(&SurveyId::from("s-1"), SurveyStatus::Completed).unwrap();
        let sync = SurveySync::new(store, backend);

        let err = sync.save(survey("s-1")).await.unwrap_err();

        assert_eq!(
            err,
            SyncError::Store(StoreError::IllegalStatusTransition {
                from: SurveyStatus::Completed,
                to: SurveyStatus::Draft
            })
        );
        assert!(!err.is_retryable());
        let stored = sync.store().get(&SurveyId::from("s-1")).unwrap();
        assert_eq!(stored.status, SurveyStatus::Completed);
    }

    #[tokio::test]
    async fn save_missing_never_reaches_backend() {
        let mut backend = MockSurveyBackend::new();
        backend.expect_update().times(0);

        let sync = SurveySync::new(shared_store(), backend);
        assert!(!sync.save(survey("ghost")).await.unwrap());
        assert_eq!(sync.store().version(), StoreVersion::INITIAL);
    }

    #[tokio::test]
    async fn refresh_applies_listing() {
        let mut backend = MockSurveyBackend::new();
        backend
            .expect_list()
            .returning(|| Ok(vec![survey("r-2"), survey("r-1")]));

        let sync = SurveySync::new(shared_store(), backend);
        let version = sync.refresh().await.unwrap();

        assert_eq!(version, StoreVersion(1));
        let ids: Vec<_> = sync.store().all().into_iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec!["r-2", "r-1"]);
    }

    #[tokio::test]
    async fn refresh_discards_listing_when_store_moved() {
        let store = shared_store();
        let racing = Arc::clone(&store);

        let mut backend = MockSurveyBackend::new();
        backend.expect_list().returning(move || {
            // A local mutation lands while the listing is in flight.
            racing.add(survey("local")).unwrap();
            Ok(vec![survey("remote")])
        });

        let sync = SurveySync::new(store, backend);
        let err = sync.refresh().await.unwrap_err();

        assert!(matches!(err, SyncError::Store(StoreError::StaleVersion { .. })));
        assert!(err.is_retryable());
        let ids: Vec<_> = sync.store().all().into_iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec!["local"]);
    }
}
