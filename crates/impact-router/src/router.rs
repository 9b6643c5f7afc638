//! Router: page ↔ URL translation bound to a [`History`]
//!
//! The router never caches the current page; every read derives it from the
//! live location so that external history changes are always visible.

use crate::history::{History, ListenerId};
use crate::routes::{canonical_path, page_to_url, resolve_page};
use crate::titles::TitleTable;
use impact_access::PageId;
use std::sync::Arc;

/// Bidirectional page/URL mapper driving the platform history
#[derive(Clone)]
pub struct Router {
    history: Arc<dyn History>,
    titles: TitleTable,
    landing: PageId,
}

impl Router {
    /// Router over `history` with default titles and `landing` fallback
    #[must_use]
    pub fn new(history: Arc<dyn History>) -> Self {
        Self {
            history,
            titles: TitleTable::default(),
            landing: PageId::Landing,
        }
    }

    /// With a title table
    #[must_use]
    pub fn with_titles(mut self, titles: TitleTable) -> Self {
        self.titles = titles;
        self
    }

    /// With the page unmapped paths degrade to
    #[must_use]
    pub fn with_landing(mut self, landing: PageId) -> Self {
        self.landing = landing;
        self
    }

    /// Canonical path of a page
    #[inline]
    #[must_use]
    pub fn page_to_url(&self, page: PageId) -> &'static str {
        page_to_url(page)
    }

    /// Page of a path; unmapped paths give the landing page
    #[inline]
    #[must_use]
    pub fn url_to_page(&self, path: &str) -> PageId {
        resolve_page(path, self.landing)
    }

    /// Document title of a page
    #[inline]
    #[must_use]
    pub fn title_for(&self, page: PageId) -> String {
        self.titles.title_for(page)
    }

    /// Fallback page for unmapped paths
    #[inline]
    #[must_use]
    pub fn landing(&self) -> PageId {
        self.landing
    }

    /// Push an entry for `page` unless the location already shows it
    ///
    /// Returns whether an entry was pushed.
    pub fn navigate(&self, page: PageId) -> bool {
        let target = page_to_url(page);
        if self.current_path() == target {
            return false;
        }
        self.history.push(target, &self.titles.title_for(page));
        tracing::trace!(%page, path = target, "history entry pushed");
        true
    }

    /// Overwrite the current entry with `page`
    ///
    /// For corrective redirects that must not be revisitable with back.
    pub fn replace(&self, page: PageId) {
        let target = page_to_url(page);
        self.history.replace(target, &self.titles.title_for(page));
        tracing::trace!(%page, path = target, "history entry replaced");
    }

    /// Page of the live location
    #[must_use]
    pub fn current_page(&self) -> PageId {
        self.url_to_page(&self.history.location())
    }

    /// Canonical path of the live location
    #[must_use]
    pub fn current_path(&self) -> String {
        canonical_path(&self.history.location()).to_string()
    }

    /// Register a back/forward handler receiving the derived page
    ///
    /// The handler stays registered until the returned subscription is
    /// released or dropped.
    pub fn on_pop_state<F>(&self, callback: F) -> PopStateSubscription
    where
        F: Fn(PageId) + Send + Sync + 'static,
    {
        let landing = self.landing;
        let id = self
            .history
            .subscribe(Arc::new(move |path: &str| callback(resolve_page(path, landing))));
        PopStateSubscription {
            history: Arc::clone(&self.history),
            id: Some(id),
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("location", &self.history.location())
            .field("titles", &self.titles)
            .field("landing", &self.landing)
            .finish()
    }
}

/// Registration of a pop-state handler
///
/// Deregisters exactly once, on [`PopStateSubscription::release`] or drop.
#[must_use = "dropping the subscription deregisters the handler"]
pub struct PopStateSubscription {
    history: Arc<dyn History>,
    id: Option<ListenerId>,
}

impl PopStateSubscription {
    /// Deregister now
    pub fn release(mut self) {
        self.deregister();
    }

    /// Whether the handler is still registered
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    fn deregister(&mut self) {
        if let Some(id) = self.id.take() {
            self.history.unsubscribe(id);
        }
    }
}

impl Drop for PopStateSubscription {
    fn drop(&mut self) {
        self.deregister();
    }
}

impl std::fmt::Debug for PopStateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopStateSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn setup(initial: &str) -> (Arc<MemoryHistory>, Router) {
        let history = Arc::new(MemoryHistory::new(initial));
        let router = Router::new(history.clone()).with_titles(TitleTable::new("Impact"));
        (history, router)
    }

    #[test]
    fn navigate_pushes_with_title() {
        let (history, router) = setup("/");
        assert!(router.navigate(PageId::Surveys));

        assert_eq!(history.len(), 2);
        assert_eq!(history.location(), "/surveys");
        assert_eq!(history.current_title(), "Surveys | Impact");
    }

    #[test]
    fn navigate_twice_pushes_once() {
        let (history, router) = setup("/");
        assert!(router.navigate(PageId::Dashboard));
        assert!(!router.navigate(PageId::Dashboard));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn navigate_ignores_query_on_current_location() {
        let (history, router) = setup("/surveys?page=3");
        assert!(!router.navigate(PageId::Surveys));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn replace_does_not_grow_history() {
        let (history, router) = setup("/login");
        router.replace(PageId::Dashboard);

        assert_eq!(history.len(), 1);
        assert_eq!(router.current_page(), PageId::Dashboard);
    }

    #[test]
    fn current_page_tracks_external_changes() {
        let (history, router) = setup("/");
        router.navigate(PageId::Profile);
        history.back();
        assert_eq!(router.current_page(), PageId::Landing);

        history.visit_external("/admin/users?sort=name");
        assert_eq!(router.current_page(), PageId::Users);

        history.visit_external("/no/such/page");
        assert_eq!(router.current_page(), PageId::Landing);
    }

    #[test]
    fn pop_state_delivers_derived_page() {
        let (history, router) = setup("/");
        router.navigate(PageId::Surveys);
        router.navigate(PageId::SurveyView);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = router.on_pop_state(move |page| sink.lock().push(page));

        history.back();
        history.back();
        history.forward();

        assert_eq!(
            *seen.lock(),
            vec![PageId::Surveys, PageId::Landing, PageId::Surveys]
        );
        drop(subscription);
    }

    #[test]
    fn subscription_releases_exactly_once() {
        let (history, router) = setup("/");
        let subscription = router.on_pop_state(|_| {});
        assert!(subscription.is_active());
        assert_eq!(history.listener_count(), 1);

        subscription.release();
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let (history, router) = setup("/");
        router.navigate(PageId::Profile);

        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        {
            let _subscription = router.on_pop_state(move |_| *sink.lock() += 1);
        }

        history.back();
        assert_eq!(*seen.lock(), 0);
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn custom_landing_fallback() {
        let (_history, router) = setup("/");
        let router = router.with_landing(PageId::Login);
        assert_eq!(router.url_to_page("/unknown"), PageId::Login);
    }

    proptest! {
        #[test]
        fn prop_navigate_is_idempotent(page in prop::sample::select(PageId::ALL.to_vec())) {
            let (history, router) = setup("/start");
            router.navigate(page);
            let len = history.len();
            router.navigate(page);
            prop_assert_eq!(history.len(), len);
            prop_assert_eq!(router.current_page(), page);
        }
    }
}
