//! Navigation engine
//!
//! Owns the current page and keeps it in lockstep with the router's URL.
//! Every way of changing pages goes through one of four transitions:
//!
//! - [`NavigationEngine::request_navigate`]: user-initiated navigation
//! - [`NavigationEngine::handle_pop_state`]: back/forward and address bar
//! - [`NavigationEngine::session_changed`]: sign-in and sign-out
//! - [`NavigationEngine::survey_removed`]: the displayed survey was deleted
//!
//! Each transition validates against the [`RoleMatrix`] and updates page and
//! URL inside one `&mut self` call. Behind [`SharedEngine`] readers observe
//! either the state before a transition or after it, never a mix.

use crate::auth::{AuthProvider, SessionSubscription};
use crate::config::{builtin_default_page, NavConfig};
use crate::error::{ConfigError, FlowError};
use crate::flow::{FlowAction, SubscriptionFlow};
use crate::outcome::{DenialReason, NavigationOutcome, NavigationState, RedirectReason};
use impact_access::{PageId, Role, RoleMatrix, Session};
use impact_router::{History, PopStateSubscription, Router};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Engine shared between the host and platform callbacks
pub type SharedEngine = Arc<Mutex<NavigationEngine>>;

/// Pages reachable without a session
const PUBLIC_PAGES: [PageId; 3] = [PageId::Landing, PageId::Login, PageId::OrgRegistration];

/// Role-gated page state machine
#[derive(Debug)]
pub struct NavigationEngine {
    matrix: RoleMatrix,
    router: Router,
    default_pages: BTreeMap<Role, PageId>,
    session: Option<Session>,
    current_page: PageId,
    flow: SubscriptionFlow,
}

impl NavigationEngine {
    /// Build the engine over `history`, without a session
    ///
    /// The initial page is derived from the current location. Protected
    /// locations are replaced with the login page and non-canonical ones with
    /// their canonical path.
    ///
    /// # Errors
    /// - [`ConfigError::Name`]: unknown role or page in the configuration
    /// - [`ConfigError::Matrix`]: strict mode and an incomplete matrix
    /// - [`ConfigError::DefaultPageNotAllowed`]: a role cannot view its default page
    /// - [`ConfigError::LandingNotPublic`]: the landing page requires a session
    pub fn new(config: &NavConfig, history: Arc<dyn History>) -> Result<Self, ConfigError> {
        if !config.landing.is_public() {
            return Err(ConfigError::LandingNotPublic(config.landing));
        }
        let matrix = config.role_matrix()?;
        let default_pages = config.default_pages()?;
        for (role, page) in &default_pages {
            if !matrix.is_allowed(*page, *role) {
                return Err(ConfigError::DefaultPageNotAllowed {
                    role: *role,
                    page: *page,
                });
            }
        }

        let router = Router::new(history)
            .with_titles(config.title_table()?)
            .with_landing(config.landing);

        let location_page = router.current_page();
        let initial = if location_page.is_public() {
            location_page
        } else {
            PageId::Login
        };
        if router.current_path() != router.page_to_url(initial) {
            router.replace(initial);
        }
        tracing::debug!(page = %initial, "navigation engine ready");

        Ok(Self {
            matrix,
            router,
            default_pages,
            session: None,
            current_page: initial,
            flow: SubscriptionFlow::new(),
        })
    }

    /// Wrap for sharing with platform callbacks
    #[must_use]
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Route back/forward notifications into `shared`
    ///
    /// The handler holds only a weak reference; it does nothing once the
    /// engine is gone.
    pub fn attach(shared: &SharedEngine) -> PopStateSubscription {
        let router = shared.lock().router.clone();
        let engine = Arc::downgrade(shared);
        router.on_pop_state(move |page| {
            if let Some(engine) = engine.upgrade() {
                let outcome = engine.lock().handle_pop_state(page);
                tracing::trace!(?outcome, "pop-state handled");
            }
        })
    }

    /// Sync `shared` with the provider's current session, then follow changes
    pub fn bind_auth(shared: &SharedEngine, provider: &dyn AuthProvider) -> SessionSubscription {
        let outcome = shared.lock().session_changed(provider.current_session());
        tracing::trace!(?outcome, "initial session applied");

        let engine = Arc::downgrade(shared);
        provider.on_session_change(Arc::new(move |session: Option<Session>| {
            if let Some(engine) = engine.upgrade() {
                let outcome = engine.lock().session_changed(session);
                tracing::trace!(?outcome, "session change handled");
            }
        }))
    }

    /// Ask to show `target`
    ///
    /// Without a session only public pages are committed; anything else is
    /// redirected to the login page. With a session the role must be
    /// allowed on `target`; otherwise the request is denied and neither
    /// page nor URL change.
    pub fn request_navigate(&mut self, target: PageId) -> NavigationOutcome {
        let Some(role) = self.role() else {
            if PUBLIC_PAGES.contains(&target) {
                return self.commit(target);
            }
            tracing::info!(%target, "unauthenticated request redirected to login");
            return self.redirect_push(target, PageId::Login, RedirectReason::Unauthenticated);
        };

        if let Some(reason) = self.denial(target, role) {
            return NavigationOutcome::Denied {
                requested: target,
                reason,
            };
        }

        if let Some(step) = self.flow.first_incomplete_step(target) {
            if !self.matrix.is_allowed(step, role) {
                tracing::warn!(%target, %step, %role, "flow step not permitted");
                return NavigationOutcome::Denied {
                    requested: target,
                    reason: DenialReason::RoleNotPermitted(role),
                };
            }
            tracing::info!(%target, %step, "subscription flow incomplete");
            return self.redirect_push(target, step, RedirectReason::FlowIncomplete);
        }

        self.commit(target)
    }

    /// React to a location change the engine did not make
    ///
    /// The platform has already moved, so a disallowed page cannot be
    /// refused; it is replaced with the login page (no session) or the
    /// role's default page.
    pub fn handle_pop_state(&mut self, page: PageId) -> NavigationOutcome {
        let from = self.current_page;
        let correction = match self.role() {
            None if PUBLIC_PAGES.contains(&page) => None,
            None => Some((PageId::Login, RedirectReason::Unauthenticated)),
            Some(role) if self.denial(page, role).is_some() => {
                Some((self.default_page(role), RedirectReason::PopStateDenied))
            }
            Some(_) => self
                .flow
                .first_incomplete_step(page)
                .map(|step| (step, RedirectReason::FlowIncomplete)),
        };

        if let Some((to, reason)) = correction {
            tracing::info!(requested = %page, %to, ?reason, "pop-state corrected");
            self.router.replace(to);
            self.current_page = to;
            return NavigationOutcome::Redirected {
                requested: page,
                to,
                reason,
            };
        }

        if self.router.current_path() != self.router.page_to_url(page) {
            self.router.replace(page);
        }
        self.enter(from, page);
        if from == page {
            NavigationOutcome::Unchanged(page)
        } else {
            tracing::debug!(%from, to = %page, "pop-state committed");
            NavigationOutcome::Committed { from, to: page }
        }
    }

    /// Apply a sign-in, sign-out or session switch
    pub fn session_changed(&mut self, session: Option<Session>) -> NavigationOutcome {
        let from = self.current_page;
        match (self.session.take(), session) {
            (None, None) => NavigationOutcome::Unchanged(from),
            (Some(previous), None) => {
                tracing::info!(role = %previous.role, "session ended");
                self.flow.reset();
                if matches!(from, PageId::Landing | PageId::OrgRegistration) {
                    return NavigationOutcome::Unchanged(from);
                }
                self.redirect_push(from, PageId::Landing, RedirectReason::SessionEnded)
            }
            (previous, Some(session)) => {
                if previous.as_ref() == Some(&session) {
                    self.session = Some(session);
                    return NavigationOutcome::Unchanged(from);
                }
                if previous.is_some() {
                    self.flow.reset();
                }
                let role = session.role;
                tracing::info!(%role, user = %session.display_name, "session started");
                self.session = Some(session);

                if from == PageId::Login || !self.matrix.is_allowed(from, role) {
                    return self.redirect_replace(
                        from,
                        self.default_page(role),
                        RedirectReason::SessionStarted,
                    );
                }
                if let Some(step) = self.flow.first_incomplete_step(from) {
                    return self.redirect_replace(from, step, RedirectReason::FlowIncomplete);
                }
                NavigationOutcome::Unchanged(from)
            }
        }
    }

    /// Leave a survey detail page whose survey was just deleted
    ///
    /// Goes to the survey list, or the role's default page when the list is
    /// not viewable. A no-op on any other page.
    pub fn survey_removed(&mut self) -> NavigationOutcome {
        let from = self.current_page;
        let on_detail = matches!(
            from,
            PageId::SurveyView | PageId::SurveyResults | PageId::SurveyShare
        );
        let Some(role) = self.role().filter(|_| on_detail) else {
            return NavigationOutcome::Unchanged(from);
        };

        let to = if self.matrix.is_allowed(PageId::Surveys, role) {
            PageId::Surveys
        } else {
            self.default_page(role)
        };
        self.redirect_replace(from, to, RedirectReason::SurveyRemoved)
    }

    /// Apply a subscription flow action
    ///
    /// # Errors
    /// See [`SubscriptionFlow::reduce`]
    pub fn dispatch_flow(&mut self, action: FlowAction) -> Result<(), FlowError> {
        let page = self.current_page;
        self.flow.apply(action).map_err(|err| {
            tracing::warn!(error = %err, %page, "flow action rejected");
            err
        })
    }

    /// Page and URL path, read together
    #[must_use]
    pub fn state(&self) -> NavigationState {
        NavigationState {
            current_page: self.current_page,
            url_path: self.router.current_path(),
        }
    }

    /// Current page
    #[inline]
    #[must_use]
    pub fn current_page(&self) -> PageId {
        self.current_page
    }

    /// Canonical path of the live location
    #[must_use]
    pub fn url_path(&self) -> String {
        self.router.current_path()
    }

    /// Current session
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Subscription flow state
    #[inline]
    #[must_use]
    pub fn flow(&self) -> &SubscriptionFlow {
        &self.flow
    }

    /// Permission matrix
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &RoleMatrix {
        &self.matrix
    }

    /// Router
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Pages the current user may request, for menus
    #[must_use]
    pub fn allowed_pages(&self) -> Vec<PageId> {
        match self.role() {
            Some(role) => self.matrix.allowed_pages(role),
            None => PUBLIC_PAGES.to_vec(),
        }
    }

    /// Post-login page of `role`
    #[must_use]
    pub fn default_page(&self, role: Role) -> PageId {
        self.default_pages
            .get(&role)
            .copied()
            .unwrap_or_else(|| builtin_default_page(role))
    }

    fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|s| s.role)
    }

    fn denial(&self, target: PageId, role: Role) -> Option<DenialReason> {
        if !target.is_public() && self.matrix.is_unreachable(target) {
            tracing::error!(%target, "request for page no role may view");
            return Some(DenialReason::Unreachable);
        }
        if !self.matrix.is_allowed(target, role) {
            tracing::warn!(%target, %role, "navigation denied");
            return Some(DenialReason::RoleNotPermitted(role));
        }
        None
    }

    fn enter(&mut self, from: PageId, to: PageId) {
        if from == PageId::PaymentDetails && to == PageId::PaymentMethod {
            self.flow.return_to_method();
        }
        self.current_page = to;
    }

    fn commit(&mut self, target: PageId) -> NavigationOutcome {
        let from = self.current_page;
        self.router.navigate(target);
        if from == target {
            return NavigationOutcome::Unchanged(target);
        }
        self.enter(from, target);
        tracing::debug!(%from, to = %target, "navigation committed");
        NavigationOutcome::Committed { from, to: target }
    }

    fn redirect_push(
        &mut self,
        requested: PageId,
        to: PageId,
        reason: RedirectReason,
    ) -> NavigationOutcome {
        self.router.navigate(to);
        self.current_page = to;
        NavigationOutcome::Redirected {
            requested,
            to,
            reason,
        }
    }

    fn redirect_replace(
        &mut self,
        requested: PageId,
        to: PageId,
        reason: RedirectReason,
    ) -> NavigationOutcome {
        tracing::info!(%requested, %to, ?reason, "redirected");
        self.router.replace(to);
        self.current_page = to;
        NavigationOutcome::Redirected {
            requested,
            to,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Package, PaymentMethod, PaymentPayload};
    use impact_router::MemoryHistory;
    use pretty_assertions::assert_eq;

    fn engine_at(path: &str) -> (Arc<MemoryHistory>, NavigationEngine) {
        let history = Arc::new(MemoryHistory::new(path));
        let engine = NavigationEngine::new(&NavConfig::default(), history.clone()).unwrap();
        (history, engine)
    }

    fn signed_in(role: Role) -> (Arc<MemoryHistory>, NavigationEngine) {
        let (history, mut engine) = engine_at("/login");
        let _ = engine.session_changed(Some(Session::new(role, "Test")));
        (history, engine)
    }

    fn payload() -> PaymentPayload {
        PaymentPayload {
            holder: "Ada".to_string(),
            reference: "**** 1111".to_string(),
            amount_cents: 4_900,
        }
    }

    #[test]
    fn protected_start_location_becomes_login() {
        let (history, engine) = engine_at("/admin/users");
        assert_eq!(engine.current_page(), PageId::Login);
        assert_eq!(history.location(), "/login");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn unmapped_start_location_is_canonicalized() {
        let (history, engine) = engine_at("/nowhere");
        assert_eq!(engine.current_page(), PageId::Landing);
        assert_eq!(history.location(), "/");
    }

    #[test]
    fn default_page_must_be_allowed() {
        let config = NavConfig::new().with_default_page(Role::Beneficiary, PageId::Reports);
        let err = NavigationEngine::new(&config, Arc::new(MemoryHistory::default())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DefaultPageNotAllowed {
                role: Role::Beneficiary,
                page: PageId::Reports
            }
        ));
    }

    #[test]
    fn landing_must_be_public() {
        let config = NavConfig::new().with_landing(PageId::Reports);
        let history = Arc::new(MemoryHistory::new("/nowhere"));
        let err = NavigationEngine::new(&config, history.clone()).unwrap_err();

        assert!(matches!(err, ConfigError::LandingNotPublic(PageId::Reports)));
        assert_eq!(history.location(), "/nowhere");

        let config = NavConfig::new().with_landing(PageId::OrgRegistration);
        let engine = NavigationEngine::new(&config, history.clone()).unwrap();
        assert_eq!(engine.current_page(), PageId::OrgRegistration);
        assert_eq!(history.location(), "/register");
    }

    #[test]
    fn unauthenticated_public_pages_commit() {
        let (_history, mut engine) = engine_at("/");
        let outcome = engine.request_navigate(PageId::OrgRegistration);
        assert!(outcome.is_committed());
        assert_eq!(engine.url_path(), "/register");
    }

    #[test]
    fn login_replaces_login_entry() {
        let (history, engine) = signed_in(Role::Admin);
        assert_eq!(engine.current_page(), PageId::Dashboard);
        assert_eq!(history.len(), 1);
        assert_eq!(history.location(), "/dashboard");
    }

    #[test]
    fn beneficiary_lands_on_enhanced_survey() {
        let (_history, engine) = signed_in(Role::Beneficiary);
        assert_eq!(engine.current_page(), PageId::EnhancedSurvey);
        assert_eq!(engine.url_path(), "/survey");
    }

    #[test]
    fn login_on_allowed_page_stays() {
        let (_history, mut engine) = engine_at("/");
        let outcome = engine.session_changed(Some(Session::new(Role::OrgManager, "Zola")));
        assert_eq!(outcome, NavigationOutcome::Unchanged(PageId::Landing));
    }

    #[test]
    fn unreachable_page_is_distinct_denial() {
        let config = NavConfig::new()
            .with_page_roles(PageId::AuditLog, [])
            .with_strict_matrix(false);
        let history = Arc::new(MemoryHistory::new("/login"));
        let mut engine = NavigationEngine::new(&config, history).unwrap();
        let _ = engine.session_changed(Some(Session::new(Role::SuperAdmin, "Root")));

        let outcome = engine.request_navigate(PageId::AuditLog);
        assert_eq!(
            outcome,
            NavigationOutcome::Denied {
                requested: PageId::AuditLog,
                reason: DenialReason::Unreachable
            }
        );
    }

    #[test]
    fn signed_in_user_cannot_request_login() {
        let (_history, mut engine) = signed_in(Role::Admin);
        let outcome = engine.request_navigate(PageId::Login);
        assert_eq!(
            outcome,
            NavigationOutcome::Denied {
                requested: PageId::Login,
                reason: DenialReason::RoleNotPermitted(Role::Admin)
            }
        );
    }

    #[test]
    fn flow_pages_redirect_to_first_gap() {
        let (_history, mut engine) = signed_in(Role::OrgManager);

        let outcome = engine.request_navigate(PageId::PaymentDetails);
        assert_eq!(
            outcome,
            NavigationOutcome::Redirected {
                requested: PageId::PaymentDetails,
                to: PageId::Subscription,
                reason: RedirectReason::FlowIncomplete
            }
        );

        engine
            .dispatch_flow(FlowAction::SelectPackage(Package::new("pro", "Pro", 4_900)))
            .unwrap();
        let outcome = engine.request_navigate(PageId::SubscriptionConfirmation);
        assert_eq!(outcome.destination(), Some(PageId::PaymentMethod));
    }

    #[test]
    fn details_back_to_method_drops_payment_only() {
        let (_history, mut engine) = signed_in(Role::Admin);
        engine
            .dispatch_flow(FlowAction::SelectPackage(Package::new("basic", "Basic", 1_900)))
            .unwrap();
        engine
            .dispatch_flow(FlowAction::SelectMethod(PaymentMethod::Card))
            .unwrap();
        assert!(engine.request_navigate(PageId::PaymentDetails).is_committed());
        engine.dispatch_flow(FlowAction::SubmitPayment(payload())).unwrap();

        assert!(engine.request_navigate(PageId::PaymentMethod).is_committed());
        assert_eq!(engine.flow().selected_method(), Some(PaymentMethod::Card));
        assert!(engine.flow().selected_package().is_some());
        assert_eq!(engine.flow().payment_data(), None);
    }

    #[test]
    fn logout_resets_flow_and_goes_to_landing() {
        let (history, mut engine) = signed_in(Role::Admin);
        engine
            .dispatch_flow(FlowAction::SelectPackage(Package::new("basic", "Basic", 1_900)))
            .unwrap();
        let _ = engine.request_navigate(PageId::Surveys);

        let outcome = engine.session_changed(None);
        assert_eq!(outcome.destination(), Some(PageId::Landing));
        assert!(engine.flow().is_empty());
        assert_eq!(history.location(), "/");
        assert_eq!(engine.session(), None);
    }

    #[test]
    fn logout_on_landing_stays() {
        let (_history, mut engine) = engine_at("/register");
        let _ = engine.session_changed(Some(Session::new(Role::Admin, "Ada")));
        let _ = engine.request_navigate(PageId::Landing);
        let outcome = engine.session_changed(None);
        assert_eq!(outcome, NavigationOutcome::Unchanged(PageId::Landing));
    }

    #[test]
    fn flow_action_out_of_order_is_rejected() {
        let (_history, mut engine) = signed_in(Role::Admin);
        let err = engine
            .dispatch_flow(FlowAction::SubmitPayment(payload()))
            .unwrap_err();
        assert_eq!(err, FlowError::MethodNotSelected);
    }

    #[test]
    fn survey_removed_returns_to_list() {
        let (history, mut engine) = signed_in(Role::OrgManager);
        let _ = engine.request_navigate(PageId::Surveys);
        let _ = engine.request_navigate(PageId::SurveyResults);
        let len = history.len();

        let outcome = engine.survey_removed();
        assert_eq!(outcome.destination(), Some(PageId::Surveys));
        assert_eq!(history.len(), len);
        assert_eq!(engine.url_path(), "/surveys");
    }

    #[test]
    fn survey_removed_for_beneficiary_goes_home() {
        let (_history, mut engine) = signed_in(Role::Beneficiary);
        let _ = engine.request_navigate(PageId::SurveyView);
        let outcome = engine.survey_removed();
        assert_eq!(outcome.destination(), Some(PageId::EnhancedSurvey));
    }

    #[test]
    fn survey_removed_elsewhere_is_noop() {
        let (_history, mut engine) = signed_in(Role::Admin);
        assert_eq!(
            engine.survey_removed(),
            NavigationOutcome::Unchanged(PageId::Dashboard)
        );
    }

    #[test]
    fn allowed_pages_follow_session() {
        let (_history, mut engine) = engine_at("/");
        assert_eq!(engine.allowed_pages(), PUBLIC_PAGES.to_vec());

        let _ = engine.session_changed(Some(Session::new(Role::Beneficiary, "Kofi")));
        assert_eq!(
            engine.allowed_pages(),
            vec![
                PageId::Landing,
                PageId::EnhancedSurvey,
                PageId::SurveyView,
                PageId::Profile
            ]
        );
    }
}
