//! Invariants checked after every simulated operation

use impact_access::PageId;
use impact_nav::NavigationEngine;
use impact_router::page_to_url;
use impact_survey::{StoreVersion, SurveyStore};
use serde::Serialize;
use std::collections::BTreeSet;

/// Types of invariant checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCheck {
    /// Location matches the current page's URL
    UrlIsCanonicalForCurrentPage,
    /// Current page is visible to the signed-in role, or public
    CurrentPageIsViewable,
    /// No duplicate survey ids
    SurveyIdsAreUnique,
    /// Store version never decreases
    StoreVersionIsMonotonic,
    /// Subscription steps completed in order
    FlowIsPrefixChain,
}

/// A specific invariant violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantViolation {
    /// Failed check
    pub check: InvariantCheck,
    /// Observed state
    pub details: String,
}

impl InvariantViolation {
    fn new(check: InvariantCheck, details: impl Into<String>) -> Self {
        Self {
            check,
            details: details.into(),
        }
    }
}

/// Whole-system invariants over one engine and one store
pub struct SystemInvariants;

impl SystemInvariants {
    /// Check all invariants
    ///
    /// # Errors
    /// Every failed check
    pub fn check_all(
        engine: &NavigationEngine,
        store: &SurveyStore,
        last_version: StoreVersion,
    ) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            Self::check_url(engine),
            Self::check_page_viewable(engine),
            Self::check_unique_ids(store),
            Self::check_version(store, last_version),
            Self::check_flow(engine),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// URL path is the canonical mapping of the current page
    ///
    /// # Errors
    /// On mismatch
    pub fn check_url(engine: &NavigationEngine) -> Result<(), InvariantViolation> {
        let state = engine.state();
        let expected = page_to_url(state.current_page);
        if state.url_path == expected {
            Ok(())
        } else {
            Err(InvariantViolation::new(
                InvariantCheck::UrlIsCanonicalForCurrentPage,
                format!(
                    "page {} expects {expected}, location is {}",
                    state.current_page, state.url_path
                ),
            ))
        }
    }

    /// Current page is public without a session, or allowed for the role
    ///
    /// # Errors
    /// When the user sits on a page they may not view
    pub fn check_page_viewable(engine: &NavigationEngine) -> Result<(), InvariantViolation> {
        let page = engine.current_page();
        let viewable = match engine.session() {
            None => matches!(page, PageId::Landing | PageId::Login | PageId::OrgRegistration),
            Some(session) => engine.matrix().is_allowed(page, session.role),
        };
        if viewable {
            Ok(())
        } else {
            Err(InvariantViolation::new(
                InvariantCheck::CurrentPageIsViewable,
                format!(
                    "page {page} shown to {}",
                    engine
                        .session()
                        .map_or("anonymous user", |s| s.role.as_str())
                ),
            ))
        }
    }

    /// No two stored surveys share an id
    ///
    /// # Errors
    /// On the first duplicate found
    pub fn check_unique_ids(store: &SurveyStore) -> Result<(), InvariantViolation> {
        let mut seen = BTreeSet::new();
        for survey in store.all() {
            if !seen.insert(survey.id.clone()) {
                return Err(InvariantViolation::new(
                    InvariantCheck::SurveyIdsAreUnique,
                    format!("id {} stored twice", survey.id),
                ));
            }
        }
        Ok(())
    }

    /// Store version never goes backwards
    ///
    /// # Errors
    /// When the version dropped below `last_version`
    pub fn check_version(
        store: &SurveyStore,
        last_version: StoreVersion,
    ) -> Result<(), InvariantViolation> {
        let version = store.version();
        if version >= last_version {
            Ok(())
        } else {
            Err(InvariantViolation::new(
                InvariantCheck::StoreVersionIsMonotonic,
                format!("version went from {last_version} to {version}"),
            ))
        }
    }

    /// Method implies package, payment data implies method
    ///
    /// # Errors
    /// When the chain is broken
    pub fn check_flow(engine: &NavigationEngine) -> Result<(), InvariantViolation> {
        if engine.flow().is_consistent() {
            Ok(())
        } else {
            Err(InvariantViolation::new(
                InvariantCheck::FlowIsPrefixChain,
                format!("{:?}", engine.flow()),
            ))
        }
    }
}
