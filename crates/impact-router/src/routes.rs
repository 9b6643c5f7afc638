//! Canonical path table
//!
//! Every [`PageId`] has exactly one canonical path. Path lookup ignores the
//! query string, the fragment and a trailing slash.

use impact_access::PageId;

/// Canonical path of a page
#[must_use]
pub fn page_to_url(page: PageId) -> &'static str {
    match page {
        PageId::Landing => "/",
        PageId::Login => "/login",
        PageId::OrgRegistration => "/register",
        PageId::Dashboard => "/dashboard",
        PageId::Surveys => "/surveys",
        PageId::SurveyCreation => "/surveys/new",
        PageId::EnhancedSurvey => "/survey",
        PageId::SurveyView => "/surveys/view",
        PageId::SurveyResults => "/surveys/results",
        PageId::SurveyShare => "/surveys/share",
        PageId::Profile => "/profile",
        PageId::Subscription => "/subscription",
        PageId::PaymentMethod => "/subscription/payment-method",
        PageId::PaymentDetails => "/subscription/payment-details",
        PageId::SubscriptionConfirmation => "/subscription/confirmation",
        PageId::Organizations => "/admin/organizations",
        PageId::Users => "/admin/users",
        PageId::Beneficiaries => "/beneficiaries",
        PageId::Reports => "/admin/reports",
        PageId::SystemSettings => "/system/settings",
        PageId::AuditLog => "/system/audit-log",
    }
}

/// Path part of a location: no query, no fragment, no trailing slash
#[must_use]
pub fn canonical_path(location: &str) -> &str {
    let end = location
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(location.len());
    let path = &location[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Page of a location, `None` when the path is not mapped
#[must_use]
pub fn lookup_page(location: &str) -> Option<PageId> {
    let path = canonical_path(location);
    PageId::ALL.into_iter().find(|page| page_to_url(*page) == path)
}

/// Page of a location, degrading to `fallback` for unmapped paths
#[must_use]
pub fn resolve_page(location: &str, fallback: PageId) -> PageId {
    lookup_page(location).unwrap_or_else(|| {
        tracing::warn!(location, %fallback, "unmapped path degraded to fallback page");
        fallback
    })
}
