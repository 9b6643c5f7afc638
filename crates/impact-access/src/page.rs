//! Logical page identifiers

use crate::error::ParseNameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical application screen
///
/// Independent of its URL; the router owns the path mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageId {
    /// Public marketing page
    Landing,
    /// Sign-in form
    Login,
    /// Self-service organization sign-up
    OrgRegistration,
    /// Aggregate dashboard
    Dashboard,
    /// Survey list
    Surveys,
    /// Survey builder
    SurveyCreation,
    /// Survey answering experience for beneficiaries
    EnhancedSurvey,
    /// Read-only survey detail
    SurveyView,
    /// Survey results and charts
    SurveyResults,
    /// Share link and QR code
    SurveyShare,
    /// User profile
    Profile,
    /// Package selection, first step of the subscription flow
    Subscription,
    /// Payment method choice
    PaymentMethod,
    /// Payment data entry
    PaymentDetails,
    /// Subscription receipt
    SubscriptionConfirmation,
    /// Organization administration
    Organizations,
    /// User administration
    Users,
    /// Beneficiary registry
    Beneficiaries,
    /// Cross-organization reports
    Reports,
    /// Platform settings
    SystemSettings,
    /// Audit trail
    AuditLog,
}

impl PageId {
    /// Every page
    pub const ALL: [PageId; 21] = [
        PageId::Landing,
        PageId::Login,
        PageId::OrgRegistration,
        PageId::Dashboard,
        PageId::Surveys,
        PageId::SurveyCreation,
        PageId::EnhancedSurvey,
        PageId::SurveyView,
        PageId::SurveyResults,
        PageId::SurveyShare,
        PageId::Profile,
        PageId::Subscription,
        PageId::PaymentMethod,
        PageId::PaymentDetails,
        PageId::SubscriptionConfirmation,
        PageId::Organizations,
        PageId::Users,
        PageId::Beneficiaries,
        PageId::Reports,
        PageId::SystemSettings,
        PageId::AuditLog,
    ];

    /// Stable string form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PageId::Landing => "landing",
            PageId::Login => "login",
            PageId::OrgRegistration => "org-registration",
            PageId::Dashboard => "dashboard",
            PageId::Surveys => "surveys",
            PageId::SurveyCreation => "survey-creation",
            PageId::EnhancedSurvey => "enhanced-survey",
            PageId::SurveyView => "survey-view",
            PageId::SurveyResults => "survey-results",
            PageId::SurveyShare => "survey-share",
            PageId::Profile => "profile",
            PageId::Subscription => "subscription",
            PageId::PaymentMethod => "payment-method",
            PageId::PaymentDetails => "payment-details",
            PageId::SubscriptionConfirmation => "subscription-confirmation",
            PageId::Organizations => "organizations",
            PageId::Users => "users",
            PageId::Beneficiaries => "beneficiaries",
            PageId::Reports => "reports",
            PageId::SystemSettings => "system-settings",
            PageId::AuditLog => "audit-log",
        }
    }

    /// Pages that exist outside any session
    ///
    /// An empty role set is legitimate for these.
    #[inline]
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, PageId::Landing | PageId::Login | PageId::OrgRegistration)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| ParseNameError::UnknownPage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn all_has_no_duplicates() {
        let unique: BTreeSet<_> = PageId::ALL.iter().collect();
        assert_eq!(unique.len(), PageId::ALL.len());
    }

    #[test]
    fn string_forms_round_trip() {
        for page in PageId::ALL {
            assert_eq!(page.as_str().parse::<PageId>().unwrap(), page);
        }
    }

    #[test]
    fn serde_matches_as_str() {
        for page in PageId::ALL {
            let json = serde_json::to_string(&page).unwrap();
            assert_eq!(json, format!("\"{}\"", page.as_str()));
        }
    }

    #[test]
    fn public_pages() {
        let public: Vec<_> = PageId::ALL.into_iter().filter(|p| p.is_public()).collect();
        assert_eq!(
            public,
            vec![PageId::Landing, PageId::Login, PageId::OrgRegistration]
        );
    }
}
