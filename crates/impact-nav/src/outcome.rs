use impact_access::{PageId, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the engine landed somewhere other than the requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Protected page requested without a session
    Unauthenticated,
    /// Subscription flow page requested before its prerequisites
    FlowIncomplete,
    /// Back/forward reached a page the current role may not view
    PopStateDenied,
    /// Sign-in moved the user to the role's default page
    SessionStarted,
    /// Sign-out moved the user to the landing page
    SessionEnded,
    /// Displayed survey no longer exists
    SurveyRemoved,
}

/// Why a navigation request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The page exists but not for this role
    RoleNotPermitted(Role),
    /// No role may view the page
    Unreachable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleNotPermitted(role) => write!(f, "not permitted for role {role}"),
            Self::Unreachable => f.write_str("page is not reachable by any role"),
        }
    }
}

/// Result of one engine transition
///
/// Redirects and denials are expected control flow, not errors. Only
/// [`NavigationOutcome::Denied`] calls for a user-visible message.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Moved to the requested page
    Committed {
        /// Page before the transition
        from: PageId,
        /// Page after the transition
        to: PageId,
    },
    /// Already on the requested page
    Unchanged(PageId),
    /// Moved somewhere else than requested
    Redirected {
        /// Page the caller asked for
        requested: PageId,
        /// Page actually shown
        to: PageId,
        /// Cause
        reason: RedirectReason,
    },
    /// Refused; page and URL untouched
    Denied {
        /// Page the caller asked for
        requested: PageId,
        /// Cause
        reason: DenialReason,
    },
}

impl NavigationOutcome {
    /// Page shown after the transition, if it changed
    #[must_use]
    pub fn destination(&self) -> Option<PageId> {
        match self {
            Self::Committed { to, .. } | Self::Redirected { to, .. } => Some(*to),
            Self::Unchanged(_) | Self::Denied { .. } => None,
        }
    }

    /// Whether the request was committed as asked
    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Whether the request ended elsewhere
    #[inline]
    #[must_use]
    pub fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected { .. })
    }

    /// Whether the request was refused
    #[inline]
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Current page and URL path, read together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Logical page
    pub current_page: PageId,
    /// Canonical path of `current_page`
    pub url_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_only_for_moves() {
        let committed = NavigationOutcome::Committed {
            from: PageId::Landing,
            to: PageId::Surveys,
        };
        let denied = NavigationOutcome::Denied {
            requested: PageId::Dashboard,
            reason: DenialReason::RoleNotPermitted(Role::Beneficiary),
        };
        assert_eq!(committed.destination(), Some(PageId::Surveys));
        assert_eq!(denied.destination(), None);
        assert_eq!(NavigationOutcome::Unchanged(PageId::Login).destination(), None);
    }

    #[test]
    fn outcome_serializes_tagged() {
        let outcome = NavigationOutcome::Redirected {
            requested: PageId::Surveys,
            to: PageId::Login,
            reason: RedirectReason::Unauthenticated,
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["outcome"], "redirected");
        assert_eq!(json["to"], "login");
        assert_eq!(json["reason"], "unauthenticated");
    }
}
