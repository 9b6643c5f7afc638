//! Roles and capability tokens

use crate::error::ParseNameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User role within the organizational hierarchy
///
/// Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator with access to system pages
    SuperAdmin,
    /// Administrator of organizations and users
    Admin,
    /// Manager of a single organization's surveys
    OrgManager,
    /// Survey respondent
    Beneficiary,
}

impl Role {
    /// Every role, in hierarchy order
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::OrgManager,
        Role::Beneficiary,
    ];

    /// Stable string form
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::OrgManager => "org_manager",
            Role::Beneficiary => "beneficiary",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseNameError::UnknownRole(s.to_string()))
    }
}

/// Coarse capability granted to a role
///
/// Navigation never reads these; feature code uses them to decide which
/// affordances (buttons, menu entries) to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionToken {
    /// See the aggregate dashboard
    ViewDashboard,
    /// Browse surveys
    ViewSurveys,
    /// Create, edit and delete surveys
    ManageSurveys,
    /// Answer surveys
    RespondToSurveys,
    /// Read survey results
    ViewResults,
    /// Produce share links and QR codes
    ShareSurveys,
    /// Register and edit beneficiaries
    ManageBeneficiaries,
    /// Create and edit organizations
    ManageOrganizations,
    /// Create and edit user accounts
    ManageUsers,
    /// Buy or change a subscription package
    ManageSubscription,
    /// Read cross-organization reports
    ViewReports,
    /// Change platform settings and read the audit log
    ManageSystem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_forms_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err, ParseNameError::UnknownRole("root".to_string()));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::OrgManager).unwrap();
        assert_eq!(json, "\"org_manager\"");
    }
}
