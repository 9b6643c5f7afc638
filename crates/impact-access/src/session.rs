use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Authenticated user as seen by navigation
///
/// Produced by the identity provider after a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Role, immutable for the session's lifetime
    pub role: Role,
    /// Name shown in the header
    pub display_name: String,
    /// Organization the user belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl Session {
    /// Create a session without an organization
    #[inline]
    #[must_use]
    pub fn new(role: Role, display_name: impl Into<String>) -> Self {
        Self {
            role,
            display_name: display_name.into(),
            organization: None,
        }
    }

    /// With organization
    #[inline]
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}
