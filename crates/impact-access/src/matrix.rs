//! Role/page permission matrix
//!
//! Two immutable tables built once at startup:
//! - role → permission tokens, consumed by feature code
//! - page → allowed roles, the table navigation consults
//!
//! Lookups fail closed: a page without an entry is allowed for nobody.

use crate::error::MatrixError;
use crate::page::PageId;
use crate::role::{PermissionToken, Role};
use std::collections::{BTreeMap, BTreeSet};

/// Authorization tables for roles and pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatrix {
    role_permissions: BTreeMap<Role, BTreeSet<PermissionToken>>,
    page_permissions: BTreeMap<PageId, BTreeSet<Role>>,
}

impl RoleMatrix {
    /// Built-in tables covering every role and page
    #[must_use]
    pub fn builtin() -> Self {
        let role_permissions = Role::ALL
            .into_iter()
            .map(|role| (role, default_permissions(role).iter().copied().collect()))
            .collect();
        let page_permissions = PageId::ALL
            .into_iter()
            .map(|page| (page, default_roles(page).iter().copied().collect()))
            .collect();
        Self {
            role_permissions,
            page_permissions,
        }
    }

    /// Build from explicit tables
    ///
    /// Pages or roles absent from the tables are treated as having no
    /// entry; run [`RoleMatrix::validate`] to surface them.
    #[must_use]
    pub fn from_tables(
        role_permissions: BTreeMap<Role, BTreeSet<PermissionToken>>,
        page_permissions: BTreeMap<PageId, BTreeSet<Role>>,
    ) -> Self {
        Self {
            role_permissions,
            page_permissions,
        }
    }

    /// Replace the allowed-role set of one page
    #[must_use]
    pub fn with_page_roles(mut self, page: PageId, roles: impl IntoIterator<Item = Role>) -> Self {
        self.page_permissions.insert(page, roles.into_iter().collect());
        self
    }

    /// Drop the entry of one page
    #[must_use]
    pub fn without_page(mut self, page: PageId) -> Self {
        self.page_permissions.remove(&page);
        self
    }

    /// Whether `role` may view `page`
    ///
    /// Total over the closed enumerations. Missing entries yield `false`.
    #[inline]
    #[must_use]
    pub fn is_allowed(&self, page: PageId, role: Role) -> bool {
        self.page_permissions
            .get(&page)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Capability tokens of a role, empty when the role has no entry
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> BTreeSet<PermissionToken> {
        self.role_permissions.get(&role).cloned().unwrap_or_default()
    }

    /// Whether a role holds a specific capability
    #[inline]
    #[must_use]
    pub fn has_permission(&self, role: Role, token: PermissionToken) -> bool {
        self.role_permissions
            .get(&role)
            .is_some_and(|tokens| tokens.contains(&token))
    }

    /// Allowed roles of a page, `None` when the page has no entry
    #[inline]
    #[must_use]
    pub fn roles_for(&self, page: PageId) -> Option<&BTreeSet<Role>> {
        self.page_permissions.get(&page)
    }

    /// Pages a role may view, in declaration order
    #[must_use]
    pub fn allowed_pages(&self, role: Role) -> Vec<PageId> {
        PageId::ALL
            .into_iter()
            .filter(|page| self.is_allowed(*page, role))
            .collect()
    }

    /// Whether no role at all can navigate to `page`
    #[inline]
    #[must_use]
    pub fn is_unreachable(&self, page: PageId) -> bool {
        self.page_permissions
            .get(&page)
            .map_or(true, BTreeSet::is_empty)
    }

    /// Startup completeness check
    ///
    /// # Errors
    /// - [`MatrixError::MissingPages`] if any page has no entry
    /// - [`MatrixError::UnreachablePages`] if a non-public page has an empty role set
    pub fn validate(&self) -> Result<(), MatrixError> {
        let missing: Vec<_> = PageId::ALL
            .into_iter()
            .filter(|page| !self.page_permissions.contains_key(page))
            .collect();
        if !missing.is_empty() {
            tracing::error!(?missing, "permission matrix is missing pages");
            return Err(MatrixError::MissingPages(missing));
        }

        let unreachable: Vec<_> = PageId::ALL
            .into_iter()
            .filter(|page| !page.is_public() && self.is_unreachable(*page))
            .collect();
        if !unreachable.is_empty() {
            tracing::error!(?unreachable, "permission matrix has unreachable pages");
            return Err(MatrixError::UnreachablePages(unreachable));
        }

        Ok(())
    }
}

impl Default for RoleMatrix {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in page table
///
/// Exhaustive so that a new page cannot compile without an entry.
fn default_roles(page: PageId) -> &'static [Role] {
    use Role::{Admin, Beneficiary, OrgManager, SuperAdmin};
    match page {
        PageId::Landing => &[SuperAdmin, Admin, OrgManager, Beneficiary],
        PageId::Login => &[],
        PageId::OrgRegistration => &[],
        PageId::Dashboard => &[SuperAdmin, Admin, OrgManager],
        PageId::Surveys => &[SuperAdmin, Admin, OrgManager],
        PageId::SurveyCreation => &[SuperAdmin, Admin, OrgManager],
        PageId::EnhancedSurvey => &[Beneficiary],
        PageId::SurveyView => &[SuperAdmin, Admin, OrgManager, Beneficiary],
        PageId::SurveyResults => &[SuperAdmin, Admin, OrgManager],
        PageId::SurveyShare => &[SuperAdmin, Admin, OrgManager],
        PageId::Profile => &[SuperAdmin, Admin, OrgManager, Beneficiary],
        PageId::Subscription
        | PageId::PaymentMethod
        | PageId::PaymentDetails
        | PageId::SubscriptionConfirmation => &[Admin, OrgManager],
        PageId::Organizations => &[SuperAdmin, Admin],
        PageId::Users => &[SuperAdmin, Admin],
        PageId::Beneficiaries => &[SuperAdmin, Admin, OrgManager],
        PageId::Reports => &[SuperAdmin, Admin],
        PageId::SystemSettings | PageId::AuditLog => &[SuperAdmin],
    }
}

fn default_permissions(role: Role) -> &'static [PermissionToken] {
    use PermissionToken::{
        ManageBeneficiaries, ManageOrganizations, ManageSubscription, ManageSurveys,
        ManageSystem, ManageUsers, RespondToSurveys, ShareSurveys, ViewDashboard, ViewReports,
        ViewResults, ViewSurveys,
    };
    match role {
        Role::SuperAdmin => &[
            ViewDashboard,
            ViewSurveys,
            ManageSurveys,
            ViewResults,
            ShareSurveys,
            ManageBeneficiaries,
            ManageOrganizations,
            ManageUsers,
            ViewReports,
            ManageSystem,
        ],
        Role::Admin => &[
            ViewDashboard,
            ViewSurveys,
            ManageSurveys,
            ViewResults,
            ShareSurveys,
            ManageBeneficiaries,
            ManageOrganizations,
            ManageUsers,
            ManageSubscription,
            ViewReports,
        ],
        Role::OrgManager => &[
            ViewDashboard,
            ViewSurveys,
            ManageSurveys,
            ViewResults,
            ShareSurveys,
            ManageBeneficiaries,
            ManageSubscription,
        ],
        Role::Beneficiary => &[ViewSurveys, RespondToSurveys],
    }
}
