//! Navigation configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! app_title = "Impact Surveys"
//! landing = "landing"
//! strict_matrix = true
//!
//! [default_pages]
//! org_manager = "surveys"
//!
//! [page_permissions]
//! reports = ["super_admin"]
//!
//! [page_titles]
//! dashboard = "Overview"
//! ```

use crate::error::ConfigError;
use impact_access::{PageId, Role, RoleMatrix};
use impact_router::{TitleTable, GENERIC_TITLE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Navigation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Product name appended to page titles
    pub app_title: String,
    /// Page unmapped URLs degrade to
    pub landing: PageId,
    /// Post-login page per role name, overriding the built-in choice
    pub default_pages: BTreeMap<String, PageId>,
    /// Allowed roles per page name, replacing the built-in entry
    pub page_permissions: BTreeMap<String, BTreeSet<Role>>,
    /// Title label per page name
    pub page_titles: BTreeMap<String, String>,
    /// Refuse to start with an incomplete permission matrix
    pub strict_matrix: bool,
}

impl NavConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "navigation config loaded");
        Ok(config)
    }

    /// With application title
    #[must_use]
    pub fn with_app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = title.into();
        self
    }

    /// With landing page
    #[must_use]
    pub fn with_landing(mut self, landing: PageId) -> Self {
        self.landing = landing;
        self
    }

    /// With a post-login page for one role
    #[must_use]
    pub fn with_default_page(mut self, role: Role, page: PageId) -> Self {
        self.default_pages.insert(role.as_str().to_string(), page);
        self
    }

    /// With the allowed roles of one page
    #[must_use]
    pub fn with_page_roles(mut self, page: PageId, roles: impl IntoIterator<Item = Role>) -> Self {
        self.page_permissions
            .insert(page.as_str().to_string(), roles.into_iter().collect());
        self
    }

    /// With a title label for one page
    #[must_use]
    pub fn with_page_title(mut self, page: PageId, label: impl Into<String>) -> Self {
        self.page_titles.insert(page.as_str().to_string(), label.into());
        self
    }

    /// With strict matrix validation on or off
    #[must_use]
    pub fn with_strict_matrix(mut self, strict: bool) -> Self {
        self.strict_matrix = strict;
        self
    }

    /// Built-in matrix with the configured page overrides applied
    ///
    /// # Errors
    /// - [`ConfigError::Name`] for an unknown page name
    /// - [`ConfigError::Matrix`] in strict mode when validation fails
    pub fn role_matrix(&self) -> Result<RoleMatrix, ConfigError> {
        let mut matrix = RoleMatrix::builtin();
        for (name, roles) in &self.page_permissions {
            let page: PageId = name.parse()?;
            matrix = matrix.with_page_roles(page, roles.iter().copied());
        }

        match matrix.validate() {
            Ok(()) => Ok(matrix),
            Err(err) if self.strict_matrix => Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "continuing with incomplete permission matrix");
                Ok(matrix)
            }
        }
    }

    /// Post-login page of every role
    ///
    /// # Errors
    /// Returns [`ConfigError::Name`] for an unknown role name
    pub fn default_pages(&self) -> Result<BTreeMap<Role, PageId>, ConfigError> {
        let mut pages: BTreeMap<Role, PageId> = Role::ALL
            .into_iter()
            .map(|role| (role, builtin_default_page(role)))
            .collect();
        for (name, page) in &self.default_pages {
            pages.insert(name.parse()?, *page);
        }
        Ok(pages)
    }

    /// Title table with the configured labels
    ///
    /// # Errors
    /// Returns [`ConfigError::Name`] for an unknown page name
    pub fn title_table(&self) -> Result<TitleTable, ConfigError> {
        let mut titles = TitleTable::new(self.app_title.clone());
        for (name, label) in &self.page_titles {
            titles = titles.with_label(name.parse()?, label.clone());
        }
        Ok(titles)
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            app_title: GENERIC_TITLE.to_string(),
            landing: PageId::Landing,
            default_pages: BTreeMap::new(),
            page_permissions: BTreeMap::new(),
            page_titles: BTreeMap::new(),
            strict_matrix: true,
        }
    }
}

/// Where a role lands right after signing in
#[must_use]
pub fn builtin_default_page(role: Role) -> PageId {
    match role {
        Role::Beneficiary => PageId::EnhancedSurvey,
        Role::SuperAdmin | Role::Admin | Role::OrgManager => PageId::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impact_access::{MatrixError, ParseNameError};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        let config = NavConfig::from_toml_str("").unwrap();
        assert_eq!(config, NavConfig::default());
    }

    #[test]
    fn toml_overrides_are_applied() {
        let config = NavConfig::from_toml_str(
            r#"
            app_title = "Impact"

            [default_pages]
            org_manager = "surveys"

            [page_permissions]
            reports = ["super_admin"]

            [page_titles]
            dashboard = "Overview"
            "#,
        )
        .unwrap();

        let matrix = config.role_matrix().unwrap();
        assert!(!matrix.is_allowed(PageId::Reports, Role::Admin));
        assert!(matrix.is_allowed(PageId::Reports, Role::SuperAdmin));

        let pages = config.default_pages().unwrap();
        assert_eq!(pages[&Role::OrgManager], PageId::Surveys);
        assert_eq!(pages[&Role::Beneficiary], PageId::EnhancedSurvey);

        let titles = config.title_table().unwrap();
        assert_eq!(titles.title_for(PageId::Dashboard), "Overview | Impact");
    }

    #[test]
    fn unknown_page_name_is_rejected() {
        let mut config = NavConfig::new().with_page_title(PageId::Users, "People");
        config.page_titles.insert("nope".to_string(), "x".to_string());

        let err = config.title_table().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Name(ParseNameError::UnknownPage(ref name)) if name == "nope"
        ));
    }

    #[test]
    fn strict_mode_rejects_unreachable_page() {
        let config = NavConfig::new().with_page_roles(PageId::AuditLog, []);
        let err = config.role_matrix().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Matrix(MatrixError::UnreachablePages(ref pages)) if pages == &[PageId::AuditLog]
        ));
    }

    #[test]
    fn lenient_mode_keeps_unreachable_page() {
        let config = NavConfig::new()
            .with_page_roles(PageId::AuditLog, [])
            .with_strict_matrix(false);
        let matrix = config.role_matrix().unwrap();
        assert!(matrix.is_unreachable(PageId::AuditLog));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = NavConfig::from_toml_str("landing = \"nowhere\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_title = \"From disk\"").unwrap();

        let config = NavConfig::load(file.path()).unwrap();
        assert_eq!(config.app_title, "From disk");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NavConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
