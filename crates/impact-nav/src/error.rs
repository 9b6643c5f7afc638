//! Error types for navigation
//!
//! Permission denials and redirects are not errors; they are reported as
//! [`crate::NavigationOutcome`] values. What remains here are configuration
//! failures at startup and caller contract violations in the subscription
//! flow.

use impact_access::{MatrixError, PageId, ParseNameError, Role};
use std::path::PathBuf;

/// Configuration failures, raised before the engine exists
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::NavConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Unknown role or page name used as a key
    #[error("invalid name in config: {0}")]
    Name(#[from] ParseNameError),

    /// Permission matrix failed its completeness check
    #[error("inconsistent permission matrix: {0}")]
    Matrix(#[from] MatrixError),

    /// A role's post-login page is not viewable by that role
    #[error("default page {page} is not allowed for role {role}")]
    DefaultPageNotAllowed {
        /// Role
        role: Role,
        /// Configured default page
        page: PageId,
    },

    /// Fallback page for unmapped locations requires a session
    #[error("landing page {0} is not public")]
    LandingNotPublic(PageId),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Subscription flow contract violations
///
/// Raised when an action arrives before its prerequisite step. The engine
/// gates the flow pages, so a correct host never sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Method chosen before a package
    #[error("no package selected")]
    PackageNotSelected,

    /// Payment submitted before a method
    #[error("no payment method selected")]
    MethodNotSelected,
}
