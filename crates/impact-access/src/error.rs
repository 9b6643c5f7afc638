//! Error types for the access vocabulary

use crate::page::PageId;

/// Startup diagnostics produced by [`crate::RoleMatrix::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// Pages with no entry in the page-permission table
    #[error("pages without a permission entry: {0:?}")]
    MissingPages(Vec<PageId>),

    /// Non-public pages whose allowed-role set is empty
    #[error("pages no role can reach: {0:?}")]
    UnreachablePages(Vec<PageId>),
}

/// Failure to parse a role or page from its string form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNameError {
    /// Unknown role name
    #[error("unknown role: '{0}'")]
    UnknownRole(String),

    /// Unknown page name
    #[error("unknown page: '{0}'")]
    UnknownPage(String),
}
