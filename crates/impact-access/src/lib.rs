//! Impact Access
//!
//! Static authorization vocabulary for the survey platform:
//!
//! - [`Role`]: the closed set of user roles
//! - [`PageId`]: the closed set of logical screens, independent of URLs
//! - [`PermissionToken`]: coarse capabilities consumed by feature code
//! - [`RoleMatrix`]: role → permissions and page → allowed roles tables
//! - [`Session`]: the authenticated user as seen by navigation
//!
//! # Example
//!
//! ```rust
//! use impact_access::{PageId, Role, RoleMatrix};
//!
//! let matrix = RoleMatrix::builtin();
//! assert!(matrix.is_allowed(PageId::Dashboard, Role::Admin));
//! assert!(!matrix.is_allowed(PageId::Dashboard, Role::Beneficiary));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod matrix;
mod page;
mod role;
mod session;

pub use error::{MatrixError, ParseNameError};
pub use matrix::RoleMatrix;
pub use page::PageId;
pub use role::{PermissionToken, Role};
pub use session::Session;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
