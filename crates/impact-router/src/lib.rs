//! Impact Router
//!
//! Total, information-preserving mapping between logical pages and URL
//! paths, glued to the platform history:
//!
//! - [`page_to_url`] / [`Router::url_to_page`]: canonical path table
//! - [`Router::navigate`] / [`Router::replace`]: push or overwrite entries
//! - [`Router::on_pop_state`]: back/forward notifications, scoped by
//!   [`PopStateSubscription`]
//! - [`History`]: the platform boundary, with [`MemoryHistory`] in-process
//!
//! # Example
//!
//! ```rust
//! use impact_access::PageId;
//! use impact_router::{MemoryHistory, Router};
//! use std::sync::Arc;
//!
//! let history = Arc::new(MemoryHistory::new("/"));
//! let router = Router::new(history.clone());
//!
//! router.navigate(PageId::Surveys);
//! router.navigate(PageId::Surveys);
//! assert_eq!(history.len(), 2);
//! assert_eq!(router.current_page(), PageId::Surveys);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod history;
mod router;
mod routes;
mod titles;

pub use history::{History, HistoryEntry, ListenerId, LocationListener, MemoryHistory};
pub use router::{PopStateSubscription, Router};
pub use routes::{canonical_path, lookup_page, page_to_url, resolve_page};
pub use titles::{page_label, TitleTable, GENERIC_TITLE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
