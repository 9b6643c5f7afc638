//! Impact Navigation
//!
//! Role-gated page state for the survey platform:
//!
//! - [`NavigationEngine`]: current page, validated against the
//!   [`impact_access::RoleMatrix`] and kept in step with the URL
//! - [`NavigationOutcome`]: commits, redirects and denials as values
//! - [`SubscriptionFlow`]: package, payment method and payment data chain
//! - [`AuthProvider`]: the identity provider boundary
//! - [`NavConfig`]: TOML configuration
//!
//! # Example
//!
//! ```rust
//! use impact_access::{PageId, Role, Session};
//! use impact_nav::{NavConfig, NavigationEngine, NavigationOutcome};
//! use impact_router::MemoryHistory;
//! use std::sync::Arc;
//!
//! let history = Arc::new(MemoryHistory::new("/"));
//! let mut engine = NavigationEngine::new(&NavConfig::default(), history).unwrap();
//!
//! let outcome = engine.request_navigate(PageId::Surveys);
//! assert_eq!(outcome.destination(), Some(PageId::Login));
//!
//! let _ = engine.session_changed(Some(Session::new(Role::Beneficiary, "Kofi")));
//! let outcome = engine.request_navigate(PageId::Dashboard);
//! assert!(outcome.is_denied());
//! assert_eq!(engine.current_page(), PageId::EnhancedSurvey);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod auth;
mod config;
mod engine;
mod error;
mod flow;
mod outcome;

pub use auth::{AuthProvider, InMemoryAuthProvider, SessionListener, SessionSubscription};
pub use config::{builtin_default_page, NavConfig};
pub use engine::{NavigationEngine, SharedEngine};
pub use error::{ConfigError, FlowError};
pub use flow::{FlowAction, Package, PaymentMethod, PaymentPayload, SubscriptionFlow};
pub use outcome::{DenialReason, NavigationOutcome, NavigationState, RedirectReason};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
