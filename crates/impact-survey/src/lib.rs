//! Impact Survey
//!
//! Survey lifecycle store for the impact platform:
//!
//! - [`Survey`] and its parts (questions, sectors, beneficiaries)
//! - [`SurveyStatus`] lifecycle, `Draft -> Active -> Completed`
//! - [`SurveyStore`]: newest-first collection with a [`StoreVersion`] counter
//! - [`SurveySync`]: pairs store mutations with a [`SurveyBackend`]
//!
//! # Example
//!
//! ```rust
//! use impact_survey::{Survey, SurveyStore, StoreVersion};
//!
//! let store = SurveyStore::new();
//! let survey = Survey::new("Literacy baseline", "Read Foundation");
//! let id = survey.id.clone();
//!
//! store.add(survey).unwrap();
//! assert!(store.remove(&id));
//! assert_eq!(store.version(), StoreVersion(2));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod lifecycle;
mod model;
mod store;
mod sync;

pub use error::{BackendError, StoreError, SyncError};
pub use lifecycle::{allowed_status_transitions, is_initial_status, validate_status_transition};
pub use model::{Beneficiary, Question, QuestionKind, SectorId, Survey, SurveyId, SurveyStatus};
pub use store::{StoreSnapshot, StoreVersion, SurveyStore};
pub use sync::{SurveyBackend, SurveySync};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
