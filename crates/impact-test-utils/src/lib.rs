//! Testing utilities for the impact workspace
//!
//! Shared fixtures: sessions per role, sample surveys and packages, and a
//! navigation engine wired to an in-memory history.

#![allow(missing_docs)]

use impact_access::{Role, Session};
use impact_nav::{
    NavConfig, NavigationEngine, Package, PaymentPayload, SharedEngine,
};
use impact_router::{MemoryHistory, PopStateSubscription};
use impact_survey::{Beneficiary, Question, Survey, SurveyStatus};
use std::sync::Arc;

pub fn session(role: Role) -> Session {
    let name = match role {
        Role::SuperAdmin => "Root Operator",
        Role::Admin => "Ada Admin",
        Role::OrgManager => "Zola Manager",
        Role::Beneficiary => "Kofi Mensah",
    };
    let session = Session::new(role, name);
    if role == Role::SuperAdmin {
        session
    } else {
        session.with_organization("Read Foundation")
    }
}

pub fn sample_survey(id: &str) -> Survey {
    Survey::new(format!("Survey {id}"), "Read Foundation")
        .with_id(id)
        .with_description("Reading habits before and after the programme")
        .with_sector("education")
        .with_pre_question(Question::scale("How confident are you reading?", 1, 5))
        .with_post_question(Question::text("What changed for you?").optional())
        .with_beneficiary(Beneficiary::new("Ama Owusu"))
}

pub fn active_survey(id: &str) -> Survey {
    sample_survey(id).with_status(SurveyStatus::Active)
}

pub fn basic_package() -> Package {
    Package::new("basic", "Basic", 1_900).with_survey_quota(5)
}

pub fn pro_package() -> Package {
    Package::new("pro", "Pro", 4_900).with_survey_quota(50)
}

pub fn card_payment(amount_cents: u64) -> PaymentPayload {
    PaymentPayload {
        holder: "Ada Admin".to_string(),
        reference: "**** 4242".to_string(),
        amount_cents,
    }
}

/// Engine over a fresh history at `path`, attached to pop-state
pub struct TestNav {
    pub history: Arc<MemoryHistory>,
    pub engine: SharedEngine,
    pub pop_state: PopStateSubscription,
}

pub fn setup_nav_at(path: &str, config: &NavConfig) -> TestNav {
    let history = Arc::new(MemoryHistory::new(path));
    let engine = NavigationEngine::new(config, history.clone())
        .expect("fixture config builds an engine")
        .into_shared();
    let pop_state = NavigationEngine::attach(&engine);
    TestNav {
        history,
        engine,
        pop_state,
    }
}

pub fn setup_nav() -> TestNav {
    setup_nav_at("/", &NavConfig::default())
}

/// Engine signed in as `role`, starting from the login page
pub fn setup_nav_as(role: Role) -> TestNav {
    let nav = setup_nav_at("/login", &NavConfig::default());
    let _ = nav.engine.lock().session_changed(Some(session(role)));
    nav
}
