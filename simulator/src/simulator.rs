//! Seeded random driver over the navigation engine and survey store
//!
//! Every operation is generated from a [`StdRng`], executed against real
//! components wired the way a host wires them (shared engine, in-memory
//! history and identity provider), then checked two ways: the operation's
//! own outcome against what the permission matrix and store contract
//! predict, and the [`SystemInvariants`] over the whole system.

use crate::invariants::{InvariantViolation, SystemInvariants};
use impact_access::{PageId, Role, Session};
use impact_nav::{
    FlowAction, InMemoryAuthProvider, NavConfig, NavigationEngine, NavigationOutcome, Package,
    PaymentMethod, PaymentPayload, SharedEngine,
};
use impact_router::{page_to_url, MemoryHistory};
use impact_survey::{
    validate_status_transition, StoreError, StoreVersion, Survey, SurveyId, SurveyStatus,
    SurveyStore,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Paths that map to no page
const UNMAPPED_PATHS: [&str; 3] = ["/nowhere", "/admin", "/surveys/view/extra"];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
    /// Stop once this many violations were recorded
    pub stop_on_error_count: Option<usize>,
    /// Engine configuration
    pub nav: NavConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            stop_on_first_violation: true,
            stop_on_error_count: None,
            nav: NavConfig::default(),
        }
    }
}

/// All operations the simulator can generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOperation {
    /// Host requests a page
    Navigate(PageId),
    /// Browser back button
    Back,
    /// Browser forward button
    Forward,
    /// Location typed into the address bar
    TypeUrl(String),
    /// Sign in with the given role
    SignIn(Role),
    /// Sign out
    SignOut,
    /// Subscription flow action
    Flow(FlowAction),
    /// Create a survey
    AddSurvey(SurveyId, SurveyStatus),
    /// Delete a survey from the store only
    RemoveSurvey(SurveyId),
    /// Replace a survey with an edited title
    RenameSurvey(SurveyId),
    /// Move a survey's status
    SetStatus(SurveyId, SurveyStatus),
    /// Collect responses
    RecordResponses(SurveyId, u64),
    /// Delete the survey being viewed and tell the engine
    DeleteDisplayedSurvey(SurveyId),
}

impl SimulatedOperation {
    fn kind(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::TypeUrl(_) => "type_url",
            Self::SignIn(_) => "sign_in",
            Self::SignOut => "sign_out",
            Self::Flow(_) => "flow",
            Self::AddSurvey(..) => "add_survey",
            Self::RemoveSurvey(_) => "remove_survey",
            Self::RenameSurvey(_) => "rename_survey",
            Self::SetStatus(..) => "set_status",
            Self::RecordResponses(..) => "record_responses",
            Self::DeleteDisplayedSurvey(_) => "delete_displayed_survey",
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Operation outcome didn't match the prediction
    UnexpectedOutcome {
        /// Zero-based position in the run
        operation_index: u64,
        /// Operation that misbehaved
        operation: SimulatedOperation,
        /// What differed from the prediction
        details: String,
    },
    /// Invariant was violated
    Invariant {
        /// Operation after which the check failed
        operation_index: u64,
        /// Failed check
        violation: InvariantViolation,
    },
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    /// Operations executed
    pub total_operations: u64,
    /// Navigations that reached the requested page
    pub committed: u64,
    /// Navigations sent elsewhere
    pub redirected: u64,
    /// Navigations refused outright
    pub denied: u64,
    /// Store calls that changed the store
    pub store_mutations: u64,
    /// Store calls and flow actions refused with an error
    pub rejected_operations: u64,
    /// Count per operation kind
    pub operations_by_type: BTreeMap<String, u64>,
}

impl OperationStats {
    fn record(&mut self, operation: &SimulatedOperation, effect: Effect) {
        self.total_operations += 1;
        *self
            .operations_by_type
            .entry(operation.kind().to_string())
            .or_insert(0) += 1;

        match effect {
            Effect::Navigation(NavigationOutcome::Committed { .. }) => self.committed += 1,
            Effect::Navigation(NavigationOutcome::Redirected { .. }) => self.redirected += 1,
            Effect::Navigation(NavigationOutcome::Denied { .. }) => self.denied += 1,
            Effect::Navigation(NavigationOutcome::Unchanged(_)) | Effect::None => {}
            Effect::Mutated => self.store_mutations += 1,
            Effect::Rejected => self.rejected_operations += 1,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration the run used
    pub config: SimulatorConfig,
    /// Counters over the whole run
    pub stats: OperationStats,
    /// Violations in the order found
    pub violations: Vec<Violation>,
    /// Page shown after the last operation
    pub final_page: PageId,
    /// Surveys left in the store
    pub final_survey_count: usize,
    /// Store version at the end
    pub final_version: StoreVersion,
    /// Entries in the simulated browser history
    pub history_length: usize,
}

impl SimulatorReport {
    /// Whether no violation was recorded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut lines = vec![
            "=== Impact Simulator Report ===".to_string(),
            String::new(),
            format!("Seed: {}", self.config.seed),
            format!("Total Operations: {}", self.stats.total_operations),
            format!("Committed: {}", self.stats.committed),
            format!("Redirected: {}", self.stats.redirected),
            format!("Denied: {}", self.stats.denied),
            format!("Store Mutations: {}", self.stats.store_mutations),
            format!("Rejected: {}", self.stats.rejected_operations),
            format!("Violations: {}", self.violations.len()),
            format!("Final Page: {}", self.final_page),
            format!("Final Surveys: {}", self.final_survey_count),
            format!("Final Version: {}", self.final_version),
            format!("History Entries: {}", self.history_length),
        ];

        if !self.violations.is_empty() {
            lines.push(String::new());
            lines.push("=== Violations ===".to_string());
            for (i, violation) in self.violations.iter().enumerate() {
                lines.push(format!("{}. {violation:?}", i + 1));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy)]
enum Effect {
    Navigation(NavigationOutcome),
    Mutated,
    Rejected,
    None,
}

struct World {
    history: Arc<MemoryHistory>,
    engine: SharedEngine,
    auth: InMemoryAuthProvider,
    store: SurveyStore,
    known_ids: Vec<SurveyId>,
    next_id: u64,
}

/// Run the simulator
///
/// # Errors
/// Returns the configuration error if the engine cannot be built
pub fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport, impact_nav::ConfigError> {
    let history = Arc::new(MemoryHistory::new("/"));
    let engine = NavigationEngine::new(&config.nav, history.clone())?.into_shared();
    let _pop_state = NavigationEngine::attach(&engine);
    let auth = InMemoryAuthProvider::new();
    let _auth = NavigationEngine::bind_auth(&engine, &auth);

    let mut world = World {
        history,
        engine,
        auth,
        store: SurveyStore::new(),
        known_ids: Vec::new(),
        next_id: 0,
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();
    let mut last_version = world.store.version();

    tracing::info!(seed = config.seed, operations = config.total_operations, "simulation started");

    for i in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &mut world);
        let (effect, unexpected) = execute_operation(&world, &operation);
        stats.record(&operation, effect);

        let mut failed = false;
        if let Some(details) = unexpected {
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation: operation.clone(),
                details,
            });
            failed = true;
        }

        let checked = {
            let engine = world.engine.lock();
            SystemInvariants::check_all(&engine, &world.store, last_version)
        };
        if let Err(found) = checked {
            violations.extend(found.into_iter().map(|violation| Violation::Invariant {
                operation_index: i,
                violation,
            }));
            failed = true;
        }
        last_version = world.store.version();

        if failed {
            tracing::warn!(index = i, ?operation, "violation detected");
            if config.stop_on_first_violation {
                break;
            }
        }
        if config
            .stop_on_error_count
            .is_some_and(|max| violations.len() >= max)
        {
            break;
        }
    }

    let final_page = world.engine.lock().current_page();
    tracing::info!(violations = violations.len(), %final_page, "simulation finished");

    Ok(SimulatorReport {
        config,
        stats,
        violations,
        final_page,
        final_survey_count: world.store.len(),
        final_version: world.store.version(),
        history_length: world.history.len(),
    })
}

fn pick<T: Clone>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())].clone()
}

fn generate_operation(rng: &mut StdRng, world: &mut World) -> SimulatedOperation {
    let known = !world.known_ids.is_empty();
    match rng.gen_range(0..100) {
        0..=29 => SimulatedOperation::Navigate(pick(rng, &PageId::ALL)),
        30..=37 => SimulatedOperation::Back,
        38..=41 => SimulatedOperation::Forward,
        42..=45 => {
            let path = if rng.gen_bool(0.75) {
                page_to_url(pick(rng, &PageId::ALL)).to_string()
            } else {
                pick(rng, &UNMAPPED_PATHS).to_string()
            };
            SimulatedOperation::TypeUrl(path)
        }
        46..=50 => SimulatedOperation::SignIn(pick(rng, &Role::ALL)),
        51..=53 => SimulatedOperation::SignOut,
        54..=65 => SimulatedOperation::Flow(generate_flow_action(rng)),
        66..=75 if !known || rng.gen_bool(0.5) => {
            world.next_id += 1;
            let id = SurveyId::from(format!("sim-{}", world.next_id));
            world.known_ids.push(id.clone());
            let status = pick(
                rng,
                &[SurveyStatus::Draft, SurveyStatus::Active, SurveyStatus::Completed],
            );
            SimulatedOperation::AddSurvey(id, status)
        }
        66..=75 => {
            // Re-adding a known id exercises the duplicate check.
            let id = pick(rng, &world.known_ids);
            SimulatedOperation::AddSurvey(id, SurveyStatus::Draft)
        }
        _ if !known => SimulatedOperation::Navigate(PageId::Surveys),
        76..=81 => SimulatedOperation::RemoveSurvey(pick(rng, &world.known_ids)),
        82..=86 => SimulatedOperation::RenameSurvey(pick(rng, &world.known_ids)),
        87..=91 => SimulatedOperation::SetStatus(
            pick(rng, &world.known_ids),
            pick(
                rng,
                &[SurveyStatus::Draft, SurveyStatus::Active, SurveyStatus::Completed],
            ),
        ),
        92..=95 => {
            SimulatedOperation::RecordResponses(pick(rng, &world.known_ids), rng.gen_range(0..20))
        }
        _ => SimulatedOperation::DeleteDisplayedSurvey(pick(rng, &world.known_ids)),
    }
}

fn generate_flow_action(rng: &mut StdRng) -> FlowAction {
    match rng.gen_range(0..6) {
        0 => FlowAction::SelectPackage(Package::new("basic", "Basic", 1_900).with_survey_quota(5)),
        1 => FlowAction::SelectPackage(Package::new("pro", "Pro", 4_900).with_survey_quota(50)),
        2 => FlowAction::SelectMethod(pick(
            rng,
            &[
                PaymentMethod::Card,
                PaymentMethod::BankTransfer,
                PaymentMethod::MobileMoney,
            ],
        )),
        3 => FlowAction::SubmitPayment(PaymentPayload {
            holder: "Simulated Holder".to_string(),
            reference: "**** 0000".to_string(),
            amount_cents: rng.gen_range(100..10_000),
        }),
        4 => FlowAction::ReturnToMethod,
        _ => FlowAction::Reset,
    }
}

/// Execute one operation; the second value describes a broken prediction
fn execute_operation(world: &World, operation: &SimulatedOperation) -> (Effect, Option<String>) {
    match operation {
        SimulatedOperation::Navigate(page) => navigate(world, *page),
        SimulatedOperation::Back => {
            world.history.back();
            (Effect::None, None)
        }
        SimulatedOperation::Forward => {
            world.history.forward();
            (Effect::None, None)
        }
        SimulatedOperation::TypeUrl(path) => {
            world.history.visit_external(path);
            (Effect::None, None)
        }
        SimulatedOperation::SignIn(role) => {
            world
                .auth
                .sign_in(Session::new(*role, format!("Simulated {role}")));
            (Effect::None, None)
        }
        SimulatedOperation::SignOut => {
            world.auth.sign_out();
            (Effect::None, None)
        }
        SimulatedOperation::Flow(action) => {
            match world.engine.lock().dispatch_flow(action.clone()) {
                Ok(()) => (Effect::None, None),
                Err(_) => (Effect::Rejected, None),
            }
        }
        SimulatedOperation::AddSurvey(id, status) => add_survey(world, id, *status),
        SimulatedOperation::RemoveSurvey(id) => {
            let present = world.store.contains(id);
            mutation_bool(world, present, |store| store.remove(id), "remove")
        }
        SimulatedOperation::RenameSurvey(id) => match world.store.get(id) {
            Some(mut survey) => {
                survey.title = format!("{} (edited)", survey.title);
                mutation_bool(world, true, |store| store.update(id, survey), "update")
            }
            None => {
                let ghost = Survey::new("ghost", "nobody");
                mutation_bool(world, false, |store| store.update(id, ghost), "update")
            }
        },
        SimulatedOperation::SetStatus(id, status) => {
            let expected = world
                .store
                .get(id)
                .is_some_and(|s| validate_status_transition(s.status, *status).is_ok());
            mutation_result(world, expected, |store| store.set_status(id, *status), "set_status")
        }
        SimulatedOperation::RecordResponses(id, count) => {
            let before = world.store.get(id).map(|s| s.responses);
            let version = world.store.version();
            let outcome = mutation_result(
                world,
                before.is_some(),
                |store| store.record_responses(id, *count),
                "record_responses",
            );
            let after = world.store.get(id).map(|s| s.responses);
            match (before, after) {
                (Some(b), Some(a)) if a < b => (
                    outcome.0,
                    Some(format!("responses decreased from {b} to {a}")),
                ),
                (Some(_), Some(_)) if *count == 0 && world.store.version() != version => (
                    outcome.0,
                    Some("recording zero responses bumped the version".to_string()),
                ),
                _ => outcome,
            }
        }
        SimulatedOperation::DeleteDisplayedSurvey(id) => {
            let removed = world.store.remove(id);
            let outcome = world.engine.lock().survey_removed();
            let effect = if removed { Effect::Mutated } else { Effect::None };
            match outcome {
                NavigationOutcome::Denied { .. } => (
                    effect,
                    Some("survey removal navigation was denied".to_string()),
                ),
                _ => (effect, None),
            }
        }
    }
}

fn navigate(world: &World, page: PageId) -> (Effect, Option<String>) {
    let mut engine = world.engine.lock();
    let before = engine.state();
    let role = engine.session().map(|s| s.role);
    let outcome = engine.request_navigate(page);

    let unexpected = match (&outcome, role) {
        (NavigationOutcome::Denied { .. }, _) if engine.state() != before => {
            Some("denial changed page or URL".to_string())
        }
        (NavigationOutcome::Denied { .. }, None) => {
            Some("anonymous request denied instead of redirected".to_string())
        }
        (NavigationOutcome::Denied { .. }, Some(role)) if engine.matrix().is_allowed(page, role) => {
            let gated = engine.flow().first_incomplete_step(page).is_some();
            (!gated).then(|| format!("{page} denied although allowed for {role}"))
        }
        (NavigationOutcome::Committed { to, .. }, Some(role)) if !engine.matrix().is_allowed(*to, role) => {
            Some(format!("{to} committed although not allowed for {role}"))
        }
        _ => None,
    };
    (Effect::Navigation(outcome), unexpected)
}

fn add_survey(world: &World, id: &SurveyId, status: SurveyStatus) -> (Effect, Option<String>) {
    let existed = world.store.contains(id);
    let version = world.store.version();
    let survey = Survey::new(format!("Survey {id}"), "Simulated Org")
        .with_id(id.clone())
        .with_status(status);

    match (world.store.add(survey), existed, status) {
        (Ok(new_version), false, SurveyStatus::Draft | SurveyStatus::Active) => {
            if new_version.0 == version.0 + 1 {
                (Effect::Mutated, None)
            } else {
                (
                    Effect::Mutated,
                    Some(format!("add moved version {version} to {new_version}")),
                )
            }
        }
        (Err(StoreError::DuplicateId(_)), true, _)
        | (Err(StoreError::InvalidInitialStatus(_)), false, SurveyStatus::Completed) => {
            (Effect::Rejected, None)
        }
        (result, existed, status) => (
            Effect::Rejected,
            Some(format!(
                "add of {status:?} survey (existing: {existed}) gave {result:?}"
            )),
        ),
    }
}

fn mutation_bool(
    world: &World,
    expected: bool,
    mutate: impl FnOnce(&SurveyStore) -> bool,
    name: &str,
) -> (Effect, Option<String>) {
    let version = world.store.version();
    let changed = mutate(&world.store);
    let delta = world.store.version().0 - version.0;
    let effect = if changed { Effect::Mutated } else { Effect::None };
    if changed != expected || delta != u64::from(changed) {
        return (
            effect,
            Some(format!(
                "{name} returned {changed}, expected {expected}, version delta {delta}"
            )),
        );
    }
    (effect, None)
}

fn mutation_result(
    world: &World,
    expected: bool,
    mutate: impl FnOnce(&SurveyStore) -> Result<StoreVersion, StoreError>,
    name: &str,
) -> (Effect, Option<String>) {
    let result = mutate(&world.store).map(|_| ());
    let changed = result.is_ok();
    let effect = if changed { Effect::Mutated } else { Effect::Rejected };
    if changed == expected {
        (effect, None)
    } else {
        (
            effect,
            Some(format!("{name} gave {result:?}, expected success: {expected}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            total_operations: 2_000,
            ..SimulatorConfig::default()
        })
        .unwrap();
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.total_operations, 2_000);
        assert!(report.stats.denied > 0);
        assert!(report.stats.redirected > 0);
        assert!(report.stats.store_mutations > 0);
    }

    #[test]
    fn same_seed_same_run() {
        let config = SimulatorConfig {
            seed: 7,
            total_operations: 500,
            ..SimulatorConfig::default()
        };
        let first = run_simulator(config.clone()).unwrap();
        let second = run_simulator(config).unwrap();

        assert_eq!(first.final_page, second.final_page);
        assert_eq!(first.final_version, second.final_version);
        assert_eq!(first.history_length, second.history_length);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = SimulatorConfig {
            nav: NavConfig::new().with_page_roles(PageId::Users, []),
            ..SimulatorConfig::default()
        };
        assert!(run_simulator(config).is_err());
    }

    #[test]
    fn report_text_names_result() {
        let report = run_simulator(SimulatorConfig {
            total_operations: 50,
            ..SimulatorConfig::default()
        })
        .unwrap();
        let text = report.generate_text();
        assert!(text.contains("Seed: 42"));
        assert!(text.ends_with("=== Result: PASS ==="));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn prop_any_seed_passes(seed in any::<u64>()) {
            let report = run_simulator(SimulatorConfig {
                seed,
                total_operations: 300,
                ..SimulatorConfig::default()
            })
            .unwrap();
            prop_assert!(report.passed(), "{}", report.generate_text());
        }
    }
}
