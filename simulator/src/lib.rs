//! Impact Simulator
//!
//! Seeded random exercise of the navigation engine and survey store,
//! checking system invariants after every operation.
//!
//! ```rust
//! use impact_simulator::{run_simulator, SimulatorConfig};
//!
//! let report = run_simulator(SimulatorConfig {
//!     total_operations: 200,
//!     ..SimulatorConfig::default()
//! })
//! .unwrap();
//! assert!(report.passed());
//! ```

#![allow(missing_docs)]

pub mod invariants;
pub mod simulator;

pub use invariants::{InvariantCheck, InvariantViolation, SystemInvariants};
pub use simulator::{
    run_simulator, OperationStats, SimulatedOperation, SimulatorConfig, SimulatorReport, Violation,
};
