//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the B+tree with:
//! - Reproducible random operation sequences
//! - A [`std::collections::BTreeMap`] reference model
//! - Structural validation after each operation
//!
//! Given the same seed, execution is identical.
//!
//! # Usage
//!
//! ```
//! use keyspace::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_node_capacity(4);
//!
//! let mut sim = Simulator::new(config);
//! let result = sim.run(1000);
//!
//! assert!(result.invariant_violations.is_empty());
//! ```

mod invariants;
mod simulator;
mod workload;

pub use invariants::{InvariantViolation, ModelChecker};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
pub use workload::{Operation, WorkloadConfig, WorkloadGenerator, random_unique_array};
