//! Main simulator harness for deterministic simulation testing.
//!
//! Drives a [`ModelChecker`] with operations from a [`WorkloadGenerator`]
//! and collects the results.

use serde::Serialize;

use crate::bptree::DEFAULT_NODE_CAPACITY;

use super::invariants::{InvariantViolation, ModelChecker};
use super::workload::{WorkloadConfig, WorkloadGenerator};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Workload generation configuration.
    pub workload_config: WorkloadConfig,
    /// Maximum keys per node of the tree under test.
    pub node_capacity: usize,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            workload_config: WorkloadConfig::default(),
            node_capacity: DEFAULT_NODE_CAPACITY,
        }
    }

    /// Set the workload configuration.
    #[must_use]
    pub const fn with_workload_config(mut self, config: WorkloadConfig) -> Self {
        self.workload_config = config;
        self
    }

    /// Set the node capacity of the tree under test.
    #[must_use]
    pub const fn with_node_capacity(mut self, capacity: usize) -> Self {
        self.node_capacity = capacity;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations applied.
    pub operations_applied: u64,
    /// Operations the tree accepted or answered with an entry.
    pub successful_operations: u64,
    /// Operations that were rejected or found nothing.
    pub failed_operations: u64,
    /// Entries left in the tree at the end of the run.
    pub final_entry_count: usize,
    /// Tree depth at the end of the run.
    pub final_depth: usize,
    /// Invariant violations detected.
    #[serde(skip)]
    pub invariant_violations: Vec<InvariantViolation>,
    /// Whether the simulation ran to completion.
    pub completed_successfully: bool,
    /// Error message if the simulation could not start.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.completed_successfully && self.invariant_violations.is_empty()
    }

    fn aborted(seed: u64, error: String) -> Self {
        Self {
            seed,
            operations_applied: 0,
            successful_operations: 0,
            failed_operations: 0,
            final_entry_count: 0,
            final_depth: 0,
            invariant_violations: Vec::new(),
            completed_successfully: false,
            error: Some(error),
        }
    }
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: WorkloadGenerator,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = WorkloadGenerator::with_config(config.seed, config.workload_config.clone());
        Self { config, generator }
    }

    /// Run the simulation for a given number of operations.
    ///
    /// Each run starts from an empty tree. Invariants are checked after
    /// every operation and the full contents are compared at the end.
    pub fn run(&mut self, operation_count: usize) -> SimulationResult {
        let mut checker = match ModelChecker::new(self.config.node_capacity) {
            Ok(checker) => checker,
            Err(e) => {
                return SimulationResult::aborted(
                    self.config.seed,
                    format!("Failed to create tree: {e}"),
                );
            }
        };

        let mut successful_operations = 0;
        let mut failed_operations = 0;
        for operation in self.generator.by_ref().take(operation_count) {
            if checker.apply(&operation) {
                successful_operations += 1;
            } else {
                failed_operations += 1;
            }
        }
        checker.check_contents();

        let result = SimulationResult {
            seed: self.config.seed,
            operations_applied: successful_operations + failed_operations,
            successful_operations,
            failed_operations,
            final_entry_count: checker.tree().leaf_count(),
            final_depth: checker.tree().depth(),
            invariant_violations: checker.violations().to_vec(),
            completed_successfully: true,
            error: None,
        };

        if result.passed() {
            tracing::debug!(seed = result.seed, operations = result.operations_applied, "simulation passed");
        } else {
            tracing::warn!(
                seed = result.seed,
                violations = result.invariant_violations.len(),
                "simulation found invariant violations"
            );
        }
        result
    }
}
