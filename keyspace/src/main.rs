use std::fmt;
use std::time::Instant;

use keyspace::bptree::{BPlusTree, TreeError};
use keyspace::config::BenchConfig;
use keyspace::intersect::{BooleanOp, Intersect, IntersectError, SearchStrategy};
use keyspace::range_index::{RangeIndex, RangeIndexError, RangeQuery};
use keyspace::simulation::{SimulationResult, Simulator, SimulatorConfig, random_unique_array};
use keyspace::wildcard_index::{WildcardIndex, WildcardIndexError, WildcardKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timing for one benchmark phase.
#[derive(Debug, Serialize)]
struct PhaseReport {
    name: String,
    operations: usize,
    elapsed_micros: u64,
    /// Entries or ids the phase ended with.
    result_size: usize,
}

#[derive(Debug, Serialize)]
struct BenchReport {
    config: BenchConfig,
    phases: Vec<PhaseReport>,
    simulation: SimulationResult,
}

#[derive(Debug)]
enum BenchError {
    Tree(TreeError),
    Range(RangeIndexError),
    Wildcard(WildcardIndexError),
    Intersect(IntersectError),
    Report(serde_json::Error),
    Mismatch(String),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "tree error: {e}"),
            Self::Range(e) => write!(f, "range index error: {e}"),
            Self::Wildcard(e) => write!(f, "wildcard index error: {e}"),
            Self::Intersect(e) => write!(f, "intersect error: {e}"),
            Self::Report(e) => write!(f, "failed to encode report: {e}"),
            Self::Mismatch(message) => write!(f, "unexpected result: {message}"),
        }
    }
}

impl std::error::Error for BenchError {}

impl From<TreeError> for BenchError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<RangeIndexError> for BenchError {
    fn from(e: RangeIndexError) -> Self {
        Self::Range(e)
    }
}

impl From<WildcardIndexError> for BenchError {
    fn from(e: WildcardIndexError) -> Self {
        Self::Wildcard(e)
    }
}

impl From<IntersectError> for BenchError {
    fn from(e: IntersectError) -> Self {
        Self::Intersect(e)
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Report(e)
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyspace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match BenchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: seed={}, entry_count={}, node_capacity={}",
        config.seed,
        config.entry_count,
        config.node_capacity
    );

    match run(config) {
        Ok(report) => {
            let passed = report.simulation.passed();
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::error!("{}", BenchError::from(e));
                    std::process::exit(1);
                }
            }
            if !passed {
                for violation in &report.simulation.invariant_violations {
                    tracing::error!(
                        operation = violation.operation_index,
                        context = %violation.context,
                        "{}",
                        violation.description
                    );
                }
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Benchmark failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run(config: BenchConfig) -> Result<BenchReport, BenchError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let phases = vec![
        tree_phase(&config, &mut rng)?,
        range_phase(&config, &mut rng)?,
        wildcard_phase(&config, &mut rng)?,
        intersect_phase(&config, &mut rng)?,
    ];

    let started = Instant::now();
    let simulation = Simulator::new(
        SimulatorConfig::new(config.seed).with_node_capacity(config.node_capacity),
    )
    .run(config.entry_count);
    tracing::info!(
        elapsed_micros = elapsed_micros(started),
        passed = simulation.passed(),
        "simulation finished"
    );

    Ok(BenchReport {
        config,
        phases,
        simulation,
    })
}

fn tree_phase(config: &BenchConfig, rng: &mut StdRng) -> Result<PhaseReport, BenchError> {
    let values = random_unique_array(rng, config.entry_count, config.value_range);
    let mut tree = BPlusTree::with_capacity(config.node_capacity)?;
    let started = Instant::now();

    for (position, value) in values.iter().enumerate() {
        tree.put(&value.to_be_bytes(), position)?;
    }
    let hits = values
        .iter()
        .filter(|value| tree.contains_key(&value.to_be_bytes()))
        .count();
    if hits != values.len() {
        return Err(BenchError::Mismatch(format!(
            "found {hits} of {} keys",
            values.len()
        )));
    }
    tree.validate()?;

    for value in values.iter().step_by(2) {
        tree.remove(&value.to_be_bytes())?;
    }
    tree.validate()?;

    let operations = values.len() * 2 + values.len().div_ceil(2);
    let report = phase("tree", operations, started, tree.leaf_count());
    tracing::debug!(depth = tree.depth(), "tree phase depth");
    Ok(report)
}

fn range_phase(config: &BenchConfig, rng: &mut StdRng) -> Result<PhaseReport, BenchError> {
    let mut index = RangeIndex::new("bench");
    let started = Instant::now();

    for id in (0..).take(config.entry_count) {
        index.put(rng.random_range(0..config.value_range), id)?;
    }

    let bound = rng.random_range(0..config.value_range);
    let queries = [
        RangeQuery::GreaterThan(bound),
        RangeQuery::LessThan(bound),
        RangeQuery::Between(bound / 2, bound),
    ];
    let mut matched = 0;
    for query in queries {
        matched += index.search(query)?.len();
    }

    Ok(phase("range_index", config.entry_count + queries.len(), started, matched))
}

fn wildcard_phase(config: &BenchConfig, rng: &mut StdRng) -> Result<PhaseReport, BenchError> {
    let mut index = WildcardIndex::new(config.wildcard_min, config.wildcard_max)?;
    let shortest = config.wildcard_min.max(3);
    let longest = shortest.max(config.wildcard_max.min(12));
    let started = Instant::now();

    let mut words = Vec::with_capacity(config.entry_count);
    for id in (0..).take(config.entry_count) {
        let length = rng.random_range(shortest..=longest);
        let word: String = (0..length)
            .map(|_| char::from(rng.random_range(b'a'..=b'z')))
            .collect();
        index.put(WildcardKind::Standard, &word, id)?;
        words.push(word);
    }

    let mut matched = 0;
    let mut searches = 0;
    if let (Some(first), Some(last)) = (words.first(), words.last()) {
        let terms = [first.as_str(), last.as_str()];
        for op in [BooleanOp::And, BooleanOp::Or, BooleanOp::Not] {
            matched += index.search(&terms, op)?.len();
            searches += 1;
        }
    }
    tracing::debug!(keys = index.index_count(), depth = index.index_depth(), "wildcard phase keys");

    Ok(phase("wildcard_index", words.len() + searches, started, matched))
}

fn intersect_phase(config: &BenchConfig, rng: &mut StdRng) -> Result<PhaseReport, BenchError> {
    let length = config.entry_count.max(1);
    let arrays: Vec<Vec<i32>> = (0..3)
        .map(|_| random_unique_array(rng, length, config.value_range))
        .collect();
    let started = Instant::now();

    let mut intersect = Intersect::new();
    for array in &arrays {
        intersect.put_borrowed(array)?;
    }
    intersect.sort();

    let mut matched = 0;
    let mut operations = 0;
    for strategy in [SearchStrategy::Linear, SearchStrategy::Binary] {
        for op in [BooleanOp::And, BooleanOp::Or, BooleanOp::Not] {
            matched += intersect.exec(op, strategy)?.len();
            operations += 1;
        }
    }

    Ok(phase("intersect", operations, started, matched))
}

fn phase(name: &str, operations: usize, started: Instant, result_size: usize) -> PhaseReport {
    let report = PhaseReport {
        name: name.to_string(),
        operations,
        elapsed_micros: elapsed_micros(started),
        result_size,
    };
    tracing::info!(
        phase = %report.name,
        operations = report.operations,
        elapsed_micros = report.elapsed_micros,
        result_size = report.result_size,
        "phase finished"
    );
    report
}

fn elapsed_micros(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}
