//! Scenario runner for batches of independent portfolios
//!
//! Every portfolio gets its own generator, so a seeded batch produces the
//! same trajectories no matter how rayon schedules the work.

use rayon::prelude::*;

use crate::error::Result;
use crate::portfolio::Portfolio;
use crate::projection::{RandomReturns, SimulationConfig, SimulationEngine, SimulationResult};
use crate::tax::TaxSchedule;

/// Runs portfolios under one shared configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(SimulationConfig::default()).with_seed(42);
/// let results = runner.run_batch(&Portfolio::sample_portfolios())?;
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    engine: SimulationEngine,
    base_seed: Option<u64>,
}

impl ScenarioRunner {
    /// Create runner with the built-in tax schedule
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_schedule(TaxSchedule::default(), config)
    }

    /// Create runner with a custom tax schedule
    pub fn with_schedule(schedule: TaxSchedule, config: SimulationConfig) -> Self {
        Self {
            engine: SimulationEngine::new(schedule, config),
            base_seed: None,
        }
    }

    /// Make every run reproducible from `seed`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Run a single portfolio; `index` selects its seed within a batch
    pub fn run(&self, portfolio: &Portfolio, index: usize) -> Result<SimulationResult> {
        let mut returns = match self.base_seed {
            Some(seed) => RandomReturns::seeded(derive_seed(seed, index)),
            None => RandomReturns::from_entropy(),
        };
        self.engine.simulate(portfolio, &mut returns)
    }

    /// Run all portfolios in parallel, preserving input order
    pub fn run_batch(&self, portfolios: &[Portfolio]) -> Result<Vec<SimulationResult>> {
        portfolios
            .par_iter()
            .enumerate()
            .map(|(index, portfolio)| self.run(portfolio, index))
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

fn derive_seed(base_seed: u64, index: usize) -> u64 {
    splitmix64(base_seed ^ (index as u64).rotate_left(32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
