//! Sources of per-period returns
//!
//! The engine never touches process-wide randomness. Callers pass a
//! [`ReturnSource`], which makes runs seedable and lets tests script exact
//! return paths.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Result, SimulationError};

/// Draws one return per compounding period
pub trait ReturnSource {
    /// Draw from a normal distribution with the given mean and standard deviation
    fn draw_normal(&mut self, mean: f64, std_dev: f64) -> Result<f64>;
}

/// Normally distributed returns backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RandomReturns<R> {
    rng: R,
}

impl<R: Rng> RandomReturns<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomReturns<StdRng> {
    /// Reproducible generator
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> ReturnSource for RandomReturns<R> {
    fn draw_normal(&mut self, mean: f64, std_dev: f64) -> Result<f64> {
        if !std_dev.is_finite() || !(std_dev >= 0.0) {
            return Err(SimulationError::InvalidDistribution { mean, std_dev });
        }
        let normal = Normal::new(mean, std_dev)
            .map_err(|_| SimulationError::InvalidDistribution { mean, std_dev })?;
        Ok(normal.sample(&mut self.rng))
    }
}

/// Always returns the distribution mean
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReturns;

impl ReturnSource for MeanReturns {
    fn draw_normal(&mut self, mean: f64, _std_dev: f64) -> Result<f64> {
        Ok(mean)
    }
}

/// Replays a fixed sequence of returns, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedReturns {
    returns: Vec<f64>,
    cursor: usize,
}

impl ScriptedReturns {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns, cursor: 0 }
    }
}

impl ReturnSource for ScriptedReturns {
    fn draw_normal(&mut self, mean: f64, _std_dev: f64) -> Result<f64> {
        if self.returns.is_empty() {
            return Ok(mean);
        }
        let value = self.returns[self.cursor % self.returns.len()];
        self.cursor += 1;
        Ok(value)
    }
}
