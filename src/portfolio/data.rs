//! Portfolio inputs: starting capital, return statistics, withdrawals and capacity

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Annualized inputs describing one strategy to project
///
/// These values are never modified by a simulation run. Period-scaled
/// figures live on [`crate::projection::PortfolioState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Display name used in logs and output
    pub name: String,

    /// Span in years the CAGR and standard deviation were estimated over.
    /// Falls back to the simulation horizon when unset.
    pub back_test_years: Option<f64>,

    /// Compound annual growth rate (0.08 = 8%)
    pub cagr: f64,

    /// Standard deviation of annual returns
    pub standard_deviation: f64,

    /// Starting capital
    pub initial_investment: f64,

    /// Fixed outflow taken at every annual settlement
    pub annual_withdrawal: f64,

    /// Maximum deployable capital; `None` is unbounded
    pub capacity: Option<f64>,
}

impl Portfolio {
    /// Create an unbounded portfolio with no back-test span
    pub fn new(
        name: impl Into<String>,
        cagr: f64,
        standard_deviation: f64,
        initial_investment: f64,
        annual_withdrawal: f64,
    ) -> Self {
        Self {
            name: name.into(),
            back_test_years: None,
            cagr,
            standard_deviation,
            initial_investment,
            annual_withdrawal,
            capacity: None,
        }
    }

    pub fn with_back_test_years(mut self, years: f64) -> Self {
        self.back_test_years = Some(years);
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// The two strategies compared by the command-line driver
    pub fn sample_portfolios() -> Vec<Portfolio> {
        vec![
            Portfolio::new("Portfolio A", 3.68632, 0.657, 50_000.0, 0.0)
                .with_back_test_years(8.08)
                .with_capacity(3_500_000.0),
            Portfolio::new("Portfolio B", 2.47, 0.57, 97_500.0, 0.0)
                .with_back_test_years(8.08)
                .with_capacity(4_250_000.0),
        ]
    }

    /// Check construction preconditions
    pub fn validate(&self) -> Result<()> {
        if self.cagr == 0.0 {
            return Err(SimulationError::ZeroGrowthRate);
        }
        if !self.cagr.is_finite() {
            return Err(self.invalid("cagr must be finite"));
        }
        if !self.standard_deviation.is_finite() || self.standard_deviation < 0.0 {
            return Err(self.invalid("standard deviation must be non-negative and finite"));
        }
        if !self.initial_investment.is_finite() || self.initial_investment < 0.0 {
            return Err(self.invalid("initial investment must be non-negative"));
        }
        if !self.annual_withdrawal.is_finite() || self.annual_withdrawal < 0.0 {
            return Err(self.invalid("annual withdrawal must be non-negative"));
        }
        if let Some(capacity) = self.capacity {
            if capacity.is_nan() || capacity <= 0.0 {
                return Err(self.invalid("capacity must be positive"));
            }
        }
        if let Some(years) = self.back_test_years {
            if !years.is_finite() || years <= 0.0 {
                return Err(self.invalid("back-test years must be positive"));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> SimulationError {
        SimulationError::InvalidPortfolio {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}
