//! Settlement output structures for simulations

use serde::{Deserialize, Serialize};

use super::rates::PeriodRates;
use super::state::PortfolioState;

/// A single row of output for one annual settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRow {
    // Timing
    pub year: u32,
    pub period: u32,

    // Tax
    pub gain: f64,
    pub gross_tax: f64,
    pub deduction_applied: f64,
    pub tax_burden: f64,
    pub loss_carried_forward: f64,

    // Outflows
    pub withdrawal: f64,
    /// Capacity skims during the year, including the post-settlement check
    pub capacity_skims: f64,

    // End of year balances
    pub portfolio_value: f64,
    pub carry_over_losses: f64,
    pub tax_liability_accumulated: f64,
    pub removed_funds_accumulated: f64,
}

/// Complete simulation result for one portfolio
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub name: String,

    /// Normalized figures the run stepped with
    pub period_rates: PeriodRates,

    /// One row per settlement (empty unless detailed output is requested)
    pub settlements: Vec<SettlementRow>,

    /// Final state after the last period
    pub final_state: PortfolioState,

    /// Sum of gains that reached a settlement
    pub settled_gain: f64,

    /// Number of settlements performed
    pub years_settled: u32,

    /// First year ending with a negative portfolio value
    pub first_negative_year: Option<u32>,
}

impl SimulationResult {
    pub fn portfolio_value(&self) -> f64 {
        self.final_state.portfolio_value
    }

    pub fn tax_liability_accumulated(&self) -> f64 {
        self.final_state.tax_liability_accumulated
    }

    pub fn removed_funds_accumulated(&self) -> f64 {
        self.final_state.removed_funds_accumulated
    }

    pub fn carry_over_losses(&self) -> f64 {
        self.final_state.carry_over_losses
    }

    /// Gain accrued after the last settlement (a trailing partial year)
    pub fn unsettled_gain(&self) -> f64 {
        self.final_state.annual_gain
    }

    /// Get summary statistics
    pub fn summary(&self) -> SimulationSummary {
        let total_tax = self.tax_liability_accumulated();
        let effective_tax_rate = if self.settled_gain > 0.0 {
            Some(total_tax / self.settled_gain)
        } else {
            None
        };

        SimulationSummary {
            name: self.name.clone(),
            years_settled: self.years_settled,
            initial_investment: self.final_state.initial_investment,
            final_value: self.portfolio_value(),
            total_tax,
            total_removed: self.removed_funds_accumulated(),
            carry_over_losses: self.carry_over_losses(),
            settled_gain: self.settled_gain,
            unsettled_gain: self.unsettled_gain(),
            effective_tax_rate,
        }
    }
}

/// Summary statistics for a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub name: String,
    pub years_settled: u32,
    pub initial_investment: f64,
    pub final_value: f64,
    pub total_tax: f64,
    pub total_removed: f64,
    pub carry_over_losses: f64,
    pub settled_gain: f64,
    pub unsettled_gain: f64,
    /// Tax over settled gain; `None` when there was no net gain
    pub effective_tax_rate: Option<f64>,
}
