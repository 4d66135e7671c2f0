//! Mutable portfolio state for a single simulation run

use serde::Serialize;

use super::rates::{round_cents, PeriodRates};
use crate::portfolio::Portfolio;
use crate::tax::{TaxAssessment, TaxSchedule};

/// Year-end tax and withdrawal applied at a settlement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settlement {
    /// Net gain accumulated over the year
    pub gain: f64,
    pub assessment: TaxAssessment,
    pub withdrawal: f64,
}

impl Settlement {
    /// Total leaving the portfolio (a recognized loss reduces it)
    pub fn outflow(&self) -> f64 {
        self.assessment.tax_burden + self.withdrawal
    }
}

/// State of a portfolio during projection
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioState {
    /// Current period (1-indexed, 0 before the first step)
    pub period: u32,

    /// Compounding periods per year
    pub frequency: u32,

    /// Normalized growth rate for one period
    pub period_rate: f64,

    /// Normalized volatility for one period
    pub period_std_dev: f64,

    /// Starting capital snapshot
    pub initial_investment: f64,

    /// Fixed outflow per settlement
    pub annual_withdrawal: f64,

    /// Capacity ceiling, `None` when unbounded
    pub capacity: Option<f64>,

    /// Current wealth; no floor is applied
    pub portfolio_value: f64,

    /// Running sum of tax burdens (negative entries are recognized losses)
    pub tax_liability_accumulated: f64,

    /// Losses not yet deducted
    pub carry_over_losses: f64,

    /// Withdrawals plus capacity skims
    pub removed_funds_accumulated: f64,

    /// Gain since the last settlement
    pub annual_gain: f64,
}

impl PortfolioState {
    /// Initialize state from a portfolio at projection start
    pub fn from_portfolio(portfolio: &Portfolio, rates: PeriodRates, frequency: u32) -> Self {
        Self {
            period: 0,
            frequency,
            period_rate: rates.rate,
            period_std_dev: rates.std_dev,
            initial_investment: portfolio.initial_investment,
            annual_withdrawal: portfolio.annual_withdrawal,
            capacity: portfolio.capacity,
            portfolio_value: portfolio.initial_investment,
            tax_liability_accumulated: 0.0,
            carry_over_losses: 0.0,
            removed_funds_accumulated: 0.0,
            annual_gain: 0.0,
        }
    }

    /// Apply one period's return and accrue the gain
    ///
    /// The first period compounds from the initial investment and skips the
    /// capacity check. Returns the amount skimmed by the capacity limit.
    pub fn advance_period(&mut self, period_return: f64) -> f64 {
        self.period += 1;
        let growth = period_return / self.frequency as f64;

        if self.period == 1 {
            self.annual_gain += self.initial_investment * growth;
            self.portfolio_value = round_cents(self.initial_investment * (1.0 + growth));
            0.0
        } else {
            self.annual_gain += self.portfolio_value * growth;
            self.portfolio_value = round_cents(self.portfolio_value * (1.0 + growth));
            self.apply_capacity_limit()
        }
    }

    /// Whether the current period closes a year
    pub fn at_year_end(&self) -> bool {
        self.period > 0 && self.period % self.frequency == 0
    }

    /// Completed years
    pub fn year(&self) -> u32 {
        self.period / self.frequency
    }

    /// Tax the year's gain and record the withdrawal
    ///
    /// Updates accumulated liability, carry-over losses and removed funds.
    /// Portfolio value is left to the caller.
    pub fn tax_and_withdrawals(&mut self, schedule: &TaxSchedule) -> Settlement {
        let gain = self.annual_gain;
        let assessment = schedule.assess(gain, self.carry_over_losses);

        self.carry_over_losses += assessment.loss_carried_forward - assessment.deduction_applied;
        self.tax_liability_accumulated += round_cents(assessment.tax_burden);
        self.removed_funds_accumulated += self.annual_withdrawal;

        Settlement {
            gain,
            assessment,
            withdrawal: self.annual_withdrawal,
        }
    }

    /// Skim half the capacity once value reaches the ceiling
    ///
    /// Applied at most once per call, even if value stays above capacity.
    pub fn apply_capacity_limit(&mut self) -> f64 {
        match self.capacity {
            Some(capacity) if self.portfolio_value >= capacity => {
                let reduction = round_cents(capacity / 2.0);
                self.removed_funds_accumulated += reduction;
                self.portfolio_value -= reduction;
                reduction
            }
            _ => 0.0,
        }
    }
}
