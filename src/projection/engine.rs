//! Core simulation engine for stochastic after-tax portfolio projections

use log::{debug, info, warn};

use super::frequency::CompoundFrequency;
use super::rates::{self, round_cents};
use super::returns::ReturnSource;
use super::settlements::{SettlementRow, SimulationResult};
use super::state::PortfolioState;
use crate::error::{Result, SimulationError};
use crate::portfolio::Portfolio;
use crate::tax::TaxSchedule;

/// Configuration for a simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Years to project (a fractional horizon rounds up to a whole period)
    pub years: f64,

    /// Compounding frequency
    pub frequency: CompoundFrequency,

    /// Whether to keep one row per settlement
    pub detailed_output: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            years: 4.0,
            frequency: CompoundFrequency::Daily,
            detailed_output: true,
        }
    }
}

/// Main simulation engine
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    schedule: TaxSchedule,
    config: SimulationConfig,
}

impl SimulationEngine {
    /// Create a new engine with the given tax schedule and config
    pub fn new(schedule: TaxSchedule, config: SimulationConfig) -> Self {
        Self { schedule, config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn schedule(&self) -> &TaxSchedule {
        &self.schedule
    }

    /// Number of compounding periods the configured horizon covers
    ///
    /// A fractional horizon rounds up to a whole period. The small offset stops
    /// a product that float error lifts just above a whole number from gaining
    /// an extra period.
    pub fn total_periods(&self) -> u32 {
        let frequency = self.config.frequency.periods_per_year() as f64;
        (self.config.years * frequency - 1e-9).ceil().max(0.0) as u32
    }

    /// Run one trajectory for a portfolio
    ///
    /// Rates are normalized once up front, then every period draws a return,
    /// steps the portfolio, and every `frequency`-th period settles the year.
    /// Any error aborts the run without a partial result.
    pub fn simulate<S>(&self, portfolio: &Portfolio, returns: &mut S) -> Result<SimulationResult>
    where
        S: ReturnSource + ?Sized,
    {
        portfolio.validate()?;

        let years = self.config.years;
        if !years.is_finite() || years <= 0.0 {
            return Err(SimulationError::InvalidYears(years));
        }

        let frequency = self.config.frequency.periods_per_year();
        let back_test_years = portfolio.back_test_years.unwrap_or(years);
        let period_rates = rates::normalize(
            back_test_years,
            portfolio.cagr,
            portfolio.standard_deviation,
            frequency as f64,
        )?;

        info!(
            "Simulating '{}': {} years {} (period rate {:.6}, period std dev {:.6})",
            portfolio.name, years, self.config.frequency, period_rates.rate, period_rates.std_dev
        );

        let mut state = PortfolioState::from_portfolio(portfolio, period_rates, frequency);
        let mut settlements = Vec::new();
        let mut settled_gain = 0.0;
        let mut years_settled = 0;
        let mut first_negative_year = None;
        let mut year_skims = 0.0;

        for _period in 1..=self.total_periods() {
            let period_return = returns.draw_normal(state.period_rate, state.period_std_dev)?;
            let skim = state.advance_period(period_return);
            if skim > 0.0 {
                debug!("'{}' period {}: capacity skim {:.2}", portfolio.name, state.period, skim);
            }
            year_skims += skim;

            if state.at_year_end() {
                let row = self.settle_year(&mut state, year_skims);
                year_skims = 0.0;
                settled_gain += row.gain;
                years_settled += 1;

                if row.portfolio_value < 0.0 && first_negative_year.is_none() {
                    warn!(
                        "'{}' value is negative ({:.2}) after year {}",
                        portfolio.name, row.portfolio_value, row.year
                    );
                    first_negative_year = Some(row.year);
                }

                if self.config.detailed_output {
                    settlements.push(row);
                }
            }
        }

        if state.annual_gain != 0.0 {
            warn!(
                "'{}' ends mid-year; {:.2} of gain was never settled",
                portfolio.name, state.annual_gain
            );
        }

        info!(
            "'{}' finished: value {:.2}, tax {:.2}, removed {:.2}",
            portfolio.name,
            state.portfolio_value,
            state.tax_liability_accumulated,
            state.removed_funds_accumulated
        );

        Ok(SimulationResult {
            name: portfolio.name.clone(),
            period_rates,
            settlements,
            final_state: state,
            settled_gain,
            years_settled,
            first_negative_year,
        })
    }

    /// Apply year-end tax, withdrawal and capacity, then reset the gain
    fn settle_year(&self, state: &mut PortfolioState, skims_before: f64) -> SettlementRow {
        let settlement = state.tax_and_withdrawals(&self.schedule);
        state.portfolio_value = round_cents(state.portfolio_value - settlement.outflow());
        let skim = state.apply_capacity_limit();
        state.annual_gain = 0.0;

        debug!(
            "Year {}: gain {:.2}, tax {:.2}, withdrawal {:.2}, value {:.2}, carry-over {:.2}",
            state.year(),
            settlement.gain,
            settlement.assessment.tax_burden,
            settlement.withdrawal,
            state.portfolio_value,
            state.carry_over_losses
        );

        SettlementRow {
            year: state.year(),
            period: state.period,
            gain: settlement.gain,
            gross_tax: settlement.assessment.gross_tax,
            deduction_applied: settlement.assessment.deduction_applied,
            tax_burden: settlement.assessment.tax_burden,
            loss_carried_forward: settlement.assessment.loss_carried_forward,
            withdrawal: settlement.withdrawal,
            capacity_skims: skims_before + skim,
            portfolio_value: state.portfolio_value,
            carry_over_losses: state.carry_over_losses,
            tax_liability_accumulated: state.tax_liability_accumulated,
            removed_funds_accumulated: state.removed_funds_accumulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{MeanReturns, RandomReturns, ScriptedReturns};
    use approx::assert_abs_diff_eq;

    fn annual_engine(years: f64) -> SimulationEngine {
        SimulationEngine::new(
            TaxSchedule::us_2021_single(),
            SimulationConfig {
                years,
                frequency: CompoundFrequency::Annual,
                detailed_output: true,
            },
        )
    }

    #[test]
    fn test_one_year_at_mean_return() {
        let engine = annual_engine(1.0);
        let portfolio = Portfolio::new("base", 0.08, 0.15, 50_000.0, 1_000.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        // 4,000 of gain sits entirely in the 0% bracket
        let expected = 50_000.0 * 1.08 - engine.schedule().tax_on_gain(4_000.0) - 1_000.0;
        assert_abs_diff_eq!(result.portfolio_value(), expected, epsilon = 1e-6);
        assert_eq!(result.tax_liability_accumulated(), 0.0);
        assert_eq!(result.removed_funds_accumulated(), 1_000.0);
        assert_eq!(result.settlements.len(), 1);
    }

    #[test]
    fn test_one_year_taxed_gain() {
        let engine = annual_engine(1.0);
        let portfolio = Portfolio::new("larger", 0.08, 0.15, 500_000.0, 1_000.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        // (40,000 - 9,950) at 10%
        assert_abs_diff_eq!(result.tax_liability_accumulated(), 3_005.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.portfolio_value(), 535_995.0, epsilon = 1e-6);

        let summary = result.summary();
        let rate = summary.effective_tax_rate.unwrap();
        assert_abs_diff_eq!(rate, 3_005.0 / 40_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loss_year_refunds_deduction_and_carries_excess() {
        let engine = annual_engine(1.0);
        let portfolio = Portfolio::new("drawdown", 0.08, 0.15, 50_000.0, 0.0);
        let mut returns = ScriptedReturns::new(vec![-0.2]);

        let result = engine.simulate(&portfolio, &mut returns).unwrap();

        // 40,000 after the drop, plus the recognized 6,800 loss
        assert_abs_diff_eq!(result.portfolio_value(), 46_800.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.carry_over_losses(), 3_200.0, epsilon = 1e-6);
        assert_eq!(result.tax_liability_accumulated(), -6_800.0);
        assert!(result.summary().effective_tax_rate.is_none());
    }

    #[test]
    fn test_carry_over_used_in_following_year() {
        let engine = annual_engine(2.0);
        let portfolio = Portfolio::new("rebound", 0.08, 0.15, 50_000.0, 0.0);
        let mut returns = ScriptedReturns::new(vec![-0.2, 0.5]);

        let result = engine.simulate(&portfolio, &mut returns).unwrap();
        let second = &result.settlements[1];

        // 3,200 carried in, all of it deductible
        assert_abs_diff_eq!(second.deduction_applied, 3_200.0, epsilon = 1e-6);
        assert_abs_diff_eq!(second.carry_over_losses, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(second.gain, 46_800.0 * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_capacity_applied_after_settlement_and_steps() {
        let engine = annual_engine(2.0);
        let portfolio = Portfolio::new("capped", 0.2, 0.1, 90_000.0, 0.0).with_capacity(100_000.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        // Year 1: 108,000 - 805 tax, then 50,000 skimmed
        let first = &result.settlements[0];
        assert_abs_diff_eq!(first.tax_burden, 805.0, epsilon = 1e-6);
        assert_eq!(first.capacity_skims, 50_000.0);
        assert_abs_diff_eq!(first.portfolio_value, 57_195.0, epsilon = 1e-6);

        // Year 2: 57,195 grows to 68,634 and stays below capacity
        let second = &result.settlements[1];
        assert_eq!(second.capacity_skims, 0.0);
        assert_abs_diff_eq!(second.tax_burden, 148.9, epsilon = 1e-6);
        assert_abs_diff_eq!(result.portfolio_value(), 68_485.1, epsilon = 1e-6);
        assert_eq!(result.removed_funds_accumulated(), 50_000.0);
        assert_abs_diff_eq!(result.tax_liability_accumulated(), 953.9, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_value_is_not_floored() {
        let engine = annual_engine(2.0);
        let portfolio = Portfolio::new("overdrawn", 0.05, 0.1, 1_000.0, 5_000.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        assert_abs_diff_eq!(result.settlements[0].portfolio_value, -3_950.0, epsilon = 1e-6);
        assert_eq!(result.first_negative_year, Some(1));
        // Negative balance "earns" a loss, recognized against the withdrawal
        assert_abs_diff_eq!(result.settlements[1].tax_burden, -197.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.portfolio_value(), -8_950.0, epsilon = 1e-6);
        assert_eq!(result.removed_funds_accumulated(), 10_000.0);
    }

    #[test]
    fn test_monthly_settles_once_per_year() {
        let engine = SimulationEngine::new(
            TaxSchedule::us_2021_single(),
            SimulationConfig {
                years: 3.0,
                frequency: CompoundFrequency::Monthly,
                detailed_output: true,
            },
        );
        let portfolio = Portfolio::new("monthly", 0.1, 0.2, 100_000.0, 2_000.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        assert_eq!(engine.total_periods(), 36);
        assert_eq!(result.final_state.period, 36);
        assert_eq!(result.years_settled, 3);
        let periods: Vec<u32> = result.settlements.iter().map(|r| r.period).collect();
        assert_eq!(periods, vec![12, 24, 36]);
        assert_eq!(result.unsettled_gain(), 0.0);
        assert_eq!(result.removed_funds_accumulated(), 6_000.0);
    }

    #[test]
    fn test_partial_final_year_leaves_gain_unsettled() {
        let engine = SimulationEngine::new(
            TaxSchedule::us_2021_single(),
            SimulationConfig {
                years: 1.5,
                frequency: CompoundFrequency::Monthly,
                detailed_output: false,
            },
        );
        let portfolio = Portfolio::new("half", 0.1, 0.2, 100_000.0, 0.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        assert_eq!(result.final_state.period, 18);
        assert_eq!(result.years_settled, 1);
        assert!(result.settlements.is_empty());
        assert!(result.unsettled_gain() > 0.0);
    }

    #[test]
    fn test_fractional_horizon_rounds_periods_up() {
        let engine = annual_engine(1.5);
        let portfolio = Portfolio::new("annual half", 0.1, 0.2, 100_000.0, 0.0);

        let result = engine.simulate(&portfolio, &mut MeanReturns).unwrap();

        // The extra period lands on a year boundary and settles
        assert_eq!(engine.total_periods(), 2);
        assert_eq!(result.final_state.period, 2);
        assert_eq!(result.years_settled, 2);
        assert_eq!(result.unsettled_gain(), 0.0);

        let monthly = SimulationEngine::new(
            TaxSchedule::us_2021_single(),
            SimulationConfig {
                years: 1.1,
                frequency: CompoundFrequency::Monthly,
                detailed_output: false,
            },
        );
        assert_eq!(monthly.total_periods(), 14);
        assert_eq!(annual_engine(2.0).total_periods(), 2);
    }

    #[test]
    fn test_carry_over_consumed_by_limit_each_year() {
        let engine = annual_engine(3.0);
        let portfolio = Portfolio::new("slow recovery", 0.08, 0.15, 100_000.0, 0.0);
        // 16,800 loss: 6,800 recognized, 10,000 carried
        let mut returns = ScriptedReturns::new(vec![-0.168, 0.1, 0.1]);

        let result = engine.simulate(&portfolio, &mut returns).unwrap();
        let carried: Vec<f64> = result.settlements.iter().map(|r| r.carry_over_losses).collect();
        let applied: Vec<f64> = result.settlements.iter().map(|r| r.deduction_applied).collect();

        assert_abs_diff_eq!(carried[0], 10_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(applied[1], 6_800.0, epsilon = 1e-6);
        assert_abs_diff_eq!(carried[1], 3_200.0, epsilon = 1e-6);
        assert_abs_diff_eq!(applied[2], 3_200.0, epsilon = 1e-6);
        assert_abs_diff_eq!(carried[2], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.carry_over_losses(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_back_test_years_default_to_horizon() {
        let engine = SimulationEngine::new(
            TaxSchedule::us_2021_single(),
            SimulationConfig {
                years: 2.0,
                frequency: CompoundFrequency::Weekly,
                detailed_output: false,
            },
        );
        let implicit = Portfolio::new("implicit", 0.1, 0.2, 10_000.0, 0.0);
        let explicit = implicit.clone().with_back_test_years(2.0);

        let a = engine.simulate(&implicit, &mut MeanReturns).unwrap();
        let b = engine.simulate(&explicit, &mut MeanReturns).unwrap();
        assert_eq!(a.period_rates, b.period_rates);
        assert_eq!(a.portfolio_value(), b.portfolio_value());
    }

    #[test]
    fn test_annualized_inputs_untouched() {
        let engine = SimulationEngine::new(TaxSchedule::us_2021_single(), SimulationConfig::default());
        let portfolio = Portfolio::sample_portfolios().remove(0);
        let before = portfolio.clone();

        let result = engine.simulate(&portfolio, &mut RandomReturns::seeded(3)).unwrap();

        assert_eq!(portfolio, before);
        assert!(result.period_rates.rate != portfolio.cagr);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let engine = SimulationEngine::new(TaxSchedule::us_2021_single(), SimulationConfig::default());
        let portfolio = Portfolio::sample_portfolios().remove(1);

        let a = engine.simulate(&portfolio, &mut RandomReturns::seeded(99)).unwrap();
        let b = engine.simulate(&portfolio, &mut RandomReturns::seeded(99)).unwrap();

        assert_eq!(a.portfolio_value(), b.portfolio_value());
        assert_eq!(a.settlements, b.settlements);
        assert_eq!(a.settlements.len(), 4);
    }

    #[test]
    fn test_invalid_configuration_aborts() {
        let portfolio = Portfolio::new("p", 0.1, 0.2, 1_000.0, 0.0);
        assert!(matches!(
            annual_engine(0.0).simulate(&portfolio, &mut MeanReturns),
            Err(SimulationError::InvalidYears(_))
        ));

        let flat = Portfolio::new("flat", 0.0, 0.2, 1_000.0, 0.0);
        assert!(matches!(
            annual_engine(1.0).simulate(&flat, &mut MeanReturns),
            Err(SimulationError::ZeroGrowthRate)
        ));
    }
}
