//! Progressive bracket schedule with an annual loss deduction limit

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Annual cap on recognized losses under the built-in schedule
pub const DEFAULT_DEDUCTION_LIMIT: f64 = 6800.0;

/// One bracket: `rate` applies to the slice of gain between `threshold`
/// and the next bracket's threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

impl TaxBracket {
    pub const fn new(threshold: f64, rate: f64) -> Self {
        Self { threshold, rate }
    }
}

/// Outcome of taxing one year's net gain against a carry-over balance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TaxAssessment {
    /// Bracket tax before any deduction (zero for a loss year)
    pub gross_tax: f64,
    /// Carried-over loss consumed this year
    pub deduction_applied: f64,
    /// Net burden; negative when a loss is recognized
    pub tax_burden: f64,
    /// Loss in excess of the deduction limit, deferred to later years
    pub loss_carried_forward: f64,
}

/// Ordered bracket table plus deduction limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSchedule {
    brackets: Vec<TaxBracket>,
    deduction_limit: f64,
}

impl TaxSchedule {
    /// Build a schedule, checking that thresholds start at zero and ascend
    pub fn new(brackets: Vec<TaxBracket>, deduction_limit: f64) -> Result<Self> {
        let first = brackets
            .first()
            .ok_or_else(|| SimulationError::InvalidSchedule("no brackets".to_string()))?;
        if first.threshold != 0.0 {
            return Err(SimulationError::InvalidSchedule(format!(
                "first threshold must be 0, got {}",
                first.threshold
            )));
        }
        for pair in brackets.windows(2) {
            if !(pair[1].threshold > pair[0].threshold) {
                return Err(SimulationError::InvalidSchedule(format!(
                    "thresholds must ascend ({} then {})",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }
        if let Some(bad) = brackets.iter().find(|b| !(0.0..=1.0).contains(&b.rate)) {
            return Err(SimulationError::InvalidSchedule(format!(
                "rate {} at threshold {} is outside [0, 1]",
                bad.rate, bad.threshold
            )));
        }
        if !deduction_limit.is_finite() || deduction_limit < 0.0 {
            return Err(SimulationError::InvalidSchedule(format!(
                "deduction limit must be non-negative, got {}",
                deduction_limit
            )));
        }

        Ok(Self { brackets, deduction_limit })
    }

    /// US 2021 single-filer ordinary brackets with the first 9,950 untaxed
    ///
    /// Each rate is shifted one bracket up from the published table: the
    /// 10% rate starts at 9,950 and the top bracket above 523,600 is taxed at
    /// 35%, so the published 37% rate never applies. Totals run below a
    /// schedule that taxes the first 9,950 at 10% and the top slice at 37%.
    pub fn us_2021_single() -> Self {
        Self {
            brackets: vec![
                TaxBracket::new(0.0, 0.0),
                TaxBracket::new(9_950.0, 0.10),
                TaxBracket::new(40_525.0, 0.12),
                TaxBracket::new(86_375.0, 0.22),
                TaxBracket::new(164_925.0, 0.24),
                TaxBracket::new(209_425.0, 0.32),
                TaxBracket::new(523_600.0, 0.35),
            ],
            deduction_limit: DEFAULT_DEDUCTION_LIMIT,
        }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn deduction_limit(&self) -> f64 {
        self.deduction_limit
    }

    /// Progressive tax on a non-negative gain; zero for losses
    pub fn tax_on_gain(&self, gain: f64) -> f64 {
        if gain <= 0.0 {
            return 0.0;
        }

        let mut tax = 0.0;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if gain <= bracket.threshold {
                break;
            }
            let upper = self
                .brackets
                .get(i + 1)
                .map(|b| b.threshold)
                .unwrap_or(f64::INFINITY);
            tax += (gain.min(upper) - bracket.threshold) * bracket.rate;
        }
        tax
    }

    /// Tax one year's net gain given the losses carried into the year
    ///
    /// Gains consume up to `deduction_limit` of carry-over. Losses are
    /// recognized up to `deduction_limit`; the excess is carried forward.
    pub fn assess(&self, gain: f64, carry_over_losses: f64) -> TaxAssessment {
        if gain >= 0.0 {
            let gross_tax = self.tax_on_gain(gain);
            let deduction_applied = if carry_over_losses > 0.0 {
                self.deduction_limit.min(carry_over_losses)
            } else {
                0.0
            };
            TaxAssessment {
                gross_tax,
                deduction_applied,
                tax_burden: gross_tax - deduction_applied,
                loss_carried_forward: 0.0,
            }
        } else {
            let loss = gain.abs();
            TaxAssessment {
                gross_tax: 0.0,
                deduction_applied: 0.0,
                tax_burden: gain.max(-self.deduction_limit),
                loss_carried_forward: if loss > self.deduction_limit {
                    loss - self.deduction_limit
                } else {
                    0.0
                },
            }
        }
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self::us_2021_single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bracket_boundaries() {
        let schedule = TaxSchedule::us_2021_single();
        assert_eq!(schedule.tax_on_gain(0.0), 0.0);
        assert_eq!(schedule.tax_on_gain(9_950.0), 0.0);
        // 30,575 of gain in the 10% bracket
        assert_abs_diff_eq!(schedule.tax_on_gain(40_525.0), 3_057.50, epsilon = 1e-9);
        // plus 9,475 at 12%
        assert_abs_diff_eq!(schedule.tax_on_gain(50_000.0), 4_194.50, epsilon = 1e-9);
    }

    #[test]
    fn test_top_bracket_is_open_ended() {
        let schedule = TaxSchedule::us_2021_single();
        let expected = 30_575.0 * 0.10
            + 45_850.0 * 0.12
            + 78_550.0 * 0.22
            + 44_500.0 * 0.24
            + 314_175.0 * 0.32
            + 476_400.0 * 0.35;
        assert_abs_diff_eq!(schedule.tax_on_gain(1_000_000.0), expected, epsilon = 1e-6);
        assert_abs_diff_eq!(expected, 303_796.5, epsilon = 1e-6);
    }

    #[test]
    fn test_tax_is_monotonic_in_gain() {
        let schedule = TaxSchedule::us_2021_single();
        let mut previous = 0.0;
        for step in 0..=2_000 {
            let gain = step as f64 * 500.0;
            let tax = schedule.tax_on_gain(gain);
            assert!(tax >= previous, "tax fell from {} to {} at gain {}", previous, tax, gain);
            previous = tax;
        }
    }

    #[test]
    fn test_loss_beyond_limit_is_carried_forward() {
        let schedule = TaxSchedule::us_2021_single();
        let assessment = schedule.assess(-10_000.0, 0.0);
        assert_eq!(assessment.tax_burden, -6_800.0);
        assert_eq!(assessment.loss_carried_forward, 3_200.0);
        assert_eq!(assessment.deduction_applied, 0.0);
    }

    #[test]
    fn test_small_loss_fully_recognized() {
        let schedule = TaxSchedule::us_2021_single();
        let assessment = schedule.assess(-5_000.0, 1_000.0);
        assert_eq!(assessment.tax_burden, -5_000.0);
        assert_eq!(assessment.loss_carried_forward, 0.0);
    }

    #[test]
    fn test_carry_over_consumed_against_gain() {
        let schedule = TaxSchedule::us_2021_single();
        let gross = schedule.tax_on_gain(50_000.0);

        let assessment = schedule.assess(50_000.0, 5_000.0);
        assert_eq!(assessment.deduction_applied, 5_000.0);
        assert_abs_diff_eq!(assessment.tax_burden, gross - 5_000.0, epsilon = 1e-9);

        let capped = schedule.assess(50_000.0, 10_000.0);
        assert_eq!(capped.deduction_applied, DEFAULT_DEDUCTION_LIMIT);
    }

    #[test]
    fn test_deduction_can_turn_burden_negative() {
        let schedule = TaxSchedule::us_2021_single();
        let assessment = schedule.assess(1_000.0, 5_000.0);
        assert_eq!(assessment.gross_tax, 0.0);
        assert_eq!(assessment.tax_burden, -5_000.0);
    }

    #[test]
    fn test_custom_schedule_validation() {
        assert!(TaxSchedule::new(vec![], 0.0).is_err());
        assert!(TaxSchedule::new(vec![TaxBracket::new(100.0, 0.1)], 0.0).is_err());
        assert!(TaxSchedule::new(
            vec![TaxBracket::new(0.0, 0.1), TaxBracket::new(0.0, 0.2)],
            0.0
        )
        .is_err());
        assert!(TaxSchedule::new(vec![TaxBracket::new(0.0, 1.5)], 0.0).is_err());
        assert!(TaxSchedule::new(vec![TaxBracket::new(0.0, 0.2)], -1.0).is_err());

        let flat = TaxSchedule::new(vec![TaxBracket::new(0.0, 0.2)], 3_000.0).unwrap();
        assert_abs_diff_eq!(flat.tax_on_gain(10_000.0), 2_000.0, epsilon = 1e-9);
        assert_eq!(flat.assess(-10_000.0, 0.0).tax_burden, -3_000.0);
    }
}
