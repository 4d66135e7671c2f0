//! Conversion of annualized return statistics to per-period figures

use serde::Serialize;

use crate::error::{Result, SimulationError};

/// Growth rate and volatility scaled to one compounding period
///
/// `rate` is nominal-annual (it is divided by the frequency when applied),
/// matching how the stepper consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodRates {
    pub rate: f64,
    pub std_dev: f64,
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Round to cents
pub(crate) fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}

/// Derive the rate that, compounded `frequency` times a year over `years`,
/// reproduces the terminal multiple of `cagr` compounded annually.
///
/// Volatility is scaled by the same ratio. Both results are rounded to
/// six decimal places.
pub fn normalize(years: f64, cagr: f64, standard_deviation: f64, frequency: f64) -> Result<PeriodRates> {
    if !years.is_finite() || years <= 0.0 {
        return Err(SimulationError::InvalidYears(years));
    }
    if cagr == 0.0 {
        return Err(SimulationError::ZeroGrowthRate);
    }
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(SimulationError::UnknownFrequency(frequency.to_string()));
    }

    let net_return = (1.0 + cagr).powf(years);
    let rate = frequency * (net_return.powf(1.0 / (years * frequency)) - 1.0);
    let std_dev = standard_deviation * (rate / cagr);

    Ok(PeriodRates {
        rate: round_to(rate, 6),
        std_dev: round_to(std_dev, 6),
    })
}
