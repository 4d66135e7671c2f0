//! Error types for portfolio simulation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Unknown compounding frequency: {0}")]
    UnknownFrequency(String),

    #[error("Growth rate must be non-zero to scale volatility to the compounding period")]
    ZeroGrowthRate,

    #[error("Years must be positive and finite, got {0}")]
    InvalidYears(f64),

    #[error("Invalid portfolio '{name}': {reason}")]
    InvalidPortfolio { name: String, reason: String },

    #[error("Invalid return distribution (mean={mean}, std_dev={std_dev})")]
    InvalidDistribution { mean: f64, std_dev: f64 },

    #[error("Invalid tax schedule: {0}")]
    InvalidSchedule(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
