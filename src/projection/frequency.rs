//! Compounding frequency labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimulationError;

/// How often returns are applied and compounded within a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompoundFrequency {
    Annual,
    #[serde(rename = "Semi-Annual")]
    SemiAnnual,
    Monthly,
    Weekly,
    /// Trading days
    Daily,
}

impl CompoundFrequency {
    pub const ALL: [CompoundFrequency; 5] = [
        CompoundFrequency::Annual,
        CompoundFrequency::SemiAnnual,
        CompoundFrequency::Monthly,
        CompoundFrequency::Weekly,
        CompoundFrequency::Daily,
    ];

    pub fn periods_per_year(&self) -> u32 {
        match self {
            CompoundFrequency::Annual => 1,
            CompoundFrequency::SemiAnnual => 2,
            CompoundFrequency::Monthly => 12,
            CompoundFrequency::Weekly => 52,
            CompoundFrequency::Daily => 252,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundFrequency::Annual => "Annual",
            CompoundFrequency::SemiAnnual => "Semi-Annual",
            CompoundFrequency::Monthly => "Monthly",
            CompoundFrequency::Weekly => "Weekly",
            CompoundFrequency::Daily => "Daily",
        }
    }
}

impl fmt::Display for CompoundFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompoundFrequency {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompoundFrequency::ALL
            .into_iter()
            .find(|freq| freq.as_str() == s)
            .ok_or_else(|| SimulationError::UnknownFrequency(s.to_string()))
    }
}
