//! Simulation engine for stochastic after-tax portfolio projections

mod engine;
mod frequency;
mod rates;
mod returns;
mod settlements;
mod state;

pub use engine::{SimulationConfig, SimulationEngine};
pub use frequency::CompoundFrequency;
pub use rates::{normalize, PeriodRates};
pub use returns::{MeanReturns, RandomReturns, ReturnSource, ScriptedReturns};
pub use settlements::{SettlementRow, SimulationResult, SimulationSummary};
pub use state::{PortfolioState, Settlement};
