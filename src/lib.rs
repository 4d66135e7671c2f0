//! Capital Gains - stochastic after-tax portfolio projections
//!
//! This library provides:
//! - Conversion of annual CAGR and volatility to per-period figures
//! - Period-by-period stochastic growth with injectable return sources
//! - Annual settlement under progressive brackets with loss carry-forward
//! - Capacity ceilings that skim capital once a strategy is full
//! - Parallel, reproducibly seeded batches of independent portfolios

pub mod error;
pub mod portfolio;
pub mod projection;
pub mod scenario;
pub mod tax;

// Re-export commonly used types
pub use error::{Result, SimulationError};
pub use portfolio::Portfolio;
pub use projection::{CompoundFrequency, SimulationConfig, SimulationEngine, SimulationResult};
pub use scenario::ScenarioRunner;
pub use tax::TaxSchedule;
