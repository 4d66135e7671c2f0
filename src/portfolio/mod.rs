//! Portfolio definitions and CSV loading

mod data;
pub mod loader;

pub use data::Portfolio;
pub use loader::{load_portfolios, load_portfolios_from_reader};
