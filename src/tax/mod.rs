//! Annual tax assessment on realized gains

mod schedule;

pub use schedule::{TaxAssessment, TaxBracket, TaxSchedule, DEFAULT_DEDUCTION_LIMIT};
