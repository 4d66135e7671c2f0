//! Load portfolio definitions from CSV
//!
//! Expected header:
//! `name,back_test_years,cagr,standard_deviation,initial_investment,annual_withdrawal,capacity`
//!
//! `back_test_years` and `capacity` may be left empty.

use super::Portfolio;
use crate::error::Result;
use csv::Reader;
use std::path::Path;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    back_test_years: Option<f64>,
    cagr: f64,
    standard_deviation: f64,
    initial_investment: f64,
    #[serde(default)]
    annual_withdrawal: f64,
    capacity: Option<f64>,
}

impl CsvRow {
    fn to_portfolio(self) -> Result<Portfolio> {
        let portfolio = Portfolio {
            name: self.name.trim().to_string(),
            back_test_years: self.back_test_years,
            cagr: self.cagr,
            standard_deviation: self.standard_deviation,
            initial_investment: self.initial_investment,
            annual_withdrawal: self.annual_withdrawal,
            capacity: self.capacity,
        };
        portfolio.validate()?;
        Ok(portfolio)
    }
}

/// Load all portfolios from a CSV file
pub fn load_portfolios<P: AsRef<Path>>(path: P) -> Result<Vec<Portfolio>> {
    let reader = Reader::from_path(path)?;
    collect_rows(reader)
}

/// Load portfolios from any reader (e.g., string buffer, stdin)
pub fn load_portfolios_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Portfolio>> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<Portfolio>> {
    let mut portfolios = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        portfolios.push(row.to_portfolio()?);
    }

    log::debug!("Loaded {} portfolios", portfolios.len());
    Ok(portfolios)
}
