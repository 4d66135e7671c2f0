//! Capital Gains CLI
//!
//! Projects one stochastic trajectory per portfolio and reports terminal
//! value, accumulated tax and removed funds.

use anyhow::{Context, Result};
use capital_gains::portfolio::load_portfolios;
use capital_gains::projection::{CompoundFrequency, SimulationConfig, SimulationResult};
use capital_gains::{Portfolio, ScenarioRunner};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "capital_gains",
    about = "Stochastic after-tax portfolio projection with loss carry-forward and capacity limits"
)]
struct Cli {
    #[arg(long, default_value_t = 4.0, help = "Years to project")]
    years: f64,

    #[arg(
        long,
        default_value = "Daily",
        help = "Compounding frequency: Annual, Semi-Annual, Monthly, Weekly or Daily"
    )]
    frequency: CompoundFrequency,

    #[arg(long, help = "Seed for reproducible runs; omitted means OS entropy")]
    seed: Option<u64>,

    #[arg(long, help = "CSV of portfolios; defaults to the two built-in sample portfolios")]
    portfolios: Option<PathBuf>,

    #[arg(long, help = "Print summaries as JSON instead of a table")]
    json: bool,

    #[arg(long, help = "Write every annual settlement to this CSV file")]
    trace_csv: Option<PathBuf>,
}

/// Settlement row tagged with its portfolio for the trace file
#[derive(Serialize)]
struct TraceRow<'a> {
    portfolio: &'a str,
    year: u32,
    period: u32,
    gain: f64,
    gross_tax: f64,
    deduction_applied: f64,
    tax_burden: f64,
    loss_carried_forward: f64,
    withdrawal: f64,
    capacity_skims: f64,
    portfolio_value: f64,
    carry_over_losses: f64,
    tax_liability_accumulated: f64,
    removed_funds_accumulated: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let portfolios = match &cli.portfolios {
        Some(path) => load_portfolios(path)
            .with_context(|| format!("Failed to load portfolios from {}", path.display()))?,
        None => Portfolio::sample_portfolios(),
    };

    let config = SimulationConfig {
        years: cli.years,
        frequency: cli.frequency,
        detailed_output: cli.trace_csv.is_some(),
    };

    let mut runner = ScenarioRunner::new(config);
    if let Some(seed) = cli.seed {
        runner = runner.with_seed(seed);
    }

    let results = runner.run_batch(&portfolios).context("Simulation failed")?;

    if let Some(path) = &cli.trace_csv {
        write_trace(path, &results)?;
    }

    if cli.json {
        let summaries: Vec<_> = results.iter().map(|r| r.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("Capital Gains Simulator v0.1.0");
    println!("==============================\n");
    println!("Horizon: {} years, {} compounding\n", cli.years, cli.frequency);

    println!("{:<20} {:>16} {:>14} {:>14} {:>12} {:>10}",
        "Portfolio", "Final Value", "Tax", "Removed", "Carry-over", "Eff. Rate");
    println!("{}", "-".repeat(91));

    for result in &results {
        let summary = result.summary();
        let rate = summary
            .effective_tax_rate
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        println!("{:<20} {:>16.2} {:>14.2} {:>14.2} {:>12.2} {:>10}",
            summary.name,
            summary.final_value,
            summary.total_tax,
            summary.total_removed,
            summary.carry_over_losses,
            rate,
        );
        if summary.unsettled_gain != 0.0 {
            println!("  ({:.2} of gain accrued after the last settlement)", summary.unsettled_gain);
        }
        if let Some(year) = result.first_negative_year {
            println!("  (value first went negative in year {})", year);
        }
    }

    if let Some(path) = &cli.trace_csv {
        println!("\nSettlements written to: {}", path.display());
    }

    Ok(())
}

fn write_trace(path: &Path, results: &[SimulationResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create {}", path.display()))?;

    for result in results {
        for row in &result.settlements {
            writer.serialize(TraceRow {
                portfolio: &result.name,
                year: row.year,
                period: row.period,
                gain: row.gain,
                gross_tax: row.gross_tax,
                deduction_applied: row.deduction_applied,
                tax_burden: row.tax_burden,
                loss_carried_forward: row.loss_carried_forward,
                withdrawal: row.withdrawal,
                capacity_skims: row.capacity_skims,
                portfolio_value: row.portfolio_value,
                carry_over_losses: row.carry_over_losses,
                tax_liability_accumulated: row.tax_liability_accumulated,
                removed_funds_accumulated: row.removed_funds_accumulated,
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}
