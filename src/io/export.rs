//! CSV export for payback timelines and scenario comparisons.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sizing::types::{PaybackPoint, Scenario};

/// Column header for the payback timeline export.
const PAYBACK_HEADER: &str = "year,investment_eur,cumulative_savings_eur,balance_eur";

/// Column header for the scenario comparison export.
const SCENARIO_HEADER: &str = "scenario,area_m2,panels,capacity_kwp,production_kwh,\
                               coverage_pct,cost_eur,annual_savings_eur,payback_years";

/// Exports a payback timeline to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_payback_csv(timeline: &[PaybackPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_payback_csv(timeline, io::BufWriter::new(file))
}

/// Writes a payback timeline as CSV to any writer, one row per year.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_payback_csv(timeline: &[PaybackPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PAYBACK_HEADER.split(','))?;
    for p in timeline {
        wtr.write_record(&[
            p.year.to_string(),
            p.investment_eur.to_string(),
            p.cumulative_savings_eur.to_string(),
            p.balance_eur.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports a scenario comparison to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_scenarios_csv(scenarios: &[Scenario], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_scenarios_csv(scenarios, io::BufWriter::new(file))
}

/// Writes a scenario comparison as CSV to any writer.
///
/// The payback cell is left empty for scenarios that never pay back.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_scenarios_csv(scenarios: &[Scenario], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SCENARIO_HEADER.split(',').map(str::trim))?;
    for s in scenarios {
        let p = &s.plan;
        wtr.write_record(&[
            s.label().to_string(),
            format!("{:.2}", s.area_m2),
            p.panel_count.to_string(),
            format!("{:.2}", p.capacity_kwp),
            p.monthly_production_kwh.to_string(),
            p.coverage_pct.to_string(),
            p.installation_cost_eur.to_string(),
            p.annual_savings_eur.to_string(),
            p.payback
                .years()
                .map(|y| format!("{y:.1}"))
                .unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
