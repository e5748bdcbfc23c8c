//! solar-match entry point: CLI wiring, config loading and report output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use solar_match::chart::SvgPaybackChart;
use solar_match::cli::{self, CliOptions, OutputFormat};
use solar_match::config::EngineConfig;
use solar_match::green_score::{ImpactSummary, ScoreHistory};
use solar_match::io::export::{export_payback_csv, export_scenarios_csv};
use solar_match::report::{JsonPresenter, PlanPresenter, PlanReport, PresentedPlan, TextPresenter};
use solar_match::session::SolarSession;
use solar_match::sizing::SizingEngine;
use solar_match::sizing::orientation::orientation_label;
use solar_match::sizing::types::RoofProfile;
use solar_match::store::{JsonFileStore, KeyValueStore, MemoryStore};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };

    let config = load_config(&opts);
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    debug!(preset = opts.preset.as_deref(), "engine config loaded");
    let engine = SizingEngine::new(config);

    let result = match opts.store {
        Some(ref path) => match JsonFileStore::open(path) {
            Ok(store) => run(engine, store, &opts),
            Err(e) => {
                eprintln!("error: failed to open store {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => run(engine, MemoryStore::new(), &opts),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn load_config(opts: &CliOptions) -> EngineConfig {
    let loaded = match (&opts.config, &opts.preset) {
        (Some(path), _) => EngineConfig::from_toml_file(path),
        (None, Some(name)) => EngineConfig::from_preset(name),
        (None, None) => Ok(EngineConfig::default()),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    })
}

/// Builds the roof profile from `--profile` or the individual flags.
fn build_profile(opts: &CliOptions) -> Result<RoofProfile, String> {
    let mut profile = if let Some(ref path) = opts.profile {
        RoofProfile::from_toml_file(path).map_err(|e| e.to_string())?
    } else {
        let a = &opts.profile_args;
        let area = a.area_m2.ok_or("--area is required without --profile")?;
        let consumption = a
            .consumption_kwh
            .ok_or("--consumption is required without --profile")?;
        let roof = a.roof_type.ok_or("--roof is required without --profile")?;
        let region = a.region.ok_or("--region is required without --profile")?;
        RoofProfile::new(area, consumption, roof, region)
    };
    if let Some(azimuth) = opts.azimuth_deg {
        profile = profile.with_azimuth(azimuth);
    }
    Ok(profile)
}

fn run<S: KeyValueStore>(
    engine: SizingEngine,
    store: S,
    opts: &CliOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = SolarSession::open(engine, store)?;

    if opts.show_saved {
        let summary =
            ImpactSummary::compute(session.green_score(), session.base_score(), session.current_plan());
        match session.current_plan() {
            Some(plan) => println!("{}", PlanReport(plan)),
            None => println!("No saved plan."),
        }
        println!("\n{summary}");
        print_history(&ScoreHistory::with_current(session.green_score()));
        return Ok(());
    }

    let profile = build_profile(opts)?;
    session.set_azimuth(profile.azimuth_deg);
    session.calculate(&profile)?;
    session.select_kind(opts.select);
    info!(selected = opts.select.label(), "scenario selected");

    let Some(plan) = session.displayed_plan() else {
        return Ok(());
    };
    let view = PresentedPlan::new(plan)
        .with_scenarios(session.scenarios(), session.selected_index())
        .with_green_score(session.green_score());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match opts.format {
        OutputFormat::Text => {
            writeln!(out, "Orientation: {}\n", orientation_label(session.azimuth_deg()))?;
            TextPresenter.present(&view, &mut out)?;
            let summary =
                ImpactSummary::compute(session.green_score(), session.base_score(), session.current_plan());
            writeln!(out, "\n{summary}")?;
        }
        OutputFormat::Json => JsonPresenter.present(&view, &mut out)?,
    }

    if let Some(ref path) = opts.payback_out {
        export_payback_csv(&plan.payback_timeline, path)?;
        eprintln!("Payback timeline written to {}", path.display());
    }
    if let Some(ref path) = opts.scenarios_out {
        export_scenarios_csv(session.scenarios(), path)?;
        eprintln!("Scenarios written to {}", path.display());
    }
    if let Some(ref path) = opts.chart_out {
        write_chart(&view, path)?;
        eprintln!("Payback chart written to {}", path.display());
    }
    Ok(())
}

/// Prints the monthly score history as a bar chart, 2% of the best month per block.
fn print_history(history: &ScoreHistory) {
    println!();
    for (month, width) in history.months.iter().zip(history.bar_widths_pct()) {
        println!(
            "{:<4} {:>3} {}",
            month.month,
            month.score,
            "#".repeat((width / 2) as usize)
        );
    }
}

fn write_chart(view: &PresentedPlan<'_>, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    SvgPaybackChart.present(view, &mut out)?;
    out.flush()
}
