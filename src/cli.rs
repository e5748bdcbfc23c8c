use std::env;
use std::path::PathBuf;

use crate::sizing::types::{Region, RoofType, ScenarioKind};

/// Output format of the main report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Profile fields given individually on the command line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileArgs {
    pub area_m2: Option<f64>,
    pub consumption_kwh: Option<f64>,
    pub roof_type: Option<RoofType>,
    pub region: Option<Region>,
}

impl ProfileArgs {
    fn is_empty(&self) -> bool {
        self.area_m2.is_none()
            && self.consumption_kwh.is_none()
            && self.roof_type.is_none()
            && self.region.is_none()
    }
}

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub profile: Option<PathBuf>,
    pub profile_args: ProfileArgs,
    pub azimuth_deg: Option<f64>,
    pub store: Option<PathBuf>,
    pub format: OutputFormat,
    pub payback_out: Option<PathBuf>,
    pub scenarios_out: Option<PathBuf>,
    pub chart_out: Option<PathBuf>,
    pub show_saved: bool,
    pub select: ScenarioKind,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut profile = None;
    let mut profile_args = ProfileArgs::default();
    let mut azimuth_deg = None;
    let mut store = None;
    let mut format = None;
    let mut payback_out = None;
    let mut scenarios_out = None;
    let mut chart_out = None;
    let mut show_saved = false;
    let mut select = None;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                set_once(&mut config, flag, PathBuf::from(path))?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut preset, flag, name.to_string())?;
            }
            "--profile" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --profile (expected a TOML file path)")?;
                set_once(&mut profile, flag, PathBuf::from(path))?;
            }
            "--area" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --area (expected m²)")?;
                set_once(&mut profile_args.area_m2, flag, parse_number(flag, v)?)?;
            }
            "--consumption" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --consumption (expected kWh/month)")?;
                set_once(&mut profile_args.consumption_kwh, flag, parse_number(flag, v)?)?;
            }
            "--roof" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --roof (expected a roof type)")?;
                let roof = v.parse::<RoofType>().map_err(|e| e.message)?;
                set_once(&mut profile_args.roof_type, flag, roof)?;
            }
            "--region" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --region (expected a region)")?;
                let region = v.parse::<Region>().map_err(|e| e.message)?;
                set_once(&mut profile_args.region, flag, region)?;
            }
            "--azimuth" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --azimuth (expected degrees)")?;
                set_once(&mut azimuth_deg, flag, parse_number(flag, v)?)?;
            }
            "--store" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --store (expected a JSON file path)")?;
                set_once(&mut store, flag, PathBuf::from(path))?;
            }
            "--format" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --format (expected text or json)")?;
                let f = match v {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    other => return Err(format!("invalid --format \"{other}\" (expected text or json)")),
                };
                set_once(&mut format, flag, f)?;
            }
            "--payback-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --payback-out (expected a file path)")?;
                set_once(&mut payback_out, flag, PathBuf::from(path))?;
            }
            "--scenarios-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenarios-out (expected a file path)")?;
                set_once(&mut scenarios_out, flag, PathBuf::from(path))?;
            }
            "--chart-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --chart-out (expected a file path)")?;
                set_once(&mut chart_out, flag, PathBuf::from(path))?;
            }
            "--select" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --select (expected a scenario name)")?;
                set_once(&mut select, flag, v.parse::<ScenarioKind>()?)?;
            }
            "--show-saved" => {
                show_saved = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if profile.is_some() && !profile_args.is_empty() {
        return Err(
            "`--profile` cannot be combined with --area/--consumption/--roof/--region".to_string(),
        );
    }
    if config.is_none() && preset.is_none() {
        preset = Some("default".to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        profile,
        profile_args,
        azimuth_deg,
        store,
        format: format.unwrap_or_default(),
        payback_out,
        scenarios_out,
        chart_out,
        show_saved,
        select: select.unwrap_or(ScenarioKind::Recommended),
    })
}

fn set_once<T>(slot: &mut Option<T>, flag: &str, value: T) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_number(flag: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("{flag} value \"{value}\" is not a number"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("solar-match: size a rooftop PV installation and project its payback");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  solar-match [--config <path> | --preset <name>]");
    eprintln!("              [--profile <path> | --area <m2> --consumption <kWh> --roof <type> --region <region>]");
    eprintln!("              [--azimuth <deg>] [--store <path>] [--format text|json]");
    eprintln!("              [--payback-out <csv>] [--scenarios-out <csv>] [--chart-out <svg>]");
    eprintln!("              [--select reduced|recommended|maximal] [--show-saved]");
    eprintln!();
    eprintln!("Roof types: south-facing-pitched, mixed, flat, north-facing-pitched");
    eprintln!("Regions:    north, center, lisbon, alentejo-algarve");
    eprintln!("Presets:    default, clamped");
    eprintln!();
    eprintln!("Log verbosity follows RUST_LOG (default: warn).");
}
