//! Presentation adapters turning computed plans into text or JSON.
//!
//! The sizing engine never depends on this module; presenters only consume
//! plain data through [`PresentedPlan`].

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::sizing::types::{InstallationPlan, Scenario};

/// Everything a presenter may show about one calculation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PresentedPlan<'a> {
    pub plan: &'a InstallationPlan,
    pub scenarios: &'a [Scenario],
    /// Index into `scenarios` of the highlighted scenario.
    pub selected: Option<usize>,
    pub green_score: Option<u32>,
}

impl<'a> PresentedPlan<'a> {
    pub fn new(plan: &'a InstallationPlan) -> Self {
        Self {
            plan,
            scenarios: &[],
            selected: None,
            green_score: None,
        }
    }

    pub fn with_scenarios(mut self, scenarios: &'a [Scenario], selected: usize) -> Self {
        self.scenarios = scenarios;
        self.selected = Some(selected);
        self
    }

    pub fn with_green_score(mut self, score: u32) -> Self {
        self.green_score = Some(score);
        self
    }
}

/// Renders a [`PresentedPlan`] to a byte sink.
pub trait PlanPresenter {
    /// # Errors
    ///
    /// Returns an `io::Error` if writing fails.
    fn present(&self, view: &PresentedPlan<'_>, out: &mut dyn Write) -> io::Result<()>;
}

/// Human-readable summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPresenter;

impl PlanPresenter for TextPresenter {
    fn present(&self, view: &PresentedPlan<'_>, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", PlanReport(view.plan))?;
        if !view.scenarios.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", ScenarioTable::new(view.scenarios, view.selected))?;
        }
        if let Some(score) = view.green_score {
            writeln!(out)?;
            writeln!(
                out,
                "Green score: {score}/100 (+{} from this plan)",
                view.plan.green_score_delta
            )?;
        }
        Ok(())
    }
}

/// Pretty-printed JSON of the whole view.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPresenter;

impl PlanPresenter for JsonPresenter {
    fn present(&self, view: &PresentedPlan<'_>, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, view)?;
        writeln!(out)
    }
}

/// `Display` wrapper printing one plan as a report block.
pub struct PlanReport<'a>(pub &'a InstallationPlan);

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "--- Solar Plan ---")?;
        writeln!(f, "Panels:             {}", p.panel_count)?;
        writeln!(f, "Installed capacity: {:.2} kWp", p.capacity_kwp)?;
        writeln!(f, "Production:         {} kWh/month", p.monthly_production_kwh)?;
        writeln!(f, "Coverage:           {}%", p.coverage_pct)?;
        writeln!(f, "Installation cost:  ~{} €", p.installation_cost_eur)?;
        writeln!(
            f,
            "Savings:            ~{} €/month, ~{} €/year",
            p.monthly_savings_eur, p.annual_savings_eur
        )?;
        writeln!(f, "Payback:            {}", p.payback)?;
        match p.break_even_year() {
            Some(year) => writeln!(f, "Break-even:         year {year}")?,
            None => writeln!(f, "Break-even:         not within {} years", horizon(p))?,
        }
        writeln!(f, "CO2 avoided:        ~{:.2} t/year", p.co2_avoided_tonnes_per_year)?;
        writeln!(f, "Tree equivalents:   {} trees/year", p.tree_equivalents)?;
        write!(f, "Green score bonus:  +{} points", p.green_score_delta)
    }
}

fn horizon(plan: &InstallationPlan) -> u32 {
    plan.payback_timeline.last().map_or(0, |p| p.year)
}

/// `Display` wrapper printing the scenario comparison, marking the selection.
pub struct ScenarioTable<'a> {
    scenarios: &'a [Scenario],
    selected: Option<usize>,
}

impl<'a> ScenarioTable<'a> {
    pub fn new(scenarios: &'a [Scenario], selected: Option<usize>) -> Self {
        Self {
            scenarios,
            selected,
        }
    }
}

impl fmt::Display for ScenarioTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {:<12} {:>8} {:>7} {:>9} {:>10} {:>10}",
            "scenario", "area m2", "panels", "coverage", "savings/y", "payback"
        )?;
        for (i, s) in self.scenarios.iter().enumerate() {
            let marker = if self.selected == Some(i) { '*' } else { ' ' };
            let payback = s
                .plan
                .payback
                .years()
                .map_or_else(|| "never".to_string(), |y| format!("{y:.1} y"));
            write!(
                f,
                "\n{marker} {:<12} {:>8.1} {:>7} {:>8}% {:>8} € {:>10}",
                s.label(),
                s.area_m2,
                s.plan.panel_count,
                s.plan.coverage_pct,
                s.plan.annual_savings_eur,
                payback
            )?;
        }
        Ok(())
    }
}
