//! Gamified sustainability score: award rule, monthly history and impact figures.

use std::fmt;

use serde::Serialize;

use crate::sizing::types::InstallationPlan;

/// Upper bound of the green score.
pub const MAX_SCORE: u32 = 100;

/// CO₂ saved per score point per month (kg).
const CO2_KG_PER_POINT: f64 = 0.17;
/// CO₂ absorbed by one tree per month (kg).
const CO2_KG_PER_TREE: f64 = 3.8;
/// Share of neighbours beaten per score point.
const PERCENTILE_PER_POINT: f64 = 0.93;
const MAX_PERCENTILE: u32 = 99;

/// Score after applying `delta` to `base`, clamped to 100.
///
/// ```
/// use solar_match::green_score::score_after;
///
/// assert_eq!(score_after(73, 20), 93);
/// assert_eq!(score_after(90, 20), 100);
/// ```
pub fn score_after(base: u32, delta: u32) -> u32 {
    base.saturating_add(delta).min(MAX_SCORE)
}

/// One month of the score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyScore {
    pub month: &'static str,
    pub score: u32,
}

/// Six-month score history whose latest month tracks the current score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreHistory {
    pub months: Vec<MonthlyScore>,
}

const HISTORY_TEMPLATE: [(&str, u32); 5] = [
    ("Sep", 52),
    ("Oct", 58),
    ("Nov", 61),
    ("Dec", 65),
    ("Jan", 69),
];

impl ScoreHistory {
    /// Builds the history with `current` as the latest month (February).
    pub fn with_current(current: u32) -> Self {
        let mut months: Vec<MonthlyScore> = HISTORY_TEMPLATE
            .iter()
            .map(|&(month, score)| MonthlyScore { month, score })
            .collect();
        months.push(MonthlyScore {
            month: "Feb",
            score: current.min(MAX_SCORE),
        });
        Self { months }
    }

    /// Bar widths relative to the best month, in whole percent.
    pub fn bar_widths_pct(&self) -> Vec<u32> {
        let max = self.months.iter().map(|m| m.score).max().unwrap_or(0);
        if max == 0 {
            return vec![0; self.months.len()];
        }
        self.months
            .iter()
            .map(|m| (f64::from(m.score) / f64::from(max) * 100.0).round() as u32)
            .collect()
    }
}

/// Environmental impact figures shown next to the score gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub score: u32,
    /// CO₂ saved this month (kg, one decimal), including any solar plan.
    pub co2_saved_kg: f64,
    /// Trees needed to absorb the same CO₂ (one decimal).
    pub tree_equivalents: f64,
    /// Signed change versus the base score.
    pub delta_vs_base: i64,
    /// Share of the neighbourhood with a lower score (%).
    pub zone_percentile: u32,
    /// Panel count of the saved plan, if any.
    pub solar_panels: Option<u32>,
}

impl ImpactSummary {
    /// Computes the impact of `score`, adding the monthly CO₂ avoided by
    /// `plan` when a solar plan has been saved.
    pub fn compute(score: u32, base: u32, plan: Option<&InstallationPlan>) -> Self {
        let co2_base = round1(f64::from(score) * CO2_KG_PER_POINT);
        let co2_solar = plan.map_or(0.0, |p| p.co2_avoided_tonnes_per_year * 1000.0 / 12.0);
        let co2_saved_kg = round1(co2_base + co2_solar);
        Self {
            score,
            co2_saved_kg,
            tree_equivalents: round1(co2_saved_kg / CO2_KG_PER_TREE),
            delta_vs_base: i64::from(score) - i64::from(base),
            zone_percentile: ((f64::from(score) * PERCENTILE_PER_POINT).round() as u32)
                .min(MAX_PERCENTILE),
            solar_panels: plan.map(|p| p.panel_count),
        }
    }
}

impl fmt::Display for ImpactSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Green Score ---")?;
        writeln!(f, "Score: {}/{MAX_SCORE} ({:+} vs base)", self.score, self.delta_vs_base)?;
        writeln!(f, "Above {}% of households in your area", self.zone_percentile)?;
        writeln!(f, "CO2 saved: {:.1} kg", self.co2_saved_kg)?;
        write!(f, "Tree equivalents: {:.1}", self.tree_equivalents)?;
        if let Some(n) = self.solar_panels {
            write!(f, "\nSolar plan: {n} panels")?;
        }
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
