//! Installation sizing: roof profile -> panel count -> production -> payback.

use tracing::debug;

use super::orientation::compute_orientation_efficiency;
use super::payback::build_timeline;
use super::types::{InstallationPlan, Payback, RoofProfile, Scenario, ScenarioKind};
use crate::config::{ConfigError, EngineConfig};
use crate::error::SizingError;

const MONTHS_PER_YEAR: u32 = 12;

/// Stateless sizing engine parameterized by an [`EngineConfig`].
///
/// Every computation is a pure function of the profile and the config:
/// the same input always yields the same plan.
#[derive(Debug, Clone, Default)]
pub struct SizingEngine {
    config: EngineConfig,
}

/// Intermediate quantities of a sizing run, exposed for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingBreakdown {
    pub max_panels_by_area: u32,
    pub peak_sun_hours: f64,
    /// Roof type efficiency times orientation efficiency.
    pub total_efficiency: f64,
    /// Monthly production of a single panel (kWh).
    pub production_per_panel_kwh: f64,
    pub panels_needed: u32,
    pub panel_count: u32,
}

impl SizingEngine {
    /// Creates an engine. The config is expected to have passed
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs steps 1-6 of the sizing algorithm: how many panels to install.
    ///
    /// # Errors
    ///
    /// Returns `SizingError::Validation` for non-positive area or consumption
    /// and `SizingError::Config` if the configured constants yield a
    /// non-positive production per panel.
    pub fn breakdown(&self, profile: &RoofProfile) -> Result<SizingBreakdown, SizingError> {
        profile.validate()?;
        let cfg = &self.config;

        let max_panels_by_area = floor_to_u32(profile.area_m2 / cfg.panel.area_m2);
        let peak_sun_hours = cfg.regions.peak_sun_hours(profile.region);
        let total_efficiency = cfg.roof_types.efficiency(profile.roof_type)
            * compute_orientation_efficiency(profile.azimuth_deg);
        let production_per_panel_kwh = cfg.panel.rated_kwp
            * peak_sun_hours
            * cfg.analysis.days_per_month
            * cfg.panel.performance_ratio
            * total_efficiency;

        if !(production_per_panel_kwh.is_finite() && production_per_panel_kwh > 0.0) {
            return Err(ConfigError {
                field: "panel".to_string(),
                message: format!(
                    "production per panel must be > 0, got {production_per_panel_kwh} \
                     (region {}, roof type {})",
                    profile.region, profile.roof_type
                ),
            }
            .into());
        }

        let panels_needed =
            ceil_to_u32(profile.monthly_consumption_kwh / production_per_panel_kwh);
        let panel_count = max_panels_by_area
            .min(panels_needed)
            .min(cfg.panel.max_panels);

        Ok(SizingBreakdown {
            max_panels_by_area,
            peak_sun_hours,
            total_efficiency,
            production_per_panel_kwh,
            panels_needed,
            panel_count,
        })
    }

    /// Computes the recommended installation for `profile`.
    ///
    /// A zero-panel plan (roof smaller than one panel) is a valid result: its
    /// savings are zero and its payback is [`Payback::Never`].
    ///
    /// # Errors
    ///
    /// See [`SizingEngine::breakdown`].
    pub fn compute_plan(&self, profile: &RoofProfile) -> Result<InstallationPlan, SizingError> {
        let b = self.breakdown(profile)?;
        let cfg = &self.config;
        let consumption = profile.monthly_consumption_kwh;

        let capacity_kwp = round_to(f64::from(b.panel_count) * cfg.panel.rated_kwp, 2);
        let monthly_production_kwh = checked_round_to_u32(
            "monthly_production_kwh",
            f64::from(b.panel_count) * b.production_per_panel_kwh,
        )?;
        let production = f64::from(monthly_production_kwh);

        let coverage_pct =
            round_to_u32(production / consumption * 100.0).min(cfg.analysis.coverage_cap_pct);
        let installation_cost_eur =
            checked_round_to_u32("installation_cost_eur", capacity_kwp * cfg.tariff.cost_per_kwp)?;

        // self-consumed energy only: surplus export earns nothing
        let monthly_savings_eur = checked_round_to_u32(
            "monthly_savings_eur",
            production.min(consumption) * cfg.tariff.price_per_kwh,
        )?;
        let annual_savings_eur = monthly_savings_eur
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| out_of_range("annual_savings_eur", f64::from(monthly_savings_eur) * f64::from(MONTHS_PER_YEAR)))?;
        let payback = if annual_savings_eur == 0 {
            Payback::Never
        } else {
            Payback::Years(round_to(
                f64::from(installation_cost_eur) / f64::from(annual_savings_eur),
                1,
            ))
        };

        let annual_kwh = production * f64::from(MONTHS_PER_YEAR);
        let co2_avoided_tonnes_per_year =
            round_to(annual_kwh * cfg.environment.co2_kg_per_kwh / 1000.0, 2);
        let tree_equivalents =
            checked_round_to_u32("tree_equivalents", annual_kwh / cfg.environment.kwh_per_tree_year)?;
        let green_score_delta =
            round_to_u32(f64::from(coverage_pct) / 5.0).min(cfg.analysis.green_score_delta_cap);

        let payback_timeline =
            build_timeline(installation_cost_eur, annual_savings_eur, cfg.analysis.years);

        debug!(
            panels = b.panel_count,
            max_by_area = b.max_panels_by_area,
            needed = b.panels_needed,
            per_panel_kwh = b.production_per_panel_kwh,
            coverage_pct,
            cost_eur = installation_cost_eur,
            "computed installation plan"
        );

        Ok(InstallationPlan {
            panel_count: b.panel_count,
            capacity_kwp,
            monthly_production_kwh,
            coverage_pct,
            installation_cost_eur,
            monthly_savings_eur,
            annual_savings_eur,
            payback,
            co2_avoided_tonnes_per_year,
            tree_equivalents,
            green_score_delta,
            payback_timeline,
        })
    }

    /// Roof area used for a scenario, per the configured scenario policy.
    pub fn scenario_area(&self, kind: ScenarioKind, area_m2: f64) -> f64 {
        let policy = &self.config.scenarios;
        match kind {
            ScenarioKind::Reduced => area_m2 * policy.reduced_area_factor,
            ScenarioKind::Recommended => area_m2,
            ScenarioKind::Maximal => {
                let scaled = area_m2 * policy.maximal_area_factor;
                match policy.maximal_extra_area_cap_m2 {
                    Some(cap) => scaled.min(area_m2 + cap),
                    None => scaled,
                }
            }
        }
    }

    /// Computes the reduced, recommended and maximal scenarios, in that order.
    ///
    /// Each scenario re-runs [`SizingEngine::compute_plan`] on a copy of the
    /// profile whose area is scaled; every other field is unchanged.
    ///
    /// # Errors
    ///
    /// See [`SizingEngine::breakdown`].
    pub fn compute_scenarios(&self, profile: &RoofProfile) -> Result<Vec<Scenario>, SizingError> {
        profile.validate()?;
        ScenarioKind::ALL
            .into_iter()
            .map(|kind| {
                let area_m2 = self.scenario_area(kind, profile.area_m2);
                let plan = self.compute_plan(&profile.with_area(area_m2))?;
                Ok(Scenario {
                    kind,
                    area_m2,
                    plan,
                })
            })
            .collect()
    }
}

/// Computes a plan with the default engine configuration.
///
/// # Errors
///
/// See [`SizingEngine::breakdown`].
pub fn compute_plan(profile: &RoofProfile) -> Result<InstallationPlan, SizingError> {
    SizingEngine::default().compute_plan(profile)
}

/// Computes the three standard scenarios with the default engine configuration.
///
/// # Errors
///
/// See [`SizingEngine::breakdown`].
pub fn compute_scenarios(profile: &RoofProfile) -> Result<Vec<Scenario>, SizingError> {
    SizingEngine::default().compute_scenarios(profile)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// Inputs are validated finite and non-negative; `as` saturates on overflow.
fn round_to_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Rounds a derived figure, rejecting values the plan's `u32` fields cannot hold.
fn checked_round_to_u32(field: &str, value: f64) -> Result<u32, SizingError> {
    let rounded = value.round();
    if rounded.is_finite() && rounded <= f64::from(u32::MAX) {
        Ok(rounded.max(0.0) as u32)
    } else {
        Err(out_of_range(field, rounded))
    }
}

fn out_of_range(field: &str, value: f64) -> SizingError {
    ConfigError {
        field: format!("plan.{field}"),
        message: format!(
            "{value} exceeds the supported range (max {}); check the configured constants",
            u32::MAX
        ),
    }
    .into()
}

fn floor_to_u32(value: f64) -> u32 {
    value.floor().max(0.0) as u32
}

fn ceil_to_u32(value: f64) -> u32 {
    value.ceil().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::types::{Region, RoofType};

    fn lisbon_south(area: f64, consumption: f64) -> RoofProfile {
        RoofProfile::new(area, consumption, RoofType::SouthFacingPitched, Region::Lisbon)
    }

    #[test]
    fn reference_household_breakdown() {
        let b = SizingEngine::default()
            .breakdown(&lisbon_south(40.0, 300.0))
            .expect("valid profile");
        assert_eq!(b.total_efficiency, 1.0);
        assert_eq!(b.peak_sun_hours, 4.7);
        assert!((b.production_per_panel_kwh - 45.12).abs() < 1e-9);
        assert_eq!(b.panels_needed, 7);
        assert_eq!(b.max_panels_by_area, 22);
        assert_eq!(b.panel_count, 7);
    }

    #[test]
    fn reference_household_plan() {
        let plan = compute_plan(&lisbon_south(40.0, 300.0)).expect("valid profile");
        assert_eq!(plan.panel_count, 7);
        assert_eq!(plan.capacity_kwp, 2.8);
        assert_eq!(plan.monthly_production_kwh, 316);
        assert_eq!(plan.coverage_pct, 105);
        assert_eq!(plan.installation_cost_eur, 5040);
        assert_eq!(plan.monthly_savings_eur, 56);
        assert_eq!(plan.annual_savings_eur, 672);
        assert_eq!(plan.payback, Payback::Years(7.5));
        assert_eq!(plan.co2_avoided_tonnes_per_year, 0.88);
        assert_eq!(plan.tree_equivalents, 172);
        // 105 / 5 = 21, capped
        assert_eq!(plan.green_score_delta, 20);
        assert_eq!(plan.payback_timeline.len(), 16);
        assert_eq!(plan.break_even_year(), Some(8));
    }

    #[test]
    fn savings_capped_at_consumption() {
        // 3 panels in the Algarve yield ~150 kWh against 100 kWh consumed
        let p = RoofProfile::new(100.0, 100.0, RoofType::SouthFacingPitched, Region::AlentejoAlgarve);
        let plan = compute_plan(&p).expect("valid profile");
        assert_eq!(plan.monthly_savings_eur, 19); // round(100 * 0.187)
    }

    #[test]
    fn absolute_panel_cap() {
        let plan = compute_plan(&lisbon_south(500.0, 5000.0)).expect("valid profile");
        assert_eq!(plan.panel_count, 20);
    }

    #[test]
    fn roof_smaller_than_one_panel_gives_zero_panel_plan() {
        let plan = compute_plan(&lisbon_south(1.0, 300.0)).expect("valid profile");
        assert_eq!(plan.panel_count, 0);
        assert_eq!(plan.monthly_production_kwh, 0);
        assert_eq!(plan.annual_savings_eur, 0);
        assert_eq!(plan.payback, Payback::Never);
        assert_eq!(plan.break_even_year(), None);
        assert!(plan.payback_timeline.iter().all(|p| p.balance_eur == 0));
    }

    #[test]
    fn tiny_consumption_needs_one_panel() {
        let plan = compute_plan(&lisbon_south(40.0, 0.5)).expect("valid profile");
        assert_eq!(plan.panel_count, 1);
        assert_eq!(plan.coverage_pct, 150);
    }

    #[test]
    fn rejects_non_positive_inputs() {
        assert!(matches!(
            compute_plan(&lisbon_south(-5.0, 300.0)),
            Err(SizingError::Validation { field: "area_m2", .. })
        ));
        assert!(matches!(
            compute_plan(&lisbon_south(40.0, 0.0)),
            Err(SizingError::Validation {
                field: "monthly_consumption_kwh",
                ..
            })
        ));
    }

    #[test]
    fn zero_region_constant_is_config_error() {
        let mut cfg = EngineConfig::default();
        cfg.regions.lisbon = 0.0;
        let err = SizingEngine::new(cfg)
            .compute_plan(&lisbon_south(40.0, 300.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::Config(_)));
    }

    #[test]
    fn oversized_tariff_is_config_error() {
        let mut cfg = EngineConfig::default();
        cfg.tariff.price_per_kwh = 2e6;
        assert!(cfg.validate().is_empty());
        let err = SizingEngine::new(cfg)
            .compute_plan(&lisbon_south(40.0, 300.0))
            .err();
        assert!(matches!(err, Some(SizingError::Config(_))), "{err:?}");

        let mut cfg = EngineConfig::default();
        cfg.tariff.cost_per_kwp = 1e10;
        let err = SizingEngine::new(cfg)
            .compute_plan(&lisbon_south(40.0, 300.0))
            .err();
        match err {
            Some(SizingError::Config(e)) => assert_eq!(e.field, "plan.installation_cost_eur"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn largest_representable_savings_still_compute() {
        // 316 kWh * 1e6 €/kWh = 3.16e8 €/month, * 12 still fits in u32
        let mut cfg = EngineConfig::default();
        cfg.tariff.price_per_kwh = 1e6;
        cfg.tariff.cost_per_kwp = 1e6;
        let plan = SizingEngine::new(cfg)
            .compute_plan(&lisbon_south(40.0, 300.0))
            .expect("in range");
        assert_eq!(plan.monthly_savings_eur, 300_000_000);
        assert_eq!(plan.annual_savings_eur, 3_600_000_000);
        assert_eq!(plan.installation_cost_eur, 2_800_000);
    }

    #[test]
    fn north_facing_roof_needs_more_panels() {
        let south = compute_plan(&lisbon_south(60.0, 300.0)).expect("valid");
        let north = compute_plan(
            &RoofProfile::new(60.0, 300.0, RoofType::NorthFacingPitched, Region::Lisbon)
                .with_azimuth(0.0),
        )
        .expect("valid");
        assert!(north.panel_count > south.panel_count);
    }

    #[test]
    fn scenarios_scale_area() {
        let scenarios = compute_scenarios(&lisbon_south(40.0, 300.0)).expect("valid");
        let kinds: Vec<_> = scenarios.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ScenarioKind::ALL.to_vec());
        assert!((scenarios[0].area_m2 - 22.0).abs() < 1e-9);
        assert_eq!(scenarios[1].area_m2, 40.0);
        assert_eq!(scenarios[2].area_m2, 60.0);
    }

    #[test]
    fn clamped_policy_limits_maximal_area() {
        let engine = SizingEngine::new(EngineConfig::clamped());
        // 100 * 1.5 = 150 > 100 + 30
        assert_eq!(engine.scenario_area(ScenarioKind::Maximal, 100.0), 130.0);
        // 40 * 1.5 = 60 < 40 + 30
        assert_eq!(engine.scenario_area(ScenarioKind::Maximal, 40.0), 60.0);
    }

    #[test]
    fn scenarios_share_non_area_fields() {
        let profile = lisbon_south(30.0, 450.0).with_azimuth(135.0);
        let engine = SizingEngine::default();
        let scenarios = engine.compute_scenarios(&profile).expect("valid");
        let direct = engine
            .compute_plan(&profile.with_area(scenarios[0].area_m2))
            .expect("valid");
        assert_eq!(scenarios[0].plan, direct);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_to(2.8000000000000003, 2), 2.8);
        assert_eq!(round_to(0.883536, 2), 0.88);
        assert_eq!(round_to_u32(315.84), 316);
        assert_eq!(ceil_to_u32(6.65), 7);
        assert_eq!(floor_to_u32(22.857), 22);
    }
}
