//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sizing::types::{Region, RoofType};

/// Longest payback horizon accepted, in years.
const MAX_ANALYSIS_YEARS: u32 = 100;

/// Top-level sizing engine configuration parsed from TOML.
///
/// All fields have defaults matching the reference tariff and panel model.
/// Load from TOML with [`EngineConfig::from_toml_file`] or use
/// [`EngineConfig::default`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Photovoltaic panel model.
    #[serde(default)]
    pub panel: PanelConfig,
    /// Electricity price and installation cost.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// CO₂ and tree-equivalence factors.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Horizon and caps for derived figures.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Area scaling for the reduced/recommended/maximal scenarios.
    #[serde(default)]
    pub scenarios: ScenarioPolicy,
    /// Gamified sustainability score.
    #[serde(default)]
    pub green_score: GreenScoreConfig,
    /// Peak sun hours per region.
    #[serde(default)]
    pub regions: RegionTable,
    /// Efficiency multiplier per roof type.
    #[serde(default)]
    pub roof_types: RoofTypeTable,
}

/// Photovoltaic panel model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Rated power of a single panel (kWp).
    pub rated_kwp: f64,
    /// Roof area taken by a single panel (m²).
    pub area_m2: f64,
    /// Derate for inverter, wiring and soiling losses (0.0-1.0].
    pub performance_ratio: f64,
    /// Absolute cap on panels per installation.
    pub max_panels: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            rated_kwp: 0.40,
            area_m2: 1.75,
            performance_ratio: 0.80,
            max_panels: 20,
        }
    }
}

/// Electricity price and installation cost.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Retail electricity price (€/kWh).
    pub price_per_kwh: f64,
    /// Turnkey installation cost (€/kWp).
    pub cost_per_kwp: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            price_per_kwh: 0.187,
            cost_per_kwp: 1800.0,
        }
    }
}

/// CO₂ and tree-equivalence factors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Grid emission factor (kg CO₂ per kWh).
    pub co2_kg_per_kwh: f64,
    /// Energy offset attributed to one tree per year (kWh).
    pub kwh_per_tree_year: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            co2_kg_per_kwh: 0.233,
            kwh_per_tree_year: 22.0,
        }
    }
}

/// Horizon and caps for derived figures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Payback timeline horizon in years (timeline has `years + 1` points).
    pub years: u32,
    /// Days per month used to turn daily yield into monthly production.
    pub days_per_month: f64,
    /// Upper bound on reported coverage (%).
    pub coverage_cap_pct: u32,
    /// Upper bound on the green-score award.
    pub green_score_delta_cap: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            years: 15,
            days_per_month: 30.0,
            coverage_cap_pct: 150,
            green_score_delta_cap: 20,
        }
    }
}

/// Area scaling applied when generating the three sizing scenarios.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioPolicy {
    /// Area multiplier for the reduced scenario.
    pub reduced_area_factor: f64,
    /// Area multiplier for the maximal scenario.
    pub maximal_area_factor: f64,
    /// When set, the maximal scenario never adds more than this many m².
    pub maximal_extra_area_cap_m2: Option<f64>,
}

impl Default for ScenarioPolicy {
    fn default() -> Self {
        Self {
            reduced_area_factor: 0.55,
            maximal_area_factor: 1.5,
            maximal_extra_area_cap_m2: None,
        }
    }
}

/// Gamified sustainability score settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GreenScoreConfig {
    /// Score of a household that never ran a simulation (0-100).
    pub base: u32,
}

impl Default for GreenScoreConfig {
    fn default() -> Self {
        Self { base: 73 }
    }
}

/// Average daily peak sun hours per region.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionTable {
    pub north: f64,
    pub center: f64,
    pub lisbon: f64,
    pub alentejo_algarve: f64,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self {
            north: 3.8,
            center: 4.2,
            lisbon: 4.7,
            alentejo_algarve: 5.2,
        }
    }
}

impl RegionTable {
    /// Peak sun hours for `region`.
    pub fn peak_sun_hours(&self, region: Region) -> f64 {
        match region {
            Region::North => self.north,
            Region::Center => self.center,
            Region::Lisbon => self.lisbon,
            Region::AlentejoAlgarve => self.alentejo_algarve,
        }
    }
}

/// Efficiency multiplier per roof type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoofTypeTable {
    pub south_facing_pitched: f64,
    pub mixed: f64,
    pub flat: f64,
    pub north_facing_pitched: f64,
}

impl Default for RoofTypeTable {
    fn default() -> Self {
        Self {
            south_facing_pitched: 1.00,
            mixed: 0.88,
            flat: 0.82,
            north_facing_pitched: 0.65,
        }
    }
}

impl RoofTypeTable {
    /// Efficiency multiplier for `roof_type`.
    pub fn efficiency(&self, roof_type: RoofType) -> f64 {
        match roof_type {
            RoofType::SouthFacingPitched => self.south_facing_pitched,
            RoofType::Mixed => self.mixed,
            RoofType::Flat => self.flat,
            RoofType::NorthFacingPitched => self.north_facing_pitched,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"panel.area_m2"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl EngineConfig {
    /// Returns the configuration with the maximal scenario capped at area + 30 m².
    pub fn clamped() -> Self {
        Self {
            scenarios: ScenarioPolicy {
                maximal_extra_area_cap_m2: Some(30.0),
                ..ScenarioPolicy::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "clamped"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "clamped" => Ok(Self::clamped()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: f64| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError::new(field, format!("must be > 0, got {value}")));
            }
        };

        let p = &self.panel;
        positive("panel.rated_kwp", p.rated_kwp);
        positive("panel.area_m2", p.area_m2);
        positive("tariff.price_per_kwh", self.tariff.price_per_kwh);
        positive("tariff.cost_per_kwp", self.tariff.cost_per_kwp);
        positive("environment.co2_kg_per_kwh", self.environment.co2_kg_per_kwh);
        positive(
            "environment.kwh_per_tree_year",
            self.environment.kwh_per_tree_year,
        );
        positive("analysis.days_per_month", self.analysis.days_per_month);

        let r = &self.regions;
        positive("regions.north", r.north);
        positive("regions.center", r.center);
        positive("regions.lisbon", r.lisbon);
        positive("regions.alentejo_algarve", r.alentejo_algarve);

        let t = &self.roof_types;
        positive("roof_types.south_facing_pitched", t.south_facing_pitched);
        positive("roof_types.mixed", t.mixed);
        positive("roof_types.flat", t.flat);
        positive("roof_types.north_facing_pitched", t.north_facing_pitched);

        let sc = &self.scenarios;
        positive("scenarios.reduced_area_factor", sc.reduced_area_factor);
        positive("scenarios.maximal_area_factor", sc.maximal_area_factor);

        if p.performance_ratio > 1.0 || !(p.performance_ratio > 0.0) {
            errors.push(ConfigError::new(
                "panel.performance_ratio",
                "must be in (0.0, 1.0]",
            ));
        }
        if p.max_panels == 0 {
            errors.push(ConfigError::new("panel.max_panels", "must be > 0"));
        }

        let a = &self.analysis;
        if a.years == 0 || a.years > MAX_ANALYSIS_YEARS {
            errors.push(ConfigError::new(
                "analysis.years",
                format!("must be in 1..={MAX_ANALYSIS_YEARS}, got {}", a.years),
            ));
        }
        if a.green_score_delta_cap > 100 {
            errors.push(ConfigError::new(
                "analysis.green_score_delta_cap",
                "must be <= 100",
            ));
        }

        if sc.reduced_area_factor > 1.0 {
            errors.push(ConfigError::new(
                "scenarios.reduced_area_factor",
                "must be <= 1.0",
            ));
        }
        if sc.maximal_area_factor < 1.0 {
            errors.push(ConfigError::new(
                "scenarios.maximal_area_factor",
                "must be >= 1.0",
            ));
        }
        if let Some(cap) = sc.maximal_extra_area_cap_m2 {
            if !(cap.is_finite() && cap >= 0.0) {
                errors.push(ConfigError::new(
                    "scenarios.maximal_extra_area_cap_m2",
                    format!("must be >= 0, got {cap}"),
                ));
            }
        }

        if self.green_score.base > 100 {
            errors.push(ConfigError::new("green_score.base", "must be <= 100"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = EngineConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = EngineConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in EngineConfig::PRESETS {
            let cfg = EngineConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn validation_bounds_analysis_horizon() {
        let mut cfg = EngineConfig::default();
        cfg.analysis.years = 1_000_000;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "analysis.years");
        cfg.analysis.years = 0;
        assert_eq!(cfg.validate().len(), 1);
    }

    #[test]
    fn clamped_preset_caps_maximal_area() {
        let cfg = EngineConfig::clamped();
        assert_eq!(cfg.scenarios.maximal_extra_area_cap_m2, Some(30.0));
        assert_eq!(EngineConfig::default().scenarios.maximal_extra_area_cap_m2, None);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[panel]
rated_kwp = 0.45
area_m2 = 2.0
performance_ratio = 0.85
max_panels = 24

[tariff]
price_per_kwh = 0.21
cost_per_kwp = 1500.0

[scenarios]
reduced_area_factor = 0.5
maximal_area_factor = 2.0
maximal_extra_area_cap_m2 = 25.0

[regions]
lisbon = 4.9

[roof_types]
flat = 0.8
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.panel.max_panels), Some(24));
        assert_eq!(cfg.as_ref().map(|c| c.regions.lisbon), Some(4.9));
        // untouched region keeps its default
        assert_eq!(cfg.as_ref().map(|c| c.regions.north), Some(3.8));
        assert_eq!(
            cfg.as_ref()
                .and_then(|c| c.scenarios.maximal_extra_area_cap_m2),
            Some(25.0)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[panel]
rated_kwp = 0.4
wattage = 400
"#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_region_key_rejected() {
        let toml = r#"
[regions]
madeira = 4.5
"#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_panel_area() {
        let mut cfg = EngineConfig::default();
        cfg.panel.area_m2 = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "panel.area_m2"));
    }

    #[test]
    fn validation_catches_bad_performance_ratio() {
        let mut cfg = EngineConfig::default();
        cfg.panel.performance_ratio = 1.2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "panel.performance_ratio"));
    }

    #[test]
    fn validation_catches_inverted_scenario_factors() {
        let mut cfg = EngineConfig::default();
        cfg.scenarios.reduced_area_factor = 1.3;
        cfg.scenarios.maximal_area_factor = 0.7;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "scenarios.reduced_area_factor"));
        assert!(errors.iter().any(|e| e.field == "scenarios.maximal_area_factor"));
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = EngineConfig::default();
        cfg.regions.north = -1.0;
        cfg.green_score.base = 140;
        cfg.analysis.years = 0;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[green_score]
base = 60
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.green_score.base), Some(60));
        assert_eq!(cfg.as_ref().map(|c| c.panel.area_m2), Some(1.75));
        assert_eq!(cfg.as_ref().map(|c| c.analysis.years), Some(15));
    }

    #[test]
    fn lookup_tables_match_enums() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.regions.peak_sun_hours(Region::Lisbon), 4.7);
        assert_eq!(cfg.regions.peak_sun_hours(Region::AlentejoAlgarve), 5.2);
        assert_eq!(cfg.roof_types.efficiency(RoofType::Mixed), 0.88);
        assert_eq!(cfg.roof_types.efficiency(RoofType::NorthFacingPitched), 0.65);
    }
}
