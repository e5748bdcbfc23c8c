//! Core sizing types: roof profile input, installation plan output, scenarios.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::SizingError;

/// Roof construction, each carrying a fixed efficiency multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoofType {
    SouthFacingPitched,
    Mixed,
    Flat,
    NorthFacingPitched,
}

impl RoofType {
    pub const ALL: [RoofType; 4] = [
        RoofType::SouthFacingPitched,
        RoofType::Mixed,
        RoofType::Flat,
        RoofType::NorthFacingPitched,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::SouthFacingPitched => "south-facing-pitched",
            Self::Mixed => "mixed",
            Self::Flat => "flat",
            Self::NorthFacingPitched => "north-facing-pitched",
        }
    }
}

impl FromStr for RoofType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_slug() == s)
            .ok_or_else(|| ConfigError {
                field: "roof_type".to_string(),
                message: format!(
                    "unknown roof type \"{s}\", expected one of: {}",
                    Self::ALL.map(|r| r.as_slug()).join(", ")
                ),
            })
    }
}

impl fmt::Display for RoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_slug())
    }
}

/// Mainland region, each carrying a fixed peak-sun-hours constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    North,
    Center,
    Lisbon,
    AlentejoAlgarve,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::North,
        Region::Center,
        Region::Lisbon,
        Region::AlentejoAlgarve,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::Center => "center",
            Self::Lisbon => "lisbon",
            Self::AlentejoAlgarve => "alentejo-algarve",
        }
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_slug() == s)
            .ok_or_else(|| ConfigError {
                field: "region".to_string(),
                message: format!(
                    "unknown region \"{s}\", expected one of: {}",
                    Self::ALL.map(|r| r.as_slug()).join(", ")
                ),
            })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_slug())
    }
}

/// Household roof and consumption profile.
///
/// # Examples
///
/// ```
/// use solar_match::sizing::types::{Region, RoofProfile, RoofType};
///
/// let profile = RoofProfile::new(40.0, 300.0, RoofType::SouthFacingPitched, Region::Lisbon);
/// assert_eq!(profile.azimuth_deg, 180.0);
/// assert!(profile.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoofProfile {
    /// Usable roof area (m², > 0).
    pub area_m2: f64,
    /// Average monthly consumption (kWh, > 0).
    pub monthly_consumption_kwh: f64,
    pub roof_type: RoofType,
    pub region: Region,
    /// Panel azimuth in degrees; 0 = north, 90 = east, 180 = south, 270 = west.
    #[serde(default = "default_azimuth")]
    pub azimuth_deg: f64,
}

fn default_azimuth() -> f64 {
    180.0
}

impl RoofProfile {
    /// Creates a south-facing profile.
    pub fn new(
        area_m2: f64,
        monthly_consumption_kwh: f64,
        roof_type: RoofType,
        region: Region,
    ) -> Self {
        Self {
            area_m2,
            monthly_consumption_kwh,
            roof_type,
            region,
            azimuth_deg: default_azimuth(),
        }
    }

    /// Returns a copy with the given azimuth.
    pub fn with_azimuth(mut self, azimuth_deg: f64) -> Self {
        self.azimuth_deg = azimuth_deg;
        self
    }

    /// Returns a copy with the given roof area; every other field is unchanged.
    pub fn with_area(&self, area_m2: f64) -> Self {
        Self {
            area_m2,
            ..self.clone()
        }
    }

    /// Rejects non-positive or non-finite numeric inputs.
    ///
    /// # Errors
    ///
    /// Returns `SizingError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), SizingError> {
        if !(self.area_m2.is_finite() && self.area_m2 > 0.0) {
            return Err(SizingError::validation(
                "area_m2",
                format!("must be > 0, got {}", self.area_m2),
            ));
        }
        if !(self.monthly_consumption_kwh.is_finite() && self.monthly_consumption_kwh > 0.0) {
            return Err(SizingError::validation(
                "monthly_consumption_kwh",
                format!("must be > 0, got {}", self.monthly_consumption_kwh),
            ));
        }
        if !self.azimuth_deg.is_finite() {
            return Err(SizingError::validation(
                "azimuth_deg",
                format!("must be finite, got {}", self.azimuth_deg),
            ));
        }
        Ok(())
    }

    /// Parses a profile from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for malformed TOML, unknown keys or unknown
    /// roof type / region slugs.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "profile".to_string(),
            message: e.to_string(),
        })
    }

    /// Parses a profile from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or does not parse.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "profile".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }
}

/// Payback period of an installation.
///
/// `Never` is reported when annual savings are zero (no panels fit), so an
/// undefined division never leaks out as an infinite or NaN year count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    /// Cost divided by annual savings, rounded to one decimal.
    Years(f64),
    Never,
}

impl Payback {
    pub fn years(&self) -> Option<f64> {
        match self {
            Self::Years(y) => Some(*y),
            Self::Never => None,
        }
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(y) => write!(f, "{y:.1} years"),
            Self::Never => f.write_str("no payback"),
        }
    }
}

/// One year of the cumulative payback timeline (amounts in €).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaybackPoint {
    pub year: u32,
    /// Upfront installation cost (constant across the timeline).
    pub investment_eur: i64,
    /// Savings accumulated by the end of `year`.
    pub cumulative_savings_eur: i64,
    /// `cumulative_savings_eur - investment_eur`.
    pub balance_eur: i64,
}

/// Recommended photovoltaic configuration derived from a [`RoofProfile`].
///
/// Immutable once computed. Serialized flat so the most recent plan can be
/// persisted and reloaded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationPlan {
    pub panel_count: u32,
    /// Installed capacity (kWp, two decimals).
    pub capacity_kwp: f64,
    pub monthly_production_kwh: u32,
    /// Production as a share of consumption, capped.
    pub coverage_pct: u32,
    pub installation_cost_eur: u32,
    pub monthly_savings_eur: u32,
    pub annual_savings_eur: u32,
    pub payback: Payback,
    /// CO₂ avoided per year (tonnes, two decimals).
    pub co2_avoided_tonnes_per_year: f64,
    pub tree_equivalents: u32,
    pub green_score_delta: u32,
    pub payback_timeline: Vec<PaybackPoint>,
}

impl InstallationPlan {
    /// First year whose balance is non-negative, if the installation ever pays back.
    pub fn break_even_year(&self) -> Option<u32> {
        match self.payback {
            Payback::Never => None,
            Payback::Years(_) => super::payback::break_even_year(&self.payback_timeline),
        }
    }
}

/// The three standard sizing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Reduced,
    Recommended,
    Maximal,
}

impl ScenarioKind {
    /// Presentation order.
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Reduced,
        ScenarioKind::Recommended,
        ScenarioKind::Maximal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Reduced => "reduced",
            Self::Recommended => "recommended",
            Self::Maximal => "maximal",
        }
    }

    /// Position of this kind in [`ScenarioKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Reduced => 0,
            Self::Recommended => 1,
            Self::Maximal => 2,
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| format!("unknown scenario \"{s}\" (expected reduced, recommended or maximal)"))
    }
}

/// A sizing variant: the plan computed from a scaled roof area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    /// Roof area the plan was computed from (m²).
    pub area_m2: f64,
    pub plan: InstallationPlan,
}

impl Scenario {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roof_type_slugs_round_trip() {
        for r in RoofType::ALL {
            assert_eq!(r.as_slug().parse::<RoofType>(), Ok(r));
        }
    }

    #[test]
    fn unknown_region_is_config_error() {
        let err = "madeira".parse::<Region>().unwrap_err();
        assert_eq!(err.field, "region");
        assert!(err.message.contains("alentejo-algarve"));
    }

    #[test]
    fn validate_rejects_non_positive_area() {
        let p = RoofProfile::new(0.0, 300.0, RoofType::Flat, Region::North);
        assert!(matches!(
            p.validate(),
            Err(SizingError::Validation { field: "area_m2", .. })
        ));
    }

    #[test]
    fn validate_rejects_nan_consumption() {
        let p = RoofProfile::new(40.0, f64::NAN, RoofType::Flat, Region::North);
        assert!(matches!(
            p.validate(),
            Err(SizingError::Validation {
                field: "monthly_consumption_kwh",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_infinite_azimuth() {
        let p = RoofProfile::new(40.0, 300.0, RoofType::Flat, Region::North)
            .with_azimuth(f64::INFINITY);
        assert!(p.validate().is_err());
    }

    #[test]
    fn profile_toml_parses_with_default_azimuth() {
        let toml = r#"
area_m2 = 35.0
monthly_consumption_kwh = 250.0
roof_type = "mixed"
region = "alentejo-algarve"
"#;
        let p = RoofProfile::from_toml_str(toml).expect("profile should parse");
        assert_eq!(p.roof_type, RoofType::Mixed);
        assert_eq!(p.region, Region::AlentejoAlgarve);
        assert_eq!(p.azimuth_deg, 180.0);
    }

    #[test]
    fn profile_toml_rejects_unknown_roof_type() {
        let toml = r#"
area_m2 = 35.0
monthly_consumption_kwh = 250.0
roof_type = "thatched"
region = "lisbon"
"#;
        let err = RoofProfile::from_toml_str(toml).unwrap_err();
        assert_eq!(err.field, "profile");
    }

    #[test]
    fn payback_display() {
        assert_eq!(Payback::Years(7.5).to_string(), "7.5 years");
        assert_eq!(Payback::Never.to_string(), "no payback");
        assert_eq!(Payback::Never.years(), None);
    }

    #[test]
    fn scenario_kind_order_and_parse() {
        for (i, k) in ScenarioKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
            assert_eq!(k.label().parse::<ScenarioKind>(), Ok(*k));
        }
        assert!("huge".parse::<ScenarioKind>().is_err());
    }
}
