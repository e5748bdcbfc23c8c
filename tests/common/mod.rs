//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use rand::{Rng, rngs::StdRng};
use solar_match::sizing::{Region, RoofProfile, RoofType};

/// The reference household: 40 m² south-facing roof in Lisbon using 300 kWh/month.
pub fn reference_profile() -> RoofProfile {
    RoofProfile::new(40.0, 300.0, RoofType::SouthFacingPitched, Region::Lisbon)
}

/// Random but valid profile (area 1-200 m², consumption 20-2000 kWh/month).
pub fn random_profile(rng: &mut StdRng) -> RoofProfile {
    let roof = RoofType::ALL[rng.random_range(0..RoofType::ALL.len())];
    let region = Region::ALL[rng.random_range(0..Region::ALL.len())];
    RoofProfile::new(
        rng.random_range(1.0..200.0),
        rng.random_range(20.0..2000.0),
        roof,
        region,
    )
    .with_azimuth(rng.random_range(0.0..360.0))
}

/// Fresh path under the system temp dir, unique per process and `name`.
pub fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "solar-match-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}
