//! Solar installation sizing and financial projection.

pub mod engine;
/// Orientation efficiency and compass helpers.
pub mod orientation;
pub mod payback;
pub mod types;

pub use engine::{SizingBreakdown, SizingEngine, compute_plan, compute_scenarios};
pub use orientation::compute_orientation_efficiency;
pub use types::{
    InstallationPlan, Payback, PaybackPoint, Region, RoofProfile, RoofType, Scenario,
    ScenarioKind,
};
