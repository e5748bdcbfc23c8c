//! Rooftop solar sizing, scenario comparison and payback projection.

pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod green_score;
pub mod io;
pub mod report;
pub mod session;
/// Panel sizing engine, orientation helpers and payback timelines.
pub mod sizing;
pub mod store;
