//! Application state for one user session: engine, persistence and selection.

use tracing::{info, warn};

use crate::error::SessionError;
use crate::sizing::engine::SizingEngine;
use crate::sizing::orientation::{SOUTH_DEG, normalize_azimuth};
use crate::sizing::types::{InstallationPlan, RoofProfile, Scenario, ScenarioKind};
use crate::store::{KeyValueStore, PlanStore};

/// Session state threaded explicitly through the calculate/select flow.
///
/// Holds the last computed (or restored) plan, the three scenarios, the
/// selected scenario and the azimuth picked on the compass.
#[derive(Debug)]
pub struct SolarSession<S> {
    engine: SizingEngine,
    store: PlanStore<S>,
    azimuth_deg: f64,
    scenarios: Vec<Scenario>,
    selected: usize,
    current_plan: Option<InstallationPlan>,
    green_score: u32,
}

impl<S: KeyValueStore> SolarSession<S> {
    /// Opens a session, restoring the last persisted plan if there is one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the backend cannot be read.
    pub fn open(engine: SizingEngine, store: S) -> Result<Self, SessionError> {
        let store = PlanStore::new(store, engine.config().green_score.base);
        let current_plan = store.load_plan()?;
        let green_score = store.green_score()?;
        if current_plan.is_some() {
            info!(green_score, "restored saved plan");
        }
        Ok(Self {
            engine,
            store,
            azimuth_deg: SOUTH_DEG,
            scenarios: Vec::new(),
            selected: ScenarioKind::Recommended.index(),
            current_plan,
            green_score,
        })
    }

    /// Computes, persists and scores a plan for `profile`, then refreshes the
    /// scenarios and selects the recommended one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Sizing` for invalid input (nothing is persisted)
    /// or `SessionError::Store` if persisting fails.
    pub fn calculate(&mut self, profile: &RoofProfile) -> Result<&InstallationPlan, SessionError> {
        let plan = self.engine.compute_plan(profile)?;
        let scenarios = self.engine.compute_scenarios(profile)?;

        match self.store.record_plan(&plan) {
            Ok(score) => self.green_score = score,
            Err(e) => {
                warn!("failed to persist plan: {e}");
                self.resync();
                return Err(e.into());
            }
        }
        info!(
            panels = plan.panel_count,
            green_score = self.green_score,
            "saved installation plan"
        );

        self.scenarios = scenarios;
        self.selected = ScenarioKind::Recommended.index();
        Ok(self.current_plan.insert(plan))
    }

    /// Reloads the plan and score from the store after a partial write, so
    /// the session shows whatever the store now holds.
    fn resync(&mut self) {
        if let Ok(plan) = self.store.load_plan() {
            self.current_plan = plan;
        }
        if let Ok(score) = self.store.green_score() {
            self.green_score = score;
        }
    }

    /// Selects a scenario by index; an out-of-range index leaves the
    /// selection unchanged and returns `None`.
    pub fn select_scenario(&mut self, index: usize) -> Option<&Scenario> {
        if index >= self.scenarios.len() {
            return None;
        }
        self.selected = index;
        self.scenarios.get(index)
    }

    pub fn select_kind(&mut self, kind: ScenarioKind) -> Option<&Scenario> {
        self.select_scenario(kind.index())
    }

    pub fn selected_scenario(&self) -> Option<&Scenario> {
        self.scenarios.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Plan to display: the selected scenario's, else the last computed or
    /// restored plan.
    pub fn displayed_plan(&self) -> Option<&InstallationPlan> {
        self.selected_scenario()
            .map(|s| &s.plan)
            .or(self.current_plan.as_ref())
    }

    pub fn current_plan(&self) -> Option<&InstallationPlan> {
        self.current_plan.as_ref()
    }

    pub fn green_score(&self) -> u32 {
        self.green_score
    }

    pub fn base_score(&self) -> u32 {
        self.store.base_score()
    }

    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth_deg
    }

    /// Sets the compass azimuth, normalized to `[0, 360)`. Non-finite input
    /// is ignored.
    pub fn set_azimuth(&mut self, azimuth_deg: f64) {
        if azimuth_deg.is_finite() {
            self.azimuth_deg = normalize_azimuth(azimuth_deg);
        }
    }

    pub fn engine(&self) -> &SizingEngine {
        &self.engine
    }

    pub fn into_store(self) -> S {
        self.store.into_inner()
    }
}
