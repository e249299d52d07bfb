mod bisect;
mod grid;
mod rally;
mod serve;

pub use bisect::*;
pub use grid::*;
pub use rally::*;
pub use serve::*;

use serde::{Deserialize, Serialize};
use topspin_core::{PlannerSettings, SimulationConfig};

/// How hard a rally shot is hit, relative to the fastest shot that clears the net.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerTier {
    Weak,
    Medium,
    Strong,
}

impl PowerTier {
    pub fn multiplier(self, settings: &PlannerSettings) -> f64 {
        match self {
            PowerTier::Weak => settings.weak_power,
            PowerTier::Medium => settings.medium_power,
            PowerTier::Strong => settings.strong_power,
        }
    }
}

/// Inverse trajectory solver: finds launch velocities that put the ball on a target.
///
/// Every candidate is evaluated with the same closed-form flight model the simulator
/// integrates, so a solved shot played forward lands where it was aimed.
#[derive(Debug, Clone, Copy)]
pub struct ShotPlanner<'a> {
    config: &'a SimulationConfig,
    settings: &'a PlannerSettings,
}

impl<'a> ShotPlanner<'a> {
    pub fn new(config: &'a SimulationConfig, settings: &'a PlannerSettings) -> Self {
        Self { config, settings }
    }
}
