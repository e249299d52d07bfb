use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PhysicsSettings, SpinPresets, SwingTable, TableGeometry, Vector3};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid swing profile '{name}': {reason}")]
    InvalidSwingProfile { name: String, reason: String },
    #[error("Invalid setting '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Fail with [`SettingsError::InvalidValue`] unless `value` is finite and positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue {
            name,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn ensure_range(name: &'static str, min: f64, max: f64) -> Result<(), SettingsError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue {
            name,
            reason: format!("empty range [{min}, {max}]"),
        })
    }
}

/// Everything needed to step the ball forward.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub table: TableGeometry,
    pub physics: PhysicsSettings,
}

/// Settings for the serve and rally trajectory solvers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannerSettings {
    /// Maximum number of iterations of every bisection.
    pub iterations: usize,

    /// Lower bound of the serve speed search in m/s.
    pub serve_speed_min: f64,
    /// Upper bound of the serve speed search in m/s.
    pub serve_speed_max: f64,
    /// Shallowest first-bounce depth tried for a serve, measured from the net.
    pub serve_depth_min: f64,
    /// Step between tried first-bounce depths.
    pub serve_depth_step: f64,
    /// Minimum distance between the first bounce and the end line.
    pub serve_depth_margin: f64,
    /// Accepted error of the landing height, in meters.
    pub height_tolerance: f64,
    /// Accepted lateral landing error, in meters.
    pub lateral_tolerance: f64,
    /// Extra net clearance demanded from an easy (level 0) serve, in meters.
    pub serve_clearance: f64,
    /// Serve velocity used when no serve can be solved: lateral, up, and forward
    /// (towards the opponent) components in m/s.
    pub fallback_serve: Vector3,

    /// Lower bound of the rally speed search in m/s.
    pub rally_speed_min: f64,
    /// Upper bound of the rally speed search in m/s.
    pub rally_speed_max: f64,
    /// The rally speed search stops once the bracket is narrower than this, in m/s.
    pub rally_speed_tolerance: f64,
    /// Minimum clearance above the net for a rally shot, in meters.
    pub rally_net_margin: f64,
    /// Fallback rally speed per meter of distance to the target.
    pub fallback_speed_per_meter: f64,
    /// Fallback rally vertical speed in m/s.
    pub fallback_lift: f64,
    /// Additional fallback vertical speed per meter of distance to the target.
    pub fallback_lift_per_meter: f64,

    /// Speed multiplier of a weak shot.
    pub weak_power: f64,
    /// Speed multiplier of a medium shot.
    pub medium_power: f64,
    /// Speed multiplier of a strong shot.
    pub strong_power: f64,

    /// How far ahead the landing search looks, in seconds.
    pub depth_horizon: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            iterations: 20,
            serve_speed_min: 0.1,
            serve_speed_max: 30.0,
            serve_depth_min: 0.1,
            serve_depth_step: 0.05,
            serve_depth_margin: 0.05,
            height_tolerance: 0.005,
            lateral_tolerance: 0.01,
            serve_clearance: 0.15,
            fallback_serve: Vector3::new(0.0, 1.2, 4.0),
            rally_speed_min: 1.0,
            rally_speed_max: 30.0,
            rally_speed_tolerance: 1e-3,
            rally_net_margin: 0.03,
            fallback_speed_per_meter: 2.5,
            fallback_lift: 1.5,
            fallback_lift_per_meter: 0.4,
            weak_power: 0.75,
            medium_power: 0.85,
            strong_power: 0.95,
            depth_horizon: 3.0,
        }
    }
}

impl PlannerSettings {
    /// Check the values the solvers rely on to terminate.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.iterations == 0 {
            return Err(SettingsError::InvalidValue {
                name: "iterations",
                reason: "at least one iteration is needed".to_string(),
            });
        }
        ensure_range("serve_speed", self.serve_speed_min, self.serve_speed_max)?;
        ensure_range("rally_speed", self.rally_speed_min, self.rally_speed_max)?;
        ensure_positive("serve_depth_step", self.serve_depth_step)?;
        ensure_positive("rally_speed_tolerance", self.rally_speed_tolerance)?;
        ensure_positive("depth_horizon", self.depth_horizon)
    }
}

/// Settings for the decision agent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    /// How far behind the end line the player waits, in meters.
    pub home_depth: f64,
    /// Height of the serving hand above the floor, in meters.
    pub hand_height: f64,
    /// Serve difficulty level in `[0, 1]`. Higher levels fly closer to the net.
    pub serve_level: f64,
    /// The server starts the serve once its racket point is this close to home, in meters.
    pub serve_ready_distance: f64,

    /// Maximum change of the player velocity per tick, in m/s.
    pub max_accel_per_tick: f64,
    /// Maximum speed while chasing a ball to return, in m/s.
    pub max_speed_return: f64,
    /// Maximum speed while repositioning, in m/s.
    pub max_speed_reposition: f64,

    /// Maximum number of ticks rolled forward to find the peak of the incoming ball.
    pub peak_rollout_ticks: usize,
    /// Nearest accepted distance (along the table) between player and ball at contact.
    pub zone_near: f64,
    /// Farthest accepted distance (along the table) between player and ball at contact.
    pub zone_far: f64,
    /// Maximum lateral distance between racket and ball at contact, in meters.
    pub reach: f64,
    /// Lowest ball height that can be struck, in meters.
    pub min_hit_height: f64,
    /// Highest ball height that can be struck, in meters.
    pub max_hit_height: f64,
    /// A swing is deferred if waiting one tick improves the contact distance by more
    /// than this, in meters.
    pub defer_margin: f64,

    /// Lateral aim zones as a fraction of the usable half width.
    pub lateral_zone: f64,
    /// Lateral aim correction per m/s of player velocity, in seconds.
    pub lateral_bias: f64,
    /// Distance kept from the side lines when aiming, in meters.
    pub table_margin: f64,
    /// Peak height over horizontal travel above which the return is aimed deep.
    pub deep_ratio: f64,
    /// Peak height over horizontal travel above which the return is aimed mid-table.
    pub mid_ratio: f64,
    /// Deep aim depth as a fraction of the opponent's half.
    pub deep_depth: f64,
    /// Mid-table aim depth as a fraction of the opponent's half.
    pub mid_depth: f64,
    /// Short aim depth as a fraction of the opponent's half.
    pub short_depth: f64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            home_depth: 0.5,
            hand_height: 0.9,
            serve_level: 0.75,
            serve_ready_distance: 0.05,
            max_accel_per_tick: 0.3,
            max_speed_return: 4.0,
            max_speed_reposition: 2.0,
            peak_rollout_ticks: 500,
            zone_near: 0.0,
            zone_far: 0.9,
            reach: 0.5,
            min_hit_height: 0.7,
            max_hit_height: 1.7,
            defer_margin: 0.005,
            lateral_zone: 0.4,
            lateral_bias: 0.05,
            table_margin: 0.1,
            deep_ratio: 0.5,
            mid_ratio: 0.25,
            deep_depth: 0.85,
            mid_depth: 0.6,
            short_depth: 0.35,
        }
    }
}

/// Settings for the headless match driver.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MatchSettings {
    /// Ticks the dead ball stays in play before the next point starts.
    pub reset_after_ticks: u32,
    /// Consecutive points served by the same player.
    pub serves_per_turn: u32,
    /// Points longer than this many ticks are replayed without scoring.
    pub max_point_ticks: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            reset_after_ticks: 60,
            serves_per_turn: 2,
            max_point_ticks: 60 * 60,
        }
    }
}

/// All settings of the simulation, the planner and the agents.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TopspinSettings {
    pub simulation: SimulationConfig,
    pub planner: PlannerSettings,
    pub agent: AgentSettings,
    #[serde(rename = "match")]
    pub game: MatchSettings,
    pub swings: SwingTable,
    pub spins: SpinPresets,
}

impl TopspinSettings {
    /// Load the settings from a JSON file, or store the default settings if the file
    /// does not exist.
    ///
    /// Unlike a missing file, an unreadable or malformed file is an error.
    pub fn load_or_insert(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Self>(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Writing default settings to {}", path.display());
                let settings = Self::default();
                settings.store(path)?;
                settings
            }
            Err(err) => return Err(err.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.simulation.physics.validate()?;
        self.planner.validate()?;
        self.swings.validate()
    }
}
