use serde::{Deserialize, Serialize};

use crate::{settings::ensure_positive, SettingsError};

/// Settings for the ball flight model and the collision response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsSettings {
    /// Duration of one simulation tick in seconds.
    pub dt: f64,
    /// Linear air drag coefficient in 1/s.
    pub drag: f64,
    /// Gravitational acceleration in m/s².
    pub gravity: f64,
    /// Extra downward acceleration per unit of top spin (Magnus effect).
    pub magnus_factor: f64,
    /// Turn rate of the horizontal velocity per unit of side spin, in rad/s.
    pub curve_factor: f64,
    /// Below this effective turn rate the flight is treated as straight.
    pub spin_epsilon: f64,

    /// Vertical restitution of the table.
    pub table_restitution: f64,
    /// Fraction of the side spin kept on a table bounce.
    pub table_side_spin_retention: f64,
    /// Fraction of the top spin kept on a table bounce.
    pub table_top_spin_retention: f64,
    /// Horizontal speed gain per unit of top spin on a table bounce. Backspin (negative
    /// top spin) slows the ball down.
    pub topspin_bounce_gain: f64,

    /// Vertical restitution of the floor.
    pub floor_restitution: f64,
    /// Fraction of both spins kept on a floor bounce.
    pub floor_spin_retention: f64,

    /// Fraction of the forward speed the ball keeps (reversed) when it hits the net.
    pub net_reflect: f64,
    /// Fraction of the lateral speed the ball keeps when it hits the net.
    pub net_lateral: f64,
    /// Fraction of both spins kept when the ball hits the net.
    pub net_spin_retention: f64,
    /// Distance from the net plane the ball is placed at after hitting the net.
    pub net_epsilon: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            drag: 0.6,
            gravity: 9.81,
            magnus_factor: 0.4,
            curve_factor: 0.15,
            spin_epsilon: 1e-4,
            table_restitution: 0.9,
            table_side_spin_retention: 0.8,
            table_top_spin_retention: 0.7,
            topspin_bounce_gain: 0.02,
            floor_restitution: 0.6,
            floor_spin_retention: 0.5,
            net_reflect: 0.3,
            net_lateral: 0.6,
            net_spin_retention: 0.5,
            net_epsilon: 1e-4,
        }
    }
}

impl PhysicsSettings {
    /// Effective downward acceleration for the given top spin.
    pub fn gravity_for(&self, top: f64) -> f64 {
        self.gravity + top * self.magnus_factor
    }

    /// Drag decay factor `exp(-k t)` over `t` seconds.
    pub fn decay(&self, t: f64) -> f64 {
        (-self.drag * t).exp()
    }

    /// Drag and tick length must be positive.
    pub fn validate(&self) -> Result<(), SettingsError> {
        ensure_positive("dt", self.dt)?;
        ensure_positive("drag", self.drag)
    }

    /// Turn rate of the horizontal velocity for the given side spin.
    pub fn turn_rate(&self, side: f64) -> f64 {
        side * self.curve_factor
    }
}
