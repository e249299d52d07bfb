use serde::{Deserialize, Serialize};
use topspin_core::{Side, Spin, Vector2, Vector3};

/// Kinematic state of a player.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlayerPose {
    pub side: Side,
    /// Position on the floor \[m]
    pub position: Vector3,
    /// Horizontal velocity `(x, z)` \[m/s]
    pub velocity: Vector2,
    /// Frame of the current swing, 0 when idle
    pub swing_progress: u32,
    /// Where the current (or last) shot is aimed, as `(x, z)`
    pub aim: Vector2,
    /// Spin of the current (or last) shot
    pub spin: Spin,
}

impl PlayerPose {
    pub fn new(side: Side, position: Vector3) -> Self {
        Self {
            side,
            position,
            velocity: Vector2::zeros(),
            swing_progress: 0,
            aim: Vector2::zeros(),
            spin: Spin::NONE,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.swing_progress == 0
    }

    /// Horizontal position `(x, z)`.
    pub fn ground(&self) -> Vector2 {
        Vector2::new(self.position.x, self.position.z)
    }

    /// Horizontal position after `ticks` ticks at the current velocity.
    pub fn extrapolate(&self, ticks: u32, dt: f64) -> Vector2 {
        self.ground() + self.velocity * (ticks as f64 * dt)
    }

    pub fn translate(&mut self, dt: f64) {
        self.position.x += self.velocity.x * dt;
        self.position.z += self.velocity.y * dt;
    }
}
