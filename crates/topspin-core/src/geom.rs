use serde::{Deserialize, Serialize};

use crate::Side;

/// The table geometry. All values are in meters.
///
/// The table is centered on the origin with its length along `z` and the net in the
/// `z = 0` plane. The playing surface sits at `y = height`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TableGeometry {
    /// Table length (end line to end line)
    pub length: f64,
    /// Table width (side line to side line)
    pub width: f64,
    /// Height of the playing surface above the floor
    pub height: f64,
    /// Thickness of the table top
    pub thickness: f64,
    /// Height of the net above the playing surface
    pub net_height: f64,
    /// How far the net posts stick out past each side line
    pub net_overhang: f64,
    /// Radius of the ball
    pub ball_radius: f64,
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self {
            length: 2.74,
            width: 1.525,
            height: 0.76,
            thickness: 0.03,
            net_height: 0.1525,
            net_overhang: 0.1525,
            ball_radius: 0.02,
        }
    }
}

impl TableGeometry {
    pub fn half_length(&self) -> f64 {
        self.length / 2.0
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Height of the ball center when it touches the playing surface.
    pub fn contact_height(&self) -> f64 {
        self.height + self.ball_radius
    }

    /// Highest ball center height at which the ball still touches the net.
    pub fn net_top(&self) -> f64 {
        self.height + self.net_height + self.ball_radius
    }

    /// Half extent of the net along `x`, including the overhang.
    pub fn net_half_width(&self) -> f64 {
        self.half_width() + self.net_overhang
    }

    /// Whether the horizontal point `(x, z)` lies over the playing surface.
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x.abs() <= self.half_width() && z.abs() <= self.half_length()
    }

    /// The half of the table the given depth belongs to.
    pub fn side_of(&self, z: f64) -> Side {
        Side::of_depth(z)
    }

    /// Resting position of a player of the given side, `home_depth` behind the end line.
    pub fn home_depth(&self, side: Side, home_depth: f64) -> f64 {
        side.sign() * (self.half_length() + home_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_heights() {
        let table = TableGeometry::default();
        assert_relative_eq!(table.contact_height(), 0.78, epsilon = 1e-12);
        assert_relative_eq!(table.net_top(), 0.9325, epsilon = 1e-12);
    }

    #[test]
    fn test_contains() {
        let table = TableGeometry::default();
        assert!(table.contains(0.0, 0.0));
        assert!(table.contains(0.76, -1.36));
        assert!(!table.contains(0.77, 0.0));
        assert!(!table.contains(0.0, 1.38));
    }
}
