mod ball;
mod geom;
mod physics_settings;
mod settings;
mod swing;

pub use ball::*;
pub use geom::*;
pub use physics_settings::*;
pub use settings::*;
pub use swing::*;

/// A vector in the horizontal plane. `x` is the lateral axis and `y` holds the world
/// `z` (along the table).
pub type Vector2 = nalgebra::Vector2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// Project a world-space vector onto the horizontal plane.
pub fn horizontal(v: &Vector3) -> Vector2 {
    Vector2::new(v.x, v.z)
}
