//! Closed-form ball flight.
//!
//! With linear drag `k` the velocity decays as `exp(-k t)`. Side spin turns the
//! horizontal velocity at a rate that decays with the same factor, so the total turn
//! angle and the displacement along the resulting arc have exact solutions. The
//! vertical axis sees gravity plus the Magnus term of the top spin.
//!
//! Horizontal quantities are [`Vector2`]s holding world `(x, z)`.

use topspin_core::{PhysicsSettings, Vector2};

/// Step of the coarse scan in [`time_to_depth`], in seconds.
const DEPTH_SCAN_STEP: f64 = 0.02;

/// Number of bisection steps refining the result of [`time_to_depth`].
const DEPTH_BISECTIONS: usize = 40;

/// Total horizontal turn angle accumulated over `t` seconds.
fn turn_angle(side: f64, t: f64, physics: &PhysicsSettings) -> f64 {
    physics.turn_rate(side) / physics.drag * (1.0 - physics.decay(t))
}

fn rotate(v: &Vector2, angle: f64) -> Vector2 {
    let (sin, cos) = angle.sin_cos();
    Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Horizontal displacement after `t` seconds of flight.
pub fn horizontal_offset(
    velocity: &Vector2,
    side: f64,
    t: f64,
    physics: &PhysicsSettings,
) -> Vector2 {
    let w = physics.turn_rate(side);
    if w.abs() < physics.spin_epsilon {
        return velocity * ((1.0 - physics.decay(t)) / physics.drag);
    }
    // Offset from the center of curvature to the ball.
    let arm = Vector2::new(velocity.y / w, -velocity.x / w);
    rotate(&arm, turn_angle(side, t, physics)) - arm
}

/// Horizontal velocity after `t` seconds of flight.
pub fn horizontal_velocity(
    velocity: &Vector2,
    side: f64,
    t: f64,
    physics: &PhysicsSettings,
) -> Vector2 {
    rotate(velocity, turn_angle(side, t, physics)) * physics.decay(t)
}

/// Vertical displacement after `t` seconds under downward acceleration `g`.
pub fn vertical_offset(vy: f64, g: f64, t: f64, physics: &PhysicsSettings) -> f64 {
    let k = physics.drag;
    (vy + g / k) * (1.0 - physics.decay(t)) / k - g * t / k
}

/// Vertical velocity after `t` seconds under downward acceleration `g`.
pub fn vertical_velocity(vy: f64, g: f64, t: f64, physics: &PhysicsSettings) -> f64 {
    let k = physics.drag;
    (vy + g / k) * physics.decay(t) - g / k
}

/// Initial vertical speed that changes the height by `dy` in exactly `t` seconds.
pub fn required_vertical_speed(dy: f64, g: f64, t: f64, physics: &PhysicsSettings) -> f64 {
    let k = physics.drag;
    (dy + g * t / k) * k / (1.0 - physics.decay(t)) - g / k
}

/// A horizontal launch that covers a given displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reach {
    /// Flight time in seconds
    pub time: f64,
    /// Initial horizontal velocity
    pub launch: Vector2,
}

/// Find the horizontal launch with the given speed that covers `displacement`.
///
/// Returns `None` if the target is unreachable: drag stops the ball before it gets
/// there, or the side spin curves it so hard that the arc can't span the distance.
pub fn reach(
    displacement: &Vector2,
    speed: f64,
    side: f64,
    physics: &PhysicsSettings,
) -> Option<Reach> {
    let distance = displacement.norm();
    if distance < 1e-9 || speed <= 0.0 {
        return None;
    }
    let k = physics.drag;
    let w = physics.turn_rate(side);

    if w.abs() < physics.spin_epsilon {
        let q = distance * k / speed;
        if q >= 1.0 {
            return None;
        }
        return Some(Reach {
            time: -(1.0 - q).ln() / k,
            launch: displacement * (speed / distance),
        });
    }

    // On a circular arc the chord subtends twice the angle between chord and tangent.
    let arg = distance * w.abs() / (2.0 * speed);
    if arg > 1.0 {
        return None;
    }
    let theta = 2.0 * arg.asin() * w.signum();
    let q = theta * k / w;
    if q >= 1.0 {
        return None;
    }
    let heading = displacement.y.atan2(displacement.x) - theta / 2.0;
    Some(Reach {
        time: -(1.0 - q).ln() / k,
        launch: Vector2::new(heading.cos(), heading.sin()) * speed,
    })
}

/// Time until the ball starting at depth `z0` reaches depth `depth`.
///
/// Scans forward in coarse steps up to `horizon` seconds and refines the first crossing
/// by bisection. Returns `None` if the ball never gets there within the horizon.
pub fn time_to_depth(
    z0: f64,
    velocity: &Vector2,
    side: f64,
    depth: f64,
    horizon: f64,
    physics: &PhysicsSettings,
) -> Option<f64> {
    let target = depth - z0;
    let direction = if target > 0.0 { 1.0 } else { -1.0 };
    let reached =
        |t: f64| (horizontal_offset(velocity, side, t, physics).y - target) * direction >= 0.0;

    let mut prev = 0.0;
    let mut t = DEPTH_SCAN_STEP;
    while t <= horizon {
        if reached(t) {
            let (mut lo, mut hi) = (prev, t);
            for _ in 0..DEPTH_BISECTIONS {
                let mid = (lo + hi) / 2.0;
                if reached(mid) {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            return Some(hi);
        }
        prev = t;
        t += DEPTH_SCAN_STEP;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_straight_offset_matches_limit_of_arc() {
        let physics = PhysicsSettings::default();
        let v = Vector2::new(1.0, -6.0);
        let straight = horizontal_offset(&v, 0.0, 0.4, &physics);
        let curved = horizontal_offset(&v, 1e-3, 0.4, &physics);
        assert_abs_diff_eq!(straight, curved, epsilon = 1e-3);
    }

    #[test]
    fn test_vertical_speed_inverts_offset() {
        let physics = PhysicsSettings::default();
        let g = physics.gravity_for(3.0);
        let vy = required_vertical_speed(-0.3, g, 0.45, &physics);
        assert_relative_eq!(vertical_offset(vy, g, 0.45, &physics), -0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_reach_lands_on_target() {
        let physics = PhysicsSettings::default();
        let d = Vector2::new(0.4, -2.2);
        for side in [0.0, 5.0, -5.0] {
            let r = reach(&d, 8.0, side, &physics).unwrap();
            let offset = horizontal_offset(&r.launch, side, r.time, &physics);
            assert_abs_diff_eq!(offset, d, epsilon = 1e-9);
            assert_relative_eq!(r.launch.norm(), 8.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_reach_fails_when_drag_stops_the_ball() {
        let physics = PhysicsSettings::default();
        // A 1 m/s ball with k = 0.6 travels at most 1/0.6 m.
        assert!(reach(&Vector2::new(0.0, 2.0), 1.0, 0.0, &physics).is_none());
        assert!(reach(&Vector2::new(0.0, 1.0), 1.0, 0.0, &physics).is_some());
    }

    #[test]
    fn test_reach_fails_under_heavy_side_spin() {
        let physics = PhysicsSettings::default();
        assert!(reach(&Vector2::new(0.0, 3.0), 0.5, 50.0, &physics).is_none());
    }

    #[test]
    fn test_time_to_depth() {
        let physics = PhysicsSettings::default();
        let v = Vector2::new(0.0, -5.0);
        let t = time_to_depth(1.0, &v, 0.0, 0.0, 3.0, &physics).unwrap();
        let z = 1.0 + horizontal_offset(&v, 0.0, t, &physics).y;
        assert_abs_diff_eq!(z, 0.0, epsilon = 1e-9);
        // Drag stops the ball after 5 / 0.6 m.
        assert!(time_to_depth(1.0, &v, 0.0, -10.0, 3.0, &physics).is_none());
    }
}
