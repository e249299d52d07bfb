use topspin_core::{horizontal, BallState, PhysicsSettings, Vector3};

use crate::flight;

/// Advance the ball kinematics by `dt` seconds using the closed-form flight model.
///
/// Only position, velocity and side spin change. Top spin is constant between bounces.
/// A negative `dt` rewinds the flight exactly.
pub fn advance(state: &BallState, dt: f64, physics: &PhysicsSettings) -> BallState {
    let g = physics.gravity_for(state.spin.top);
    let side = state.spin.side;
    let flat = horizontal(&state.velocity);

    let offset = flight::horizontal_offset(&flat, side, dt, physics);
    let velocity = flight::horizontal_velocity(&flat, side, dt, physics);

    let mut next = *state;
    next.position += Vector3::new(
        offset.x,
        flight::vertical_offset(state.velocity.y, g, dt, physics),
        offset.y,
    );
    next.velocity = Vector3::new(
        velocity.x,
        flight::vertical_velocity(state.velocity.y, g, dt, physics),
        velocity.y,
    );
    next.spin.side = side * physics.decay(dt);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use topspin_core::{RallyStatus, Spin};

    fn ball(velocity: Vector3, spin: Spin) -> BallState {
        BallState::flying(
            Vector3::new(0.0, 1.5, 1.0),
            velocity,
            spin,
            RallyStatus::InPlayToSideA,
        )
    }

    #[test]
    fn test_side_spin_decays_exponentially() {
        let physics = PhysicsSettings::default();
        let mut state = ball(Vector3::new(0.5, 1.0, -4.0), Spin::new(4.0, -3.0));
        let n = 37;
        for _ in 0..n {
            state = advance(&state, physics.dt, &physics);
        }
        let expected = 4.0 * (-physics.drag * n as f64 * physics.dt).exp();
        assert_relative_eq!(state.spin.side, expected, epsilon = 1e-12);
        assert_eq!(state.spin.top, -3.0);
    }

    #[test]
    fn test_ticks_compose() {
        let physics = PhysicsSettings::default();
        let start = ball(Vector3::new(0.3, 2.0, -6.0), Spin::new(3.0, 2.0));
        let mut stepped = start;
        for _ in 0..10 {
            stepped = advance(&stepped, physics.dt, &physics);
        }
        let direct = advance(&start, 10.0 * physics.dt, &physics);
        assert_abs_diff_eq!(stepped.position, direct.position, epsilon = 1e-9);
        assert_abs_diff_eq!(stepped.velocity, direct.velocity, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_dt_rewinds() {
        let physics = PhysicsSettings::default();
        let start = ball(Vector3::new(-0.4, 1.0, -5.0), Spin::new(-2.0, 4.0));
        let there = advance(&start, 0.3, &physics);
        let back = advance(&there, -0.3, &physics);
        assert_abs_diff_eq!(back.position, start.position, epsilon = 1e-9);
        assert_abs_diff_eq!(back.velocity, start.velocity, epsilon = 1e-9);
        assert_relative_eq!(back.spin.side, start.spin.side, epsilon = 1e-12);
    }

    #[test]
    fn test_topspin_dips_faster() {
        let physics = PhysicsSettings::default();
        let velocity = Vector3::new(0.0, 1.0, -5.0);
        let flat = advance(&ball(velocity, Spin::NONE), 0.5, &physics);
        let topspin = advance(&ball(velocity, Spin::new(0.0, 5.0)), 0.5, &physics);
        let backspin = advance(&ball(velocity, Spin::new(0.0, -5.0)), 0.5, &physics);
        assert!(topspin.position.y < flat.position.y);
        assert!(backspin.position.y > flat.position.y);
        assert_relative_eq!(topspin.position.z, flat.position.z, epsilon = 1e-12);
    }
}
