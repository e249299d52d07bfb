use topspin_core::{AgentSettings, Vector2};

use crate::PlayerPose;

/// Below this distance (and a speed under one tick of acceleration) an axis comes to rest.
const ARRIVAL_DISTANCE: f64 = 1e-3;

/// Move the player so that the racket point `ideal` ends up at `target`.
///
/// If the ball arrives in `time_to_target` seconds the velocity is steered towards the
/// one that gets the racket there in time. Otherwise each axis accelerates towards the
/// target and brakes once the braking distance covers the remaining distance.
pub fn steer(
    pose: &mut PlayerPose,
    ideal: &Vector2,
    target: &Vector2,
    time_to_target: Option<f64>,
    max_speed: f64,
    settings: &AgentSettings,
    dt: f64,
) {
    let accel = settings.max_accel_per_tick;
    match time_to_target.filter(|&t| t > 0.0) {
        Some(t) => {
            let desired = (target - ideal) / t;
            let mut change = desired - pose.velocity;
            if change.norm() > accel {
                change = change.normalize() * accel;
            }
            pose.velocity += change;
        }
        None => {
            for axis in 0..2 {
                let remaining = target[axis] - ideal[axis];
                let v = pose.velocity[axis];
                if remaining.abs() < ARRIVAL_DISTANCE && v.abs() < accel {
                    pose.velocity[axis] = 0.0;
                    continue;
                }
                let braking_distance = v * v / (2.0 * accel / dt);
                if v * remaining > 0.0 && braking_distance >= remaining.abs() {
                    pose.velocity[axis] -= v.signum() * accel.min(v.abs());
                } else {
                    pose.velocity[axis] += remaining.signum() * accel;
                }
            }
        }
    }

    let speed = pose.velocity.norm();
    if speed > max_speed {
        pose.velocity *= max_speed / speed;
    }
    pose.translate(dt);
}
