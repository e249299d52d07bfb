use serde::{Deserialize, Serialize};
use topspin_core::{BallState, PhysicsSettings, RallyStatus, Side, SimulationConfig, Spin, Vector3};

use crate::{advance, flight};

/// Number of bisection steps used to locate a bounce within a tick.
const CROSSING_BISECTIONS: usize = 30;

/// A contact of the ball with the environment.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum BallEvent {
    /// The ball hit the net and was thrown back.
    Net { point: Vector3 },
    /// The ball bounced on the given half of the table.
    Table { side: Side, point: Vector3 },
    /// The ball bounced on the floor.
    Floor { point: Vector3 },
}

impl BallEvent {
    /// Where the contact happened.
    pub fn point(&self) -> Vector3 {
        match *self {
            BallEvent::Net { point }
            | BallEvent::Table { point, .. }
            | BallEvent::Floor { point } => point,
        }
    }
}

/// Velocity and spin right after a table bounce.
pub fn table_bounce(
    velocity: &Vector3,
    spin: Spin,
    physics: &PhysicsSettings,
) -> (Vector3, Spin) {
    let gain = (1.0 + spin.top * physics.topspin_bounce_gain).max(0.0);
    let velocity = Vector3::new(
        velocity.x * gain,
        -velocity.y * physics.table_restitution,
        velocity.z * gain,
    );
    let spin = Spin::new(
        spin.side * physics.table_side_spin_retention,
        spin.top * physics.table_top_spin_retention,
    );
    (velocity, spin)
}

/// Velocity and spin right after a floor bounce.
pub fn floor_bounce(
    velocity: &Vector3,
    spin: Spin,
    physics: &PhysicsSettings,
) -> (Vector3, Spin) {
    let velocity = Vector3::new(
        velocity.x,
        -velocity.y * physics.floor_restitution,
        velocity.z,
    );
    (velocity, spin.scaled(physics.floor_spin_retention))
}

/// Time since the ball descended through `height`, assuming it did so within the last
/// `dt` seconds.
fn time_since_crossing(
    state: &BallState,
    height: f64,
    dt: f64,
    physics: &PhysicsSettings,
) -> f64 {
    let g = physics.gravity_for(state.spin.top);
    let (mut lo, mut hi) = (0.0, dt);
    for _ in 0..CROSSING_BISECTIONS {
        let mid = (lo + hi) / 2.0;
        let y = state.position.y + flight::vertical_offset(state.velocity.y, g, -mid, physics);
        if y < height {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Rewind the ball to where it descended through `height` during the last tick.
/// Returns the time since the crossing and the ball at that moment.
fn rewind_to(state: &BallState, height: f64, physics: &PhysicsSettings) -> (f64, BallState) {
    let elapsed = time_since_crossing(state, height, physics.dt, physics);
    (elapsed, advance(state, -elapsed, physics))
}

/// Apply `bounce` to the ball `contact` rewound by `elapsed` seconds, and replay the rest
/// of the tick into `state`.
fn replay_bounce(
    state: &mut BallState,
    mut contact: BallState,
    elapsed: f64,
    height: f64,
    physics: &PhysicsSettings,
    bounce: impl Fn(&Vector3, Spin, &PhysicsSettings) -> (Vector3, Spin),
) {
    let (velocity, spin) = bounce(&contact.velocity, contact.spin, physics);
    contact.velocity = velocity;
    contact.spin = spin;
    contact.position.y = height;
    let replayed = advance(&contact, elapsed, physics);
    state.position = replayed.position;
    state.velocity = replayed.velocity;
    state.spin = replayed.spin;
}

/// Resolve the contacts of the ball that moved from `old_position` to its current
/// position during the last tick. Updates the rally status.
pub fn resolve(
    state: &mut BallState,
    old_position: &Vector3,
    config: &SimulationConfig,
) -> Option<BallEvent> {
    let table = &config.table;
    let physics = &config.physics;
    let mut event = None;

    // Net
    let (old_z, z) = (old_position.z, state.position.z);
    if (old_z > 0.0) != (z > 0.0) && old_z != z {
        let f = old_z / (old_z - z);
        let crossing = old_position + (state.position - old_position) * f;
        if crossing.x.abs() <= table.net_half_width()
            && crossing.y >= table.height
            && crossing.y <= table.net_top()
        {
            let v = state.velocity;
            state.velocity = Vector3::new(
                v.x * physics.net_lateral,
                v.y,
                -v.z * physics.net_reflect,
            );
            state.spin = state.spin.scaled(physics.net_spin_retention);
            state.position = Vector3::new(
                crossing.x,
                crossing.y,
                physics.net_epsilon * state.velocity.z.signum(),
            );
            event = Some(BallEvent::Net {
                point: state.position,
            });
        }
    }

    // Table, judged where the ball passes the contact height
    let contact = table.contact_height();
    if state.velocity.y < 0.0 && state.position.y < contact && old_position.y >= contact {
        let (elapsed, at_contact) = rewind_to(state, contact, physics);
        let point = at_contact.position;
        if table.contains(point.x, point.z) {
            replay_bounce(state, at_contact, elapsed, contact, physics, table_bounce);
            let side = table.side_of(point.z);
            match state.status.after_table_bounce(side) {
                RallyStatus::Dead => state.kill(),
                status => state.status = status,
            }
            state.last_hit = None;
            return Some(BallEvent::Table { side, point });
        }
    }

    // Floor
    let floor = table.ball_radius;
    if state.velocity.y < 0.0 && state.position.y < floor {
        let point = if old_position.y >= floor {
            let (elapsed, at_floor) = rewind_to(state, floor, physics);
            replay_bounce(state, at_floor, elapsed, floor, physics, floor_bounce);
            at_floor.position
        } else {
            let (velocity, spin) = floor_bounce(&state.velocity, state.spin, physics);
            state.velocity = velocity;
            state.spin = spin;
            state.position.y = floor;
            state.position
        };
        state.kill();
        return Some(BallEvent::Floor { point });
    }

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step;
    use approx::assert_abs_diff_eq;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn test_net_reflects_forward_velocity() {
        let config = config();
        let old = Vector3::new(0.1, 0.85, 0.05);
        let mut state = BallState::flying(
            Vector3::new(0.1, 0.85, -0.05),
            Vector3::new(0.5, 0.0, -6.0),
            Spin::new(2.0, 4.0),
            RallyStatus::InPlayToSideA,
        );
        let event = resolve(&mut state, &old, &config);
        assert!(matches!(event, Some(BallEvent::Net { .. })));
        assert!(state.velocity.z > 0.0);
        let physics = &config.physics;
        assert_abs_diff_eq!(state.velocity.z, 6.0 * physics.net_reflect, epsilon = 1e-12);
        assert_abs_diff_eq!(state.velocity.x, 0.5 * physics.net_lateral, epsilon = 1e-12);
        assert!(state.position.z > 0.0);
        assert_eq!(state.spin, Spin::new(1.0, 2.0));
    }

    #[test]
    fn test_net_reflects_in_both_directions() {
        let config = config();
        let old = Vector3::new(-0.2, 0.84, -0.04);
        let mut state = BallState::flying(
            Vector3::new(-0.2, 0.84, 0.06),
            Vector3::new(0.0, 0.5, 5.0),
            Spin::NONE,
            RallyStatus::InPlayToSideB,
        );
        let event = resolve(&mut state, &old, &config);
        assert!(matches!(event, Some(BallEvent::Net { .. })));
        assert_abs_diff_eq!(
            state.velocity.z,
            -5.0 * config.physics.net_reflect,
            epsilon = 1e-12
        );
        assert!(state.position.z < 0.0);
    }

    #[test]
    fn test_ball_over_the_net_passes() {
        let config = config();
        let old = Vector3::new(0.0, 1.1, 0.05);
        let mut state = BallState::flying(
            Vector3::new(0.0, 1.1, -0.05),
            Vector3::new(0.0, 0.0, -6.0),
            Spin::NONE,
            RallyStatus::InPlayToSideA,
        );
        assert_eq!(resolve(&mut state, &old, &config), None);
        assert!(state.velocity.z < 0.0);
    }

    #[test]
    fn test_table_bounce_happens_at_contact_height() {
        let config = config();
        let contact = config.table.contact_height();
        let mut state = BallState::flying(
            Vector3::new(0.2, contact + 0.3, 0.9),
            Vector3::new(0.0, -1.0, -3.0),
            Spin::new(0.0, 3.0),
            RallyStatus::ServeToSideA,
        );
        let mut bounce = None;
        for _ in 0..60 {
            let (next, event) = step(&state, &config);
            state = next;
            if let Some(BallEvent::Table { side, point }) = event {
                bounce = Some((side, point));
                break;
            }
        }
        let (side, point) = bounce.unwrap();
        assert_eq!(side, Side::A);
        assert_abs_diff_eq!(point.y, contact, epsilon = 1e-6);
        assert!(state.velocity.y > 0.0);
        assert_eq!(state.status, RallyStatus::InPlayToSideA);
        assert_eq!(state.last_hit, None);
        assert_eq!(state.spin.top, 3.0 * config.physics.table_top_spin_retention);
    }

    #[test]
    fn test_bounce_near_the_end_line_counts() {
        let config = config();
        let contact = config.table.contact_height();
        // Crosses the contact height over the table, ends the tick past the end line.
        let ball = BallState::flying(
            Vector3::new(0.0, contact + 0.005, -1.30),
            Vector3::new(0.0, -1.0, -6.0),
            Spin::NONE,
            RallyStatus::InPlayToSideA,
        );
        let (next, event) = step(&ball, &config);
        let Some(BallEvent::Table { side, point }) = event else {
            panic!("expected a table bounce, got {event:?}");
        };
        assert_eq!(side, Side::B);
        assert!(point.z > -config.table.half_length());
        assert!(next.position.z < -config.table.half_length());
        assert!(next.velocity.y > 0.0);
        assert_eq!(next.status, RallyStatus::RallyToSideA);
    }

    #[test]
    fn test_no_bounce_beyond_the_end_line() {
        let config = config();
        let contact = config.table.contact_height();
        // Crosses the contact height behind the end line, ends the tick over the table.
        let ball = BallState::flying(
            Vector3::new(0.0, contact + 0.005, -1.45),
            Vector3::new(0.0, -1.0, 6.0),
            Spin::NONE,
            RallyStatus::InPlayToSideA,
        );
        let (next, event) = step(&ball, &config);
        assert_eq!(event, None);
        assert!(config.table.contains(next.position.x, next.position.z));
        assert!(next.velocity.y < 0.0);
        assert_eq!(next.status, RallyStatus::InPlayToSideA);
    }

    #[test]
    fn test_illegal_bounce_kills_the_ball() {
        let config = config();
        let contact = config.table.contact_height();
        let old = Vector3::new(0.0, contact + 0.01, -0.5);
        let mut state = BallState::flying(
            Vector3::new(0.0, contact - 0.01, -0.55),
            Vector3::new(0.0, -1.2, -3.0),
            Spin::NONE,
            RallyStatus::ServeToSideA,
        );
        let event = resolve(&mut state, &old, &config);
        assert!(matches!(event, Some(BallEvent::Table { side: Side::B, .. })));
        assert_eq!(state.status, RallyStatus::Dead);
    }

    #[test]
    fn test_floor_kills_the_ball() {
        let config = config();
        let old = Vector3::new(1.5, 0.03, 2.0);
        let mut state = BallState::flying(
            Vector3::new(1.5, 0.01, 2.1),
            Vector3::new(0.0, -1.2, 3.0),
            Spin::new(2.0, 2.0),
            RallyStatus::RallyToSideB,
        );
        let event = resolve(&mut state, &old, &config);
        assert!(matches!(event, Some(BallEvent::Floor { .. })));
        assert_eq!(state.status, RallyStatus::Dead);
        assert!(state.velocity.y > 0.0);
        assert!(state.position.y >= config.table.ball_radius);
    }
}
