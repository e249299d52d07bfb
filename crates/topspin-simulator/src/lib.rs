mod collision;
pub mod flight;
mod integrator;
mod rollout;

pub use collision::*;
pub use integrator::*;
pub use rollout::*;

use topspin_core::{BallState, RallyStatus, SimulationConfig};

/// Advance the ball by one tick and resolve its contacts.
///
/// A ball waiting for the serve is held in place. A dead ball keeps flying (and
/// bouncing) while its dead tick counter runs.
pub fn step(state: &BallState, config: &SimulationConfig) -> (BallState, Option<BallEvent>) {
    match state.status {
        RallyStatus::WaitingForServe => (*state, None),
        status => {
            let mut next = advance(state, config.physics.dt, &config.physics);
            if status == RallyStatus::Dead {
                next.dead_ticks += 1;
            }
            let event = resolve(&mut next, &state.position, config);
            (next, event)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topspin_core::{Spin, Vector3};

    #[test]
    fn test_waiting_ball_is_held() {
        let config = SimulationConfig::default();
        let ball = BallState::waiting(Vector3::new(0.2, 0.85, 1.6));
        let (next, event) = step(&ball, &config);
        assert_eq!(next, ball);
        assert_eq!(event, None);
    }

    #[test]
    fn test_dead_ball_counts_ticks() {
        let config = SimulationConfig::default();
        let mut ball = BallState::flying(
            Vector3::new(2.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 1.0),
            Spin::NONE,
            RallyStatus::InPlayToSideA,
        );
        ball.kill();
        for _ in 0..5 {
            ball = step(&ball, &config).0;
        }
        assert_eq!(ball.status, RallyStatus::Dead);
        assert_eq!(ball.dead_ticks, 5);
    }
}
