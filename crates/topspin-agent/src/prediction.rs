use topspin_core::{BallState, RallyStatus, Side, SimulationConfig, Vector3};
use topspin_simulator::{rollout, BallEvent};

/// Predicted path of an incoming ball after its bounce on the receiver's half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPrediction {
    /// Highest point after the bounce
    pub peak: Vector3,
    /// Where the ball bounces on the receiver's half
    pub bounce: Vector3,
    /// Ticks until the peak is reached
    pub ticks: usize,
}

/// Roll the ball forward to find the highest point it reaches after legally bouncing on
/// the `receiver`'s half.
///
/// Gives up after `max_ticks` ticks or as soon as the ball dies. Returns `None` if the
/// ball never bounces legally on the receiver's half.
pub fn predict_peak(
    ball: &BallState,
    receiver: Side,
    max_ticks: usize,
    config: &SimulationConfig,
) -> Option<PeakPrediction> {
    let returnable = RallyStatus::rally_to(receiver.opposite());
    let mut bounce = (ball.status == returnable).then_some(ball.position);
    let mut best: Option<(usize, Vector3)> = None;

    for (i, (state, event)) in rollout(ball, config).take(max_ticks).enumerate() {
        if state.status == RallyStatus::Dead {
            break;
        }
        if state.status != returnable {
            continue;
        }
        if let Some(BallEvent::Table { point, .. }) = event {
            bounce.get_or_insert(point);
        }
        if best.map_or(true, |(_, peak)| state.position.y > peak.y) {
            best = Some((i + 1, state.position));
        }
    }

    let (ticks, peak) = best?;
    log::trace!(
        "Predicted peak at ({:.2}, {:.2}, {:.2}) in {} ticks",
        peak.x,
        peak.y,
        peak.z,
        ticks
    );
    Some(PeakPrediction {
        peak,
        bounce: bounce?,
        ticks,
    })
}
