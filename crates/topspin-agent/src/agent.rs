use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use topspin_core::{
    BallState, RallyStatus, ServeCategory, Side, Spin, SwingKind, SwingProfile, TopspinSettings,
    Vector2, Vector3,
};
use topspin_planner::{target_cell, ShotPlanner};
use topspin_simulator::{rollout, step};

use crate::{choose_aim, movement, predict_peak, PeakPrediction, PlayerPose};

/// What an agent wants to do with the ball this tick.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum AgentCommand {
    /// Throw the ball up from `position` to start a serve.
    Toss { position: Vector3, velocity: Vector3 },
    /// Hit the ball.
    Strike { velocity: Vector3, spin: Spin },
}

/// Per-tick information from the match.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// The side that serves the current point
    pub server: Side,
}

/// Outcome of the swing check of an idle agent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingDecision {
    /// The swing has no usable hit window.
    Skipped,
    /// The ball won't be at a hittable distance along the table.
    OutOfZone,
    /// The ball will be out of reach, too low, too high or not bounced yet.
    CannotHit,
    /// Waiting one more tick gives a better contact.
    Deferred,
    /// A shot was planned and the swing started.
    Committed,
}

#[derive(Debug, Clone, Copy)]
struct PendingShot {
    velocity: Vector3,
    spin: Spin,
}

/// A computer player.
///
/// Every tick it observes the ball, moves towards where it expects to hit it, and
/// decides whether starting a swing now puts the racket on the ball when the hit window
/// opens. The decision rolls the ball forward with the same simulation that drives the
/// match.
pub struct Agent {
    settings: TopspinSettings,
    rng: StdRng,
    pose: PlayerPose,
    swing: SwingKind,
    pending: Option<PendingShot>,
    /// Where the racket should meet the ball
    target: Vector3,
    incoming: Option<PeakPrediction>,
    last_status: Option<RallyStatus>,
    category: ServeCategory,
    last_decision: Option<SwingDecision>,
    shots_planned: usize,
}

impl Agent {
    /// Create an agent for `side`, standing with its forehand at the home position.
    pub fn new(side: Side, settings: TopspinSettings, seed: u64) -> Self {
        let home = home_position(side, &settings);
        let offset = settings.swings.forehand.world_offset(side);
        let position = Vector3::new(home.x - offset.x, 0.0, home.z - offset.y);
        Self {
            pose: PlayerPose::new(side, position),
            rng: StdRng::seed_from_u64(seed),
            swing: SwingKind::Forehand,
            pending: None,
            target: home,
            incoming: None,
            last_status: None,
            category: ServeCategory::Standard,
            last_decision: None,
            shots_planned: 0,
            settings,
        }
    }

    pub fn side(&self) -> Side {
        self.pose.side
    }

    pub fn pose(&self) -> &PlayerPose {
        &self.pose
    }

    /// The point the racket is steered to.
    pub fn target(&self) -> &Vector3 {
        &self.target
    }

    /// Outcome of the swing check in the last update, if one ran.
    pub fn last_decision(&self) -> Option<SwingDecision> {
        self.last_decision
    }

    /// Number of rally shots solved so far.
    pub fn shots_planned(&self) -> usize {
        self.shots_planned
    }

    /// Where the ball sits in the serving hand.
    pub fn hand_position(&self) -> Vector3 {
        let kind = if self.swing.is_serve() {
            self.swing
        } else {
            SwingKind::Serve(self.category)
        };
        let offset = self.settings.swings.get(kind).world_offset(self.side());
        Vector3::new(
            self.pose.position.x + offset.x,
            self.settings.agent.hand_height,
            self.pose.position.z + offset.y,
        )
    }

    /// Run one tick. Must be called before the ball is advanced.
    pub fn update(&mut self, ball: &BallState, ctx: &TickContext) -> Option<AgentCommand> {
        self.last_decision = None;
        if self.last_status != Some(ball.status) {
            self.last_status = Some(ball.status);
            self.on_status_change(ball);
        }

        self.move_towards_target(ball);

        if !self.pose.is_idle() {
            return self.advance_swing(ball);
        }
        if ball.status == RallyStatus::WaitingForServe {
            if ctx.server == self.side() && self.is_ready_to_serve() {
                self.start_serve();
            }
            return None;
        }
        if self.is_eligible(ball) && ball.status != RallyStatus::serve_to(self.side().opposite())
        {
            self.last_decision = Some(self.consider_swing(ball));
        }
        None
    }

    /// Whether the ball is ours to return.
    fn is_eligible(&self, ball: &BallState) -> bool {
        ball.status.is_returnable_by(self.side()) && ball.last_hit != Some(self.side())
    }

    fn on_status_change(&mut self, ball: &BallState) {
        self.category = ServeCategory::ALL[self.rng.gen_range(0..ServeCategory::ALL.len())];
        self.incoming = None;
        self.target = home_position(self.side(), &self.settings);
        if !self.is_eligible(ball) {
            return;
        }
        let prediction = predict_peak(
            ball,
            self.side(),
            self.settings.agent.peak_rollout_ticks,
            &self.settings.simulation,
        );
        if let Some(prediction) = prediction {
            log::debug!(
                "Agent {} expects the ball at ({:.2}, {:.2}, {:.2})",
                self.side(),
                prediction.peak.x,
                prediction.peak.y,
                prediction.peak.z
            );
            self.target = prediction.peak;
            self.incoming = Some(prediction);
        }
    }

    fn profile(&self, kind: SwingKind) -> &SwingProfile {
        self.settings.swings.get(kind)
    }

    /// Forehand or backhand, whichever racket point is laterally closer to the target.
    fn choose_hand(&self) -> SwingKind {
        let side = self.side();
        let x = self.pose.position.x;
        let forehand = x + self.profile(SwingKind::Forehand).world_offset(side).x;
        let backhand = x + self.profile(SwingKind::Backhand).world_offset(side).x;
        if (forehand - self.target.x).abs() <= (backhand - self.target.x).abs() {
            SwingKind::Forehand
        } else {
            SwingKind::Backhand
        }
    }

    fn move_towards_target(&mut self, ball: &BallState) {
        if self.profile(self.swing).is_planted(self.pose.swing_progress) {
            self.pose.velocity = Vector2::zeros();
            return;
        }
        let kind = if self.pose.is_idle() || !self.swing.is_serve() {
            self.choose_hand()
        } else {
            self.swing
        };
        let ideal = self.pose.ground() + self.profile(kind).world_offset(self.side());
        let target = Vector2::new(self.target.x, self.target.z);
        let time_to_target = (ball.velocity.z.abs() > 1e-3)
            .then(|| (self.target.z - ball.position.z) / ball.velocity.z);
        let agent = &self.settings.agent;
        let max_speed = if self.is_eligible(ball) {
            agent.max_speed_return
        } else {
            agent.max_speed_reposition
        };
        movement::steer(
            &mut self.pose,
            &ideal,
            &target,
            time_to_target,
            max_speed,
            agent,
            self.settings.simulation.physics.dt,
        );
    }

    fn is_ready_to_serve(&self) -> bool {
        let offset = self.profile(self.choose_hand()).world_offset(self.side());
        let ideal = self.pose.ground() + offset;
        let home = home_position(self.side(), &self.settings);
        (ideal - Vector2::new(home.x, home.z)).norm() < self.settings.agent.serve_ready_distance
    }

    fn start_serve(&mut self) {
        let category = self.category;
        let cell = self.rng.gen_range(1..=9);
        let receiver = self.side().opposite();
        if let Some(aim) = target_cell(cell, receiver, &self.settings.simulation.table) {
            self.pose.aim = aim;
        }
        self.pose.spin = self.settings.spins.get(category);
        self.swing = SwingKind::Serve(category);
        self.pose.swing_progress = 1;
        log::debug!(
            "Agent {} serves category {} to cell {}",
            self.side(),
            category.number(),
            cell
        );
    }

    /// Step the running swing, emitting the toss or the strike on their frames.
    fn advance_swing(&mut self, ball: &BallState) -> Option<AgentCommand> {
        self.pose.swing_progress += 1;
        let progress = self.pose.swing_progress;
        let profile = self.profile(self.swing);
        let (toss_frame, toss_speed) = (profile.toss_frame, profile.toss_speed);
        let (hit_start, length) = (profile.hit_start, profile.length);
        let side = self.side();

        let command = match self.swing {
            SwingKind::Serve(_) => {
                if toss_frame == Some(progress) && ball.status == RallyStatus::WaitingForServe {
                    Some(AgentCommand::Toss {
                        position: self.hand_position(),
                        velocity: Vector3::new(0.0, toss_speed, 0.0),
                    })
                } else if progress == hit_start
                    && (ball.status == RallyStatus::toss(side)
                        || ball.status == RallyStatus::WaitingForServe)
                {
                    let planner = ShotPlanner::new(
                        &self.settings.simulation,
                        &self.settings.planner,
                    );
                    let velocity = planner.solve_serve(
                        &ball.position,
                        &self.pose.aim,
                        self.settings.agent.serve_level,
                        self.pose.spin,
                    );
                    Some(AgentCommand::Strike {
                        velocity,
                        spin: self.pose.spin,
                    })
                } else {
                    None
                }
            }
            SwingKind::Forehand | SwingKind::Backhand if progress == hit_start => self
                .pending
                .take()
                .filter(|_| ball.status.is_live() && ball.last_hit != Some(side))
                .map(|shot| AgentCommand::Strike {
                    velocity: shot.velocity,
                    spin: shot.spin,
                }),
            _ => None,
        };

        if progress >= length {
            self.pose.swing_progress = 0;
            self.pending = None;
        }
        command
    }

    /// Decide whether a swing started now meets the ball at the first frame of its hit
    /// window.
    fn consider_swing(&mut self, ball: &BallState) -> SwingDecision {
        let hand = self.choose_hand();
        let profile = self.profile(hand);
        let hit_start = profile.hit_start;
        if hit_start <= 1 {
            return SwingDecision::Skipped;
        }
        let side = self.side();
        let offset = profile.world_offset(side);
        let forward = profile.contact_offset.y;
        let config = &self.settings.simulation;
        let dt = config.physics.dt;
        let agent = &self.settings.agent;

        let lead = hit_start - 1;
        let at_contact = rollout(ball, config)
            .take(lead as usize)
            .last()
            .map_or(*ball, |(state, _)| state);
        let player = self.pose.extrapolate(lead, dt);
        let gap = (player.y - at_contact.position.z) * side.sign();
        if gap < agent.zone_near || gap > agent.zone_far {
            return SwingDecision::OutOfZone;
        }

        let racket_x = player.x + offset.x;
        let height = at_contact.position.y;
        if (at_contact.position.x - racket_x).abs() > agent.reach
            || height < agent.min_hit_height
            || height > agent.max_hit_height
            || at_contact.status != RallyStatus::rally_to(side.opposite())
        {
            return SwingDecision::CannotHit;
        }

        let (next, _) = step(&at_contact, config);
        let next_player = player + self.pose.velocity * dt;
        let next_gap = (next_player.y - next.position.z) * side.sign();
        if (next_gap - forward).abs() + agent.defer_margin < (gap - forward).abs() {
            return SwingDecision::Deferred;
        }

        let aim = choose_aim(
            side,
            self.incoming.as_ref(),
            &self.pose.velocity,
            &mut self.rng,
            &config.table,
            agent,
        );
        let spin = self.settings.spins.get(self.category);
        let planner = ShotPlanner::new(config, &self.settings.planner);
        let velocity = planner.solve_rally(&at_contact.position, &aim.target, spin, aim.tier);
        log::debug!(
            "Agent {} swings {:?} at gap {:.3}, aiming ({:.2}, {:.2}) {:?}",
            side,
            hand,
            gap,
            aim.target.x,
            aim.target.y,
            aim.tier
        );

        self.pending = Some(PendingShot { velocity, spin });
        self.pose.aim = aim.target;
        self.pose.spin = spin;
        self.swing = hand;
        self.pose.swing_progress = 1;
        self.shots_planned += 1;
        SwingDecision::Committed
    }
}

/// Resting target of the racket for a player of `side`.
fn home_position(side: Side, settings: &TopspinSettings) -> Vector3 {
    let table = &settings.simulation.table;
    Vector3::new(0.0, 0.0, table.home_depth(side, settings.agent.home_depth))
}
