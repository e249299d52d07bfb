use serde::Serialize;
use topspin_agent::{Agent, AgentCommand, TickContext};
use topspin_core::{BallState, RallyStatus, Side, TopspinSettings};
use topspin_simulator::{step, BallEvent};

/// Points won per side, plus replayed points.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub a: u32,
    pub b: u32,
    pub lets: u32,
}

impl Score {
    /// Points that were won by either side.
    pub fn decided(&self) -> u32 {
        self.a + self.b
    }

    fn award(&mut self, side: Side) {
        match side {
            Side::A => self.a += 1,
            Side::B => self.b += 1,
        }
    }
}

/// How a point ended.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointOutcome {
    Won(Side),
    /// The point ran too long and is replayed.
    Let,
}

/// Headless agent-vs-agent match.
pub struct Match {
    settings: TopspinSettings,
    ball: BallState,
    agents: [Agent; 2],
    first_server: Side,
    server: Side,
    score: Score,
    /// Ticks since the current point started
    point_ticks: u32,
    ticks: u64,
    events: Vec<(u64, BallEvent)>,
}

impl Match {
    pub fn new(settings: TopspinSettings, seed: u64) -> Self {
        let agents = [
            Agent::new(Side::A, settings.clone(), seed),
            Agent::new(Side::B, settings.clone(), seed.wrapping_add(1)),
        ];
        let ball = BallState::waiting(agents[0].hand_position());
        Self {
            settings,
            ball,
            agents,
            first_server: Side::A,
            server: Side::A,
            score: Score::default(),
            point_ticks: 0,
            ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn agent(&self, side: Side) -> &Agent {
        match side {
            Side::A => &self.agents[0],
            Side::B => &self.agents[1],
        }
    }

    pub fn server(&self) -> Side {
        self.server
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Contacts of the ball with net, table and floor, with their tick.
    pub fn events(&self) -> &[(u64, BallEvent)] {
        &self.events
    }

    /// Play until `points` points (lets included) have ended.
    pub fn play(&mut self, points: u32) -> Score {
        let mut ended = 0;
        while ended < points {
            if let Some(outcome) = self.tick() {
                tracing::info!(
                    "Point {} {:?}, score {}:{} after {} ticks",
                    ended + 1,
                    outcome,
                    self.score.a,
                    self.score.b,
                    self.ticks
                );
                ended += 1;
            }
        }
        self.score
    }

    /// Advance the match by one tick. Returns the outcome once a point ends.
    pub fn tick(&mut self) -> Option<PointOutcome> {
        if self.ball.status == RallyStatus::WaitingForServe {
            self.ball.position = self.agent(self.server).hand_position();
        }

        let ctx = TickContext {
            server: self.server,
        };
        for agent in self.agents.iter_mut() {
            let side = agent.side();
            match agent.update(&self.ball, &ctx) {
                Some(AgentCommand::Toss { position, velocity }) => {
                    self.ball.toss(side, position, velocity);
                }
                Some(AgentCommand::Strike { velocity, spin }) => {
                    tracing::debug!("{} strikes at {:?}", side, self.ball.position);
                    self.ball.strike(side, velocity, spin);
                }
                None => {}
            }
        }

        let before = self.ball.status;
        let (ball, event) = step(&self.ball, &self.settings.simulation);
        self.ball = ball;
        self.ticks += 1;
        self.point_ticks += 1;
        if let Some(event) = event {
            tracing::trace!("{:?} -> {:?}", event, self.ball.status);
            self.events.push((self.ticks, event));
        }

        let game = &self.settings.game;
        let dead = self.ball.status == RallyStatus::Dead;
        if dead && before != RallyStatus::Dead {
            let winner = before.point_winner()?;
            self.score.award(winner);
            return Some(PointOutcome::Won(winner));
        }
        if dead {
            if self.ball.dead_ticks >= game.reset_after_ticks {
                self.next_point();
            }
            None
        } else if self.point_ticks > game.max_point_ticks {
            tracing::warn!("Point exceeded {} ticks, replaying it", game.max_point_ticks);
            self.score.lets += 1;
            self.next_point();
            Some(PointOutcome::Let)
        } else {
            None
        }
    }

    /// Reset the ball into the hand of the next server.
    fn next_point(&mut self) {
        let turn = self.score.decided() / self.settings.game.serves_per_turn.max(1);
        self.server = if turn % 2 == 0 {
            self.first_server
        } else {
            self.first_server.opposite()
        };
        self.ball = BallState::waiting(self.agent(self.server).hand_position());
        self.point_ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_alternates_every_turn() {
        let mut game = Match::new(TopspinSettings::default(), 1);
        let mut servers = vec![];
        for winner in [Side::A, Side::B, Side::B, Side::A, Side::A] {
            game.score.award(winner);
            game.next_point();
            servers.push(game.server());
        }
        assert_eq!(
            servers,
            vec![Side::A, Side::B, Side::B, Side::A, Side::A]
        );
        assert_eq!(game.ball().status, RallyStatus::WaitingForServe);
    }

    #[test]
    fn test_let_keeps_the_server() {
        let mut game = Match::new(TopspinSettings::default(), 1);
        game.score.award(Side::A);
        game.score.lets += 3;
        game.next_point();
        assert_eq!(game.server(), Side::A);
    }

    #[test]
    fn test_serve_starts_the_point() {
        let mut game = Match::new(TopspinSettings::default(), 4);
        let mut statuses = vec![game.ball().status];
        for _ in 0..120 {
            game.tick();
            if statuses.last() != Some(&game.ball().status) {
                statuses.push(game.ball().status);
            }
        }
        assert_eq!(
            &statuses[..4],
            &[
                RallyStatus::WaitingForServe,
                RallyStatus::TossSideA,
                RallyStatus::ServeToSideA,
                RallyStatus::InPlayToSideA,
            ]
        );
    }

    #[test]
    fn test_points_are_scored() {
        let settings = TopspinSettings::default();
        let max_point_ticks = settings.game.max_point_ticks as u64;
        let reset_ticks = settings.game.reset_after_ticks as u64;
        let mut game = Match::new(settings, 9);
        let score = game.play(4);
        assert_eq!(score.decided() + score.lets, 4);
        assert!(game.ticks() <= 4 * (max_point_ticks + reset_ticks + 2));
        assert!(game
            .events()
            .iter()
            .any(|(_, event)| matches!(event, BallEvent::Table { .. })));
    }
}
