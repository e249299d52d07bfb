use serde::{Deserialize, Serialize};

use crate::Vector3;

/// One half of the table. Side `A` owns `z > 0`, side `B` owns `z < 0`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// `+1` for side A, `-1` for side B.
    pub fn sign(self) -> f64 {
        match self {
            Side::A => 1.0,
            Side::B => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// The side owning the given depth. The net plane counts as side A.
    pub fn of_depth(z: f64) -> Side {
        if z >= 0.0 {
            Side::A
        } else {
            Side::B
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Ball spin in preset units.
///
/// `side` curves the flight horizontally and decays with drag, `top` bends it
/// downwards (or upwards for backspin) and only changes on bounces.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Spin {
    pub side: f64,
    pub top: f64,
}

impl Spin {
    pub const NONE: Spin = Spin {
        side: 0.0,
        top: 0.0,
    };

    pub fn new(side: f64, top: f64) -> Self {
        Self { side, top }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            side: self.side * factor,
            top: self.top * factor,
        }
    }
}

/// The rally state of the ball.
///
/// The side in the name is the side that struck the ball last:
///
/// - `ServeToSideX`: served by X, must bounce on X's half first
/// - `InPlayToSideX`: struck by X, must bounce on the opponent's half next
/// - `RallyToSideX`: struck by X and bounced legally, the opponent must return it
/// - `TossSideX`: tossed by X, about to be served
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i8)]
pub enum RallyStatus {
    Dead = -1,
    RallyToSideA = 0,
    RallyToSideB = 1,
    InPlayToSideA = 2,
    InPlayToSideB = 3,
    ServeToSideA = 4,
    ServeToSideB = 5,
    TossSideA = 6,
    TossSideB = 7,
    WaitingForServe = 8,
}

impl RallyStatus {
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn rally_to(side: Side) -> Self {
        match side {
            Side::A => RallyStatus::RallyToSideA,
            Side::B => RallyStatus::RallyToSideB,
        }
    }

    pub fn in_play_to(side: Side) -> Self {
        match side {
            Side::A => RallyStatus::InPlayToSideA,
            Side::B => RallyStatus::InPlayToSideB,
        }
    }

    pub fn serve_to(side: Side) -> Self {
        match side {
            Side::A => RallyStatus::ServeToSideA,
            Side::B => RallyStatus::ServeToSideB,
        }
    }

    pub fn toss(side: Side) -> Self {
        match side {
            Side::A => RallyStatus::TossSideA,
            Side::B => RallyStatus::TossSideB,
        }
    }

    /// The side that last struck (or tossed) the ball.
    pub fn striker(self) -> Option<Side> {
        use RallyStatus::*;
        match self {
            RallyToSideA | InPlayToSideA | ServeToSideA | TossSideA => Some(Side::A),
            RallyToSideB | InPlayToSideB | ServeToSideB | TossSideB => Some(Side::B),
            Dead | WaitingForServe => None,
        }
    }

    /// Whether the ball is in flight as part of a point.
    pub fn is_live(self) -> bool {
        !matches!(self, RallyStatus::Dead | RallyStatus::WaitingForServe)
    }

    /// Whether `side` may legally strike the ball in this state (ignoring whether it
    /// has bounced yet).
    pub fn is_returnable_by(self, side: Side) -> bool {
        let opponent = side.opposite();
        self == RallyStatus::serve_to(opponent)
            || self == RallyStatus::in_play_to(opponent)
            || self == RallyStatus::rally_to(opponent)
    }

    /// Status after a bounce on the given half of the table.
    pub fn after_table_bounce(self, side: Side) -> Self {
        use RallyStatus::*;
        match (side, self) {
            (Side::A, ServeToSideA) => InPlayToSideA,
            (Side::A, InPlayToSideB) => RallyToSideB,
            (Side::B, ServeToSideB) => InPlayToSideB,
            (Side::B, InPlayToSideA) => RallyToSideA,
            _ => Dead,
        }
    }

    /// Winner of the point if the ball dies while in this state.
    ///
    /// A ball that bounced legally and was not returned wins the point for its striker,
    /// any other dead ball loses it.
    pub fn point_winner(self) -> Option<Side> {
        use RallyStatus::*;
        match self {
            RallyToSideA => Some(Side::A),
            RallyToSideB => Some(Side::B),
            other => other.striker().map(Side::opposite),
        }
    }
}

/// The full ball state as integrated by the simulator.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BallState {
    /// Position of the ball center in meters
    pub position: Vector3,
    /// Velocity in m/s
    pub velocity: Vector3,
    pub spin: Spin,
    pub status: RallyStatus,
    /// Number of ticks spent in [`RallyStatus::Dead`]
    pub dead_ticks: u32,
    /// The side that struck the ball, cleared when it bounces on the table
    pub last_hit: Option<Side>,
}

impl BallState {
    /// A ball held by the server, waiting to be tossed.
    pub fn waiting(position: Vector3) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            spin: Spin::NONE,
            status: RallyStatus::WaitingForServe,
            dead_ticks: 0,
            last_hit: None,
        }
    }

    /// A ball in flight.
    pub fn flying(position: Vector3, velocity: Vector3, spin: Spin, status: RallyStatus) -> Self {
        Self {
            position,
            velocity,
            spin,
            status,
            dead_ticks: 0,
            last_hit: status.striker(),
        }
    }

    /// Apply a strike by `side`.
    ///
    /// A held or tossed ball becomes a serve, anything else is a regular stroke.
    pub fn strike(&mut self, side: Side, velocity: Vector3, spin: Spin) {
        self.status = match self.status {
            RallyStatus::WaitingForServe | RallyStatus::TossSideA | RallyStatus::TossSideB => {
                RallyStatus::serve_to(side)
            }
            _ => RallyStatus::in_play_to(side),
        };
        self.velocity = velocity;
        self.spin = spin;
        self.last_hit = Some(side);
        self.dead_ticks = 0;
    }

    /// Toss the ball from `position` with the given velocity.
    pub fn toss(&mut self, side: Side, position: Vector3, velocity: Vector3) {
        self.position = position;
        self.velocity = velocity;
        self.spin = Spin::NONE;
        self.status = RallyStatus::toss(side);
        self.last_hit = None;
        self.dead_ticks = 0;
    }

    /// Mark the ball as out of play.
    pub fn kill(&mut self) {
        if self.status != RallyStatus::Dead {
            self.status = RallyStatus::Dead;
            self.dead_ticks = 0;
        }
    }
}
