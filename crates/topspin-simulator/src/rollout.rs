use serde::{Deserialize, Serialize};
use topspin_core::{BallState, SimulationConfig};

use crate::{step, BallEvent};

/// Iterator over the future states of a ball.
///
/// Works on its own copy, the ball it was created from is never touched.
#[derive(Debug, Clone)]
pub struct Rollout<'a> {
    state: BallState,
    config: &'a SimulationConfig,
}

impl<'a> Rollout<'a> {
    /// The state after the ticks consumed so far.
    pub fn state(&self) -> &BallState {
        &self.state
    }
}

impl Iterator for Rollout<'_> {
    type Item = (BallState, Option<BallEvent>);

    fn next(&mut self) -> Option<Self::Item> {
        let (next, event) = step(&self.state, self.config);
        self.state = next;
        Some((next, event))
    }
}

/// Roll a copy of `state` forward one tick at a time.
pub fn rollout<'a>(state: &BallState, config: &'a SimulationConfig) -> Rollout<'a> {
    Rollout {
        state: *state,
        config,
    }
}

/// The recorded future of a ball.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Trace {
    /// State after each tick
    pub states: Vec<BallState>,
    /// Contacts, with the index of the tick they happened in
    pub events: Vec<(usize, BallEvent)>,
}

impl Trace {
    pub fn last(&self) -> Option<&BallState> {
        self.states.last()
    }

    pub fn table_bounces(&self) -> impl Iterator<Item = &(usize, BallEvent)> {
        self.events
            .iter()
            .filter(|(_, event)| matches!(event, BallEvent::Table { .. }))
    }
}

/// Simulate `ticks` ticks of a copy of `state`.
pub fn simulate(state: &BallState, ticks: usize, config: &SimulationConfig) -> Trace {
    let mut trace = Trace {
        states: Vec::with_capacity(ticks),
        events: Vec::new(),
    };
    for (i, (state, event)) in rollout(state, config).take(ticks).enumerate() {
        trace.states.push(state);
        if let Some(event) = event {
            trace.events.push((i, event));
        }
    }
    log::trace!("Simulated {} ticks, {} events", ticks, trace.events.len());
    trace
}
