use topspin_core::{horizontal, Spin, Vector2, Vector3};
use topspin_simulator::flight;

use crate::{Bracket, PowerTier, ShotPlanner};

/// A rally launch that lands exactly on its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RallyLaunch {
    /// Flight time until the ball touches the table, in seconds
    pub time: f64,
    pub velocity: Vector3,
}

impl ShotPlanner<'_> {
    /// Launch velocity for a rally shot from `origin` that lands on `target` (`(x, z)`).
    ///
    /// The fastest speed that still clears the net is scaled down by the power tier.
    /// The scaled shot is not checked against the net again. Without any clearing
    /// speed a lobbed fallback towards the target is returned.
    pub fn solve_rally(
        &self,
        origin: &Vector3,
        target: &Vector2,
        spin: Spin,
        tier: PowerTier,
    ) -> Vector3 {
        let Some(best) = self.best_rally_speed(origin, target, spin) else {
            log::warn!(
                "No rally shot from ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}), using fallback",
                origin.x,
                origin.y,
                origin.z,
                target.x,
                target.y
            );
            return self.fallback_rally(origin, target);
        };

        let speed = best * tier.multiplier(self.settings);
        let launch = self
            .rally_launch(origin, target, speed, spin)
            .or_else(|| self.rally_launch(origin, target, best, spin));
        match launch {
            Some(launch) => {
                log::debug!(
                    "Rally shot to ({:.2}, {:.2}) at {:.2} m/s ({:?}), {:.2} s flight",
                    target.x,
                    target.y,
                    launch.velocity.norm(),
                    tier,
                    launch.time
                );
                launch.velocity
            }
            None => self.fallback_rally(origin, target),
        }
    }

    /// The fastest horizontal speed whose shot clears the net, if any.
    pub fn best_rally_speed(&self, origin: &Vector3, target: &Vector2, spin: Spin) -> Option<f64> {
        let settings = self.settings;
        let clearance = self.config.table.net_top() + settings.rally_net_margin;
        let mut bracket = Bracket::new(settings.rally_speed_min, settings.rally_speed_max);
        let mut best = None;
        for _ in 0..settings.iterations {
            let speed = bracket.mid();
            match self.rally_launch(origin, target, speed, spin) {
                None => bracket.raise(speed),
                Some(launch) => {
                    let net = self.net_height(origin, &launch, spin);
                    if net.map_or(true, |height| height > clearance) {
                        best = Some(speed);
                        bracket.raise(speed);
                    } else {
                        bracket.lower(speed);
                    }
                }
            }
            if bracket.width() < settings.rally_speed_tolerance {
                break;
            }
        }
        best
    }

    /// Launch with the given horizontal speed that lands on `target`.
    pub fn rally_launch(
        &self,
        origin: &Vector3,
        target: &Vector2,
        speed: f64,
        spin: Spin,
    ) -> Option<RallyLaunch> {
        let physics = &self.config.physics;
        let reach = flight::reach(&(target - horizontal(origin)), speed, spin.side, physics)?;
        let dy = self.config.table.contact_height() - origin.y;
        let g = physics.gravity_for(spin.top);
        let vy = flight::required_vertical_speed(dy, g, reach.time, physics);
        Some(RallyLaunch {
            time: reach.time,
            velocity: Vector3::new(reach.launch.x, vy, reach.launch.y),
        })
    }

    /// Height of the ball center over the net plane, or `None` if the shot lands
    /// before reaching the net.
    fn net_height(&self, origin: &Vector3, launch: &RallyLaunch, spin: Spin) -> Option<f64> {
        let physics = &self.config.physics;
        let flat = horizontal(&launch.velocity);
        let landing_z =
            origin.z + flight::horizontal_offset(&flat, spin.side, launch.time, physics).y;
        if (origin.z > 0.0) == (landing_z > 0.0) {
            return None;
        }
        let horizon = launch.time + 0.01;
        let t = flight::time_to_depth(origin.z, &flat, spin.side, 0.0, horizon, physics)
            .filter(|&t| t <= launch.time)?;
        let g = physics.gravity_for(spin.top);
        Some(origin.y + flight::vertical_offset(launch.velocity.y, g, t, physics))
    }

    fn fallback_rally(&self, origin: &Vector3, target: &Vector2) -> Vector3 {
        let settings = self.settings;
        let delta = target - horizontal(origin);
        let distance = delta.norm();
        let direction = delta.try_normalize(f64::EPSILON).unwrap_or_else(Vector2::zeros);
        let flat = direction * settings.fallback_speed_per_meter * distance;
        Vector3::new(
            flat.x,
            settings.fallback_lift + settings.fallback_lift_per_meter * distance,
            flat.y,
        )
    }
}
