use topspin_core::{horizontal, Side, Spin, Vector2, Vector3};
use topspin_simulator::{flight, table_bounce};

use crate::{Bracket, ShotPlanner};

/// A solved serve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServeSolution {
    /// Launch velocity
    pub velocity: Vector3,
    /// Where the serve bounces on the server's half, as `(x, z)`
    pub bounce: Vector2,
    /// Height of the ball center when it crosses the net plane
    pub net_height: f64,
}

/// Flight of a serve up to and right after its first bounce.
#[derive(Debug, Clone, Copy)]
struct BouncePath {
    launch: Vector3,
    rebound: Vector3,
    spin: Spin,
}

/// Where a rebounding ball passes a given depth.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    x: f64,
    height: f64,
}

impl ShotPlanner<'_> {
    /// Launch velocity for a serve from `origin` that lands on `target` (`(x, z)` on the
    /// receiver's half) after bouncing once on the server's half.
    ///
    /// `level` in `[0, 1]` sets the difficulty: lower levels demand more clearance over
    /// the net. If no serve can be solved a fixed fallback velocity is returned.
    pub fn solve_serve(
        &self,
        origin: &Vector3,
        target: &Vector2,
        level: f64,
        spin: Spin,
    ) -> Vector3 {
        match self.try_serve(origin, target, level, spin) {
            Some(solution) => {
                log::debug!(
                    "Serve to ({:.2}, {:.2}): bounce at ({:.2}, {:.2}), net clearance {:.3}",
                    target.x,
                    target.y,
                    solution.bounce.x,
                    solution.bounce.y,
                    solution.net_height - self.config.table.net_top()
                );
                solution.velocity
            }
            None => {
                log::warn!(
                    "No serve from ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}), using fallback",
                    origin.x,
                    origin.y,
                    origin.z,
                    target.x,
                    target.y
                );
                self.fallback_serve(Side::of_depth(origin.z))
            }
        }
    }

    /// Solve a serve, returning `None` if no bounce depth yields a valid one.
    ///
    /// Every bounce depth on the server's half is tried. Among the serves that clear the
    /// net the fastest one wins.
    pub fn try_serve(
        &self,
        origin: &Vector3,
        target: &Vector2,
        level: f64,
        spin: Spin,
    ) -> Option<ServeSolution> {
        let table = &self.config.table;
        let settings = self.settings;
        let server = Side::of_depth(origin.z);
        let clearance =
            table.net_top() + (1.0 - level.clamp(0.0, 1.0)) * settings.serve_clearance;
        let deepest = table.half_length() - settings.serve_depth_margin;
        if let Err(err) = settings.validate() {
            log::warn!("Not solving serve: {}", err);
            return None;
        }

        let mut best: Option<(f64, ServeSolution)> = None;
        let mut depth = settings.serve_depth_min;
        while depth <= deepest + 1e-9 {
            let candidate = self.serve_speed(origin, depth * server.sign(), target, spin);
            if let Some((speed, bounce, path)) = candidate {
                let net = self
                    .rebound_at(&bounce, &path, 0.0)
                    .filter(|net| net.height > clearance);
                if let Some(net) = net {
                    if best.map_or(true, |(fastest, _)| speed > fastest) {
                        let solution = ServeSolution {
                            velocity: path.launch,
                            bounce,
                            net_height: net.height,
                        };
                        best = Some((speed, solution));
                    }
                }
            }
            depth += settings.serve_depth_step;
        }
        best.map(|(_, solution)| solution)
    }

    /// Fallback serve velocity for the given server.
    pub fn fallback_serve(&self, server: Side) -> Vector3 {
        let fallback = self.settings.fallback_serve;
        let sign = server.sign();
        Vector3::new(fallback.x * sign, fallback.y, -fallback.z * sign)
    }

    /// Bisect the horizontal speed so that the serve bouncing at `depth` comes down on
    /// the target.
    fn serve_speed(
        &self,
        origin: &Vector3,
        depth: f64,
        target: &Vector2,
        spin: Spin,
    ) -> Option<(f64, Vector2, BouncePath)> {
        let settings = self.settings;
        let contact = self.config.table.contact_height();
        let mut bracket = Bracket::new(settings.serve_speed_min, settings.serve_speed_max);
        for _ in 0..settings.iterations {
            let speed = bracket.mid();
            let Some((bounce, path, landing)) = self.aim_bounce(origin, depth, speed, spin, target)
            else {
                // Too slow to get anywhere near the target.
                bracket.raise(speed);
                continue;
            };
            let error = landing.height - contact;
            if error.abs() < settings.height_tolerance
                && (landing.x - target.x).abs() < settings.lateral_tolerance
            {
                return Some((speed, bounce, path));
            }
            if error < 0.0 {
                bracket.raise(speed);
            } else {
                bracket.lower(speed);
            }
        }
        None
    }

    /// Bisect the lateral bounce position so that the rebound passes over the target.
    fn aim_bounce(
        &self,
        origin: &Vector3,
        depth: f64,
        speed: f64,
        spin: Spin,
        target: &Vector2,
    ) -> Option<(Vector2, BouncePath, Crossing)> {
        let table = &self.config.table;
        let half = table.half_width() - table.ball_radius;
        let mut bracket = Bracket::new(-half, half);
        let mut result = None;
        for _ in 0..self.settings.iterations {
            let x = bracket.mid();
            let bounce = Vector2::new(x, depth);
            let path = self.serve_path(origin, &bounce, speed, spin)?;
            let landing = self.rebound_at(&bounce, &path, target.y)?;
            let error = landing.x - target.x;
            result = Some((bounce, path, landing));
            if error.abs() < 1e-4 {
                break;
            }
            if error < 0.0 {
                bracket.raise(x);
            } else {
                bracket.lower(x);
            }
        }
        result
    }

    /// Launch from `origin` so that the ball touches the table exactly at `bounce`.
    fn serve_path(
        &self,
        origin: &Vector3,
        bounce: &Vector2,
        speed: f64,
        spin: Spin,
    ) -> Option<BouncePath> {
        let physics = &self.config.physics;
        let g = physics.gravity_for(spin.top);
        let reach = flight::reach(&(bounce - horizontal(origin)), speed, spin.side, physics)?;
        let dy = self.config.table.contact_height() - origin.y;
        let vy = flight::required_vertical_speed(dy, g, reach.time, physics);

        let arrival = flight::horizontal_velocity(&reach.launch, spin.side, reach.time, physics);
        let arrival = Vector3::new(
            arrival.x,
            flight::vertical_velocity(vy, g, reach.time, physics),
            arrival.y,
        );
        let spin_at_bounce = Spin::new(spin.side * physics.decay(reach.time), spin.top);
        let (rebound, spin) = table_bounce(&arrival, spin_at_bounce, physics);
        Some(BouncePath {
            launch: Vector3::new(reach.launch.x, vy, reach.launch.y),
            rebound,
            spin,
        })
    }

    /// Where the rebound from `bounce` passes `depth`.
    fn rebound_at(&self, bounce: &Vector2, path: &BouncePath, depth: f64) -> Option<Crossing> {
        let physics = &self.config.physics;
        let flat = horizontal(&path.rebound);
        let side = path.spin.side;
        let t = flight::time_to_depth(
            bounce.y,
            &flat,
            side,
            depth,
            self.settings.depth_horizon,
            physics,
        )?;
        let g = physics.gravity_for(path.spin.top);
        Some(Crossing {
            x: bounce.x + flight::horizontal_offset(&flat, side, t, physics).x,
            height: self.config.table.contact_height()
                + flight::vertical_offset(path.rebound.y, g, t, physics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topspin_core::{PlannerSettings, SimulationConfig};

    #[test]
    fn test_impossible_clearance_falls_back() {
        let config = SimulationConfig::default();
        let settings = PlannerSettings {
            serve_clearance: 10.0,
            ..Default::default()
        };
        let planner = ShotPlanner::new(&config, &settings);
        let origin = Vector3::new(0.0, 1.0, 1.87);
        let target = Vector2::new(0.0, -0.685);
        assert_eq!(planner.try_serve(&origin, &target, 0.0, Spin::NONE), None);
        assert_eq!(
            planner.solve_serve(&origin, &target, 0.0, Spin::NONE),
            Vector3::new(0.0, 1.2, -4.0)
        );
    }

    #[test]
    fn test_zero_depth_step_falls_back() {
        let config = SimulationConfig::default();
        let settings = PlannerSettings {
            serve_depth_step: 0.0,
            ..Default::default()
        };
        let planner = ShotPlanner::new(&config, &settings);
        let velocity = planner.solve_serve(
            &Vector3::new(0.0, 1.0, 1.87),
            &Vector2::new(0.0, -0.685),
            0.75,
            Spin::NONE,
        );
        assert_eq!(velocity, Vector3::new(0.0, 1.2, -4.0));
    }

    #[test]
    fn test_fallback_is_mirrored_for_side_b() {
        let config = SimulationConfig::default();
        let settings = PlannerSettings::default();
        let planner = ShotPlanner::new(&config, &settings);
        assert_eq!(planner.fallback_serve(Side::B), Vector3::new(0.0, 1.2, 4.0));
    }

    #[test]
    fn test_solution_clears_the_net() {
        let config = SimulationConfig::default();
        let settings = PlannerSettings::default();
        let planner = ShotPlanner::new(&config, &settings);
        let solution = planner
            .try_serve(
                &Vector3::new(0.0, 1.1, 1.87),
                &Vector2::new(0.38, -0.685),
                0.5,
                Spin::new(0.0, 5.0),
            )
            .unwrap();
        let required = config.table.net_top() + 0.5 * settings.serve_clearance;
        assert!(solution.net_height > required);
        assert!(solution.bounce.y > 0.0);
        assert!(solution.velocity.z < 0.0);
    }
}
