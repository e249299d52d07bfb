use topspin_core::{
    BallState, PlannerSettings, RallyStatus, ServeCategory, Side, SimulationConfig, Spin,
    SpinPresets, Vector2, Vector3,
};
use topspin_planner::{target_cell, PowerTier, ShotPlanner};
use topspin_simulator::{simulate, BallEvent};

fn table_bounces(
    ball: &BallState,
    ticks: usize,
    config: &SimulationConfig,
) -> Vec<(Side, Vector3)> {
    simulate(ball, ticks, config)
        .events
        .into_iter()
        .filter_map(|(_, event)| match event {
            BallEvent::Table { side, point } => Some((side, point)),
            _ => None,
        })
        .collect()
}

/// Solve and replay a serve from side A. Checks the first two bounces and returns all of
/// them.
fn replay_serve(
    origin: Vector3,
    target: Vector2,
    level: f64,
    spin: Spin,
    tolerance: f64,
) -> Vec<(Side, Vector3)> {
    let config = SimulationConfig::default();
    let settings = PlannerSettings::default();
    let planner = ShotPlanner::new(&config, &settings);

    let solution = planner
        .try_serve(&origin, &target, level, spin)
        .unwrap_or_else(|| panic!("no serve to {target:?} with {spin:?}"));
    let ball = BallState::flying(origin, solution.velocity, spin, RallyStatus::ServeToSideA);
    let bounces = table_bounces(&ball, 300, &config);

    assert!(bounces.len() >= 2, "serve to {target:?} with {spin:?}: {bounces:?}");
    let (first_side, first) = bounces[0];
    assert_eq!(first_side, Side::A);
    assert!((first.x - solution.bounce.x).abs() < 0.05);
    assert!((first.z - solution.bounce.y).abs() < 0.05);

    let (second_side, second) = bounces[1];
    assert_eq!(second_side, Side::B);
    assert!(
        (second.x - target.x).abs() < tolerance && (second.z - target.y).abs() < tolerance,
        "serve to {target:?} with {spin:?} landed at {second:?}"
    );
    bounces
}

#[test_log::test]
fn test_serve_round_trip() {
    let targets = [
        Vector2::new(0.0, -0.685),
        Vector2::new(0.38, -0.685),
        Vector2::new(-0.38, -0.685),
    ];
    let spins = [
        Spin::NONE,
        Spin::new(0.0, 5.0),
        Spin::new(0.0, -5.0),
        Spin::new(5.0, 0.0),
    ];
    for target in targets {
        for spin in spins {
            let origin = Vector3::new(0.0, 1.0, 1.87);
            let bounces = replay_serve(origin, target, 1.0, spin, 0.1);
            assert_eq!(bounces.len(), 2, "serve to {target:?} with {spin:?}: {bounces:?}");
        }
    }
}

#[test]
fn test_serves_from_every_depth() {
    let table = SimulationConfig::default().table;
    let presets = SpinPresets::default();
    for z in [1.4, 1.57, 2.0] {
        for (cell, category) in [
            (5, ServeCategory::Standard),
            (7, ServeCategory::HighToss),
            (3, ServeCategory::LowToss),
        ] {
            let target = target_cell(cell, Side::B, &table).unwrap();
            let origin = Vector3::new(0.2, 1.0, z);
            replay_serve(origin, target, 0.75, presets.get(category), 0.05);
        }
    }
}

#[test]
fn test_rally_shots_land_on_target() {
    let config = SimulationConfig::default();
    let settings = PlannerSettings::default();
    let planner = ShotPlanner::new(&config, &settings);
    let origins = [Vector3::new(0.0, 0.95, -1.6), Vector3::new(0.3, 1.1, -1.9)];
    let targets = [Vector2::new(0.3, 0.9), Vector2::new(-0.5, 1.1)];
    let spins = [
        Spin::NONE,
        Spin::new(0.0, 5.0),
        Spin::new(0.0, -4.0),
        Spin::new(3.0, 0.0),
    ];
    for origin in origins {
        for target in targets {
            for spin in spins {
                for tier in [PowerTier::Weak, PowerTier::Strong] {
                    let velocity = planner.solve_rally(&origin, &target, spin, tier);
                    let ball =
                        BallState::flying(origin, velocity, spin, RallyStatus::InPlayToSideB);
                    let trace = simulate(&ball, 200, &config);
                    let (_, first) = trace.events[0];
                    let BallEvent::Table { side, point } = first else {
                        panic!("shot to {target:?} hit {first:?} first");
                    };
                    assert_eq!(side, Side::A);
                    assert!((point.x - target.x).abs() < 0.01, "{point:?} vs {target:?}");
                    assert!((point.z - target.y).abs() < 0.01, "{point:?} vs {target:?}");
                    let after = trace.states[trace.events[0].0];
                    assert_eq!(after.status, RallyStatus::RallyToSideB);
                }
            }
        }
    }
}
