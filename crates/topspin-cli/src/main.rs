use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use topspin_core::{
    BallState, RallyStatus, ServeCategory, Side, TopspinSettings, Vector2, Vector3,
};
use topspin_planner::{target_cell, ShotPlanner};
use topspin_simulator::simulate;
use tracing_subscriber::fmt;

mod game;

use game::Match;

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Play a headless match between two agents.
    #[clap(name = "rally")]
    Rally {
        #[clap(long, default_value = "5")]
        points: u32,
        #[clap(long, default_value = "0")]
        seed: u64,
    },

    /// Solve a serve from side A into a cell of side B and replay it.
    #[clap(name = "serve")]
    Serve {
        /// Keypad cell 1-9 seen from the receiver.
        #[clap(long, default_value = "5")]
        cell: u8,
        #[clap(long, default_value = "1")]
        spin_category: u8,
        #[clap(long, default_value = "0.75")]
        level: f64,
        #[clap(long, default_value = "1.87")]
        from_z: f64,
    },

    /// Print the default settings as JSON.
    #[clap(name = "defaults")]
    Defaults,
}

#[derive(Debug, Parser)]
#[command(name = "topspin")]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(long, short = 'f', default_value = "topspin.json")]
    settings: PathBuf,

    #[clap(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = tracing::Level::from_str(&cli.log_level)
        .map_err(|_| anyhow!("Invalid log level: {}", cli.log_level))?;
    fmt::Subscriber::builder()
        .with_max_level(log_level)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("Unable to set global tracing subscriber: {err}"))?;

    match cli.command {
        Command::Defaults => {
            let json = serde_json::to_string_pretty(&TopspinSettings::default())?;
            println!("{json}");
            Ok(())
        }
        Command::Rally { points, seed } => {
            let settings = load_settings(&cli.settings)?;
            let mut game = Match::new(settings, seed);
            let score = game.play(points);
            tracing::info!("Finished after {} ticks", game.ticks());
            println!("{}", serde_json::to_string(&score)?);
            Ok(())
        }
        Command::Serve {
            cell,
            spin_category,
            level,
            from_z,
        } => {
            let settings = load_settings(&cli.settings)?;
            replay_serve(&settings, cell, spin_category, level, from_z)
        }
    }
}

fn load_settings(path: &Path) -> Result<TopspinSettings> {
    TopspinSettings::load_or_insert(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

fn replay_serve(
    settings: &TopspinSettings,
    cell: u8,
    spin_category: u8,
    level: f64,
    from_z: f64,
) -> Result<()> {
    let table = &settings.simulation.table;
    let Some(target) = target_cell(cell, Side::B, table) else {
        bail!("Cell must be between 1 and 9, got {cell}");
    };
    let category = ServeCategory::from_number(spin_category)
        .ok_or_else(|| anyhow!("Spin category must be between 1 and 3, got {spin_category}"))?;
    let spin = settings.spins.get(category);
    let origin = Vector3::new(0.0, settings.agent.hand_height + 0.1, from_z);

    let planner = ShotPlanner::new(&settings.simulation, &settings.planner);
    let velocity = planner.solve_serve(&origin, &target, level, spin);
    tracing::info!(
        "Serve velocity ({:.3}, {:.3}, {:.3})",
        velocity.x,
        velocity.y,
        velocity.z
    );

    let ball = BallState::flying(origin, velocity, spin, RallyStatus::ServeToSideA);
    let trace = simulate(&ball, 300, &settings.simulation);
    let bounces = trace
        .table_bounces()
        .map(|(tick, event)| (*tick, event.point()))
        .collect::<Vec<_>>();
    for (tick, point) in &bounces {
        println!(
            "tick {tick:3}: table bounce at ({:.3}, {:.3})",
            point.x, point.z
        );
    }
    let landing = bounces
        .get(1)
        .map(|(_, point)| Vector2::new(point.x, point.z))
        .context("The serve never bounced on the receiver's half")?;
    let error = (landing - target).norm();
    println!(
        "target ({:.3}, {:.3}), error {:.4} m",
        target.x, target.y, error
    );
    Ok(())
}
