use rand::Rng;
use topspin_core::{horizontal, AgentSettings, Side, TableGeometry, Vector2};
use topspin_planner::PowerTier;

use crate::PeakPrediction;

/// Where and how hard to return the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub target: Vector2,
    pub tier: PowerTier,
}

/// Pick a return target on the opponent's half.
///
/// The lateral zone is random, shifted against the player's own lateral motion. A high
/// ball that bounced close (large peak height over travel) is put away deep and hard, a
/// flat ball is dropped short.
pub fn choose_aim(
    striker: Side,
    incoming: Option<&PeakPrediction>,
    player_velocity: &Vector2,
    rng: &mut impl Rng,
    table: &TableGeometry,
    settings: &AgentSettings,
) -> Aim {
    let usable = table.half_width() - settings.table_margin;
    let zone = rng.gen_range(-1..=1) as f64;
    let x = (zone * settings.lateral_zone * usable - player_velocity.x * settings.lateral_bias)
        .clamp(-usable, usable);

    let ratio = incoming.map(|prediction| {
        let travel = (horizontal(&prediction.peak) - horizontal(&prediction.bounce)).norm();
        (prediction.peak.y - table.contact_height()) / travel.max(1e-6)
    });
    let (depth, tier) = match ratio {
        Some(r) if r > settings.deep_ratio => (settings.deep_depth, PowerTier::Strong),
        Some(r) if r <= settings.mid_ratio => (settings.short_depth, PowerTier::Weak),
        _ => (settings.mid_depth, PowerTier::Medium),
    };
    let z = -striker.sign() * depth * table.half_length();

    Aim {
        target: Vector2::new(x, z),
        tier,
    }
}
