//! Knife Strike demo entry point
//!
//! Headless autoplay: drives the simulation at the fixed timestep with a
//! simple bot that throws whenever the flight path is clear. Handy for
//! smoke-testing determinism and level pacing from the command line:
//!
//! ```text
//! knife-strike [seed] [levels]
//! ```

use std::f32::consts::FRAC_PI_2;

use knife_strike::consts::*;
use knife_strike::progress::{MemoryStore, ProgressStore};
use knife_strike::sim::{GameEvent, LevelSession};
use knife_strike::{angular_distance, cartesian_to_polar};

/// Throw only when no stuck-knife handle sits near the flight path, with
/// headroom for the rotation that happens while the knife is in the air.
fn path_clear(session: &LevelSession) -> bool {
    let flight = (THROW_DISTANCE - TARGET_RADIUS) / KNIFE_SPEED;
    let sweep = session.target.current_speed_deg().to_radians() * flight;
    let margin = sweep * 1.2 + 0.15;
    session.target.stuck_knife_world().all(|p| {
        let (_, theta) = cartesian_to_polar(p);
        angular_distance(theta, -FRAC_PI_2).abs() > margin
    })
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let levels: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);

    let mut store = MemoryStore::default();
    let mut session = LevelSession::new(seed);
    log::info!("autoplay: seed {seed}, target {levels} levels");

    let mut completed = 0;
    let mut attempts = 0;
    while completed < levels {
        if path_clear(&session) {
            session.on_user_tap();
        }
        session.update(SIM_DT);

        for event in session.drain_events() {
            match event {
                GameEvent::KnifeDeflected { knife_id } => {
                    log::warn!("knife {knife_id} deflected");
                }
                GameEvent::BossDefeated { level, coin_reward } => {
                    log::info!("boss {level} down, +{coin_reward} coins");
                }
                GameEvent::SkinUnlocked { skin } => {
                    log::info!("unlocked {skin}");
                }
                _ => {}
            }
        }

        if session.level_completed {
            completed += 1;
            attempts += 1;
            store.save(&session.snapshot_progress());
            log::info!(
                "level {} cleared ({} total), score {}",
                session.level_index,
                completed,
                session.score
            );
            session.start_next_level();
        } else if session.level_failed {
            attempts += 1;
            session.retry_current_level();
        }
    }

    let progress = store.load().unwrap_or_default();
    println!(
        "cleared {completed} levels in {attempts} attempts: score {}, {} coins, {} skins, bosses {:?}",
        progress.score,
        progress.apple_coins,
        progress.unlocked_knives.len(),
        progress.defeated_boss_levels
    );
}
