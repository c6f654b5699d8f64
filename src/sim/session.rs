//! Level orchestration: throws, sticks, combos, score, terminal outcomes
//!
//! One `LevelSession` owns a level playthrough end to end. All mutation
//! happens synchronously inside `update(dt)`; the embedding layer reads plain
//! state and drains the per-tick event queue. No global services: sound and
//! score consumers subscribe to [`GameEvent`]s.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::knife::{Impact, Knife, KnifeState};
use super::levels::{BossEncounter, LevelSettings};
use super::target::{Target, TargetSnapshot};
use crate::cartesian_to_polar;
use crate::consts::*;
use crate::progress::GameProgress;

/// Caller errors: programming mistakes in the embedding layer, not runtime
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("knife skin `{0}` is not unlocked")]
    SkinLocked(String),
    #[error("level {0} has no registered boss encounter")]
    NotABossLevel(u32),
}

/// Per-tick notifications for the embedding layer (UI, sound).
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    KnifeThrown { knife_id: u32 },
    KnifeStuck { knife_id: u32, score_delta: i64, combo: u32 },
    AppleSliced { coins: i64 },
    KnifeDeflected { knife_id: u32 },
    LevelCompleted { level: u32, bonus: i64 },
    LevelFailed { level: u32 },
    BossDefeated { level: u32, coin_reward: i64 },
    SkinUnlocked { skin: String },
}

/// A side effect scheduled on the simulation clock
#[derive(Debug, Clone, Copy, PartialEq)]
enum DeferredKind {
    FailLevel,
    DiscardKnife(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Deferred {
    delay: f32,
    kind: DeferredKind,
}

/// Serializable capture of an in-progress level, for pause/resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub level_index: u32,
    pub knives_remaining: u32,
    pub initial_knife_count: u32,
    pub target: TargetSnapshot,
}

/// One playthrough of a level plus the cross-level progress it mutates.
#[derive(Debug, Clone)]
pub struct LevelSession {
    pub seed: u64,
    pub level_index: u32,
    pub settings: LevelSettings,
    pub target: Target,
    pub knives: Vec<Knife>,
    pub knives_remaining: u32,
    pub initial_knife_count: u32,

    pub combo: u32,
    last_stick_time: Option<f32>,
    pub score: i64,
    /// Score as of the last level completion; the only score persisted
    committed_score: i64,
    pub apple_coins: i64,
    /// Rollback mark for the loss-of-progress penalty
    coins_at_level_start: i64,

    pub unlocked_skins: BTreeSet<String>,
    pub equipped_skin: String,
    pub defeated_boss_levels: BTreeSet<u32>,

    /// Terminal latches, mutually exclusive, set at most once per attempt
    pub level_completed: bool,
    pub level_failed: bool,

    /// Global simulation time-scale multiplier (slow motion on deflection)
    pub time_scale: f32,
    slowmo_timer: f32,
    /// Wall-clock throw rate limit, unaffected by `time_scale`
    tap_cooldown: f32,

    deferred: Vec<Deferred>,
    events: Vec<GameEvent>,
    rng: Pcg32,
    next_knife_id: u32,
    sim_time: f32,
}

impl LevelSession {
    /// Fresh run starting at level 1.
    pub fn new(seed: u64) -> Self {
        Self::build(seed, &GameProgress::new_game())
    }

    /// Resume a prior run. If `progress.active_level` is present the level
    /// is reproduced exactly: target angle, rotation state, stuck knives,
    /// apples.
    pub fn from_progress(seed: u64, progress: &GameProgress) -> Self {
        Self::build(seed, progress)
    }

    fn build(seed: u64, progress: &GameProgress) -> Self {
        let mut session = Self {
            seed,
            level_index: progress.level_index,
            settings: LevelSettings::for_level(progress.level_index),
            target: Target {
                radius: TARGET_RADIUS,
                angle: 0.0,
                direction: super::target::RotationDirection::Clockwise,
                speed_deg: 0.0,
                spin: super::target::Spin::Fixed,
                stuck_knives: Vec::new(),
                apples: Vec::new(),
                art: "target_wood",
            },
            knives: Vec::new(),
            knives_remaining: 0,
            initial_knife_count: 0,
            combo: 0,
            last_stick_time: None,
            score: progress.score,
            committed_score: progress.score,
            apple_coins: progress.apple_coins,
            coins_at_level_start: progress.apple_coins,
            unlocked_skins: progress.unlocked_knives.clone(),
            equipped_skin: progress.equipped_knife.clone(),
            defeated_boss_levels: progress.defeated_boss_levels.clone(),
            level_completed: false,
            level_failed: false,
            time_scale: 1.0,
            slowmo_timer: 0.0,
            tap_cooldown: 0.0,
            deferred: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_knife_id: 1,
            sim_time: 0.0,
        };
        session.initialize_level(progress.level_index, progress.active_level.as_ref());
        session
    }

    /// Reset all per-attempt state for `level`, adopting a resume snapshot
    /// when one matches.
    pub fn initialize_level(&mut self, level: u32, snapshot: Option<&LevelSnapshot>) {
        let level = level.max(1);
        self.level_index = level;
        self.settings = LevelSettings::for_level(level);

        let snapshot = snapshot.filter(|s| s.level_index == level);
        match snapshot {
            Some(snap) => {
                self.target = Target::restore(&self.settings, &snap.target);
                self.knives_remaining = snap.knives_remaining;
                self.initial_knife_count = snap.initial_knife_count;
            }
            None => {
                self.target = Target::new_for_level(&self.settings, &mut self.rng);
                self.knives_remaining = self.settings.knife_count;
                self.initial_knife_count = self.settings.knife_count;
            }
        }

        // Pool only holds knives still to be thrown; already-stuck ones live
        // on the target
        let mut pool = Vec::with_capacity(self.knives_remaining as usize);
        for _ in 0..self.knives_remaining {
            let id = self.next_knife_id;
            self.next_knife_id += 1;
            pool.push(Knife::new(id, self.equipped_skin.clone()));
        }
        self.knives = pool;

        self.combo = 0;
        self.last_stick_time = None;
        self.coins_at_level_start = self.apple_coins;
        self.level_completed = false;
        self.level_failed = false;
        self.time_scale = 1.0;
        self.slowmo_timer = 0.0;
        self.tap_cooldown = 0.0;
        self.deferred.clear();
        self.sim_time = 0.0;

        log::info!(
            "level {} start: {} knives, {} apples, boss={}",
            level,
            self.knives_remaining,
            self.target.apples.len(),
            self.settings.is_boss_level()
        );
    }

    // --- lifecycle operations -------------------------------------------

    pub fn start_next_level(&mut self) {
        let next = self.level_index + 1;
        self.initialize_level(next, None);
    }

    pub fn jump_to_level(&mut self, level: u32) {
        self.initialize_level(level, None);
    }

    /// Jump directly to a boss milestone. Calling this for a level with no
    /// registered boss is a caller error.
    pub fn jump_to_boss_level(&mut self, level: u32) -> Result<(), SessionError> {
        if BossEncounter::for_level(level).is_none() {
            return Err(SessionError::NotABossLevel(level));
        }
        self.initialize_level(level, None);
        Ok(())
    }

    /// Restart the current level from a freshly generated layout. Never
    /// adopts a resume snapshot.
    pub fn retry_current_level(&mut self) {
        self.initialize_level(self.level_index, None);
    }

    /// Equip requires the skin to be unlocked; a locked key is a caller
    /// error, not a silent no-op.
    pub fn equip_knife_skin(&mut self, skin: &str) -> Result<(), SessionError> {
        if !self.unlocked_skins.contains(skin) {
            return Err(SessionError::SkinLocked(skin.to_string()));
        }
        self.equipped_skin = skin.to_string();
        // Idle knives pick up the new skin immediately
        for knife in &mut self.knives {
            if knife.state == KnifeState::Idle {
                knife.skin = skin.to_string();
            }
        }
        Ok(())
    }

    // --- input ----------------------------------------------------------

    /// Throw the next idle knife toward the target's current center.
    /// Rate-limited on wall-clock time, so slow motion cannot be used to
    /// spam throws.
    pub fn on_user_tap(&mut self) {
        if self.is_terminal() || self.tap_cooldown > 0.0 {
            return;
        }
        let Some(knife) = self.knives.iter_mut().find(|k| k.state == KnifeState::Idle) else {
            return;
        };
        knife.launch(glam::Vec2::ZERO);
        let id = knife.id;
        self.tap_cooldown = TAP_COOLDOWN;
        self.events.push(GameEvent::KnifeThrown { knife_id: id });
    }

    // --- simulation tick ------------------------------------------------

    /// Advance one tick. `dt` is wall-clock seconds; simulation math runs on
    /// `dt * time_scale` so slow motion keeps every subsystem in lockstep.
    pub fn update(&mut self, dt: f32) {
        // Wall-clock timers first: tap cooldown and the slow-motion window
        self.tap_cooldown = (self.tap_cooldown - dt).max(0.0);
        if self.slowmo_timer > 0.0 {
            self.slowmo_timer -= dt;
            if self.slowmo_timer <= 0.0 {
                self.time_scale = 1.0;
            }
        }

        let dt = dt * self.time_scale;
        self.sim_time += dt;

        self.run_deferred(dt);

        // Deflected exits keep animating even once a terminal flag is set,
        // so the bounce-and-fade finishes and the discard timer can fire
        for knife in &mut self.knives {
            if matches!(knife.state, KnifeState::Deflected { .. }) {
                knife.advance_deflected(dt);
            }
        }

        // Gameplay is frozen after a terminal latch
        if self.is_terminal() {
            return;
        }

        self.target.update(dt, &mut self.rng);

        let mut impacts: Vec<(usize, Impact)> = Vec::new();
        for (idx, knife) in self.knives.iter_mut().enumerate() {
            if knife.state == KnifeState::Flying {
                if let Some(impact) = knife.advance_flying(dt, &self.target) {
                    impacts.push((idx, impact));
                }
            }
        }

        for (idx, impact) in impacts {
            match impact {
                Impact::Rim(hit) => self.resolve_stick(idx, hit.point),
                Impact::StuckKnife(_) => self.resolve_deflection(idx),
            }
        }
    }

    fn run_deferred(&mut self, dt: f32) {
        for action in &mut self.deferred {
            action.delay -= dt;
        }
        let expired: Vec<DeferredKind> = self
            .deferred
            .iter()
            .filter(|a| a.delay <= 0.0)
            .map(|a| a.kind)
            .collect();
        self.deferred.retain(|a| a.delay > 0.0);

        for kind in expired {
            match kind {
                DeferredKind::FailLevel => self.fail_level(),
                DeferredKind::DiscardKnife(id) => {
                    self.knives.retain(|k| k.id != id);
                }
            }
        }
    }

    // --- collision resolution -------------------------------------------

    fn resolve_stick(&mut self, knife_idx: usize, impact: glam::Vec2) {
        if self.is_terminal() {
            return;
        }
        let (_, world_angle) = cartesian_to_polar(impact);

        if self.target.slice_apple_at(world_angle).is_some() {
            self.apple_coins += COINS_PER_APPLE;
            self.events.push(GameEvent::AppleSliced {
                coins: COINS_PER_APPLE,
            });
        }

        let knife = &mut self.knives[knife_idx];
        knife.state = KnifeState::Stuck;
        let knife_id = knife.id;
        let skin = knife.skin.clone();
        self.target.embed(world_angle, skin);

        // Combo: consecutive sticks inside the window keep the streak alive
        let in_window = self
            .last_stick_time
            .is_some_and(|t| self.sim_time - t < COMBO_WINDOW);
        self.combo = if in_window { self.combo + 1 } else { 1 };
        self.last_stick_time = Some(self.sim_time);

        let multiplier = if self.combo >= COMBO_MIN_STREAK {
            COMBO_MULTIPLIER
        } else {
            1.0
        };
        let score_delta = (SCORE_PER_STICK as f32 * multiplier).round() as i64;
        self.score += score_delta;

        self.knives_remaining -= 1;
        self.events.push(GameEvent::KnifeStuck {
            knife_id,
            score_delta,
            combo: self.combo,
        });

        if self.successful_sticks() == self.initial_knife_count {
            self.complete_level();
        }
    }

    fn resolve_deflection(&mut self, knife_idx: usize) {
        if self.is_terminal() {
            return;
        }
        let knife = &mut self.knives[knife_idx];
        knife.deflect();
        let knife_id = knife.id;

        self.combo = 0;
        self.last_stick_time = None;

        // Slow-motion pulse for readability, then the level ends
        self.time_scale = SLOWMO_SCALE;
        self.slowmo_timer = SLOWMO_DURATION;
        self.deferred.push(Deferred {
            delay: FAIL_DELAY,
            kind: DeferredKind::FailLevel,
        });
        self.deferred.push(Deferred {
            delay: DEFLECT_DISCARD_DELAY,
            kind: DeferredKind::DiscardKnife(knife_id),
        });

        self.events.push(GameEvent::KnifeDeflected { knife_id });
    }

    // --- terminal transitions (latched, idempotent) ---------------------

    fn complete_level(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.level_completed = true;

        let bonus = if self.settings.is_boss_level() {
            BOSS_CLEAR_BONUS
        } else {
            LEVEL_CLEAR_BONUS
        };
        self.score += bonus;

        if let Some(boss) = self.settings.boss {
            self.apple_coins += boss.coin_reward;
            self.defeated_boss_levels.insert(boss.level);
            if self.unlocked_skins.insert(boss.reward_knife.to_string()) {
                self.events.push(GameEvent::SkinUnlocked {
                    skin: boss.reward_knife.to_string(),
                });
            }
            self.events.push(GameEvent::BossDefeated {
                level: boss.level,
                coin_reward: boss.coin_reward,
            });
        }

        self.committed_score = self.score;
        self.events.push(GameEvent::LevelCompleted {
            level: self.level_index,
            bonus,
        });
        log::info!("level {} completed, score {}", self.level_index, self.score);
    }

    fn fail_level(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.level_failed = true;
        // Loss-of-progress penalty: coins earned this attempt are forfeit
        self.apple_coins = self.coins_at_level_start;
        self.events.push(GameEvent::LevelFailed {
            level: self.level_index,
        });
        log::info!("level {} failed", self.level_index);
    }

    // --- observable state -----------------------------------------------

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.level_completed || self.level_failed
    }

    #[inline]
    pub fn knives_left(&self) -> u32 {
        self.knives_remaining
    }

    #[inline]
    pub fn successful_sticks(&self) -> u32 {
        self.initial_knife_count - self.knives_remaining
    }

    #[inline]
    pub fn is_boss_level(&self) -> bool {
        self.settings.is_boss_level()
    }

    /// Drain the events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // --- snapshots ------------------------------------------------------

    /// Capture the in-progress level. `None` once a terminal flag is
    /// latched: a finished attempt has nothing meaningful to resume.
    pub fn snapshot_level(&self) -> Option<LevelSnapshot> {
        if self.is_terminal() {
            return None;
        }
        Some(LevelSnapshot {
            level_index: self.level_index,
            knives_remaining: self.knives_remaining,
            initial_knife_count: self.initial_knife_count,
            target: self.target.snapshot(),
        })
    }

    /// Cross-level progress for the persistence boundary. Carries the
    /// committed score, not the live one: a failed attempt's score is never
    /// persisted.
    pub fn snapshot_progress(&self) -> GameProgress {
        GameProgress {
            level_index: self.level_index,
            score: self.committed_score,
            apple_coins: self.apple_coins,
            equipped_knife: self.equipped_skin.clone(),
            unlocked_knives: self.unlocked_skins.clone(),
            defeated_boss_levels: self.defeated_boss_levels.clone(),
            active_level: self.snapshot_level(),
        }
    }
}
