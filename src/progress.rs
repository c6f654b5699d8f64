//! Cross-level progress snapshot and the persistence boundary
//!
//! The core produces and consumes [`GameProgress`]; how it reaches disk,
//! LocalStorage, or a key-value store is the embedding layer's business,
//! behind the [`ProgressStore`] trait.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::LevelSnapshot;

/// Skin every new run starts with
pub const DEFAULT_KNIFE: &str = "knife_basic";

/// Everything that survives across levels and app restarts.
///
/// `active_level` is present only when a level was interrupted mid-attempt;
/// feeding it back through `LevelSession::from_progress` reproduces the
/// target rotation, stuck knives, and apples exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProgress {
    pub level_index: u32,
    pub score: i64,
    pub apple_coins: i64,
    pub equipped_knife: String,
    pub unlocked_knives: BTreeSet<String>,
    pub defeated_boss_levels: BTreeSet<u32>,
    pub active_level: Option<LevelSnapshot>,
}

impl GameProgress {
    /// Fresh progress: level 1, default skin unlocked and equipped.
    pub fn new_game() -> Self {
        let mut unlocked = BTreeSet::new();
        unlocked.insert(DEFAULT_KNIFE.to_string());
        Self {
            level_index: 1,
            score: 0,
            apple_coins: 0,
            equipped_knife: DEFAULT_KNIFE.to_string(),
            unlocked_knives: unlocked,
            defeated_boss_levels: BTreeSet::new(),
            active_level: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("progress serialization cannot fail")
    }

    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(progress) => Some(progress),
            Err(err) => {
                log::warn!("discarding unreadable progress: {err}");
                None
            }
        }
    }
}

impl Default for GameProgress {
    fn default() -> Self {
        Self::new_game()
    }
}

/// Persistence backend boundary. The simulation core never touches storage
/// directly.
pub trait ProgressStore {
    fn load(&self) -> Option<GameProgress>;
    fn save(&mut self, progress: &GameProgress);
}

/// In-memory store for tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Option<GameProgress> {
        self.slot.as_deref().and_then(GameProgress::from_json)
    }

    fn save(&mut self, progress: &GameProgress) {
        self.slot = Some(progress.to_json());
    }
}
