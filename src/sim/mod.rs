//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Tick-driven only (fixed or variable step, single thread)
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod knife;
pub mod levels;
pub mod session;
pub mod target;

pub use collision::{SweepHit, sweep_circle, sweep_point};
pub use knife::{Impact, Knife, KnifeState};
pub use levels::{BossEncounter, LevelSettings, RotationPattern};
pub use session::{GameEvent, LevelSession, LevelSnapshot, SessionError};
pub use target::{Apple, RotationDirection, Spin, StuckKnife, Target, TargetSnapshot};
