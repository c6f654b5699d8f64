//! Knife Strike - a rotating-target knife-throw game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (target rotation, projectile physics, level state)
//! - `progress`: Cross-level progress snapshot and the persistence boundary
//!
//! The simulation is headless: rendering, audio, and input plumbing live in the
//! embedding layer and talk to the core through [`sim::GameEvent`]s and opaque
//! art keys.

pub mod progress;
pub mod sim;

pub use progress::{GameProgress, ProgressStore};
pub use sim::{LevelSession, LevelSettings, SessionError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;

    /// Target dimensions (world units, center at origin)
    pub const TARGET_DIAMETER: f32 = 260.0;
    pub const TARGET_RADIUS: f32 = TARGET_DIAMETER / 2.0;

    /// Knife defaults
    pub const KNIFE_SPEED: f32 = 1800.0;
    pub const KNIFE_LENGTH: f32 = 70.0;
    /// How far the tip embeds past the rim on a stick
    pub const KNIFE_PENETRATION: f32 = 28.0;
    /// Collision radius around a stuck knife's exposed handle
    pub const KNIFE_COLLISION_RADIUS: f32 = 14.0;
    /// Throw line sits this far below the target center
    pub const THROW_DISTANCE: f32 = 420.0;
    /// Minimum wall-clock interval between throws (seconds)
    pub const TAP_COOLDOWN: f32 = 0.12;

    /// Combo window between consecutive sticks (seconds)
    pub const COMBO_WINDOW: f32 = 2.0;
    /// Multiplier applied from the third combo stick onward
    pub const COMBO_MULTIPLIER: f32 = 1.5;
    pub const COMBO_MIN_STREAK: u32 = 3;

    /// Score tuning
    pub const SCORE_PER_STICK: i64 = 2;
    pub const LEVEL_CLEAR_BONUS: i64 = 5;
    pub const BOSS_CLEAR_BONUS: i64 = 10;
    /// Apple-coin payout per sliced apple
    pub const COINS_PER_APPLE: i64 = 2;

    /// Apple geometry and slicing tolerances
    pub const APPLE_RADIUS: f32 = 16.0;
    /// Apples sit this far inside the rim
    pub const APPLE_RIM_MARGIN: f32 = 6.0;
    /// Angular window for a slice (radians, ~20 degrees)
    pub const APPLE_ANGLE_TOLERANCE: f32 = 0.35;
    /// Extra radial slack on top of the apple's rim margin
    pub const APPLE_RADIAL_TOLERANCE: f32 = 10.0;

    /// Rim placement: minimum angular gap between seeded items (radians)
    pub const ARC_PADDING: f32 = 0.12;
    /// Extra half-width margin per seeded item (radians)
    pub const PLACEMENT_MARGIN: f32 = 0.08;
    /// Rejection-sampling retry bound before an item is skipped
    pub const PLACEMENT_RETRIES: u32 = 16;

    /// Slow-motion pulse on deflection
    pub const SLOWMO_SCALE: f32 = 0.3;
    pub const SLOWMO_DURATION: f32 = 0.5;
    /// Deferred-action delays after a deflection (simulation seconds)
    pub const FAIL_DELAY: f32 = 0.42;
    pub const DEFLECT_DISCARD_DELAY: f32 = 0.9;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed angular delta from `a` to `b`, wrap-aware
#[inline]
pub fn angular_distance(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_angular_distance_wraps() {
        // 170° to -170° is 20° forward, not 340° back
        let a = 170.0_f32.to_radians();
        let b = -170.0_f32.to_radians();
        assert!((angular_distance(a, b) - 20.0_f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_polar_round_trip() {
        let p = polar_to_cartesian(100.0, PI / 3.0);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 100.0).abs() < 1e-3);
        assert!((theta - PI / 3.0).abs() < 1e-5);
    }
}
