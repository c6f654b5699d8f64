//! The rotating target: spin state machine, embedded knives, rim apples
//!
//! The target's rotation angle accumulates unbounded; it is only wrapped when
//! comparing angular positions. Everything attached to the target (stuck
//! knives, apples) is stored in the target's local frame so it rides the
//! rotation for free.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::levels::{LevelSettings, RotationPattern};
use crate::consts::*;
use crate::{angular_distance, normalize_angle, polar_to_cartesian};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    /// Sign applied to the angular step (counter-clockwise is positive)
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            RotationDirection::Clockwise => -1.0,
            RotationDirection::CounterClockwise => 1.0,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            RotationDirection::Clockwise => RotationDirection::CounterClockwise,
            RotationDirection::CounterClockwise => RotationDirection::Clockwise,
        }
    }
}

/// How the target's rotation speed evolves over the level
#[derive(Debug, Clone, PartialEq)]
pub enum Spin {
    /// Constant speed, direction fixed for the whole level
    Fixed,
    /// Constant speed, direction inverts at randomly scheduled times
    Scheduled {
        /// Seconds until the next flip
        flip_timer: f32,
        /// Re-roll bounds for the next interval
        interval: (f32, f32),
    },
    /// Boss rotation: speed eases toward a periodically re-rolled target
    Boss {
        current_deg: f32,
        target_deg: f32,
        hold_timer: f32,
        pattern: RotationPattern,
    },
}

/// A knife embedded in the target, in the target's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckKnife {
    pub skin: String,
    pub local_pos: Vec2,
    pub local_angle: f32,
}

/// An apple on the rim, in the target's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Apple {
    /// Angular position on the rim (radians, local frame)
    pub angle: f32,
    /// Radial inset from the rim
    pub rim_margin: f32,
}

/// Boss speed-easing state captured for resume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossSpinSnapshot {
    pub current_deg: f32,
    pub target_deg: f32,
    pub hold_timer: f32,
}

/// Exact rotation + attachment state, enough to resume a level bit-for-bit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub angle: f32,
    pub direction: RotationDirection,
    pub speed_deg: f32,
    pub flip_timer: Option<f32>,
    pub boss_spin: Option<BossSpinSnapshot>,
    pub apples: Vec<Apple>,
    pub stuck_knives: Vec<StuckKnife>,
}

/// The rotating circular object at the center of the playfield
#[derive(Debug, Clone)]
pub struct Target {
    pub radius: f32,
    /// Current rotation angle (radians), accumulates unbounded
    pub angle: f32,
    pub direction: RotationDirection,
    /// Base rotation speed for this level (degrees/sec); boss levels track
    /// their live speed inside [`Spin::Boss`] instead
    pub speed_deg: f32,
    pub spin: Spin,
    pub stuck_knives: Vec<StuckKnife>,
    pub apples: Vec<Apple>,
    pub art: &'static str,
}

impl Target {
    /// Build a fresh target for a level: roll the rotation speed, arm the
    /// spin state machine, seed apples.
    pub fn new_for_level(settings: &LevelSettings, rng: &mut Pcg32) -> Self {
        let speed_deg = rng.random_range(settings.speed_min_deg..=settings.speed_max_deg);

        let spin = if let Some(boss) = settings.boss {
            Spin::Boss {
                current_deg: speed_deg,
                target_deg: rng
                    .random_range(boss.pattern.speed_min_deg..=boss.pattern.speed_max_deg),
                hold_timer: rng.random_range(boss.pattern.hold_min_s..=boss.pattern.hold_max_s),
                pattern: boss.pattern,
            }
        } else if let Some((min, max)) = settings.flip_interval {
            Spin::Scheduled {
                flip_timer: rng.random_range(min..=max),
                interval: (min, max),
            }
        } else {
            Spin::Fixed
        };

        let mut target = Self {
            radius: TARGET_RADIUS,
            angle: 0.0,
            direction: RotationDirection::Clockwise,
            speed_deg,
            spin,
            stuck_knives: Vec::new(),
            apples: Vec::new(),
            art: settings.target_art,
        };
        target.seed_apples(settings, rng);
        target
    }

    /// Rebuild a target from a resume snapshot. Settings supply the pieces
    /// that are derivable from the level index (pattern, flip bounds, art).
    pub fn restore(settings: &LevelSettings, snap: &TargetSnapshot) -> Self {
        let spin = if let (Some(boss), Some(bs)) = (settings.boss, snap.boss_spin) {
            Spin::Boss {
                current_deg: bs.current_deg,
                target_deg: bs.target_deg,
                hold_timer: bs.hold_timer,
                pattern: boss.pattern,
            }
        } else if let (Some((min, max)), Some(timer)) = (settings.flip_interval, snap.flip_timer) {
            Spin::Scheduled {
                flip_timer: timer,
                interval: (min, max),
            }
        } else {
            Spin::Fixed
        };

        Self {
            radius: TARGET_RADIUS,
            angle: snap.angle,
            direction: snap.direction,
            speed_deg: snap.speed_deg,
            spin,
            stuck_knives: snap.stuck_knives.clone(),
            apples: snap.apples.clone(),
            art: settings.target_art,
        }
    }

    pub fn snapshot(&self) -> TargetSnapshot {
        let (flip_timer, boss_spin) = match &self.spin {
            Spin::Fixed => (None, None),
            Spin::Scheduled { flip_timer, .. } => (Some(*flip_timer), None),
            Spin::Boss {
                current_deg,
                target_deg,
                hold_timer,
                ..
            } => (
                None,
                Some(BossSpinSnapshot {
                    current_deg: *current_deg,
                    target_deg: *target_deg,
                    hold_timer: *hold_timer,
                }),
            ),
        };
        TargetSnapshot {
            angle: self.angle,
            direction: self.direction,
            speed_deg: self.speed_deg,
            flip_timer,
            boss_spin,
            apples: self.apples.clone(),
            stuck_knives: self.stuck_knives.clone(),
        }
    }

    /// Seed apples on the rim by rejection sampling: each placement must
    /// clear every occupied arc by the padding plus both half-widths. Items
    /// that cannot be placed within the retry bound are skipped.
    fn seed_apples(&mut self, settings: &LevelSettings, rng: &mut Pcg32) {
        if settings.max_apples == 0 {
            return;
        }
        let count = rng.random_range(settings.min_apples..=settings.max_apples);
        let half_width = APPLE_RADIUS / self.radius + PLACEMENT_MARGIN;

        for _ in 0..count {
            match self.find_free_angle(half_width, rng) {
                Some(angle) => self.apples.push(Apple {
                    angle,
                    rim_margin: APPLE_RIM_MARGIN,
                }),
                None => {
                    log::debug!("apple placement exhausted retries, skipping");
                }
            }
        }
    }

    /// Rejection-sample an angle whose arc does not overlap any occupied arc.
    fn find_free_angle(&self, half_width: f32, rng: &mut Pcg32) -> Option<f32> {
        let occupied = self.occupied_arcs();
        for _ in 0..PLACEMENT_RETRIES {
            let candidate = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            let clear = occupied.iter().all(|&(angle, other_half)| {
                angular_distance(candidate, angle).abs() > ARC_PADDING + half_width + other_half
            });
            if clear {
                return Some(candidate);
            }
        }
        None
    }

    /// Angular arcs currently claimed on the rim: (local angle, half-width)
    fn occupied_arcs(&self) -> Vec<(f32, f32)> {
        let knife_half = KNIFE_COLLISION_RADIUS / self.radius + PLACEMENT_MARGIN;
        let apple_half = APPLE_RADIUS / self.radius + PLACEMENT_MARGIN;
        self.stuck_knives
            .iter()
            .map(|k| (k.local_angle, knife_half))
            .chain(self.apples.iter().map(|a| (a.angle, apple_half)))
            .collect()
    }

    /// Live rotation speed magnitude (degrees/sec)
    #[inline]
    pub fn current_speed_deg(&self) -> f32 {
        match &self.spin {
            Spin::Boss { current_deg, .. } => current_deg.abs(),
            _ => self.speed_deg,
        }
    }

    /// Advance rotation and the spin state machine by one tick.
    pub fn update(&mut self, dt: f32, rng: &mut Pcg32) {
        match &mut self.spin {
            Spin::Fixed => {}
            Spin::Scheduled {
                flip_timer,
                interval,
            } => {
                *flip_timer -= dt;
                if *flip_timer <= 0.0 {
                    self.direction = self.direction.flipped();
                    *flip_timer = rng.random_range(interval.0..=interval.1);
                }
            }
            Spin::Boss {
                current_deg,
                target_deg,
                hold_timer,
                pattern,
            } => {
                *hold_timer -= dt;
                if *hold_timer <= 0.0 {
                    *target_deg = rng.random_range(pattern.speed_min_deg..=pattern.speed_max_deg);
                    *hold_timer = rng.random_range(pattern.hold_min_s..=pattern.hold_max_s);
                    if rng.random_bool(pattern.flip_probability) {
                        self.direction = self.direction.flipped();
                    }
                }
                // Ease toward the target speed, clamped so it never overshoots
                let step = pattern.accel_deg_per_s2 * dt;
                *current_deg += (*target_deg - *current_deg).clamp(-step, step);
            }
        }

        self.angle += self.direction.sign() * self.current_speed_deg().to_radians() * dt;
    }

    /// World-space pose of every stuck knife's collision center.
    pub fn stuck_knife_world(&self) -> impl Iterator<Item = Vec2> + '_ {
        let rot = Vec2::from_angle(self.angle);
        self.stuck_knives.iter().map(move |k| rot.rotate(k.local_pos))
    }

    /// Embed a knife at a world-space impact point, converting the pose into
    /// the target's local frame so it keeps rotating with the target.
    pub fn embed(&mut self, impact_world_angle: f32, skin: String) {
        let local_angle = normalize_angle(impact_world_angle - self.angle);
        // Collision center of the embedded knife: the exposed handle just
        // outside the rim
        let handle_r = self.radius + KNIFE_LENGTH / 2.0 - KNIFE_PENETRATION;
        self.stuck_knives.push(StuckKnife {
            skin,
            local_pos: polar_to_cartesian(handle_r, local_angle),
            local_angle,
        });
    }

    /// Slice the apple whose tolerance window contains the impact, if any.
    /// Returns the sliced apple.
    pub fn slice_apple_at(&mut self, impact_world_angle: f32) -> Option<Apple> {
        let local = normalize_angle(impact_world_angle - self.angle);
        let idx = self.apples.iter().position(|a| {
            angular_distance(local, a.angle).abs() < APPLE_ANGLE_TOLERANCE
                && a.rim_margin <= KNIFE_PENETRATION + APPLE_RADIAL_TOLERANCE
        })?;
        Some(self.apples.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn test_fixed_spin_never_flips() {
        let settings = LevelSettings::for_level(1);
        let mut r = rng(7);
        let mut target = Target::new_for_level(&settings, &mut r);
        assert_eq!(target.spin, Spin::Fixed);
        for _ in 0..10_000 {
            target.update(1.0 / 120.0, &mut r);
        }
        assert_eq!(target.direction, RotationDirection::Clockwise);
    }

    #[test]
    fn test_scheduled_spin_flips_direction() {
        let settings = LevelSettings::for_level(8);
        let mut r = rng(3);
        let mut target = Target::new_for_level(&settings, &mut r);
        let start = target.direction;
        // Flip intervals for tier 2 are at most 9 seconds
        for _ in 0..(12 * 120) {
            target.update(1.0 / 120.0, &mut r);
        }
        assert_ne!(target.direction, start);
    }

    #[test]
    fn test_boss_speed_eases_within_bounds() {
        let settings = LevelSettings::for_level(5);
        let boss = settings.boss.unwrap();
        let mut r = rng(11);
        let mut target = Target::new_for_level(&settings, &mut r);
        let dt = 1.0 / 120.0;
        let max_step = boss.pattern.accel_deg_per_s2 * dt;
        let mut prev = target.current_speed_deg();
        for _ in 0..(30 * 120) {
            target.update(dt, &mut r);
            let cur = target.current_speed_deg();
            // Easing is acceleration-bounded: no teleporting speed changes
            assert!(
                (cur - prev).abs() <= max_step + 1e-4,
                "speed jumped {prev} -> {cur}"
            );
            prev = cur;
        }
    }

    #[test]
    fn test_boss_levels_seed_zero_apples() {
        let settings = LevelSettings::for_level(10);
        for seed in 0..50 {
            let mut r = rng(seed);
            let target = Target::new_for_level(&settings, &mut r);
            assert!(target.apples.is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn test_apples_respect_angular_separation() {
        let settings = LevelSettings::for_level(18);
        for seed in 0..50 {
            let mut r = rng(seed);
            let target = Target::new_for_level(&settings, &mut r);
            let half = APPLE_RADIUS / target.radius + PLACEMENT_MARGIN;
            for (i, a) in target.apples.iter().enumerate() {
                for b in target.apples.iter().skip(i + 1) {
                    let gap = angular_distance(a.angle, b.angle).abs();
                    assert!(gap > ARC_PADDING + 2.0 * half, "seed {seed}: gap {gap}");
                }
            }
        }
    }

    #[test]
    fn test_embed_rides_rotation() {
        let settings = LevelSettings::for_level(1);
        let mut r = rng(1);
        let mut target = Target::new_for_level(&settings, &mut r);
        target.angle = 0.4;

        // Impact at the bottom of the target in world space
        let world_angle = -std::f32::consts::FRAC_PI_2;
        target.embed(world_angle, "knife_basic".into());

        let world_pos = target.stuck_knife_world().next().unwrap();
        let (_, theta) = crate::cartesian_to_polar(world_pos);
        assert!((angular_distance(theta, world_angle)).abs() < 1e-4);

        // After more rotation the knife follows the target
        target.angle += 1.0;
        let moved = target.stuck_knife_world().next().unwrap();
        let (_, theta2) = crate::cartesian_to_polar(moved);
        assert!((angular_distance(theta2, world_angle + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_slice_apple_window() {
        let settings = LevelSettings::for_level(1);
        let mut r = rng(2);
        let mut target = Target::new_for_level(&settings, &mut r);
        target.apples.clear();
        target.angle = 1.0;
        target.apples.push(Apple {
            angle: 0.5,
            rim_margin: APPLE_RIM_MARGIN,
        });

        // World angle of the apple is local + target angle
        assert!(target.slice_apple_at(1.5 + 0.2).is_some());
        assert!(target.apples.is_empty());

        // Outside the 20-degree window: no slice
        target.apples.push(Apple {
            angle: 0.5,
            rim_margin: APPLE_RIM_MARGIN,
        });
        assert!(target.slice_apple_at(1.5 + 0.5).is_none());
        assert_eq!(target.apples.len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let settings = LevelSettings::for_level(25);
        let mut r = rng(9);
        let mut target = Target::new_for_level(&settings, &mut r);
        for _ in 0..500 {
            target.update(1.0 / 120.0, &mut r);
        }
        target.embed(0.3, "knife_basic".into());
        target.embed(-1.2, "knife_kunai".into());

        let snap = target.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: TargetSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Target::restore(&settings, &back);

        assert_eq!(restored.angle, target.angle);
        assert_eq!(restored.direction, target.direction);
        assert_eq!(restored.spin, target.spin);
        assert_eq!(restored.stuck_knives, target.stuck_knives);
        assert_eq!(restored.apples, target.apples);
    }
}
