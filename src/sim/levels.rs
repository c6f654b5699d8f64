//! Level difficulty table and boss milestone registry
//!
//! Settings are re-derived from the level index every time a level starts, so
//! nothing in here needs to be persisted.

/// Rotation behavior of a boss target: the current speed eases toward a
/// periodically re-rolled target speed instead of staying constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPattern {
    /// Target-speed roll bounds (degrees/sec)
    pub speed_min_deg: f32,
    pub speed_max_deg: f32,
    /// Easing rate toward the rolled target speed (degrees/sec²)
    pub accel_deg_per_s2: f32,
    /// Hold-duration roll bounds between re-rolls (seconds)
    pub hold_min_s: f32,
    pub hold_max_s: f32,
    /// Chance of inverting rotation direction on each re-roll
    pub flip_probability: f64,
}

/// A boss milestone level: harder rotation, unique art, a knife-skin reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossEncounter {
    pub level: u32,
    pub target_art: &'static str,
    pub reward_knife: &'static str,
    /// Added on top of the tier's knife count
    pub extra_knives: u32,
    /// Apple-coin payout on defeat
    pub coin_reward: i64,
    pub pattern: RotationPattern,
}

/// Every 5th level through 50 is a boss encounter.
static BOSS_ENCOUNTERS: [BossEncounter; 10] = [
    BossEncounter {
        level: 5,
        target_art: "target_boss_tomato",
        reward_knife: "knife_cleaver",
        extra_knives: 1,
        coin_reward: 10,
        pattern: RotationPattern {
            speed_min_deg: 40.0,
            speed_max_deg: 120.0,
            accel_deg_per_s2: 90.0,
            hold_min_s: 1.2,
            hold_max_s: 2.4,
            flip_probability: 0.25,
        },
    },
    BossEncounter {
        level: 10,
        target_art: "target_boss_cheese",
        reward_knife: "knife_dagger",
        extra_knives: 1,
        coin_reward: 12,
        pattern: RotationPattern {
            speed_min_deg: 50.0,
            speed_max_deg: 140.0,
            accel_deg_per_s2: 100.0,
            hold_min_s: 1.0,
            hold_max_s: 2.2,
            flip_probability: 0.3,
        },
    },
    BossEncounter {
        level: 15,
        target_art: "target_boss_log",
        reward_knife: "knife_hatchet",
        extra_knives: 2,
        coin_reward: 14,
        pattern: RotationPattern {
            speed_min_deg: 55.0,
            speed_max_deg: 150.0,
            accel_deg_per_s2: 110.0,
            hold_min_s: 1.0,
            hold_max_s: 2.0,
            flip_probability: 0.3,
        },
    },
    BossEncounter {
        level: 20,
        target_art: "target_boss_donut",
        reward_knife: "knife_katana",
        extra_knives: 2,
        coin_reward: 16,
        pattern: RotationPattern {
            speed_min_deg: 60.0,
            speed_max_deg: 160.0,
            accel_deg_per_s2: 120.0,
            hold_min_s: 0.9,
            hold_max_s: 1.9,
            flip_probability: 0.35,
        },
    },
    BossEncounter {
        level: 25,
        target_art: "target_boss_clock",
        reward_knife: "knife_kunai",
        extra_knives: 2,
        coin_reward: 18,
        pattern: RotationPattern {
            speed_min_deg: 65.0,
            speed_max_deg: 170.0,
            accel_deg_per_s2: 130.0,
            hold_min_s: 0.8,
            hold_max_s: 1.8,
            flip_probability: 0.35,
        },
    },
    BossEncounter {
        level: 30,
        target_art: "target_boss_tire",
        reward_knife: "knife_machete",
        extra_knives: 3,
        coin_reward: 20,
        pattern: RotationPattern {
            speed_min_deg: 70.0,
            speed_max_deg: 180.0,
            accel_deg_per_s2: 140.0,
            hold_min_s: 0.8,
            hold_max_s: 1.6,
            flip_probability: 0.4,
        },
    },
    BossEncounter {
        level: 35,
        target_art: "target_boss_vinyl",
        reward_knife: "knife_trident",
        extra_knives: 3,
        coin_reward: 22,
        pattern: RotationPattern {
            speed_min_deg: 75.0,
            speed_max_deg: 190.0,
            accel_deg_per_s2: 150.0,
            hold_min_s: 0.7,
            hold_max_s: 1.5,
            flip_probability: 0.4,
        },
    },
    BossEncounter {
        level: 40,
        target_art: "target_boss_shield",
        reward_knife: "knife_rapier",
        extra_knives: 3,
        coin_reward: 24,
        pattern: RotationPattern {
            speed_min_deg: 80.0,
            speed_max_deg: 200.0,
            accel_deg_per_s2: 160.0,
            hold_min_s: 0.7,
            hold_max_s: 1.4,
            flip_probability: 0.45,
        },
    },
    BossEncounter {
        level: 45,
        target_art: "target_boss_gear",
        reward_knife: "knife_saber",
        extra_knives: 4,
        coin_reward: 26,
        pattern: RotationPattern {
            speed_min_deg: 85.0,
            speed_max_deg: 210.0,
            accel_deg_per_s2: 170.0,
            hold_min_s: 0.6,
            hold_max_s: 1.3,
            flip_probability: 0.45,
        },
    },
    BossEncounter {
        level: 50,
        target_art: "target_boss_moon",
        reward_knife: "knife_excalibur",
        extra_knives: 4,
        coin_reward: 30,
        pattern: RotationPattern {
            speed_min_deg: 90.0,
            speed_max_deg: 220.0,
            accel_deg_per_s2: 180.0,
            hold_min_s: 0.6,
            hold_max_s: 1.2,
            flip_probability: 0.5,
        },
    },
];

impl BossEncounter {
    /// Registry lookup: `Some` only for registered milestone levels.
    pub fn for_level(level: u32) -> Option<&'static BossEncounter> {
        BOSS_ENCOUNTERS.iter().find(|b| b.level == level)
    }

    pub fn all() -> &'static [BossEncounter] {
        &BOSS_ENCOUNTERS
    }
}

/// Fully resolved settings for one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    pub level: u32,
    pub knife_count: u32,
    /// Rotation-speed roll bounds (degrees/sec)
    pub speed_min_deg: f32,
    pub speed_max_deg: f32,
    pub min_apples: u32,
    pub max_apples: u32,
    /// Direction-flip scheduling bounds (seconds); `None` = fixed direction
    pub flip_interval: Option<(f32, f32)>,
    pub target_art: &'static str,
    pub boss: Option<&'static BossEncounter>,
}

impl LevelSettings {
    /// Resolve settings for a level index (1-based).
    ///
    /// Tiered difficulty table; a registered boss milestone overrides the
    /// tier unconditionally (more knives, no apples, its own rotation
    /// pattern and art).
    pub fn for_level(level: u32) -> LevelSettings {
        let level = level.max(1);

        let mut settings = match level {
            1..=5 => LevelSettings {
                level,
                knife_count: 7,
                speed_min_deg: 40.0,
                speed_max_deg: 60.0,
                min_apples: 0,
                max_apples: 1,
                flip_interval: None,
                target_art: "target_wood",
                boss: None,
            },
            6..=10 => LevelSettings {
                level,
                knife_count: 8,
                speed_min_deg: 50.0,
                speed_max_deg: 75.0,
                min_apples: 0,
                max_apples: 2,
                flip_interval: Some((6.0, 9.0)),
                target_art: "target_wood",
                boss: None,
            },
            11..=15 => LevelSettings {
                level,
                knife_count: 9,
                speed_min_deg: 60.0,
                speed_max_deg: 90.0,
                min_apples: 1,
                max_apples: 2,
                flip_interval: Some((5.0, 8.0)),
                target_art: "target_oak",
                boss: None,
            },
            16..=20 => LevelSettings {
                level,
                knife_count: 10,
                speed_min_deg: 70.0,
                speed_max_deg: 100.0,
                min_apples: 1,
                max_apples: 3,
                flip_interval: Some((4.0, 7.0)),
                target_art: "target_oak",
                boss: None,
            },
            21..=30 => LevelSettings {
                level,
                knife_count: 11,
                speed_min_deg: 80.0,
                speed_max_deg: 110.0,
                min_apples: 1,
                max_apples: 3,
                flip_interval: Some((3.0, 6.0)),
                target_art: "target_stone",
                boss: None,
            },
            _ => LevelSettings {
                level,
                knife_count: 12,
                speed_min_deg: 90.0,
                speed_max_deg: 120.0,
                min_apples: 1,
                max_apples: 3,
                flip_interval: Some((2.0, 5.0)),
                target_art: "target_stone",
                boss: None,
            },
        };

        // Boss override is total: it always supersedes the tier.
        if let Some(boss) = BossEncounter::for_level(level) {
            settings.knife_count += boss.extra_knives;
            settings.speed_min_deg = boss.pattern.speed_min_deg;
            settings.speed_max_deg = boss.pattern.speed_max_deg;
            settings.min_apples = 0;
            settings.max_apples = 0;
            settings.flip_interval = None;
            settings.target_art = boss.target_art;
            settings.boss = Some(boss);
        }

        settings
    }

    #[inline]
    pub fn is_boss_level(&self) -> bool {
        self.boss.is_some()
    }
}
