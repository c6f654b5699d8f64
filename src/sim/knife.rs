//! Knife projectile: Idle -> Flying -> (Stuck | Deflected)
//!
//! A flying knife moves on a fixed unit direction captured at throw time (no
//! homing) and sweeps its full per-tick segment against the target: stuck
//! knives first (a hit there is a deflection), the rim second (a stick).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{SweepHit, sweep_circle, sweep_point};
use super::target::Target;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KnifeState {
    /// Waiting at the throw line
    Idle,
    /// In flight toward the target
    Flying,
    /// Transferred to the target as a `StuckKnife`; inert as a projectile
    Stuck,
    /// Bounced off a stuck knife; plays the fall-and-fade exit
    Deflected { timer: f32 },
}

/// What a flying knife ran into this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Impact {
    /// Swept segment entered the target rim
    Rim(SweepHit),
    /// Swept segment passed within the collision radius of a stuck knife
    StuckKnife(SweepHit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Knife {
    pub id: u32,
    pub skin: String,
    pub pos: Vec2,
    /// Unit flight direction, set once at launch
    pub dir: Vec2,
    /// Free velocity, used only while deflected
    pub vel: Vec2,
    pub state: KnifeState,
}

impl Knife {
    pub fn new(id: u32, skin: String) -> Self {
        Self {
            id,
            skin,
            pos: Vec2::new(0.0, -THROW_DISTANCE),
            dir: Vec2::ZERO,
            vel: Vec2::ZERO,
            state: KnifeState::Idle,
        }
    }

    /// Launch toward the target's current center. The direction is frozen
    /// here; the knife does not re-aim in flight.
    pub fn launch(&mut self, target_center: Vec2) {
        debug_assert_eq!(self.state, KnifeState::Idle);
        self.dir = (target_center - self.pos).normalize_or_zero();
        self.state = KnifeState::Flying;
    }

    /// Advance one tick of flight. Commits the tentative step unless the
    /// swept segment hits something, in which case the knife stops at the
    /// contact point and the impact is returned for the session to resolve.
    ///
    /// Knife-on-knife contact takes priority over the rim: the earliest
    /// stuck-knife hit along the segment wins even if the rim is also
    /// crossed this tick.
    pub fn advance_flying(&mut self, dt: f32, target: &Target) -> Option<Impact> {
        debug_assert_eq!(self.state, KnifeState::Flying);
        let tentative = self.pos + self.dir * KNIFE_SPEED * dt;

        let knife_hit = target
            .stuck_knife_world()
            .filter_map(|p| sweep_point(self.pos, tentative, p, KNIFE_COLLISION_RADIUS))
            .min_by(|a, b| a.t.total_cmp(&b.t));
        if let Some(hit) = knife_hit {
            self.pos = hit.point;
            return Some(Impact::StuckKnife(hit));
        }

        if let Some(hit) = sweep_circle(self.pos, tentative, Vec2::ZERO, target.radius) {
            self.pos = hit.point;
            return Some(Impact::Rim(hit));
        }

        self.pos = tentative;
        None
    }

    /// Kick the knife into its deflected exit: bounce back and away from the
    /// target, then fall under gravity while the fade timer runs.
    pub fn deflect(&mut self) {
        let away = -self.dir;
        let tangent = Vec2::new(-away.y, away.x);
        self.vel = (away * 0.8 + tangent * 0.4).normalize_or_zero() * KNIFE_SPEED * 0.25;
        self.state = KnifeState::Deflected {
            timer: DEFLECT_DISCARD_DELAY,
        };
    }

    /// Advance the deflected tumble. Returns true while still animating.
    pub fn advance_deflected(&mut self, dt: f32) -> bool {
        if let KnifeState::Deflected { ref mut timer } = self.state {
            self.vel.y -= 2200.0 * dt;
            self.pos += self.vel * dt;
            *timer -= dt;
            *timer > 0.0
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::LevelSettings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn still_target() -> Target {
        let settings = LevelSettings::for_level(1);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut t = Target::new_for_level(&settings, &mut rng);
        t.apples.clear();
        t
    }

    #[test]
    fn test_launch_aims_at_center() {
        let mut knife = Knife::new(1, "knife_basic".into());
        knife.launch(Vec2::ZERO);
        assert_eq!(knife.state, KnifeState::Flying);
        assert!((knife.dir - Vec2::new(0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_flight_reaches_rim() {
        let target = still_target();
        let mut knife = Knife::new(1, "knife_basic".into());
        knife.launch(Vec2::ZERO);

        let dt = 1.0 / 120.0;
        let mut impact = None;
        for _ in 0..200 {
            impact = knife.advance_flying(dt, &target);
            if impact.is_some() {
                break;
            }
        }
        match impact {
            Some(Impact::Rim(hit)) => {
                assert!((hit.point.length() - target.radius).abs() < 1e-2);
                assert!(hit.point.y < 0.0);
            }
            other => panic!("expected rim impact, got {other:?}"),
        }
    }

    #[test]
    fn test_stuck_knife_takes_priority_over_rim() {
        let mut target = still_target();
        target.angle = 0.0;
        // Handle of a stuck knife sits just outside the rim, directly on the
        // incoming flight path
        target.embed(-std::f32::consts::FRAC_PI_2, "knife_basic".into());

        let mut knife = Knife::new(2, "knife_basic".into());
        knife.launch(Vec2::ZERO);

        let dt = 1.0 / 120.0;
        let mut impact = None;
        for _ in 0..200 {
            impact = knife.advance_flying(dt, &target);
            if impact.is_some() {
                break;
            }
        }
        assert!(matches!(impact, Some(Impact::StuckKnife(_))), "{impact:?}");
        // Stopped short of the rim
        assert!(knife.pos.length() > target.radius);
    }

    #[test]
    fn test_single_tick_sweep_no_tunneling() {
        // One giant tick: the whole flight happens in a single swept segment
        let target = still_target();
        let mut knife = Knife::new(3, "knife_basic".into());
        knife.launch(Vec2::ZERO);

        let impact = knife.advance_flying(1.0, &target);
        assert!(matches!(impact, Some(Impact::Rim(_))), "{impact:?}");
    }

    #[test]
    fn test_deflected_falls_and_expires() {
        let mut knife = Knife::new(4, "knife_basic".into());
        knife.launch(Vec2::ZERO);
        knife.deflect();

        let dt = 1.0 / 120.0;
        let mut alive = true;
        let mut ticks = 0;
        while alive && ticks < 10_000 {
            alive = knife.advance_deflected(dt);
            ticks += 1;
        }
        assert!(!alive);
        let expected = (DEFLECT_DISCARD_DELAY / dt).ceil() as i32;
        assert!((ticks - expected).abs() <= 1);
    }
}
