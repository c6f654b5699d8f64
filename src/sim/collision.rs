//! Swept collision tests for the knife flight path
//!
//! A knife covers a lot of ground in one tick (1800 units/s at 120 Hz is still
//! 15 units per step, and frame-locked callers may tick far coarser), so a
//! point sample can tunnel straight through the rim or a stuck knife's thin
//! silhouette. Both tests here work on the full segment the knife sweeps this
//! tick and report the earliest contact along it.

use glam::Vec2;

/// Earliest contact along a swept segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Segment parameter of the contact, in [0, 1]
    pub t: f32,
    /// Contact point in world space
    pub point: Vec2,
}

/// Test the segment `p0 -> p1` against a circle.
///
/// Solves |p0 + t*d - center|² = radius² for the smallest root t in [0, 1].
/// Returns `None` when the segment never reaches the circle this tick, and
/// also when `p0` already starts inside (the caller resolved that contact on
/// a previous tick).
pub fn sweep_circle(p0: Vec2, p1: Vec2, center: Vec2, radius: f32) -> Option<SweepHit> {
    let d = p1 - p0;
    let m = p0 - center;

    if m.length() < radius {
        return None;
    }

    let a = d.length_squared();
    if a < 1e-8 {
        return None; // Degenerate segment
    }
    let b = 2.0 * m.dot(d);
    let c = m.length_squared() - radius * radius;

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    // Smaller root first; it is the entry point
    let sqrt_disc = disc.sqrt();
    let t = (-b - sqrt_disc) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some(SweepHit {
        t,
        point: p0 + d * t,
    })
}

/// Test the segment `p0 -> p1` against a point with a collision radius.
///
/// Classic point-to-segment distance: if the closest approach of `point` to
/// the swept segment is within `radius`, the contact is registered at the
/// closest point on the segment.
pub fn sweep_point(p0: Vec2, p1: Vec2, point: Vec2, radius: f32) -> Option<SweepHit> {
    let d = p1 - p0;
    let len_sq = d.length_squared();

    let t = if len_sq < 1e-8 {
        0.0
    } else {
        ((point - p0).dot(d) / len_sq).clamp(0.0, 1.0)
    };

    let closest = p0 + d * t;
    if (point - closest).length() < radius {
        Some(SweepHit { t, point: closest })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sweep_circle_head_on() {
        // Straight shot at a circle of radius 130 centered at origin
        let hit = sweep_circle(Vec2::new(0.0, -420.0), Vec2::new(0.0, 0.0), Vec2::ZERO, 130.0)
            .expect("must hit");
        assert!((hit.point.y - (-130.0)).abs() < 1e-3);
        assert!(hit.point.x.abs() < 1e-3);
    }

    #[test]
    fn test_sweep_circle_falls_short() {
        let hit = sweep_circle(
            Vec2::new(0.0, -420.0),
            Vec2::new(0.0, -200.0),
            Vec2::ZERO,
            130.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_sweep_circle_tangent_miss() {
        // Vertical segment passing well left of the circle
        let hit = sweep_circle(
            Vec2::new(-200.0, -420.0),
            Vec2::new(-200.0, 420.0),
            Vec2::ZERO,
            130.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_sweep_circle_starts_inside() {
        let hit = sweep_circle(Vec2::new(0.0, -50.0), Vec2::new(0.0, 50.0), Vec2::ZERO, 130.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_sweep_point_crosses() {
        // Segment passes 5 units left of the point, radius 14 catches it
        let hit = sweep_point(
            Vec2::new(-5.0, -100.0),
            Vec2::new(-5.0, 100.0),
            Vec2::new(0.0, 0.0),
            14.0,
        )
        .expect("must hit");
        assert!((hit.point.x - (-5.0)).abs() < 1e-4);
        assert!(hit.point.y.abs() < 1e-3);
    }

    #[test]
    fn test_sweep_point_out_of_reach() {
        let hit = sweep_point(
            Vec2::new(-20.0, -100.0),
            Vec2::new(-20.0, 100.0),
            Vec2::ZERO,
            14.0,
        );
        assert!(hit.is_none());
    }

    proptest! {
        /// Any reported circle contact lies on the circle and on the segment.
        #[test]
        fn prop_circle_hit_on_boundary(
            x0 in -500.0f32..500.0,
            y0 in -500.0f32..-200.0,
            x1 in -500.0f32..500.0,
            y1 in -150.0f32..500.0,
            radius in 50.0f32..150.0,
        ) {
            let p0 = Vec2::new(x0, y0);
            let p1 = Vec2::new(x1, y1);
            if let Some(hit) = sweep_circle(p0, p1, Vec2::ZERO, radius) {
                prop_assert!((hit.point.length() - radius).abs() < 1e-2);
                prop_assert!((0.0..=1.0).contains(&hit.t));
                let recon = p0 + (p1 - p0) * hit.t;
                prop_assert!((recon - hit.point).length() < 1e-2);
            }
        }

        /// The closest-approach point never beats the true endpoint distances.
        #[test]
        fn prop_point_sweep_closest(
            x0 in -300.0f32..300.0,
            y0 in -300.0f32..300.0,
            x1 in -300.0f32..300.0,
            y1 in -300.0f32..300.0,
            px in -300.0f32..300.0,
            py in -300.0f32..300.0,
        ) {
            let p0 = Vec2::new(x0, y0);
            let p1 = Vec2::new(x1, y1);
            let point = Vec2::new(px, py);
            if let Some(hit) = sweep_point(p0, p1, point, 1e6) {
                let d = (point - hit.point).length();
                prop_assert!(d <= (point - p0).length() + 1e-3);
                prop_assert!(d <= (point - p1).length() + 1e-3);
            }
        }
    }
}
