//! Polar placement of slots on the fan.
//!
//! One partition function divides the visible arc among a generation's
//! slots; both the label transforms and the wedge shapes consume it, so
//! the two can never drift apart.
//!
//! Angles are measured in degrees with 180° due west, so the root's
//! ancestors fan out to one side of the page. Within a generation, slot
//! position 0 (the paternal-most line) sits nearest the lower edge of
//! the arc and positions increase clockwise toward the maternal-most
//! line.

use serde::{Deserialize, Serialize};

use crate::ahnentafel::{generation, position, slots_in_generation, Slot};
use crate::config::FanGeometryConfig;

/// Where a slot sits: polar placement plus the label rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Placement angle in degrees.
    pub angle_deg: f64,
    /// Label rotation in degrees, normalized to [0, 360).
    pub rotation_deg: f64,
    /// Distance from the center.
    pub radius: f64,
    pub x: f64,
    pub y: f64,
}

/// Start and end placement angles of a slot's share of the arc.
///
/// The visible arc of `max_angle` degrees is split evenly across the
/// `2^g` slots of the slot's generation; shares tile the arc exactly,
/// with no gaps and no overlaps.
pub fn arc_bounds(slot: Slot, max_angle: f64) -> (f64, f64) {
    let g = generation(slot);
    let p = position(slot) as f64;
    let span = max_angle / slots_in_generation(g) as f64;
    let base = 180.0 + (180.0 - max_angle) / 2.0;
    (base + span * p, base + span * (p + 1.0))
}

/// Compute the placement of a slot.
///
/// Generation 0 is the single root: it spans the whole arc and sits at
/// the center regardless of position.
pub fn place(slot: Slot, config: &FanGeometryConfig) -> Placement {
    let g = generation(slot);
    let p = position(slot);
    let (start, end) = arc_bounds(slot, config.max_angle);
    let angle_deg = (start + end) / 2.0;

    // Inner rings read roughly horizontal across the spoke. Past ring 4
    // labels turn parallel with the spoke to fit the crowding, and the
    // far half flips a further 180° so it is not upside-down.
    let mut rotation_deg = 90.0 + angle_deg;
    if g > 4 {
        rotation_deg += 90.0;
        if p >= slots_in_generation(g) / 2 {
            rotation_deg += 180.0;
        }
    }
    let rotation_deg = rotation_deg.rem_euclid(360.0);

    let radius = g as f64 * config.radius_per_generation;
    let rad = angle_deg.to_radians();
    Placement {
        angle_deg,
        rotation_deg,
        radius,
        x: radius * rad.cos(),
        y: radius * rad.sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ahnentafel::generation_slots;

    fn config(max_angle: f64) -> FanGeometryConfig {
        FanGeometryConfig { max_angle, ..FanGeometryConfig::default() }
    }

    #[test]
    fn test_parents_at_half_fan() {
        // 180° fan: father (slot 2) centers at 225°, mother (slot 3) at 315°.
        let cfg = config(180.0);
        assert_eq!(place(2, &cfg).angle_deg, 225.0);
        assert_eq!(place(3, &cfg).angle_deg, 315.0);
    }

    #[test]
    fn test_root_sits_at_center() {
        let cfg = config(180.0);
        let root = place(1, &cfg);
        assert_eq!(root.radius, 0.0);
        assert_eq!(root.x, 0.0);
        assert_eq!(root.y, 0.0);
    }

    #[test]
    fn test_spans_tile_the_arc_exactly() {
        for max_angle in [180.0, 240.0, 360.0] {
            for g in 0..8 {
                let mut total = 0.0;
                let mut prev_end = None;
                for slot in generation_slots(g) {
                    let (start, end) = arc_bounds(slot, max_angle);
                    if let Some(prev) = prev_end {
                        assert!((start - prev as f64).abs() < 1e-9);
                    }
                    prev_end = Some(end);
                    total += end - start;
                }
                assert!((total - max_angle).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_full_circle_base_angle() {
        // 360° fan has no trimmed edges: the arc opens at 180 - 90 = 90.
        let (start, _) = arc_bounds(2, 360.0);
        assert_eq!(start, 90.0);
    }

    #[test]
    fn test_radius_grows_per_generation() {
        let cfg = config(180.0);
        assert_eq!(place(4, &cfg).radius, 2.0 * cfg.radius_per_generation);
        assert_eq!(place(8, &cfg).radius, 3.0 * cfg.radius_per_generation);
    }

    #[test]
    fn test_inner_rotation_follows_angle() {
        let cfg = config(180.0);
        let p = place(2, &cfg);
        assert_eq!(p.rotation_deg, (90.0 + 225.0f64).rem_euclid(360.0));
    }

    #[test]
    fn test_outer_rotation_switches_orientation() {
        let cfg = config(180.0);
        // Generation 5, near half: extra 90°; far half: extra 270°.
        let near = place(32, &cfg); // position 0
        let far = place(63, &cfg); // position 31
        let (near_start, near_end) = arc_bounds(32, cfg.max_angle);
        let near_mid = (near_start + near_end) / 2.0;
        assert_eq!(near.rotation_deg, (180.0 + near_mid).rem_euclid(360.0));
        let (far_start, far_end) = arc_bounds(63, cfg.max_angle);
        let far_mid = (far_start + far_end) / 2.0;
        assert_eq!(far.rotation_deg, (360.0 + far_mid).rem_euclid(360.0));
    }

    #[test]
    fn test_cartesian_matches_polar() {
        let cfg = config(240.0);
        let p = place(5, &cfg);
        let rad = p.angle_deg.to_radians();
        assert!((p.x - p.radius * rad.cos()).abs() < 1e-9);
        assert!((p.y - p.radius * rad.sin()).abs() < 1e-9);
    }
}
