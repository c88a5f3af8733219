//! Integration tests for the fan geometry pipeline.
//!
//! Exercises: FanGeometryConfig → arc partition → Placement → WedgeShape
//! → CellMap coherence across modes and settings.
//!
//! All tests are pure math — no data source, no rendering.

use std::collections::BTreeSet;

use fandoku_logic::ahnentafel::{generation, generation_slots, position, Slot};
use fandoku_logic::cells::{build_cell_map, GenOrderFlips};
use fandoku_logic::config::{FanGeometryConfig, SUPPORTED_ANGLES};
use fandoku_logic::layout::{arc_bounds, place};
use fandoku_logic::wedge::{wedge_for, WedgeCache};

// ── Helpers ────────────────────────────────────────────────────────────

fn config(max_angle: f64, num_generations: u32) -> FanGeometryConfig {
    FanGeometryConfig { max_angle, num_generations, ..FanGeometryConfig::default() }
}

fn full_tree(generations: u32) -> BTreeSet<Slot> {
    (0..generations).flat_map(generation_slots).collect()
}

// ── Layout and wedge coherence ─────────────────────────────────────────

#[test]
fn labels_sit_inside_their_wedges() {
    for &max_angle in &SUPPORTED_ANGLES {
        let cfg = config(max_angle, 6);
        for slot in 1..64u64 {
            let p = place(slot, &cfg);
            let w = wedge_for(slot, &cfg);
            assert!(p.angle_deg >= w.start_deg && p.angle_deg <= w.end_deg);
            if !w.is_sector() {
                assert!(p.radius > w.inner_radius && p.radius < w.outer_radius);
            }
        }
    }
}

#[test]
fn adjacent_wedges_share_edges() {
    let cfg = config(240.0, 6);
    for g in 1..6 {
        let slots: Vec<Slot> = generation_slots(g).collect();
        for pair in slots.windows(2) {
            let a = wedge_for(pair[0], &cfg);
            let b = wedge_for(pair[1], &cfg);
            assert!((a.end_deg - b.start_deg).abs() < 1e-9);
        }
    }
}

#[test]
fn three_generation_scenario_matches_reference_values() {
    // Root + parents + grandparents on a 180° half fan.
    let cfg = config(180.0, 3);
    assert_eq!(place(2, &cfg).angle_deg, 225.0);
    assert_eq!(place(3, &cfg).angle_deg, 315.0);
    assert_eq!(generation(4), 2);
    assert_eq!(position(4), 0);

    let mut cache = WedgeCache::new();
    let rebuilt = cache.ensure(&cfg);
    assert_eq!(rebuilt, vec![0, 1, 2]);
    for slot in 1..8u64 {
        assert!(cache.shape_for(slot).is_some());
    }
}

// ── Cell map coherence ─────────────────────────────────────────────────

#[test]
fn fan_chart_mode_is_a_degenerate_puzzle() {
    let occupied = full_tree(4);
    let flips = GenOrderFlips::identity(4);
    assert!(flips.is_identity());
    let map = build_cell_map(&occupied, &flips);
    for &slot in &occupied {
        assert_eq!(map.cell_of(slot), Some(slot));
    }
}

#[test]
fn flipped_cells_still_land_in_the_same_generation() {
    let occupied = full_tree(5);
    let flips = GenOrderFlips::from_signs(vec![1, 1, -1, 1, -1]);
    let map = build_cell_map(&occupied, &flips);
    for &slot in &occupied {
        let cell = map.cell_of(slot).unwrap();
        assert_eq!(generation(cell), generation(slot));
    }
}

#[test]
fn cells_lay_out_with_the_same_partition_as_slots() {
    // A cell is laid out exactly like the slot of the same number, so a
    // flipped pair exchanges wedge shapes but nothing else moves.
    let cfg = config(180.0, 3);
    let occupied = full_tree(3);
    let map = build_cell_map(&occupied, &GenOrderFlips::from_signs(vec![1, 1, -1]));
    let cell_of_4 = map.cell_of(4).unwrap();
    assert_eq!(cell_of_4, 5);
    let (start, end) = arc_bounds(cell_of_4, cfg.max_angle);
    let w = wedge_for(5, &cfg);
    assert_eq!((w.start_deg, w.end_deg), (start, end));
}
