//! Fandoku Headless Validation Harness
//!
//! Validates slot math, fan layout, wedge geometry, the incremental
//! loader, and the matching game without any UI or network. Runs
//! entirely in-process against the bundled sample pedigree.
//!
//! Usage:
//!   cargo run -p fandoku-simtest
//!   cargo run -p fandoku-simtest -- --verbose

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use fandoku_core::game::{GameConfig, GameMode, GameStatus, MatchingGame};
use fandoku_core::index::AhnentafelIndex;
use fandoku_core::loader::{AncestorLoader, EnsureOutcome};
use fandoku_core::person::Person;
use fandoku_core::source::StaticSource;
use fandoku_core::store::AncestorStore;
use fandoku_logic::ahnentafel::{father, generation, generation_slots, mother, position, Slot};
use fandoku_logic::cells::{build_cell_map, GenOrderFlips};
use fandoku_logic::config::FanGeometryConfig;
use fandoku_logic::layout::{arc_bounds, place};
use fandoku_logic::wedge::{wedge_for, WedgeCache};

// ── Sample pedigree (same JSON shape a data-source response has) ────────
const PEDIGREE_JSON: &str = include_str!("../../../data/sample_pedigree.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult { name: name.to_string(), passed, detail }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Fandoku Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Ahnentafel slot arithmetic
    results.extend(validate_slot_math(verbose));

    // 2. Polar layout
    results.extend(validate_layout(verbose));

    // 3. Wedge shapes and cache
    results.extend(validate_wedges(verbose));

    // 4. Cell permutation
    results.extend(validate_cells(verbose));

    // 5. Incremental loader on the sample pedigree
    results.extend(validate_loader(verbose));

    // 6. Scripted game playthrough
    results.extend(validate_game(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Fixture plumbing ────────────────────────────────────────────────────

fn fixture_records() -> Vec<Person> {
    serde_json::from_str(PEDIGREE_JSON).expect("sample pedigree must parse")
}

/// Store + index resolved through generation 3 via the loader.
fn loaded_pedigree() -> (AncestorStore, AhnentafelIndex, AncestorLoader, StaticSource) {
    let records = fixture_records();
    let root_id = records[0].id.clone();
    let mut source = StaticSource::from_records(records);

    let mut store = AncestorStore::new();
    store.add(source.get(&root_id).expect("root present").clone());
    let mut index = AhnentafelIndex::new();
    index.assign_root(root_id);

    let mut loader = AncestorLoader::new();
    loader
        .run_to_generation(3, &mut source, &mut store, &mut index)
        .expect("static source cannot fail");
    (store, index, loader, source)
}

// ── 1. Slot arithmetic ──────────────────────────────────────────────────

fn validate_slot_math(_verbose: bool) -> Vec<TestResult> {
    println!("--- Slot Arithmetic ---");
    let mut results = Vec::new();

    let identities_hold = (1..4096u64).all(|slot| {
        generation(slot) == (slot as f64).log2().floor() as u32
            && father(slot) == 2 * slot
            && mother(slot) == 2 * slot + 1
    });
    results.push(check(
        "slot_identities",
        identities_hold,
        "generation = floor(log2), father = 2n, mother = 2n+1".to_string(),
    ));

    let positions_ok = (0..10u32).all(|g| {
        generation_slots(g).enumerate().all(|(i, slot)| position(slot) == i as u64)
    });
    results.push(check(
        "slot_positions",
        positions_ok,
        "positions run 0..2^g within each generation".to_string(),
    ));

    results
}

// ── 2. Layout ───────────────────────────────────────────────────────────

fn validate_layout(_verbose: bool) -> Vec<TestResult> {
    println!("--- Fan Layout ---");
    let mut results = Vec::new();
    let config = FanGeometryConfig { max_angle: 180.0, ..FanGeometryConfig::default() };

    let father_angle = place(2, &config).angle_deg;
    let mother_angle = place(3, &config).angle_deg;
    results.push(check(
        "parent_angles",
        father_angle == 225.0 && mother_angle == 315.0,
        format!("slot 2 at {}°, slot 3 at {}°", father_angle, mother_angle),
    ));

    let mut spans_ok = true;
    for max_angle in [180.0, 240.0, 360.0] {
        for g in 0..8u32 {
            let total: f64 = generation_slots(g)
                .map(|slot| {
                    let (start, end) = arc_bounds(slot, max_angle);
                    end - start
                })
                .sum();
            if (total - max_angle).abs() > 1e-9 {
                spans_ok = false;
            }
        }
    }
    results.push(check(
        "span_partition",
        spans_ok,
        "per-generation spans sum to the arc exactly".to_string(),
    ));

    let root = place(1, &config);
    results.push(check(
        "root_center",
        root.radius == 0.0 && root.x == 0.0 && root.y == 0.0,
        "root sits at the origin".to_string(),
    ));

    results
}

// ── 3. Wedges ───────────────────────────────────────────────────────────

fn validate_wedges(_verbose: bool) -> Vec<TestResult> {
    println!("--- Wedge Geometry ---");
    let mut results = Vec::new();
    let mut config = FanGeometryConfig::default();

    let sector_ok = wedge_for(1, &config).is_sector()
        && wedge_for(3, &config).is_sector()
        && !wedge_for(4, &config).is_sector();
    results.push(check(
        "sector_vs_annulus",
        sector_ok,
        "generations 0-1 are sectors, 2+ annulus wedges".to_string(),
    ));

    let aligned = (1..64u64).all(|slot| {
        let w = wedge_for(slot, &config);
        let (start, end) = arc_bounds(slot, config.max_angle);
        w.start_deg == start && w.end_deg == end
    });
    results.push(check(
        "wedge_label_alignment",
        aligned,
        "wedge angles come from the label partition".to_string(),
    ));

    let mut cache = WedgeCache::new();
    let first = cache.ensure(&config);
    let second = cache.ensure(&config);
    config.num_generations = 3;
    let after_shrink = cache.ensure(&config);
    let hidden = !cache.is_visible(4) && cache.ring(4).is_some();
    config.num_generations = 5;
    let after_grow = cache.ensure(&config);
    results.push(check(
        "cache_gating",
        first.len() == 5
            && second.is_empty()
            && after_shrink.is_empty()
            && hidden
            && after_grow.is_empty()
            && cache.is_visible(4),
        "rebuilds gate on angle/count changes; shrink hides, never destroys".to_string(),
    ));

    results
}

// ── 4. Cells ────────────────────────────────────────────────────────────

fn validate_cells(_verbose: bool) -> Vec<TestResult> {
    println!("--- Cell Permutation ---");
    let mut results = Vec::new();
    let occupied: BTreeSet<Slot> = (0..5u32).flat_map(generation_slots).collect();

    let identity = build_cell_map(&occupied, &GenOrderFlips::identity(5));
    let identity_ok = occupied.iter().all(|&s| identity.cell_of(s) == Some(s));
    results.push(check(
        "fan_chart_identity",
        identity_ok,
        "identity flips give cell == slot".to_string(),
    ));

    let flipped = build_cell_map(&occupied, &GenOrderFlips::from_signs(vec![1, 1, -1, 1, -1]));
    let mut bijective = true;
    for g in 0..5u32 {
        let mut cells: Vec<Slot> = generation_slots(g)
            .filter_map(|s| flipped.cell_of(s))
            .collect();
        cells.sort_unstable();
        if cells != generation_slots(g).collect::<Vec<_>>() {
            bijective = false;
        }
    }
    let inverts = occupied
        .iter()
        .all(|&s| flipped.slot_at(flipped.cell_of(s).unwrap()) == Some(s));
    results.push(check(
        "fandoku_bijection",
        bijective && inverts,
        "flipped map stays a per-generation bijection and inverts cleanly".to_string(),
    ));

    results
}

// ── 5. Loader ───────────────────────────────────────────────────────────

fn validate_loader(_verbose: bool) -> Vec<TestResult> {
    println!("--- Incremental Loader ---");
    let mut results = Vec::new();
    let (store, mut index, mut loader, source) = loaded_pedigree();

    results.push(check(
        "requests_batched",
        source.requests_served == 3,
        format!("3 generations, {} requests", source.requests_served),
    ));

    let expected_occupied: Vec<Slot> = (1..=13u64).collect();
    let occupied: Vec<Slot> = (1..=15u64).filter(|&s| index.is_occupied(s)).collect();
    results.push(check(
        "occupancy",
        occupied == expected_occupied,
        format!("slots {:?} occupied; 14 vacant (unknown), 15 vacant (private)", occupied),
    ));

    let collapse_slots: Vec<Slot> = index.slots_of("GG-01").collect();
    results.push(check(
        "pedigree_collapse",
        collapse_slots == vec![8, 12] && index.same_person(8, 12),
        format!("GG-01 occupies slots {:?}", collapse_slots),
    ));

    let second_ask = loader.ensure_generation(3, &index, &store);
    results.push(check(
        "no_refetch",
        second_ask == EnsureOutcome::AlreadyResolved && source.requests_served == 3,
        "a resolved generation issues no further request".to_string(),
    ));

    // Idempotent rebuild with the same data.
    let before = index.len();
    index.rebuild(&store);
    results.push(check(
        "rebuild_idempotent",
        index.len() == before,
        format!("{} bindings before and after", before),
    ));

    results
}

// ── 6. Game ─────────────────────────────────────────────────────────────

fn validate_game(verbose: bool) -> Vec<TestResult> {
    println!("--- Matching Game ---");
    let mut results = Vec::new();
    let (_store, index, _loader, _source) = loaded_pedigree();
    let mut rng = StdRng::seed_from_u64(2024);

    // Three displayed generations: slots 2..=7, six names.
    let mut game = MatchingGame::new();
    let config = GameConfig { mode: GameMode::FanDoku, num_generations: 3, hint_count: 0 };
    game.start(&index, &config, &mut rng);
    results.push(check(
        "game_starts_live",
        game.status() == GameStatus::Live && game.puzzle_size() == 6,
        format!("{} names to place", game.puzzle_size()),
    ));

    // One deliberate miss: the first name into a wrong cell.
    let name = game.selected_name().expect("a name is auto-selected");
    let right_cell = game.cell_map().cell_of(name).expect("name has a cell");
    let wrong_cell = (2..=7u64)
        .find(|&c| c != right_cell && game.cell_map().slot_at(c).is_some())
        .expect("another cell exists");
    let wrong_is_collapse = index.same_person(game.cell_map().slot_at(wrong_cell).unwrap(), name);
    game.select_cell(wrong_cell);
    game.commit(&index);
    results.push(check(
        "miss_counts_once",
        !wrong_is_collapse && game.misses() == 1 && game.placed().is_empty(),
        format!("{} miss, nothing placed", game.misses()),
    ));

    // Solve the rest by looking the answers up.
    let mut commits = 0;
    while let Some(name_slot) = game.selected_name() {
        let cell = game.cell_map().cell_of(name_slot).expect("name has a cell");
        game.select_cell(cell);
        game.commit(&index);
        commits += 1;
        if commits > 16 {
            break;
        }
    }
    results.push(check(
        "win_on_full_board",
        game.status() == GameStatus::Post && game.placed().len() == 6 && game.misses() == 1,
        format!(
            "Post after {} commits, {} placed, {} miss",
            commits,
            game.placed().len(),
            game.misses()
        ),
    ));

    if verbose {
        for event in game.drain_events() {
            println!("    event: {:?}", event);
        }
    }

    // Four displayed generations: pedigree collapse is in play.
    let mut game = MatchingGame::new();
    let config = GameConfig { mode: GameMode::FanChart, num_generations: 4, hint_count: 0 };
    game.start(&index, &config, &mut rng);

    // GG-01 holds slots 8 and 12: the label for 8 dropped on 12's cell
    // must count.
    game.select_name(8);
    let twin_cell = game.cell_map().cell_of(12).expect("slot 12 has a cell");
    game.select_cell(twin_cell);
    game.commit(&index);
    results.push(check(
        "collapse_either_slot",
        game.misses() == 0 && game.placed().contains(&12),
        "either slot of a repeated ancestor accepts the match".to_string(),
    ));

    // End early: the rest reveals without counting as placed.
    let placed_before = game.placed().len();
    game.end_early();
    let revealed = game
        .drain_events()
        .iter()
        .filter(|e| matches!(e, fandoku_core::game::GameEvent::Revealed { .. }))
        .count();
    results.push(check(
        "end_early_reveals",
        game.status() == GameStatus::Post
            && game.placed().len() == placed_before
            && revealed == game.puzzle_size() - placed_before,
        format!("{} slots revealed, {} stayed placed", revealed, placed_before),
    ));

    results
}
