//! Chart engine - main entry point tying store, index, layout, and game.

use std::io::{Read, Write};

use rand::Rng;

use fandoku_logic::ahnentafel::Slot;
use fandoku_logic::cells::CellMove;
use fandoku_logic::config::{ConfigNotice, FanGeometryConfig};
use fandoku_logic::wedge::WedgeCache;

use crate::game::{GameConfig, GameEvent, GameMode, MatchingGame, NameKey};
use crate::index::AhnentafelIndex;
use crate::loader::{AncestorLoader, EnsureOutcome, FetchBatch, LoadReport};
use crate::persistence::{load_pedigree, save_pedigree, SaveError};
use crate::person::Person;
use crate::scene::{build_scene, ScenePlan};
use crate::source::SourceError;
use crate::store::AncestorStore;

/// Main chart engine.
///
/// Owns the pedigree state and the active game, and keeps the
/// store → index → layout refresh order so readers never see stale
/// geometry. All user commands re-enter through the methods here.
pub struct ChartEngine {
    pub store: AncestorStore,
    pub index: AhnentafelIndex,
    pub config: FanGeometryConfig,
    wedges: WedgeCache,
    loader: AncestorLoader,
    game: MatchingGame,
}

impl ChartEngine {
    /// Create an empty engine with default geometry.
    pub fn new() -> Self {
        Self {
            store: AncestorStore::new(),
            index: AhnentafelIndex::new(),
            config: FanGeometryConfig::default(),
            wedges: WedgeCache::new(),
            loader: AncestorLoader::new(),
            game: MatchingGame::new(),
        }
    }

    /// Install the focal person, discarding any previous tree. An
    /// outstanding fetch for the old tree is marked stale.
    pub fn set_root(&mut self, person: Person) {
        self.store = AncestorStore::new();
        self.index.clear();
        self.loader.reset();
        let id = person.id.clone();
        self.store.add(person);
        self.index.assign_root(id);
        log::info!("root person set; pedigree reset");
    }

    // ── Geometry commands ───────────────────────────────────────────────

    /// Change the fan's arc width. Affected wedge shapes rebuild on the
    /// next scene emission.
    pub fn set_max_angle(&mut self, degrees: f64) -> Option<ConfigNotice> {
        self.config.set_max_angle(degrees)
    }

    /// Show one more generation. Returns the clamp notice (if any) and
    /// the loader's outcome, so the host can issue the fetch when one
    /// is needed.
    pub fn increment_generations(&mut self) -> (Option<ConfigNotice>, EnsureOutcome) {
        let requested = self.config.num_generations + 1;
        let notice = self.config.set_num_generations(requested);
        (notice, self.ensure_loaded())
    }

    /// Continue fetching toward the displayed generation count. Call
    /// again after each `complete_fetch` until it reports
    /// `AlreadyResolved`.
    pub fn ensure_loaded(&mut self) -> EnsureOutcome {
        self.loader.ensure_through(
            self.config.num_generations - 1,
            &self.index,
            &self.store,
        )
    }

    /// Show one fewer generation. A fetch in flight for a ring that is
    /// no longer displayed is marked stale rather than awaited.
    pub fn decrement_generations(&mut self) -> Option<ConfigNotice> {
        let requested = self.config.num_generations.saturating_sub(1);
        let notice = self.config.set_num_generations(requested);
        let dropped = self
            .loader
            .pending_generation()
            .map_or(false, |g| g >= self.config.num_generations);
        if dropped {
            self.loader.invalidate();
        }
        notice
    }

    // ── Loader plumbing ─────────────────────────────────────────────────

    /// Hand a completed fetch to the loader: store merges first, then
    /// the index derives bindings, then geometry catches up on the next
    /// `scene` call.
    pub fn complete_fetch(&mut self, batch: &FetchBatch, records: Vec<Person>) -> LoadReport {
        self.loader
            .complete(batch, records, &mut self.store, &mut self.index)
    }

    pub fn fail_fetch(&mut self, error: SourceError) {
        self.loader.fail(error);
    }

    pub fn loader(&self) -> &AncestorLoader {
        &self.loader
    }

    // ── Scene ───────────────────────────────────────────────────────────

    /// Emit the draw plan for the current state.
    pub fn scene(&mut self) -> ScenePlan {
        build_scene(&self.store, &self.index, &self.config, &mut self.wedges)
    }

    // ── Game commands ───────────────────────────────────────────────────

    /// Start a game over the currently resolved generations. An
    /// outstanding fetch is marked stale so its late result cannot
    /// mutate the board mid-game.
    pub fn start_game(&mut self, mode: GameMode, hint_count: u8, rng: &mut impl Rng) {
        if self.loader.is_pending() {
            self.loader.invalidate();
        }
        let config = GameConfig {
            mode,
            num_generations: self.config.num_generations,
            hint_count,
        };
        self.game.start(&self.index, &config, rng);
    }

    pub fn end_game(&mut self) {
        self.game.end_early();
    }

    pub fn play_again(&mut self) {
        self.game.play_again();
    }

    pub fn select_name(&mut self, slot: Slot) {
        self.game.select_name(slot);
    }

    pub fn select_cell(&mut self, cell: Slot) {
        self.game.select_cell(cell);
    }

    pub fn name_key(&mut self, key: NameKey) {
        self.game.name_key(key);
    }

    pub fn move_cell(&mut self, direction: CellMove) {
        self.game.move_cell(direction);
    }

    pub fn commit(&mut self) {
        self.game.commit(&self.index);
    }

    pub fn tick_second(&mut self) {
        self.game.tick_second();
    }

    pub fn game(&self) -> &MatchingGame {
        &self.game
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.game.drain_events()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Save the fetched pedigree to a writer.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        save_pedigree(
            writer,
            &self.store,
            &self.index,
            self.loader.retrieved_through(),
        )
    }

    /// Load a pedigree from a reader, replacing the current tree.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_pedigree(reader)?;
        self.store = loaded.store;
        self.index = loaded.index;
        self.loader.reset();
        self.loader.restore_watermark(loaded.retrieved_through);
        Ok(())
    }
}

impl Default for ChartEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonName;
    use crate::source::{AncestorSource, StaticSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_person(id: &str, father: Option<&str>, mother: Option<&str>) -> Person {
        Person::new(id, PersonName::new(id.to_uppercase(), "Berge")).with_parents(father, mother)
    }

    fn source() -> StaticSource {
        StaticSource::from_records([
            make_person("f", Some("ff"), Some("fm")),
            make_person("m", Some("mf"), Some("mm")),
            make_person("ff", None, None),
            make_person("fm", None, None),
            make_person("mf", None, None),
            make_person("mm", None, None),
        ])
    }

    /// Engine with the root set and two generations fetched.
    fn loaded_engine() -> ChartEngine {
        let mut engine = ChartEngine::new();
        engine.set_root(make_person("root", Some("f"), Some("m")));
        engine.config.set_num_generations(3);

        let mut source = source();
        for generation in 1..=2 {
            match engine
                .loader
                .ensure_generation(generation, &engine.index, &engine.store)
            {
                EnsureOutcome::Requested(batch) => {
                    let records = source.fetch_persons(&batch.ids).unwrap();
                    engine.complete_fetch(&batch, records);
                }
                other => panic!("expected a request, got {:?}", other),
            }
        }
        engine
    }

    #[test]
    fn test_set_root_resets_everything() {
        let mut engine = loaded_engine();
        assert_eq!(engine.index.len(), 7);

        engine.set_root(make_person("other", None, None));
        assert_eq!(engine.index.len(), 1);
        assert_eq!(engine.store.len(), 1);
        assert_eq!(engine.loader().retrieved_through(), 0);
    }

    #[test]
    fn test_scene_covers_loaded_slots() {
        let mut engine = loaded_engine();
        let plan = engine.scene();
        assert_eq!(plan.items.len(), 7);
    }

    #[test]
    fn test_increment_asks_loader_for_next_ring() {
        let mut engine = loaded_engine();
        let (notice, outcome) = engine.increment_generations();
        assert!(notice.is_none());
        // Generation 3 has nothing fetchable: grandparents are dead ends.
        assert_eq!(outcome, EnsureOutcome::AlreadyResolved);
        assert_eq!(engine.config.num_generations, 4);
    }

    #[test]
    fn test_increment_requests_inner_rings_first() {
        let mut engine = ChartEngine::new();
        engine.set_root(make_person("root", Some("f"), Some("m")));
        engine.config.set_num_generations(2);

        // Jumping straight to 3 displayed generations still fetches
        // generation 1 before anything outer.
        let (_, outcome) = engine.increment_generations();
        match outcome {
            EnsureOutcome::Requested(batch) => assert_eq!(batch.generation, 1),
            other => panic!("expected a request, got {:?}", other),
        }
    }

    #[test]
    fn test_decrement_invalidates_pending_fetch_for_dropped_ring() {
        // Great-grandparents exist on the paternal line only.
        let mut engine = loaded_engine();
        let mut deep_source = source();
        let ff = make_person("ff", Some("fff"), Some("ffm"));
        engine.store.merge(ff.clone());
        deep_source.insert(ff);
        deep_source.insert(make_person("fff", None, None));
        deep_source.insert(make_person("ffm", None, None));

        let (_, outcome) = engine.increment_generations();
        let batch = match outcome {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        assert_eq!(batch.generation, 3);
        assert!(engine.loader().is_pending());

        // Dropping back below the pending ring abandons the fetch.
        engine.decrement_generations();
        assert!(!engine.loader().is_pending());

        // The late result is dropped.
        let records = deep_source.fetch_persons(&batch.ids).unwrap();
        let report = engine.complete_fetch(&batch, records);
        assert!(report.newly_bound.is_empty());
        assert!(!engine.index.is_occupied(8));
    }

    #[test]
    fn test_full_game_through_the_engine() {
        let mut engine = loaded_engine();
        let mut rng = StdRng::seed_from_u64(11);
        engine.start_game(GameMode::FanDoku, 0, &mut rng);
        assert_eq!(engine.game().status(), crate::game::GameStatus::Live);

        while let Some(name_slot) = engine.game().selected_name() {
            let cell = engine.game().cell_map().cell_of(name_slot).unwrap();
            engine.select_cell(cell);
            engine.commit();
        }
        assert_eq!(engine.game().status(), crate::game::GameStatus::Post);
        assert_eq!(engine.game().placed().len(), 6);
    }

    #[test]
    fn test_save_load_round_trip() {
        let engine = loaded_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();

        let mut restored = ChartEngine::new();
        restored.load(buffer.as_slice()).unwrap();
        assert_eq!(restored.index.len(), 7);
        assert_eq!(restored.loader().retrieved_through(), 2);
        // No re-fetch needed for restored generations.
        assert_eq!(
            restored
                .loader
                .ensure_generation(2, &restored.index, &restored.store),
            EnsureOutcome::AlreadyResolved
        );
    }
}
