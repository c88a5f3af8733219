//! The FanDoku matching game.
//!
//! A state machine layered on the index and layout: names shuffle into
//! a tray, the player pairs each name with a cell on the fan, and the
//! engine validates every placement against the same ahnentafel
//! numbering the chart itself uses. The plain fan chart is the
//! degenerate case where every name's cell is its own slot.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use fandoku_logic::ahnentafel::{
    generation, position, slots_in_generation, Slot, ROOT_SLOT,
};
use fandoku_logic::cells::{build_cell_map, neighbor_cell, CellMap, CellMove, GenOrderFlips};

use crate::index::AhnentafelIndex;

/// Which game is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Plain fan chart: every name's cell is its own slot.
    FanChart,
    /// Puzzle: father/mother order flips per generation.
    FanDoku,
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Pre,
    Live,
    Post,
}

/// Options chosen before start.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub mode: GameMode,
    /// Displayed generations; the puzzle covers rings 1 through this
    /// minus 1.
    pub num_generations: u32,
    /// Slots pre-revealed at start, 0 to 2.
    pub hint_count: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::FanDoku,
            num_generations: 3,
            hint_count: 0,
        }
    }
}

/// A floating name label waiting in the tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayLabel {
    /// The slot whose ancestor this label names.
    pub slot: Slot,
    /// Position in the shuffled tray; unrelated to the target cell.
    pub tray_index: usize,
}

/// What happened, for the host to render.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started { puzzle_size: usize },
    HintRevealed { slot: Slot, cell: Slot },
    NamePlaced { name_slot: Slot, target_slot: Slot, cell: Slot },
    Miss { name_slot: Slot, cell: Slot },
    GenerationComplete { generation: u32 },
    Won { elapsed_seconds: u32, misses: u32 },
    /// A slot shown in its correct cell at early end, not counted as
    /// placed.
    Revealed { slot: Slot, cell: Slot },
    Ended { placed: usize, misses: u32 },
    ClockTick { elapsed_seconds: u32 },
}

/// Direction for cycling the selected name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCycle {
    Forward,
    Backward,
}

/// The W/A/S/D name-selection keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKey {
    W,
    A,
    S,
    D,
}

/// One play-through of the matching game.
///
/// Owns the session state only; the ancestor store, index, and layout
/// live outside and survive any number of games.
#[derive(Debug)]
pub struct MatchingGame {
    status: GameStatus,
    mode: GameMode,
    num_generations: u32,
    flips: GenOrderFlips,
    cells: CellMap,
    /// Every slot the win condition counts.
    puzzle_slots: BTreeSet<Slot>,
    placed: BTreeSet<Slot>,
    /// Unplaced labels in shuffled tray order.
    tray: Vec<TrayLabel>,
    selected_name: Option<Slot>,
    selected_cell: Option<Slot>,
    elapsed_seconds: u32,
    misses: u32,
    clock_running: bool,
    events: Vec<GameEvent>,
}

impl MatchingGame {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Pre,
            mode: GameMode::FanChart,
            num_generations: 0,
            flips: GenOrderFlips::identity(0),
            cells: CellMap::default(),
            puzzle_slots: BTreeSet::new(),
            placed: BTreeSet::new(),
            tray: Vec::new(),
            selected_name: None,
            selected_cell: None,
            elapsed_seconds: 0,
            misses: 0,
            clock_running: false,
            events: Vec::new(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Start a game over the resolved slots of `index`. Pre → Live.
    ///
    /// Flip signs are drawn once per generation and stay fixed for the
    /// session, so the puzzle is internally consistent. Labels shuffle
    /// to tray positions unrelated to their target cells.
    pub fn start(&mut self, index: &AhnentafelIndex, config: &GameConfig, rng: &mut impl Rng) {
        if self.status == GameStatus::Live {
            return;
        }
        self.reset_session();
        self.mode = config.mode;
        self.num_generations = config.num_generations;

        let signs: Vec<i8> = (0..config.num_generations)
            .map(|g| match config.mode {
                GameMode::FanChart => 1,
                GameMode::FanDoku => {
                    if g >= 2 && rng.gen_bool(0.5) {
                        -1
                    } else {
                        1
                    }
                }
            })
            .collect();
        self.flips = GenOrderFlips::from_signs(signs);

        let mut occupied: BTreeSet<Slot> = BTreeSet::new();
        for g in 0..config.num_generations {
            occupied.extend(index.occupied_in(g));
        }
        self.cells = build_cell_map(&occupied, &self.flips);

        // The root anchors the board; it is not a puzzle piece.
        self.puzzle_slots = occupied.into_iter().filter(|&s| s != ROOT_SLOT).collect();

        let mut slots: Vec<Slot> = self.puzzle_slots.iter().copied().collect();
        slots.shuffle(rng);
        self.tray = slots
            .into_iter()
            .enumerate()
            .map(|(tray_index, slot)| TrayLabel { slot, tray_index })
            .collect();

        self.events.push(GameEvent::Started { puzzle_size: self.puzzle_slots.len() });
        log::info!("game started: {} names to place", self.puzzle_slots.len());

        self.reveal_hints(config.hint_count, rng);

        // The first remaining label is pre-selected, so hints can never
        // be the initial selection.
        self.selected_name = self.tray.first().map(|label| label.slot);
        self.status = GameStatus::Live;
        self.clock_running = true;
    }

    /// Pre-reveal up to `hint_count` slots from the outermost ring,
    /// topping up from the next-inner one when it runs short.
    fn reveal_hints(&mut self, hint_count: u8, rng: &mut impl Rng) {
        let want = hint_count.min(2) as usize;
        if want == 0 || self.num_generations < 2 {
            return;
        }
        let outer = self.num_generations - 1;
        let mut candidates: Vec<Slot> = self
            .tray
            .iter()
            .map(|label| label.slot)
            .filter(|&slot| generation(slot) == outer)
            .collect();
        if candidates.len() < want && outer >= 2 {
            candidates.extend(
                self.tray
                    .iter()
                    .map(|label| label.slot)
                    .filter(|&slot| generation(slot) == outer - 1),
            );
        }

        // Sample without replacement; no retry loops.
        let take = want.min(candidates.len());
        let chosen: Vec<Slot> = rand::seq::index::sample(rng, candidates.len(), take)
            .iter()
            .map(|i| candidates[i])
            .collect();
        for slot in chosen {
            let cell = match self.cells.cell_of(slot) {
                Some(cell) => cell,
                None => continue,
            };
            self.placed.insert(slot);
            self.tray.retain(|label| label.slot != slot);
            self.events.push(GameEvent::HintRevealed { slot, cell });
        }
    }

    /// End the game before completion. Live → Post; remaining slots are
    /// revealed in their correct cells without counting as placed, so
    /// the final board is always fully shown.
    pub fn end_early(&mut self) {
        if self.status != GameStatus::Live {
            return;
        }
        self.stop_clock();
        for &slot in &self.puzzle_slots {
            if !self.placed.contains(&slot) {
                if let Some(cell) = self.cells.cell_of(slot) {
                    self.events.push(GameEvent::Revealed { slot, cell });
                }
            }
        }
        self.tray.clear();
        self.selected_name = None;
        self.status = GameStatus::Post;
        self.events.push(GameEvent::Ended { placed: self.placed.len(), misses: self.misses });
        log::info!("game ended early with {} placed", self.placed.len());
    }

    /// Post → Pre: reset the session only. Ancestor data, index, and
    /// layout are untouched — nothing re-fetches.
    pub fn play_again(&mut self) {
        if self.status != GameStatus::Post {
            return;
        }
        self.reset_session();
    }

    /// The host's 1 Hz clock callback; ignored outside Live.
    pub fn tick_second(&mut self) {
        if self.status != GameStatus::Live || !self.clock_running {
            return;
        }
        self.elapsed_seconds += 1;
        self.events.push(GameEvent::ClockTick { elapsed_seconds: self.elapsed_seconds });
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Select a floating name label still in the tray.
    pub fn select_name(&mut self, slot: Slot) {
        if self.status != GameStatus::Live {
            return;
        }
        if self.tray.iter().any(|label| label.slot == slot) {
            self.selected_name = Some(slot);
        }
    }

    /// Select a target cell in the displayed range.
    pub fn select_cell(&mut self, cell: Slot) {
        if self.status != GameStatus::Live {
            return;
        }
        if cell != ROOT_SLOT && generation(cell) < self.num_generations {
            self.selected_cell = Some(cell);
        }
    }

    /// Cycle the selected name among the labels still in the tray.
    pub fn cycle_name(&mut self, direction: NameCycle) {
        if self.status != GameStatus::Live || self.tray.is_empty() {
            return;
        }
        let current = self
            .selected_name
            .and_then(|slot| self.tray.iter().position(|label| label.slot == slot));
        let next = match (current, direction) {
            (None, _) => 0,
            (Some(i), NameCycle::Forward) => (i + 1) % self.tray.len(),
            (Some(i), NameCycle::Backward) => (i + self.tray.len() - 1) % self.tray.len(),
        };
        self.selected_name = Some(self.tray[next].slot);
    }

    /// W/A/S/D handling. The horizontal keys always cycle the same way;
    /// the vertical pair swaps meaning in the far half of the ring, so
    /// "forward" reads as clockwise motion wherever the selection sits.
    pub fn name_key(&mut self, key: NameKey) {
        let far_half = self
            .selected_cell
            .map(|cell| position(cell) >= slots_in_generation(generation(cell)) / 2)
            .unwrap_or(false);
        let direction = match key {
            NameKey::D => NameCycle::Forward,
            NameKey::A => NameCycle::Backward,
            NameKey::W => {
                if far_half {
                    NameCycle::Backward
                } else {
                    NameCycle::Forward
                }
            }
            NameKey::S => {
                if far_half {
                    NameCycle::Forward
                } else {
                    NameCycle::Backward
                }
            }
        };
        self.cycle_name(direction);
    }

    /// Move the selected cell one step (the I/J/K/L keys). Sideways
    /// moves skip vacant cells, wrapping at most one full turn; radial
    /// moves stay put when the neighboring ring has no cell there.
    pub fn move_cell(&mut self, direction: CellMove) {
        if self.status != GameStatus::Live {
            return;
        }
        let current = match self.selected_cell {
            Some(cell) => cell,
            None => {
                // First keypress lands on the father cell.
                self.selected_cell = self.cells.slot_at(2).map(|_| 2);
                return;
            }
        };
        let mut next = neighbor_cell(current, direction, self.num_generations);
        if matches!(direction, CellMove::Left | CellMove::Right) {
            let mut remaining = slots_in_generation(generation(current));
            while self.cells.slot_at(next).is_none() && remaining > 0 {
                next = neighbor_cell(next, direction, self.num_generations);
                remaining -= 1;
            }
        }
        if self.cells.slot_at(next).is_some() {
            self.selected_cell = Some(next);
        }
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// Commit the selected name into the selected cell.
    ///
    /// The placement is correct when the cell's slot and the name's
    /// slot resolve to the same person — with pedigree collapse, either
    /// slot of a repeated ancestor counts. A miss only bumps the
    /// counter; nothing else changes.
    pub fn commit(&mut self, index: &AhnentafelIndex) {
        if self.status != GameStatus::Live {
            return;
        }
        let (name_slot, cell) = match (self.selected_name, self.selected_cell) {
            (Some(name), Some(cell)) => (name, cell),
            _ => return,
        };
        let target_slot = match self.cells.slot_at(cell) {
            Some(slot) => slot,
            None => return,
        };
        if self.placed.contains(&target_slot) {
            return;
        }

        if index.same_person(target_slot, name_slot) {
            self.placed.insert(target_slot);
            self.tray.retain(|label| label.slot != name_slot);
            self.events.push(GameEvent::NamePlaced { name_slot, target_slot, cell });

            let g = generation(target_slot);
            if self.generation_done(g) {
                self.events.push(GameEvent::GenerationComplete { generation: g });
            }

            self.selected_name = self.tray.first().map(|label| label.slot);
            self.selected_cell = None;

            if self.placed.len() == self.puzzle_slots.len() {
                self.finish_won();
            }
        } else {
            self.misses += 1;
            self.events.push(GameEvent::Miss { name_slot, cell });
        }
    }

    fn generation_done(&self, g: u32) -> bool {
        self.puzzle_slots
            .iter()
            .filter(|&&slot| generation(slot) == g)
            .all(|slot| self.placed.contains(slot))
    }

    fn finish_won(&mut self) {
        self.stop_clock();
        self.status = GameStatus::Post;
        self.events
            .push(GameEvent::Won { elapsed_seconds: self.elapsed_seconds, misses: self.misses });
        log::info!("game won in {}s with {} misses", self.elapsed_seconds, self.misses);
    }

    fn stop_clock(&mut self) {
        // The host cancels its timer when this goes false; leaving Live
        // happens in exactly one place per transition, so it flips once.
        self.clock_running = false;
    }

    fn reset_session(&mut self) {
        self.status = GameStatus::Pre;
        self.flips = GenOrderFlips::identity(0);
        self.cells = CellMap::default();
        self.puzzle_slots.clear();
        self.placed.clear();
        self.tray.clear();
        self.selected_name = None;
        self.selected_cell = None;
        self.elapsed_seconds = 0;
        self.misses = 0;
        self.clock_running = false;
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn placed(&self) -> &BTreeSet<Slot> {
        &self.placed
    }

    pub fn puzzle_size(&self) -> usize {
        self.puzzle_slots.len()
    }

    pub fn tray(&self) -> &[TrayLabel] {
        &self.tray
    }

    pub fn selected_name(&self) -> Option<Slot> {
        self.selected_name
    }

    pub fn selected_cell(&self) -> Option<Slot> {
        self.selected_cell
    }

    pub fn cell_map(&self) -> &CellMap {
        &self.cells
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock_running
    }

    /// Take the queued events for the host to act on.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for MatchingGame {
    fn default() -> Self {
        Self::new()
    }
}
