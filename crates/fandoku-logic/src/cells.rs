//! Cell permutation for FanDoku, plus keyboard cell navigation.
//!
//! In the plain fan chart every name's target cell is its own slot. In
//! FanDoku the father/mother order within a generation may be flipped,
//! so a slot's *cell* — where its name belongs on screen — is a derived
//! permutation of the slot numbers. Cells live in the same numbering
//! space as slots and are laid out with the same `layout` functions,
//! which is what lets the puzzle reuse the chart geometry unchanged.

use std::collections::{BTreeSet, HashMap};

use crate::ahnentafel::{
    child, first_slot, generation, is_maternal, position, slots_in_generation, Slot, ROOT_SLOT,
};

/// Per-generation sign: +1 keeps father-first order, -1 swaps each
/// father/mother pair in that generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOrderFlips {
    signs: Vec<i8>,
}

impl GenOrderFlips {
    /// Identity flips: plain fan-chart order for every generation.
    pub fn identity(num_generations: u32) -> Self {
        Self { signs: vec![1; num_generations as usize] }
    }

    /// Build from explicit signs, indexed by generation.
    ///
    /// Generations 0 and 1 never flip; anything that is not -1 reads as
    /// +1.
    pub fn from_signs(mut signs: Vec<i8>) -> Self {
        for (g, sign) in signs.iter_mut().enumerate() {
            if g < 2 || *sign != -1 {
                *sign = 1;
            }
        }
        Self { signs }
    }

    pub fn sign(&self, generation: u32) -> i8 {
        self.signs.get(generation as usize).copied().unwrap_or(1)
    }

    pub fn is_identity(&self) -> bool {
        self.signs.iter().all(|&s| s == 1)
    }
}

/// Bijection between occupied slots and their puzzle cells.
#[derive(Debug, Clone, Default)]
pub struct CellMap {
    cell_for_slot: HashMap<Slot, Slot>,
    slot_for_cell: HashMap<Slot, Slot>,
}

impl CellMap {
    fn insert(&mut self, slot: Slot, cell: Slot) {
        self.cell_for_slot.insert(slot, cell);
        self.slot_for_cell.insert(cell, slot);
    }

    /// Cell where the name for `slot` belongs.
    pub fn cell_of(&self, slot: Slot) -> Option<Slot> {
        self.cell_for_slot.get(&slot).copied()
    }

    /// Slot whose name belongs in `cell` (the inverse mapping).
    pub fn slot_at(&self, cell: Slot) -> Option<Slot> {
        self.slot_for_cell.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.cell_for_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_for_slot.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Slot)> + '_ {
        self.cell_for_slot.iter().map(|(&s, &c)| (s, c))
    }
}

/// Derive the cell of every occupied slot.
///
/// The root keeps cell 1. The children of slot `n` (slots `2n`, `2n+1`)
/// take the adjacent cell pair `2c`, `2c+1`, where `c` is the cell of
/// `n`; which child takes the even cell follows the generation's flip
/// sign. With identity flips the map degenerates to slot == cell.
pub fn build_cell_map(occupied: &BTreeSet<Slot>, flips: &GenOrderFlips) -> CellMap {
    let mut map = CellMap::default();
    if occupied.contains(&ROOT_SLOT) {
        map.insert(ROOT_SLOT, ROOT_SLOT);
    }
    // Ascending order guarantees a slot's child line is mapped first.
    for &slot in occupied.iter().filter(|&&s| s > ROOT_SLOT) {
        let base = match map.cell_for_slot.get(&child(slot)) {
            Some(&cell) => cell,
            None => continue, // detached from the mapped tree
        };
        let swap = flips.sign(generation(slot)) == -1;
        let cell = if is_maternal(slot) == swap { 2 * base } else { 2 * base + 1 };
        map.insert(slot, cell);
    }
    map
}

/// Keyboard cell navigation: one step per keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMove {
    /// Outward to the parent ring (doubles the cell number).
    Up,
    /// Inward to the child ring (halves the cell number).
    Down,
    Left,
    Right,
}

/// Neighbor of a cell in the given direction.
///
/// `Left`/`Right` wrap within the generation; `Up` stops at the
/// outermost displayed ring and `Down` at generation 1 (the root is not
/// a puzzle cell). A move that cannot go anywhere returns the cell
/// unchanged.
pub fn neighbor_cell(cell: Slot, direction: CellMove, num_generations: u32) -> Slot {
    let g = generation(cell);
    match direction {
        CellMove::Up => {
            if g + 1 < num_generations {
                2 * cell
            } else {
                cell
            }
        }
        CellMove::Down => {
            if g > 1 {
                cell / 2
            } else {
                cell
            }
        }
        CellMove::Left => {
            if position(cell) == 0 {
                cell + slots_in_generation(g) - 1
            } else {
                cell - 1
            }
        }
        CellMove::Right => {
            if position(cell) == slots_in_generation(g) - 1 {
                first_slot(g)
            } else {
                cell + 1
            }
        }
    }
}
