//! The ahnentafel index: slot ↔ person bindings.
//!
//! Two coupled maps — `slot → person` and `person → slots` — extended as
//! generations are fetched. The many-to-one direction matters: with
//! pedigree collapse one real person occupies several slots, and every
//! slot stays independently addressable for geometry while sharing the
//! one record.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use fandoku_logic::ahnentafel::{
    child, father, generation, generation_slots, mother, Slot, ROOT_SLOT,
};

use crate::person::PersonId;
use crate::store::AncestorStore;

/// A walk this deep means a cycle in the source data, not a pedigree.
const MAX_WALK_GENERATIONS: u32 = 32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AhnentafelIndex {
    person_for_slot: HashMap<Slot, PersonId>,
    slots_for_person: HashMap<PersonId, BTreeSet<Slot>>,
}

impl AhnentafelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind slot 1 to the focal person.
    pub fn assign_root(&mut self, id: PersonId) {
        self.bind(ROOT_SLOT, id);
    }

    /// Bind a slot unless it is already occupied. Occupancy is
    /// monotonic: an occupied slot is never rebound, even to a
    /// different person.
    pub(crate) fn bind(&mut self, slot: Slot, id: PersonId) -> bool {
        if self.person_for_slot.contains_key(&slot) {
            return false;
        }
        self.slots_for_person.entry(id.clone()).or_default().insert(slot);
        self.person_for_slot.insert(slot, id);
        true
    }

    /// Bind the parent slots of `slot` from its person's record.
    ///
    /// A parent is bound when its identifier is on the record, its own
    /// record has been fetched, and it is not private. A person already
    /// bound elsewhere (pedigree collapse) is bound again to the new
    /// slot. Returns the slots this call bound.
    pub fn derive_children(&mut self, slot: Slot, store: &AncestorStore) -> Vec<Slot> {
        let mut bound = Vec::new();
        let person = match self.person_for_slot.get(&slot).and_then(|id| store.get(id)) {
            Some(person) => person,
            None => return bound,
        };
        let pairs = [
            (father(slot), person.father.clone()),
            (mother(slot), person.mother.clone()),
        ];
        for (parent_slot, parent_id) in pairs {
            let parent_id = match parent_id {
                Some(id) => id,
                None => continue, // unknown parent: slot stays vacant
            };
            let record = match store.get(&parent_id) {
                Some(record) => record,
                None => continue, // not fetched yet
            };
            if record.private {
                continue; // private records stay off the chart
            }
            if self.bind(parent_slot, parent_id) {
                bound.push(parent_slot);
            }
        }
        bound
    }

    /// Vacant slots in `generation` whose child slot is occupied — the
    /// candidates for the next fetch.
    pub fn slots_needing(&self, generation: u32) -> Vec<Slot> {
        generation_slots(generation)
            .filter(|slot| !self.person_for_slot.contains_key(slot))
            .filter(|slot| self.person_for_slot.contains_key(&child(*slot)))
            .collect()
    }

    pub fn person_at(&self, slot: Slot) -> Option<&PersonId> {
        self.person_for_slot.get(&slot)
    }

    /// Every slot a person occupies; more than one under pedigree
    /// collapse.
    pub fn slots_of(&self, id: &str) -> impl Iterator<Item = Slot> + '_ {
        self.slots_for_person.get(id).into_iter().flatten().copied()
    }

    pub fn is_occupied(&self, slot: Slot) -> bool {
        self.person_for_slot.contains_key(&slot)
    }

    /// Occupied slots of one generation, in position order.
    pub fn occupied_in(&self, generation: u32) -> Vec<Slot> {
        generation_slots(generation)
            .filter(|slot| self.person_for_slot.contains_key(slot))
            .collect()
    }

    pub fn occupied_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.person_for_slot.keys().copied()
    }

    /// Whether two slots resolve to the same person.
    pub fn same_person(&self, a: Slot, b: Slot) -> bool {
        match (self.person_at(a), self.person_at(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Extend bindings from the store, walking out from the root.
    ///
    /// Idempotent: running it again with a superset of data only adds
    /// bindings, never removes one.
    pub fn rebuild(&mut self, store: &AncestorStore) {
        let mut frontier = vec![ROOT_SLOT];
        while let Some(slot) = frontier.pop() {
            if !self.person_for_slot.contains_key(&slot) {
                continue;
            }
            if generation(slot) >= MAX_WALK_GENERATIONS {
                continue;
            }
            self.derive_children(slot, store);
            frontier.push(father(slot));
            frontier.push(mother(slot));
        }
    }

    /// Full reset for a new root person.
    pub fn clear(&mut self) {
        self.person_for_slot.clear();
        self.slots_for_person.clear();
    }

    pub fn len(&self) -> usize {
        self.person_for_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.person_for_slot.is_empty()
    }
}
