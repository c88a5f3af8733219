//! Ahnentafel slot arithmetic.
//!
//! Every ancestor position in a binary pedigree has a canonical integer
//! index: the focal person is slot 1, the father of the person in slot
//! `n` is slot `2n`, and the mother is slot `2n + 1`. Generation `g` is
//! a ring of the fan chart and holds slots `2^g .. 2^(g+1) - 1`.

/// Canonical ancestor position in the binary pedigree.
pub type Slot = u64;

/// The focal person of the tree.
pub const ROOT_SLOT: Slot = 1;

/// Ring number of a slot: `floor(log2(slot))`. The root is generation 0.
pub fn generation(slot: Slot) -> u32 {
    debug_assert!(slot >= ROOT_SLOT);
    u64::BITS - 1 - slot.leading_zeros()
}

/// Zero-based position of a slot within its generation.
pub fn position(slot: Slot) -> u64 {
    slot - first_slot(generation(slot))
}

/// Number of slots in a generation: `2^g`.
pub fn slots_in_generation(generation: u32) -> u64 {
    1u64 << generation
}

/// Lowest slot number of a generation: `2^g`.
pub fn first_slot(generation: u32) -> Slot {
    1u64 << generation
}

/// All slot numbers of a generation, in position order.
pub fn generation_slots(generation: u32) -> std::ops::Range<Slot> {
    first_slot(generation)..first_slot(generation + 1)
}

/// Slot of the father of the person in `slot`.
pub fn father(slot: Slot) -> Slot {
    2 * slot
}

/// Slot of the mother of the person in `slot`.
pub fn mother(slot: Slot) -> Slot {
    2 * slot + 1
}

/// Slot of the person whose parent this slot holds (`n / 2`).
pub fn child(slot: Slot) -> Slot {
    slot / 2
}

/// Mother-side slots are the odd ones, excepting the root.
pub fn is_maternal(slot: Slot) -> bool {
    slot > ROOT_SLOT && slot % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_generation_zero() {
        assert_eq!(generation(ROOT_SLOT), 0);
        assert_eq!(position(ROOT_SLOT), 0);
    }

    #[test]
    fn test_generation_is_floor_log2() {
        for slot in 1..1024u64 {
            assert_eq!(generation(slot), (slot as f64).log2().floor() as u32);
        }
    }

    #[test]
    fn test_position_within_generation() {
        for slot in 1..1024u64 {
            let g = generation(slot);
            let p = position(slot);
            assert!(p < slots_in_generation(g));
            assert_eq!(first_slot(g) + p, slot);
        }
    }

    #[test]
    fn test_parent_slots() {
        assert_eq!(father(1), 2);
        assert_eq!(mother(1), 3);
        assert_eq!(father(6), 12);
        assert_eq!(mother(6), 13);
        for slot in 1..512u64 {
            assert_eq!(child(father(slot)), slot);
            assert_eq!(child(mother(slot)), slot);
            assert_eq!(generation(father(slot)), generation(slot) + 1);
        }
    }

    #[test]
    fn test_maternal_side() {
        assert!(!is_maternal(ROOT_SLOT));
        assert!(!is_maternal(2));
        assert!(is_maternal(3));
        assert!(!is_maternal(12));
        assert!(is_maternal(13));
    }

    #[test]
    fn test_generation_slots_range() {
        let slots: Vec<Slot> = generation_slots(2).collect();
        assert_eq!(slots, vec![4, 5, 6, 7]);
    }
}
