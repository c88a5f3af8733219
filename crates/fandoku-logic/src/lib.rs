//! Pure fan-chart math for Fandoku.
//!
//! This crate contains all layout and puzzle math that is independent of
//! any data source, renderer, or runtime. Functions take plain data and
//! return results, making them unit-testable and portable across the
//! chart view, the FanDoku puzzle, and any future host.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ahnentafel`] | Slot arithmetic (root=1, father=2n, mother=2n+1) |
//! | [`cells`] | Slot↔cell permutation for FanDoku, cell navigation |
//! | [`config`] | Fan geometry knobs with snap/clamp validation |
//! | [`layout`] | Polar placement: slot → angle, rotation, radius |
//! | [`wedge`] | Sector/annulus-wedge shapes and the per-ring cache |

pub mod ahnentafel;
pub mod cells;
pub mod config;
pub mod layout;
pub mod wedge;
