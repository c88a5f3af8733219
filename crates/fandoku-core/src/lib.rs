//! Fandoku Core - Fan Chart and Matching Puzzle Engine
//!
//! An ahnentafel-indexed pedigree engine: person records fetched one
//! generation at a time, a slot index that tolerates pedigree collapse,
//! polar fan geometry, and a matching game ("FanDoku") played against
//! the same numbering.
//!
//! # Architecture
//!
//! Data flows in one direction: the loader fills the store, the index
//! derives slot bindings from the store, the layout reads the index,
//! and the game and renderer read all three. [`engine::ChartEngine`]
//! ties the pieces together and keeps that order.
//!
//! # Example
//!
//! ```rust,no_run
//! use fandoku_core::prelude::*;
//! use fandoku_core::game::GameMode;
//! use fandoku_core::person::PersonName;
//!
//! let mut engine = ChartEngine::new();
//! engine.set_root(Person::new("root", PersonName::new("Nils", "Aas")));
//!
//! // Fetch generations, then play.
//! let mut rng = rand::thread_rng();
//! engine.start_game(GameMode::FanDoku, 1, &mut rng);
//! for item in engine.scene().items {
//!     // hand shape/transform/text to the renderer
//!     let _ = item.slot;
//! }
//! ```

pub mod engine;
pub mod game;
pub mod index;
pub mod loader;
pub mod persistence;
pub mod person;
pub mod scene;
pub mod source;
pub mod store;

/// Commonly used types for convenient importing.
pub mod prelude {
    pub use crate::engine::ChartEngine;
    pub use crate::game::{GameMode, GameStatus, MatchingGame};
    pub use crate::index::AhnentafelIndex;
    pub use crate::loader::{AncestorLoader, EnsureOutcome};
    pub use crate::person::{Person, PersonName};
    pub use crate::store::AncestorStore;
}
