//! Leerpad: a skill tree of physics mini-games with local progress storage.
//!
//! Students unlock games along a dependency graph by scoring above each
//! game's threshold; teachers get a progress dashboard over the same store.

pub mod catalog;
pub mod error;
pub mod minigame;
pub mod progression;
pub mod session;
pub mod store;
pub mod util;

pub use catalog::{Catalog, GameId, GameNode, ENTRY_GAME};
pub use error::{PlatformError, Result};
pub use minigame::{GameSignal, MiniGame, PlaceholderGame};
pub use progression::{evaluate_unlocks, Evaluation, GameProgress, ProgressRecord, ScoreRecord};
pub use session::{Identity, Session, StudentSummary};
pub use store::{RosterEntry, Store, StudentData};
