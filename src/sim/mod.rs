//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod notes;
pub mod playfield;
pub mod scheduler;
pub mod session;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Body, CollisionRouter, Contact, EventQueue, GameEvent, GameEventSink};
pub use notes::{FULL_CATALOG, NON_KEY_CATALOG, NoteColor, NoteVariant};
pub use playfield::{Catcher, Playfield};
pub use scheduler::Scheduler;
pub use session::{GameSession, SessionEffect};
pub use spawner::Spawner;
pub use state::{FallingObject, ObjectKind, Outcome, Phase, SessionState};
pub use tick::{Arcade, FrameClock, TickInput, tick};
