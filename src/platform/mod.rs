//! Platform abstraction layer
//!
//! The narrow capabilities the game core needs from its host:
//! - Economy (coin balance)
//! - Scene (rendering/physics layer that owns the falling sprites)
//! - Quiz (bonus quiz launched by a caught coin)
//! - Logging backend selection (env_logger native, console on web)

use crate::sim::FallingObject;

/// Coin balance owner
pub trait Economy {
    /// Add (or, when negative, remove) coins. Callers validate purchases first.
    fn add_coins(&mut self, amount: i64);
    fn coins(&self) -> i64;
}

/// Rendering/physics collaborator
pub trait Scene {
    fn spawn(&mut self, object: FallingObject);
    /// Remove an object after its first qualifying contact
    fn remove(&mut self, id: u32);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Drop every object and unfreeze
    fn reset_scene(&mut self);
}

/// Bonus quiz collaborator. Completion is reported back through the tick input.
pub trait QuizHost {
    fn start_quiz(&mut self);
}

/// Initialize logging (safe to call more than once)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Initialize logging (safe to call more than once)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
