//! Note Catcher - a falling-notes arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, collisions, session state machine)
//! - `achievements`: Achievement rules, unlocks and reward claims
//! - `minigames`: Guess-number, memory-match and sequence-recall engines
//! - `persistence`: Profile progress and key-value storage backends
//! - `platform`: Collaborator traits and logging setup
//! - `tuning`: Data-driven game balance

pub mod achievements;
pub mod minigames;
pub mod persistence;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use achievements::{AchievementId, AchievementProgress, AchievementTracker};
pub use persistence::{PersistedProgress, Profile};
pub use platform::init_logging;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step in milliseconds (100 Hz)
    pub const SIM_STEP_MS: u64 = 10;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = SIM_STEP_MS as f32 / 1000.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Highest level that can ever be unlocked
    pub const MAX_LEVEL: u32 = 15;

    /// Key the profile blob is stored under
    pub const PROFILE_KEY: &str = "oneidaGameState";

    /// Coins granted once per calendar day on login
    pub const DAILY_BONUS: i64 = 20;
}
