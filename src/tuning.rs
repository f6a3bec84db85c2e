//! Data-driven game balance
//!
//! Every timing, size and reward constant of the arcade mode. Loaded from
//! JSON; missing fields fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Arcade balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session ===
    /// Level length; surviving it wins
    pub session_ms: u32,
    pub starting_lives: u32,
    /// Countdown granularity
    pub countdown_step_ms: u32,
    /// How often the target note changes
    pub target_rotation_ms: u64,
    /// Coins for a completed level
    pub victory_reward: u32,

    // === Spawning ===
    pub note_spawn_ms: u64,
    pub coin_delay_min_ms: u64,
    pub coin_delay_max_ms: u64,
    /// One spawn in this many is the key
    pub key_chance_denominator: u32,

    // === Play area (points) ===
    pub play_width: f32,
    pub play_height: f32,
    pub note_size: f32,
    pub note_margin: f32,
    pub coin_size: f32,
    pub coin_margin: f32,
    /// Downward acceleration, points/s²
    pub gravity: f32,

    // === Catcher ===
    pub catcher_width: f32,
    pub catcher_height: f32,
    /// Center height above the ground
    pub catcher_y: f32,
    /// Max horizontal speed, points/s
    pub catcher_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            session_ms: 60_000,
            starting_lives: 5,
            countdown_step_ms: 100,
            target_rotation_ms: 10_000,
            victory_reward: 10,

            note_spawn_ms: 1_000,
            coin_delay_min_ms: 15_000,
            coin_delay_max_ms: 25_000,
            key_chance_denominator: 10,

            play_width: 390.0,
            play_height: 844.0,
            note_size: 30.0,
            note_margin: 16.0,
            coin_size: 35.0,
            coin_margin: 8.0,
            // SpriteKit gravity of 5 m/s² at 150 points per meter
            gravity: 750.0,

            catcher_width: 50.0,
            catcher_height: 100.0,
            catcher_y: 80.0,
            catcher_speed: 1200.0,
        }
    }
}

impl Tuning {
    /// Parse from a JSON document (partial documents are fine)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({})", e);
                Self::default()
            }
        }
    }

    /// Reject balances that would break gameplay invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.session_ms == 0 || self.countdown_step_ms == 0 {
            return Err(TuningError::Invalid("session and countdown step must be non-zero".into()));
        }
        if self.starting_lives == 0 {
            return Err(TuningError::Invalid("starting_lives must be at least 1".into()));
        }
        if self.target_rotation_ms == 0 || self.note_spawn_ms == 0 {
            return Err(TuningError::Invalid("timer periods must be non-zero".into()));
        }
        if self.coin_delay_min_ms > self.coin_delay_max_ms {
            return Err(TuningError::Invalid(format!(
                "coin delay range is empty: {}..={}",
                self.coin_delay_min_ms, self.coin_delay_max_ms
            )));
        }
        if self.key_chance_denominator == 0 {
            return Err(TuningError::Invalid("key_chance_denominator must be non-zero".into()));
        }
        let widest = (self.note_size + 2.0 * self.note_margin).max(self.coin_size + 2.0 * self.coin_margin);
        if self.play_width < widest {
            return Err(TuningError::Invalid(format!(
                "play width {} cannot fit a spawn of width {}",
                self.play_width, widest
            )));
        }
        if self.play_width < self.catcher_width {
            return Err(TuningError::Invalid("catcher wider than the play area".into()));
        }
        Ok(())
    }
}
