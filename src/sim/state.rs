//! Game state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::notes::NoteVariant;
use crate::tuning::Tuning;

/// What a falling object is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Note(NoteVariant),
    /// Rare pickup that launches the bonus quiz
    BonusCoin,
}

/// One spawned entity in flight
#[derive(Debug, Clone, PartialEq)]
pub struct FallingObject {
    /// Unique per spawn
    pub id: u32,
    pub kind: ObjectKind,
    /// Center position, y up from the ground
    pub pos: Vec2,
    pub vel: Vec2,
    /// Sprite width (and diameter of its contact circle)
    pub size: f32,
    /// Spawner clock at creation
    pub spawn_time_ms: u64,
}

impl FallingObject {
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is_coin(&self) -> bool {
        self.kind == ObjectKind::BonusCoin
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Still running
    None,
    /// Survived the timer
    Victory,
    /// Ran out of lives
    Defeat,
}

/// State machine view of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active { paused: bool },
    Victory,
    Defeat,
}

/// The mutable per-session numbers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub lives: u32,
    pub time_remaining_ms: u32,
    pub target_note: NoteVariant,
    pub is_paused: bool,
    pub outcome: Outcome,
}

impl SessionState {
    pub fn new(tuning: &Tuning, target_note: NoteVariant) -> Self {
        Self {
            score: 0,
            lives: tuning.starting_lives,
            time_remaining_ms: tuning.session_ms,
            target_note,
            is_paused: false,
            outcome: Outcome::None,
        }
    }

    /// Remaining time in seconds
    pub fn time_remaining(&self) -> f32 {
        self.time_remaining_ms as f32 / 1000.0
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != Outcome::None
    }

    pub fn phase(&self) -> Phase {
        match self.outcome {
            Outcome::None => Phase::Active {
                paused: self.is_paused,
            },
            Outcome::Victory => Phase::Victory,
            Outcome::Defeat => Phase::Defeat,
        }
    }
}
