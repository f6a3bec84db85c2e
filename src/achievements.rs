//! Achievement system
//!
//! Rules are pure functions of a telemetry snapshot and the persisted
//! counters. Unlocking only marks an achievement completed; the reward is
//! granted by a separate claim.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::platform::Economy;
use crate::sim::{NoteVariant, Outcome};

/// Consecutive correct catches for "First Chord"
pub const FIRST_CHORD_STREAK: u32 = 10;
/// Perfect victories in a row for "Perfect Melody"
pub const PERFECT_MELODY_STREAK: u32 = 3;
/// Trailing window for "Tempo Solo"
pub const TEMPO_WINDOW_MS: u64 = 5_000;
/// Catches inside the window for "Tempo Solo"
pub const TEMPO_CATCHES: usize = 5;
/// Completed levels for "Colour Maestro"
pub const COLOUR_MAESTRO_LEVELS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstChord,
    ColourSymphony,
    PerfectMelody,
    TempoSolo,
    ColourMaestro,
}

/// Static achievement description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub reward: u32,
}

pub const ACHIEVEMENTS: [Achievement; 5] = [
    Achievement {
        id: AchievementId::FirstChord,
        title: "First Chord",
        description: "Catch 10 notes in a row without making a mistake.",
        reward: 10,
    },
    Achievement {
        id: AchievementId::ColourSymphony,
        title: "Colour Symphony",
        description: "Get through the level without missing a single note of each colour.",
        reward: 10,
    },
    Achievement {
        id: AchievementId::PerfectMelody,
        title: "Perfect Melody",
        description: "Complete 3 levels in a row without making any mistakes.",
        reward: 10,
    },
    Achievement {
        id: AchievementId::TempoSolo,
        title: "Tempo Solo",
        description: "Try to catch 5 notes in 5 seconds.",
        reward: 10,
    },
    Achievement {
        id: AchievementId::ColourMaestro,
        title: "Colour Maestro",
        description: "Complete 10 levels.",
        reward: 10,
    },
];

impl AchievementId {
    pub const ALL: [AchievementId; 5] = [
        AchievementId::FirstChord,
        AchievementId::ColourSymphony,
        AchievementId::PerfectMelody,
        AchievementId::TempoSolo,
        AchievementId::ColourMaestro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementId::FirstChord => "first_chord",
            AchievementId::ColourSymphony => "colour_symphony",
            AchievementId::PerfectMelody => "perfect_melody",
            AchievementId::TempoSolo => "tempo_solo",
            AchievementId::ColourMaestro => "colour_maestro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    pub fn info(&self) -> &'static Achievement {
        match self {
            AchievementId::FirstChord => &ACHIEVEMENTS[0],
            AchievementId::ColourSymphony => &ACHIEVEMENTS[1],
            AchievementId::PerfectMelody => &ACHIEVEMENTS[2],
            AchievementId::TempoSolo => &ACHIEVEMENTS[3],
            AchievementId::ColourMaestro => &ACHIEVEMENTS[4],
        }
    }

    pub fn reward(&self) -> u32 {
        self.info().reward
    }
}

/// Persisted per-profile achievement state.
/// Invariant: `claimed` is a subset of `completed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementProgress {
    /// Unlock condition met
    pub completed: BTreeSet<AchievementId>,
    /// Reward collected
    pub claimed: BTreeSet<AchievementId>,
    /// Consecutive zero-mistake victories
    pub perfect_level_streak: u32,
    pub levels_completed_total: u32,
}

impl AchievementProgress {
    pub fn is_completed(&self, id: AchievementId) -> bool {
        self.completed.contains(&id)
    }

    pub fn is_claimed(&self, id: AchievementId) -> bool {
        self.claimed.contains(&id)
    }

    pub fn is_claimable(&self, id: AchievementId) -> bool {
        self.is_completed(id) && !self.is_claimed(id)
    }

    /// Mark completed. Returns false if it already was.
    pub fn unlock(&mut self, id: AchievementId) -> bool {
        self.completed.insert(id)
    }

    /// Mark claimed and return the reward to grant, or `None` if the
    /// achievement is not claimable.
    pub fn claim(&mut self, id: AchievementId) -> Option<u32> {
        if !self.is_claimable(id) {
            return None;
        }
        self.claimed.insert(id);
        Some(id.reward())
    }
}

/// Claim a reward and pay it out through `economy`
pub fn claim_reward<E: Economy + ?Sized>(
    progress: &mut AchievementProgress,
    id: AchievementId,
    economy: &mut E,
) -> bool {
    match progress.claim(id) {
        Some(reward) => {
            economy.add_coins(reward as i64);
            log::info!("Claimed {} (+{} coins)", id.as_str(), reward);
            true
        }
        None => false,
    }
}

/// Live counters for one session (reset with the session)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTelemetry {
    pub consecutive_correct: u32,
    pub wrong_notes: u32,
    pub missed_target_colors: BTreeSet<NoteVariant>,
    /// Session clock of recent catches, oldest first
    recent_catches: VecDeque<u64>,
}

impl SessionTelemetry {
    pub fn record_catch(&mut self, correct: bool, now_ms: u64) {
        if correct {
            self.consecutive_correct += 1;
        } else {
            self.consecutive_correct = 0;
            self.wrong_notes += 1;
        }
        self.recent_catches.push_back(now_ms);
        self.evict(now_ms);
    }

    pub fn record_missed_target(&mut self, variant: NoteVariant) {
        self.missed_target_colors.insert(variant);
    }

    /// Catches inside the trailing window ending at `now_ms`
    pub fn catches_in_window(&mut self, now_ms: u64) -> usize {
        self.evict(now_ms);
        self.recent_catches.len()
    }

    fn evict(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.recent_catches.front() {
            if now_ms.saturating_sub(oldest) > TEMPO_WINDOW_MS {
                self.recent_catches.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn snapshot(&mut self, outcome: Outcome, now_ms: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            consecutive_correct: self.consecutive_correct,
            wrong_notes: self.wrong_notes,
            missed_target_colors: self.missed_target_colors.clone(),
            catches_in_window: self.catches_in_window(now_ms),
            outcome,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Telemetry passed by value into the rule evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub consecutive_correct: u32,
    pub wrong_notes: u32,
    pub missed_target_colors: BTreeSet<NoteVariant>,
    pub catches_in_window: usize,
    pub outcome: Outcome,
}

/// Achievements whose condition holds and that are not yet completed
pub fn evaluate(snapshot: &TelemetrySnapshot, progress: &AchievementProgress) -> Vec<AchievementId> {
    let victory = snapshot.outcome == Outcome::Victory;
    let rules = [
        (
            AchievementId::FirstChord,
            snapshot.consecutive_correct >= FIRST_CHORD_STREAK,
        ),
        (
            AchievementId::ColourSymphony,
            victory && snapshot.missed_target_colors.is_empty(),
        ),
        (
            AchievementId::PerfectMelody,
            progress.perfect_level_streak >= PERFECT_MELODY_STREAK,
        ),
        (
            AchievementId::TempoSolo,
            snapshot.catches_in_window >= TEMPO_CATCHES,
        ),
        (
            AchievementId::ColourMaestro,
            progress.levels_completed_total >= COLOUR_MAESTRO_LEVELS,
        ),
    ];

    rules
        .into_iter()
        .filter(|(id, met)| *met && !progress.is_completed(*id))
        .map(|(id, _)| id)
        .collect()
}

/// Cross-session counters after a session ends with `snapshot.outcome`
pub fn conclude_session(snapshot: &TelemetrySnapshot, progress: &AchievementProgress) -> AchievementProgress {
    let mut next = progress.clone();
    match snapshot.outcome {
        Outcome::Victory => {
            next.levels_completed_total += 1;
            if snapshot.wrong_notes == 0 {
                next.perfect_level_streak += 1;
            } else {
                next.perfect_level_streak = 0;
            }
        }
        Outcome::Defeat => {
            if snapshot.wrong_notes > 0 {
                next.perfect_level_streak = 0;
            }
        }
        Outcome::None => {}
    }
    next
}

/// What changed when a session ended
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub unlocked: Vec<AchievementId>,
    pub perfect_level_streak: u32,
    pub levels_completed_total: u32,
}

/// Session-side tracker: live telemetry plus a working copy of the
/// persisted counters read at session start
#[derive(Debug, Clone)]
pub struct AchievementTracker {
    telemetry: SessionTelemetry,
    progress: AchievementProgress,
    concluded: bool,
}

impl AchievementTracker {
    pub fn new(progress: AchievementProgress) -> Self {
        Self {
            telemetry: SessionTelemetry::default(),
            progress,
            concluded: false,
        }
    }

    pub fn telemetry(&self) -> &SessionTelemetry {
        &self.telemetry
    }

    pub fn progress(&self) -> &AchievementProgress {
        &self.progress
    }

    /// A note was caught; `correct` when it matched the target
    pub fn note_caught(&mut self, correct: bool, now_ms: u64) -> Vec<AchievementId> {
        self.telemetry.record_catch(correct, now_ms);
        self.check(Outcome::None, now_ms)
    }

    /// The current target fell to the ground
    pub fn target_missed(&mut self, variant: NoteVariant, now_ms: u64) -> Vec<AchievementId> {
        self.telemetry.record_missed_target(variant);
        self.check(Outcome::None, now_ms)
    }

    /// Apply end-of-session counter updates and the final rule pass.
    /// Runs once per session; later calls return `None`.
    pub fn session_ended(&mut self, outcome: Outcome, now_ms: u64) -> Option<SessionSummary> {
        if self.concluded || outcome == Outcome::None {
            return None;
        }
        self.concluded = true;

        let snapshot = self.telemetry.snapshot(outcome, now_ms);
        self.progress = conclude_session(&snapshot, &self.progress);
        let unlocked = if outcome == Outcome::Victory {
            self.apply(evaluate(&snapshot, &self.progress))
        } else {
            Vec::new()
        };

        Some(SessionSummary {
            unlocked,
            perfect_level_streak: self.progress.perfect_level_streak,
            levels_completed_total: self.progress.levels_completed_total,
        })
    }

    /// Clear session counters; persisted counters are untouched
    pub fn reset_session(&mut self) {
        self.telemetry.reset();
        self.concluded = false;
    }

    fn check(&mut self, outcome: Outcome, now_ms: u64) -> Vec<AchievementId> {
        let snapshot = self.telemetry.snapshot(outcome, now_ms);
        let unlocked = evaluate(&snapshot, &self.progress);
        self.apply(unlocked)
    }

    fn apply(&mut self, unlocked: Vec<AchievementId>) -> Vec<AchievementId> {
        for id in &unlocked {
            self.progress.unlock(*id);
            log::info!("Achievement unlocked: {}", id.info().title);
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wallet(i64);

    impl Economy for Wallet {
        fn add_coins(&mut self, amount: i64) {
            self.0 += amount;
        }

        fn coins(&self) -> i64 {
            self.0
        }
    }

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            consecutive_correct: 0,
            wrong_notes: 0,
            missed_target_colors: BTreeSet::new(),
            catches_in_window: 0,
            outcome: Outcome::None,
        }
    }

    #[test]
    fn test_ids_roundtrip_strings() {
        for id in AchievementId::ALL {
            assert_eq!(AchievementId::parse(id.as_str()), Some(id));
            assert_eq!(id.info().id, id);
        }
        assert_eq!(AchievementId::parse("nope"), None);
        let json = serde_json::to_string(&AchievementId::TempoSolo).unwrap();
        assert_eq!(json, "\"tempo_solo\"");
    }

    #[test]
    fn test_first_chord_after_ten_correct() {
        let mut tracker = AchievementTracker::new(AchievementProgress::default());
        // Spaced so the tempo window never holds five catches
        for i in 0..9 {
            assert!(tracker.note_caught(true, i * 1500).is_empty());
        }
        assert_eq!(tracker.note_caught(true, 13_500), vec![AchievementId::FirstChord]);
        assert_eq!(tracker.telemetry().consecutive_correct, 10);
        assert!(tracker.progress().is_completed(AchievementId::FirstChord));
        assert!(tracker.note_caught(true, 15_000).is_empty());
    }

    #[test]
    fn test_wrong_note_breaks_streak() {
        let mut telemetry = SessionTelemetry::default();
        for i in 0..5 {
            telemetry.record_catch(true, i * 2000);
        }
        telemetry.record_catch(false, 11_000);
        assert_eq!(telemetry.consecutive_correct, 0);
        assert_eq!(telemetry.wrong_notes, 1);
    }

    #[test]
    fn test_tempo_window_evicts_old_catches() {
        let mut tracker = AchievementTracker::new(AchievementProgress::default());
        // Four quick catches, then a gap longer than the window
        for t in [0, 500, 1000, 1500] {
            assert!(tracker.note_caught(true, t).is_empty());
        }
        assert!(tracker.note_caught(false, 7000).is_empty());
        for t in [7200, 7400, 7600] {
            assert!(tracker.note_caught(true, t).is_empty());
        }
        assert_eq!(tracker.note_caught(true, 7800), vec![AchievementId::TempoSolo]);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut progress = AchievementProgress::default();
        let snap = TelemetrySnapshot {
            consecutive_correct: 12,
            ..snapshot()
        };
        let first = evaluate(&snap, &progress);
        assert_eq!(first, vec![AchievementId::FirstChord]);
        for id in &first {
            assert!(progress.unlock(*id));
        }
        assert!(evaluate(&snap, &progress).is_empty());
        assert!(!progress.unlock(AchievementId::FirstChord));
        assert_eq!(progress.completed.len(), 1);
    }

    #[test]
    fn test_colour_symphony_needs_clean_victory() {
        let progress = AchievementProgress::default();
        let clean = TelemetrySnapshot {
            outcome: Outcome::Victory,
            ..snapshot()
        };
        assert!(evaluate(&clean, &progress).contains(&AchievementId::ColourSymphony));

        let mut missed = clean.clone();
        missed.missed_target_colors.insert(NoteVariant::Note3);
        assert!(!evaluate(&missed, &progress).contains(&AchievementId::ColourSymphony));

        let unfinished = snapshot();
        assert!(!evaluate(&unfinished, &progress).contains(&AchievementId::ColourSymphony));
    }

    #[test]
    fn test_perfect_melody_on_third_perfect_victory() {
        let mut progress = AchievementProgress::default();
        for session in 1..=3 {
            let mut tracker = AchievementTracker::new(progress.clone());
            let summary = tracker.session_ended(Outcome::Victory, 60_000).unwrap();
            assert_eq!(summary.perfect_level_streak, session);
            assert_eq!(
                summary.unlocked.contains(&AchievementId::PerfectMelody),
                session == 3
            );
            progress = tracker.progress().clone();
        }
        assert_eq!(progress.levels_completed_total, 3);
    }

    #[test]
    fn test_wrong_note_session_resets_streak() {
        let progress = AchievementProgress {
            perfect_level_streak: 2,
            ..AchievementProgress::default()
        };
        let mut tracker = AchievementTracker::new(progress);
        tracker.note_caught(false, 100);
        let summary = tracker.session_ended(Outcome::Victory, 60_000).unwrap();
        assert_eq!(summary.perfect_level_streak, 0);
        assert!(!summary.unlocked.contains(&AchievementId::PerfectMelody));
    }

    #[test]
    fn test_defeat_resets_streak_without_unlocks() {
        let progress = AchievementProgress {
            perfect_level_streak: 2,
            levels_completed_total: 9,
            ..AchievementProgress::default()
        };
        let mut tracker = AchievementTracker::new(progress);
        tracker.note_caught(false, 100);
        let summary = tracker.session_ended(Outcome::Defeat, 5_000).unwrap();
        assert_eq!(summary.perfect_level_streak, 0);
        assert_eq!(summary.levels_completed_total, 9);
        assert!(summary.unlocked.is_empty());
    }

    #[test]
    fn test_session_ends_once() {
        let mut tracker = AchievementTracker::new(AchievementProgress::default());
        assert!(tracker.session_ended(Outcome::Victory, 1).is_some());
        assert!(tracker.session_ended(Outcome::Victory, 2).is_none());
        assert_eq!(tracker.progress().levels_completed_total, 1);
        assert!(tracker.session_ended(Outcome::None, 3).is_none());
    }

    #[test]
    fn test_colour_maestro_on_tenth_level() {
        let progress = AchievementProgress {
            levels_completed_total: 9,
            ..AchievementProgress::default()
        };
        let mut tracker = AchievementTracker::new(progress);
        tracker.note_caught(false, 0);
        let summary = tracker.session_ended(Outcome::Victory, 60_000).unwrap();
        assert!(summary.unlocked.contains(&AchievementId::ColourMaestro));
    }

    #[test]
    fn test_reset_session_keeps_persisted_counters() {
        let progress = AchievementProgress {
            perfect_level_streak: 1,
            levels_completed_total: 4,
            ..AchievementProgress::default()
        };
        let mut tracker = AchievementTracker::new(progress.clone());
        tracker.note_caught(false, 10);
        tracker.target_missed(NoteVariant::Note1, 20);
        tracker.reset_session();
        assert_eq!(tracker.telemetry(), &SessionTelemetry::default());
        assert_eq!(tracker.progress(), &progress);
    }

    #[test]
    fn test_claim_once() {
        let mut progress = AchievementProgress::default();
        let mut wallet = Wallet(0);
        assert!(!claim_reward(&mut progress, AchievementId::TempoSolo, &mut wallet));
        progress.unlock(AchievementId::TempoSolo);
        assert!(claim_reward(&mut progress, AchievementId::TempoSolo, &mut wallet));
        assert!(!claim_reward(&mut progress, AchievementId::TempoSolo, &mut wallet));
        assert_eq!(wallet.coins(), 10);
        assert!(progress.claimed.is_subset(&progress.completed));
    }
}
