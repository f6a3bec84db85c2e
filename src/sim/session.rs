//! Game session state machine
//!
//! Owns the per-level numbers, the countdown and target rotation timers, and
//! the session side of achievement tracking. Collaborators are never called
//! from here; every outward action is queued as a [`SessionEffect`].

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::GameEventSink;
use super::notes::{NoteVariant, next_target, random_target};
use super::scheduler::Scheduler;
use super::state::{Outcome, Phase, SessionState};
use crate::achievements::{AchievementId, AchievementProgress, AchievementTracker};
use crate::tuning::Tuning;

/// Outward actions requested by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Freeze spawning and the scene
    PauseScene,
    ResumeScene,
    /// Clear the scene and restart spawning
    ResetScene,
    /// Hand control to the bonus quiz
    StartQuiz,
    AwardCoins(u32),
    /// A target note was caught
    NoteCollected,
    AchievementUnlocked(AchievementId),
    /// New value of the persisted perfect-level streak
    PerfectStreak(u32),
    LevelCompleted { level: u32 },
    LevelFailed { level: u32 },
}

/// Bonus quiz progress within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizStage {
    Idle,
    /// Coin caught this step; the quiz opens at the next `advance`
    CoinCaught,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    Countdown,
    TargetRotation,
}

/// One level of play
#[derive(Debug, Clone)]
pub struct GameSession {
    tuning: Tuning,
    level: u32,
    state: SessionState,
    timers: Scheduler<SessionTimer>,
    rng: Pcg32,
    tracker: AchievementTracker,
    /// Active (unpaused) time since the last reset
    clock_ms: u64,
    quiz: QuizStage,
    effects: Vec<SessionEffect>,
}

impl GameSession {
    pub fn new(tuning: &Tuning, level: u32, progress: AchievementProgress, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let target = random_target(&mut rng);
        let mut session = Self {
            tuning: tuning.clone(),
            level,
            state: SessionState::new(tuning, target),
            timers: Scheduler::new(),
            rng,
            tracker: AchievementTracker::new(progress),
            clock_ms: 0,
            quiz: QuizStage::Idle,
            effects: Vec::new(),
        };
        session.start_timers();
        log::info!("Level {} started, target {}", level, target.as_str());
        session
    }

    fn start_timers(&mut self) {
        self.timers
            .every(SessionTimer::Countdown, self.tuning.countdown_step_ms as u64);
        self.timers
            .every(SessionTimer::TargetRotation, self.tuning.target_rotation_ms);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn tracker(&self) -> &AchievementTracker {
        &self.tracker
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// A coin was caught and its quiz has not finished yet
    pub fn is_quiz_pending(&self) -> bool {
        self.quiz != QuizStage::Idle
    }

    /// Time until the target changes, `None` once timers are stopped
    pub fn next_rotation_in(&self) -> Option<u64> {
        self.timers.remaining(SessionTimer::TargetRotation)
    }

    fn accepts_events(&self) -> bool {
        !self.state.is_terminal() && !self.state.is_paused
    }

    /// Advance the session timers. A coin caught since the last call opens
    /// the bonus quiz instead, so every event of that step is counted first.
    pub fn advance(&mut self, elapsed_ms: u64) {
        if !self.accepts_events() {
            return;
        }
        if self.quiz == QuizStage::CoinCaught {
            self.quiz = QuizStage::Open;
            self.pause();
            self.effects.push(SessionEffect::StartQuiz);
            return;
        }
        self.clock_ms += elapsed_ms;

        for timer in self.timers.advance(elapsed_ms) {
            if self.state.is_terminal() {
                break;
            }
            match timer {
                SessionTimer::Countdown => {
                    self.state.time_remaining_ms = self
                        .state
                        .time_remaining_ms
                        .saturating_sub(self.tuning.countdown_step_ms);
                    if self.state.time_remaining_ms == 0 {
                        self.finish(Outcome::Victory);
                    }
                }
                SessionTimer::TargetRotation => {
                    let next = next_target(&mut self.rng, self.state.target_note);
                    log::debug!(
                        "Target {} -> {}",
                        self.state.target_note.as_str(),
                        next.as_str()
                    );
                    self.state.target_note = next;
                }
            }
        }
    }

    /// Pause or resume play. Terminal sessions ignore this, and so does
    /// resuming while the bonus quiz is open.
    pub fn toggle_pause(&mut self, paused: bool) {
        if self.state.is_terminal() || self.state.is_paused == paused {
            return;
        }
        if paused {
            self.pause();
        } else if self.quiz == QuizStage::Open {
            log::debug!("Resume ignored while the quiz is open");
        } else {
            self.resume();
        }
    }

    fn pause(&mut self) {
        self.state.is_paused = true;
        self.timers.pause();
        self.effects.push(SessionEffect::PauseScene);
        log::info!("Paused");
    }

    fn resume(&mut self) {
        self.state.is_paused = false;
        self.timers.resume();
        self.effects.push(SessionEffect::ResumeScene);
        log::info!("Resumed");
    }

    /// The bonus quiz finished with `earned` coins
    pub fn quiz_completed(&mut self, earned: u32) {
        if self.quiz != QuizStage::Open {
            log::debug!("Quiz completion without an open quiz ignored");
            return;
        }
        self.quiz = QuizStage::Idle;
        self.resume();
        self.effects.push(SessionEffect::AwardCoins(earned));
    }

    /// Restart the level from scratch. Persisted counters are untouched.
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        let target = random_target(&mut self.rng);
        self.state = SessionState::new(&self.tuning, target);
        self.tracker.reset_session();
        self.clock_ms = 0;
        self.quiz = QuizStage::Idle;
        self.start_timers();
        self.effects.push(SessionEffect::ResetScene);
        log::info!("Level {} reset, target {}", self.level, target.as_str());
    }

    /// Take the queued effects
    pub fn drain_effects(&mut self) -> Vec<SessionEffect> {
        std::mem::take(&mut self.effects)
    }

    fn push_unlocks(&mut self, unlocked: Vec<AchievementId>) {
        self.effects
            .extend(unlocked.into_iter().map(SessionEffect::AchievementUnlocked));
    }

    fn finish(&mut self, outcome: Outcome) {
        self.timers.cancel_all();
        self.state.outcome = outcome;
        self.quiz = QuizStage::Idle;

        if let Some(summary) = self.tracker.session_ended(outcome, self.clock_ms) {
            self.push_unlocks(summary.unlocked);
            self.effects
                .push(SessionEffect::PerfectStreak(summary.perfect_level_streak));
        }

        match outcome {
            Outcome::Victory => {
                self.effects.push(SessionEffect::LevelCompleted { level: self.level });
                self.effects
                    .push(SessionEffect::AwardCoins(self.tuning.victory_reward));
                log::info!("Level {} complete, score {}", self.level, self.state.score);
            }
            Outcome::Defeat => {
                self.effects.push(SessionEffect::LevelFailed { level: self.level });
                log::info!("Level {} failed, score {}", self.level, self.state.score);
            }
            Outcome::None => {}
        }
        self.effects.push(SessionEffect::PauseScene);
    }
}

impl GameEventSink for GameSession {
    fn on_note_caught(&mut self, variant: NoteVariant) {
        if !self.accepts_events() {
            log::debug!("Late catch of {} discarded", variant.as_str());
            return;
        }
        let correct = variant == self.state.target_note;
        if correct {
            self.state.score += variant.point_value();
            self.effects.push(SessionEffect::NoteCollected);
        } else {
            self.state.lives = self.state.lives.saturating_sub(1);
        }
        let unlocked = self.tracker.note_caught(correct, self.clock_ms);
        self.push_unlocks(unlocked);
        log::debug!(
            "Caught {} ({}), score {} lives {}",
            variant.as_str(),
            if correct { "correct" } else { "wrong" },
            self.state.score,
            self.state.lives
        );

        if self.state.lives == 0 {
            self.finish(Outcome::Defeat);
        }
    }

    fn on_note_missed(&mut self, variant: NoteVariant) {
        if !self.accepts_events() {
            return;
        }
        // Only the target counts, and only towards achievements
        if variant == self.state.target_note {
            let unlocked = self.tracker.target_missed(variant, self.clock_ms);
            self.push_unlocks(unlocked);
            log::debug!("Missed target {}", variant.as_str());
        }
    }

    fn on_coin_caught(&mut self) {
        if !self.accepts_events() || self.quiz != QuizStage::Idle {
            return;
        }
        self.quiz = QuizStage::CoinCaught;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::notes::{FULL_CATALOG, NON_KEY_CATALOG};
    use proptest::prelude::*;

    fn session() -> GameSession {
        GameSession::new(&Tuning::default(), 1, AchievementProgress::default(), 42)
    }

    fn wrong_note(session: &GameSession) -> NoteVariant {
        let target = session.state().target_note;
        FULL_CATALOG
            .into_iter()
            .find(|v| *v != target)
            .unwrap()
    }

    #[test]
    fn test_starts_active() {
        let s = session();
        assert_eq!(s.phase(), Phase::Active { paused: false });
        assert_eq!(s.state().lives, 5);
        assert_eq!(s.state().time_remaining_ms, 60_000);
        assert!(!s.state().target_note.is_key());
    }

    #[test]
    fn test_correct_catch_scores() {
        let mut s = session();
        let target = s.state().target_note;
        s.on_note_caught(target);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().lives, 5);
        assert_eq!(s.drain_effects(), vec![SessionEffect::NoteCollected]);
    }

    #[test]
    fn test_five_wrong_catches_defeat() {
        let mut s = session();
        for _ in 0..5 {
            let wrong = wrong_note(&s);
            s.on_note_caught(wrong);
        }
        assert_eq!(s.phase(), Phase::Defeat);
        assert_eq!(s.state().lives, 0);
        let effects = s.drain_effects();
        assert!(effects.contains(&SessionEffect::LevelFailed { level: 1 }));
        assert_eq!(effects.last(), Some(&SessionEffect::PauseScene));

        // Terminal: nothing else is accepted
        let target = s.state().target_note;
        s.on_note_caught(target);
        s.advance(120_000);
        assert_eq!(s.state().score, 0);
        assert!(s.drain_effects().is_empty());
        assert_eq!(s.next_rotation_in(), None);
    }

    #[test]
    fn test_missed_target_has_no_penalty() {
        let mut s = session();
        let target = s.state().target_note;
        s.on_note_missed(target);
        s.on_note_missed(wrong_note(&s));
        assert_eq!(s.state().lives, 5);
        assert_eq!(s.state().score, 0);
        assert!(s.tracker().telemetry().missed_target_colors.contains(&target));
        assert_eq!(s.tracker().telemetry().missed_target_colors.len(), 1);
    }

    #[test]
    fn test_victory_after_sixty_seconds() {
        let mut s = session();
        s.advance(59_900);
        assert_eq!(s.phase(), Phase::Active { paused: false });
        assert_eq!(s.state().time_remaining_ms, 100);
        s.advance(100);
        assert_eq!(s.phase(), Phase::Victory);

        let effects = s.drain_effects();
        assert!(effects.contains(&SessionEffect::LevelCompleted { level: 1 }));
        assert!(effects.contains(&SessionEffect::AwardCoins(10)));
        assert!(effects.contains(&SessionEffect::AchievementUnlocked(
            AchievementId::ColourSymphony
        )));
        assert!(effects.contains(&SessionEffect::PerfectStreak(1)));
    }

    #[test]
    fn test_rotation_every_ten_seconds() {
        let mut s = session();
        let first = s.state().target_note;
        s.advance(9_990);
        assert_eq!(s.state().target_note, first);
        s.advance(10);
        assert_ne!(s.state().target_note, first);
    }

    #[test]
    fn test_pause_freezes_timers() {
        let mut s = session();
        s.advance(2_500);
        s.toggle_pause(true);
        s.toggle_pause(true);
        s.advance(30_000);
        assert_eq!(s.state().time_remaining_ms, 57_500);
        assert_eq!(s.drain_effects(), vec![SessionEffect::PauseScene]);

        // Events while paused are dropped
        let target = s.state().target_note;
        s.on_note_caught(target);
        assert_eq!(s.state().score, 0);

        s.toggle_pause(false);
        assert_eq!(s.next_rotation_in(), Some(7_500));
        assert_eq!(s.drain_effects(), vec![SessionEffect::ResumeScene]);
    }

    #[test]
    fn test_coin_opens_quiz_and_awards() {
        let mut s = session();
        s.on_coin_caught();
        assert!(s.is_quiz_pending());
        assert_eq!(s.phase(), Phase::Active { paused: false });
        assert!(s.drain_effects().is_empty());

        s.advance(10);
        assert_eq!(s.state().time_remaining_ms, 60_000);
        assert_eq!(
            s.drain_effects(),
            vec![SessionEffect::PauseScene, SessionEffect::StartQuiz]
        );

        // Player cannot unpause past the quiz
        s.toggle_pause(false);
        assert_eq!(s.phase(), Phase::Active { paused: true });

        s.quiz_completed(7);
        assert_eq!(s.phase(), Phase::Active { paused: false });
        assert_eq!(
            s.drain_effects(),
            vec![SessionEffect::ResumeScene, SessionEffect::AwardCoins(7)]
        );

        s.quiz_completed(7);
        assert!(s.drain_effects().is_empty());
    }

    #[test]
    fn test_catches_beside_a_coin_still_count() {
        let mut s = session();
        let target = s.state().target_note;
        let wrong = wrong_note(&s);
        s.on_coin_caught();
        s.on_coin_caught();
        s.on_note_caught(target);
        s.on_note_caught(wrong);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().lives, 4);

        s.advance(10);
        let starts = s
            .drain_effects()
            .into_iter()
            .filter(|e| *e == SessionEffect::StartQuiz)
            .count();
        assert_eq!(starts, 1);
        assert_eq!(s.phase(), Phase::Active { paused: true });
    }

    #[test]
    fn test_defeat_beside_a_coin_skips_quiz() {
        let tuning = Tuning {
            starting_lives: 1,
            ..Tuning::default()
        };
        let mut s = GameSession::new(&tuning, 1, AchievementProgress::default(), 5);
        let wrong = wrong_note(&s);
        s.on_coin_caught();
        s.on_note_caught(wrong);
        s.advance(10);
        assert_eq!(s.phase(), Phase::Defeat);
        assert!(!s.is_quiz_pending());
        assert!(!s.drain_effects().contains(&SessionEffect::StartQuiz));
        s.quiz_completed(5);
        assert!(s.drain_effects().is_empty());
    }

    #[test]
    fn test_manual_pause_before_quiz_opens() {
        let mut s = session();
        s.on_coin_caught();
        s.toggle_pause(true);
        s.quiz_completed(3);
        s.toggle_pause(false);
        assert_eq!(s.phase(), Phase::Active { paused: false });
        s.advance(10);
        assert_eq!(
            s.drain_effects(),
            vec![
                SessionEffect::PauseScene,
                SessionEffect::ResumeScene,
                SessionEffect::PauseScene,
                SessionEffect::StartQuiz
            ]
        );
        s.quiz_completed(3);
        assert_eq!(s.phase(), Phase::Active { paused: false });
    }

    #[test]
    fn test_pause_after_terminal_is_noop() {
        let mut s = session();
        s.advance(60_000);
        s.drain_effects();
        s.toggle_pause(true);
        assert!(s.drain_effects().is_empty());
        assert_eq!(s.phase(), Phase::Victory);
    }

    #[test]
    fn test_first_chord_after_ten_consecutive() {
        let mut s = session();
        let mut unlocked = Vec::new();
        for _ in 0..10 {
            let target = s.state().target_note;
            s.on_note_caught(target);
            s.advance(600);
            unlocked.extend(s.drain_effects());
        }
        assert!(unlocked.contains(&SessionEffect::AchievementUnlocked(AchievementId::FirstChord)));
        assert_eq!(s.tracker().telemetry().consecutive_correct, 10);
        assert!(s.tracker().progress().is_completed(AchievementId::FirstChord));
    }

    #[test]
    fn test_wrong_note_victory_resets_streak() {
        let progress = AchievementProgress {
            perfect_level_streak: 2,
            ..AchievementProgress::default()
        };
        let mut s = GameSession::new(&Tuning::default(), 3, progress, 7);
        let wrong = wrong_note(&s);
        s.on_note_caught(wrong);
        s.advance(60_000);
        let effects = s.drain_effects();
        assert!(effects.contains(&SessionEffect::PerfectStreak(0)));
        assert!(!effects.contains(&SessionEffect::AchievementUnlocked(
            AchievementId::PerfectMelody
        )));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let progress = AchievementProgress {
            perfect_level_streak: 1,
            levels_completed_total: 4,
            ..AchievementProgress::default()
        };
        let mut s = GameSession::new(&Tuning::default(), 2, progress.clone(), 11);
        let wrong = wrong_note(&s);
        s.on_note_caught(wrong);
        s.advance(4_321);
        s.on_coin_caught();
        s.reset();

        let state = s.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 5);
        assert_eq!(state.time_remaining(), 60.0);
        assert!(!state.is_paused);
        assert_eq!(state.outcome, Outcome::None);
        assert!(!s.is_quiz_pending());
        assert_eq!(s.tracker().telemetry().wrong_notes, 0);
        assert_eq!(s.tracker().progress(), &progress);
        assert_eq!(s.drain_effects().last(), Some(&SessionEffect::ResetScene));
    }

    #[derive(Debug, Clone)]
    enum Action {
        Catch(usize),
        Miss(usize),
        Coin,
        Quiz(u32),
        Pause(bool),
        Advance(u64),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0..FULL_CATALOG.len()).prop_map(Action::Catch),
            (0..FULL_CATALOG.len()).prop_map(Action::Miss),
            Just(Action::Coin),
            (0u32..20).prop_map(Action::Quiz),
            any::<bool>().prop_map(Action::Pause),
            (0u64..15_000).prop_map(Action::Advance),
        ]
    }

    fn apply(s: &mut GameSession, action: &Action) {
        match *action {
            Action::Catch(i) => s.on_note_caught(FULL_CATALOG[i]),
            Action::Miss(i) => s.on_note_missed(FULL_CATALOG[i]),
            Action::Coin => s.on_coin_caught(),
            Action::Quiz(earned) => s.quiz_completed(earned),
            Action::Pause(p) => s.toggle_pause(p),
            Action::Advance(ms) => s.advance(ms),
        }
    }

    proptest! {
        #[test]
        fn prop_session_invariants(
            seed in any::<u64>(),
            actions in proptest::collection::vec(action(), 1..200),
        ) {
            let mut s = GameSession::new(&Tuning::default(), 1, AchievementProgress::default(), seed);
            let mut terminal_effects = 0;
            let mut last_time = s.state().time_remaining_ms;
            let mut last_target = s.state().target_note;

            for action in &actions {
                let was_terminal = s.state().is_terminal();
                let score = s.state().score;
                apply(&mut s, action);

                let state = s.state();
                prop_assert!(state.lives <= 5);
                prop_assert!(state.time_remaining_ms <= last_time);
                prop_assert!(NON_KEY_CATALOG.contains(&state.target_note));
                if was_terminal {
                    prop_assert_eq!(state.score, score);
                }
                if state.target_note != last_target {
                    prop_assert!(matches!(action, Action::Advance(_)));
                }
                if state.lives == 0 {
                    prop_assert_eq!(state.outcome, Outcome::Defeat);
                }
                last_time = state.time_remaining_ms;
                last_target = state.target_note;

                terminal_effects += s
                    .drain_effects()
                    .iter()
                    .filter(|e| matches!(e, SessionEffect::LevelCompleted { .. } | SessionEffect::LevelFailed { .. }))
                    .count();
            }
            prop_assert!(terminal_effects <= 1);
            prop_assert_eq!(terminal_effects == 1, s.state().is_terminal());
        }

        #[test]
        fn prop_reset_round_trip(
            seed in any::<u64>(),
            actions in proptest::collection::vec(action(), 0..100),
        ) {
            let mut s = GameSession::new(&Tuning::default(), 1, AchievementProgress::default(), seed);
            for action in &actions {
                apply(&mut s, action);
            }
            let persisted = s.tracker().progress().clone();
            s.reset();

            let state = s.state();
            prop_assert_eq!(state.score, 0);
            prop_assert_eq!(state.lives, 5);
            prop_assert_eq!(state.time_remaining_ms, 60_000);
            prop_assert!(!state.is_paused);
            prop_assert_eq!(state.outcome, Outcome::None);
            prop_assert_eq!(s.tracker().telemetry().consecutive_correct, 0);
            prop_assert_eq!(s.tracker().telemetry().wrong_notes, 0);
            prop_assert!(s.tracker().telemetry().missed_target_colors.is_empty());
            prop_assert_eq!(s.tracker().progress(), &persisted);
        }
    }
}
