//! Fixed timestep simulation tick
//!
//! The single mutation path: player input, contacts and timer firings for one
//! step are applied in a fixed order, then the session's effects are handed
//! to the collaborators.

use super::collision::{CollisionRouter, EventQueue, GameEventSink};
use super::playfield::Playfield;
use super::session::{GameSession, SessionEffect};
use super::spawner::Spawner;
use super::state::ObjectKind;
use crate::achievements::AchievementProgress;
use crate::consts::*;
use crate::persistence::{Profile, ProgressStore};
use crate::platform::{Economy, QuizHost, Scene};
use crate::tuning::Tuning;

/// Keeps spawn and target draws on separate streams
const SPAWN_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Where the player is dragging the catcher
    pub catcher_x: Option<f32>,
    /// Pause (`true`) or resume (`false`)
    pub pause: Option<bool>,
    /// Restart the level
    pub reset: bool,
    /// The bonus quiz finished with this many coins
    pub quiz_earned: Option<u32>,
    /// Let the AI steer the catcher
    pub autopilot: bool,
}

/// A running level: the session plus its spawner, playfield and router
#[derive(Debug, Clone)]
pub struct Arcade {
    pub session: GameSession,
    pub spawner: Spawner,
    pub playfield: Playfield,
    router: CollisionRouter,
    events: EventQueue,
}

impl Arcade {
    /// `tuning` must pass [`Tuning::validate`]
    pub fn new(tuning: &Tuning, level: u32, progress: AchievementProgress, seed: u64) -> Self {
        debug_assert!(tuning.validate().is_ok(), "invalid tuning: {:?}", tuning.validate());
        let mut spawner = Spawner::new(tuning, seed ^ SPAWN_SEED_SALT);
        spawner.start();
        Self {
            session: GameSession::new(tuning, level, progress, seed),
            spawner,
            playfield: Playfield::new(tuning),
            router: CollisionRouter::new(),
            events: EventQueue::new(),
        }
    }

    /// Start the profile's current level
    pub fn for_profile<S: ProgressStore>(tuning: &Tuning, profile: &Profile<S>, seed: u64) -> Self {
        let progress = profile.progress();
        Self::new(
            tuning,
            progress.current_level,
            progress.achievements.clone(),
            seed,
        )
    }

    pub fn router(&self) -> &CollisionRouter {
        &self.router
    }

    fn apply_effects<S: ProgressStore>(&mut self, profile: &mut Profile<S>, quiz: &mut dyn QuizHost) {
        for effect in self.session.drain_effects() {
            match effect {
                SessionEffect::PauseScene => {
                    self.spawner.pause();
                    self.playfield.pause();
                }
                SessionEffect::ResumeScene => {
                    self.spawner.resume();
                    self.playfield.resume();
                }
                SessionEffect::ResetScene => {
                    self.spawner.reset();
                    self.playfield.reset_scene();
                    self.router.clear();
                    self.events.clear();
                }
                SessionEffect::StartQuiz => quiz.start_quiz(),
                SessionEffect::AwardCoins(amount) => profile.add_coins(amount as i64),
                SessionEffect::NoteCollected => profile.record_note_collected(),
                SessionEffect::AchievementUnlocked(id) => profile.unlock_achievement(id),
                SessionEffect::PerfectStreak(streak) => profile.set_perfect_streak(streak),
                SessionEffect::LevelCompleted { level } => {
                    self.spawner.stop();
                    profile.record_level_completed(level);
                }
                SessionEffect::LevelFailed { level } => {
                    self.spawner.stop();
                    profile.record_level_failed(level);
                }
            }
        }
    }
}

/// Advance the level by one fixed step of `SIM_STEP_MS`
pub fn tick<S: ProgressStore>(
    arcade: &mut Arcade,
    input: &TickInput,
    profile: &mut Profile<S>,
    quiz: &mut dyn QuizHost,
) {
    // Player input first
    if input.reset {
        arcade.session.reset();
    }
    if let Some(paused) = input.pause {
        arcade.session.toggle_pause(paused);
    }
    if let Some(earned) = input.quiz_earned {
        arcade.session.quiz_completed(earned);
    }
    arcade.apply_effects(profile, quiz);

    let steer = if input.autopilot {
        autopilot_x(
            &arcade.playfield,
            ObjectKind::Note(arcade.session.state().target_note),
        )
    } else {
        input.catcher_x
    };
    if let Some(x) = steer {
        arcade.playfield.move_catcher(x);
    }

    if arcade.session.state().is_terminal() {
        return;
    }

    for object in arcade.spawner.advance(SIM_STEP_MS) {
        arcade.router.register(&object);
        arcade.playfield.spawn(object);
    }

    let outcome = arcade.playfield.step(SIM_DT);
    for contact in outcome.contacts {
        if let Some(id) = arcade.router.route(contact, &mut arcade.events) {
            arcade.playfield.remove(id);
        }
    }
    for id in outcome.culled {
        arcade.router.forget(id);
    }

    // Telemetry lands before the timers that may end the session
    for event in arcade.events.drain() {
        arcade.session.deliver(event);
    }
    arcade.session.advance(SIM_STEP_MS);
    arcade.apply_effects(profile, quiz);
}

/// Steer toward the lowest object worth catching, or dodge the lowest
/// wrong note heading for the catcher
fn autopilot_x(field: &Playfield, target: ObjectKind) -> Option<f32> {
    let chase = field
        .objects()
        .iter()
        .filter(|o| o.kind == target || o.is_coin())
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
    if let Some(object) = chase {
        return Some(object.pos.x);
    }

    let catcher = &field.catcher;
    let reach = catcher.size.x;
    let danger = field
        .objects()
        .iter()
        .filter(|o| o.pos.y < catcher.pos.y + catcher.size.y * 2.0)
        .filter(|o| (o.pos.x - catcher.pos.x).abs() < reach)
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))?;

    let away = if danger.pos.x >= catcher.pos.x { -1.0 } else { 1.0 };
    Some(catcher.pos.x + away * reach * 2.0)
}

/// Converts variable frame time into whole simulation steps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `dt` seconds of wall time; returns how many ticks to run.
    /// Time beyond `MAX_SUBSTEPS` ticks is dropped to avoid a spiral.
    pub fn steps(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        steps
    }

    pub fn clear(&mut self) {
        self.accumulator = 0.0;
    }
}
