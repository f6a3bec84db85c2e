//! Note Catcher entry point
//!
//! Native: plays one level headlessly with the autopilot and reports the
//! result. Usage: `note-catcher [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;

    use note_catcher::consts::PROFILE_KEY;
    use note_catcher::minigames::{Feedback, GuessNumber};
    use note_catcher::persistence::{FileStore, Profile};
    use note_catcher::platform::{Economy, QuizHost};
    use note_catcher::sim::{Arcade, FrameClock, Outcome, TickInput, tick};
    use note_catcher::{AchievementId, Tuning};

    /// 60 fps display frames
    const FRAME_DT: f32 = 1.0 / 60.0;

    /// Stands in for the player during a bonus quiz: plays a round of
    /// number guessing by bisection and pays out for fewer attempts
    struct ScriptedQuiz {
        seed: u64,
        pending: bool,
    }

    impl ScriptedQuiz {
        fn new(seed: u64) -> Self {
            Self {
                seed,
                pending: false,
            }
        }

        /// Coins earned by the quiz opened last tick, if any
        fn take_result(&mut self) -> Option<u32> {
            if !std::mem::take(&mut self.pending) {
                return None;
            }
            self.seed = self.seed.wrapping_add(1);
            let mut game = GuessNumber::new(self.seed);
            let (mut lo, mut hi) = (0u32, 999u32);
            while let Some(feedback) = game.guess((lo + hi) / 2) {
                let mid = (lo + hi) / 2;
                match feedback {
                    Feedback::Correct => break,
                    Feedback::Higher => lo = mid + 1,
                    Feedback::Lower => hi = mid.saturating_sub(1),
                }
            }
            let earned = 11u32.saturating_sub(game.attempts());
            log::info!("{} -> {} coins", game.message(), earned);
            Some(earned)
        }
    }

    impl QuizHost for ScriptedQuiz {
        fn start_quiz(&mut self) {
            log::info!("Bonus quiz started");
            self.pending = true;
        }
    }

    pub fn run() {
        note_catcher::init_logging();

        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        let tuning = args
            .next()
            .map(|path| Tuning::load_or_default(Path::new(&path)))
            .unwrap_or_default();

        let store = FileStore::new(std::env::temp_dir().join("note-catcher"), PROFILE_KEY);
        log::info!("Profile at {}", store.path().display());
        let mut profile = Profile::load(store);
        profile.check_daily_bonus(chrono::Local::now().date_naive());
        let level = profile.start_level(profile.progress().current_level);

        log::info!("Note Catcher (native) starting level {} with seed {}", level, seed);
        let mut arcade = Arcade::for_profile(&tuning, &profile, seed);
        let mut quiz = ScriptedQuiz::new(seed);
        let mut clock = FrameClock::new();

        // Generous bound in case tuning makes the level endless
        let max_frames = (tuning.session_ms as f32 / 1000.0 / FRAME_DT) as u64 * 4;
        let mut frames = 0;
        while !arcade.session.state().is_terminal() && frames < max_frames {
            for _ in 0..clock.steps(FRAME_DT) {
                let input = TickInput {
                    autopilot: true,
                    quiz_earned: quiz.take_result(),
                    ..Default::default()
                };
                tick(&mut arcade, &input, &mut profile, &mut quiz);
            }
            frames += 1;
        }

        let state = arcade.session.state();
        let result = match state.outcome {
            Outcome::Victory => "VICTORY",
            Outcome::Defeat => "DEFEAT",
            Outcome::None => "UNFINISHED",
        };

        if state.outcome == Outcome::Victory {
            profile.advance_level();
        }
        for id in AchievementId::ALL {
            if let Some(reward) = profile.claim_reward(id) {
                println!("Achievement claimed: {} (+{})", id.info().title, reward);
            }
        }

        let progress = profile.progress();
        println!("Level {}: {}", level, result);
        println!("  score {}  lives {}", state.score, state.lives);
        println!(
            "  coins {}  notes collected {}  next level {}",
            profile.coins(),
            progress.notes_collected,
            progress.current_level
        );
        println!(
            "  achievements {}/{}",
            progress.achievements.completed.len(),
            AchievementId::ALL.len()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host drives the library directly
    note_catcher::init_logging();
}
