//! Number guessing

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub const MIN_NUMBER: u32 = 0;
pub const MAX_NUMBER: u32 = 999;

const PROMPT: &str = "Use the slider to guess the number";

/// Answer to a single guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    /// The target is greater than the guess
    Higher,
    /// The target is less than the guess
    Lower,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessState {
    Playing,
    Guessed { correct: bool, message: String },
}

#[derive(Debug, Clone)]
pub struct GuessNumber {
    rng: Pcg32,
    target: u32,
    attempts: u32,
    state: GuessState,
}

impl GuessNumber {
    pub fn new(seed: u64) -> Self {
        let mut game = Self {
            rng: Pcg32::seed_from_u64(seed),
            target: 0,
            attempts: 0,
            state: GuessState::Playing,
        };
        game.start_new_game();
        game
    }

    /// Game with a known target
    pub fn with_target(target: u32) -> Self {
        let mut game = Self::new(0);
        game.target = target.min(MAX_NUMBER);
        game
    }

    pub fn start_new_game(&mut self) {
        self.target = self.rng.random_range(MIN_NUMBER..=MAX_NUMBER);
        self.attempts = 0;
        self.state = GuessState::Playing;
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> &GuessState {
        &self.state
    }

    pub fn is_won(&self) -> bool {
        matches!(self.state, GuessState::Guessed { correct: true, .. })
    }

    /// Text shown under the slider
    pub fn message(&self) -> &str {
        match &self.state {
            GuessState::Playing => PROMPT,
            GuessState::Guessed { message, .. } => message,
        }
    }

    /// Submit a guess. Returns `None` once the number has been found.
    pub fn guess(&mut self, guess: u32) -> Option<Feedback> {
        if self.is_won() {
            return None;
        }
        self.attempts += 1;

        let (feedback, message) = if guess == self.target {
            (
                Feedback::Correct,
                format!("Correct! You guessed it in {} attempts.", self.attempts),
            )
        } else if guess < self.target {
            (
                Feedback::Higher,
                format!("Higher! The number is greater than {guess}."),
            )
        } else {
            (
                Feedback::Lower,
                format!("Lower! The number is less than {guess}."),
            )
        };

        self.state = GuessState::Guessed {
            correct: feedback == Feedback::Correct,
            message,
        };
        Some(feedback)
    }

    /// Dismiss a wrong-guess hint and keep playing
    pub fn continue_game(&mut self) {
        if !self.is_won() {
            self.state = GuessState::Playing;
        }
    }
}
