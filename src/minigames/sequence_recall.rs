//! Sequence recall: watch a run of symbols, then tap them back in order

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use crate::sim::Scheduler;

pub const INITIAL_LENGTH: usize = 2;
/// How long each symbol stays on screen
pub const SHOW_MS: u64 = 1_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Drum,
    Bell,
    Flute,
    Harp,
    Horn,
    Lute,
    Lyre,
    Rattle,
}

impl Symbol {
    pub const ALL: [Symbol; 8] = [
        Symbol::Drum,
        Symbol::Bell,
        Symbol::Flute,
        Symbol::Harp,
        Symbol::Horn,
        Symbol::Lute,
        Symbol::Lyre,
        Symbol::Rattle,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallState {
    /// Symbols are being shown one at a time
    Showing,
    /// Waiting for the player's taps
    Playing,
    Success,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecallTimer {
    NextSymbol,
}

#[derive(Debug, Clone)]
pub struct SequenceRecall {
    rng: Pcg32,
    sequence: Vec<Symbol>,
    /// Index of the symbol on screen while showing
    shown: usize,
    input: Vec<Symbol>,
    state: RecallState,
    length: usize,
    best_length: usize,
    timers: Scheduler<RecallTimer>,
}

impl SequenceRecall {
    /// Start at the saved best length (never below the initial length)
    pub fn new(best_length: u32, seed: u64) -> Self {
        let length = (best_length as usize).max(INITIAL_LENGTH);
        let mut game = Self {
            rng: Pcg32::seed_from_u64(seed),
            sequence: Vec::new(),
            shown: 0,
            input: Vec::new(),
            state: RecallState::Showing,
            length,
            best_length: length,
            timers: Scheduler::new(),
        };
        game.start_round();
        game
    }

    /// Play a known sequence
    pub fn with_sequence(sequence: Vec<Symbol>) -> Self {
        let mut game = Self::new(0, 0);
        game.length = sequence.len().max(1);
        game.show(sequence);
        game
    }

    pub fn state(&self) -> RecallState {
        self.state
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn best_length(&self) -> usize {
        self.best_length
    }

    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    pub fn input(&self) -> &[Symbol] {
        &self.input
    }

    /// Symbol currently on screen
    pub fn showing(&self) -> Option<Symbol> {
        match self.state {
            RecallState::Showing => self.sequence.get(self.shown).copied(),
            _ => None,
        }
    }

    fn start_round(&mut self) {
        let sequence: Vec<Symbol> = (0..self.length)
            .filter_map(|_| Symbol::ALL.choose(&mut self.rng).copied())
            .collect();
        self.show(sequence);
    }

    fn show(&mut self, sequence: Vec<Symbol>) {
        self.timers.cancel_all();
        self.sequence = sequence;
        self.input.clear();
        self.shown = 0;
        self.state = RecallState::Showing;
        self.timers.every(RecallTimer::NextSymbol, SHOW_MS);
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        for timer in self.timers.advance(elapsed_ms) {
            match timer {
                RecallTimer::NextSymbol => {
                    self.shown += 1;
                    if self.shown >= self.sequence.len() {
                        self.timers.cancel_all();
                        self.state = RecallState::Playing;
                        break;
                    }
                }
            }
        }
    }

    /// Tap a symbol. Any mismatch ends the round at once.
    pub fn select(&mut self, symbol: Symbol) -> RecallState {
        if self.state != RecallState::Playing {
            return self.state;
        }
        let index = self.input.len();
        self.input.push(symbol);

        if self.sequence.get(index) != Some(&symbol) {
            self.state = RecallState::GameOver;
            log::debug!("Sequence broken at position {}", index);
        } else if self.input.len() == self.sequence.len() {
            self.state = RecallState::Success;
        }
        self.state
    }

    /// After a success: one symbol longer. Returns the new best length when
    /// this round sets one.
    pub fn next_round(&mut self) -> Option<u32> {
        if self.state != RecallState::Success {
            return None;
        }
        self.length += 1;
        let record = self.length > self.best_length;
        if record {
            self.best_length = self.length;
            log::info!("New sequence best: {}", self.best_length);
        }
        self.start_round();
        record.then_some(self.best_length as u32)
    }

    /// After a game over: one symbol shorter, not below the initial length
    pub fn restart_after_game_over(&mut self) {
        if self.state != RecallState::GameOver {
            return;
        }
        self.length = self.length.saturating_sub(1).max(INITIAL_LENGTH);
        self.start_round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::*;

    fn ready(sequence: Vec<Symbol>) -> SequenceRecall {
        let mut game = SequenceRecall::with_sequence(sequence);
        let len = game.sequence().len() as u64;
        game.advance(SHOW_MS * len);
        game
    }

    #[test]
    fn test_shows_one_symbol_at_a_time() {
        let mut game = SequenceRecall::with_sequence(vec![Drum, Harp, Bell]);
        assert_eq!(game.showing(), Some(Drum));
        assert_eq!(game.select(Drum), RecallState::Showing);
        game.advance(1_499);
        assert_eq!(game.showing(), Some(Drum));
        game.advance(1);
        assert_eq!(game.showing(), Some(Harp));
        game.advance(3_000);
        assert_eq!(game.state(), RecallState::Playing);
        assert_eq!(game.showing(), None);
    }

    #[test]
    fn test_mismatch_is_game_over() {
        let mut game = ready(vec![Drum, Bell]);
        assert_eq!(game.select(Drum), RecallState::Playing);
        assert_eq!(game.select(Flute), RecallState::GameOver);
        assert_eq!(game.select(Bell), RecallState::GameOver);
        assert_eq!(game.input(), &[Drum, Flute]);
    }

    #[test]
    fn test_success_grows_and_sets_best() {
        let mut game = SequenceRecall::new(0, 3);
        assert_eq!(game.length(), INITIAL_LENGTH);
        game.advance(SHOW_MS * INITIAL_LENGTH as u64);
        for symbol in game.sequence().to_vec() {
            game.select(symbol);
        }
        assert_eq!(game.state(), RecallState::Success);
        assert_eq!(game.next_round(), Some(3));
        assert_eq!(game.length(), 3);
        assert_eq!(game.sequence().len(), 3);
        assert_eq!(game.state(), RecallState::Showing);
    }

    #[test]
    fn test_game_over_shrinks_to_floor() {
        let mut game = SequenceRecall::new(3, 8);
        assert_eq!(game.length(), 3);
        for expected in [2, 2] {
            game.advance(SHOW_MS * game.length() as u64);
            let wrong = Symbol::ALL
                .into_iter()
                .find(|s| Some(s) != game.sequence().first())
                .unwrap();
            game.select(wrong);
            game.restart_after_game_over();
            assert_eq!(game.length(), expected);
        }
        assert_eq!(game.best_length(), 3);
    }

    #[test]
    fn test_next_round_below_best_is_not_a_record() {
        let mut game = SequenceRecall::new(5, 1);
        game.advance(SHOW_MS * 5);
        let wrong = Symbol::ALL
            .into_iter()
            .find(|s| Some(s) != game.sequence().first())
            .unwrap();
        game.select(wrong);
        game.restart_after_game_over();
        assert_eq!(game.length(), 4);
        game.advance(SHOW_MS * 4);
        for symbol in game.sequence().to_vec() {
            game.select(symbol);
        }
        assert_eq!(game.next_round(), None);
        assert_eq!(game.length(), 5);
    }
}
