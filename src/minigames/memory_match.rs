//! Memory match: find six pairs on a 3x4 board before time runs out

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use crate::sim::Scheduler;

pub const ROWS: usize = 3;
pub const COLUMNS: usize = 4;
pub const CARD_COUNT: usize = ROWS * COLUMNS;
pub const PAIRS: usize = CARD_COUNT / 2;
pub const GAME_MS: u32 = 45_000;
pub const COUNTDOWN_STEP_MS: u32 = 100;
/// Delay before a matching pair is marked
pub const MATCH_DELAY_MS: u64 = 300;
/// Delay before a mismatched pair flips back
pub const MISMATCH_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardImage {
    Guitar,
    Piano,
    Drums,
    Saxophone,
    Trumpet,
    Violin,
}

impl CardImage {
    pub const ALL: [CardImage; PAIRS] = [
        CardImage::Guitar,
        CardImage::Piano,
        CardImage::Drums,
        CardImage::Saxophone,
        CardImage::Trumpet,
        CardImage::Violin,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    FaceDown,
    FaceUp,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    fn index(&self) -> Option<usize> {
        (self.row < ROWS && self.column < COLUMNS).then_some(self.row * COLUMNS + self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub image: CardImage,
    pub face: CardFace,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryState {
    Initial,
    Playing,
    Paused,
    Finished { success: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryTimer {
    Countdown,
    /// Settle the two face-up cards
    Resolve,
}

#[derive(Debug, Clone)]
pub struct MemoryMatch {
    rng: Pcg32,
    /// Row-major
    cards: Vec<Card>,
    state: MemoryState,
    time_remaining_ms: u32,
    first: Option<usize>,
    second: Option<usize>,
    timers: Scheduler<MemoryTimer>,
}

impl MemoryMatch {
    /// Deal a shuffled board; call [`MemoryMatch::start`] to begin
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = shuffled_layout(&mut rng);
        Self::build(rng, layout)
    }

    /// Deal a known board (row-major)
    pub fn with_layout(layout: [CardImage; CARD_COUNT]) -> Self {
        Self::build(Pcg32::seed_from_u64(0), layout)
    }

    fn build(rng: Pcg32, layout: [CardImage; CARD_COUNT]) -> Self {
        Self {
            rng,
            cards: deal(layout),
            state: MemoryState::Initial,
            time_remaining_ms: GAME_MS,
            first: None,
            second: None,
            timers: Scheduler::new(),
        }
    }

    pub fn start(&mut self) {
        if self.state != MemoryState::Initial {
            return;
        }
        self.state = MemoryState::Playing;
        self.timers
            .every(MemoryTimer::Countdown, COUNTDOWN_STEP_MS as u64);
    }

    /// Deal a fresh board and start playing
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        let layout = shuffled_layout(&mut self.rng);
        self.cards = deal(layout);
        self.time_remaining_ms = GAME_MS;
        self.first = None;
        self.second = None;
        self.state = MemoryState::Initial;
        self.start();
    }

    pub fn state(&self) -> MemoryState {
        self.state
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_at(&self, position: Position) -> Option<&Card> {
        position.index().map(|i| &self.cards[i])
    }

    pub fn time_remaining_ms(&self) -> u32 {
        self.time_remaining_ms
    }

    pub fn pairs_matched(&self) -> usize {
        self.cards.iter().filter(|c| c.face == CardFace::Matched).count() / 2
    }

    /// Taps are ignored while a pair is being resolved or outside play
    pub fn is_input_locked(&self) -> bool {
        self.state != MemoryState::Playing || self.second.is_some()
    }

    /// Turn a face-down card. Returns false if the tap was ignored.
    pub fn flip(&mut self, position: Position) -> bool {
        if self.is_input_locked() {
            return false;
        }
        let Some(index) = position.index() else {
            return false;
        };
        if self.cards[index].face != CardFace::FaceDown {
            return false;
        }
        self.cards[index].face = CardFace::FaceUp;

        match self.first {
            None => self.first = Some(index),
            Some(first) => {
                self.second = Some(index);
                let delay = if self.cards[first].image == self.cards[index].image {
                    MATCH_DELAY_MS
                } else {
                    MISMATCH_DELAY_MS
                };
                self.timers.after(MemoryTimer::Resolve, delay);
            }
        }
        true
    }

    pub fn pause(&mut self) {
        if self.state == MemoryState::Playing {
            self.state = MemoryState::Paused;
            self.timers.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state == MemoryState::Paused {
            self.state = MemoryState::Playing;
            self.timers.resume();
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            MemoryState::Playing => self.pause(),
            MemoryState::Paused => self.resume(),
            _ => {}
        }
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        if self.state != MemoryState::Playing {
            return;
        }
        for timer in self.timers.advance(elapsed_ms) {
            if self.state != MemoryState::Playing {
                break;
            }
            match timer {
                MemoryTimer::Countdown => {
                    if self.time_remaining_ms <= COUNTDOWN_STEP_MS {
                        self.time_remaining_ms = 0;
                        self.finish(false);
                    } else {
                        self.time_remaining_ms -= COUNTDOWN_STEP_MS;
                    }
                }
                MemoryTimer::Resolve => self.resolve_pair(),
            }
        }
    }

    fn resolve_pair(&mut self) {
        let (Some(first), Some(second)) = (self.first.take(), self.second.take()) else {
            return;
        };
        let face = if self.cards[first].image == self.cards[second].image {
            CardFace::Matched
        } else {
            CardFace::FaceDown
        };
        self.cards[first].face = face;
        self.cards[second].face = face;

        if self.cards.iter().all(|c| c.face == CardFace::Matched) {
            self.finish(true);
        }
    }

    fn finish(&mut self, success: bool) {
        self.timers.cancel_all();
        self.state = MemoryState::Finished { success };
        log::info!(
            "Memory match finished ({}), {} pairs",
            if success { "success" } else { "out of time" },
            self.pairs_matched()
        );
    }
}

fn shuffled_layout(rng: &mut Pcg32) -> [CardImage; CARD_COUNT] {
    let mut layout = [CardImage::Guitar; CARD_COUNT];
    for (i, slot) in layout.iter_mut().enumerate() {
        *slot = CardImage::ALL[i / 2];
    }
    layout.shuffle(rng);
    layout
}

fn deal(layout: [CardImage; CARD_COUNT]) -> Vec<Card> {
    layout
        .into_iter()
        .enumerate()
        .map(|(i, image)| Card {
            image,
            face: CardFace::FaceDown,
            position: Position::new(i / COLUMNS, i % COLUMNS),
        })
        .collect()
}
