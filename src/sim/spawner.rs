//! Falling object spawner
//!
//! Two independent schedules: a note every `note_spawn_ms`, and a bonus coin
//! after a random delay that re-arms after each coin.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::notes::random_spawn_variant;
use super::scheduler::Scheduler;
use super::state::{FallingObject, ObjectKind};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnTimer {
    Note,
    Coin,
}

/// Periodic generator of falling objects
#[derive(Debug, Clone)]
pub struct Spawner {
    tuning: Tuning,
    timers: Scheduler<SpawnTimer>,
    rng: Pcg32,
    next_id: u32,
    /// Time spent active (not paused)
    clock_ms: u64,
}

impl Spawner {
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            tuning: tuning.clone(),
            timers: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            clock_ms: 0,
        }
    }

    /// Arm both schedules from time zero
    pub fn start(&mut self) {
        self.timers.cancel_all();
        self.timers.every(SpawnTimer::Note, self.tuning.note_spawn_ms);
        self.schedule_coin();
    }

    /// Freeze both schedules; remaining times are kept
    pub fn pause(&mut self) {
        self.timers.pause();
    }

    pub fn resume(&mut self) {
        self.timers.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.timers.is_paused()
    }

    /// Drop pending spawns and restart both schedules
    pub fn reset(&mut self) {
        self.clock_ms = 0;
        self.start();
    }

    /// Cancel both schedules
    pub fn stop(&mut self) {
        self.timers.cancel_all();
    }

    /// Time until the next note spawn
    pub fn next_note_in(&self) -> Option<u64> {
        self.timers.remaining(SpawnTimer::Note)
    }

    /// Time until the pending coin spawn
    pub fn next_coin_in(&self) -> Option<u64> {
        self.timers.remaining(SpawnTimer::Coin)
    }

    /// Advance the schedules and return what spawned
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<FallingObject> {
        if self.timers.is_paused() {
            return Vec::new();
        }
        let start = self.clock_ms;
        let mut spawned = Vec::new();
        // Step through firings so each spawn is stamped with its own time
        let mut done = 0;
        while done < elapsed_ms {
            let step = self
                .timers
                .next_due()
                .map(|due| due.clamp(1, elapsed_ms - done))
                .unwrap_or(elapsed_ms - done);
            done += step;
            self.clock_ms = start + done;
            for timer in self.timers.advance(step) {
                match timer {
                    SpawnTimer::Note => spawned.push(self.spawn_note()),
                    SpawnTimer::Coin => {
                        spawned.push(self.spawn_coin());
                        self.schedule_coin();
                    }
                }
            }
        }
        spawned
    }

    /// Spawn exactly one note-type object
    pub fn spawn_note(&mut self) -> FallingObject {
        let variant = random_spawn_variant(&mut self.rng, self.tuning.key_chance_denominator);
        let size = self.tuning.note_size;
        let margin = self.tuning.note_margin;
        self.make(ObjectKind::Note(variant), size, margin)
    }

    /// Spawn exactly one bonus coin
    pub fn spawn_coin(&mut self) -> FallingObject {
        let size = self.tuning.coin_size;
        let margin = self.tuning.coin_margin;
        self.make(ObjectKind::BonusCoin, size, margin)
    }

    fn schedule_coin(&mut self) {
        let delay = self
            .rng
            .random_range(self.tuning.coin_delay_min_ms..=self.tuning.coin_delay_max_ms);
        log::debug!("Bonus coin scheduled in {} ms", delay);
        self.timers.after(SpawnTimer::Coin, delay);
    }

    fn make(&mut self, kind: ObjectKind, size: f32, margin: f32) -> FallingObject {
        let x = spawn_x(&mut self.rng, self.tuning.play_width, size, margin);
        let id = self.next_id;
        self.next_id += 1;
        FallingObject {
            id,
            kind,
            pos: Vec2::new(x, self.tuning.play_height + size),
            vel: Vec2::ZERO,
            size,
            spawn_time_ms: self.clock_ms,
        }
    }
}

/// Horizontal center keeping the whole sprite (plus margin) on screen
pub fn spawn_x<R: Rng + ?Sized>(rng: &mut R, play_width: f32, size: f32, margin: f32) -> f32 {
    let min = margin + size / 2.0;
    let max = play_width - margin - size / 2.0;
    debug_assert!(min <= max, "play width {play_width} too narrow for size {size}");
    if min > max {
        return play_width / 2.0;
    }
    rng.random_range(min..=max)
}
