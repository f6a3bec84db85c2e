//! Fixed-tick timer scheduler
//!
//! One scheduler per owner replaces a separate repeating timer per concern.
//! Timers are named by a small `Copy` key, advanced with integer milliseconds
//! and fire in chronological order. Pausing freezes every timer verbatim.

/// A single armed timer
#[derive(Debug, Clone)]
struct Timer<K> {
    kind: K,
    remaining_ms: u64,
    /// `Some` for repeating timers
    period_ms: Option<u64>,
}

/// Named timers advanced by explicit elapsed time
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    /// Kept in arm order; ties fire in this order
    timers: Vec<Timer<K>>,
    paused: bool,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            paused: false,
        }
    }
}

impl<K: Copy + PartialEq> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a repeating timer, replacing any timer of the same kind
    pub fn every(&mut self, kind: K, period_ms: u64) {
        debug_assert!(period_ms > 0, "repeating timer needs a non-zero period");
        let period_ms = period_ms.max(1);
        self.cancel(kind);
        self.timers.push(Timer {
            kind,
            remaining_ms: period_ms,
            period_ms: Some(period_ms),
        });
    }

    /// Arm a one-shot timer, replacing any timer of the same kind
    pub fn after(&mut self, kind: K, delay_ms: u64) {
        self.cancel(kind);
        self.timers.push(Timer {
            kind,
            remaining_ms: delay_ms,
            period_ms: None,
        });
    }

    /// Cancel a timer. Returns false if it was not armed (no-op).
    pub fn cancel(&mut self, kind: K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.kind != kind);
        self.timers.len() != before
    }

    /// Cancel every timer and clear the paused flag
    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_armed(&self, kind: K) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    /// Time until the timer next fires
    pub fn remaining(&self, kind: K) -> Option<u64> {
        self.timers
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.remaining_ms)
    }

    /// Soonest remaining time across armed timers
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.remaining_ms).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance time and return every timer that fired, in firing order.
    /// A repeating timer fires once per elapsed period.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<K> {
        let mut fired = Vec::new();
        if self.paused {
            return fired;
        }

        let mut budget = elapsed_ms;
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.remaining_ms <= budget)
                .min_by_key(|(i, t)| (t.remaining_ms, *i))
                .map(|(i, t)| (i, t.remaining_ms));

            let Some((index, due)) = next else {
                break;
            };

            // Every armed timer has at least `due` left
            for timer in &mut self.timers {
                timer.remaining_ms -= due;
            }
            budget -= due;

            let timer = &mut self.timers[index];
            fired.push(timer.kind);
            match timer.period_ms {
                Some(period) => timer.remaining_ms = period,
                None => {
                    self.timers.remove(index);
                }
            }
        }

        for timer in &mut self.timers {
            timer.remaining_ms -= budget;
        }

        fired
    }
}
