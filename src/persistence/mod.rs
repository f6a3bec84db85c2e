//! Profile persistence
//!
//! The whole profile is one JSON blob under a single key. Loading never
//! fails (missing or corrupt data means a fresh profile) and saving logs
//! failures instead of returning them.

mod store;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use store::{FileStore, MemoryStore, PersistError, ProgressStore};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;

use crate::achievements::{AchievementId, AchievementProgress};
use crate::consts::{DAILY_BONUS, MAX_LEVEL};
use crate::platform::Economy;

/// Everything saved for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedProgress {
    pub current_level: u32,
    pub max_completed_level: u32,
    pub coins: i64,
    pub notes_collected: u64,
    pub last_login_date: Option<NaiveDate>,
    pub achievements: AchievementProgress,
    /// Longest sequence reached in the recall minigame
    pub sequence_best_length: u32,
}

impl Default for PersistedProgress {
    fn default() -> Self {
        Self {
            current_level: 1,
            max_completed_level: 0,
            coins: 0,
            notes_collected: 0,
            last_login_date: None,
            achievements: AchievementProgress::default(),
            sequence_best_length: 0,
        }
    }
}

impl PersistedProgress {
    /// Highest level the player may start
    pub fn max_available_level(&self) -> u32 {
        (self.max_completed_level + 1).min(MAX_LEVEL)
    }

    /// Repair values a hand-edited or older blob could get wrong
    fn sanitize(&mut self) {
        self.max_completed_level = self.max_completed_level.min(MAX_LEVEL);
        self.current_level = self.current_level.clamp(1, self.max_available_level());
        let completed = &self.achievements.completed;
        self.achievements.claimed.retain(|id| completed.contains(id));
    }
}

/// Read the profile, falling back to defaults on missing or corrupt data
pub fn load<S: ProgressStore + ?Sized>(store: &S) -> PersistedProgress {
    let json = match store.read() {
        Ok(Some(json)) => json,
        Ok(None) => {
            log::info!("No saved progress, starting fresh");
            return PersistedProgress::default();
        }
        Err(e) => {
            log::warn!("Failed to read progress: {}", e);
            return PersistedProgress::default();
        }
    };

    match serde_json::from_str::<PersistedProgress>(&json) {
        Ok(mut progress) => {
            progress.sanitize();
            log::info!(
                "Loaded progress: level {}, {} coins",
                progress.current_level,
                progress.coins
            );
            progress
        }
        Err(e) => {
            log::warn!("Saved progress is corrupt ({}), starting fresh", e);
            PersistedProgress::default()
        }
    }
}

fn try_save<S: ProgressStore + ?Sized>(store: &mut S, progress: &PersistedProgress) -> Result<(), PersistError> {
    let json = serde_json::to_string(progress)?;
    store.write(&json)
}

/// Overwrite the stored profile. Failures are logged and swallowed.
pub fn save<S: ProgressStore + ?Sized>(store: &mut S, progress: &PersistedProgress) {
    if let Err(e) = try_save(store, progress) {
        log::error!("Failed to save progress: {}", e);
    }
}

/// Delete the stored profile
pub fn reset_progress<S: ProgressStore + ?Sized>(store: &mut S) {
    match store.remove() {
        Ok(()) => log::info!("Progress reset"),
        Err(e) => log::error!("Failed to reset progress: {}", e),
    }
}

/// A loaded profile bound to its store. Every mutation saves.
#[derive(Debug, Clone)]
pub struct Profile<S> {
    store: S,
    progress: PersistedProgress,
}

impl<S: ProgressStore> Profile<S> {
    pub fn load(store: S) -> Self {
        let progress = load(&store);
        Self { store, progress }
    }

    pub fn progress(&self) -> &PersistedProgress {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) {
        save(&mut self.store, &self.progress);
    }

    /// Spend coins if the balance covers it
    pub fn try_spend(&mut self, price: u32) -> bool {
        let price = price as i64;
        if self.progress.coins < price {
            log::debug!("Cannot spend {} of {} coins", price, self.progress.coins);
            return false;
        }
        self.add_coins(-price);
        true
    }

    pub fn record_note_collected(&mut self) {
        self.progress.notes_collected += 1;
        self.persist();
    }

    /// Mark `level` complete, unlocking the next one
    pub fn record_level_completed(&mut self, level: u32) {
        let progress = &mut self.progress;
        progress.max_completed_level = progress.max_completed_level.max(level.min(MAX_LEVEL));
        progress.achievements.levels_completed_total += 1;
        log::info!(
            "Level {} completed ({} total)",
            level,
            progress.achievements.levels_completed_total
        );
        self.persist();
    }

    pub fn record_level_failed(&mut self, level: u32) {
        log::info!("Level {} failed", level);
        self.persist();
    }

    /// Select the level to play, clamped to what is unlocked
    pub fn start_level(&mut self, level: u32) -> u32 {
        let level = level.clamp(1, self.progress.max_available_level());
        self.progress.current_level = level;
        self.persist();
        level
    }

    /// Move to the next unlocked level, if any
    pub fn advance_level(&mut self) -> u32 {
        let next = self.progress.current_level + 1;
        self.start_level(next)
    }

    pub fn unlock_achievement(&mut self, id: AchievementId) {
        if self.progress.achievements.unlock(id) {
            self.persist();
        }
    }

    pub fn set_perfect_streak(&mut self, streak: u32) {
        self.progress.achievements.perfect_level_streak = streak;
        self.persist();
    }

    /// Collect a completed achievement's reward
    pub fn claim_reward(&mut self, id: AchievementId) -> Option<u32> {
        let reward = self.progress.achievements.claim(id)?;
        log::info!("Claimed {} (+{} coins)", id.as_str(), reward);
        self.add_coins(reward as i64);
        Some(reward)
    }

    /// Raise the recall minigame's best length. Returns true on a new best.
    pub fn record_sequence_length(&mut self, length: u32) -> bool {
        if length <= self.progress.sequence_best_length {
            return false;
        }
        self.progress.sequence_best_length = length;
        self.persist();
        true
    }

    /// Grant the daily bonus on the first login of a new day.
    /// The very first login records the date without a bonus.
    pub fn check_daily_bonus(&mut self, today: NaiveDate) -> bool {
        let granted = matches!(self.progress.last_login_date, Some(last) if last != today);
        self.progress.last_login_date = Some(today);
        if granted {
            log::info!("Daily bonus: +{} coins", DAILY_BONUS);
            self.progress.coins += DAILY_BONUS;
        }
        self.persist();
        granted
    }

    /// Wipe the store and start over
    pub fn reset_all_progress(&mut self) {
        reset_progress(&mut self.store);
        self.progress = load(&self.store);
    }
}

impl<S: ProgressStore> Economy for Profile<S> {
    fn add_coins(&mut self, amount: i64) {
        self.progress.coins += amount;
        log::debug!("Coins {:+} -> {}", amount, self.progress.coins);
        self.persist();
    }

    fn coins(&self) -> i64 {
        self.progress.coins
    }
}
