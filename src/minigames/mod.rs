//! Side minigames
//!
//! Small self-contained state machines. Each is driven by explicit elapsed
//! time through the same scheduler the arcade uses, so pausing one freezes
//! its timers exactly.

pub mod guess_number;
pub mod memory_match;
pub mod sequence_recall;

pub use guess_number::{Feedback, GuessNumber, GuessState};
pub use memory_match::{Card, CardFace, CardImage, MemoryMatch, MemoryState, Position};
pub use sequence_recall::{RecallState, SequenceRecall, Symbol};
