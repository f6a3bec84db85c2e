//! Note variants and the random selection policy
//!
//! Two immutable catalogs: the full set (including the key) and the non-key
//! set used for colored notes and target rotation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A falling note variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteVariant {
    /// The special treble-clef note
    Key,
    Note1,
    Note2,
    Note3,
    Note4,
    Note5,
}

/// Display color of a note variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteColor {
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

/// Every variant, key included
pub const FULL_CATALOG: [NoteVariant; 6] = [
    NoteVariant::Key,
    NoteVariant::Note1,
    NoteVariant::Note2,
    NoteVariant::Note3,
    NoteVariant::Note4,
    NoteVariant::Note5,
];

/// Colored variants only (never the key)
pub const NON_KEY_CATALOG: [NoteVariant; 5] = [
    NoteVariant::Note1,
    NoteVariant::Note2,
    NoteVariant::Note3,
    NoteVariant::Note4,
    NoteVariant::Note5,
];

impl NoteVariant {
    pub fn color(&self) -> NoteColor {
        match self {
            NoteVariant::Key => NoteColor::White,
            NoteVariant::Note1 => NoteColor::Red,
            NoteVariant::Note2 => NoteColor::Green,
            NoteVariant::Note3 => NoteColor::Blue,
            NoteVariant::Note4 => NoteColor::Yellow,
            NoteVariant::Note5 => NoteColor::Purple,
        }
    }

    /// Points awarded for catching this variant as the target
    pub fn point_value(&self) -> u32 {
        1
    }

    pub fn is_key(&self) -> bool {
        *self == NoteVariant::Key
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteVariant::Key => "key",
            NoteVariant::Note1 => "note1",
            NoteVariant::Note2 => "note2",
            NoteVariant::Note3 => "note3",
            NoteVariant::Note4 => "note4",
            NoteVariant::Note5 => "note5",
        }
    }
}

/// Uniform draw from a statically non-empty catalog
pub fn pick<R: Rng + ?Sized>(catalog: &[NoteVariant], rng: &mut R) -> NoteVariant {
    debug_assert!(!catalog.is_empty(), "note catalog must not be empty");
    catalog[rng.random_range(0..catalog.len())]
}

/// Variant for a freshly spawned note: the key with probability
/// `1 / key_chance_denominator`, otherwise a uniform colored note
pub fn random_spawn_variant<R: Rng + ?Sized>(rng: &mut R, key_chance_denominator: u32) -> NoteVariant {
    let denominator = key_chance_denominator.max(1);
    if rng.random_range(0..denominator) == 0 {
        NoteVariant::Key
    } else {
        pick(&NON_KEY_CATALOG, rng)
    }
}

/// Uniform non-key target
pub fn random_target<R: Rng + ?Sized>(rng: &mut R) -> NoteVariant {
    pick(&NON_KEY_CATALOG, rng)
}

/// Uniform non-key target that differs from `current`
pub fn next_target<R: Rng + ?Sized>(rng: &mut R, current: NoteVariant) -> NoteVariant {
    let mut options = [NoteVariant::Note1; NON_KEY_CATALOG.len()];
    let mut len = 0;
    for variant in NON_KEY_CATALOG {
        if variant != current {
            options[len] = variant;
            len += 1;
        }
    }
    pick(&options[..len], rng)
}
