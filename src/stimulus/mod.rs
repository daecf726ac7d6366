pub mod calendar;
pub mod cards;
pub mod digits;
pub mod letter_pairs;

use serde::{Deserialize, Serialize};

// Re-export the main types for convenience
pub use calendar::{DateRange, MathQuestion};
pub use cards::{Card, Rank, Suit};
pub use letter_pairs::{LetterPairMaster, PairQuestion};

/// The four trainers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Calendar,
    Digits,
    Cards,
    Letters,
}

/// Conversion is the endless no-scoring drill loop; memory is the full
/// countdown → presentation → recall → scored lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    Conversion,
    #[default]
    Memory,
}
