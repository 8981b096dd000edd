use std::str::FromStr;

use clap::ValueEnum;

use crate::error::Error;

/// Timing parameters for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    /// Cadence at which a new mole is placed.
    pub spawn_interval_ms: u64,
    /// How long an unhit mole stays up before retracting.
    pub mole_visible_ms: u64,
    /// Countdown length of a session.
    pub duration_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, strum_macros::Display)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Stable lowercase identifier used in storage keys.
    pub fn key(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        resolve(*self)
    }
}

/// Look up the timing profile for a difficulty.
///
/// These numbers define the feel of the game and must not drift.
pub fn resolve(difficulty: Difficulty) -> DifficultyProfile {
    match difficulty {
        Difficulty::Easy => DifficultyProfile {
            spawn_interval_ms: 1200,
            mole_visible_ms: 2000,
            duration_secs: 45,
        },
        Difficulty::Medium => DifficultyProfile {
            spawn_interval_ms: 800,
            mole_visible_ms: 1500,
            duration_secs: 35,
        },
        Difficulty::Hard => DifficultyProfile {
            spawn_interval_ms: 500,
            mole_visible_ms: 1000,
            duration_secs: 25,
        },
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(Error::UnknownDifficulty(s.to_string())),
        }
    }
}
