#![no_std]

extern crate alloc;

use core::ops::{BitOr, BitOrAssign};
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use animation::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use save::*;
pub use sector::*;
pub use session::*;
pub use tile::*;
pub use types::*;

mod animation;
mod engine;
mod error;
mod generator;
mod save;
mod sector;
mod session;
mod tile;
mod types;

/// Mine percentage used when nothing else is asked for.
pub const DEFAULT_DIFFICULTY: f64 = 19.0;

/// Density multiplier for the 3x3 block of sectors around the origin.
pub const CENTRAL_AREA_DIFFICULTY_MODIFIER: f64 = 0.8;

/// Attempts at finding a seed whose opening cascades before settling for any opening.
pub const MAX_TRIES: u32 = 50;

/// Base unit of every animation duration.
pub const ANIMATION_SPEED_BASE: Duration = Duration::from_millis(150);

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    difficulty: f64,
}

impl FieldConfig {
    pub const fn new_unchecked(difficulty: f64) -> Self {
        Self { difficulty }
    }

    /// Clamps the difficulty into `[0, 100]`, falling back to the default for NaN.
    pub fn new(difficulty: f64) -> Self {
        if difficulty.is_nan() {
            return Self::default();
        }
        Self::new_unchecked(difficulty.clamp(0.0, 100.0))
    }

    /// Strict constructor for values read back from saves.
    pub fn validated(difficulty: f64) -> Result<Self> {
        if (0.0..=100.0).contains(&difficulty) {
            Ok(Self::new_unchecked(difficulty))
        } else {
            Err(GameError::InvalidDifficulty)
        }
    }

    pub const fn difficulty(&self) -> f64 {
        self.difficulty
    }

    /// Hash values below this threshold are mines in `sector`.
    pub fn threshold(&self, sector: SectorCoord) -> f64 {
        if sector.is_central() {
            self.difficulty * CENTRAL_AREA_DIFFICULTY_MODIFIER
        } else {
            self.difficulty
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_DIFFICULTY)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    /// A blank tile was opened and the reveal spread to its neighbors.
    Cascade,
    HitMine,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            Cascade => true,
            HitMine => true,
        }
    }

    /// Whether the reveal recursed into neighbors, which makes for a good opening.
    pub const fn recursed(self) -> bool {
        matches!(self, Self::Cascade)
    }
}

impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (HitMine, _) => HitMine,
            (_, HitMine) => HitMine,
            (Cascade, _) => Cascade,
            (_, Cascade) => Cascade,
            (Revealed, _) => Revealed,
            (_, Revealed) => Revealed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

impl BitOrAssign for RevealOutcome {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BuyOutcome {
    NoChange,
    Bought { price: Goldmines },
}

impl BuyOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Bought { .. })
    }
}
