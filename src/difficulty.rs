use std::fmt;

use clap::ValueEnum;

use crate::error::{GameError, Result};

/// The three fixed board presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Expert];

    pub fn config(self) -> BoardConfig {
        match self {
            Self::Beginner => BoardConfig { rows: 9, cols: 9, mines: 10 },
            Self::Intermediate => BoardConfig { rows: 16, cols: 16, mines: 40 },
            Self::Expert => BoardConfig { rows: 16, cols: 30, mines: 99 },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Board shape and mine count.
///
/// The presets are always valid. Hand-built configurations go through
/// [`BoardConfig::new`], which rejects anything that could not be filled
/// after the largest possible safe zone is carved out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl BoardConfig {
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        let config = Self { rows, cols, mines };
        let capacity = config.total_cells() - config.max_safe_zone();
        if mines > capacity {
            log::warn!("rejecting {rows}x{cols} board with {mines} mines (capacity {capacity})");
            return Err(GameError::TooManyMines { mines, capacity });
        }
        Ok(config)
    }

    pub fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }

    /// Size of the safe zone around a first click away from every edge.
    fn max_safe_zone(&self) -> usize {
        self.rows.min(3) * self.cols.min(3)
    }
}
