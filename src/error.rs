use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("Board dimensions must be positive (got {rows}x{cols})")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("Too many mines: {mines} requested but only {capacity} cells lie outside the safe zone")]
    TooManyMines { mines: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, GameError>;
