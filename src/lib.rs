pub mod board;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod timer;
pub mod tui;

pub use board::{Board, Cell};
pub use difficulty::{BoardConfig, Difficulty};
pub use engine::{CellView, GameEngine, GameStatus, GameSummary, RevealOutcome, Stats};
pub use error::{GameError, Result};
pub use timer::{GameTimer, TickHandle, Ticker, MAX_SECONDS};
