use std::fmt::{self, Write as _};
use std::ops::BitOr;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::difficulty::{BoardConfig, Difficulty};
use crate::error::Result;
use crate::timer::{GameTimer, TickHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoOp,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub fn has_update(self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (HitMine, _) | (_, HitMine) => HitMine,
            (Won, _) | (_, Won) => Won,
            (Revealed, _) | (_, Revealed) => Revealed,
            (NoOp, NoOp) => NoOp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    /// No reveal accepted yet; mines may not be placed.
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// What a front end should draw for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    /// Mine shown because the game is over.
    Mine,
    /// The mine whose reveal lost the game.
    Detonated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub mines_remaining: usize,
    pub flags_used: usize,
    pub revealed: usize,
    pub clicks: usize,
    pub progress_percent: u8,
    pub elapsed_seconds: u16,
}

/// End-of-game report handed to the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub won: bool,
    pub elapsed_seconds: u16,
    pub clicks: usize,
    pub difficulty: &'static str,
}

pub struct GameEngine {
    difficulty: Option<Difficulty>,
    config: BoardConfig,
    board: Board,
    status: GameStatus,
    first_click: bool,
    flags_used: usize,
    revealed_count: usize,
    click_count: usize,
    detonated: Option<(usize, usize)>,
    timer: GameTimer,
    session: u64,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::build(difficulty, StdRng::from_os_rng())
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self::build(difficulty, StdRng::seed_from_u64(seed))
    }

    /// Engine on a non-preset board. Mines are still placed on the first reveal.
    pub fn custom(config: BoardConfig, seed: u64) -> Result<Self> {
        let board = Board::new(config)?;
        Ok(Self::from_parts(None, board, StdRng::seed_from_u64(seed)))
    }

    /// Engine on a board whose mines are already laid out; the first reveal
    /// only starts the timer. Later sessions fall back to random placement.
    pub fn from_board(board: Board, seed: u64) -> Self {
        Self::from_parts(None, board, StdRng::seed_from_u64(seed))
    }

    fn build(difficulty: Difficulty, rng: StdRng) -> Self {
        Self::from_parts(Some(difficulty), Board::blank(difficulty.config()), rng)
    }

    fn from_parts(difficulty: Option<Difficulty>, board: Board, rng: StdRng) -> Self {
        let config = BoardConfig { rows: board.rows(), cols: board.cols(), mines: board.mines() };
        log::debug!("new session: {}x{} with {} mines", config.rows, config.cols, config.mines);
        Self {
            difficulty,
            config,
            board,
            status: GameStatus::Ready,
            first_click: true,
            flags_used: 0,
            revealed_count: 0,
            click_count: 0,
            detonated: None,
            timer: GameTimer::default(),
            session: 0,
            rng,
        }
    }

    /// Switches preset and starts over.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = Some(difficulty);
        self.config = difficulty.config();
        self.start_new_game();
    }

    /// Discards the current session and starts a fresh one on the same
    /// settings. Any outstanding [`TickHandle`] becomes stale.
    pub fn start_new_game(&mut self) {
        self.timer = GameTimer::default();
        self.session += 1;
        self.board = Board::blank(self.config);
        self.status = GameStatus::Ready;
        self.first_click = true;
        self.flags_used = 0;
        self.revealed_count = 0;
        self.click_count = 0;
        self.detonated = None;
        log::debug!(
            "session {}: {}x{} with {} mines",
            self.session, self.config.rows, self.config.cols, self.config.mines
        );
    }

    /// Reveals a cell as a player action. The first accepted reveal of a
    /// session places the mines around it and starts the timer.
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<RevealOutcome> {
        if self.status.is_over() { return Ok(RevealOutcome::NoOp); }
        let Some(cell) = self.board.cell(row, col) else { return Ok(RevealOutcome::NoOp) };
        if cell.revealed() || cell.flagged() { return Ok(RevealOutcome::NoOp); }

        if self.first_click {
            self.board.place_mines(row, col, &mut self.rng)?;
            self.first_click = false;
            self.status = GameStatus::Playing;
            self.timer.start();
        }

        self.click_count += 1;
        Ok(self.flood_reveal(row, col))
    }

    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        if self.status.is_over() { return false; }
        if !self.board.contains(row, col) { return false; }
        let cell = self.board.cell_mut(row, col);
        if cell.revealed { return false; }
        cell.flagged = !cell.flagged;
        if cell.flagged {
            self.flags_used += 1;
        } else {
            self.flags_used -= 1;
        }
        true
    }

    /// Reveals every unflagged hidden neighbor of a revealed number once
    /// exactly that many neighbors are flagged.
    pub fn chord_reveal(&mut self, row: usize, col: usize) -> RevealOutcome {
        if self.status.is_over() { return RevealOutcome::NoOp; }
        let Some(cell) = self.board.cell(row, col) else { return RevealOutcome::NoOp };
        if !cell.revealed() || cell.neighbor_mines() == 0 { return RevealOutcome::NoOp; }

        let wanted = cell.neighbor_mines() as usize;
        let flags = self.board.neighbors(row, col).filter(|&(r, c)| self.is_flagged(r, c)).count();
        if flags != wanted { return RevealOutcome::NoOp; }

        let targets: Vec<_> = self
            .board
            .neighbors(row, col)
            .filter(|&(r, c)| self.board.cell(r, c).is_some_and(|n| !n.revealed() && !n.flagged()))
            .collect();
        let mut outcome = RevealOutcome::NoOp;
        for (r, c) in targets {
            // a detonation ends the chord; later targets stay hidden
            if self.status.is_over() { break; }
            outcome = outcome | self.flood_reveal(r, c);
        }
        outcome
    }

    /// Worklist flood fill from `(row, col)`. Blank cells push their hidden,
    /// unflagged neighbors; numbered cells and flags stop the spread.
    fn flood_reveal(&mut self, row: usize, col: usize) -> RevealOutcome {
        let mut stack = vec![(row, col)];
        let mut any = false;
        while let Some((r, c)) = stack.pop() {
            let cell = self.board.cell_mut(r, c);
            if cell.revealed || cell.flagged { continue; }
            cell.revealed = true;
            let (is_mine, n) = (cell.is_mine, cell.neighbor_mines);
            self.revealed_count += 1;
            any = true;

            if is_mine {
                self.detonated = Some((r, c));
                self.finish(false);
                return RevealOutcome::HitMine;
            }
            if n == 0 {
                let board = &self.board;
                stack.extend(
                    board.neighbors(r, c).filter(|&(nr, nc)| board.cell(nr, nc).is_some_and(|x| !x.revealed() && !x.flagged())),
                );
            }
        }

        if !any { return RevealOutcome::NoOp; }
        if self.revealed_count == self.config.safe_cells() && !self.status.is_over() {
            self.finish(true);
            return RevealOutcome::Won;
        }
        RevealOutcome::Revealed
    }

    fn finish(&mut self, won: bool) {
        if self.status.is_over() { return; }
        self.status = if won { GameStatus::Won } else { GameStatus::Lost };
        self.timer.stop();
        log::info!(
            "game {} after {}s and {} clicks ({})",
            if won { "won" } else { "lost" },
            self.timer.elapsed(), self.click_count, self.difficulty_label()
        );
    }

    /// Handle for the next timer tick of this session, while the timer runs.
    pub fn tick_handle(&self) -> Option<TickHandle> {
        self.timer.is_running().then_some(TickHandle { session: self.session })
    }

    /// Advances the timer by one second. Handles from a discarded session
    /// and ticks after the timer stopped are ignored.
    pub fn tick(&mut self, handle: TickHandle) -> bool {
        if handle.session != self.session {
            log::trace!("ignoring tick from session {} (current {})", handle.session, self.session);
            return false;
        }
        self.timer.tick()
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    pub fn cell_view(&self, row: usize, col: usize) -> Option<CellView> {
        let cell = self.board.cell(row, col)?;
        Some(if cell.revealed() {
            if cell.is_mine() { CellView::Detonated } else { CellView::Revealed(cell.neighbor_mines()) }
        } else if self.status.is_over() && cell.is_mine() {
            CellView::Mine
        } else if cell.flagged() {
            CellView::Flagged
        } else {
            CellView::Hidden
        })
    }

    pub fn stats(&self) -> Stats {
        Stats {
            mines_remaining: self.config.mines.saturating_sub(self.flags_used),
            flags_used: self.flags_used,
            revealed: self.revealed_count,
            clicks: self.click_count,
            progress_percent: self.progress_percent(),
            elapsed_seconds: self.timer.elapsed(),
        }
    }

    fn progress_percent(&self) -> u8 {
        let safe = self.config.safe_cells();
        if safe == 0 { return 100; }
        (100 * self.revealed_count / safe).min(100) as u8
    }

    pub fn summary(&self) -> Option<GameSummary> {
        if !self.status.is_over() { return None; }
        Some(GameSummary {
            won: self.status == GameStatus::Won,
            elapsed_seconds: self.timer.elapsed(),
            clicks: self.click_count,
            difficulty: self.difficulty_label(),
        })
    }

    pub fn render(&self, one_based: bool) -> String {
        let mut s = String::new();
        s.push_str("    ");
        for c in 0..self.config.cols {
            let label = if one_based { c + 1 } else { c };
            let _ = write!(s, "{:>2} ", label);
        }
        s.push('\n');
        s.push_str("   ");
        s.push_str(&"-".repeat(self.config.cols * 3 + 1));
        s.push('\n');

        for r in 0..self.config.rows {
            let row_label = if one_based { r + 1 } else { r };
            let _ = write!(s, "{:>2} | ", row_label);
            for c in 0..self.config.cols {
                let ch = match self.cell_view(r, c).unwrap_or(CellView::Hidden) {
                    CellView::Hidden => '.',
                    CellView::Flagged => 'F',
                    CellView::Revealed(0) => ' ',
                    CellView::Revealed(n) => char::from_digit(n as u32, 10).unwrap_or('?'),
                    CellView::Mine => '*',
                    CellView::Detonated => 'X',
                };
                let _ = write!(s, "{}  ", ch);
            }
            s.push('\n');
        }
        s
    }

    fn is_flagged(&self, row: usize, col: usize) -> bool {
        self.board.cell(row, col).is_some_and(|c| c.flagged())
    }
}

impl fmt::Display for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

// Public getters
impl GameEngine {
    pub fn rows(&self) -> usize { self.config.rows }
    pub fn cols(&self) -> usize { self.config.cols }
    pub fn mines(&self) -> usize { self.config.mines }
    pub fn board(&self) -> &Board { &self.board }
    pub fn status(&self) -> GameStatus { self.status }
    pub fn is_game_over(&self) -> bool { self.status.is_over() }
    pub fn is_win(&self) -> bool { self.status == GameStatus::Won }
    pub fn is_first_click(&self) -> bool { self.first_click }
    pub fn flags_used(&self) -> usize { self.flags_used }
    pub fn revealed_count(&self) -> usize { self.revealed_count }
    pub fn click_count(&self) -> usize { self.click_count }
    pub fn elapsed_seconds(&self) -> u16 { self.timer.elapsed() }
    pub fn detonated(&self) -> Option<(usize, usize)> { self.detonated }
    pub fn difficulty(&self) -> Option<Difficulty> { self.difficulty }
    pub fn difficulty_label(&self) -> &'static str {
        self.difficulty.map_or("Custom", Difficulty::label)
    }
}
