use rand::Rng;

use crate::difficulty::BoardConfig;
use crate::error::{GameError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub(crate) is_mine: bool,
    pub(crate) neighbor_mines: u8,
    pub(crate) revealed: bool,
    pub(crate) flagged: bool,
}

impl Cell {
    pub fn is_mine(&self) -> bool { self.is_mine }
    pub fn neighbor_mines(&self) -> u8 { self.neighbor_mines }
    pub fn revealed(&self) -> bool { self.revealed }
    pub fn flagged(&self) -> bool { self.flagged }
}

/// Row-major grid of cells. Shape is fixed for the board's lifetime and
/// mines are placed at most once.
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    cells: Vec<Cell>,
    placed: bool,
}

impl Board {
    /// Empty grid with no mines placed yet.
    pub fn new(config: BoardConfig) -> Result<Self> {
        let config = BoardConfig::new(config.rows, config.cols, config.mines)?;
        Ok(Self::blank(config))
    }

    pub(crate) fn blank(config: BoardConfig) -> Self {
        Self {
            rows: config.rows,
            cols: config.cols,
            mines: config.mines,
            cells: vec![Cell::default(); config.total_cells()],
            placed: false,
        }
    }

    /// Grid with mines at fixed `(row, col)` positions, already counted.
    /// Positions outside the grid are ignored; duplicates collapse.
    pub fn from_mines(rows: usize, cols: usize, mines: &[(usize, usize)]) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        let mut cells = vec![Cell::default(); rows * cols];
        for &(r, c) in mines {
            if r < rows && c < cols {
                cells[idx(cols, r, c)].is_mine = true;
            }
        }
        let mines = cells.iter().filter(|c| c.is_mine).count();
        let mut board = Self { rows, cols, mines, cells, placed: true };
        board.count_neighbor_mines();
        Ok(board)
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    pub fn mines(&self) -> usize { self.mines }
    pub fn is_placed(&self) -> bool { self.placed }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if self.contains(row, col) { Some(&self.cells[idx(self.cols, row, col)]) } else { None }
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        &mut self.cells[idx(self.cols, row, col)]
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, c)| ((i / cols, i % cols), c))
    }

    /// In-bounds 8-neighborhood of `(row, col)`, excluding the cell itself.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        neighbors(self.rows, self.cols, row, col)
    }

    /// Places exactly `mines` mines by rejection sampling, never within
    /// Chebyshev distance 1 of `(safe_row, safe_col)`, then fills in the
    /// neighbor counts. Does nothing if mines are already placed.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, safe_row: usize, safe_col: usize, rng: &mut R) -> Result<()> {
        if self.placed { return Ok(()); }
        let safe_zone = 1 + self.neighbors(safe_row, safe_col).count();
        let capacity = self.cells.len().saturating_sub(safe_zone);
        if self.mines > capacity {
            return Err(GameError::TooManyMines { mines: self.mines, capacity });
        }

        let mut placed = 0;
        while placed < self.mines {
            let r = rng.random_range(0..self.rows);
            let c = rng.random_range(0..self.cols);
            let in_safe_zone = r.abs_diff(safe_row) <= 1 && c.abs_diff(safe_col) <= 1;
            let cell = self.cell_mut(r, c);
            if !cell.is_mine && !in_safe_zone {
                cell.is_mine = true;
                placed += 1;
            }
        }
        self.count_neighbor_mines();
        self.placed = true;
        log::debug!(
            "placed {} mines on {}x{} board, safe zone around ({safe_row}, {safe_col})",
            self.mines, self.rows, self.cols
        );
        Ok(())
    }

    fn count_neighbor_mines(&mut self) {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let i = idx(self.cols, r, c);
                if self.cells[i].is_mine { continue; }
                let n = self.neighbors(r, c).filter(|&(nr, nc)| self.cells[idx(self.cols, nr, nc)].is_mine).count();
                self.cells[i].neighbor_mines = n as u8;
            }
        }
    }
}

fn idx(cols: usize, row: usize, col: usize) -> usize { row * cols + col }

fn neighbors(rows: usize, cols: usize, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    let r0 = row.saturating_sub(1);
    let c0 = col.saturating_sub(1);
    let r1 = (row + 1).min(rows.saturating_sub(1));
    let c1 = (col + 1).min(cols.saturating_sub(1));
    (r0..=r1)
        .flat_map(move |r| (c0..=c1).map(move |c| (r, c)))
        .filter(move |&(r, c)| (r, c) != (row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn neighbors_are_clipped_at_corners_and_edges() {
        let b = Board::from_mines(3, 4, &[]).unwrap();
        assert_eq!(b.neighbors(0, 0).count(), 3);
        assert_eq!(b.neighbors(0, 1).count(), 5);
        assert_eq!(b.neighbors(1, 1).count(), 8);
        assert_eq!(b.neighbors(2, 3).count(), 3);
        assert!(b.neighbors(1, 1).all(|(r, c)| (r, c) != (1, 1)));
    }

    #[test]
    fn from_mines_counts_neighbors() {
        let b = Board::from_mines(3, 3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(b.mines(), 2);
        assert_eq!(b.cell(1, 1).unwrap().neighbor_mines(), 2);
        assert_eq!(b.cell(0, 1).unwrap().neighbor_mines(), 1);
        assert_eq!(b.cell(0, 2).unwrap().neighbor_mines(), 0);
    }

    #[test]
    fn placement_fails_fast_when_safe_zone_leaves_no_room() {
        // Fits a corner click (4-cell safe zone) but not a centre click (9 cells).
        let mut b = Board::from_mines(4, 4, &[]).unwrap();
        b.mines = 10;
        b.placed = false;
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(b.place_mines(1, 1, &mut rng), Err(GameError::TooManyMines { mines: 10, capacity: 7 }));
        assert!(!b.is_placed());
        assert_eq!(b.place_mines(0, 0, &mut rng), Ok(()));
        assert_eq!(b.cells().filter(|(_, c)| c.is_mine()).count(), 10);
    }

    #[test]
    fn placement_happens_once() {
        let mut b = Board::new(crate::Difficulty::Beginner.config()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        b.place_mines(4, 4, &mut rng).unwrap();
        let first: Vec<bool> = b.cells().map(|(_, c)| c.is_mine()).collect();
        b.place_mines(0, 0, &mut rng).unwrap();
        let second: Vec<bool> = b.cells().map(|(_, c)| c.is_mine()).collect();
        assert_eq!(first, second);
    }
}
