use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Terminal;

use crate::difficulty::Difficulty;
use crate::engine::{CellView, GameEngine, GameStatus, GameSummary};
use crate::timer::Ticker;

/// Pause between the end of a game and the summary popup.
const SUMMARY_DELAY: Duration = Duration::from_millis(800);

struct App {
    engine: GameEngine,
    ticker: Ticker,
    cursor: (usize, usize),
    ended_at: Option<Instant>,
    summary: Option<GameSummary>,
}

impl App {
    fn new(engine: GameEngine) -> Self {
        Self { engine, ticker: Ticker::default(), cursor: (0, 0), ended_at: None, summary: None }
    }

    fn new_game(&mut self, difficulty: Option<Difficulty>) {
        self.ticker.cancel();
        match difficulty {
            Some(d) => self.engine.set_difficulty(d),
            None => self.engine.start_new_game(),
        }
        self.cursor = (self.cursor.0.min(self.engine.rows() - 1), self.cursor.1.min(self.engine.cols() - 1));
        self.ended_at = None;
        self.summary = None;
    }

    fn reveal(&mut self, row: usize, col: usize) -> io::Result<()> {
        self.engine
            .reveal(row, col)
            .map(|_| ())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn chord(&mut self, row: usize, col: usize) {
        if !self.engine.chord_reveal(row, col).has_update() {
            log::trace!("chord at ({row}, {col}) changed nothing");
        }
    }

    /// Keeps the ticker in step with the engine and delivers due ticks.
    fn update(&mut self, now: Instant) {
        match self.engine.tick_handle() {
            Some(handle) => self.ticker.schedule(handle, now),
            None => self.ticker.cancel(),
        }
        for handle in self.ticker.poll(now) {
            self.engine.tick(handle);
        }
        if self.engine.is_game_over() {
            let ended = *self.ended_at.get_or_insert(now);
            if self.summary.is_none() && now.duration_since(ended) >= SUMMARY_DELAY {
                self.summary = self.engine.summary();
            }
        }
    }
}

pub fn run_tui(difficulty: Difficulty, seed: Option<u64>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let _guard = TermGuard;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let engine = match seed {
        Some(seed) => GameEngine::with_seed(difficulty, seed),
        None => GameEngine::new(difficulty),
    };
    let mut app = App::new(engine);
    let frame_rate = Duration::from_millis(250);
    let mut last_frame = Instant::now();
    let autodemo = std::env::var("MINEFIELD_TUI_AUTODEMO").ok().is_some();
    let mut demo_step = 0usize;

    let mut last_inner_board = Rect::default();
    let res = loop {
        app.update(Instant::now());
        terminal.draw(|f| { last_inner_board = ui(f, &app); })?;

        let timeout = frame_rate.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.summary.is_some() {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') => app.new_game(None),
                            _ => {}
                        }
                        continue;
                    }
                    let (row, col) = app.cursor;
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                        KeyCode::Char('h') | KeyCode::Left => {
                            if app.cursor.1 > 0 { app.cursor.1 -= 1; }
                        }
                        KeyCode::Char('l') | KeyCode::Right => {
                            if app.cursor.1 + 1 < app.engine.cols() { app.cursor.1 += 1; }
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            if app.cursor.0 > 0 { app.cursor.0 -= 1; }
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            if app.cursor.0 + 1 < app.engine.rows() { app.cursor.0 += 1; }
                        }
                        KeyCode::Char('f') => { app.engine.toggle_flag(row, col); }
                        KeyCode::Char('c') => app.chord(row, col),
                        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => app.reveal(row, col)?,
                        KeyCode::Char('n') => app.new_game(None),
                        KeyCode::Char('1') => app.new_game(Some(Difficulty::Beginner)),
                        KeyCode::Char('2') => app.new_game(Some(Difficulty::Intermediate)),
                        KeyCode::Char('3') => app.new_game(Some(Difficulty::Expert)),
                        _ => {}
                    }
                }
                Event::Mouse(m) if app.summary.is_none() => {
                    if let MouseEventKind::Down(btn) = m.kind {
                        if let Some((row, col)) = pos_to_cell(m.column, m.row, last_inner_board, app.engine.rows() as u16, app.engine.cols() as u16) {
                            let (row, col) = (row as usize, col as usize);
                            app.cursor = (row, col);
                            match btn {
                                MouseButton::Left => app.reveal(row, col)?,
                                MouseButton::Right => { app.engine.toggle_flag(row, col); }
                                MouseButton::Middle => app.chord(row, col),
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        if last_frame.elapsed() >= frame_rate {
            last_frame = Instant::now();
            if autodemo {
                let (rows, cols) = (app.engine.rows(), app.engine.cols());
                match demo_step {
                    0 => { app.reveal(rows / 2, cols / 2)?; app.cursor = (rows / 2, cols / 2); }
                    1 => { app.engine.toggle_flag(0, 0); }
                    2 => app.chord(rows / 2, cols / 2),
                    3..=6 => { /* let the timer run */ }
                    _ => break Ok(()),
                }
                demo_step += 1;
            }
        }
    };

    terminal.show_cursor()?;
    res
}

fn ui(f: &mut ratatui::Frame, app: &App) -> Rect {
    let engine = &app.engine;
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.size());

    let stats = engine.stats();
    let face = match engine.status() {
        GameStatus::Won => "8)",
        GameStatus::Lost => "X(",
        GameStatus::Ready | GameStatus::Playing => ":)",
    };
    let header = Paragraph::new(format!(
        "Mines {:03}   [{}]   Time {:03}   Clicks {}   Flags {}   Progress {}%",
        stats.mines_remaining, face, stats.elapsed_seconds, stats.clicks, stats.flags_used, stats.progress_percent
    ))
    .style(Style::default().fg(Color::Cyan))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(format!("Minefield - {}", engine.difficulty_label())));
    f.render_widget(header, root[0]);

    let area = centered_grid_area(root[1], engine.cols() as u16 + 1, engine.rows() as u16 + 2);
    let inner = inner_area(area);
    draw_board(f, engine, area, app.cursor);

    let footer = Paragraph::new("Mouse: left=reveal right=flag middle=chord • Arrows/HJKL move • Enter reveal • f flag • c chord • n new • 1/2/3 difficulty • q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, root[2]);

    if let Some(summary) = &app.summary {
        draw_summary(f, summary);
    }
    inner
}

fn centered_grid_area(parent: Rect, cols: u16, rows: u16) -> Rect {
    let cell_w = 2;
    let grid_w = cols * cell_w;
    let grid_h = rows;
    let x = parent.x.saturating_add((parent.width.saturating_sub(grid_w)) / 2);
    let y = parent.y.saturating_add((parent.height.saturating_sub(grid_h)) / 2);
    Rect { x, y, width: grid_w.min(parent.width), height: grid_h.min(parent.height) }
}

fn draw_board(f: &mut ratatui::Frame, engine: &GameEngine, area: Rect, cursor: (usize, usize)) {
    let mut lines: Vec<Line> = Vec::with_capacity(engine.rows());
    for row in 0..engine.rows() {
        let mut spans: Vec<Span> = Vec::with_capacity(engine.cols());
        for col in 0..engine.cols() {
            let view = engine.cell_view(row, col).unwrap_or(CellView::Hidden);
            let (mut ch, mut style) = match view {
                CellView::Hidden => ('·', Style::default().fg(Color::DarkGray)),
                CellView::Flagged => ('F', Style::default().fg(Color::Yellow)),
                CellView::Revealed(0) => (' ', number_style(0)),
                CellView::Revealed(n) => (char::from_digit(n as u32, 10).unwrap_or('?'), number_style(n)),
                CellView::Mine => ('*', Style::default().fg(Color::Red)),
                CellView::Detonated => ('*', Style::default().fg(Color::White).bg(Color::Red)),
            };

            if cursor == (row, col) {
                style = style.add_modifier(Modifier::REVERSED);
                if ch == ' ' { ch = '·'; }
            }

            spans.push(Span::styled(format!("{} ", ch), style));
        }
        lines.push(Line::from(spans));
    }

    let board_block = Block::default().borders(Borders::ALL).title("Board");
    let para = Paragraph::new(lines).block(board_block);
    f.render_widget(para, area);
}

fn draw_summary(f: &mut ratatui::Frame, summary: &GameSummary) {
    let area = centered_grid_area(f.size(), 26, 6);
    let (title, message, color) = if summary.won {
        ("You won!", "Every mine cleared.", Color::Green)
    } else {
        ("Game over", "You stepped on a mine.", Color::Red)
    };
    let text = vec![
        Line::from(Span::styled(message, Style::default().fg(color))),
        Line::from(format!(
            "Time: {}s | Clicks: {} | {}",
            summary.elapsed_seconds, summary.clicks, summary.difficulty
        )),
        Line::from(""),
        Line::from(Span::styled("Enter: play again • q: quit", Style::default().fg(Color::DarkGray))),
    ];
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn number_style(n: u8) -> Style {
    match n {
        0 => Style::default().fg(Color::Gray),
        1 => Style::default().fg(Color::Blue),
        2 => Style::default().fg(Color::Green),
        3 => Style::default().fg(Color::Red),
        4 => Style::default().fg(Color::Magenta),
        5 => Style::default().fg(Color::Yellow),
        6 => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

fn inner_area(area: Rect) -> Rect {
    // Same shrink as Block::inner() with Borders::ALL
    Rect { x: area.x.saturating_add(1), y: area.y.saturating_add(1), width: area.width.saturating_sub(2), height: area.height.saturating_sub(2) }
}

fn pos_to_cell(mx: u16, my: u16, inner: Rect, rows: u16, cols: u16) -> Option<(u16, u16)> {
    if mx < inner.x || my < inner.y { return None; }
    let cell_w = 2u16; // must match draw_board span width
    let col = (mx - inner.x) / cell_w;
    let row = my - inner.y;
    if row < rows && col < cols { Some((row, col)) } else { None }
}

struct TermGuard;
impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = stdout.execute(DisableMouseCapture);
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn reveal_failure_surfaces_as_io_error() {
        let mut engine = GameEngine::from_board(Board::from_mines(3, 3, &[(0, 0)]).unwrap(), 0);
        engine.start_new_game();
        let mut app = App::new(engine);

        let err = app.reveal(1, 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(err.to_string().contains("Too many mines"));
        assert!(app.engine.is_first_click());
    }
}
