use std::io::{self, Write};
use std::time::Instant;

use clap::Parser;
use minefield::difficulty::Difficulty;
use minefield::engine::GameEngine;
use minefield::timer::Ticker;
use minefield::tui;

#[derive(Parser, Debug)]
#[command(name = "minefield", about = "Terminal Minesweeper", version)]
struct Args {
    /// Launch TUI mode
    #[arg(long)]
    tui: bool,
    /// Board preset
    #[arg(long, value_enum, default_value_t = Difficulty::Beginner)]
    difficulty: Difficulty,
    /// Seed for mine placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn print_help() {
    println!("Commands:");
    println!("  r row col  - reveal cell (1-based)");
    println!("  f row col  - toggle flag");
    println!("  c row col  - chord: reveal neighbors of a number once its flags are placed");
    println!("  n          - new game");
    println!("  d level    - switch to beginner, intermediate or expert");
    println!("  s          - show stats");
    println!("  q          - quit");
    println!("  h/help     - show this help");
}

fn print_stats(engine: &GameEngine) {
    let s = engine.stats();
    println!(
        "Mines left: {:03}  Time: {:03}  Clicks: {}  Flags: {}  Progress: {}%",
        s.mines_remaining, s.elapsed_seconds, s.clicks, s.flags_used, s.progress_percent
    );
}

fn parse_coords(parts: &[&str]) -> Option<(usize, usize)> {
    if parts.len() < 3 { println!("Usage: {} row col", parts[0]); return None; }
    let row = match parts[1].parse::<usize>() { Ok(v) => v, Err(_) => { println!("Invalid row"); return None; } };
    let col = match parts[2].parse::<usize>() { Ok(v) => v, Err(_) => { println!("Invalid col"); return None; } };
    if row == 0 || col == 0 { println!("Use 1-based coordinates"); return None; }
    Some((row - 1, col - 1))
}

/// Delivers every timer tick that came due while waiting for input.
fn catch_up(engine: &mut GameEngine, ticker: &mut Ticker) {
    let now = Instant::now();
    for handle in ticker.poll(now) {
        engine.tick(handle);
    }
    match engine.tick_handle() {
        Some(handle) => ticker.schedule(handle, now),
        None => ticker.cancel(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = Args::parse();
    if args.tui {
        if let Err(e) = tui::run_tui(args.difficulty, args.seed) {
            eprintln!("TUI error: {}", e);
        }
        return;
    }

    let mut engine = match args.seed {
        Some(seed) => GameEngine::with_seed(args.difficulty, seed),
        None => GameEngine::new(args.difficulty),
    };
    let mut ticker = Ticker::default();

    println!(
        "Minesweeper {} ({}x{}, {} mines){}",
        engine.difficulty_label(), engine.rows(), engine.cols(), engine.mines(),
        args.seed.map(|s| format!(" (seed {})", s)).unwrap_or_default()
    );
    println!("Coordinates are 1-based, row first. Type 'h' for help.");
    print_help();

    let mut input = String::new();
    let mut announced = false;
    loop {
        catch_up(&mut engine, &mut ticker);
        println!("\n{}", engine);
        if let Some(summary) = engine.summary().filter(|_| !announced) {
            announced = true;
            if summary.won {
                println!("Congratulations! You cleared the board!");
            } else {
                println!("Boom! You hit a mine. Game over.");
            }
            println!("Time: {}s | Clicks: {} | Difficulty: {}", summary.elapsed_seconds, summary.clicks, summary.difficulty);
            println!("Type 'n' for a new game or 'q' to quit.");
        }

        print!("> ");
        let _ = io::stdout().flush();
        input.clear();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        catch_up(&mut engine, &mut ticker);
        let line = input.trim();
        if line.is_empty() { continue; }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0].to_lowercase().as_str() {
            "q" | "quit" | "exit" => break,
            "h" | "help" => { print_help(); continue; },
            "s" | "stats" => { print_stats(&engine); continue; },
            "n" | "new" => {
                ticker.cancel();
                engine.start_new_game();
                announced = false;
            }
            "d" | "difficulty" => {
                let Some(name) = parts.get(1) else { println!("Usage: d beginner|intermediate|expert"); continue; };
                match <Difficulty as clap::ValueEnum>::from_str(name, true) {
                    Ok(d) => {
                        ticker.cancel();
                        engine.set_difficulty(d);
                        announced = false;
                        println!("{} ({}x{}, {} mines)", d, engine.rows(), engine.cols(), engine.mines());
                    }
                    Err(_) => println!("Unknown difficulty '{}'", name),
                }
            }
            "r" | "reveal" => {
                let Some((row, col)) = parse_coords(&parts) else { continue };
                if let Err(e) = engine.reveal(row, col) { eprintln!("{}", e); }
            }
            "f" | "flag" => {
                let Some((row, col)) = parse_coords(&parts) else { continue };
                if !engine.toggle_flag(row, col) { println!("Cannot flag here"); }
            }
            "c" | "chord" => {
                let Some((row, col)) = parse_coords(&parts) else { continue };
                let _ = engine.chord_reveal(row, col);
            }
            other => {
                println!("Unknown command '{}'. Type 'h' for help.", other);
            }
        }
    }
}
