//! Blokus-Rust: self-play and benchmarking for the MCTS player.
//!
//! ## Usage
//!
//! - `blokus-rust selfplay` - MCTS players play each other and report average scores
//! - `blokus-rust bench` - Measure random rollout throughput
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use blokus_rust::config::MctsOptions;
use blokus_rust::constants::{
    DEFAULT_EXPLORATION, DEFAULT_ITERATIONS, DEFAULT_ROLLOUTS_PER_ITERATION, DEFAULT_THREADS,
};
use blokus_rust::game::Game;
use blokus_rust::mcts::MctsAi;
use blokus_rust::playout::rollout;
use blokus_rust::runner::{GameRunner, board_printing_observer};

/// Blokus-Rust: a four-corner tile game with an MCTS player
#[derive(Parser)]
#[command(name = "blokus-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play MCTS players against each other
    Selfplay(SelfplayArgs),
    /// Run random rollouts from the opening position and report throughput
    Bench {
        /// Number of rollouts
        #[arg(long, default_value_t = 100)]
        rollouts: usize,
        /// Random seed (default: from the OS)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct SelfplayArgs {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Number of players, 2 or 4
    #[arg(long, default_value_t = 2)]
    players: usize,
    /// MCTS iterations per move
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,
    /// Rollouts per MCTS iteration
    #[arg(long, default_value_t = DEFAULT_ROLLOUTS_PER_ITERATION)]
    rollouts: usize,
    /// MCTS worker threads
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    threads: usize,
    /// UCB1 exploration constant
    #[arg(long, default_value_t = DEFAULT_EXPLORATION)]
    exploration: f64,
    /// Random seed (default: from the OS)
    #[arg(long)]
    seed: Option<u64>,
    /// Print the board after every move
    #[arg(long)]
    print_board: bool,
}

impl SelfplayArgs {
    /// One two-player game with default search settings.
    fn single_game() -> Self {
        Self {
            games: 1,
            players: 2,
            iterations: DEFAULT_ITERATIONS,
            rollouts: DEFAULT_ROLLOUTS_PER_ITERATION,
            threads: DEFAULT_THREADS,
            exploration: DEFAULT_EXPLORATION,
            seed: None,
            print_board: true,
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Selfplay(args)) => run_selfplay(&args),
        Some(Commands::Bench { rollouts, seed }) => run_bench(rollouts, seed),
        None => run_selfplay(&SelfplayArgs::single_game()),
    }
}

fn run_selfplay(args: &SelfplayArgs) -> Result<()> {
    if args.players != 2 && args.players != 4 {
        bail!("--players must be 2 or 4, got {}", args.players);
    }
    if args.games == 0 {
        bail!("--games must be at least 1");
    }

    let mut seeds = match args.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut total_scores = vec![0i64; args.players];
    let mut wins = vec![0usize; args.players];

    let start = Instant::now();
    for game_index in 0..args.games {
        let mut runner = GameRunner::new(args.players)?;
        for _ in 0..args.players {
            let options = MctsOptions::default()
                .with_exploration(args.exploration)
                .with_iterations(args.iterations)
                .with_rollouts(args.rollouts)
                .with_threads(args.threads)
                .with_seed(seeds.u64(..));
            runner.add_player(Box::new(MctsAi::new(options)))?;
        }
        if args.print_board {
            runner.add_observer(board_printing_observer(true));
        }

        let result = runner.play()?;
        info!(game = game_index + 1, scores = ?result.scores, winner = result.winner, "finished");
        for (total, score) in total_scores.iter_mut().zip(&result.scores) {
            *total += *score as i64;
        }
        wins[result.winner] += 1;
    }

    info!(games = args.games, elapsed = ?start.elapsed(), "self-play done");
    for (seat, total) in total_scores.iter().enumerate() {
        info!(
            seat,
            average_score = *total as f64 / args.games as f64,
            wins = wins[seat],
            "summary"
        );
    }
    Ok(())
}

fn run_bench(rollouts: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let game = Game::new();
    let mut total_moves = 0usize;

    let start = Instant::now();
    for _ in 0..rollouts {
        let mut state = game.clone();
        rollout(&mut state, &mut rng);
        total_moves += state.moves().len();
    }
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        rollouts,
        elapsed = ?elapsed,
        rollouts_per_sec = rollouts as f64 / secs,
        moves_per_rollout = total_moves as f64 / rollouts.max(1) as f64,
        "benchmark done"
    );
    Ok(())
}
