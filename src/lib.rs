//! Blokus-Rust: a four-corner tile placement game with an MCTS player.
//!
//! Players take turns placing polyomino pieces on a 20x20 board. A new piece
//! must touch one of its own color's pieces at a corner and must never share
//! an edge with them. The first piece of each color covers its home corner.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, scoring and search defaults
//! - [`piece`] - Piece catalog: orientations, corners and slots
//! - [`board`] - Bitboard legal-move generator
//! - [`game`] - Turn order, inventories, passes and scoring
//! - [`tree`] - Arena-allocated search tree
//! - [`mcts`] - Parallel Monte Carlo Tree Search player
//! - [`playout`] - Random playouts and a random player
//! - [`config`] - Search options
//! - [`runner`] - Player trait and turn-order driver
//!
//! ## Example
//!
//! ```
//! use blokus_rust::config::MctsOptions;
//! use blokus_rust::game::Game;
//! use blokus_rust::mcts::MctsAi;
//! use blokus_rust::runner::Player;
//!
//! let mut game = Game::with_players(2).unwrap();
//! let mut ai = MctsAi::new(MctsOptions::default().with_iterations(10).with_seed(1));
//!
//! let mv = ai.select_move(&game);
//! game.make_move(mv).unwrap();
//! println!("{mv}\n{}", game.board());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod game;
pub mod mcts;
pub mod piece;
pub mod playout;
pub mod runner;
pub mod tree;
