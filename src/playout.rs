//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves, passing when a color has
//! none, until every color has passed. It then scores the final position.

use crate::board::Move;
use crate::game::Game;
use crate::runner::Player;

/// A uniformly random legal move for the color to play, or a pass.
pub fn random_move(game: &mut Game, rng: &mut fastrand::Rng) -> Move {
    let moves = game.legal_moves();
    if moves.is_empty() {
        Move::pass(game.current_color())
    } else {
        moves[rng.usize(..moves.len())]
    }
}

/// Play random moves until the game is finished and return the winning seat.
pub fn rollout(game: &mut Game, rng: &mut fastrand::Rng) -> usize {
    while !game.is_finished() {
        let mv = random_move(game, rng);
        if let Err(e) = game.make_move(mv) {
            panic!("generated move rejected during rollout: {e}");
        }
    }
    game.result().winner
}

/// Plays uniformly random legal moves.
pub struct RandomPlayer {
    rng: fastrand::Rng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn select_move(&mut self, game: &Game) -> Move {
        let mut scratch = game.clone();
        random_move(&mut scratch, &mut self.rng)
    }
}
