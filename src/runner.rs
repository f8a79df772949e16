//! Turn-order driver.
//!
//! [`GameRunner`] asks each seat's [`Player`] for a move in turn, applies it,
//! and notifies observers after every move until the game is over.
//!
//! Seats are added in order. With two players seat 0 plays Blue and Red and
//! seat 1 plays Yellow and Green; with four players seat `i` plays color `i`.

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::board::Move;
use crate::game::{Game, GameResult};

/// Anything that can choose a move: an AI, a random mover, a remote human.
pub trait Player {
    /// A move for the color to play. Passing is always accepted.
    fn select_move(&mut self, game: &Game) -> Move;
}

/// Called after every applied move with the updated game and that move.
pub type Observer = Box<dyn FnMut(&Game, &Move)>;

pub struct GameRunner {
    num_players: usize,
    players: Vec<Box<dyn Player>>,
    observers: Vec<Observer>,
}

impl GameRunner {
    pub fn new(num_players: usize) -> Result<Self> {
        if num_players != 2 && num_players != 4 {
            bail!("a game needs 2 or 4 players, got {num_players}");
        }
        Ok(Self {
            num_players,
            players: Vec::new(),
            observers: Vec::new(),
        })
    }

    /// Seat the next player.
    pub fn add_player(&mut self, player: Box<dyn Player>) -> Result<()> {
        if self.players.len() == self.num_players {
            bail!("all {} seats are taken", self.num_players);
        }
        self.players.push(player);
        Ok(())
    }

    pub fn add_observer(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Play one game to completion.
    ///
    /// Fails if a seat is empty or a player proposes a move the game rejects.
    pub fn play(&mut self) -> Result<GameResult> {
        if self.players.len() != self.num_players {
            bail!(
                "need {} players, only {} seated",
                self.num_players,
                self.players.len()
            );
        }

        let mut game = Game::with_players(self.num_players)?;
        while !game.is_finished() {
            let seat = game.current_player();
            let mv = self.players[seat].select_move(&game);
            game.make_move(mv)
                .with_context(|| format!("player {seat} wants to play an invalid move: {mv}"))?;
            debug!(seat, %mv, "played");
            for observer in &mut self.observers {
                observer(&game, &mv);
            }
        }

        let result = game.result();
        info!(scores = ?result.scores, winner = result.winner, moves = game.moves().len(), "game over");
        Ok(result)
    }
}

/// Observer that prints every move and the board to stdout.
pub fn board_printing_observer(ansi: bool) -> Observer {
    Box::new(move |game: &Game, mv: &Move| {
        println!("{mv}");
        println!("{}", game.board().render(ansi));
    })
}
