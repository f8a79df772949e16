//! Match state: turn order, piece inventories, passes and scoring.
//!
//! Colors always move in the order Blue, Yellow, Red, Green. With four
//! players seat `i` plays color `i`; with two players seat 0 plays Blue and
//! Red and seat 1 plays Yellow and Green.
//!
//! A color that passes is out for the rest of the match and can only pass
//! again. The match ends once every color has passed.

use thiserror::Error;
use tracing::trace;

use crate::board::{Action, Board, Color, Move};
use crate::constants::{ALL_PLACED_BONUS, MONOMINO, MONOMINO_LAST_BONUS, NUM_PIECES};
use crate::piece::piece;

const ALL_PIECES: u32 = ((1u64 << NUM_PIECES) - 1) as u32;

/// Why a move was rejected. The game is unchanged after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("a game needs 2 or 4 players, got {0}")]
    PlayerCount(usize),

    #[error("the game is over")]
    Finished,

    #[error("it is {expected}'s turn, not {found}'s")]
    WrongTurn { expected: Color, found: Color },

    #[error("{0} has passed and may only pass")]
    AlreadyPassed(Color),

    #[error("{color} has already played piece {piece}")]
    PieceUsed { color: Color, piece: usize },

    #[error("illegal placement: {0}")]
    IllegalPlacement(Move),
}

/// Final (or current) standing of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// Score per player seat.
    pub scores: Vec<i32>,
    /// First seat with the highest score.
    pub winner: usize,
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    num_players: usize,
    current: Color,
    used: [u32; Color::COUNT],
    last_piece: [Option<usize>; Color::COUNT],
    passed: [bool; Color::COUNT],
    moves: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A four-player game.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            num_players: 4,
            current: Color::Blue,
            used: [0; Color::COUNT],
            last_piece: [None; Color::COUNT],
            passed: [false; Color::COUNT],
            moves: Vec::new(),
        }
    }

    pub fn with_players(num_players: usize) -> Result<Self, GameError> {
        if num_players != 2 && num_players != 4 {
            return Err(GameError::PlayerCount(num_players));
        }
        Ok(Self {
            num_players,
            ..Self::new()
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Moves applied so far, passes included.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn current_color(&self) -> Color {
        self.current
    }

    /// The seat controlling `color`.
    #[inline]
    pub fn player_of(&self, color: Color) -> usize {
        color.index() % self.num_players
    }

    pub fn current_player(&self) -> usize {
        self.player_of(self.current)
    }

    pub fn has_passed(&self, color: Color) -> bool {
        self.passed[color.index()]
    }

    pub fn is_piece_used(&self, color: Color, piece_index: usize) -> bool {
        piece_index < NUM_PIECES && self.used[color.index()] & (1 << piece_index) != 0
    }

    /// Pieces the color still holds, in catalog order.
    pub fn remaining_pieces(&self, color: Color) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_PIECES).filter(move |&p| !self.is_piece_used(color, p))
    }

    pub fn is_finished(&self) -> bool {
        self.passed.iter().all(|&p| p)
    }

    /// Every legal placement for the color to move, over all its remaining
    /// pieces in catalog order. Empty once the color has passed or the game
    /// is over; passing is then the only option.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let color = self.current;
        let mut moves = Vec::new();
        if self.is_finished() || self.has_passed(color) {
            return moves;
        }
        let unused = !self.used[color.index()] & ALL_PIECES;
        for p in 0..NUM_PIECES {
            if unused & (1 << p) != 0 {
                self.board.legal_moves_into(color, p, &mut moves);
            }
        }
        moves
    }

    /// Whether `make_move` would accept the move.
    pub fn is_legal(&self, mv: &Move) -> bool {
        self.check(mv).is_ok()
    }

    fn check(&self, mv: &Move) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        if mv.color != self.current {
            return Err(GameError::WrongTurn {
                expected: self.current,
                found: mv.color,
            });
        }
        let Action::Place { piece: p, .. } = mv.action else {
            return Ok(());
        };
        if self.has_passed(mv.color) {
            return Err(GameError::AlreadyPassed(mv.color));
        }
        if self.is_piece_used(mv.color, p) {
            return Err(GameError::PieceUsed {
                color: mv.color,
                piece: p,
            });
        }
        if !self.board.is_legal(mv) {
            return Err(GameError::IllegalPlacement(*mv));
        }
        Ok(())
    }

    /// Apply a move and hand the turn to the next color.
    pub fn make_move(&mut self, mv: Move) -> Result<(), GameError> {
        self.check(&mv)?;
        let i = mv.color.index();
        match mv.action {
            Action::Pass => self.passed[i] = true,
            Action::Place { piece: p, .. } => {
                if !self.board.apply(&mv) {
                    return Err(GameError::IllegalPlacement(mv));
                }
                self.used[i] |= 1 << p;
                self.last_piece[i] = Some(p);
            }
        }
        trace!(%mv, "move applied");
        self.moves.push(mv);
        self.current = self.current.next();
        Ok(())
    }

    /// Minus the cells of every unplayed piece, or a bonus for playing them
    /// all (larger when the monomino went last).
    pub fn color_score(&self, color: Color) -> i32 {
        let i = color.index();
        if self.used[i] == ALL_PIECES {
            return if self.last_piece[i] == Some(MONOMINO) {
                MONOMINO_LAST_BONUS
            } else {
                ALL_PLACED_BONUS
            };
        }
        -self
            .remaining_pieces(color)
            .map(|p| piece(p).size() as i32)
            .sum::<i32>()
    }

    pub fn result(&self) -> GameResult {
        let mut scores = vec![0; self.num_players];
        for color in Color::ALL {
            scores[self.player_of(color)] += self.color_score(color);
        }
        let mut winner = 0;
        for (seat, &score) in scores.iter().enumerate() {
            if score > scores[winner] {
                winner = seat;
            }
        }
        GameResult { scores, winner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Placement;

    fn home_monomino(color: Color) -> Move {
        let home = color.home_slot().coord;
        Move::place(color, MONOMINO, Placement::new(home.row, home.col, 0, false))
    }

    #[test]
    fn test_player_count() {
        assert!(Game::with_players(2).is_ok());
        assert!(Game::with_players(4).is_ok());
        assert_eq!(Game::with_players(3).unwrap_err(), GameError::PlayerCount(3));
    }

    #[test]
    fn test_two_player_seats() {
        let game = Game::with_players(2).unwrap();
        assert_eq!(game.player_of(Color::Blue), 0);
        assert_eq!(game.player_of(Color::Yellow), 1);
        assert_eq!(game.player_of(Color::Red), 0);
        assert_eq!(game.player_of(Color::Green), 1);
    }

    #[test]
    fn test_turn_order() {
        let mut game = Game::new();
        for color in Color::ALL {
            assert_eq!(game.current_color(), color);
            game.make_move(home_monomino(color)).unwrap();
        }
        assert_eq!(game.current_color(), Color::Blue);
        assert_eq!(game.moves().len(), 4);
        assert!(game.is_piece_used(Color::Red, MONOMINO));
        assert_eq!(game.remaining_pieces(Color::Red).count(), NUM_PIECES - 1);
    }

    #[test]
    fn test_rejections_leave_game_unchanged() {
        let mut game = Game::new();
        let err = game.make_move(home_monomino(Color::Yellow)).unwrap_err();
        assert_eq!(
            err,
            GameError::WrongTurn {
                expected: Color::Blue,
                found: Color::Yellow
            }
        );
        let off_corner = Move::place(Color::Blue, MONOMINO, Placement::new(5, 5, 0, false));
        assert_eq!(
            game.make_move(off_corner).unwrap_err(),
            GameError::IllegalPlacement(off_corner)
        );
        assert!(game.moves().is_empty());
        assert_eq!(game.current_color(), Color::Blue);

        game.make_move(home_monomino(Color::Blue)).unwrap();
        game.make_move(Move::pass(Color::Yellow)).unwrap();
        game.make_move(Move::pass(Color::Red)).unwrap();
        game.make_move(Move::pass(Color::Green)).unwrap();
        assert_eq!(
            game.make_move(home_monomino(Color::Blue)).unwrap_err(),
            GameError::PieceUsed {
                color: Color::Blue,
                piece: MONOMINO
            }
        );
        game.make_move(Move::pass(Color::Blue)).unwrap();
        assert!(game.is_finished());
        assert_eq!(
            game.make_move(Move::pass(Color::Yellow)).unwrap_err(),
            GameError::Finished
        );
    }

    #[test]
    fn test_passed_color_only_passes() {
        let mut game = Game::new();
        game.make_move(Move::pass(Color::Blue)).unwrap();
        for color in [Color::Yellow, Color::Red, Color::Green] {
            game.make_move(home_monomino(color)).unwrap();
        }
        assert!(game.legal_moves().is_empty());
        assert_eq!(
            game.make_move(home_monomino(Color::Blue)).unwrap_err(),
            GameError::AlreadyPassed(Color::Blue)
        );
        assert!(game.is_legal(&Move::pass(Color::Blue)));
        game.make_move(Move::pass(Color::Blue)).unwrap();
        assert!(!game.is_finished());
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_opening_moves() {
        let mut game = Game::new();
        let moves = game.legal_moves();
        assert!(moves.contains(&home_monomino(Color::Blue)));
        assert!(moves.iter().all(|m| m.color == Color::Blue && game.is_legal(m)));
        // Catalog order.
        assert_eq!(moves[0], home_monomino(Color::Blue));
        assert!(moves.windows(2).all(|w| w[0].piece() <= w[1].piece()));
    }

    #[test]
    fn test_scores() {
        let mut game = Game::new();
        assert_eq!(game.result().scores, vec![-89; 4]);
        assert_eq!(game.result().winner, 0);

        game.make_move(Move::pass(Color::Blue)).unwrap();
        game.make_move(home_monomino(Color::Yellow)).unwrap();
        let result = game.result();
        assert_eq!(result.scores, vec![-89, -88, -89, -89]);
        assert_eq!(result.winner, 1);
    }

    #[test]
    fn test_two_player_scores_sum_colors() {
        let mut game = Game::with_players(2).unwrap();
        game.make_move(home_monomino(Color::Blue)).unwrap();
        let result = game.result();
        assert_eq!(result.scores, vec![-89 - 88, -89 - 89]);
        assert_eq!(result.winner, 0);
    }

    #[test]
    fn test_all_placed_bonus() {
        let mut game = Game::new();
        game.used[0] = ALL_PIECES;
        game.last_piece[0] = Some(MONOMINO);
        game.used[1] = ALL_PIECES;
        game.last_piece[1] = Some(20);
        assert_eq!(game.color_score(Color::Blue), MONOMINO_LAST_BONUS);
        assert_eq!(game.color_score(Color::Yellow), ALL_PLACED_BONUS);
    }
}
