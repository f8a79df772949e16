//! Bitboard move generator.
//!
//! For every color the board keeps:
//! - an *available* bitboard: one `u32` per row with a bit set for each cell
//!   that color may still cover. Cells taken by anyone are cleared, and so are
//!   the orthogonal neighbours of the color's own pieces.
//! - a *frontier* of [`Slot`]s, deduplicated by position, where a new piece's
//!   corner may land. It starts with the color's home corner and grows with
//!   every placement.
//! - a per-slot cache of pieces that can never fit there again.
//!
//! A placement is legal when one of its corners sits on a compatible slot and
//! every piece row is a subset of the available row below it.

use std::fmt;

use crate::constants::{MAX_PLACEMENT_HASH, NUM_CELLS, NUM_COLS, NUM_PIECES, NUM_ROWS, ROW_MASK};
use crate::piece::{Coord, Corner, Orientation, Placement, Slot, SlotKind, piece};

/// The four colors, in turn order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Blue,
    Yellow,
    Red,
    Green,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Blue, Color::Yellow, Color::Red, Color::Green];
    pub const COUNT: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The color that moves after this one.
    #[inline]
    pub fn next(self) -> Color {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Green => "green",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Color::Blue => "\x1b[34m",
            Color::Yellow => "\x1b[33m",
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
        }
    }

    /// The slot every color starts from, in its own corner of the board.
    pub fn home_slot(self) -> Slot {
        let (last_row, last_col) = (NUM_ROWS as i8 - 1, NUM_COLS as i8 - 1);
        let (coord, kind) = match self {
            Color::Blue => (Coord::new(0, 0), SlotKind::SouthEast),
            Color::Yellow => (Coord::new(0, last_col), SlotKind::SouthWest),
            Color::Red => (Coord::new(last_row, last_col), SlotKind::NorthWest),
            Color::Green => (Coord::new(last_row, 0), SlotKind::NorthEast),
        };
        Slot { coord, kind }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Pass,
    Place { piece: usize, placement: Placement },
}

/// What a color does on its turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub color: Color,
    pub action: Action,
}

impl Move {
    pub fn pass(color: Color) -> Self {
        Self {
            color,
            action: Action::Pass,
        }
    }

    pub fn place(color: Color, piece: usize, placement: Placement) -> Self {
        Self {
            color,
            action: Action::Place { piece, placement },
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.action, Action::Pass)
    }

    /// The piece index played, `None` for a pass.
    pub fn piece(&self) -> Option<usize> {
        match self.action {
            Action::Pass => None,
            Action::Place { piece, .. } => Some(piece),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Action::Pass => write!(f, "{} pass", self.color),
            Action::Place { piece, placement } => {
                write!(f, "{} piece {:2} at {}", self.color, piece, placement)
            }
        }
    }
}

#[inline]
fn cell_index(coord: Coord) -> Option<usize> {
    let (row, col) = (coord.row as i32, coord.col as i32);
    if row < 0 || col < 0 || row >= NUM_ROWS as i32 || col >= NUM_COLS as i32 {
        return None;
    }
    Some(row as usize * NUM_COLS + col as usize)
}

/// Per-color availability and frontier.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Frontier {
    available: [u32; NUM_ROWS],
    slots: Vec<Slot>,
    /// Bit `p` set: piece `p` can never be placed through this slot.
    exhausted: Vec<u32>,
    present: [bool; NUM_CELLS],
}

impl Frontier {
    fn new(color: Color) -> Self {
        let home = color.home_slot();
        let mut present = [false; NUM_CELLS];
        if let Some(i) = cell_index(home.coord) {
            present[i] = true;
        }
        Self {
            available: [ROW_MASK; NUM_ROWS],
            slots: vec![home],
            exhausted: vec![0],
            present,
        }
    }

    fn slot_at(&self, coord: Coord) -> Option<&Slot> {
        let i = cell_index(coord)?;
        if !self.present[i] {
            return None;
        }
        self.slots.iter().find(|s| s.coord == coord)
    }
}

/// Try to put `corner` of `o` on `slot`. On success returns the resulting
/// placement.
#[inline]
fn fit(available: &[u32; NUM_ROWS], slot: &Slot, o: &Orientation, corner: &Corner) -> Option<Placement> {
    if !corner.kind.fits(slot.kind) {
        return None;
    }
    let start = slot.coord - corner.coord;
    if start.row < 0
        || start.col < 0
        || start.row as usize + o.num_rows() > NUM_ROWS
        || start.col as usize + o.num_cols() > NUM_COLS
    {
        return None;
    }
    let (r0, c0) = (start.row as usize, start.col as u32);
    for (i, &row) in o.rows().iter().enumerate() {
        let slice = row << c0;
        let avail = available[r0 + i];
        if slice | avail != avail {
            return None;
        }
    }
    Some(Placement {
        coord: start + o.offset(),
        rotation: o.rotation(),
        flip: o.flip(),
    })
}

/// Fixed-size seen-set over [`Placement::hash_index`].
struct SeenSet([u64; MAX_PLACEMENT_HASH.div_ceil(64)]);

impl SeenSet {
    fn new() -> Self {
        Self([0; MAX_PLACEMENT_HASH.div_ceil(64)])
    }

    /// Returns true the first time a placement is inserted.
    fn insert(&mut self, placement: &Placement) -> bool {
        let Some(h) = placement.hash_index() else {
            return false;
        };
        let (word, bit) = (h / 64, 1u64 << (h % 64));
        let fresh = self.0[word] & bit == 0;
        self.0[word] |= bit;
        fresh
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Color>; NUM_CELLS],
    frontiers: [Frontier; Color::COUNT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; NUM_CELLS],
            frontiers: Color::ALL.map(Frontier::new),
        }
    }

    /// Which color covers the cell, if any. Out-of-range cells are empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<Color> {
        if row >= NUM_ROWS || col >= NUM_COLS {
            return None;
        }
        self.cells[row * NUM_COLS + col]
    }

    /// The color's frontier, in insertion order.
    pub fn slots(&self, color: Color) -> &[Slot] {
        &self.frontiers[color.index()].slots
    }

    /// Bitmask of the cells in `row` the color may still cover.
    ///
    /// # Panics
    ///
    /// Panics if `row >= NUM_ROWS`.
    pub fn available_row(&self, color: Color, row: usize) -> u32 {
        self.frontiers[color.index()].available[row]
    }

    /// Whether enumeration has already proven that `piece` cannot be placed
    /// through the slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot_index` is not below `self.slots(color).len()` or
    /// `piece >= NUM_PIECES`.
    pub fn slot_is_exhausted(&self, color: Color, slot_index: usize, piece: usize) -> bool {
        assert!(piece < NUM_PIECES, "piece index {piece} out of range");
        self.frontiers[color.index()].exhausted[slot_index] & (1 << piece) != 0
    }

    /// Whether some orientation of `piece` currently fits through the slot,
    /// ignoring the exhaustion cache.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as
    /// [`slot_is_exhausted`](Self::slot_is_exhausted).
    pub fn slot_has_fit(&self, color: Color, slot_index: usize, piece_index: usize) -> bool {
        let frontier = &self.frontiers[color.index()];
        let slot = &frontier.slots[slot_index];
        piece(piece_index).orientations().iter().any(|o| {
            o.corners()
                .iter()
                .any(|c| fit(&frontier.available, slot, o, c).is_some())
        })
    }

    /// Whether `mv` places a piece legally. Passes are never legal here; the
    /// match decides when a color may pass.
    pub fn is_legal(&self, mv: &Move) -> bool {
        let Action::Place {
            piece: piece_index,
            placement,
        } = mv.action
        else {
            return false;
        };
        if piece_index >= NUM_PIECES {
            return false;
        }
        let Some(o) = piece(piece_index).orientation(placement.rotation, placement.flip) else {
            return false;
        };
        let frontier = &self.frontiers[mv.color.index()];
        let Some(start) = placement.coord.checked_sub(o.offset()) else {
            return false;
        };
        o.corners().iter().any(|corner| {
            start
                .checked_add(corner.coord)
                .and_then(|coord| frontier.slot_at(coord))
                .and_then(|slot| fit(&frontier.available, slot, o, corner))
                .is_some()
        })
    }

    /// Every legal placement of `piece_index` for `color`, in frontier order,
    /// then orientation order, then corner order.
    ///
    /// Slots through which the piece cannot fit are marked exhausted for that
    /// piece and skipped on later calls. Availability only shrinks, so the
    /// mark never needs to be revoked.
    pub fn legal_moves(&mut self, color: Color, piece_index: usize) -> Vec<Move> {
        let mut moves = Vec::new();
        self.legal_moves_into(color, piece_index, &mut moves);
        moves
    }

    /// Like [`legal_moves`](Self::legal_moves), appending to `out`.
    pub fn legal_moves_into(&mut self, color: Color, piece_index: usize, out: &mut Vec<Move>) {
        if piece_index >= NUM_PIECES {
            return;
        }
        let bit = 1u32 << piece_index;
        let orientations = piece(piece_index).orientations();
        let frontier = &mut self.frontiers[color.index()];
        let mut seen = SeenSet::new();

        for (slot, exhausted) in frontier.slots.iter().zip(frontier.exhausted.iter_mut()) {
            if *exhausted & bit != 0 {
                continue;
            }
            let mut found = false;
            for o in orientations {
                for corner in o.corners() {
                    if let Some(placement) = fit(&frontier.available, slot, o, corner) {
                        found = true;
                        if seen.insert(&placement) {
                            out.push(Move::place(color, piece_index, placement));
                        }
                    }
                }
            }
            if !found {
                *exhausted |= bit;
            }
        }
    }

    /// Place the piece if the move is legal. Returns false and leaves the
    /// board untouched otherwise.
    pub fn apply(&mut self, mv: &Move) -> bool {
        if !self.is_legal(mv) {
            return false;
        }
        let Action::Place {
            piece: piece_index,
            placement,
        } = mv.action
        else {
            return false;
        };
        let Some(o) = piece(piece_index).orientation(placement.rotation, placement.flip) else {
            return false;
        };
        let Some(start) = placement.coord.checked_sub(o.offset()) else {
            return false;
        };
        let (r0, c0) = (start.row as usize, start.col as u32);

        for &c in o.coords() {
            if let Some(i) = start.checked_add(c).and_then(cell_index) {
                self.cells[i] = Some(mv.color);
            }
        }

        for color in Color::ALL {
            let frontier = &mut self.frontiers[color.index()];
            if color != mv.color {
                for (i, &row) in o.rows().iter().enumerate() {
                    frontier.available[r0 + i] &= !(row << c0);
                }
                continue;
            }

            // Expanded row 0 is board row r0 - 1, bit 0 is column c0 - 1.
            for (i, &row) in o.expanded_rows().iter().enumerate() {
                let r = r0 as i32 + i as i32 - 1;
                if r < 0 || r >= NUM_ROWS as i32 {
                    continue;
                }
                let shifted = if c0 == 0 { row >> 1 } else { row << (c0 - 1) };
                frontier.available[r as usize] &= !(shifted & ROW_MASK);
            }

            for s in o.slots() {
                let Some(coord) = start.checked_add(s.coord) else {
                    continue;
                };
                let Some(i) = cell_index(coord) else {
                    continue;
                };
                if frontier.present[i] {
                    continue;
                }
                frontier.present[i] = true;
                frontier.slots.push(Slot {
                    coord,
                    kind: s.kind,
                });
                frontier.exhausted.push(0);
            }
        }
        true
    }

    /// The occupancy grid, one character per cell, optionally with ANSI colors.
    pub fn render(&self, ansi: bool) -> String {
        let mut out = String::with_capacity(NUM_CELLS * 2 + NUM_ROWS);
        for row in 0..NUM_ROWS {
            for col in 0..NUM_COLS {
                match self.cell(row, col) {
                    None => out.push('.'),
                    Some(color) if ansi => {
                        out.push_str(color.ansi());
                        out.push(color.symbol());
                        out.push_str("\x1b[0m");
                    }
                    Some(color) => out.push(color.symbol()),
                }
                if col + 1 < NUM_COLS {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MONOMINO;

    const DOMINO: usize = 1;

    #[test]
    fn test_color_cycle() {
        assert_eq!(Color::Blue.next(), Color::Yellow);
        assert_eq!(Color::Green.next(), Color::Blue);
    }

    #[test]
    fn test_new_board() {
        let board = Board::new();
        for color in Color::ALL {
            assert_eq!(board.slots(color), &[color.home_slot()]);
            for row in 0..NUM_ROWS {
                assert_eq!(board.available_row(color, row), ROW_MASK);
            }
        }
        assert_eq!(board.cell(0, 0), None);
    }

    #[test]
    fn test_monomino_only_at_home() {
        let mut board = Board::new();
        for color in Color::ALL {
            let home = color.home_slot().coord;
            let moves = board.legal_moves(color, MONOMINO);
            assert_eq!(
                moves,
                vec![Move::place(
                    color,
                    MONOMINO,
                    Placement::new(home.row, home.col, 0, false)
                )]
            );
        }
    }

    #[test]
    fn test_first_move_must_cover_home() {
        let board = Board::new();
        assert!(board.is_legal(&Move::place(Color::Blue, DOMINO, Placement::new(0, 0, 0, false))));
        assert!(!board.is_legal(&Move::place(Color::Blue, DOMINO, Placement::new(0, 1, 0, false))));
        assert!(!board.is_legal(&Move::place(Color::Yellow, DOMINO, Placement::new(0, 0, 0, false))));
    }

    #[test]
    fn test_apply_monomino_then_domino() {
        let mut board = Board::new();
        let mono = Move::place(Color::Blue, MONOMINO, Placement::new(0, 0, 0, false));
        assert!(board.apply(&mono));
        assert_eq!(board.cell(0, 0), Some(Color::Blue));

        // (0,0) itself plus its right and lower neighbours.
        assert_eq!(board.available_row(Color::Blue, 0), ROW_MASK & !0b11);
        assert_eq!(board.available_row(Color::Blue, 1), ROW_MASK & !0b01);
        assert_eq!(board.available_row(Color::Yellow, 0), ROW_MASK & !0b01);
        assert_eq!(board.available_row(Color::Yellow, 1), ROW_MASK);

        assert_eq!(
            board.slots(Color::Blue)[1],
            Slot {
                coord: Coord::new(1, 1),
                kind: SlotKind::SouthEast
            }
        );
        assert_eq!(board.slots(Color::Blue).len(), 2);

        let moves = board.legal_moves(Color::Blue, DOMINO);
        assert_eq!(
            moves,
            vec![
                Move::place(Color::Blue, DOMINO, Placement::new(1, 1, 0, false)),
                Move::place(Color::Blue, DOMINO, Placement::new(2, 1, 1, false)),
            ]
        );
        assert!(board.slot_is_exhausted(Color::Blue, 0, DOMINO));
        assert!(!board.slot_is_exhausted(Color::Blue, 1, DOMINO));
    }

    #[test]
    fn test_expanded_rows_at_left_edge() {
        let mut board = Board::new();
        // Vertical domino covering (18,0) and (19,0).
        let mv = Move::place(Color::Green, DOMINO, Placement::new(19, 0, 1, false));
        assert!(board.is_legal(&mv));
        assert!(board.apply(&mv));
        assert_eq!(board.cell(18, 0), Some(Color::Green));
        assert_eq!(board.cell(19, 0), Some(Color::Green));
        assert_eq!(board.available_row(Color::Green, 17), ROW_MASK & !0b01);
        assert_eq!(board.available_row(Color::Green, 18), ROW_MASK & !0b11);
        assert_eq!(board.available_row(Color::Green, 19), ROW_MASK & !0b11);
        assert_eq!(board.available_row(Color::Green, 16), ROW_MASK);
    }

    #[test]
    fn test_illegal_apply_leaves_board_unchanged() {
        let mut board = Board::new();
        assert!(board.apply(&Move::place(Color::Blue, MONOMINO, Placement::new(0, 0, 0, false))));
        let before = board.clone();

        // Orthogonally adjacent to its own piece.
        assert!(!board.apply(&Move::place(Color::Blue, DOMINO, Placement::new(0, 1, 0, false))));
        // Not a registered orientation of the domino.
        assert!(!board.apply(&Move::place(Color::Blue, DOMINO, Placement::new(1, 1, 2, false))));
        assert!(!board.apply(&Move::pass(Color::Blue)));
        assert!(!board.apply(&Move::place(Color::Blue, NUM_PIECES, Placement::new(1, 1, 0, false))));
        assert_eq!(board, before);
    }

    #[test]
    fn test_out_of_range_piece_has_no_moves() {
        let mut board = Board::new();
        assert!(board.legal_moves(Color::Blue, NUM_PIECES).is_empty());
        assert!(board.legal_moves(Color::Blue, usize::MAX).is_empty());
        assert_eq!(board, Board::new());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_slot_is_exhausted_panics_past_frontier() {
        let board = Board::new();
        let len = board.slots(Color::Blue).len();
        board.slot_is_exhausted(Color::Blue, len, MONOMINO);
    }

    #[test]
    #[should_panic(expected = "piece index")]
    fn test_slot_is_exhausted_panics_on_bad_piece() {
        Board::new().slot_is_exhausted(Color::Blue, 0, NUM_PIECES);
    }

    #[test]
    fn test_opponent_cells_unavailable() {
        let mut board = Board::new();
        // Blue horizontal I-pentomino along the top row.
        assert!(board.apply(&Move::place(Color::Blue, 14, Placement::new(0, 0, 0, false))));
        for color in [Color::Yellow, Color::Red, Color::Green] {
            assert_eq!(board.available_row(color, 0), ROW_MASK & !0b11111);
            assert_eq!(board.available_row(color, 1), ROW_MASK);
        }
        assert_eq!(board.available_row(Color::Blue, 0), ROW_MASK & !0b111111);
        assert_eq!(board.available_row(Color::Blue, 1), ROW_MASK & !0b11111);
    }

    #[test]
    fn test_enumeration_is_legal_and_unique() {
        const CROSS: usize = 19;
        let mut board = Board::new();
        for p in 0..NUM_PIECES {
            let moves = board.legal_moves(Color::Blue, p);
            // The cross cannot cover a board corner.
            assert_eq!(moves.is_empty(), p == CROSS, "piece {p}");
            for (i, m) in moves.iter().enumerate() {
                assert!(board.is_legal(m));
                assert!(!moves[..i].contains(m));
            }
        }
    }

    #[test]
    fn test_render() {
        let mut board = Board::new();
        assert!(board.apply(&Move::place(Color::Red, MONOMINO, Placement::new(19, 19, 0, false))));
        let text = board.to_string();
        assert_eq!(text.lines().count(), NUM_ROWS);
        assert!(text.lines().last().unwrap().ends_with('R'));
        assert!(board.render(true).contains("\x1b[31mR\x1b[0m"));
    }
}
