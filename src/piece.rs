//! The piece catalog: shapes, orientations, corners and slots.
//!
//! Every piece is given as a 5x5 text pattern. At startup each pattern is
//! rotated and flipped into its 8 transforms, and every physically distinct
//! result becomes an [`Orientation`]. An orientation precomputes everything
//! the move generator needs:
//!
//! - row bitmasks of its cells (column 0 is the least significant bit),
//! - "expanded" row bitmasks: the cells plus their 4 orthogonal neighbours,
//! - [`Corner`]s: cells through which the piece can touch another piece
//!   diagonally,
//! - [`Slot`]s: empty cells diagonal to the piece where a future corner may land.
//!
//! Transforms rotate around the top-left cell of the pattern and proceed
//! clockwise; flipping mirrors the rows afterwards:
//!
//! ```text
//! original       rotation=1        rotation=2       rotation=3
//!   x                ox               o                 oo
//!   ooo              o                ooo               o
//!     o             oo                  x              xo
//! ```

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::OnceLock;

use thiserror::Error;

use crate::constants::{NUM_PIECES, PLACEMENT_SPAN, SHAPE_SIZE};

/// A (row, column) pair, either local to a piece or on the board.
/// (0, 0) is the upper-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: i8,
    pub col: i8,
}

impl Coord {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// `self + rhs`, or `None` if either component overflows `i8`.
    pub fn checked_add(self, rhs: Coord) -> Option<Coord> {
        Some(Coord::new(
            self.row.checked_add(rhs.row)?,
            self.col.checked_add(rhs.col)?,
        ))
    }

    /// `self - rhs`, or `None` if either component overflows `i8`.
    pub fn checked_sub(self, rhs: Coord) -> Option<Coord> {
        Some(Coord::new(
            self.row.checked_sub(rhs.row)?,
            self.col.checked_sub(rhs.col)?,
        ))
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.row + rhs.row, self.col + rhs.col)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.row - rhs.row, self.col - rhs.col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:2},{:2})", self.row, self.col)
    }
}

/// Which way a slot faces, relative to the piece that created it.
///
/// A `NorthEast` slot sits diagonally up and to the right of a piece cell.
/// An `East` slot has piece cells on both of its west-side diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    North,
    West,
    East,
    South,
    SouthEast,
    NorthEast,
    NorthWest,
    SouthWest,
}

/// Which way a corner cell points, derived from its occupied orthogonal sides.
///
/// A `West` corner has only its east side occupied; a `NorthWest` corner has
/// its east and south sides occupied. `All` is the lone cell of the monomino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CornerKind {
    North,
    West,
    East,
    South,
    SouthEast,
    NorthEast,
    NorthWest,
    SouthWest,
    All,
}

/// Corner (rows) vs slot (columns), columns ordered as in [`SlotKind`]:
/// N, W, E, S, SE, NE, NW, SW.
const FITS: [[bool; 8]; 9] = {
    const O: bool = false;
    const X: bool = true;
    [
        [O, O, O, X, X, O, O, X], // North
        [O, O, X, O, X, X, O, O], // West
        [O, X, O, O, O, O, X, X], // East
        [X, O, O, O, O, X, X, O], // South
        [O, O, O, O, O, O, X, O], // SouthEast
        [O, O, O, O, O, O, O, X], // NorthEast
        [O, O, O, O, X, O, O, O], // NorthWest
        [O, O, O, O, O, X, O, O], // SouthWest
        [X, X, X, X, X, X, X, X], // All
    ]
};

impl CornerKind {
    /// Whether a corner of this kind may be placed on a slot of the given kind.
    #[inline]
    pub fn fits(self, slot: SlotKind) -> bool {
        FITS[self as usize][slot as usize]
    }
}

/// A cell of a piece that can attach diagonally to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub coord: Coord,
    pub kind: CornerKind,
}

/// An empty cell diagonal to a piece where a future corner may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub coord: Coord,
    pub kind: SlotKind,
}

/// How to put a piece on the board, not including the piece itself.
///
/// `coord` is where the pattern's top-left cell lands after the transform,
/// so it may lie outside the board even when every piece cell is inside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Placement {
    pub coord: Coord,
    /// Clockwise quarter turns, 0..=3.
    pub rotation: u8,
    pub flip: bool,
}

impl Placement {
    pub const fn new(row: i8, col: i8, rotation: u8, flip: bool) -> Self {
        Self {
            coord: Coord::new(row, col),
            rotation,
            flip,
        }
    }

    /// Dense index used by the enumeration seen-set, `None` when the
    /// placement lies outside the representable span.
    #[inline]
    pub fn hash_index(&self) -> Option<usize> {
        let span = PLACEMENT_SPAN as i32;
        let (row, col) = (self.coord.row as i32, self.coord.col as i32);
        if row < 0 || row >= span || col < 0 || col >= span || self.rotation > 3 {
            return None;
        }
        Some(((row * span + col) as usize) * 8 + self.rotation as usize * 2 + self.flip as usize)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.coord, self.rotation, self.flip as u8)
    }
}

/// One physically distinct rotation/flip of a piece.
#[derive(Debug, Clone)]
pub struct Orientation {
    rotation: u8,
    flip: bool,
    coords: Vec<Coord>,
    offset: Coord,
    num_rows: usize,
    num_cols: usize,
    rows: Vec<u32>,
    expanded_rows: Vec<u32>,
    corners: Vec<Corner>,
    slots: Vec<Slot>,
}

/// Margin around the piece in the classification grid.
const GRID_MARGIN: i32 = 2;
/// A 5x5 piece plus a margin of 2 on every side.
const GRID_SIZE: usize = SHAPE_SIZE + 2 * GRID_MARGIN as usize;

impl Orientation {
    /// `coords` must already be normalized so that the minimum row and
    /// column are 0; `offset` undoes that normalization.
    fn new(rotation: u8, flip: bool, coords: Vec<Coord>, offset: Coord) -> Self {
        let num_rows = coords.iter().map(|c| c.row as usize + 1).max().unwrap_or(0);
        let num_cols = coords.iter().map(|c| c.col as usize + 1).max().unwrap_or(0);

        let mut rows = vec![0u32; num_rows];
        let mut expanded_rows = vec![0u32; num_rows + 2];
        for c in &coords {
            let (r, col) = (c.row as usize, c.col as usize);
            rows[r] |= 1 << col;
            // Expanded rows are shifted one row down and one column right.
            expanded_rows[r] |= 0b010 << col;
            expanded_rows[r + 1] |= 0b111 << col;
            expanded_rows[r + 2] |= 0b010 << col;
        }

        let mut o = Self {
            rotation,
            flip,
            coords,
            offset,
            num_rows,
            num_cols,
            rows,
            expanded_rows,
            corners: Vec::new(),
            slots: Vec::new(),
        };
        o.compute_corners_and_slots();
        o
    }

    fn compute_corners_and_slots(&mut self) {
        let mut grid = [[false; GRID_SIZE]; GRID_SIZE];
        for c in &self.coords {
            grid[(c.row as i32 + GRID_MARGIN) as usize][(c.col as i32 + GRID_MARGIN) as usize] =
                true;
        }
        let at = |r: i32, c: i32| -> bool {
            let (gr, gc) = (r + GRID_MARGIN, c + GRID_MARGIN);
            gr >= 0
                && gc >= 0
                && (gr as usize) < GRID_SIZE
                && (gc as usize) < GRID_SIZE
                && grid[gr as usize][gc as usize]
        };

        let (rows, cols) = (self.num_rows as i32, self.num_cols as i32);

        for r in 0..rows {
            for c in 0..cols {
                if !at(r, c) {
                    continue;
                }
                let (n, e, s, w) = (at(r - 1, c), at(r, c + 1), at(r + 1, c), at(r, c - 1));
                let kind = match (n, e, s, w) {
                    (false, false, false, false) => CornerKind::All,
                    (false, false, true, false) => CornerKind::North,
                    (true, false, false, false) => CornerKind::South,
                    (false, true, false, false) => CornerKind::West,
                    (false, false, false, true) => CornerKind::East,
                    (false, true, true, false) => CornerKind::NorthWest,
                    (false, false, true, true) => CornerKind::NorthEast,
                    (true, true, false, false) => CornerKind::SouthWest,
                    (true, false, false, true) => CornerKind::SouthEast,
                    _ => continue,
                };
                self.corners.push(Corner {
                    coord: Coord::new(r as i8, c as i8),
                    kind,
                });
            }
        }

        for r in -1..=rows {
            for c in -1..=cols {
                if at(r, c) || at(r - 1, c) || at(r + 1, c) || at(r, c - 1) || at(r, c + 1) {
                    continue;
                }
                let (nw, ne) = (at(r - 1, c - 1), at(r - 1, c + 1));
                let (sw, se) = (at(r + 1, c - 1), at(r + 1, c + 1));
                let kind = match (nw, ne, sw, se) {
                    (false, false, false, true) => SlotKind::NorthWest,
                    (false, false, true, false) => SlotKind::NorthEast,
                    (false, true, false, false) => SlotKind::SouthWest,
                    (true, false, false, false) => SlotKind::SouthEast,
                    (true, false, true, false) => SlotKind::East,
                    (false, true, false, true) => SlotKind::West,
                    (true, true, false, false) => SlotKind::South,
                    (false, false, true, true) => SlotKind::North,
                    _ => continue,
                };
                self.slots.push(Slot {
                    coord: Coord::new(r as i8, c as i8),
                    kind,
                });
            }
        }
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn flip(&self) -> bool {
        self.flip
    }

    /// Cells of the piece, normalized so the minimum coordinate is (0, 0).
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Correction from normalized cells back to the placement coordinate:
    /// the normalized origin lands at `placement.coord - offset`.
    pub fn offset(&self) -> Coord {
        self.offset
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// One bitmask per row, column 0 in the least significant bit.
    ///
    /// ```text
    ///   oo      0b11
    ///   o   ->  0b01
    ///   oo      0b11
    /// ```
    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    /// Like [`rows`](Self::rows), padded by one cell in each orthogonal
    /// direction. Row 0 and bit 0 correspond to row -1 and column -1.
    ///
    /// ```text
    ///            0b0110
    ///   oo       0b1111
    ///   o   ->   0b0111
    ///   oo       0b1111
    ///            0b0110
    /// ```
    pub fn expanded_rows(&self) -> &[u32] {
        &self.expanded_rows
    }

    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// Errors raised while building the catalog from text patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("expected {expected} pieces, found {found}")]
    WrongPieceCount { expected: usize, found: usize },

    #[error("piece {piece}: expected {} rows, found {found}", SHAPE_SIZE)]
    WrongRowCount { piece: usize, found: usize },

    #[error("piece {piece} row {row}: expected {} columns, found {found}", SHAPE_SIZE)]
    WrongColumnCount { piece: usize, row: usize, found: usize },

    #[error("piece {piece}: unexpected character {ch:?} at ({row},{col})")]
    InvalidCell {
        piece: usize,
        row: usize,
        col: usize,
        ch: char,
    },

    #[error("piece {piece} has no cells")]
    Empty { piece: usize },
}

/// A piece shape together with all of its distinct orientations.
#[derive(Debug, Clone)]
pub struct Piece {
    index: usize,
    transforms: [[Vec<Coord>; 2]; 4],
    orientations: Vec<Orientation>,
}

impl Piece {
    /// Build a piece from a 5x5 pattern of `X` (occupied) and `.` (empty).
    pub fn from_pattern(index: usize, pattern: &[&str]) -> Result<Self, CatalogError> {
        if pattern.len() != SHAPE_SIZE {
            return Err(CatalogError::WrongRowCount {
                piece: index,
                found: pattern.len(),
            });
        }

        let mut cells = Vec::new();
        for (i, line) in pattern.iter().enumerate() {
            let found = line.chars().count();
            if found != SHAPE_SIZE {
                return Err(CatalogError::WrongColumnCount {
                    piece: index,
                    row: i,
                    found,
                });
            }
            for (j, ch) in line.chars().enumerate() {
                match ch {
                    'X' => cells.push((i as i8, j as i8)),
                    '.' => {}
                    _ => {
                        return Err(CatalogError::InvalidCell {
                            piece: index,
                            row: i,
                            col: j,
                            ch,
                        });
                    }
                }
            }
        }
        if cells.is_empty() {
            return Err(CatalogError::Empty { piece: index });
        }

        let transforms: [[Vec<Coord>; 2]; 4] = std::array::from_fn(|rotation| {
            std::array::from_fn(|flip| {
                cells
                    .iter()
                    .map(|&(i, j)| {
                        let (mut r, c) = match rotation {
                            0 => (i, j),
                            1 => (-j, i),
                            2 => (-i, -j),
                            _ => (j, -i),
                        };
                        if flip == 1 {
                            r = -r;
                        }
                        Coord::new(r, c)
                    })
                    .collect()
            })
        });

        let mut orientations: Vec<Orientation> = Vec::new();
        for rotation in 0..4u8 {
            for flip in [false, true] {
                let coords = &transforms[rotation as usize][flip as usize];
                let min = Coord::new(
                    coords.iter().map(|c| c.row).min().unwrap_or(0),
                    coords.iter().map(|c| c.col).min().unwrap_or(0),
                );
                let mut normalized: Vec<Coord> = coords.iter().map(|&c| c - min).collect();
                normalized.sort();
                if orientations.iter().any(|o| o.coords == normalized) {
                    continue;
                }
                orientations.push(Orientation::new(
                    rotation,
                    flip,
                    normalized,
                    Coord::default() - min,
                ));
            }
        }

        Ok(Self {
            index,
            transforms,
            orientations,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of cells in the piece.
    pub fn size(&self) -> usize {
        self.transforms[0][0].len()
    }

    /// The transformed cells of the pattern relative to its top-left cell,
    /// before normalization.
    pub fn transform(&self, rotation: u8, flip: bool) -> &[Coord] {
        &self.transforms[rotation as usize % 4][flip as usize]
    }

    pub fn orientations(&self) -> &[Orientation] {
        &self.orientations
    }

    /// The orientation registered for exactly this (rotation, flip), if any.
    pub fn orientation(&self, rotation: u8, flip: bool) -> Option<&Orientation> {
        self.orientations
            .iter()
            .find(|o| o.rotation == rotation && o.flip == flip)
    }

    /// Board cells covered by the placement, or `None` if the (rotation, flip)
    /// pair is out of range or a cell does not fit in a `Coord`.
    pub fn cells(&self, placement: &Placement) -> Option<Vec<Coord>> {
        if placement.rotation > 3 {
            return None;
        }
        self.transform(placement.rotation, placement.flip)
            .iter()
            .map(|&c| c.checked_add(placement.coord))
            .collect()
    }

    /// Rewrite a placement in any of the 8 transforms into the equivalent
    /// placement of the registered orientation covering the same cells.
    pub fn canonicalize(&self, placement: &Placement) -> Option<Placement> {
        let cells = self.cells(placement)?;
        let start = Coord::new(
            cells.iter().map(|c| c.row).min()?,
            cells.iter().map(|c| c.col).min()?,
        );
        let mut normalized: Vec<Coord> = cells.iter().map(|&c| c - start).collect();
        normalized.sort();
        let o = self.orientations.iter().find(|o| o.coords == normalized)?;
        Some(Placement {
            coord: start.checked_add(o.offset)?,
            rotation: o.rotation,
            flip: o.flip,
        })
    }
}

/// The fixed set of piece patterns, smallest first.
pub const PIECE_PATTERNS: &[&[&str]] = &[
    // 1 cell
    &["X....", ".....", ".....", ".....", "....."],
    // 2 cells
    &["XX...", ".....", ".....", ".....", "....."],
    // 3 cells
    &["XX...", ".X...", ".....", ".....", "....."],
    &["XXX..", ".....", ".....", ".....", "....."],
    // 4 cells
    &["XX...", "XX...", ".....", ".....", "....."],
    &[".X...", "XXX..", ".....", ".....", "....."],
    &["XXXX.", ".....", ".....", ".....", "....."],
    &["XXX..", "..X..", ".....", ".....", "....."],
    &["XX...", ".XX..", ".....", ".....", "....."],
    // 5 cells
    &["X....", "XXXX.", ".....", ".....", "....."],
    &["X....", "XXX..", "X....", ".....", "....."],
    &["X....", "X....", "XXX..", ".....", "....."],
    &["XX...", ".XXX.", ".....", ".....", "....."],
    &["X....", "XXX..", "..X..", ".....", "....."],
    &["XXXXX", ".....", ".....", ".....", "....."],
    &["XXX..", ".XX..", ".....", ".....", "....."],
    &["X....", "XX...", ".XX..", ".....", "....."],
    &["XX...", "X....", "XX...", ".....", "....."],
    &["XX...", ".XX..", ".X...", ".....", "....."],
    &[".X...", "XXX..", ".X...", ".....", "....."],
    &["XXXX.", ".X...", ".....", ".....", "....."],
];

/// An immutable, ordered set of pieces.
#[derive(Debug, Clone)]
pub struct Catalog {
    pieces: Vec<Piece>,
}

impl Catalog {
    pub fn from_patterns(patterns: &[&[&str]]) -> Result<Self, CatalogError> {
        if patterns.len() != NUM_PIECES {
            return Err(CatalogError::WrongPieceCount {
                expected: NUM_PIECES,
                found: patterns.len(),
            });
        }
        let pieces = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| Piece::from_pattern(i, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pieces })
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> &Piece {
        &self.pieces[index]
    }
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// The process-wide catalog, built on first use.
///
/// # Panics
/// If [`PIECE_PATTERNS`] is malformed; nothing downstream can work without it.
pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| match Catalog::from_patterns(PIECE_PATTERNS) {
        Ok(catalog) => catalog,
        Err(e) => panic!("malformed piece catalog: {e}"),
    })
}

/// Shorthand for `catalog().piece(index)`.
#[inline]
pub fn piece(index: usize) -> &'static Piece {
    catalog().piece(index)
}
