//! Constants for board geometry, the piece catalog, and search parameters.
//!
//! The board is stored as one `u32` bitmask per row, so every row must fit
//! in 32 bits. Column 0 is the least significant bit.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of rows on the board.
pub const NUM_ROWS: usize = 20;

/// Number of columns on the board.
pub const NUM_COLS: usize = 20;

/// Mask with one bit set for every column of a row.
pub const ROW_MASK: u32 = (1 << NUM_COLS) - 1;

/// Total number of cells, used to size flattened per-cell tables.
pub const NUM_CELLS: usize = NUM_ROWS * NUM_COLS;

const _: () = assert!(NUM_COLS <= 32, "a board row must fit in a u32");

// =============================================================================
// Pieces and Placements
// =============================================================================

/// Number of pieces each color owns.
pub const NUM_PIECES: usize = 21;

/// Shapes are given on a square grid of this side length.
pub const SHAPE_SIZE: usize = 5;

/// Index of the single-cell piece in the catalog.
pub const MONOMINO: usize = 0;

const _: () = assert!(NUM_PIECES <= 32, "per-slot piece caches are u32 masks");

/// Placement coordinates can exceed the board by up to an orientation offset.
pub const PLACEMENT_SPAN: usize =
    (if NUM_ROWS > NUM_COLS { NUM_ROWS } else { NUM_COLS }) + SHAPE_SIZE - 1;

/// Size of the seen-set used to deduplicate placements during enumeration:
/// every (row, col) in the placement span, times 4 rotations, times 2 flips.
pub const MAX_PLACEMENT_HASH: usize = PLACEMENT_SPAN * PLACEMENT_SPAN * 8;

// =============================================================================
// Scoring
// =============================================================================

/// Bonus for a color that placed every piece.
pub const ALL_PLACED_BONUS: i32 = 15;

/// Bonus for a color that placed every piece, finishing with the monomino.
pub const MONOMINO_LAST_BONUS: i32 = 20;

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Default exploration constant for UCB1 (close to sqrt(2)).
pub const DEFAULT_EXPLORATION: f64 = 1.4;

/// Default number of search iterations per move.
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Default number of rollouts run from each selected node.
pub const DEFAULT_ROLLOUTS_PER_ITERATION: usize = 1;

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 1;
