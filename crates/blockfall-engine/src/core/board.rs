use serde::{Deserialize, Serialize};

use crate::SaveError;

use super::piece::{PieceKind, PieceRotation};

/// Number of columns on the board.
pub const COLUMNS: usize = 10;
/// Number of rows shown to the player.
pub const VISIBLE_ROWS: usize = 20;
/// Rows above the visible area that absorb spawn overflow.
pub const HIDDEN_ROWS: usize = 2;
/// Total number of rows, hidden ones first.
pub const TOTAL_ROWS: usize = VISIBLE_ROWS + HIDDEN_ROWS;

/// A single cell of the board.
///
/// The piece kind of a locked cell is only kept for render-color lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    /// Empty cell (no piece).
    #[default]
    Empty,
    /// Locked piece of a specific type.
    Piece(PieceKind),
}

impl Block {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Block::Empty
    }

    #[must_use]
    pub fn kind(self) -> Option<PieceKind> {
        match self {
            Block::Empty => None,
            Block::Piece(kind) => Some(kind),
        }
    }

    /// Returns the persisted marker: `-1` for empty, else the catalog index.
    #[must_use]
    pub fn to_marker(self) -> i32 {
        match self {
            Block::Empty => -1,
            Block::Piece(kind) => i32::from(kind as u8),
        }
    }

    /// Inverse of [`Self::to_marker`]; `None` for markers outside `-1..7`.
    #[must_use]
    pub fn from_marker(marker: i32) -> Option<Self> {
        if marker == -1 {
            return Some(Block::Empty);
        }
        PieceKind::from_index(marker).map(Block::Piece)
    }
}

/// A single row of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRow {
    cells: [Block; COLUMNS],
}

impl BlockRow {
    pub const EMPTY: Self = Self {
        cells: [Block::Empty; COLUMNS],
    };

    #[must_use]
    pub fn cells(&self) -> &[Block; COLUMNS] {
        &self.cells
    }

    fn is_filled(&self) -> bool {
        self.cells.iter().all(|b| !b.is_empty())
    }
}

/// Occupancy grid exported for persistence.
///
/// `cells` is row-major, `rows * columns` long, holding [`Block::to_marker`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<i32>,
}

/// Fixed-size grid of locked cells.
///
/// # Layout
///
/// - **Columns**: 10, indexed left to right from 0
/// - **Rows**: 22, indexed top to bottom from 0
/// - **Hidden rows**: the top 2 rows are never shown and only absorb spawn overflow
///
/// Piece positions are the top-left corner of the piece's bounding square and may be
/// negative or exceed the grid, as long as every occupied cell of the shape lands
/// inside it.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, PieceKind, PieceRotation};
///
/// let mut board = Board::new();
/// let (x, y) = (PieceKind::T.spawn_column(), PieceKind::T.spawn_row());
/// assert!(board.is_valid_and_empty(PieceKind::T, x, y, PieceRotation::SPAWN));
/// board.place(PieceKind::T, x, y, PieceRotation::SPAWN);
/// assert!(!board.is_valid_and_empty(PieceKind::T, x, y, PieceRotation::SPAWN));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [BlockRow; TOTAL_ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const COLUMNS: usize = COLUMNS;
    pub const VISIBLE_ROWS: usize = VISIBLE_ROWS;
    pub const HIDDEN_ROWS: usize = HIDDEN_ROWS;
    pub const TOTAL_ROWS: usize = TOTAL_ROWS;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: [BlockRow::EMPTY; TOTAL_ROWS],
        }
    }

    /// Returns the block at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Block> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.rows.get(y)?.cells.get(x).copied()
    }

    fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|b| !b.is_empty())
    }

    /// Returns an iterator over all rows, hidden rows first.
    pub fn rows(&self) -> impl Iterator<Item = &BlockRow> {
        self.rows.iter()
    }

    /// Returns an iterator over the rows shown to the player.
    pub fn visible_rows(&self) -> impl Iterator<Item = &BlockRow> {
        self.rows[HIDDEN_ROWS..].iter()
    }

    /// Checks whether every occupied cell of the piece at `(x, y)` lies inside the grid.
    ///
    /// The test uses the rotation's insets, so structurally empty columns and rows of
    /// the bounding square may hang outside the grid.
    #[must_use]
    pub fn is_in_bounds(kind: PieceKind, x: i32, y: i32, rotation: PieceRotation) -> bool {
        let insets = kind.insets(rotation);
        let last = kind.dimension() as i32 - 1;

        let columns_ok =
            x + (insets.left as i32) >= 0 && x + last - (insets.right as i32) < COLUMNS as i32;
        let rows_ok =
            y + (insets.top as i32) >= 0 && y + last - (insets.bottom as i32) < TOTAL_ROWS as i32;
        columns_ok && rows_ok
    }

    /// Checks whether the piece fits at `(x, y)` in the given rotation: inside the
    /// grid and not overlapping any locked cell.
    #[must_use]
    pub fn is_valid_and_empty(&self, kind: PieceKind, x: i32, y: i32, rotation: PieceRotation) -> bool {
        if !Self::is_in_bounds(kind, x, y, rotation) {
            return false;
        }
        kind.occupied_cells(rotation)
            .all(|(dx, dy)| !self.is_occupied(x + dx as i32, y + dy as i32))
    }

    /// Writes `kind` into every occupied cell of the piece at `(x, y)`.
    ///
    /// Existing cells are overwritten; the caller validates the position with
    /// [`Self::is_valid_and_empty`] first.
    pub fn place(&mut self, kind: PieceKind, x: i32, y: i32, rotation: PieceRotation) {
        for (dx, dy) in kind.occupied_cells(rotation) {
            let cell = usize::try_from(x + dx as i32)
                .ok()
                .zip(usize::try_from(y + dy as i32).ok())
                .and_then(|(bx, by)| self.rows.get_mut(by)?.cells.get_mut(bx));
            debug_assert!(cell.is_some(), "placing piece outside of the board");
            if let Some(cell) = cell {
                *cell = Block::Piece(kind);
            }
        }
    }

    /// Clears filled lines and returns the number of lines cleared.
    ///
    /// Rows are scanned once from top to bottom. Each filled row is removed by
    /// shifting every row above it down by one and inserting an empty row at the top.
    pub fn clear_full_lines(&mut self) -> usize {
        let mut count = 0;
        for y in 0..TOTAL_ROWS {
            if self.rows[y].is_filled() {
                self.rows.copy_within(0..y, 1);
                self.rows[0] = BlockRow::EMPTY;
                count += 1;
            }
        }
        count
    }

    /// Resets every cell to empty.
    pub fn clear(&mut self) {
        self.rows.fill(BlockRow::EMPTY);
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            rows: TOTAL_ROWS,
            columns: COLUMNS,
            cells: self
                .rows
                .iter()
                .flat_map(|row| row.cells.iter().map(|b| b.to_marker()))
                .collect(),
        }
    }

    /// Builds a board from a snapshot, validating its size and every marker.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Self, SaveError> {
        if snapshot.rows != TOTAL_ROWS
            || snapshot.columns != COLUMNS
            || snapshot.cells.len() != TOTAL_ROWS * COLUMNS
        {
            return Err(SaveError::BoardSizeMismatch {
                rows: snapshot.rows,
                columns: snapshot.columns,
            });
        }
        let mut board = Self::new();
        for (index, &value) in snapshot.cells.iter().enumerate() {
            let block = Block::from_marker(value).ok_or(SaveError::InvalidCell { index, value })?;
            board.rows[index / COLUMNS].cells[index % COLUMNS] = block;
        }
        Ok(board)
    }

    /// Replaces the whole grid with the snapshot. On error the board is unchanged.
    pub fn restore(&mut self, snapshot: &BoardSnapshot) -> Result<(), SaveError> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, y: usize, kind: PieceKind) {
        board.rows[y].cells = [Block::Piece(kind); COLUMNS];
    }

    #[test]
    fn test_initial_board() {
        let board = Board::new();
        assert_eq!(board.rows().count(), TOTAL_ROWS);
        assert_eq!(board.visible_rows().count(), VISIBLE_ROWS);
        assert!(board.rows().all(|row| row.cells().iter().all(|b| b.is_empty())));
    }

    #[test]
    fn test_block_marker_conversion() {
        assert_eq!(Block::Empty.to_marker(), -1);
        assert_eq!(Block::Piece(PieceKind::Z).to_marker(), 6);
        assert_eq!(Block::from_marker(-1), Some(Block::Empty));
        assert_eq!(Block::from_marker(3), Some(Block::Piece(PieceKind::O)));
        assert_eq!(Block::from_marker(7), None);
        assert_eq!(Block::from_marker(-2), None);
    }

    #[test]
    fn test_out_of_bounds_is_never_valid() {
        let board = Board::new();
        for kind in PieceKind::ALL {
            for rotation in PieceRotation::ALL {
                for x in -6..(COLUMNS as i32 + 6) {
                    for y in -6..(TOTAL_ROWS as i32 + 6) {
                        let inside = kind.occupied_cells(rotation).all(|(dx, dy)| {
                            let (bx, by) = (x + dx as i32, y + dy as i32);
                            (0..COLUMNS as i32).contains(&bx) && (0..TOTAL_ROWS as i32).contains(&by)
                        });
                        assert_eq!(
                            board.is_valid_and_empty(kind, x, y, rotation),
                            inside,
                            "{kind:?} {rotation:?} at ({x}, {y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_in_bounds_ignores_locked_cells() {
        let mut board = Board::new();
        board.place(PieceKind::O, 4, 0, PieceRotation::SPAWN);
        assert!(Board::is_in_bounds(PieceKind::O, 4, 0, PieceRotation::SPAWN));
        assert!(!board.is_valid_and_empty(PieceKind::O, 4, 0, PieceRotation::SPAWN));
        assert!(!Board::is_in_bounds(PieceKind::O, 9, 0, PieceRotation::SPAWN));
    }

    #[test]
    fn test_collision_with_locked_cell() {
        let mut board = Board::new();
        board.place(PieceKind::O, 0, 20, PieceRotation::SPAWN);
        assert!(!board.is_valid_and_empty(PieceKind::O, 1, 19, PieceRotation::SPAWN));
        assert!(board.is_valid_and_empty(PieceKind::O, 2, 20, PieceRotation::SPAWN));
        assert!(board.is_valid_and_empty(PieceKind::O, 0, 18, PieceRotation::SPAWN));
    }

    #[test]
    fn test_place_writes_kind() {
        let mut board = Board::new();
        // Vertical I in rotation 1 occupies local column 2.
        board.place(PieceKind::I, 0, 18, PieceRotation::ALL[1]);
        for y in 18..22 {
            assert_eq!(board.get(2, y), Some(Block::Piece(PieceKind::I)));
            assert_eq!(board.get(1, y), Some(Block::Empty));
        }
    }

    #[test]
    fn test_clear_lines_basic() {
        let mut board = Board::new();
        fill_row(&mut board, TOTAL_ROWS - 1, PieceKind::I);
        assert_eq!(board.clear_full_lines(), 1);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_clear_lines_with_partial_lines() {
        let mut board = Board::new();
        let y = TOTAL_ROWS - 1;
        for x in 0..COLUMNS - 1 {
            board.rows[y].cells[x] = Block::Piece(PieceKind::I);
        }
        assert_eq!(board.clear_full_lines(), 0);
        let occupied = board.rows[y].cells.iter().filter(|b| !b.is_empty()).count();
        assert_eq!(occupied, COLUMNS - 1);
    }

    #[test]
    fn test_clear_lines_shifts_rows_above() {
        let mut board = Board::new();
        let bottom = TOTAL_ROWS - 1;
        // Incomplete row at the bottom, three full rows above it, marker rows above those.
        board.rows[bottom].cells[0] = Block::Piece(PieceKind::J);
        for y in bottom - 3..bottom {
            fill_row(&mut board, y, PieceKind::I);
        }
        board.rows[bottom - 4].cells[3] = Block::Piece(PieceKind::S);
        board.rows[bottom - 5].cells[7] = Block::Piece(PieceKind::T);

        assert_eq!(board.clear_full_lines(), 3);

        assert_eq!(board.get(0, bottom as i32), Some(Block::Piece(PieceKind::J)));
        assert_eq!(board.rows[bottom - 1].cells[3], Block::Piece(PieceKind::S));
        assert_eq!(board.rows[bottom - 2].cells[7], Block::Piece(PieceKind::T));
        let occupied: usize = board
            .rows()
            .map(|row| row.cells().iter().filter(|b| !b.is_empty()).count())
            .sum();
        assert_eq!(occupied, 3);
    }

    #[test]
    fn test_clear_lines_non_adjacent() {
        let mut board = Board::new();
        fill_row(&mut board, 10, PieceKind::L);
        fill_row(&mut board, 15, PieceKind::L);
        board.rows[12].cells[4] = Block::Piece(PieceKind::Z);
        board.rows[5].cells[1] = Block::Piece(PieceKind::O);

        assert_eq!(board.clear_full_lines(), 2);
        // Row 12 sat between the cleared rows and drops by one.
        assert_eq!(board.rows[13].cells[4], Block::Piece(PieceKind::Z));
        // Row 5 sat above both cleared rows and drops by two.
        assert_eq!(board.rows[7].cells[1], Block::Piece(PieceKind::O));
    }

    #[test]
    fn test_clear_lines_is_idempotent() {
        let mut board = Board::new();
        fill_row(&mut board, 20, PieceKind::T);
        fill_row(&mut board, 21, PieceKind::T);
        board.rows[19].cells[0] = Block::Piece(PieceKind::T);
        assert_eq!(board.clear_full_lines(), 2);
        assert_eq!(board.clear_full_lines(), 0);
    }

    #[test]
    fn test_clear_lines_top_row_becomes_empty() {
        let mut board = Board::new();
        board.rows[0].cells[5] = Block::Piece(PieceKind::S);
        fill_row(&mut board, 1, PieceKind::I);
        assert_eq!(board.clear_full_lines(), 1);
        assert_eq!(board.rows[0], BlockRow::EMPTY);
        assert_eq!(board.rows[1].cells[5], Block::Piece(PieceKind::S));
    }

    #[test]
    fn test_clear_resets_every_cell() {
        let mut board = Board::new();
        fill_row(&mut board, 3, PieceKind::O);
        board.clear();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut board = Board::new();
        board.place(PieceKind::L, 3, 19, PieceRotation::ALL[2]);
        let snapshot = board.snapshot();
        assert_eq!(snapshot.cells.len(), TOTAL_ROWS * COLUMNS);

        let mut restored = Board::new();
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored, board);
    }

    #[test]
    fn test_restore_rejects_bad_snapshot() {
        let mut board = Board::new();
        board.place(PieceKind::O, 0, 20, PieceRotation::SPAWN);
        let before = board.clone();

        let mut snapshot = Board::new().snapshot();
        snapshot.cells[5] = 9;
        assert!(matches!(
            board.restore(&snapshot),
            Err(SaveError::InvalidCell { index: 5, value: 9 })
        ));
        assert_eq!(board, before);

        let snapshot = BoardSnapshot {
            rows: 20,
            columns: 10,
            cells: vec![-1; 200],
        };
        assert!(matches!(
            board.restore(&snapshot),
            Err(SaveError::BoardSizeMismatch { rows: 20, columns: 10 })
        ));
        assert_eq!(board, before);
    }
}
