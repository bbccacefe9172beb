use std::iter;

use blockfall_engine::{ActivePiece, Block, Board};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt, Widget},
};

use super::BlockDisplay;

type Grid = [[BlockDisplay; Board::COLUMNS]; Board::VISIBLE_ROWS];

/// Visible part of the playfield with the active piece and its landing preview.
///
/// The hidden rows above the playfield are never drawn, also when a piece overlaps them.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    board: &'a Board,
    ghost: Option<ActivePiece>,
    active_piece: Option<ActivePiece>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            ghost: None,
            active_piece: None,
            block: None,
        }
    }

    pub fn ghost(self, piece: ActivePiece) -> Self {
        Self {
            ghost: Some(piece),
            ..self
        }
    }

    pub fn active_piece(self, piece: ActivePiece) -> Self {
        Self {
            active_piece: Some(piece),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    pub fn width(&self) -> u16 {
        Board::COLUMNS as u16 * BlockDisplay::width()
            + super::block_horizontal_margin(self.block.as_ref())
    }

    #[expect(clippy::cast_possible_truncation)]
    pub fn height(&self) -> u16 {
        Board::VISIBLE_ROWS as u16 * BlockDisplay::height()
            + super::block_vertical_margin(self.block.as_ref())
    }

    fn grid(&self) -> Grid {
        let empty = BlockDisplay::from_block(Block::Empty, true);
        let mut grid = [[empty; Board::COLUMNS]; Board::VISIBLE_ROWS];
        for (grid_row, row) in iter::zip(&mut grid, self.board.visible_rows()) {
            for (cell, block) in iter::zip(grid_row, row.cells()) {
                *cell = BlockDisplay::from_block(*block, true);
            }
        }
        if let Some(ghost) = self.ghost {
            paint(&mut grid, ghost, BlockDisplay::GHOST);
        }
        if let Some(piece) = self.active_piece {
            paint(&mut grid, piece, BlockDisplay::piece(piece.kind));
        }
        grid
    }
}

fn paint(grid: &mut Grid, piece: ActivePiece, display: BlockDisplay) {
    for (x, y) in piece.occupied_positions() {
        if let Some((x, y)) = visible_cell(x, y) {
            grid[y][x] = display;
        }
    }
}

/// Maps board coordinates to a cell of the visible grid.
fn visible_cell(x: i32, y: i32) -> Option<(usize, usize)> {
    let x = usize::try_from(x).ok()?;
    let y = usize::try_from(y).ok()?.checked_sub(Board::HIDDEN_ROWS)?;
    (x < Board::COLUMNS && y < Board::VISIBLE_ROWS).then_some((x, y))
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints =
            (0..Board::COLUMNS).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..Board::VISIBLE_ROWS).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_cells = area
            .layout::<{ Board::VISIBLE_ROWS }>(&vertical)
            .into_iter()
            .map(|row| row.layout::<{ Board::COLUMNS }>(&horizontal));

        for (grid_row, row) in iter::zip(grid_cells, self.grid()) {
            for (grid_cell, block) in iter::zip(grid_row, row) {
                block.render(grid_cell, buf);
            }
        }
    }
}
