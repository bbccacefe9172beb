use blockfall_engine::{Block, PieceKind, PieceRotation};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use super::BlockDisplay;

/// Preview of a piece in its spawn rotation, trimmed to the piece's preview extent.
#[derive(Debug)]
pub struct PieceDisplay<'a> {
    piece: Option<PieceKind>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            piece: None,
            block: None,
        }
    }

    pub fn piece(self, piece: PieceKind) -> Self {
        Self {
            piece: Some(piece),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    /// Width of the widest preview.
    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    /// Height of the tallest preview.
    pub fn height(&self) -> u16 {
        2 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

/// Returns the occupied cells of `kind` relative to the top-left of its preview extent.
fn preview_cells(kind: PieceKind) -> impl Iterator<Item = (usize, usize)> {
    let insets = kind.insets(PieceRotation::SPAWN);
    let (cols, rows) = kind.preview_size();
    kind.occupied_cells(PieceRotation::SPAWN)
        .map(move |(x, y)| (x - insets.left, y - insets.top))
        .filter(move |&(x, y)| x < cols && y < rows)
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    #[expect(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let Some(piece) = self.piece else {
            return;
        };
        let (cols, rows) = piece.preview_size();
        let piece_area = area.centered(
            Constraint::Length(cols as u16 * BlockDisplay::width()),
            Constraint::Length(rows as u16 * BlockDisplay::height()),
        );

        let col_constraints = (0..cols).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..rows).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid: Vec<_> = piece_area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal))
            .collect();

        let empty_block = BlockDisplay::from_block(Block::Empty, false);
        for cell in grid.iter().flatten() {
            Widget::render(&empty_block, *cell, buf);
        }
        let occupied_block = BlockDisplay::piece(piece);
        for (x, y) in preview_cells(piece) {
            Widget::render(&occupied_block, grid[y][x], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cells_fill_extent() {
        for kind in PieceKind::ALL {
            let (cols, rows) = kind.preview_size();
            let cells: Vec<_> = preview_cells(kind).collect();
            assert_eq!(cells.len(), 4, "{kind:?} shows every cell");
            assert!(cells.iter().any(|&(x, _)| x == 0), "{kind:?} touches the left edge");
            assert!(cells.iter().any(|&(_, y)| y == 0), "{kind:?} touches the top edge");
            assert!(cells.iter().any(|&(x, _)| x == cols - 1), "{kind:?} touches the right edge");
            assert!(cells.iter().any(|&(_, y)| y == rows - 1), "{kind:?} touches the bottom edge");
        }
    }
}
