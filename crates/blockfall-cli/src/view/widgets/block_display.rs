use blockfall_engine::{Block, PieceKind};
use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    widgets::{Paragraph, Widget},
};

use super::style;

/// One board cell, drawn two terminal columns wide so cells look square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDisplay {
    style: Style,
    symbol: &'static str,
}

impl BlockDisplay {
    pub const GHOST: Self = Self::new(style::GHOST, "[]");

    pub const fn new(style: Style, symbol: &'static str) -> Self {
        Self { style, symbol }
    }

    pub const fn width() -> u16 {
        2
    }

    pub const fn height() -> u16 {
        1
    }

    pub const fn from_block(block: Block, show_dots: bool) -> Self {
        match block {
            Block::Empty if show_dots => Self::new(style::EMPTY_DOT, "."),
            Block::Empty => Self::new(style::EMPTY, ""),
            Block::Piece(kind) => Self::piece(kind),
        }
    }

    pub const fn piece(kind: PieceKind) -> Self {
        let style = match kind {
            PieceKind::I => style::I_BLOCK,
            PieceKind::O => style::O_BLOCK,
            PieceKind::S => style::S_BLOCK,
            PieceKind::Z => style::Z_BLOCK,
            PieceKind::J => style::J_BLOCK,
            PieceKind::L => style::L_BLOCK,
            PieceKind::T => style::T_BLOCK,
        };
        Self::new(style, "")
    }
}

impl Widget for BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Paragraph fills the whole area, not only the cells covered by the symbol
        Paragraph::new(self.symbol)
            .style(self.style)
            .centered()
            .render(area, buf);
    }
}
