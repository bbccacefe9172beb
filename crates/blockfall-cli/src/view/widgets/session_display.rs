use blockfall_engine::{ActivePiece, GameSession, SessionState};
use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Widget},
};

use super::{BoardDisplay, PieceDisplay, SessionStatsDisplay, color, style};

/// Board, next-piece preview and counters of a session, with a banner for every
/// state other than [`SessionState::Playing`].
#[derive(Debug)]
pub struct SessionDisplay<'a> {
    session: &'a GameSession,
    horizontal_padding: u16,
    vertical_padding: u16,
}

impl<'a> SessionDisplay<'a> {
    pub fn new(session: &'a GameSession) -> Self {
        Self {
            session,
            horizontal_padding: 1,
            vertical_padding: 0,
        }
    }

    pub fn height(&self) -> u16 {
        BoardDisplay::new(self.session.board())
            .block(Block::bordered())
            .height()
    }

    fn banner(&self) -> Option<(&'static str, Style)> {
        match self.session.state() {
            SessionState::Playing => None,
            SessionState::NewGame => Some((
                "PRESS ENTER TO START",
                Style::new().fg(color::BLACK).bg(color::CYAN),
            )),
            SessionState::Paused => {
                Some(("PAUSED", Style::new().fg(color::BLACK).bg(color::YELLOW)))
            }
            SessionState::GameOver => {
                Some(("GAME OVER!!", Style::new().fg(color::WHITE).bg(color::RED)))
            }
        }
    }
}

impl Widget for SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let block_padding = Padding::symmetric(self.horizontal_padding, self.vertical_padding);
        let border_style = match session.state() {
            SessionState::NewGame => color::CYAN,
            SessionState::Playing => color::WHITE,
            SessionState::Paused => color::YELLOW,
            SessionState::GameOver => color::RED,
        };
        let panel = |title: &'static str| {
            Block::bordered()
                .title(Line::from(title).centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style::DEFAULT)
        };

        let game_board = {
            let widget = BoardDisplay::new(session.board()).block(
                Block::bordered()
                    .border_style(border_style)
                    .style(style::DEFAULT),
            );
            let active = *session.active_piece();
            match session.state() {
                SessionState::NewGame => widget,
                SessionState::GameOver => widget.active_piece(active),
                SessionState::Playing | SessionState::Paused => {
                    let ghost = ActivePiece {
                        row: session.ghost_row(),
                        ..active
                    };
                    widget.ghost(ghost).active_piece(active)
                }
            }
        };
        let next_panel = {
            let panel = PieceDisplay::new().block(panel("NEXT"));
            if session.is_new_game() {
                panel
            } else {
                panel.piece(session.next_kind())
            }
        };
        let stats_panel = SessionStatsDisplay::new(session).block(panel("STATS"));

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(stats_panel.width()),
            Constraint::Length(game_board.width()),
            Constraint::Length(next_panel.width()),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [stats_area] =
            Layout::vertical([Constraint::Length(stats_panel.height())]).areas(left_column);
        let [board_area] =
            Layout::vertical([Constraint::Length(game_board.height())]).areas(center_column);
        let [next_area] =
            Layout::vertical([Constraint::Length(next_panel.height())]).areas(right_column);

        let board_width = game_board.width();
        stats_panel.render(stats_area, buf);
        game_board.render(board_area, buf);
        next_panel.render(next_area, buf);

        if let Some((text, style)) = self.banner() {
            let block = Block::new().style(style);
            let text = Text::styled(text, style).centered();
            let area = board_area.centered(Constraint::Length(board_width), Constraint::Length(3));
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.render(inner.centered_vertically(Constraint::Length(1)), buf);
        }
    }
}
