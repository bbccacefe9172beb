/// Per-game counters shown next to the board.
///
/// Score lives on [`GameSession`](crate::GameSession) because it is part of the save
/// record; these counters are display only and start from zero after a load.
///
/// # Example
///
/// ```
/// use blockfall_engine::SessionStats;
///
/// let mut stats = SessionStats::new();
/// stats.complete_piece_drop(4);
/// stats.complete_piece_drop(0);
///
/// assert_eq!(stats.completed_pieces(), 2);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    /// Returns the number of pieces locked into the board.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns how many locks cleared 0, 1, 2, 3 and 4 lines.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Records one locked piece.
    pub const fn complete_piece_drop(&mut self, cleared_lines: usize) {
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        if cleared_lines < self.line_cleared_counter.len() {
            self.line_cleared_counter[cleared_lines] += 1;
        }
    }
}
