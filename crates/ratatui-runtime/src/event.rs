use std::time::Instant;

use crossterm::event::Event as CrosstermEvent;

/// Events processed by TUI applications.
#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum TuiEvent {
    /// Frame timing (based on `tick_interval`), with the time the tick fired.
    #[from(ignore)]
    Tick(Instant),
    /// Screen render timing (based on `render_mode`).
    Render,
    /// Terminal events such as key input, mouse, and resize.
    Crossterm(CrosstermEvent),
}
