use std::time::Instant;

use crossterm::event::Event;
use ratatui::Frame;

use crate::Runtime;

/// Application driven by [`Runtime::run`].
///
/// Most applications use [`ScreenStack`](crate::ScreenStack) instead of implementing
/// this directly.
pub trait App {
    /// Called once before the first event. Configure tick rate and render mode here.
    fn init(&mut self, runtime: &mut Runtime);

    fn should_exit(&self) -> bool;

    /// Handles terminal input, resizes and other crossterm events.
    fn handle_event(&mut self, runtime: &mut Runtime, event: Event);

    fn draw(&self, frame: &mut Frame);

    /// Advances the application to `now`, the time the current tick fired.
    ///
    /// Applications should take time from here rather than from the system clock.
    fn update(&mut self, runtime: &mut Runtime, now: Instant);
}
