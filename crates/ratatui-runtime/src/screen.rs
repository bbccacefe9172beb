use std::{fmt, time::Instant};

use crossterm::event::Event;
use ratatui::Frame;

use crate::{App, Runtime};

/// One screen of an application driven by [`ScreenStack`].
///
/// Only the topmost screen of the stack receives events, ticks and draw calls.
///
/// # Lifecycle
///
/// ```text
/// constructed
///   ↓
/// on_active()  ←──────────┐
///   ↓                      │ screen above it is popped
/// (foreground)             │
///   ↓                      │
/// on_inactive() ───────────┘ another screen is pushed on top
///   ↓
/// on_close()   only when popped, replaced or on exit
/// ```
///
/// Runtime settings such as the tick rate belong in [`on_active`], so they are
/// restored whenever the screen returns to the foreground.
///
/// ```rust
/// use std::time::Instant;
///
/// use crossterm::event::Event;
/// use ratatui::Frame;
/// use ratatui_runtime::{RenderMode, Runtime, Screen, ScreenTransition};
///
/// #[derive(Debug)]
/// struct Countdown {
///     frames: u32,
/// }
///
/// impl Screen for Countdown {
///     fn on_active(&mut self, runtime: &mut Runtime) {
///         runtime.set_tick_rate(Some(50.0));
///         runtime.set_render_mode(RenderMode::throttled_from_rate(50.0));
///     }
///
///     fn on_inactive(&mut self, _runtime: &mut Runtime) {}
///     fn on_close(&mut self, _runtime: &mut Runtime) {}
///
///     fn handle_event(&mut self, _runtime: &mut Runtime, _event: &Event) -> ScreenTransition {
///         ScreenTransition::Exit
///     }
///
///     fn update(&mut self, _runtime: &mut Runtime, _now: Instant) {
///         self.frames = self.frames.saturating_sub(1);
///     }
///
///     fn draw(&self, _frame: &mut Frame) {}
/// }
/// ```
///
/// [`on_active`]: Self::on_active
pub trait Screen: fmt::Debug {
    /// Called when the screen reaches the top of the stack.
    fn on_active(&mut self, runtime: &mut Runtime);

    /// Called when the screen leaves the top of the stack, either covered by a pushed
    /// screen or before [`on_close`](Self::on_close).
    fn on_inactive(&mut self, runtime: &mut Runtime);

    /// Called once when the screen is removed from the stack.
    fn on_close(&mut self, runtime: &mut Runtime);

    /// Handles a terminal event and returns the stack transition to apply.
    fn handle_event(&mut self, runtime: &mut Runtime, event: &Event) -> ScreenTransition;

    /// Advances the screen to `now` (called on each tick).
    fn update(&mut self, runtime: &mut Runtime, now: Instant);

    /// Renders the screen.
    fn draw(&self, frame: &mut Frame);
}

/// Stack change requested by the foreground screen.
#[derive(Debug)]
pub enum ScreenTransition {
    Stay,
    /// Covers the current screen with a new one.
    Push(Box<dyn Screen>),
    /// Closes the current screen and reactivates the one below.
    Pop,
    /// Closes the current screen and activates a new one in its place.
    Replace(Box<dyn Screen>),
    /// Closes every screen and ends the run.
    Exit,
}

/// Stack of screens, runnable as an [`App`].
#[derive(Debug)]
pub struct ScreenStack<'a> {
    screens: Vec<Box<dyn Screen + 'a>>,
    should_exit: bool,
}

impl<'a> ScreenStack<'a> {
    #[must_use]
    pub fn new(initial: Box<dyn Screen + 'a>) -> Self {
        Self {
            screens: vec![initial],
            should_exit: false,
        }
    }

    fn close_top(&mut self, runtime: &mut Runtime) {
        if let Some(mut screen) = self.screens.pop() {
            screen.on_inactive(runtime);
            screen.on_close(runtime);
        }
    }

    fn apply_transition(&mut self, runtime: &mut Runtime, transition: ScreenTransition) {
        match transition {
            ScreenTransition::Stay => {}
            ScreenTransition::Push(mut screen) => {
                if let Some(current) = self.screens.last_mut() {
                    current.on_inactive(runtime);
                }
                screen.on_active(runtime);
                self.screens.push(screen);
            }
            ScreenTransition::Pop => {
                self.close_top(runtime);
                if let Some(previous) = self.screens.last_mut() {
                    previous.on_active(runtime);
                }
            }
            ScreenTransition::Replace(mut screen) => {
                self.close_top(runtime);
                screen.on_active(runtime);
                self.screens.push(screen);
            }
            ScreenTransition::Exit => {
                while !self.screens.is_empty() {
                    self.close_top(runtime);
                }
                self.should_exit = true;
            }
        }
    }
}

impl App for ScreenStack<'_> {
    fn init(&mut self, runtime: &mut Runtime) {
        if let Some(screen) = self.screens.last_mut() {
            screen.on_active(runtime);
        }
    }

    fn should_exit(&self) -> bool {
        self.should_exit || self.screens.is_empty()
    }

    fn handle_event(&mut self, runtime: &mut Runtime, event: Event) {
        if let Some(current) = self.screens.last_mut() {
            let transition = current.handle_event(runtime, &event);
            self.apply_transition(runtime, transition);
        }
    }

    fn draw(&self, frame: &mut Frame) {
        if let Some(current) = self.screens.last() {
            current.draw(frame);
        }
    }

    fn update(&mut self, runtime: &mut Runtime, now: Instant) {
        if let Some(current) = self.screens.last_mut() {
            current.update(runtime, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct CallLog(Rc<RefCell<Vec<String>>>);

    impl CallLog {
        fn push(&self, entry: String) {
            self.0.borrow_mut().push(entry);
        }

        fn take(&self) -> Vec<String> {
            self.0.take()
        }
    }

    #[derive(Debug)]
    struct LoggingScreen {
        name: &'static str,
        log: CallLog,
        on_event: Option<ScreenTransition>,
        start: Option<Instant>,
    }

    impl LoggingScreen {
        fn boxed(name: &'static str, log: &CallLog) -> Box<Self> {
            Box::new(Self {
                name,
                log: log.clone(),
                on_event: None,
                start: None,
            })
        }

        fn on_event(mut self: Box<Self>, transition: ScreenTransition) -> Box<Self> {
            self.on_event = Some(transition);
            self
        }
    }

    impl Screen for LoggingScreen {
        fn on_active(&mut self, _runtime: &mut Runtime) {
            self.log.push(format!("{} active", self.name));
        }

        fn on_inactive(&mut self, _runtime: &mut Runtime) {
            self.log.push(format!("{} inactive", self.name));
        }

        fn on_close(&mut self, _runtime: &mut Runtime) {
            self.log.push(format!("{} close", self.name));
        }

        fn handle_event(&mut self, _runtime: &mut Runtime, _event: &Event) -> ScreenTransition {
            self.log.push(format!("{} event", self.name));
            self.on_event.take().unwrap_or(ScreenTransition::Stay)
        }

        fn update(&mut self, _runtime: &mut Runtime, now: Instant) {
            let start = *self.start.get_or_insert(now);
            let elapsed = now.duration_since(start).as_millis();
            self.log.push(format!("{} update +{elapsed}ms", self.name));
        }

        fn draw(&self, _frame: &mut Frame) {}
    }

    fn key() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE))
    }

    fn stack_of(screens: Vec<Box<LoggingScreen>>, runtime: &mut Runtime) -> ScreenStack<'static> {
        let mut screens = screens.into_iter();
        let mut stack = ScreenStack::new(screens.next().unwrap());
        stack.init(runtime);
        for screen in screens {
            stack.apply_transition(runtime, ScreenTransition::Push(screen));
        }
        stack
    }

    #[test]
    fn test_push_and_pop() {
        let log = CallLog::default();
        let mut runtime = Runtime::new();
        let mut stack = stack_of(vec![LoggingScreen::boxed("A", &log)], &mut runtime);
        assert_eq!(log.take(), ["A active"]);

        stack.apply_transition(
            &mut runtime,
            ScreenTransition::Push(LoggingScreen::boxed("B", &log).on_event(ScreenTransition::Pop)),
        );
        assert_eq!(log.take(), ["A inactive", "B active"]);

        stack.handle_event(&mut runtime, key());
        assert_eq!(log.take(), ["B event", "B inactive", "B close", "A active"]);
        assert!(!stack.should_exit());
    }

    #[test]
    fn test_replace_closes_current() {
        let log = CallLog::default();
        let mut runtime = Runtime::new();
        let mut stack = stack_of(vec![LoggingScreen::boxed("A", &log)], &mut runtime);
        log.take();

        stack.apply_transition(
            &mut runtime,
            ScreenTransition::Replace(LoggingScreen::boxed("B", &log)),
        );
        assert_eq!(log.take(), ["A inactive", "A close", "B active"]);
    }

    #[test]
    fn test_exit_closes_every_screen() {
        let log = CallLog::default();
        let mut runtime = Runtime::new();
        let mut stack = stack_of(
            vec![LoggingScreen::boxed("A", &log), LoggingScreen::boxed("B", &log)],
            &mut runtime,
        );
        log.take();

        stack.apply_transition(&mut runtime, ScreenTransition::Exit);
        assert_eq!(
            log.take(),
            ["B inactive", "B close", "A inactive", "A close"]
        );
        assert!(stack.should_exit());
    }

    #[test]
    fn test_popping_last_screen_exits() {
        let log = CallLog::default();
        let mut runtime = Runtime::new();
        let mut stack = stack_of(
            vec![LoggingScreen::boxed("A", &log).on_event(ScreenTransition::Pop)],
            &mut runtime,
        );
        assert!(!stack.should_exit());

        stack.handle_event(&mut runtime, key());
        assert!(stack.should_exit());
    }

    #[test]
    fn test_only_top_screen_is_driven() {
        let log = CallLog::default();
        let mut runtime = Runtime::new();
        let mut stack = stack_of(
            vec![LoggingScreen::boxed("A", &log), LoggingScreen::boxed("B", &log)],
            &mut runtime,
        );
        log.take();

        let start = Instant::now();
        stack.update(&mut runtime, start);
        stack.handle_event(&mut runtime, key());
        stack.update(&mut runtime, start + Duration::from_millis(20));
        assert_eq!(
            log.take(),
            ["B update +0ms", "B event", "B update +20ms"]
        );
    }
}
