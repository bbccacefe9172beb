use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};

use crate::{
    App,
    event::TuiEvent,
    event_loop::{EventLoop, RenderMode},
    scheduler::Scheduler,
};

/// Drives an [`App`] from the event loop until it asks to exit.
///
/// The runtime owns all waiting: between events it blocks in its [`Scheduler`],
/// and every tick hands the application the time it fired at.
#[derive(Default, Debug)]
pub struct Runtime {
    events: EventLoop,
}

impl Runtime {
    /// Creates a runtime on the terminal and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runtime that takes time and events from `scheduler`.
    #[must_use]
    pub fn with_scheduler(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            events: EventLoop::with_scheduler(scheduler),
        }
    }

    /// Returns the current time of the runtime's scheduler.
    ///
    /// Event handlers use this to timestamp input that arrives between ticks.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.events.now()
    }

    /// Sets the update rate in ticks per second; `None` stops ticking.
    pub fn set_tick_rate(&mut self, rate: Option<f64>) {
        self.set_tick_interval(rate.map(|rate| Duration::from_secs_f64(1.0 / rate)));
    }

    pub fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.events.set_tick_interval(interval);
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.events.set_render_mode(mode);
    }

    /// Runs `app` on the terminal, restoring the terminal when it exits.
    ///
    /// Calls [`App::init`] once, then dispatches events until [`App::should_exit`]:
    /// ticks go to [`App::update`], renders to [`App::draw`] and terminal input to
    /// [`App::handle_event`].
    ///
    /// Terminals that support the keyboard enhancement protocol are asked to report
    /// key repeats and releases for the duration of the run.
    pub fn run<A>(mut self, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        ratatui::run(|terminal| {
            let enhanced = supports_keyboard_enhancement().unwrap_or(false);
            if enhanced {
                execute!(
                    io::stdout(),
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )?;
            }
            let result = self.drive(app, |app| {
                terminal.draw(|frame| app.draw(frame))?;
                Ok(())
            });
            if enhanced {
                execute!(io::stdout(), PopKeyboardEnhancementFlags)?;
            }
            result
        })
    }

    /// Event dispatch of [`Self::run`], with rendering left to `render`.
    fn drive<A, R>(&mut self, app: &mut A, mut render: R) -> io::Result<()>
    where
        A: App,
        R: FnMut(&A) -> io::Result<()>,
    {
        app.init(self);
        while !app.should_exit() {
            match self.events.next()? {
                TuiEvent::Tick(now) => app.update(self, now),
                TuiEvent::Render => render(app)?,
                TuiEvent::Crossterm(event) => app.handle_event(self, event),
            }
        }
        Ok(())
    }
}
