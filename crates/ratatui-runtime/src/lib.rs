//! Frame-paced terminal runtime for ratatui applications.
//!
//! [`Runtime`] owns the event loop: it waits for terminal input, fires fixed-rate
//! ticks and triggers redraws. All waiting goes through a [`Scheduler`], so an
//! application's update step receives the current time and never sleeps itself.

pub use self::{
    app::App,
    event_loop::RenderMode,
    runtime::Runtime,
    scheduler::{Scheduler, TerminalScheduler},
    screen::{Screen, ScreenStack, ScreenTransition},
};

mod app;
mod event;
mod event_loop;
mod runtime;
mod scheduler;
mod screen;
