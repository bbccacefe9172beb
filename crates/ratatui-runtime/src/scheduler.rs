use std::{
    fmt, io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event};

/// Source of time and terminal events for the event loop.
///
/// All waiting done by the runtime goes through this trait, so applications never
/// sleep on their own and tests can drive the loop with virtual time.
pub trait Scheduler: fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Waits until an event is available or `timeout` has elapsed.
    ///
    /// Returns `true` if [`Self::read`] will return without blocking.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Returns the next event, blocking until one is available.
    fn read(&mut self) -> io::Result<Event>;
}

/// Scheduler backed by the system clock and crossterm's event queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalScheduler;

impl Scheduler for TerminalScheduler {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        event::read()
    }
}
