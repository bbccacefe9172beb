use std::time::Instant;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Fixed-rate cycle generator that decouples simulation cadence from the frame rate.
///
/// The driver loop calls [`Self::update`] once per frame, even while paused, and then
/// drains [`Self::consume_cycle`] to run one simulation tick per elapsed cycle.
/// Time that does not add up to a whole cycle is carried to the next update, so the
/// number of cycles produced over a period does not depend on how the period was
/// split into updates.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use blockfall_engine::CycleClock;
///
/// let start = Instant::now();
/// let mut clock = CycleClock::with_start(10.0, start);
/// clock.update(start + Duration::from_millis(250));
///
/// assert!(clock.consume_cycle());
/// assert!(clock.consume_cycle());
/// assert!(!clock.consume_cycle());
/// ```
#[derive(Debug, Clone)]
pub struct CycleClock {
    nanos_per_cycle: u64,
    last_update: Instant,
    pending_cycles: u64,
    excess_nanos: u64,
    paused: bool,
}

impl CycleClock {
    /// Creates a running clock whose baseline is the current time.
    #[must_use]
    pub fn new(cycles_per_second: f32) -> Self {
        Self::with_start(cycles_per_second, Instant::now())
    }

    /// Like [`Self::new`], but with an explicit baseline timestamp.
    #[must_use]
    pub fn with_start(cycles_per_second: f32, now: Instant) -> Self {
        let mut clock = Self {
            nanos_per_cycle: 1,
            last_update: now,
            pending_cycles: 0,
            excess_nanos: 0,
            paused: false,
        };
        clock.set_rate(cycles_per_second);
        clock
    }

    /// Changes the number of cycles per second without touching accumulated state.
    ///
    /// # Panics
    ///
    /// Panics if the rate is not a positive finite number.
    pub fn set_rate(&mut self, cycles_per_second: f32) {
        assert!(
            cycles_per_second.is_finite() && cycles_per_second > 0.0,
            "cycle rate must be positive, got {cycles_per_second}"
        );
        let nanos = (NANOS_PER_SEC / f64::from(cycles_per_second)).round();
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = nanos as u64;
        self.nanos_per_cycle = nanos.max(1);
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn millis_per_cycle(&self) -> f64 {
        self.nanos_per_cycle as f64 / 1_000_000.0
    }

    /// Drops pending cycles and carried time, resumes, and moves the baseline to `now`.
    pub fn reset_at(&mut self, now: Instant) {
        self.pending_cycles = 0;
        self.excess_nanos = 0;
        self.last_update = now;
        self.paused = false;
    }

    /// Like [`Self::reset_at`], keeping the timestamp of the most recent update as the baseline.
    pub fn reset(&mut self) {
        self.reset_at(self.last_update);
    }

    /// Accumulates the cycles elapsed since the previous update.
    ///
    /// The baseline always moves to `now`, also while paused, so resuming does not
    /// release a burst of cycles for the paused period.
    pub fn update(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_nanos();
        let delta = u64::try_from(elapsed)
            .unwrap_or(u64::MAX)
            .saturating_add(self.excess_nanos);

        if !self.paused {
            self.pending_cycles += delta / self.nanos_per_cycle;
            self.excess_nanos = delta % self.nanos_per_cycle;
        }

        self.last_update = now;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Takes one pending cycle, returning `false` when none is left.
    pub fn consume_cycle(&mut self) -> bool {
        if self.pending_cycles > 0 {
            self.pending_cycles -= 1;
            return true;
        }
        false
    }

    /// Like [`Self::consume_cycle`], but without taking the cycle.
    #[must_use]
    pub fn peek_cycle(&self) -> bool {
        self.pending_cycles > 0
    }

    #[must_use]
    pub fn pending_cycles(&self) -> u64 {
        self.pending_cycles
    }

    #[must_use]
    pub fn last_update(&self) -> Instant {
        self.last_update
    }
}
