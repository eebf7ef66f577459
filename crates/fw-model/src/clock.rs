use crate::config::ModelConfig;

/// Tracks simulation time: a monotonic tick counter mapped onto model time.
///
/// Times are computed as `start + tick * tstep` rather than accumulated, so
/// long runs do not drift.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    tick: u64,
    start: f64,
    tstep: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new(start: f64, tstep: f64) -> Self {
        Self {
            tick: 0,
            start,
            tstep,
        }
    }

    /// Create a clock matching a model configuration.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.start_time, config.tstep)
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Model time at the current tick.
    pub fn time(&self) -> f64 {
        self.time_at(self.tick)
    }

    /// Model time at an arbitrary tick.
    pub fn time_at(&self, tick: u64) -> f64 {
        self.start + tick as f64 * self.tstep
    }

    /// Return the configured time between ticks.
    pub fn tstep(&self) -> f64 {
        self.tstep
    }

    /// Back to tick 0.
    pub fn rewind(&mut self) {
        self.tick = 0;
    }
}
