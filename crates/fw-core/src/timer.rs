use serde::{Deserialize, Serialize};

/// A named elapsed-time counter owned by a state block.
///
/// Behaviors use timers for things like "hover for five steps before moving
/// to the next waypoint". Timers are zeroed when their block is reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    name: String,
    time: f64,
}

impl Timer {
    /// A stopped timer at zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: 0.0,
        }
    }

    /// Advance the timer by `dt`.
    pub fn inc(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Count the timer down by `dt`, stopping at zero.
    pub fn dec(&mut self, dt: f64) {
        self.time = (self.time - dt).max(0.0);
    }

    /// Accumulated time.
    pub fn t(&self) -> f64 {
        self.time
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    /// Timer name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
