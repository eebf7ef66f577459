/// Relative slack when deciding whether the end time falls on a step.
const STEP_TOLERANCE: f64 = 1e-9;

/// Configuration for a model's time range and bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Time of the first step.
    pub start_time: f64,
    /// Time of the last step (inclusive).
    pub end_time: f64,
    /// Time between steps. Accumulated values in behaviors assume this stays fixed.
    pub tstep: f64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 100.0,
            tstep: 1.0,
            max_events: 0,
        }
    }
}

impl ModelConfig {
    /// Set the simulated time range.
    pub fn with_times(mut self, start: f64, end: f64) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Set the time between steps.
    pub fn with_tstep(mut self, tstep: f64) -> Self {
        self.tstep = tstep;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Number of steps in `[start_time, end_time]`, both ends included.
    ///
    /// An end time within rounding error of a whole number of steps counts
    /// as reached.
    pub fn step_count(&self) -> u64 {
        if self.tstep <= 0.0 || self.end_time < self.start_time {
            return 0;
        }
        let spans = (self.end_time - self.start_time) / self.tstep;
        (spans + STEP_TOLERANCE * spans.max(1.0)).floor() as u64 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = ModelConfig::default();
        assert_eq!(config.start_time, 0.0);
        assert!((config.end_time - 100.0).abs() < f64::EPSILON);
        assert!((config.tstep - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 0);
    }

    #[test]
    fn config_builder_chain() {
        let config = ModelConfig::default()
            .with_times(0.0, 300.0)
            .with_tstep(0.5)
            .with_max_events(500);
        assert!((config.end_time - 300.0).abs() < f64::EPSILON);
        assert!((config.tstep - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 500);
    }

    #[test]
    fn step_count_includes_both_ends() {
        let config = ModelConfig::default().with_times(0.0, 10.0);
        assert_eq!(config.step_count(), 11);
        let config = ModelConfig::default().with_times(0.0, 10.0).with_tstep(4.0);
        assert_eq!(config.step_count(), 3);
    }

    #[test]
    fn step_count_degenerate_ranges() {
        assert_eq!(ModelConfig::default().with_tstep(0.0).step_count(), 0);
        assert_eq!(ModelConfig::default().with_times(5.0, 1.0).step_count(), 0);
    }

    #[test]
    fn step_count_reaches_fractional_end() {
        let config = ModelConfig::default().with_times(0.0, 0.3).with_tstep(0.1);
        assert_eq!(config.step_count(), 4);
        let config = ModelConfig::default().with_times(0.0, 1.0).with_tstep(0.1);
        assert_eq!(config.step_count(), 11);
        let config = ModelConfig::default().with_times(0.0, 0.35).with_tstep(0.1);
        assert_eq!(config.step_count(), 4);
    }
}
