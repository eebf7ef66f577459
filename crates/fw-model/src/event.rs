use fw_core::FaultId;

use crate::model::ModelId;

/// What kind of model event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEventKind {
    /// A fault was injected into a function from a scenario.
    FaultInjected {
        /// The function that received the fault.
        function: String,
        /// The injected fault (scoped for component faults).
        fault: FaultId,
    },
    /// A function's own logic raised a fault while conditioning or behaving.
    FaultRaised {
        /// The function that raised the fault.
        function: String,
        /// The raised fault (scoped for component faults).
        fault: FaultId,
    },
    /// A fault disappeared from a function's aggregate set, e.g. by replacement.
    FaultCleared {
        /// The function that lost the fault.
        function: String,
        /// The cleared fault.
        fault: FaultId,
    },
    /// Every flow and function was reset to its initial state.
    Reset,
    /// This model was copied from another one.
    Branched {
        /// The model this one was copied from.
        parent: ModelId,
    },
}

impl ModelEventKind {
    /// Check whether a given function is involved in this event.
    pub fn involves(&self, name: &str) -> bool {
        match self {
            Self::FaultInjected { function, .. }
            | Self::FaultRaised { function, .. }
            | Self::FaultCleared { function, .. } => function == name,
            Self::Reset | Self::Branched { .. } => false,
        }
    }
}

/// A record of something that happened while driving a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEvent {
    /// The model time when this event occurred.
    pub time: f64,
    /// The specific kind of event that occurred.
    pub kind: ModelEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl ModelEvent {
    /// Create a new event with the given time, kind, and description.
    pub fn new(time: f64, kind: ModelEventKind, description: impl Into<String>) -> Self {
        Self {
            time,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events while a model is driven.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<ModelEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: ModelEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    /// Return all events with `from <= time <= to`.
    pub fn events_between(&self, from: f64, to: f64) -> Vec<&ModelEvent> {
        self.events
            .iter()
            .filter(|e| e.time >= from && e.time <= to)
            .collect()
    }

    /// Return all events involving the given function.
    pub fn events_for_function(&self, name: &str) -> Vec<&ModelEvent> {
        self.events.iter().filter(|e| e.kind.involves(name)).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
