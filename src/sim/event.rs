use serde::{Deserialize, Serialize};

use crate::gnc::ThrottleReason;
use crate::sim::tick::TickOutput;

// ---------------------------------------------------------------------------
// Append-only component event log
// ---------------------------------------------------------------------------

/// Append-only list of component events, clearable by the owner's caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog<E> {
    entries: Vec<E>,
}

impl<E> EventLog<E> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, event: E) {
        self.entries.push(event);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.entries
    }

    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E: PartialEq> EventLog<E> {
    pub fn contains(&self, event: &E) -> bool {
        self.entries.contains(event)
    }
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> IntoIterator for &'a EventLog<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Simulation-level events
// ---------------------------------------------------------------------------

/// Kinds of events the simulation driver reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Ignition,
    Flameout,
    EngineFailure,
    SuicideBurnStart,
    Apogee,
    Touchdown { vertical_speed: f64 },
    Custom(String),
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
}

/// Passive detector that inspects consecutive tick records.
pub trait EventDetector {
    fn check(&mut self, prev: &TickOutput, current: &TickOutput) -> Option<EventKind>;
}

/// Detects apogee (vertical speed going from positive to non-positive).
pub struct ApogeeDetector;

impl EventDetector for ApogeeDetector {
    fn check(&mut self, prev: &TickOutput, current: &TickOutput) -> Option<EventKind> {
        if prev.vertical_speed > 0.0 && current.vertical_speed <= 0.0 && current.altitude > 1.0 {
            Some(EventKind::Apogee)
        } else {
            None
        }
    }
}

/// Fires once when altitude crosses a threshold in the given direction.
pub struct AltitudeDetector {
    pub altitude: f64,
    pub ascending: bool,
    fired: bool,
}

impl AltitudeDetector {
    pub fn new(altitude: f64, ascending: bool) -> Self {
        Self { altitude, ascending, fired: false }
    }
}

impl EventDetector for AltitudeDetector {
    fn check(&mut self, prev: &TickOutput, current: &TickOutput) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let crossed = if self.ascending {
            prev.altitude < self.altitude && current.altitude >= self.altitude
        } else {
            prev.altitude > self.altitude && current.altitude <= self.altitude
        };
        if crossed {
            self.fired = true;
            Some(EventKind::Custom(format!(
                "Altitude {:.0}m ({})",
                self.altitude,
                if self.ascending { "ascending" } else { "descending" }
            )))
        } else {
            None
        }
    }
}

/// Fires when the suicide-burn autopilot leaves its waiting phase.
pub struct SuicideBurnDetector;

impl EventDetector for SuicideBurnDetector {
    fn check(&mut self, prev: &TickOutput, current: &TickOutput) -> Option<EventKind> {
        let waiting = Some(ThrottleReason::SuicideBurnWaiting);
        let burning = matches!(
            current.throttle_reason,
            Some(ThrottleReason::SuicideBurnActive | ThrottleReason::SuicideBurnTerminal | ThrottleReason::SuicideBurnCoast)
        );
        (prev.throttle_reason == waiting && burning).then_some(EventKind::SuicideBurnStart)
    }
}
