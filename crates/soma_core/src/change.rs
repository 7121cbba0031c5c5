//! Audit records for every mutation of the biological state.

use crate::state::{BiologicalState, Variable};
use serde::Serialize;

/// One applied (or proposed) delta: which variable, how much, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub variable: Variable,
    pub delta: f64,
    pub source: &'static str,
}

impl StateChange {
    pub fn new(variable: Variable, delta: f64, source: &'static str) -> Self {
        Self {
            variable,
            delta,
            source,
        }
    }

    /// Same change with the delta multiplied by `factor` (used to turn
    /// per-second rates into per-tick deltas).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            variable: self.variable,
            delta: self.delta * factor,
            source: self.source,
        }
    }

    /// Smallest delta worth showing to an observer.
    pub fn display_threshold(variable: Variable) -> f64 {
        match variable {
            Variable::HeartRate => 2.0,
            Variable::BloodPressure => 3.0,
            Variable::BodyTemp => 0.1,
            Variable::RespiratoryRate => 1.0,
            Variable::BloodSugar => 2.0,
            Variable::Spo2 => 0.5,
            _ => 0.01,
        }
    }

    pub fn is_significant(&self) -> bool {
        self.delta.abs() >= Self::display_threshold(self.variable)
    }
}

/// Filter a batch of changes down to the ones large enough to display.
pub fn significant_changes(changes: &[StateChange]) -> Vec<StateChange> {
    changes.iter().filter(|c| c.is_significant()).cloned().collect()
}

/// Apply a batch of changes, clamping after each one.
pub fn apply_changes(state: &mut BiologicalState, changes: &[StateChange]) {
    for change in changes {
        state.apply_clamped(change.variable, change.delta);
    }
}
