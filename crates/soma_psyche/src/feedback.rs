//! Psychological feedback into the body.
//!
//! Coping and distortions have physiological costs. Rates are per second;
//! the caller passes the elapsed time and applies the result to biology.

use crate::coping::CopingStrategy;
use crate::distortion::Distortion;
use soma_core::{StateChange, Variable};

/// Changes produced by `coping` and `distortions` over `dt` seconds.
///
/// `coping` is any sequence of strategies, usually [`crate::Coping::strategies`]
/// or the strategies detected in a generated thought.
pub fn feedback_changes(
    coping: impl IntoIterator<Item = CopingStrategy>,
    distortions: &[Distortion],
    dt: f64,
) -> Vec<StateChange> {
    let mut changes = Vec::new();
    if dt <= 0.0 || !dt.is_finite() {
        return changes;
    }

    for strategy in coping {
        match strategy {
            CopingStrategy::Rumination => {
                changes.push(StateChange::new(Variable::Cortisol, 0.02 * dt, "psych_rumination"));
                changes.push(StateChange::new(Variable::Serotonin, -0.01 * dt, "psych_rumination"));
            }
            CopingStrategy::Acceptance | CopingStrategy::Reappraisal => {
                changes.push(StateChange::new(Variable::Cortisol, -0.01 * dt, "psych_acceptance"));
                changes.push(StateChange::new(Variable::Serotonin, 0.005 * dt, "psych_acceptance"));
            }
            CopingStrategy::Suppression => {
                changes.push(StateChange::new(Variable::Cortisol, 0.01 * dt, "psych_suppression"));
                changes.push(StateChange::new(Variable::Adrenaline, 0.005 * dt, "psych_suppression"));
            }
            _ => {}
        }
    }

    if distortions.contains(&Distortion::Catastrophizing) {
        changes.push(StateChange::new(Variable::Adrenaline, 0.03 * dt, "psych_catastrophizing"));
        changes.push(StateChange::new(Variable::Cortisol, 0.02 * dt, "psych_catastrophizing"));
    }

    if distortions.len() >= 3 {
        changes.push(StateChange::new(Variable::Cortisol, 0.01 * dt, "psych_distortion_load"));
    }

    changes
}
