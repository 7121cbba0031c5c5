//! Coarse three-tier alerts over the psychological state.

use crate::isolation::IsolationPhase;
use crate::state::PsychologicalState;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Mild,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertSeverity::Mild => "mild",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDimension {
    Stress,
    Regulation,
    Energy,
    Isolation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsychAlert {
    pub dimension: AlertDimension,
    pub severity: AlertSeverity,
    pub description: &'static str,
}

fn alert(dimension: AlertDimension, severity: AlertSeverity, description: &'static str) -> Option<PsychAlert> {
    Some(PsychAlert {
        dimension,
        severity,
        description,
    })
}

/// Most severe alert per dimension.
pub fn evaluate(psych: &PsychologicalState) -> Vec<PsychAlert> {
    use AlertDimension::*;
    use AlertSeverity::*;

    let stress = match psych.stress {
        s if s > 0.9 => alert(Stress, Critical, "overwhelming stress"),
        s if s > 0.75 => alert(Stress, Warning, "high stress"),
        s if s > 0.6 => alert(Stress, Mild, "elevated stress"),
        _ => None,
    };
    let regulation = match psych.regulation_capacity {
        r if r < 0.1 => alert(Regulation, Critical, "emotional regulation collapsed"),
        r if r < 0.2 => alert(Regulation, Warning, "emotional regulation failing"),
        r if r < 0.3 => alert(Regulation, Mild, "emotional regulation strained"),
        _ => None,
    };
    let energy = match psych.energy {
        e if e < 0.1 => alert(Energy, Critical, "completely drained"),
        e if e < 0.2 => alert(Energy, Warning, "running on empty"),
        _ => None,
    };
    let isolation = match psych.isolation.phase {
        IsolationPhase::Severe => alert(Isolation, Critical, "severe isolation"),
        IsolationPhase::Destabilizing => alert(Isolation, Warning, "isolation is destabilizing"),
        IsolationPhase::Significant => alert(Isolation, Mild, "significant isolation"),
        _ => None,
    };

    [stress, regulation, energy, isolation].into_iter().flatten().collect()
}
