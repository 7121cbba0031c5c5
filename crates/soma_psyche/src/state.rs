//! The psychological state handed to the mind layer. Derived fresh every
//! cycle from biology; only regulation, isolation and memories persist.

use crate::affect;
use crate::coping::Coping;
use crate::distortion::Distortion;
use crate::isolation::IsolationState;
use crate::memory::MemoryActivation;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PsychologicalState {
    /// 0.0 to 1.0, after regulation dampening
    pub arousal: f64,
    /// -1.0 to 1.0, after regulation dampening
    pub valence: f64,
    pub energy: f64,
    pub cognitive_load: f64,
    /// Stored regulation capacity
    pub regulation_capacity: f64,
    /// Composite computed before dampening
    pub stress: f64,
    pub distortions: Vec<Distortion>,
    pub coping: Coping,
    pub memories: Vec<MemoryActivation>,
    pub isolation: IsolationState,
}

impl PsychologicalState {
    /// Felt pain signal: `min(1, -valence · arousal)` when valence is negative.
    pub fn pain_signal(&self) -> f64 {
        if self.valence < 0.0 {
            (-self.valence * self.arousal).min(1.0)
        } else {
            0.0
        }
    }

    pub fn mood_label(&self) -> &'static str {
        affect::label(self.arousal, self.valence)
    }

    pub fn has_distortion(&self, d: Distortion) -> bool {
        self.distortions.contains(&d)
    }

    /// One-line summary for logs and the display.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} (arousal {:.2}, valence {:+.2}, energy {:.2}, stress {:.2}), coping: {}",
            self.mood_label(),
            self.arousal,
            self.valence,
            self.energy,
            self.stress,
            self.coping.primary
        );
        if let Some(secondary) = self.coping.secondary {
            s.push_str(&format!(" + {}", secondary));
        }
        if !self.distortions.is_empty() {
            let names: Vec<&str> = self.distortions.iter().map(|d| d.name()).collect();
            s.push_str(&format!(", distortions: {}", names.join(", ")));
        }
        s
    }
}
