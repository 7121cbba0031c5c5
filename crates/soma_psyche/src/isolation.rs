//! Social isolation over time.
//!
//! Loneliness climbs along a stepped timeline; extraverts climb faster for
//! the first three days, after which everyone converges.

use crate::personality::Personality;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationPhase {
    /// 0 to 2 h
    #[default]
    None,
    /// 2 to 8 h, restlessness
    Boredom,
    /// 8 to 24 h
    Loneliness,
    /// 1 to 3 days, mood and cognition disrupted
    Significant,
    /// 3 to 7 days, identity disturbance
    Destabilizing,
    /// beyond a week
    Severe,
}

impl IsolationPhase {
    pub fn from_hours(hours: f64) -> Self {
        if hours <= 2.0 {
            IsolationPhase::None
        } else if hours <= 8.0 {
            IsolationPhase::Boredom
        } else if hours <= 24.0 {
            IsolationPhase::Loneliness
        } else if hours <= 72.0 {
            IsolationPhase::Significant
        } else if hours <= 168.0 {
            IsolationPhase::Destabilizing
        } else {
            IsolationPhase::Severe
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IsolationPhase::None => "none",
            IsolationPhase::Boredom => "boredom",
            IsolationPhase::Loneliness => "loneliness",
            IsolationPhase::Significant => "significant",
            IsolationPhase::Destabilizing => "destabilizing",
            IsolationPhase::Severe => "severe",
        }
    }
}

impl fmt::Display for IsolationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IsolationState {
    /// Seconds since the last social contact
    pub elapsed_secs: f64,
    /// `[0, 1]`
    pub loneliness: f64,
    pub phase: IsolationPhase,
}

impl IsolationState {
    pub fn hours(&self) -> f64 {
        self.elapsed_secs / 3600.0
    }

    /// Advance by `dt` seconds.
    pub fn update(self, p: &Personality, dt: f64) -> Self {
        let elapsed_secs = self.elapsed_secs + dt.max(0.0);
        let hours = elapsed_secs / 3600.0;
        Self {
            elapsed_secs,
            loneliness: loneliness(hours, p.isolation_distress_rate()),
            phase: IsolationPhase::from_hours(hours),
        }
    }
}

/// Stepped loneliness timeline. `rate` is the personality distress factor.
pub fn loneliness(hours: f64, rate: f64) -> f64 {
    let level = if hours <= 2.0 {
        0.05 * rate
    } else if hours <= 8.0 {
        (0.1 + (hours - 2.0) / 6.0 * 0.15) * rate
    } else if hours <= 24.0 {
        (0.25 + (hours - 8.0) / 16.0 * 0.25) * rate
    } else if hours <= 72.0 {
        (0.5 + (hours - 24.0) / 48.0 * 0.2) * rate
    } else if hours <= 168.0 {
        0.7 + (hours - 72.0) / 96.0 * 0.15
    } else {
        0.85 + ((hours - 168.0) / 336.0 * 0.1).clamp(0.0, 0.15)
    };
    level.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_monotone_over_timeline() {
        let p = Personality::default();
        let mut state = IsolationState::default();
        let mut last = state.phase;
        let expected = [
            IsolationPhase::None,
            IsolationPhase::Boredom,
            IsolationPhase::Loneliness,
            IsolationPhase::Significant,
            IsolationPhase::Destabilizing,
            IsolationPhase::Severe,
        ];
        let mut elapsed_h = 0.0;
        for (hours, phase) in [0.0, 3.0, 12.0, 48.0, 100.0, 200.0].into_iter().zip(expected) {
            state = state.update(&p, (hours - elapsed_h) * 3600.0);
            elapsed_h = hours;
            assert_eq!(state.phase, phase, "at {} h", hours);
            assert!(state.phase >= last);
            last = state.phase;
        }
    }

    #[test]
    fn test_extraverts_lonelier_early() {
        let intro = Personality::new(0.5, 0.5, 0.1, 0.5, 0.5);
        let extra = Personality::new(0.5, 0.5, 0.9, 0.5, 0.5);
        let i = IsolationState::default().update(&intro, 12.0 * 3600.0);
        let e = IsolationState::default().update(&extra, 12.0 * 3600.0);
        assert!(e.loneliness > i.loneliness);
    }

    #[test]
    fn test_loneliness_saturates() {
        assert!((loneliness(10_000.0, 1.0) - 0.95).abs() < 1e-9);
        assert!(loneliness(10_000.0, 3.0) <= 1.0);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let p = Personality::default();
        let s = IsolationState::default().update(&p, 3600.0).update(&p, -7200.0);
        assert!((s.hours() - 1.0).abs() < 1e-9);
    }
}
