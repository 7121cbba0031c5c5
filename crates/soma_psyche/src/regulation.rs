//! Emotional regulation as a depletable resource.
//!
//! Capacity drains slowly under stress, then collapses once it falls below
//! 40% of the trait baseline. It refills at 0.1 per hour when stress is low.
//! Fatigue lowers the *effective* capacity without draining the store.

use crate::personality::Personality;
use serde::{Deserialize, Serialize};

const STRESS_THRESHOLD: f64 = 0.3;
const DEPLETION_PER_HOUR: f64 = 0.08;
const RECOVERY_PER_HOUR: f64 = 0.1;
const COLLAPSE_FRACTION: f64 = 0.4;
const FATIGUE_PENALTY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulationState {
    /// Stored capacity, `[0, baseline]`
    pub capacity: f64,
}

impl RegulationState {
    /// Full capacity for this personality.
    pub fn new(personality: &Personality) -> Self {
        Self {
            capacity: personality.baseline_regulation(),
        }
    }

    /// Advance by `dt` seconds at the given stress level.
    pub fn update(self, personality: &Personality, stress: f64, dt: f64) -> Self {
        let baseline = personality.baseline_regulation();
        let dt_hours = dt.max(0.0) / 3600.0;
        let mut capacity = self.capacity;

        if stress > STRESS_THRESHOLD {
            capacity -= stress * dt_hours * DEPLETION_PER_HOUR;
            let floor = baseline * COLLAPSE_FRACTION;
            if capacity < floor {
                let overshoot = floor - capacity;
                capacity -= overshoot * overshoot * 0.5;
            }
        } else {
            capacity += RECOVERY_PER_HOUR * dt_hours;
        }

        if !capacity.is_finite() {
            tracing::warn!("Non-finite regulation capacity, resetting to baseline");
            capacity = baseline;
        }
        Self {
            capacity: capacity.clamp(0.0, baseline),
        }
    }

    /// Capacity available right now, after the temporary fatigue penalty.
    pub fn effective(&self, fatigue: f64) -> f64 {
        (self.capacity - fatigue * FATIGUE_PENALTY).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_baseline() {
        let p = Personality::default();
        assert_eq!(RegulationState::new(&p).capacity, p.baseline_regulation());
    }

    #[test]
    fn test_depletes_under_stress() {
        let p = Personality::default();
        let start = RegulationState::new(&p);
        let after = start.update(&p, 0.8, 3600.0);
        assert!((start.capacity - after.capacity - 0.064).abs() < 1e-9);
    }

    #[test]
    fn test_collapse_accelerates_below_floor() {
        let p = Personality::default();
        let floor = p.baseline_regulation() * 0.4;
        let near = RegulationState { capacity: floor + 0.01 };
        let below = RegulationState { capacity: floor - 0.1 };
        let drop_near = near.capacity - near.update(&p, 0.8, 600.0).capacity;
        let drop_below = below.capacity - below.update(&p, 0.8, 600.0).capacity;
        assert!(drop_below > drop_near);
    }

    #[test]
    fn test_recovers_but_never_exceeds_baseline() {
        let p = Personality::default();
        let low = RegulationState { capacity: 0.1 };
        let after = low.update(&p, 0.1, 3600.0);
        assert!((after.capacity - 0.2).abs() < 1e-9);
        let full = RegulationState::new(&p).update(&p, 0.0, 36_000.0);
        assert_eq!(full.capacity, p.baseline_regulation());
    }

    #[test]
    fn test_never_negative() {
        let p = Personality::default();
        let after = RegulationState { capacity: 0.01 }.update(&p, 1.0, 360_000.0);
        assert_eq!(after.capacity, 0.0);
    }

    #[test]
    fn test_fatigue_penalty_is_temporary() {
        let r = RegulationState { capacity: 0.5 };
        assert!((r.effective(1.0) - 0.2).abs() < 1e-9);
        assert_eq!(r.capacity, 0.5);
        assert_eq!(RegulationState { capacity: 0.1 }.effective(1.0), 0.0);
    }
}
