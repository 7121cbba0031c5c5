//! Circadian forcing functions.
//!
//! All targets are cosine-family functions of the phase in hours `[0, 24)`.
//! Peaks:
//! - cortisol: ~07:00 (awakening response), flat floor through the night
//! - core temperature: ~17:00
//! - serotonin: ~13:00
//! - alertness: two-process shape with a post-lunch dip around 14:30

use serde::Serialize;
use std::f64::consts::PI;

/// Phase-dependent targets the tick pulls the body toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircadianSignals {
    pub cortisol_target: f64,
    pub temperature_target: f64,
    pub serotonin_shift: f64,
}

pub fn compute(phase: f64) -> CircadianSignals {
    CircadianSignals {
        cortisol_target: cortisol_target(phase),
        temperature_target: temperature_target(phase),
        serotonin_shift: serotonin_shift(phase),
    }
}

fn hours_to_angle(hours: f64) -> f64 {
    hours * PI / 12.0
}

pub fn cortisol_target(phase: f64) -> f64 {
    0.15 + 0.25 * hours_to_angle(phase - 7.0).cos().max(0.0)
}

pub fn temperature_target(phase: f64) -> f64 {
    36.6 + 0.5 * hours_to_angle(phase - 17.0).cos()
}

pub fn serotonin_shift(phase: f64) -> f64 {
    0.05 * hours_to_angle(phase - 13.0).cos()
}

/// Subjective alertness in `[0, 1]`.
pub fn alertness(phase: f64) -> f64 {
    let circadian = 0.2 * (2.0 * PI * (phase - 16.0) / 24.0).cos();
    let dip = 0.25 * (2.0 * PI * (phase - 14.5) / 12.0).cos();
    (0.5 + circadian - dip).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cortisol_peaks_in_morning() {
        assert!((cortisol_target(7.0) - 0.40).abs() < 1e-9);
        assert!(cortisol_target(7.0) > cortisol_target(15.0));
        // night floor
        assert!((cortisol_target(19.0) - 0.15).abs() < 1e-9);
        assert!((cortisol_target(1.0) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_peaks_late_afternoon() {
        assert!((temperature_target(17.0) - 37.1).abs() < 1e-9);
        assert!((temperature_target(5.0) - 36.1).abs() < 1e-9);
    }

    #[test]
    fn test_alertness_bounded_over_day() {
        for i in 0..240 {
            let a = alertness(i as f64 / 10.0);
            assert!((0.0..=1.0).contains(&a));
        }
        assert!(alertness(4.0) < alertness(10.0));
    }

    #[test]
    fn test_signals_periodic() {
        let a = compute(3.0);
        let b = compute(27.0);
        assert!((a.cortisol_target - b.cortisol_target).abs() < 1e-9);
        assert!((a.serotonin_shift - b.serotonin_shift).abs() < 1e-9);
    }

    #[test]
    fn test_signals_are_the_forced_variables() {
        let s = compute(13.0);
        assert_eq!(s.cortisol_target, cortisol_target(13.0));
        assert_eq!(s.temperature_target, temperature_target(13.0));
        assert!((s.serotonin_shift - 0.05).abs() < 1e-12);
    }
}
