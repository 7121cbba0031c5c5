//! Half-life relaxation toward baselines.
//!
//! `x' = b + (x − b)·e^{−ln2·dt/H}`: after exactly `H` seconds the distance
//! to the baseline has halved.

use crate::change::StateChange;
use crate::circadian::CircadianSignals;
use crate::state::{BiologicalState, Variable};
use std::f64::consts::LN_2;

/// Fraction of the distance to baseline that remains after `dt` seconds.
#[inline]
pub fn retention(dt: f64, half_life: f64) -> f64 {
    (-LN_2 * dt / half_life).exp()
}

/// Relax `x` toward `baseline` over `dt` seconds.
#[inline]
pub fn decay_toward(x: f64, baseline: f64, dt: f64, half_life: f64) -> f64 {
    baseline + (x - baseline) * retention(dt, half_life)
}

/// A plain relaxation entry: variable, fixed baseline, half-life in seconds,
/// and the gap below which the variable is considered settled.
struct Relaxation {
    variable: Variable,
    baseline: f64,
    half_life: f64,
    settle: f64,
    source: &'static str,
}

const RELAXATIONS: &[Relaxation] = &[
    Relaxation { variable: Variable::Adrenaline, baseline: 0.0, half_life: 150.0, settle: 0.01, source: "adrenaline_clearance" },
    Relaxation { variable: Variable::Cortisol, baseline: 0.1, half_life: 4500.0, settle: 1e-4, source: "cortisol_clearance" },
    Relaxation { variable: Variable::HeartRate, baseline: 70.0, half_life: 75.0, settle: 1.0, source: "heart_rate_recovery" },
    Relaxation { variable: Variable::BloodPressure, baseline: 120.0, half_life: 180.0, settle: 1.0, source: "blood_pressure_recovery" },
    Relaxation { variable: Variable::RespiratoryRate, baseline: 15.0, half_life: 45.0, settle: 0.5, source: "respiratory_recovery" },
    Relaxation { variable: Variable::MuscleTension, baseline: 0.0, half_life: 450.0, settle: 1e-3, source: "muscle_relaxation" },
    Relaxation { variable: Variable::Endorphins, baseline: 0.1, half_life: 1500.0, settle: 1e-3, source: "endorphin_clearance" },
    Relaxation { variable: Variable::Dopamine, baseline: 0.3, half_life: 900.0, settle: 1e-3, source: "dopamine_reuptake" },
];

const PAIN_HALF_LIFE: f64 = 1800.0;
const BODY_TEMP_HALF_LIFE: f64 = 900.0;
const SPO2_HALF_LIFE: f64 = 30.0;
const SPO2_BASELINE: f64 = 98.0;
const BLOOD_SUGAR_HALF_LIFE: f64 = 5400.0;
const BLOOD_SUGAR_BASELINE: f64 = 90.0;
const GLYCOGEN_PER_SECOND: f64 = 0.0005 / 60.0;

/// Apply every decay law for `dt` seconds. Returns the applied deltas.
pub fn apply_decay(
    state: &mut BiologicalState,
    dt: f64,
    circadian: &CircadianSignals,
) -> Vec<StateChange> {
    let mut changes = Vec::new();

    for r in RELAXATIONS {
        let x = state.get(r.variable);
        if (x - r.baseline).abs() > r.settle {
            let next = decay_toward(x, r.baseline, dt, r.half_life);
            push(state, &mut changes, r.variable, next - x, r.source);
        }
    }

    // Core temperature relaxes toward the circadian set point, not a constant.
    let target = circadian.temperature_target;
    if (state.body_temp - target).abs() > 0.05 {
        let next = decay_toward(state.body_temp, target, dt, BODY_TEMP_HALF_LIFE);
        push(state, &mut changes, Variable::BodyTemp, next - state.body_temp, "thermoregulation");
    }

    // Endorphins shorten pain's half-life.
    if state.pain > 1e-3 {
        let half_life = if state.endorphins > 0.2 {
            PAIN_HALF_LIFE / 2.0
        } else {
            PAIN_HALF_LIFE
        };
        let next = decay_toward(state.pain, 0.0, dt, half_life);
        push(state, &mut changes, Variable::Pain, next - state.pain, "pain_resolution");
    }

    // Oxygen saturation only recovers while breathing is adequate.
    if state.spo2 < SPO2_BASELINE && state.respiratory_rate >= 10.0 {
        let half_life = if state.respiratory_rate > 25.0 {
            SPO2_HALF_LIFE / 1.5
        } else {
            SPO2_HALF_LIFE
        };
        let next = decay_toward(state.spo2, SPO2_BASELINE, dt, half_life);
        push(state, &mut changes, Variable::Spo2, next - state.spo2, "oxygen_recovery");
    }

    // Insulin pulls only an excess back down; low sugar is handled by rules.
    if state.blood_sugar > 95.0 {
        let next = decay_toward(state.blood_sugar, BLOOD_SUGAR_BASELINE, dt, BLOOD_SUGAR_HALF_LIFE);
        push(state, &mut changes, Variable::BloodSugar, next - state.blood_sugar, "insulin_response");
    }

    if state.glycogen > 0.0 {
        let used = (GLYCOGEN_PER_SECOND * dt).min(state.glycogen);
        push(state, &mut changes, Variable::Glycogen, -used, "glycogen_metabolism");
    }

    changes
}

fn push(
    state: &mut BiologicalState,
    changes: &mut Vec<StateChange>,
    variable: Variable,
    delta: f64,
    source: &'static str,
) {
    if delta == 0.0 || !delta.is_finite() {
        return;
    }
    state.add(variable, delta);
    changes.push(StateChange::new(variable, delta, source));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circadian;

    #[test]
    fn test_half_life_halves_distance() {
        let x = decay_toward(1.0, 0.0, 150.0, 150.0);
        assert!((x - 0.5).abs() < 1e-9);
        let hr = decay_toward(110.0, 70.0, 75.0, 75.0);
        assert!((hr - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        assert_eq!(decay_toward(0.8, 0.1, 0.0, 4500.0), 0.8);
    }

    #[test]
    fn test_adrenaline_half_life_through_apply() {
        let mut s = BiologicalState::default();
        s.adrenaline = 0.8;
        let signals = circadian::compute(s.circadian_phase);
        apply_decay(&mut s, 150.0, &signals);
        assert!((s.adrenaline - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_endorphins_speed_pain_relief() {
        let signals = circadian::compute(8.0);

        let mut plain = BiologicalState::default();
        plain.pain = 0.8;
        plain.endorphins = 0.1;
        apply_decay(&mut plain, 600.0, &signals);

        let mut relieved = BiologicalState::default();
        relieved.pain = 0.8;
        relieved.endorphins = 0.5;
        apply_decay(&mut relieved, 600.0, &signals);

        assert!(relieved.pain < plain.pain);
    }

    #[test]
    fn test_spo2_needs_breathing() {
        let signals = circadian::compute(8.0);
        let mut s = BiologicalState::default();
        s.spo2 = 88.0;
        s.respiratory_rate = 6.0;
        apply_decay(&mut s, 60.0, &signals);
        assert_eq!(s.spo2, 88.0);

        s.respiratory_rate = 15.0;
        apply_decay(&mut s, 60.0, &signals);
        assert!(s.spo2 > 88.0);
    }

    #[test]
    fn test_low_blood_sugar_not_pulled_up() {
        let signals = circadian::compute(8.0);
        let mut s = BiologicalState::default();
        s.blood_sugar = 60.0;
        apply_decay(&mut s, 300.0, &signals);
        assert_eq!(s.blood_sugar, 60.0);
    }

    #[test]
    fn test_settled_variables_emit_nothing() {
        let signals = circadian::compute(8.0);
        let mut s = BiologicalState::default();
        s.body_temp = signals.temperature_target;
        s.glycogen = 0.0;
        let changes = apply_decay(&mut s, 10.0, &signals);
        assert!(changes.is_empty(), "unexpected: {:?}", changes);
    }
}
