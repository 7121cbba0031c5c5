//! Biological Processor
//!
//! Advances the state vector by one tick. Pipeline, strictly ordered:
//! 1. circadian phase advance
//! 2. half-life decay
//! 3. circadian pull (cortisol, serotonin)
//! 4. interaction rules, single pass over a snapshot
//! 5. hypothermia overrides
//! 6. cortisol load accumulation and immune suppression
//! 7. passive drifts
//! 8. thresholds and cascades
//! 9. final clamp

use crate::change::StateChange;
use crate::circadian;
use crate::decay;
use crate::rules::{RuleSet, HYPOTHERMIA_REVERSAL_TEMP};
use crate::sense::{Channel, Stimulus};
use crate::state::{wrap_phase, BiologicalState, Variable};
use crate::threshold::{self, ThresholdEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Largest elapsed time a single tick will simulate (seconds).
pub const DEFAULT_MAX_DT: f64 = 300.0;

const CORTISOL_PULL_RATE: f64 = 0.0005;
const SEROTONIN_PULL_RATE: f64 = 0.0002;
const CORTISOL_LOAD_FLOOR: f64 = 0.3;
const IMMUNE_SUPPRESSION_RATE: f64 = 0.001;
const HYDRATION_LOSS_PER_SECOND: f64 = 0.001 / 60.0;
const FATIGUE_GAIN_PER_SECOND: f64 = 0.05 / 3600.0;

/// Everything one tick did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickResult {
    /// Simulated seconds covered by this tick (after capping)
    pub dt: f64,
    pub changes: Vec<StateChange>,
    pub thresholds: Vec<ThresholdEvent>,
}

impl TickResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.thresholds.is_empty()
    }
}

/// Immune suppression factor for an accumulated cortisol load.
/// `1.0` at zero load, decreasing monotonically toward zero.
pub fn suppression_factor(load: f64) -> f64 {
    1.0 / (1.0 + load.max(0.0) * 0.1)
}

/// Stateless apart from its rule table and dt ceiling.
#[derive(Debug, Clone)]
pub struct BioProcessor {
    rules: RuleSet,
    max_dt: f64,
}

impl Default for BioProcessor {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl BioProcessor {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            max_dt: DEFAULT_MAX_DT,
        }
    }

    /// Override the per-tick dt ceiling. Non-positive values are ignored.
    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        if max_dt > 0.0 && max_dt.is_finite() {
            self.max_dt = max_dt;
        }
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Advance `state` to `now`.
    ///
    /// A non-positive elapsed time is a no-op: nothing changes and
    /// `last_update` stays where it was.
    pub fn tick(&self, state: &mut BiologicalState, now: DateTime<Utc>) -> TickResult {
        let elapsed = (now - state.last_update).num_microseconds().map(|us| us as f64 / 1e6);
        let dt = match elapsed {
            Some(dt) if dt > 0.0 => dt.min(self.max_dt),
            Some(_) => return TickResult::default(),
            // overflowed i64 microseconds: far in the future
            None if now > state.last_update => self.max_dt,
            None => return TickResult::default(),
        };

        let mut result = self.advance(state, dt);
        state.last_update = now;
        result.dt = dt;
        tracing::trace!(dt, changes = result.changes.len(), thresholds = result.thresholds.len(), "bio tick");
        result
    }

    /// Run the pipeline for `dt` seconds without touching `last_update`.
    fn advance(&self, state: &mut BiologicalState, dt: f64) -> TickResult {
        let mut changes = Vec::new();

        // 1. Circadian phase
        state.circadian_phase = wrap_phase(state.circadian_phase + dt / 3600.0);
        let signals = circadian::compute(state.circadian_phase);

        // 2. Decay
        changes.extend(decay::apply_decay(state, dt, &signals));
        state.clamp_all();

        // 3. Circadian pull
        let cortisol_gap = signals.cortisol_target - state.cortisol;
        if cortisol_gap.abs() > 1e-4 {
            let delta = cortisol_gap * CORTISOL_PULL_RATE * dt;
            state.add(Variable::Cortisol, delta);
            changes.push(StateChange::new(Variable::Cortisol, delta, "circadian_cortisol"));
        }
        let serotonin_gap = 0.5 + signals.serotonin_shift - state.serotonin;
        if serotonin_gap.abs() > 1e-4 {
            let delta = serotonin_gap * SEROTONIN_PULL_RATE * dt;
            state.add(Variable::Serotonin, delta);
            changes.push(StateChange::new(Variable::Serotonin, delta, "circadian_serotonin"));
        }
        state.clamp_all();

        // 4. Interaction rules against a snapshot
        let snapshot = state.clone();
        let rule_changes = self.rules.evaluate(&snapshot, dt);
        for c in &rule_changes {
            state.add(c.variable, c.delta);
        }
        changes.extend(rule_changes);
        state.clamp_all();

        // 5. Overrides
        changes.extend(apply_hypothermia_override(state, dt));

        // 6. Cortisol load and immune suppression
        let excess = state.cortisol - CORTISOL_LOAD_FLOOR;
        if excess > 0.0 {
            state.cortisol_load += excess * dt;
        }
        if state.cortisol_load > 0.0 && state.immune_response > 0.0 {
            let factor = suppression_factor(state.cortisol_load);
            let suppression = state.immune_response * (1.0 - factor) * IMMUNE_SUPPRESSION_RATE * dt;
            if suppression > 0.0 {
                state.add(Variable::ImmuneResponse, -suppression);
                changes.push(StateChange::new(
                    Variable::ImmuneResponse,
                    -suppression,
                    "cortisol_immune_suppression",
                ));
            }
        }

        // 7. Passive drifts
        let water = -HYDRATION_LOSS_PER_SECOND * dt;
        state.add(Variable::Hydration, water);
        changes.push(StateChange::new(Variable::Hydration, water, "natural_water_loss"));
        let tiredness = FATIGUE_GAIN_PER_SECOND * dt;
        state.add(Variable::Fatigue, tiredness);
        changes.push(StateChange::new(Variable::Fatigue, tiredness, "wakefulness"));
        state.clamp_all();

        // 8. Thresholds, all cascades, then a single clamp
        let thresholds = threshold::evaluate(state);
        changes.extend(threshold::apply_cascades(state, &thresholds, dt));

        // 9. Final clamp
        state.clamp_all();

        TickResult {
            dt,
            changes,
            thresholds,
        }
    }

    /// Map a sensory event to immediate changes and apply them, clamped.
    pub fn process_stimulus(&self, state: &mut BiologicalState, stimulus: &Stimulus) -> Vec<StateChange> {
        if !stimulus.intensity.is_finite() {
            tracing::debug!(channel = %stimulus.channel, "ignoring non-finite stimulus intensity");
            return Vec::new();
        }
        let changes = stimulus_changes(stimulus.channel, stimulus.intensity.clamp(0.0, 1.0));
        for c in &changes {
            state.apply_clamped(c.variable, c.delta);
        }
        changes
    }
}

/// Below the reversal temperature the body stops compensating. Shivering
/// fades, the heart slows toward a temperature-dependent floor, and the
/// adrenaline surge collapses. Each convergence stops at its target.
fn apply_hypothermia_override(state: &mut BiologicalState, dt: f64) -> Vec<StateChange> {
    let mut changes = Vec::new();
    if state.body_temp >= HYPOTHERMIA_REVERSAL_TEMP {
        return changes;
    }

    const TENSION_FLOOR: f64 = 0.3;
    if state.muscle_tension > TENSION_FLOOR {
        let gap = state.muscle_tension - TENSION_FLOOR;
        let drop = (gap * 0.1 * dt).min(gap);
        state.add(Variable::MuscleTension, -drop);
        changes.push(StateChange::new(Variable::MuscleTension, -drop, "hypothermia_shivering_failure"));
    }

    let hr_target = 40.0 + (state.body_temp - 28.0) * 2.0;
    if state.heart_rate > hr_target {
        let gap = state.heart_rate - hr_target;
        let drop = (gap * 0.05 * dt).min(gap);
        state.add(Variable::HeartRate, -drop);
        changes.push(StateChange::new(Variable::HeartRate, -drop, "hypothermia_bradycardia"));
    }

    if state.adrenaline > 0.05 {
        let drop = (state.adrenaline * 0.1 * dt).min(state.adrenaline);
        state.add(Variable::Adrenaline, -drop);
        changes.push(StateChange::new(Variable::Adrenaline, -drop, "hypothermia_adrenal_exhaustion"));
    }

    changes
}

fn stimulus_changes(channel: Channel, i: f64) -> Vec<StateChange> {
    use Variable::*;

    match channel {
        Channel::Thermal if i < 0.5 => {
            vec![StateChange::new(BodyTemp, -(0.5 - i) * 4.0, "thermal_stimulus_cold")]
        }
        Channel::Thermal => vec![StateChange::new(BodyTemp, (i - 0.5) * 4.0, "thermal_stimulus_heat")],
        Channel::Pain => vec![
            StateChange::new(Pain, i, "pain_stimulus"),
            StateChange::new(Adrenaline, i * 0.3, "pain_stimulus"),
        ],
        Channel::Auditory if i > 0.7 => vec![
            StateChange::new(Adrenaline, (i - 0.7) * 0.5, "startle_response"),
            StateChange::new(HeartRate, (i - 0.7) * 20.0, "startle_response"),
        ],
        Channel::Visual if i > 0.8 => vec![StateChange::new(Adrenaline, (i - 0.8) * 0.4, "visual_threat")],
        Channel::Tactile if i > 0.7 => vec![
            StateChange::new(Adrenaline, (i - 0.7) * 0.3, "physical_impact"),
            StateChange::new(Pain, (i - 0.7) * 0.5, "physical_impact"),
        ],
        Channel::Gustatory => vec![
            StateChange::new(Hunger, -i * 0.3, "eating"),
            StateChange::new(Thirst, -i * 0.2, "eating"),
            StateChange::new(BloodSugar, i * 20.0, "eating"),
            StateChange::new(Hydration, i * 0.1, "eating"),
        ],
        Channel::Olfactory if i > 0.7 => vec![StateChange::new(Adrenaline, (i - 0.7) * 0.2, "noxious_smell")],
        Channel::Vestibular if i > 0.7 => vec![
            StateChange::new(Adrenaline, (i - 0.7) * 0.4, "loss_of_balance"),
            StateChange::new(MuscleTension, (i - 0.7) * 0.5, "loss_of_balance"),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(base: DateTime<Utc>, secs: f64) -> DateTime<Utc> {
        base + Duration::microseconds((secs * 1e6) as i64)
    }

    #[test]
    fn test_zero_and_negative_dt_are_noops() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.adrenaline = 0.5;
        let before = s.clone();

        let r = p.tick(&mut s, before.last_update);
        assert!(r.is_empty());
        assert_eq!(s, before);

        let r = p.tick(&mut s, at(before.last_update, -10.0));
        assert!(r.changes.is_empty());
        assert_eq!(s.last_update, before.last_update);
        assert_eq!(s, before);
    }

    #[test]
    fn test_dt_capped() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        let start = s.last_update;
        let r = p.tick(&mut s, at(start, 3600.0));
        assert_eq!(r.dt, DEFAULT_MAX_DT);
        assert_eq!(s.last_update, at(start, 3600.0));
    }

    #[test]
    fn test_circadian_phase_advances() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.circadian_phase = 23.99;
        let start = s.last_update;
        p.tick(&mut s, at(start, 72.0));
        assert!((s.circadian_phase - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_adrenaline_half_life_over_ticks() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.adrenaline = 0.8;
        let start = s.last_update;
        // 150 s in 1 s steps
        for i in 1..=150 {
            p.tick(&mut s, at(start, i as f64));
        }
        assert!((s.adrenaline - 0.4).abs() < 0.01, "adrenaline {}", s.adrenaline);
    }

    #[test]
    fn test_cortisol_load_accumulates() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.cortisol = 0.8;
        let start = s.last_update;
        p.tick(&mut s, at(start, 10.0));
        assert!(s.cortisol_load > 4.0);
    }

    #[test]
    fn test_suppression_factor() {
        assert!((suppression_factor(0.0) - 1.0).abs() < 1e-12);
        let mut prev = 1.0;
        for load in [1.0, 10.0, 100.0, 1e4, 1e8] {
            let f = suppression_factor(load);
            assert!(f < prev && f > 0.0);
            prev = f;
        }
        assert!(suppression_factor(1e8) < 1e-6);
    }

    #[test]
    fn test_hypothermia_reversal_moves_down() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.body_temp = 31.0;
        s.muscle_tension = 0.8;
        s.heart_rate = 120.0;
        let start = s.last_update;
        p.tick(&mut s, at(start, 5.0));
        assert!(s.muscle_tension < 0.8);
        assert!(s.heart_rate < 120.0);
        // heart rate never undershoots the reversal target
        assert!(s.heart_rate >= 40.0 + (31.0 - 28.0) * 2.0 - 1e-9);
    }

    #[test]
    fn test_passive_drift() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        let start = s.last_update;
        p.tick(&mut s, at(start, 60.0));
        assert!(s.hydration < 0.8);
        assert!(s.fatigue > 0.0);
    }

    #[test]
    fn test_cold_stimulus_lowers_temperature() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        let changes = p.process_stimulus(&mut s, &Stimulus::new(Channel::Thermal, 0.1, "ice"));
        assert_eq!(changes.len(), 1);
        assert!((s.body_temp - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_cold_exposure_end_to_end() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        let before = s.clone();
        let start = s.last_update;

        p.process_stimulus(&mut s, &Stimulus::new(Channel::Thermal, 0.1, "ice water"));
        assert!(s.body_temp < 35.5);
        let r = p.tick(&mut s, at(start, 1.0));

        assert!(s.heart_rate > before.heart_rate, "heart rate {}", s.heart_rate);
        assert!(s.muscle_tension > before.muscle_tension, "tension {}", s.muscle_tension);
        assert!(s.cortisol > before.cortisol, "cortisol {}", s.cortisol);
        assert!(r.changes.iter().any(|c| c.variable == Variable::MuscleTension && c.delta > 0.0));
        for var in Variable::ALL {
            let (lo, hi) = var.range();
            let v = s.get(var);
            assert!(v.is_finite() && v >= lo && v <= hi, "{} = {}", var.name(), v);
        }
        assert!(s.in_range());
    }

    #[test]
    fn test_pain_stimulus_raises_pain_and_adrenaline() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        p.process_stimulus(&mut s, &Stimulus::new(Channel::Pain, 0.6, "cut"));
        assert!((s.pain - 0.6).abs() < 1e-9);
        assert!((s.adrenaline - 0.18).abs() < 1e-9);
    }

    #[test]
    fn test_quiet_or_invalid_stimulus_does_nothing() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        let before = s.clone();
        assert!(p
            .process_stimulus(&mut s, &Stimulus::new(Channel::Auditory, 0.3, "talk"))
            .is_empty());
        assert!(p
            .process_stimulus(&mut s, &Stimulus::new(Channel::Pain, f64::NAN, "?"))
            .is_empty());
        assert_eq!(s, before);
    }

    #[test]
    fn test_thresholds_reported() {
        let p = BioProcessor::default();
        let mut s = BiologicalState::default();
        s.blood_sugar = 40.0;
        let start = s.last_update;
        let r = p.tick(&mut s, at(start, 1.0));
        assert!(r
            .thresholds
            .iter()
            .any(|e| e.system == crate::threshold::BodySystem::Hypoglycemia));
    }
}
