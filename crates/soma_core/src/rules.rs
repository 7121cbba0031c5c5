//! Interaction Rule Set
//!
//! Physiological couplings expressed as data: every rule is a
//! `(name, condition, target, per-second delta)` tuple. The engine evaluates
//! all conditions against one snapshot taken before the pass and accumulates
//! the deltas, so no rule ever sees another rule's output within the same tick.
//!
//! Rates are per second and multiplied by `dt` inside the delta function.

use crate::change::StateChange;
use crate::state::{BiologicalState, Variable};

pub type Condition = fn(&BiologicalState) -> bool;
pub type DeltaFn = fn(&BiologicalState, f64) -> f64;

/// One declarative coupling between biological variables.
#[derive(Clone, Copy)]
pub struct InteractionRule {
    pub name: &'static str,
    pub target: Variable,
    pub condition: Condition,
    pub delta: DeltaFn,
}

impl std::fmt::Debug for InteractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRule")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

fn rule(name: &'static str, target: Variable, condition: Condition, delta: DeltaFn) -> InteractionRule {
    InteractionRule {
        name,
        target,
        condition,
        delta,
    }
}

/// Below this core temperature compensations fail: shivering stops and the
/// heart slows. Rules pushing heart rate or muscle tension up are skipped.
pub const HYPOTHERMIA_REVERSAL_TEMP: f64 = 33.0;

/// Deltas smaller than this are treated as no-ops.
const NEGLIGIBLE_DELTA: f64 = 1e-10;

/// The fixed rule table evaluated by a single-pass engine.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<InteractionRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl RuleSet {
    pub fn new(rules: Vec<InteractionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against `snapshot` and return the matching deltas.
    /// Pure: the caller applies the result to the live state.
    pub fn evaluate(&self, snapshot: &BiologicalState, dt: f64) -> Vec<StateChange> {
        let reversal = snapshot.body_temp < HYPOTHERMIA_REVERSAL_TEMP;
        let mut changes = Vec::new();

        for r in &self.rules {
            if !(r.condition)(snapshot) {
                continue;
            }
            let delta = (r.delta)(snapshot, dt);
            if !delta.is_finite() || delta.abs() < NEGLIGIBLE_DELTA {
                continue;
            }
            if reversal && delta > 0.0 && reversal_blocks(r.target) {
                tracing::trace!(rule = r.name, "suppressed during hypothermic reversal");
                continue;
            }
            changes.push(StateChange::new(r.target, delta, r.name));
        }

        changes
    }
}

fn reversal_blocks(target: Variable) -> bool {
    matches!(target, Variable::HeartRate | Variable::MuscleTension)
}

/// The standard physiology table.
pub fn default_rules() -> Vec<InteractionRule> {
    use Variable::*;

    vec![
        // ── Thermoregulation: cold ─────────────────────────────────
        rule("cold_shivering", MuscleTension,
            |s| s.body_temp < 35.5 && s.body_temp >= 33.0,
            |s, dt| (35.5 - s.body_temp) * 0.15 * dt),
        rule("cold_tachycardia", HeartRate,
            |s| s.body_temp < 35.5 && s.body_temp >= 33.0,
            |s, dt| (35.5 - s.body_temp) * 0.3 * dt),
        rule("cold_cortisol", Cortisol,
            |s| s.body_temp < 35.5 && s.body_temp >= 33.0,
            |_, dt| 0.002 * dt),
        rule("cold_adrenaline", Adrenaline,
            |s| s.body_temp < 35.0 && s.body_temp >= 33.0,
            |_, dt| 0.005 * dt),
        rule("cold_glycogen_burn", Glycogen,
            |s| s.body_temp < 35.5 && s.muscle_tension > 0.3 && s.glycogen > 0.0,
            |s, dt| -(s.muscle_tension * 0.0002 * dt).min(s.glycogen)),
        rule("cold_vasoconstriction", BloodPressure,
            |s| s.body_temp < 35.5 && s.body_temp >= 33.0,
            |s, dt| (35.5 - s.body_temp) * 0.1 * dt),

        // ── Thermoregulation: heat ─────────────────────────────────
        rule("fever_tachycardia", HeartRate,
            |s| s.body_temp > 38.5,
            |s, dt| (s.body_temp - 38.5) * 0.3 * dt),
        rule("fever_immune", ImmuneResponse,
            |s| s.body_temp > 38.5,
            |_, dt| 0.001 * dt),
        rule("fever_fatigue", Fatigue,
            |s| s.body_temp > 39.5,
            |_, dt| 0.003 * dt),
        rule("heat_sweating", Hydration,
            |s| s.body_temp > 37.5,
            |s, dt| -(s.body_temp - 37.5) * 0.0002 * dt),
        rule("heat_thirst", Thirst,
            |s| s.body_temp > 37.5,
            |s, dt| (s.body_temp - 37.5) * 0.001 * dt),

        // ── Heart rate ─────────────────────────────────────────────
        rule("hr_bp_coupling", BloodPressure,
            |s| s.heart_rate > 100.0,
            |s, dt| (s.heart_rate - 100.0) * 0.005 * dt),
        rule("hr_respiratory_demand", RespiratoryRate,
            |s| s.heart_rate > 100.0,
            |s, dt| (s.heart_rate - 100.0) * 0.004 * dt),
        rule("hr_metabolic_demand", BloodSugar,
            |s| s.heart_rate > 100.0,
            |_, dt| -0.02 * dt),
        rule("hr_sustained_fatigue", Fatigue,
            |s| s.heart_rate > 150.0,
            |_, dt| 0.005 * dt),
        rule("bradycardia_hypotension", BloodPressure,
            |s| s.heart_rate < 50.0,
            |s, dt| -(50.0 - s.heart_rate) * 0.02 * dt),
        rule("bradycardia_hypoxia", Spo2,
            |s| s.heart_rate < 50.0,
            |_, dt| -0.001 * dt),

        // ── Blood pressure ─────────────────────────────────────────
        rule("low_bp_compensation", HeartRate,
            |s| s.blood_pressure < 90.0,
            |s, dt| (90.0 - s.blood_pressure) * 0.02 * dt),
        rule("low_bp_fatigue", Fatigue,
            |s| s.blood_pressure < 90.0,
            |_, dt| 0.002 * dt),
        rule("low_bp_perfusion", Spo2,
            |s| s.blood_pressure < 80.0,
            |_, dt| -0.003 * dt),
        rule("high_bp_headache", Pain,
            |s| s.blood_pressure > 160.0,
            |_, dt| 0.001 * dt),

        // ── Respiration ────────────────────────────────────────────
        rule("hyperventilation_fatigue", Fatigue,
            |s| s.respiratory_rate > 35.0,
            |_, dt| 0.002 * dt),
        rule("hyperventilation_tension", MuscleTension,
            |s| s.respiratory_rate > 35.0,
            |_, dt| 0.001 * dt),
        rule("hypoventilation", Spo2,
            |s| s.respiratory_rate < 10.0,
            |_, dt| -0.005 * dt),
        rule("respiratory_failure", Spo2,
            |s| s.respiratory_rate < 8.0,
            |_, dt| -0.01 * dt),

        // ── Blood sugar ────────────────────────────────────────────
        rule("low_bs_adrenaline", Adrenaline,
            |s| s.blood_sugar < 70.0,
            |_, dt| 0.003 * dt),
        rule("low_bs_cortisol", Cortisol,
            |s| s.blood_sugar < 70.0,
            |_, dt| 0.001 * dt),
        rule("low_bs_hunger", Hunger,
            |s| s.blood_sugar < 70.0,
            |s, dt| (1.0 - s.hunger).min(0.005 * dt)),
        rule("low_bs_fatigue", Fatigue,
            |s| s.blood_sugar < 60.0,
            |_, dt| 0.004 * dt),
        rule("low_bs_weakness", MuscleTension,
            |s| s.blood_sugar < 55.0,
            |_, dt| -0.002 * dt),
        rule("high_bs_thirst", Thirst,
            |s| s.blood_sugar > 140.0,
            |_, dt| 0.002 * dt),
        rule("high_bs_fatigue", Fatigue,
            |s| s.blood_sugar > 160.0,
            |_, dt| 0.001 * dt),
        rule("glycogen_release", BloodSugar,
            |s| s.blood_sugar < 80.0 && s.glycogen > 0.05,
            |_, dt| 0.1 * dt),
        rule("glycogen_depletion", Glycogen,
            |s| s.blood_sugar < 80.0 && s.glycogen > 0.05,
            |_, dt| -0.0005 * dt),
        rule("satiety", Hunger,
            |s| s.blood_sugar > 110.0 && s.hunger > 0.0,
            |_, dt| -0.003 * dt),
        rule("fasting_hunger", Hunger,
            |s| s.glycogen < 0.4,
            |s, dt| (0.4 - s.glycogen) * 0.0005 * dt),

        // ── Cortisol ───────────────────────────────────────────────
        rule("cortisol_gluconeogenesis", BloodSugar,
            |s| s.cortisol > 0.5,
            |_, dt| 0.05 * dt),
        rule("cortisol_serotonin_depletion", Serotonin,
            |s| s.cortisol > 0.5,
            |_, dt| -0.0005 * dt),
        rule("cortisol_tachycardia", HeartRate,
            |s| s.cortisol > 0.3,
            |s, dt| (s.cortisol - 0.3) * 0.5 * dt),
        rule("cortisol_hypertension", BloodPressure,
            |s| s.cortisol > 0.3,
            |s, dt| (s.cortisol - 0.3) * 0.3 * dt),
        rule("cortisol_immune_suppression", ImmuneResponse,
            |s| s.cortisol > 0.6,
            |_, dt| -0.0005 * dt),

        // ── Adrenaline ─────────────────────────────────────────────
        rule("adrenaline_heart_rate", HeartRate,
            |s| s.adrenaline > 0.2,
            |s, dt| s.adrenaline * 0.5 * dt),
        rule("adrenaline_blood_pressure", BloodPressure,
            |s| s.adrenaline > 0.2,
            |s, dt| s.adrenaline * 0.15 * dt),
        rule("adrenaline_respiration", RespiratoryRate,
            |s| s.adrenaline > 0.2,
            |s, dt| s.adrenaline * 0.1 * dt),
        rule("adrenaline_glucose_release", BloodSugar,
            |s| s.adrenaline > 0.1,
            |s, dt| s.adrenaline * 0.05 * dt),
        rule("adrenaline_analgesia", Pain,
            |s| s.adrenaline > 0.3 && s.pain > 0.0,
            |s, dt| -s.pain * s.adrenaline * 0.5 * dt),
        rule("adrenaline_muscle_tension", MuscleTension,
            |s| s.adrenaline > 0.3,
            |s, dt| s.adrenaline * 0.3 * dt),
        rule("adrenaline_crash", Fatigue,
            |s| s.adrenaline > 0.7,
            |_, dt| 0.008 * dt),

        // ── Serotonin / dopamine ───────────────────────────────────
        rule("low_serotonin_stress", Cortisol,
            |s| s.serotonin < 0.2,
            |_, dt| 0.0005 * dt),
        rule("dopamine_analgesia", Pain,
            |s| s.dopamine > 0.5 && s.pain > 0.0,
            |s, dt| -s.pain * 0.2 * dt),
        rule("dopamine_arousal", HeartRate,
            |s| s.dopamine > 0.6,
            |s, dt| (s.dopamine - 0.6) * 0.5 * dt),
        rule("low_dopamine_lethargy", Fatigue,
            |s| s.dopamine < 0.15,
            |_, dt| 0.001 * dt),

        // ── Pain ───────────────────────────────────────────────────
        rule("pain_cortisol", Cortisol,
            |s| s.pain > 0.3,
            |s, dt| s.pain * 0.003 * dt),
        rule("pain_heart_rate", HeartRate,
            |s| s.pain > 0.3,
            |s, dt| s.pain * 0.3 * dt),
        rule("pain_blood_pressure", BloodPressure,
            |s| s.pain > 0.3,
            |s, dt| s.pain * 0.1 * dt),
        rule("pain_guarding", MuscleTension,
            |s| s.pain > 0.3,
            |s, dt| s.pain * 0.4 * dt),
        rule("pain_adrenaline", Adrenaline,
            |s| s.pain > 0.5,
            |_, dt| 0.002 * dt),
        rule("pain_respiration", RespiratoryRate,
            |s| s.pain > 0.7,
            |s, dt| (s.pain - 0.7) * 0.3 * dt),
        rule("pain_endorphin_release", Endorphins,
            |s| s.pain > 0.8,
            |_, dt| 0.002 * dt),

        // ── Fatigue ────────────────────────────────────────────────
        rule("fatigue_heart_rate", HeartRate,
            |s| s.fatigue > 0.6,
            |_, dt| 0.05 * dt),
        rule("fatigue_cortisol", Cortisol,
            |s| s.fatigue > 0.7,
            |_, dt| 0.0005 * dt),
        rule("fatigue_immune", ImmuneResponse,
            |s| s.fatigue > 0.8,
            |_, dt| -0.0005 * dt),
        rule("fatigue_muscle_weakness", MuscleTension,
            |s| s.fatigue > 0.9,
            |_, dt| -0.001 * dt),

        // ── Immune response ────────────────────────────────────────
        rule("immune_fever", BodyTemp,
            |s| s.immune_response > 0.4,
            |s, dt| (s.immune_response - 0.4) * 0.005 * dt),
        rule("immune_fatigue", Fatigue,
            |s| s.immune_response > 0.5,
            |_, dt| 0.003 * dt),
        rule("immune_aches", MuscleTension,
            |s| s.immune_response > 0.5,
            |_, dt| 0.001 * dt),
        rule("immune_appetite_loss", Hunger,
            |s| s.immune_response > 0.6 && s.hunger > 0.0,
            |_, dt| -0.002 * dt),
        rule("immune_mood", Serotonin,
            |s| s.immune_response > 0.3,
            |_, dt| -0.0003 * dt),

        // ── Muscle tension ─────────────────────────────────────────
        rule("tension_pain", Pain,
            |s| s.muscle_tension > 0.6,
            |_, dt| 0.001 * dt),
        rule("tension_glucose_use", BloodSugar,
            |s| s.muscle_tension > 0.5,
            |_, dt| -0.01 * dt),
        rule("tension_fatigue", Fatigue,
            |s| s.muscle_tension > 0.7,
            |_, dt| 0.002 * dt),

        // ── Hydration ──────────────────────────────────────────────
        rule("dehydration_tachycardia", HeartRate,
            |s| s.hydration < 0.6,
            |s, dt| (0.6 - s.hydration) * 0.5 * dt),
        rule("dehydration_hypotension", BloodPressure,
            |s| s.hydration < 0.6,
            |s, dt| -(0.6 - s.hydration) * 0.2 * dt),
        rule("dehydration_fatigue", Fatigue,
            |s| s.hydration < 0.4,
            |_, dt| 0.005 * dt),
        rule("dehydration_immune", ImmuneResponse,
            |s| s.hydration < 0.3,
            |_, dt| -0.002 * dt),
        rule("dehydration_thirst", Thirst,
            |s| s.hydration < 0.7,
            |s, dt| (1.0 - s.thirst).min((0.7 - s.hydration) * 0.01 * dt)),
        rule("hydrated_quench", Thirst,
            |s| s.hydration > 0.85 && s.thirst > 0.0,
            |_, dt| -0.01 * dt),

        // ── Oxygen ─────────────────────────────────────────────────
        rule("hypoxia_tachycardia", HeartRate,
            |s| s.spo2 < 94.0,
            |s, dt| (94.0 - s.spo2) * 0.05 * dt),
        rule("hypoxia_hyperventilation", RespiratoryRate,
            |s| s.spo2 < 94.0,
            |s, dt| (94.0 - s.spo2) * 0.05 * dt),
        rule("hypoxia_panic", Adrenaline,
            |s| s.spo2 < 90.0,
            |_, dt| 0.005 * dt),
        rule("hypoxia_fatigue", Fatigue,
            |s| s.spo2 < 88.0,
            |_, dt| 0.01 * dt),

        // ── Endorphins ─────────────────────────────────────────────
        rule("endorphin_analgesia", Pain,
            |s| s.endorphins > 0.3 && s.pain > 0.0,
            |s, dt| -s.pain * s.endorphins * 0.3 * dt),
        rule("endorphin_mood", Dopamine,
            |s| s.endorphins > 0.4,
            |s, dt| (s.endorphins - 0.4) * 0.001 * dt),
    ]
}
