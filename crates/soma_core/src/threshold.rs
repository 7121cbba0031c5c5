//! Threshold Evaluator
//!
//! Stepped severity bands per physiological system. Bands are checked from
//! most to least severe and the first match wins, so each system reports at
//! most one event per evaluation.
//!
//! Evaluation is pure. Cascades ride along inside the events as per-second
//! rates; [`apply_cascades`] turns them into deltas for a given `dt`.

use crate::change::StateChange;
use crate::state::{BiologicalState, Variable};
use serde::Serialize;
use std::fmt;

/// Five-tier biological severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Noticeable but manageable
    Mild,
    /// Impairs function
    Warning,
    /// Dangerous, demands immediate response
    Critical,
    /// Consciousness lost
    Unconscious,
    /// Incompatible with life if sustained
    Lethal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Mild => "mild",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Unconscious => "unconscious",
            Severity::Lethal => "lethal",
        };
        f.write_str(s)
    }
}

/// Stepped tier groups. One event per group per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySystem {
    Hypothermia,
    Hyperthermia,
    Hypoglycemia,
    Hyperglycemia,
    Hypoxemia,
    Circulation,
    Tachycardia,
    Bradycardia,
    Dehydration,
    Exhaustion,
}

impl fmt::Display for BodySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BodySystem::Hypothermia => "hypothermia",
            BodySystem::Hyperthermia => "hyperthermia",
            BodySystem::Hypoglycemia => "hypoglycemia",
            BodySystem::Hyperglycemia => "hyperglycemia",
            BodySystem::Hypoxemia => "hypoxemia",
            BodySystem::Circulation => "circulation",
            BodySystem::Tachycardia => "tachycardia",
            BodySystem::Bradycardia => "bradycardia",
            BodySystem::Dehydration => "dehydration",
            BodySystem::Exhaustion => "exhaustion",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdEvent {
    pub system: BodySystem,
    pub variable: Variable,
    pub severity: Severity,
    pub description: &'static str,
    /// Per-second effects of being in this band.
    pub cascade: Vec<StateChange>,
}

/// One stepped band: fires when `test(value)` holds.
struct Band {
    severity: Severity,
    test: fn(f64) -> bool,
    description: &'static str,
    cascade: &'static [(Variable, f64)],
}

/// A group of bands for one system, ordered most severe first.
struct TierGroup {
    system: BodySystem,
    variable: Variable,
    source: &'static str,
    bands: &'static [Band],
}

impl TierGroup {
    fn evaluate(&self, state: &BiologicalState) -> Option<ThresholdEvent> {
        let value = state.get(self.variable);
        let band = self.bands.iter().find(|b| (b.test)(value))?;
        Some(ThresholdEvent {
            system: self.system,
            variable: self.variable,
            severity: band.severity,
            description: band.description,
            cascade: band
                .cascade
                .iter()
                .map(|&(var, rate)| StateChange::new(var, rate, self.source))
                .collect(),
        })
    }
}

use Severity::*;
use Variable::*;

static GROUPS: &[TierGroup] = &[
    TierGroup {
        system: BodySystem::Hypothermia,
        variable: BodyTemp,
        source: "hypothermia_cascade",
        bands: &[
            Band { severity: Lethal, test: |t| t < 28.0, description: "Lethal hypothermia, cardiac arrhythmia", cascade: &[(HeartRate, -0.5), (RespiratoryRate, -0.1), (Spo2, -0.05)] },
            Band { severity: Unconscious, test: |t| t < 30.0, description: "Profound hypothermia, loss of consciousness", cascade: &[(Fatigue, 0.01), (RespiratoryRate, -0.05)] },
            Band { severity: Critical, test: |t| t < 33.0, description: "Severe hypothermia, shivering stops", cascade: &[(Cortisol, 0.002), (Fatigue, 0.005)] },
            Band { severity: Warning, test: |t| t < 35.0, description: "Moderate hypothermia, confusion", cascade: &[(Cortisol, 0.001), (Fatigue, 0.002)] },
            Band { severity: Mild, test: |t| t < 35.5, description: "Feeling cold", cascade: &[(Cortisol, 0.0005)] },
        ],
    },
    TierGroup {
        system: BodySystem::Hyperthermia,
        variable: BodyTemp,
        source: "hyperthermia_cascade",
        bands: &[
            Band { severity: Lethal, test: |t| t > 42.0, description: "Lethal hyperthermia, organ failure", cascade: &[(HeartRate, 0.5), (Spo2, -0.05)] },
            Band { severity: Critical, test: |t| t > 41.5, description: "Heat stroke", cascade: &[(Fatigue, 0.01), (Hydration, -0.001)] },
            Band { severity: Warning, test: |t| t > 40.0, description: "High fever, significant impairment", cascade: &[(Fatigue, 0.003), (Hydration, -0.0005)] },
            Band { severity: Mild, test: |t| t > 38.5, description: "Elevated temperature, discomfort", cascade: &[(Thirst, 0.001)] },
        ],
    },
    TierGroup {
        system: BodySystem::Hypoglycemia,
        variable: BloodSugar,
        source: "hypoglycemia_cascade",
        bands: &[
            Band { severity: Lethal, test: |g| g < 25.0, description: "Lethal hypoglycemia, neuronal failure", cascade: &[(HeartRate, -0.3)] },
            Band { severity: Unconscious, test: |g| g < 35.0, description: "Hypoglycemic coma", cascade: &[(Fatigue, 0.02)] },
            Band { severity: Critical, test: |g| g < 45.0, description: "Severe hypoglycemia, seizure risk", cascade: &[(Adrenaline, 0.005), (Cortisol, 0.002)] },
            Band { severity: Warning, test: |g| g < 55.0, description: "Hypoglycemia, shaking and confusion", cascade: &[(Adrenaline, 0.002), (Hunger, 0.003)] },
            Band { severity: Mild, test: |g| g < 70.0, description: "Low blood sugar, irritability", cascade: &[(Hunger, 0.002)] },
        ],
    },
    TierGroup {
        system: BodySystem::Hyperglycemia,
        variable: BloodSugar,
        source: "hyperglycemia_cascade",
        bands: &[
            Band { severity: Critical, test: |g| g > 300.0, description: "Severe hyperglycemia", cascade: &[(Thirst, 0.005), (Hydration, -0.0005)] },
            Band { severity: Warning, test: |g| g > 180.0, description: "Hyperglycemia, sluggishness", cascade: &[(Thirst, 0.002)] },
        ],
    },
    TierGroup {
        system: BodySystem::Hypoxemia,
        variable: Spo2,
        source: "hypoxemia_cascade",
        bands: &[
            Band { severity: Lethal, test: |o| o < 60.0, description: "Lethal hypoxemia", cascade: &[(HeartRate, -0.3)] },
            Band { severity: Unconscious, test: |o| o < 75.0, description: "Hypoxic loss of consciousness", cascade: &[(Fatigue, 0.02)] },
            Band { severity: Critical, test: |o| o < 85.0, description: "Severe hypoxemia, cyanosis", cascade: &[(Adrenaline, 0.005), (RespiratoryRate, 0.05)] },
            Band { severity: Warning, test: |o| o < 90.0, description: "Hypoxemia, air hunger", cascade: &[(RespiratoryRate, 0.03), (HeartRate, 0.1)] },
            Band { severity: Mild, test: |o| o < 94.0, description: "Slightly low oxygen", cascade: &[(RespiratoryRate, 0.01)] },
        ],
    },
    TierGroup {
        system: BodySystem::Circulation,
        variable: BloodPressure,
        source: "shock_cascade",
        bands: &[
            Band { severity: Critical, test: |p| p < 70.0, description: "Circulatory shock", cascade: &[(HeartRate, 0.3), (Adrenaline, 0.005)] },
        ],
    },
    TierGroup {
        system: BodySystem::Tachycardia,
        variable: HeartRate,
        source: "tachycardia_cascade",
        bands: &[
            Band { severity: Warning, test: |h| h > 180.0, description: "Severe tachycardia", cascade: &[(Fatigue, 0.002)] },
        ],
    },
    TierGroup {
        system: BodySystem::Bradycardia,
        variable: HeartRate,
        source: "bradycardia_cascade",
        bands: &[
            Band { severity: Warning, test: |h| h < 40.0, description: "Severe bradycardia", cascade: &[(Fatigue, 0.002)] },
        ],
    },
    TierGroup {
        system: BodySystem::Dehydration,
        variable: Hydration,
        source: "dehydration_cascade",
        bands: &[
            Band { severity: Critical, test: |h| h < 0.2, description: "Severe dehydration", cascade: &[(Fatigue, 0.003), (HeartRate, 0.05)] },
            Band { severity: Warning, test: |h| h < 0.4, description: "Dehydration", cascade: &[(Thirst, 0.003)] },
        ],
    },
    TierGroup {
        system: BodySystem::Exhaustion,
        variable: Fatigue,
        source: "exhaustion_cascade",
        bands: &[
            Band { severity: Warning, test: |f| f > 0.95, description: "Exhaustion", cascade: &[(MuscleTension, -0.002)] },
        ],
    },
];

/// Evaluate every system against `state`. Pure, no mutation.
pub fn evaluate(state: &BiologicalState) -> Vec<ThresholdEvent> {
    GROUPS.iter().filter_map(|g| g.evaluate(state)).collect()
}

/// Apply the cascades of `events` for `dt` seconds. Does not clamp; the
/// caller clamps once after all cascades have landed.
pub fn apply_cascades(
    state: &mut BiologicalState,
    events: &[ThresholdEvent],
    dt: f64,
) -> Vec<StateChange> {
    let mut applied = Vec::new();
    for event in events {
        for effect in &event.cascade {
            let change = effect.scaled(dt);
            state.add(change.variable, change.delta);
            applied.push(change);
        }
    }
    applied
}
