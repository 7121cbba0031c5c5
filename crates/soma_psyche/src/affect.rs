//! Core affect derived from the body.
//!
//! Four dimensions are read straight off the biological state each cycle:
//! arousal, valence (Russell's circumplex), energy, and cognitive load.
//! Stress is a composite of the first three used by every later stage.

use serde::{Deserialize, Serialize};
use soma_core::circadian;
use soma_core::BiologicalState;

/// Unregulated affect straight from biology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawAffect {
    /// 0.0 (calm) to 1.0 (activated)
    pub arousal: f64,
    /// -1.0 (unpleasant) to 1.0 (pleasant)
    pub valence: f64,
    /// 0.0 (drained) to 1.0 (vigorous)
    pub energy: f64,
    /// 0.0 (clear) to 1.0 (overloaded)
    pub cognitive_load: f64,
}

impl RawAffect {
    pub fn from_bio(bio: &BiologicalState) -> Self {
        Self {
            arousal: arousal(bio),
            valence: valence(bio),
            energy: energy(bio),
            cognitive_load: cognitive_load(bio),
        }
    }
}

fn hr_norm(bio: &BiologicalState) -> f64 {
    (bio.heart_rate - 40.0) / 160.0
}

fn bs_norm(bio: &BiologicalState) -> f64 {
    (bio.blood_sugar - 50.0) / 150.0
}

pub fn arousal(bio: &BiologicalState) -> f64 {
    let a = 0.30 * bio.adrenaline
        + 0.25 * hr_norm(bio)
        + 0.20 * bio.cortisol
        + 0.15 * bio.muscle_tension
        + 0.10 * (1.0 - bio.fatigue);
    a.clamp(0.0, 1.0)
}

pub fn valence(bio: &BiologicalState) -> f64 {
    let v = 0.35 * bio.serotonin + 0.30 * bio.dopamine + 0.15 * bio.endorphins
        - 0.20 * bio.cortisol
        - 0.30 * bio.pain;
    v.clamp(-1.0, 1.0)
}

pub fn energy(bio: &BiologicalState) -> f64 {
    let alertness = circadian::alertness(bio.circadian_phase);
    let e = 0.30 * (1.0 - bio.fatigue) + 0.25 * bs_norm(bio) + 0.25 * alertness + 0.20 * bio.dopamine;
    e.clamp(0.0, 1.0)
}

pub fn cognitive_load(bio: &BiologicalState) -> f64 {
    // soft cap, 0.5 at a load of 5
    let load = bio.cortisol_load.max(0.0);
    let duration = load / (load + 5.0);
    let c = 0.30 * duration + 0.25 * bio.fatigue + 0.25 * (1.0 - bs_norm(bio)) + 0.20 * bio.pain;
    c.clamp(0.0, 1.0)
}

/// High arousal, negative valence and a heavy cognitive load add up to stress.
pub fn stress(arousal: f64, valence: f64, cognitive_load: f64) -> f64 {
    let negative = (-valence).max(0.0);
    (0.35 * arousal + 0.35 * negative + 0.30 * cognitive_load).clamp(0.0, 1.0)
}

/// Coarse verbal band for an affect reading, used when the agent describes itself.
pub fn label(arousal: f64, valence: f64) -> &'static str {
    match (valence >= 0.0, arousal >= 0.5) {
        _ if arousal < 0.2 && valence.abs() < 0.15 => "flat",
        (true, true) if valence > 0.3 => "excited",
        (true, true) => "alert",
        (true, false) if valence > 0.3 => "content",
        (true, false) => "calm",
        (false, true) if valence < -0.4 => "panicked",
        (false, true) => "tense",
        (false, false) if valence < -0.4 => "miserable",
        (false, false) => "low",
    }
}
