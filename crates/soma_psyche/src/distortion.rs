//! Cognitive distortions.
//!
//! Six independent Bernoulli trials per cycle. Each kind has a base rate
//! scaled by personality, by a stepped stress multiplier, and reduced by
//! effective regulation.

use crate::personality::Personality;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distortion {
    /// Assuming the worst possible outcome
    Catastrophizing,
    /// Black-and-white thinking
    AllOrNothing,
    /// Blaming self for external events
    Personalization,
    /// "I feel it, so it must be true"
    EmotionalReasoning,
    /// "This always happens"
    Overgeneralization,
    /// Assuming others think badly of you
    MindReading,
}

impl Distortion {
    pub const ALL: [Distortion; 6] = [
        Distortion::Catastrophizing,
        Distortion::AllOrNothing,
        Distortion::Personalization,
        Distortion::EmotionalReasoning,
        Distortion::Overgeneralization,
        Distortion::MindReading,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Distortion::Catastrophizing => "catastrophizing",
            Distortion::AllOrNothing => "all_or_nothing",
            Distortion::Personalization => "personalization",
            Distortion::EmotionalReasoning => "emotional_reasoning",
            Distortion::Overgeneralization => "overgeneralization",
            Distortion::MindReading => "mind_reading",
        }
    }

    /// The distortion phrased as a tendency, never as a diagnosis.
    pub fn tendency(self) -> &'static str {
        match self {
            Distortion::Catastrophizing => "your mind jumps to the worst possible outcome",
            Distortion::AllOrNothing => "things feel either completely fine or completely ruined",
            Distortion::Personalization => "you feel somehow responsible for what is happening",
            Distortion::EmotionalReasoning => "your feelings seem like proof of how things are",
            Distortion::Overgeneralization => "this feels like it always happens",
            Distortion::MindReading => "you suspect others are judging you",
        }
    }

    pub fn base_rate(self) -> f64 {
        match self {
            Distortion::Catastrophizing => 0.05,
            Distortion::AllOrNothing => 0.04,
            Distortion::Personalization => 0.03,
            Distortion::EmotionalReasoning => 0.06,
            Distortion::Overgeneralization => 0.04,
            Distortion::MindReading => 0.03,
        }
    }

    pub fn trait_multiplier(self, p: &Personality) -> f64 {
        let n = p.neuroticism();
        match self {
            Distortion::Catastrophizing => 1.0 + n * 2.0 + (1.0 - p.openness()) * 0.5,
            Distortion::AllOrNothing => 1.0 + n * 1.5 + (1.0 - p.openness()),
            Distortion::Personalization => 1.0 + n * 1.5 + p.agreeableness() * 0.8,
            Distortion::EmotionalReasoning => 1.0 + n + (1.0 - p.conscientiousness()) * 0.8,
            Distortion::Overgeneralization => 1.0 + n * 1.5,
            Distortion::MindReading => 1.0 + n * 1.5 + p.extraversion() * 0.5,
        }
    }

    /// Activation probability for one cycle, capped at 1.
    pub fn probability(self, stress: f64, effective_regulation: f64, p: &Personality) -> f64 {
        let reduction = 1.0 - effective_regulation.clamp(0.0, 1.0) * 0.6;
        (self.base_rate() * stress_multiplier(stress) * self.trait_multiplier(p) * reduction)
            .clamp(0.0, 1.0)
    }
}

impl fmt::Display for Distortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimal below 0.3 stress, accelerating sharply above 0.7.
pub fn stress_multiplier(stress: f64) -> f64 {
    if stress <= 0.3 {
        1.0
    } else if stress <= 0.5 {
        1.0 + (stress - 0.3) * 2.5
    } else if stress <= 0.7 {
        1.5 + (stress - 0.5) * 3.0
    } else {
        2.1 + (stress - 0.7) * 4.0
    }
}

/// Run the six trials against the thread RNG.
pub fn activate(stress: f64, effective_regulation: f64, p: &Personality) -> Vec<Distortion> {
    let mut rng = rand::thread_rng();
    activate_with(stress, effective_regulation, p, || rng.gen::<f64>())
}

/// Same as [`activate`], drawing one value in `[0, 1)` per kind from `rand_fn`.
pub fn activate_with(
    stress: f64,
    effective_regulation: f64,
    p: &Personality,
    mut rand_fn: impl FnMut() -> f64,
) -> Vec<Distortion> {
    Distortion::ALL
        .into_iter()
        .filter(|d| rand_fn() < d.probability(stress, effective_regulation, p))
        .collect()
}
