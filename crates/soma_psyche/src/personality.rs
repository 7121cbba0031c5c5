//! Big Five personality and the trait-derived modulation factors.
//!
//! Traits are fixed for the lifetime of an agent. Everything else in the
//! psychological layer reads them through the helpers below.

use serde::{Deserialize, Serialize};
use soma_core::config::PersonalityConfig;

/// Five immutable trait levels, each in `[0, 1]` with population mean 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    openness: f64,
    conscientiousness: f64,
    extraversion: f64,
    agreeableness: f64,
    neuroticism: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

fn trait_level(v: f64, name: &str) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        tracing::warn!("Non-finite personality trait {}, using 0.5", name);
        0.5
    }
}

impl Personality {
    /// Out-of-range values are clamped into `[0, 1]`.
    pub fn new(
        openness: f64,
        conscientiousness: f64,
        extraversion: f64,
        agreeableness: f64,
        neuroticism: f64,
    ) -> Self {
        Self {
            openness: trait_level(openness, "openness"),
            conscientiousness: trait_level(conscientiousness, "conscientiousness"),
            extraversion: trait_level(extraversion, "extraversion"),
            agreeableness: trait_level(agreeableness, "agreeableness"),
            neuroticism: trait_level(neuroticism, "neuroticism"),
        }
    }

    pub fn openness(&self) -> f64 {
        self.openness
    }

    pub fn conscientiousness(&self) -> f64 {
        self.conscientiousness
    }

    pub fn extraversion(&self) -> f64 {
        self.extraversion
    }

    pub fn agreeableness(&self) -> f64 {
        self.agreeableness
    }

    pub fn neuroticism(&self) -> f64 {
        self.neuroticism
    }

    /// Amplification of negative valence. 0.8 neuroticism gives 1.36, 0.2 gives 0.64.
    pub fn negative_emotion_multiplier(&self) -> f64 {
        1.0 + (self.neuroticism - 0.5) * 1.2
    }

    /// How fast isolation turns into loneliness. Extraverts suffer sooner.
    pub fn isolation_distress_rate(&self) -> f64 {
        1.0 + (self.extraversion - 0.5) * 1.5
    }

    /// Trait-level emotional regulation capacity, roughly 0.3 to 0.85.
    pub fn baseline_regulation(&self) -> f64 {
        (0.3 + self.conscientiousness * 0.2 + self.openness * 0.15 + (1.0 - self.neuroticism) * 0.2)
            .clamp(0.0, 1.0)
    }

    /// Need for external stimulation.
    pub fn stimulation_seeking(&self) -> f64 {
        0.3 + self.extraversion * 0.5
    }

    /// Capacity for cognitive reappraisal.
    pub fn reappraisal_ability(&self) -> f64 {
        0.2 + self.openness * 0.5
    }

    /// Resistance to isolation effects, roughly 0.1 to 0.9.
    pub fn isolation_resilience(&self) -> f64 {
        (1.0 - self.extraversion) * 0.5 + (1.0 - self.neuroticism) * 0.3 + self.conscientiousness * 0.2
    }

    /// One-line trait summary for prompts, naming only the pronounced traits.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let mut note = |v: f64, high: &'static str, low: &'static str| {
            if v >= 0.7 {
                parts.push(high);
            } else if v <= 0.3 {
                parts.push(low);
            }
        };
        note(self.openness, "curious and imaginative", "conventional and cautious");
        note(self.conscientiousness, "organized and disciplined", "spontaneous and disorganized");
        note(self.extraversion, "outgoing and sociable", "reserved and solitary");
        note(self.agreeableness, "warm and accommodating", "blunt and skeptical");
        note(self.neuroticism, "anxious and easily upset", "calm and emotionally steady");
        if parts.is_empty() {
            "fairly balanced in temperament".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl From<&PersonalityConfig> for Personality {
    fn from(cfg: &PersonalityConfig) -> Self {
        Self::new(
            cfg.openness,
            cfg.conscientiousness,
            cfg.extraversion,
            cfg.agreeableness,
            cfg.neuroticism,
        )
    }
}
