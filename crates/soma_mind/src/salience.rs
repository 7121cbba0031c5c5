//! Salience gate: decides when a change in the felt state is worth a thought.
//!
//! Each dimension is scored by how fast it moved, how long it has been out
//! of awareness (novelty), where attention points, and whether it has reached
//! an extreme. The best-scoring dimension wins; if it clears a threshold that
//! itself depends on the current mood, the change breaks into awareness.

use serde::{Deserialize, Serialize};
use soma_psyche::PsychologicalState;
use std::fmt;

/// Novelty stops growing after this long out of awareness.
const NOVELTY_CAP_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Arousal,
    Valence,
    Energy,
    /// `min(1, -valence · arousal)` when valence is negative
    Pain,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Arousal,
        Dimension::Valence,
        Dimension::Energy,
        Dimension::Pain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Arousal => "arousal",
            Dimension::Valence => "valence",
            Dimension::Energy => "energy",
            Dimension::Pain => "pain",
        }
    }

    fn read(self, psych: &PsychologicalState) -> f64 {
        match self {
            Dimension::Arousal => psych.arousal,
            Dimension::Valence => psych.valence,
            Dimension::Energy => psych.energy,
            Dimension::Pain => psych.pain_signal(),
        }
    }

    /// Bonus for being in an extreme range.
    fn breach_bonus(self, value: f64) -> f64 {
        match self {
            Dimension::Arousal if value > 0.8 => 0.5,
            Dimension::Valence if value < -0.6 => 0.4,
            Dimension::Energy if value < 0.15 => 0.3,
            Dimension::Pain if value > 0.6 => 0.6,
            _ => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalienceResult {
    /// Best dimension score
    pub score: f64,
    /// Dimension with the best score, `None` when nothing moved
    pub trigger: Option<Dimension>,
    /// Threshold used this call
    pub threshold: f64,
    pub exceeded: bool,
}

/// `1 + ln(1 + s/60) · 0.3`, saturating at one hour.
pub fn novelty_weight(secs_since_aware: f64) -> f64 {
    1.0 + (secs_since_aware.clamp(0.0, NOVELTY_CAP_SECS) / 60.0).ln_1p() * 0.3
}

/// Inward attention (+1) amplifies body signals, outward (-1) mutes them.
pub fn attention_modifier(direction: f64) -> f64 {
    1.0 + direction.clamp(-1.0, 1.0) * 0.5
}

/// Base 0.3, lower when anxious or drained, higher when absorbed.
pub fn dynamic_threshold(psych: &PsychologicalState) -> f64 {
    let mut threshold: f64 = 0.3;
    if psych.arousal > 0.5 && psych.valence < -0.2 {
        threshold -= 0.1;
    }
    if psych.energy < 0.3 {
        threshold -= 0.05;
    }
    if psych.cognitive_load > 0.6 {
        threshold += 0.1;
    }
    threshold.clamp(0.1, 0.6)
}

#[derive(Debug, Clone, Default)]
pub struct SalienceCalculator {
    /// Values seen on the previous call, `None` until the baseline exists
    previous: Option<[f64; 4]>,
    /// Seconds since each dimension was last noticed
    novelty_clock: [f64; 4],
    attention_direction: f64,
}

impl SalienceCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attention_direction(&self) -> f64 {
        self.attention_direction
    }

    /// `-1` fully outward (engaged), `+1` fully inward (introspective).
    pub fn set_attention_direction(&mut self, direction: f64) {
        self.attention_direction = if direction.is_finite() {
            direction.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    /// Mark a dimension as just noticed.
    pub fn reset_novelty(&mut self, dimension: Dimension) {
        self.novelty_clock[dimension.index()] = 0.0;
    }

    pub fn novelty_secs(&self, dimension: Dimension) -> f64 {
        self.novelty_clock[dimension.index()]
    }

    /// Score the change since the previous call. The first call only records
    /// a baseline; `dt <= 0` changes nothing.
    pub fn compute(&mut self, psych: &PsychologicalState, dt: f64) -> SalienceResult {
        if dt <= 0.0 || !dt.is_finite() {
            return SalienceResult::default();
        }

        let current = Dimension::ALL.map(|d| d.read(psych));
        let Some(previous) = self.previous.replace(current) else {
            tracing::debug!("Salience baseline established");
            return SalienceResult::default();
        };

        for clock in self.novelty_clock.iter_mut() {
            *clock = (*clock + dt).min(NOVELTY_CAP_SECS);
        }

        let attention = attention_modifier(self.attention_direction);
        let mut score = 0.0;
        let mut trigger = None;
        for dim in Dimension::ALL {
            let i = dim.index();
            let rate = (current[i] - previous[i]).abs() / dt;
            let salience = rate * novelty_weight(self.novelty_clock[i]) * attention + dim.breach_bonus(current[i]);
            if salience > score {
                score = salience;
                trigger = Some(dim);
            }
        }

        let threshold = dynamic_threshold(psych);
        let exceeded = score > threshold;
        if let (true, Some(dim)) = (exceeded, trigger) {
            self.reset_novelty(dim);
            tracing::debug!(dimension = %dim, score, threshold, "Salience exceeded");
        }

        SalienceResult {
            score,
            trigger,
            threshold,
            exceeded,
        }
    }
}
