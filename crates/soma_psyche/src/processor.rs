//! Psychological Processor
//!
//! Turns one biological snapshot into a [`PsychologicalState`]:
//! 1. raw affect from biology
//! 2. neuroticism amplifies negative valence
//! 3. stress composite
//! 4. regulation depletion or recovery
//! 5. regulation dampens arousal and valence
//! 6. distortion trials
//! 7. coping selection
//! 8. isolation timeline
//! 9. emotional memory activations
//!
//! The processor never touches biology. Feedback is returned separately by
//! [`crate::feedback::feedback_changes`] and applied by the caller.

use chrono::{DateTime, Utc};
use rand::Rng;
use soma_core::{BiologicalState, ThresholdEvent};

use crate::affect::{self, RawAffect};
use crate::coping::{self, CopingResources};
use crate::distortion;
use crate::isolation::IsolationState;
use crate::memory::{EmotionalMemory, EmotionalMemoryStore};
use crate::personality::Personality;
use crate::regulation::RegulationState;
use crate::state::PsychologicalState;

/// Steps 1 to 7 as a pure function: everything except the state the
/// processor carries between cycles. Isolation and memories are left empty.
///
/// `rand_fn` supplies one draw in `[0, 1)` per distortion trial.
pub fn derive(
    bio: &BiologicalState,
    personality: &Personality,
    regulation: RegulationState,
    dt: f64,
    controllability: f64,
    rand_fn: impl FnMut() -> f64,
) -> (PsychologicalState, RegulationState) {
    let raw = RawAffect::from_bio(bio);

    let mut valence = raw.valence;
    if valence < 0.0 {
        valence = (valence * personality.negative_emotion_multiplier()).clamp(-1.0, 1.0);
    }

    let stress = affect::stress(raw.arousal, valence, raw.cognitive_load);

    let regulation = regulation.update(personality, stress, dt);
    let effective = regulation.effective(bio.fatigue);

    let arousal = (raw.arousal * (1.0 - effective * 0.5)).clamp(0.0, 1.0);
    let valence = (valence * (1.0 - effective * 0.3)).clamp(-1.0, 1.0);

    let distortions = distortion::activate_with(stress, effective, personality, rand_fn);

    let resources = CopingResources {
        cognitive: 1.0 - raw.cognitive_load,
        energy: raw.energy,
        regulation: regulation.capacity,
    };
    let coping = coping::select(stress, personality, &resources, controllability.clamp(0.0, 1.0));

    let psych = PsychologicalState {
        arousal,
        valence,
        energy: raw.energy,
        cognitive_load: raw.cognitive_load,
        regulation_capacity: regulation.capacity,
        stress,
        distortions,
        coping,
        memories: Vec::new(),
        isolation: IsolationState::default(),
    };
    (psych, regulation)
}

/// Owns the state that persists between cycles for one agent.
#[derive(Debug, Clone)]
pub struct PsychProcessor {
    personality: Personality,
    regulation: RegulationState,
    isolation: IsolationState,
    memories: EmotionalMemoryStore,
}

impl PsychProcessor {
    pub fn new(personality: Personality) -> Self {
        Self {
            regulation: RegulationState::new(&personality),
            personality,
            isolation: IsolationState::default(),
            memories: EmotionalMemoryStore::new(),
        }
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn regulation(&self) -> RegulationState {
        self.regulation
    }

    pub fn isolation(&self) -> IsolationState {
        self.isolation
    }

    pub fn memories(&self) -> &EmotionalMemoryStore {
        &self.memories
    }

    /// One cycle using the thread RNG for distortion trials.
    pub fn process(
        &mut self,
        bio: &BiologicalState,
        dt: f64,
        controllability: f64,
        now: DateTime<Utc>,
    ) -> PsychologicalState {
        let mut rng = rand::thread_rng();
        self.process_with(bio, dt, controllability, now, || rng.gen::<f64>())
    }

    /// One cycle with caller-supplied randomness.
    pub fn process_with(
        &mut self,
        bio: &BiologicalState,
        dt: f64,
        controllability: f64,
        now: DateTime<Utc>,
        rand_fn: impl FnMut() -> f64,
    ) -> PsychologicalState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let (mut psych, regulation) = derive(bio, &self.personality, self.regulation, dt, controllability, rand_fn);
        self.regulation = regulation;

        self.isolation = self.isolation.update(&self.personality, dt);
        psych.isolation = self.isolation;

        psych.memories = self.memories.activations(bio, now);

        tracing::trace!(
            stress = psych.stress,
            regulation = psych.regulation_capacity,
            distortions = psych.distortions.len(),
            "psych cycle"
        );
        psych
    }

    /// Social contact resets the isolation timeline.
    pub fn record_social_contact(&mut self) {
        if self.isolation.phase > crate::isolation::IsolationPhase::None {
            tracing::debug!(phase = %self.isolation.phase, "Isolation reset by social contact");
        }
        self.isolation = IsolationState::default();
    }

    pub fn add_memory(&mut self, memory: EmotionalMemory) {
        self.memories.add(memory);
    }

    /// Store memories for any critical body crises in `events`.
    pub fn remember_crises(&mut self, events: &[ThresholdEvent], now: DateTime<Utc>) -> usize {
        self.memories.remember_crises(events, now)
    }
}
