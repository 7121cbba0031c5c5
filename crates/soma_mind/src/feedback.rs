//! Reading a generated thought back into the body.
//!
//! Two channels:
//! - keyword heuristics spot coping strategies and distortions in the text,
//!   which cost or soothe the body through [`soma_psyche::feedback_changes`]
//! - a trailing `[STATE: arousal=X, valence=Y]` annotation becomes a one-off
//!   emotional pulse

use regex::Regex;
use serde::Serialize;
use soma_core::{StateChange, Variable};
use soma_psyche::{feedback_changes, CopingStrategy, Distortion};
use std::sync::LazyLock;

static RE_STATE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[STATE:\s*arousal=([-\d.]+),\s*valence=([-\d.]+)\]").unwrap());

const EMOTIONAL_SOURCE: &str = "thought_emotional";

/// Self-reported affect from the annotation. Arousal `[0, 1]`, valence `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EmotionalTag {
    pub arousal: f64,
    pub valence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThoughtFeedback {
    pub coping: Vec<CopingStrategy>,
    pub distortions: Vec<Distortion>,
    pub emotional_state: Option<EmotionalTag>,
}

impl ThoughtFeedback {
    pub fn is_empty(&self) -> bool {
        self.coping.is_empty() && self.distortions.is_empty() && self.emotional_state.is_none()
    }

    /// Body changes for this thought. Coping and distortion costs scale with
    /// `dt`; the emotional pulse is applied once regardless.
    pub fn changes(&self, dt: f64) -> Vec<StateChange> {
        let mut changes = feedback_changes(self.coping.iter().copied(), &self.distortions, dt);
        if let Some(tag) = self.emotional_state {
            changes.extend(emotional_pulses(tag));
        }
        changes
    }
}

fn distortion_keywords(d: Distortion) -> &'static [&'static str] {
    match d {
        Distortion::Catastrophizing => &[
            "what if everything",
            "worst case",
            "disaster",
            "catastroph",
            "terrible",
            "going to die",
            "never going to",
        ],
        Distortion::AllOrNothing => &["completely ruined", "total failure", "nothing good", "all or nothing"],
        Distortion::Personalization => &["my fault", "i caused", "blame myself", "i should have"],
        Distortion::EmotionalReasoning => &["i feel like it must be", "feels true", "because i feel"],
        Distortion::Overgeneralization => &[
            "this always happens",
            "it always",
            "i always fail",
            "nothing ever works",
            "every time this",
            "it never gets",
        ],
        Distortion::MindReading => &["they must think", "they probably think", "judging me"],
    }
}

fn coping_keywords(c: CopingStrategy) -> &'static [&'static str] {
    match c {
        CopingStrategy::Rumination => &[
            "keep thinking about",
            "can't stop thinking",
            "going over and over",
            "why did",
            "replaying",
        ],
        CopingStrategy::Acceptance => &["it's okay", "accept", "let it go", "can't change", "it is what it is"],
        CopingStrategy::Reappraisal => &[
            "maybe it's not that bad",
            "another way to look",
            "reframe",
            "on the other hand",
            "could also mean",
        ],
        CopingStrategy::Distraction => &[
            "think about something else",
            "distract myself",
            "focus on something else",
            "try not to think about",
        ],
        CopingStrategy::ProblemSolving => &[
            "figure this out",
            "need a plan",
            "solve this",
            "what can i do",
            "steps to",
            "how do i fix",
        ],
        CopingStrategy::Suppression => &["push it down", "don't feel", "ignore it", "bury"],
        CopingStrategy::Denial => &["it's fine", "nothing's wrong", "not happening", "refuse to believe"],
    }
}

/// Split off the state annotation. Returns the tag and the text before it,
/// trimmed; a missing or malformed tag leaves the text untouched.
pub fn parse_emotional_tag(output: &str) -> (Option<EmotionalTag>, &str) {
    let Some(caps) = RE_STATE_TAG.captures(output) else {
        return (None, output);
    };
    let (Ok(arousal), Ok(valence)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
        tracing::debug!("Malformed state annotation ignored");
        return (None, output);
    };
    let start = caps.get(0).map_or(output.len(), |m| m.start());
    let tag = EmotionalTag {
        arousal: arousal.clamp(0.0, 1.0),
        valence: valence.clamp(-1.0, 1.0),
    };
    (Some(tag), output[..start].trim())
}

/// Extract feedback from generated text. Returns the feedback and the
/// cleaned text to show.
pub fn parse_feedback(output: &str) -> (ThoughtFeedback, String) {
    let (emotional_state, clean) = parse_emotional_tag(output);
    let lower = clean.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    let feedback = ThoughtFeedback {
        coping: CopingStrategy::ALL
            .into_iter()
            .filter(|c| mentions(coping_keywords(*c)))
            .collect(),
        distortions: Distortion::ALL
            .into_iter()
            .filter(|d| mentions(distortion_keywords(*d)))
            .collect(),
        emotional_state,
    };
    (feedback, clean.to_string())
}

/// One-off body changes for a reported emotional state. A zero tag is
/// treated as absent.
pub fn emotional_pulses(tag: EmotionalTag) -> Vec<StateChange> {
    let mut changes = Vec::new();
    if tag.arousal == 0.0 && tag.valence == 0.0 {
        return changes;
    }
    let negative = (-tag.valence).max(0.0);
    let positive = tag.valence.max(0.0);

    // cortisol only rises on negative feelings
    let cortisol = negative * (tag.arousal * 0.05 + 0.03);
    if cortisol > 0.0 {
        changes.push(StateChange::new(Variable::Cortisol, cortisol, EMOTIONAL_SOURCE));
    }
    if tag.arousal > 0.0 {
        changes.push(StateChange::new(Variable::MuscleTension, tag.arousal * 0.15, EMOTIONAL_SOURCE));
    }
    if tag.arousal > 0.3 {
        changes.push(StateChange::new(
            Variable::HeartRate,
            tag.arousal * 10.0 * (1.0 + negative * 0.5),
            EMOTIONAL_SOURCE,
        ));
    }
    let serotonin = tag.valence * 0.025 + positive * 0.04;
    if serotonin != 0.0 {
        changes.push(StateChange::new(Variable::Serotonin, serotonin, EMOTIONAL_SOURCE));
    }
    if positive > 0.2 {
        changes.push(StateChange::new(Variable::Dopamine, positive * tag.arousal * 0.1, EMOTIONAL_SOURCE));
    }
    // fear: only at the extremes
    if tag.arousal > 0.8 && negative > 0.5 {
        changes.push(StateChange::new(
            Variable::Adrenaline,
            (tag.arousal - 0.8) * (negative - 0.5) * 0.5,
            EMOTIONAL_SOURCE,
        ));
    }
    changes
}
