//! Conscious thought records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::feedback::ThoughtFeedback;

/// Where a thought came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtType {
    /// Salience broke through
    Reactive,
    /// Picked from the queue while idle
    Spontaneous,
    /// Answer to speech or an action
    Conversational,
}

impl ThoughtType {
    pub fn name(self) -> &'static str {
        match self {
            ThoughtType::Reactive => "reactive",
            ThoughtType::Spontaneous => "spontaneous",
            ThoughtType::Conversational => "conversational",
        }
    }
}

impl fmt::Display for ThoughtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spontaneous thought categories, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Something unexpected happened
    PredictionError,
    /// Hunger, exhaustion, distress
    BiologicalNeed,
    /// Plans and unfinished business
    GoalRehearsal,
    /// "What did they think of me?"
    SocialModeling,
    /// Mind-wandering
    AssociativeDrift,
}

impl Priority {
    /// Selection weight in the spontaneous queue.
    pub fn weight(self) -> f64 {
        match self {
            Priority::PredictionError => 8.0,
            Priority::BiologicalNeed => 5.0,
            Priority::GoalRehearsal => 3.0,
            Priority::SocialModeling => 2.0,
            Priority::AssociativeDrift => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::PredictionError => "prediction_error",
            Priority::BiologicalNeed => "biological_need",
            Priority::GoalRehearsal => "goal_rehearsal",
            Priority::SocialModeling => "social_modeling",
            Priority::AssociativeDrift => "associative_drift",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Speech,
    Action,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Speech => "speech",
            InputKind::Action => "action",
        })
    }
}

/// Something said to, or done to, the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    pub kind: InputKind,
    pub content: String,
}

impl ExternalInput {
    pub fn speech(content: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Speech,
            content: content.into(),
        }
    }

    pub fn action(content: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Action,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thought {
    pub kind: ThoughtType,
    /// Queue category for spontaneous thoughts
    pub priority: Option<Priority>,
    /// Generated first-person text with the state tag stripped
    pub content: String,
    /// What caused the thought
    pub trigger: String,
    pub timestamp: DateTime<Utc>,
    pub feedback: ThoughtFeedback,
}

impl fmt::Display for Thought {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, trigger: {}] {}", self.kind, self.trigger, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_descend_with_priority() {
        let all = [
            Priority::PredictionError,
            Priority::BiologicalNeed,
            Priority::GoalRehearsal,
            Priority::SocialModeling,
            Priority::AssociativeDrift,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].weight() > pair[1].weight());
        }
    }

    #[test]
    fn test_thought_display() {
        let t = Thought {
            kind: ThoughtType::Reactive,
            priority: None,
            content: "So cold.".into(),
            trigger: "arousal changed significantly".into(),
            timestamp: Utc::now(),
            feedback: ThoughtFeedback::default(),
        };
        assert_eq!(t.to_string(), "[reactive, trigger: arousal changed significantly] So cold.");
    }
}
