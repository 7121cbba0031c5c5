use chrono::{DateTime, Utc};
use serde::Serialize;
use soma_mind::ThoughtType;
use std::fmt;

/// Which layer produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Sense,
    Bio,
    Psych,
    Mind,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::Sense => "sense",
            Source::Bio => "bio",
            Source::Psych => "psych",
            Source::Mind => "mind",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line of output for the display and the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub source: Source,
    pub message: String,
    /// Simulated time
    pub timestamp: DateTime<Utc>,
    /// Set on `Mind` entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought_type: Option<ThoughtType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl Entry {
    pub fn new(source: Source, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            source,
            message: message.into(),
            timestamp,
            thought_type: None,
            trigger: None,
        }
    }

    /// `message` holds the bare thought text; the type and trigger travel
    /// alongside.
    pub fn thought(thought: &soma_mind::Thought) -> Self {
        Self {
            source: Source::Mind,
            message: thought.content.clone(),
            timestamp: thought.timestamp,
            thought_type: Some(thought.kind),
            trigger: Some(thought.trigger.clone()),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.thought_type, &self.trigger) {
            (Some(kind), Some(trigger)) => write!(f, "[{}, trigger: {}] {}", kind, trigger, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_mind::{Priority, Thought, ThoughtFeedback};

    #[test]
    fn test_thought_entry_display_matches_thought() {
        let thought = Thought {
            kind: ThoughtType::Spontaneous,
            priority: Some(Priority::AssociativeDrift),
            content: "The kettle is still warm.".into(),
            trigger: "associative_drift".into(),
            timestamp: Utc::now(),
            feedback: ThoughtFeedback::default(),
        };
        let entry = Entry::thought(&thought);
        assert_eq!(entry.source, Source::Mind);
        assert_eq!(entry.message, "The kettle is still warm.");
        assert_eq!(entry.to_string(), thought.to_string());
    }

    #[test]
    fn test_plain_entry_serializes_without_thought_fields() {
        let entry = Entry::new(Source::Bio, "heart_rate +12.00 (stimulus)", Utc::now());
        assert_eq!(entry.to_string(), "heart_rate +12.00 (stimulus)");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source"], "bio");
        assert!(json.get("thought_type").is_none());
    }
}
