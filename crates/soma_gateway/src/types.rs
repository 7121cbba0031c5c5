use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soma_core::{threshold, BiologicalState, Variable};
use soma_mind::ThoughtType;
use soma_psyche::PsychologicalState;
use soma_reasoning::{Entry, Snapshot, Source};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown message type: {0:?}")]
    UnknownType(String),
    #[error("content must not be empty")]
    EmptyContent,
}

/// Inbound message from a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    /// "speech", "action" or "environment"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
}

impl ClientMessage {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self.kind.as_str() {
            "speech" | "action" | "environment" => {}
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        }
        if self.content.trim().is_empty() {
            return Err(ProtocolError::EmptyContent);
        }
        Ok(())
    }

    /// The simulation's input line syntax: speech stays plain, actions are
    /// wrapped in `*`, environment changes get a leading `~`.
    pub fn to_input_line(&self) -> String {
        match self.kind.as_str() {
            "action" => format!("*{}*", self.content),
            "environment" => format!("~{}", self.content),
            _ => self.content.clone(),
        }
    }
}

/// Outbound frame. `type` decides which of the optional fields are set.
#[derive(Debug, Clone, Serialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought_type: Option<ThoughtType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_state: Option<BioStatePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psych_state: Option<PsychStatePayload>,
}

impl ServerMessage {
    fn bare(kind: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.to_string(),
            content: String::new(),
            thought_type: None,
            trigger: None,
            timestamp,
            bio_state: None,
            psych_state: None,
        }
    }

    pub fn bio_state(snapshot: &Snapshot) -> Self {
        Self {
            bio_state: Some(BioStatePayload::from(&snapshot.bio)),
            ..Self::bare("bio_state", snapshot.sim_time)
        }
    }

    pub fn psych_state(snapshot: &Snapshot) -> Self {
        Self {
            psych_state: Some(PsychStatePayload::from(&snapshot.psych)),
            ..Self::bare("psych_state", snapshot.sim_time)
        }
    }

    /// Both state frames for a snapshot.
    pub fn state_frames(snapshot: &Snapshot) -> [Self; 2] {
        [Self::bio_state(snapshot), Self::psych_state(snapshot)]
    }
}

impl From<&Entry> for ServerMessage {
    fn from(entry: &Entry) -> Self {
        let kind = match entry.source {
            Source::Mind => "thought",
            Source::Sense => "sense",
            Source::Bio => "bio",
            Source::Psych => "psych",
        };
        Self {
            content: entry.message.clone(),
            thought_type: entry.thought_type,
            trigger: entry.trigger.clone(),
            ..Self::bare(kind, entry.timestamp)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdPayload {
    pub condition: String,
    pub system: String,
    pub description: String,
}

/// Every biological variable by name, plus active threshold breaches
/// (empty, never absent, when all is normal).
#[derive(Debug, Clone, Serialize)]
pub struct BioStatePayload {
    #[serde(flatten)]
    pub values: BTreeMap<&'static str, f64>,
    pub thresholds: Vec<ThresholdPayload>,
}

impl From<&BiologicalState> for BioStatePayload {
    fn from(state: &BiologicalState) -> Self {
        let thresholds = threshold::evaluate(state)
            .into_iter()
            .map(|t| ThresholdPayload {
                condition: t.severity.to_string(),
                system: t.system.to_string(),
                description: t.description.to_string(),
            })
            .collect();
        Self {
            values: Variable::ALL.iter().map(|v| (v.name(), state.get(*v))).collect(),
            thresholds,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PsychStatePayload {
    pub arousal: f64,
    pub valence: f64,
    pub energy: f64,
    pub cognitive_load: f64,
    pub regulation_capacity: f64,
    pub stress: f64,
    pub mood: &'static str,
    pub active_distortions: Vec<String>,
    pub active_coping: Vec<String>,
    pub isolation_phase: String,
    pub loneliness_level: f64,
}

impl From<&PsychologicalState> for PsychStatePayload {
    fn from(s: &PsychologicalState) -> Self {
        Self {
            arousal: s.arousal,
            valence: s.valence,
            energy: s.energy,
            cognitive_load: s.cognitive_load,
            regulation_capacity: s.regulation_capacity,
            stress: s.stress,
            mood: s.mood_label(),
            active_distortions: s.distortions.iter().map(|d| d.to_string()).collect(),
            active_coping: s.coping.strategies().map(|c| c.to_string()).collect(),
            isolation_phase: s.isolation.phase.to_string(),
            loneliness_level: s.isolation.loneliness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(kind: &str, content: &str) -> ClientMessage {
        ClientMessage {
            kind: kind.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_client_message_validation() {
        assert!(msg("speech", "hi").validate().is_ok());
        assert_eq!(
            msg("shout", "hi").validate(),
            Err(ProtocolError::UnknownType("shout".into()))
        );
        assert_eq!(msg("action", "  ").validate(), Err(ProtocolError::EmptyContent));
    }

    #[test]
    fn test_to_input_line() {
        assert_eq!(msg("speech", "hello").to_input_line(), "hello");
        assert_eq!(msg("action", "hugs you").to_input_line(), "*hugs you*");
        assert_eq!(msg("environment", "it starts to rain").to_input_line(), "~it starts to rain");
    }

    #[test]
    fn test_client_message_json() {
        let m: ClientMessage = serde_json::from_str(r#"{"type":"environment","content":"snow"}"#).unwrap();
        assert_eq!(m.kind, "environment");
        let m: ClientMessage = serde_json::from_str(r#"{"type":"speech"}"#).unwrap();
        assert_eq!(m.validate(), Err(ProtocolError::EmptyContent));
    }

    #[test]
    fn test_thought_entry_frame() {
        let entry = Entry {
            source: Source::Mind,
            message: "So cold.".into(),
            timestamp: Utc::now(),
            thought_type: Some(ThoughtType::Reactive),
            trigger: Some("arousal changed significantly".into()),
        };
        let json = serde_json::to_value(ServerMessage::from(&entry)).unwrap();
        assert_eq!(json["type"], "thought");
        assert_eq!(json["content"], "So cold.");
        assert_eq!(json["thought_type"], "reactive");
        assert!(json.get("bio_state").is_none());
    }

    #[test]
    fn test_state_frames() {
        let mut bio = BiologicalState::default();
        bio.body_temp = 27.0;
        let snapshot = Snapshot {
            bio,
            psych: PsychologicalState::default(),
            sim_time: Utc::now(),
            paused: false,
        };
        let [bio_frame, psych_frame] = ServerMessage::state_frames(&snapshot);

        let json = serde_json::to_value(&bio_frame).unwrap();
        assert_eq!(json["type"], "bio_state");
        assert!(json.get("content").is_none());
        assert_eq!(json["bio_state"]["body_temp"], 27.0);
        assert_eq!(json["bio_state"]["thresholds"][0]["condition"], "lethal");

        let json = serde_json::to_value(&psych_frame).unwrap();
        assert_eq!(json["psych_state"]["isolation_phase"], "none");
        assert!(json["psych_state"]["active_distortions"].as_array().unwrap().is_empty());
    }
}
