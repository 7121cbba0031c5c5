//! Sensory events and the keyword classifier that produces them.
//!
//! The classifier is a lookup table: deterministic, no external calls.
//! Each channel lists phrases ordered from most to least extreme and the
//! first hit wins, so "ice cold" reads as ice, not as cold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Visual,
    Auditory,
    Tactile,
    Thermal,
    Pain,
    Olfactory,
    Gustatory,
    Vestibular,
    Interoceptive,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::Visual,
        Channel::Auditory,
        Channel::Tactile,
        Channel::Thermal,
        Channel::Pain,
        Channel::Olfactory,
        Channel::Gustatory,
        Channel::Vestibular,
        Channel::Interoceptive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Visual => "visual",
            Channel::Auditory => "auditory",
            Channel::Tactile => "tactile",
            Channel::Thermal => "thermal",
            Channel::Pain => "pain",
            Channel::Olfactory => "olfactory",
            Channel::Gustatory => "gustatory",
            Channel::Vestibular => "vestibular",
            Channel::Interoceptive => "interoceptive",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sensory channel: {0:?}")]
pub struct ParseChannelError(pub String);

impl FromStr for Channel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == lower)
            .ok_or_else(|| ParseChannelError(s.to_string()))
    }
}

/// A typed sensory event consumed by the biological processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub channel: Channel,
    /// Intensity in `[0, 1]`. For thermal input, 0.5 is neutral, lower is
    /// colder, higher is hotter.
    pub intensity: f64,
    /// Short human-readable reading of the input
    pub description: String,
}

impl Stimulus {
    pub fn new(channel: Channel, intensity: f64, description: impl Into<String>) -> Self {
        Self {
            channel,
            intensity,
            description: description.into(),
        }
    }
}

/// Intensity used when nothing in the table matched.
const FALLBACK_INTENSITY: f64 = 0.3;

struct ChannelTable {
    channel: Channel,
    keywords: &'static [(&'static str, f64)],
}

static TABLES: &[ChannelTable] = &[
    ChannelTable {
        channel: Channel::Thermal,
        keywords: &[
            ("freezing", 0.05), ("ice", 0.1), ("snow", 0.15), ("frost", 0.15),
            ("scorching", 0.95), ("burning", 0.9), ("sweltering", 0.85),
            ("cold", 0.25), ("chilly", 0.35), ("hot", 0.8), ("cool", 0.4), ("warm", 0.6),
        ],
    },
    ChannelTable {
        channel: Channel::Pain,
        keywords: &[
            ("agony", 1.0), ("stabbed", 0.9), ("stab", 0.9), ("broken", 0.85), ("burn", 0.75),
            ("punch", 0.7), ("cut", 0.6), ("hit", 0.6), ("kick", 0.6), ("bruise", 0.4),
            ("sting", 0.4), ("ache", 0.3), ("pinch", 0.2),
        ],
    },
    ChannelTable {
        channel: Channel::Auditory,
        keywords: &[
            ("explosion", 1.0), ("gunshot", 0.95), ("scream", 0.85), ("bang", 0.8), ("crash", 0.8),
            ("shout", 0.75), ("loud", 0.7), ("knock", 0.5), ("music", 0.4), ("whisper", 0.2),
            ("silence", 0.1),
        ],
    },
    ChannelTable {
        channel: Channel::Visual,
        keywords: &[
            ("weapon", 0.9), ("knife", 0.9), ("gun", 0.9), ("blood", 0.85), ("fire", 0.85),
            ("flash", 0.7), ("shadow", 0.5), ("light", 0.4), ("dark", 0.3), ("sunset", 0.3),
        ],
    },
    ChannelTable {
        channel: Channel::Tactile,
        keywords: &[
            ("slap", 0.8), ("shove", 0.75), ("push", 0.65), ("grab", 0.6), ("hug", 0.3),
            ("touch", 0.3), ("stroke", 0.2), ("pat", 0.2),
        ],
    },
    ChannelTable {
        channel: Channel::Olfactory,
        keywords: &[
            ("smoke", 0.8), ("rotten", 0.75), ("stench", 0.75), ("smell", 0.4), ("perfume", 0.3),
            ("coffee", 0.3), ("flowers", 0.2),
        ],
    },
    ChannelTable {
        channel: Channel::Gustatory,
        keywords: &[
            ("feast", 0.8), ("meal", 0.6), ("eat", 0.5), ("bread", 0.4), ("drink", 0.4),
            ("water", 0.4), ("taste", 0.3), ("sip", 0.2),
        ],
    },
    ChannelTable {
        channel: Channel::Vestibular,
        keywords: &[
            ("fall", 0.8), ("spin", 0.7), ("trip", 0.6), ("stumble", 0.6), ("sway", 0.4),
        ],
    },
    ChannelTable {
        channel: Channel::Interoceptive,
        keywords: &[
            ("can't breathe", 0.9), ("suffocat", 0.9), ("nausea", 0.6), ("dizzy", 0.6),
            ("heartbeat", 0.4), ("stomach", 0.4),
        ],
    },
];

/// Keyword classifier turning free text into typed stimuli.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenseParser;

impl SenseParser {
    pub fn new() -> Self {
        Self
    }

    /// Classify `input` into zero or more stimuli, at most one per channel.
    /// Unmatched non-empty input becomes a quiet auditory event.
    pub fn parse(&self, input: &str) -> Vec<Stimulus> {
        let lower = input.trim().to_lowercase();
        if lower.is_empty() {
            return Vec::new();
        }
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let mut events: Vec<Stimulus> = TABLES
            .iter()
            .filter_map(|table| {
                table
                    .keywords
                    .iter()
                    .find(|(phrase, _)| matches_phrase(&lower, &words, phrase))
                    .map(|&(phrase, intensity)| {
                        Stimulus::new(table.channel, intensity, describe(table.channel, phrase, intensity))
                    })
            })
            .collect();

        if events.is_empty() {
            events.push(Stimulus::new(
                Channel::Auditory,
                FALLBACK_INTENSITY,
                "someone is speaking",
            ));
        }
        events
    }
}

/// Multi-word phrases match as substrings; single words match word prefixes
/// ("eat" matches "eating" but not "heat").
fn matches_phrase(lower: &str, words: &[&str], phrase: &str) -> bool {
    if phrase.contains(' ') {
        lower.contains(phrase)
    } else {
        words.iter().any(|w| w.starts_with(phrase))
    }
}

fn describe(channel: Channel, phrase: &str, intensity: f64) -> String {
    match channel {
        Channel::Thermal if intensity < 0.5 => format!("feeling cold ({})", phrase),
        Channel::Thermal => format!("feeling heat ({})", phrase),
        Channel::Pain => format!("experiencing pain ({})", phrase),
        Channel::Auditory if intensity > 0.7 => format!("startling sound ({})", phrase),
        Channel::Auditory => format!("hearing {}", phrase),
        Channel::Visual if intensity > 0.8 => format!("seeing something threatening ({})", phrase),
        Channel::Visual => format!("seeing {}", phrase),
        Channel::Tactile if intensity > 0.6 => format!("physically struck ({})", phrase),
        Channel::Tactile => format!("touch ({})", phrase),
        Channel::Olfactory => format!("smelling {}", phrase),
        Channel::Gustatory => format!("tasting ({})", phrase),
        Channel::Vestibular => format!("losing balance ({})", phrase),
        Channel::Interoceptive => format!("inner sensation ({})", phrase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_wind_is_thermal_cold() {
        let events = SenseParser::new().parse("A freezing wind blows");
        let thermal = events.iter().find(|e| e.channel == Channel::Thermal).unwrap();
        assert!(thermal.intensity < 0.5);
    }

    #[test]
    fn test_extreme_phrase_wins() {
        let events = SenseParser::new().parse("ice cold water");
        let thermal = events.iter().find(|e| e.channel == Channel::Thermal).unwrap();
        assert_eq!(thermal.intensity, 0.1);
    }

    #[test]
    fn test_multiple_channels() {
        let events = SenseParser::new().parse("someone punches you and you fall");
        let channels: Vec<_> = events.iter().map(|e| e.channel).collect();
        assert!(channels.contains(&Channel::Pain));
        assert!(channels.contains(&Channel::Vestibular));
    }

    #[test]
    fn test_prefix_matching_avoids_substrings() {
        let events = SenseParser::new().parse("the heat is rising");
        assert!(!events.iter().any(|e| e.channel == Channel::Gustatory));
    }

    #[test]
    fn test_fallback_and_empty() {
        let events = SenseParser::new().parse("hello there");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, Channel::Auditory);
        assert!(SenseParser::new().parse("   ").is_empty());
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!("Thermal".parse::<Channel>(), Ok(Channel::Thermal));
        assert!("smellovision".parse::<Channel>().is_err());
    }
}
