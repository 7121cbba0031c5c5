//! Emotional memory.
//!
//! Stored associations between a bodily condition and how it felt. A memory
//! reactivates when the current body resembles the condition that created
//! it, weakened by a power-law recency decay. Traumatic memories fade slower.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use soma_core::threshold::{BodySystem, Severity, ThresholdEvent};
use soma_core::BiologicalState;
use std::fmt;
use uuid::Uuid;

/// Bodily condition a memory is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTag {
    Cold,
    Heat,
    Pain,
    Hunger,
    Darkness,
    Exertion,
}

impl MemoryTag {
    pub fn name(self) -> &'static str {
        match self {
            MemoryTag::Cold => "cold",
            MemoryTag::Heat => "heat",
            MemoryTag::Pain => "pain",
            MemoryTag::Hunger => "hunger",
            MemoryTag::Darkness => "darkness",
            MemoryTag::Exertion => "exertion",
        }
    }

    /// How closely `bio` matches the condition behind this tag, `[0, 1]`.
    pub fn similarity(self, bio: &BiologicalState) -> f64 {
        match self {
            MemoryTag::Cold if bio.body_temp < 35.5 => ((35.5 - bio.body_temp) / 3.0).clamp(0.0, 1.0),
            MemoryTag::Heat if bio.body_temp > 38.0 => ((bio.body_temp - 38.0) / 4.0).clamp(0.0, 1.0),
            MemoryTag::Pain if bio.pain > 0.3 => bio.pain,
            MemoryTag::Hunger if bio.hunger > 0.3 => bio.hunger,
            MemoryTag::Darkness if bio.circadian_phase < 6.0 || bio.circadian_phase > 21.0 => 0.5,
            MemoryTag::Exertion if bio.heart_rate > 100.0 => ((bio.heart_rate - 100.0) / 100.0).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Tag for a physiological system in crisis, if one fits.
    pub fn for_system(system: BodySystem) -> Option<Self> {
        match system {
            BodySystem::Hypothermia => Some(MemoryTag::Cold),
            BodySystem::Hyperthermia => Some(MemoryTag::Heat),
            BodySystem::Hypoglycemia => Some(MemoryTag::Hunger),
            BodySystem::Tachycardia | BodySystem::Exhaustion => Some(MemoryTag::Exertion),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalMemory {
    pub id: Uuid,
    pub tag: MemoryTag,
    /// -1.0 to 1.0
    pub valence: f64,
    /// 0.0 to 1.0
    pub intensity: f64,
    pub created_at: DateTime<Utc>,
    pub traumatic: bool,
}

impl EmotionalMemory {
    pub fn new(tag: MemoryTag, valence: f64, intensity: f64, created_at: DateTime<Utc>, traumatic: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag,
            valence: valence.clamp(-1.0, 1.0),
            intensity: intensity.clamp(0.0, 1.0),
            created_at,
            traumatic,
        }
    }
}

/// A memory brought back by the current body state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryActivation {
    pub memory_id: Uuid,
    pub tag: MemoryTag,
    pub similarity: f64,
    /// -1, 0 or 1
    pub valence_sign: f64,
    /// `intensity · decay · similarity`
    pub intensity: f64,
}

/// Power-law recency decay `1 / (1 + days^k)`, k = 0.5 (0.3 if traumatic).
pub fn recency_decay(days: f64, traumatic: bool) -> f64 {
    let exponent = if traumatic { 0.3 } else { 0.5 };
    1.0 / (1.0 + days.max(0.0).powf(exponent))
}

/// How long a crisis must be absent before it lays down a new memory.
const REMEMBER_COOLDOWN_HOURS: i64 = 1;

/// Store size; past this the weakest memory is forgotten.
pub const MAX_MEMORIES: usize = 64;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionalMemoryStore {
    memories: Vec<EmotionalMemory>,
}

impl EmotionalMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, memory: EmotionalMemory) {
        tracing::debug!(tag = %memory.tag, intensity = memory.intensity, traumatic = memory.traumatic, "Emotional memory stored");
        let now = memory.created_at;
        self.memories.push(memory);
        if self.memories.len() > MAX_MEMORIES {
            self.forget_weakest(now);
        }
    }

    /// Drop the memory with the lowest decayed intensity at `now`; the
    /// oldest loses ties.
    fn forget_weakest(&mut self, now: DateTime<Utc>) {
        let strength = |m: &EmotionalMemory| {
            let days = (now - m.created_at).num_seconds() as f64 / 86_400.0;
            m.intensity * recency_decay(days, m.traumatic)
        };
        let weakest = self
            .memories
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                strength(a)
                    .total_cmp(&strength(b))
                    .then(a.created_at.cmp(&b.created_at))
            })
            .map(|(i, _)| i);
        if let Some(i) = weakest {
            let gone = self.memories.remove(i);
            tracing::debug!(tag = %gone.tag, "Emotional memory forgotten");
        }
    }

    pub fn memories(&self) -> &[EmotionalMemory] {
        &self.memories
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Memories reactivated by `bio` at `now`.
    pub fn activations(&self, bio: &BiologicalState, now: DateTime<Utc>) -> Vec<MemoryActivation> {
        self.memories
            .iter()
            .filter_map(|m| {
                let days = (now - m.created_at).num_seconds() as f64 / 86_400.0;
                let decay = recency_decay(days, m.traumatic);
                if decay * m.intensity < 0.01 {
                    return None;
                }
                let similarity = m.tag.similarity(bio);
                if similarity < 0.1 {
                    return None;
                }
                Some(MemoryActivation {
                    memory_id: m.id,
                    tag: m.tag,
                    similarity,
                    valence_sign: sign(m.valence),
                    intensity: m.intensity * decay * similarity,
                })
            })
            .collect()
    }

    /// Lay down negative memories for critical body crises, at most one per
    /// tag per cooldown window. Returns how many were stored.
    pub fn remember_crises(&mut self, events: &[ThresholdEvent], now: DateTime<Utc>) -> usize {
        let mut stored = 0;
        for event in events.iter().filter(|e| e.severity >= Severity::Critical) {
            let Some(tag) = MemoryTag::for_system(event.system) else {
                continue;
            };
            let recent = self
                .memories
                .iter()
                .any(|m| m.tag == tag && now - m.created_at < Duration::hours(REMEMBER_COOLDOWN_HOURS));
            if recent {
                continue;
            }
            let traumatic = event.severity >= Severity::Unconscious;
            let intensity = if traumatic { 1.0 } else { 0.7 };
            self.add(EmotionalMemory::new(tag, -0.8, intensity, now, traumatic));
            stored += 1;
        }
        stored
    }
}

fn sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else if v > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cold_body() -> BiologicalState {
        let mut bio = BiologicalState::default();
        bio.body_temp = 34.0;
        bio
    }

    #[test]
    fn test_recency_decay() {
        assert_eq!(recency_decay(0.0, false), 1.0);
        assert!((recency_decay(4.0, false) - 1.0 / 3.0).abs() < 1e-9);
        assert!(recency_decay(30.0, true) > recency_decay(30.0, false));
    }

    #[test]
    fn test_similar_body_activates() {
        let now = Utc::now();
        let mut store = EmotionalMemoryStore::new();
        store.add(EmotionalMemory::new(MemoryTag::Cold, -0.9, 0.8, now, false));
        let acts = store.activations(&cold_body(), now);
        assert_eq!(acts.len(), 1);
        assert!((acts[0].intensity - 0.8 * 0.5).abs() < 1e-9);
        assert_eq!(acts[0].valence_sign, -1.0);
    }

    #[test]
    fn test_dissimilar_body_does_not_activate() {
        let now = Utc::now();
        let mut store = EmotionalMemoryStore::new();
        store.add(EmotionalMemory::new(MemoryTag::Cold, -0.9, 0.8, now, false));
        assert!(store.activations(&BiologicalState::default(), now).is_empty());
    }

    #[test]
    fn test_weak_old_memory_skipped() {
        let now = Utc::now();
        let mut store = EmotionalMemoryStore::new();
        // decay at 10^4 days is ~0.0099, times 0.5 is below the floor
        store.add(EmotionalMemory::new(
            MemoryTag::Cold,
            -0.9,
            0.5,
            now - Duration::days(10_000),
            false,
        ));
        assert!(store.activations(&cold_body(), now).is_empty());
    }

    #[test]
    fn test_remember_crises_respects_cooldown() {
        let now = Utc::now();
        let mut bio = BiologicalState::default();
        bio.body_temp = 31.0;
        let events = soma_core::threshold::evaluate(&bio);
        let mut store = EmotionalMemoryStore::new();
        assert_eq!(store.remember_crises(&events, now), 1);
        assert_eq!(store.remember_crises(&events, now + Duration::minutes(10)), 0);
        assert_eq!(store.remember_crises(&events, now + Duration::hours(2)), 1);
        assert_eq!(store.memories()[0].tag, MemoryTag::Cold);
    }

    #[test]
    fn test_store_is_capped_and_forgets_weakest() {
        let start = Utc::now();
        let mut store = EmotionalMemoryStore::new();
        store.add(EmotionalMemory::new(MemoryTag::Pain, -0.5, 0.05, start, false));
        store.add(EmotionalMemory::new(MemoryTag::Cold, -0.9, 1.0, start, true));
        let mut bio = BiologicalState::default();
        bio.body_temp = 31.0;
        let events = soma_core::threshold::evaluate(&bio);
        for i in 1..=200 {
            store.remember_crises(&events, start + Duration::hours(i * 2));
        }
        assert_eq!(store.len(), MAX_MEMORIES);
        assert!(store.memories().iter().all(|m| m.tag != MemoryTag::Pain));
        // the traumatic first memory outlives the routine ones
        assert!(store.memories().iter().any(|m| m.created_at == start && m.traumatic));
    }
}
