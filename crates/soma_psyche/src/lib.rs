//! # Soma Psyche (Mind-Body Bridge)
//!
//! Derives a psychological state from the biological one every cycle.
//!
//! - **Affect**: arousal, valence, energy and cognitive load read off the body
//! - **Personality**: Big Five traits modulate every stage
//! - **Regulation**: a depletable resource that dampens affect
//! - **Distortions & coping**: stress-driven thinking patterns and strategies
//! - **Isolation & memory**: slow processes carried between cycles
//!
//! Feedback into the body is computed separately ([`feedback_changes`]) and
//! applied by the orchestration loop, never by the processor itself.

pub mod affect;
pub mod alert;
pub mod coping;
pub mod distortion;
pub mod feedback;
pub mod isolation;
pub mod memory;
pub mod personality;
pub mod processor;
pub mod regulation;
pub mod state;

pub use alert::{AlertSeverity, PsychAlert};
pub use coping::{Coping, CopingStrategy};
pub use distortion::Distortion;
pub use feedback::feedback_changes;
pub use isolation::{IsolationPhase, IsolationState};
pub use memory::{EmotionalMemory, MemoryActivation, MemoryTag};
pub use personality::Personality;
pub use processor::PsychProcessor;
pub use regulation::RegulationState;
pub use state::PsychologicalState;
