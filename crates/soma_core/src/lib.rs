//! # Soma Core (Body)
//!
//! The biological state engine. A vector of twenty physiological variables is
//! advanced in discrete ticks of elapsed time by a fixed pipeline:
//!
//! - **Decay**: exponential relaxation toward baseline, parameterized by half-life
//! - **Circadian forcing**: phase-dependent targets for cortisol, temperature
//!   and serotonin, plus an alertness curve
//! - **Interaction rules**: declarative couplings evaluated against one snapshot
//! - **Thresholds**: stepped severity bands that trigger per-second cascades
//!
//! ## Invariants
//!
//! After every tick and every applied stimulus each variable lies inside its
//! declared interval, and no NaN or infinity survives the final clamp.
//!
//! Sensory input enters as typed [`Stimulus`] events, either built directly or
//! produced from free text by the [`SenseParser`].

pub mod change;
pub mod circadian;
pub mod config;
pub mod decay;
pub mod processor;
pub mod rules;
pub mod sense;
pub mod state;
pub mod threshold;

pub use change::StateChange;
pub use config::SomaConfig;
pub use processor::{BioProcessor, TickResult};
pub use rules::{InteractionRule, RuleSet};
pub use sense::{Channel, SenseParser, Stimulus};
pub use state::{BiologicalState, Variable};
pub use threshold::{BodySystem, Severity, ThresholdEvent};
