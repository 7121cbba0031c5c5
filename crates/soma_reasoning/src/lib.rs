//! # Soma Reasoning (Orchestration)
//!
//! Drives the agent: a fixed-period tick advances the body, re-derives the
//! mind and asks the generator for a thought when something breaks through
//! or the mind is idle. The generator sits behind [`ThoughtGenerator`] so the
//! loop runs the same against Anthropic or the mock.

pub mod agent_loop;
pub mod clock;
pub mod engine;
pub mod input;
pub mod llm;
pub mod output;
pub mod providers;
pub mod retry;

pub use agent_loop::{LoopHandles, SimulationLoop, Snapshot};
pub use clock::SimClock;
pub use engine::ThoughtEngine;
pub use input::{classify_input, InputEvent};
pub use llm::{GenerationParams, ThoughtGenerator};
pub use output::{Entry, Source};
pub use providers::create_generator;
