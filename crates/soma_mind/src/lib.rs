//! # Soma Mind (Awareness Gate)
//!
//! Decides *when* the agent thinks and *what* it is asked to think about.
//!
//! - **Salience**: rate and novelty of felt change against a mood-dependent threshold
//! - **Queue**: weighted spontaneous thought candidates when nothing breaks through
//! - **Prompt**: the felt state rendered as plain language for the generator
//! - **Feedback**: what a generated thought does back to the body
//!
//! Nothing here calls the generator; see `soma_reasoning`.

pub mod feedback;
pub mod prompt;
pub mod queue;
pub mod salience;
pub mod thought;

pub use feedback::{parse_feedback, EmotionalTag, ThoughtFeedback};
pub use prompt::PromptBuilder;
pub use queue::{ThoughtCandidate, ThoughtQueue};
pub use salience::{Dimension, SalienceCalculator, SalienceResult};
pub use thought::{ExternalInput, InputKind, Priority, Thought, ThoughtType};
