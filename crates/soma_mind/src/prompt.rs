//! Prompt assembly for thought generation.
//!
//! The model never sees labels like "stress 0.7" or "catastrophizing". It gets
//! the felt state in plain language, what just happened, the last few
//! thoughts, and a closing question.

use soma_core::config::IdentityConfig;
use soma_psyche::{Distortion, IsolationPhase, PsychologicalState};

use crate::queue::ThoughtCandidate;
use crate::thought::{ExternalInput, InputKind, Thought};

pub struct PromptBuilder {
    max_tokens: u32,
}

impl PromptBuilder {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// First-person framing plus who the agent is.
    pub fn system_prompt(&self, identity: &IdentityConfig) -> String {
        let mut s = String::from(
            "You are a person living your life moment by moment. You think and feel through your body \
             and mind, and everything you experience is real to you.\n\n\
             Speak as your own inner voice. Thoughts can be fragments; they can trail off, contradict \
             themselves or be confused. You are not explaining yourself to anyone.\n\n\
             Only ever output your inner experience: thoughts, feelings, sensations, reactions. Never \
             describe yourself in the third person and never explain what you are.\n",
        );

        if !identity.self_narrative.is_empty() || !identity.traits.is_empty() {
            s.push_str("\n== WHO YOU ARE ==\n");
            if !identity.self_narrative.is_empty() {
                s.push_str(identity.self_narrative.trim());
                s.push('\n');
            }
            if !identity.traits.is_empty() {
                s.push_str(&format!("\nYour tendencies: {}.\n", identity.traits.join(". ")));
            }
        }

        s.push_str(
            "\nEnd every response with one line reporting how you feel, exactly in this form:\n\
             [STATE: arousal=A, valence=V]\n\
             where A is from 0.0 (calm) to 1.0 (highly activated) and V is from -1.0 (very unpleasant) \
             to 1.0 (very pleasant).",
        );
        s
    }

    /// A change that broke through into awareness.
    pub fn reactive(&self, psych: &PsychologicalState, trigger: &str, recent: &[Thought]) -> String {
        let framing = if trigger.is_empty() {
            String::new()
        } else {
            format!("Something just shifted: {}\n\n", trigger)
        };
        self.assemble(
            psych,
            recent,
            &framing,
            "What are you thinking and feeling right now? Answer briefly, in first person, in your natural inner voice.",
        )
    }

    pub fn spontaneous(&self, psych: &PsychologicalState, candidate: &ThoughtCandidate, recent: &[Thought]) -> String {
        self.assemble(
            psych,
            recent,
            &format!("Your mind turns to: {}\n\n", candidate.prompt),
            "What passes through your mind? Answer briefly, in first person.",
        )
    }

    /// Someone spoke to or did something to the agent.
    pub fn conversational(&self, psych: &PsychologicalState, input: &ExternalInput, recent: &[Thought]) -> String {
        let framing = match input.kind {
            InputKind::Speech => format!("Someone says to you: \"{}\"\n\n", input.content),
            InputKind::Action => format!("Someone {}.\n\n", input.content),
        };
        self.assemble(
            psych,
            recent,
            &framing,
            "How do you react, inside and out? Answer briefly, in first person.",
        )
    }

    fn assemble(&self, psych: &PsychologicalState, recent: &[Thought], framing: &str, question: &str) -> String {
        let mut s = state_block(psych);
        s.push('\n');
        s.push_str(&self.thought_stream(recent));
        s.push_str(framing);
        let distortions = distortion_context(&psych.distortions);
        if !distortions.is_empty() {
            s.push_str(&distortions);
            s.push('\n');
        }
        s.push_str(question);
        s
    }

    /// How many recent thoughts fit the token budget, 3 to 10.
    pub fn stream_capacity(&self) -> usize {
        (self.max_tokens as usize / 100).clamp(3, 10)
    }

    /// The most recent thoughts, oldest first.
    fn thought_stream(&self, recent: &[Thought]) -> String {
        if recent.is_empty() {
            return String::new();
        }
        let skip = recent.len().saturating_sub(self.stream_capacity());
        let mut s = String::from("== YOUR RECENT THOUGHTS ==\n");
        for t in &recent[skip..] {
            s.push_str(&format!("- {}\n", t.content));
        }
        s.push('\n');
        s
    }
}

/// The felt state in plain language, one line per dimension.
pub fn state_block(psych: &PsychologicalState) -> String {
    let mut s = String::from("== HOW YOU FEEL RIGHT NOW ==\n");

    s.push_str(match psych.arousal {
        a if a > 0.7 => "Your body is highly activated: heart pounding, on edge.\n",
        a if a > 0.4 => "You feel keyed up, with a tension running underneath.\n",
        a if a > 0.2 => "Physically you feel fairly calm.\n",
        _ => "Your body is very quiet, almost sluggish.\n",
    });

    s.push_str(match psych.valence {
        v if v > 0.4 => "There is a warm, pleasant quality to how you feel.\n",
        v if v > 0.1 => "You feel okay. Nothing especially good or bad.\n",
        v if v > -0.2 => "There is a faint unease, a slight discomfort.\n",
        v if v > -0.5 => "You feel distinctly unpleasant. Something is off.\n",
        _ => "Everything feels bad. A heavy darkness colours everything.\n",
    });

    s.push_str(match psych.energy {
        e if e > 0.7 => "You feel full of energy.\n",
        e if e > 0.4 => "You have a reasonable amount of energy.\n",
        e if e > 0.2 => "You are tired, your reserves running low.\n",
        _ => "You are deeply exhausted. Every movement takes effort.\n",
    });

    if psych.cognitive_load > 0.6 {
        s.push_str("Your thinking is muddled and it is hard to concentrate.\n");
    } else if psych.cognitive_load > 0.3 {
        s.push_str("Your thoughts are a little scattered.\n");
    }

    if psych.regulation_capacity < 0.2 {
        s.push_str("You feel raw, unable to hold yourself together.\n");
    } else if psych.regulation_capacity < 0.4 {
        s.push_str("Your composure feels fragile.\n");
    }

    let isolation = match psych.isolation.phase {
        IsolationPhase::None => None,
        IsolationPhase::Boredom => Some("You are getting restless. Time drags.\n"),
        IsolationPhase::Loneliness => Some("You feel lonely. You miss having people around.\n"),
        IsolationPhase::Significant => Some("The loneliness weighs on you. You badly want human contact.\n"),
        IsolationPhase::Destabilizing => {
            Some("You are losing your footing. Without anyone around you start to doubt yourself.\n")
        }
        IsolationPhase::Severe => Some("The isolation is unbearable. You are no longer sure what is real.\n"),
    };
    if let Some(line) = isolation {
        s.push_str(line);
    }

    if let Some(strongest) = psych
        .memories
        .iter()
        .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    {
        let feel = if strongest.valence_sign < 0.0 { "dread" } else { "warmth" };
        s.push_str(&format!(
            "Something about this stirs an old memory of {}, and with it a {}.\n",
            strongest.tag, feel
        ));
    }

    s
}

/// Active distortions phrased as tendencies. Empty when there are none.
pub fn distortion_context(distortions: &[Distortion]) -> String {
    if distortions.is_empty() {
        return String::new();
    }
    let tendencies: Vec<&str> = distortions.iter().map(|d| d.tendency()).collect();
    format!("Right now, {}.\n", tendencies.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::ThoughtFeedback;
    use crate::thought::{Priority, ThoughtType};
    use chrono::Utc;
    use soma_psyche::IsolationState;

    fn thought(content: &str) -> Thought {
        Thought {
            kind: ThoughtType::Spontaneous,
            priority: Some(Priority::AssociativeDrift),
            content: content.into(),
            trigger: "associative_drift".into(),
            timestamp: Utc::now(),
            feedback: ThoughtFeedback::default(),
        }
    }

    #[test]
    fn test_system_prompt_includes_identity() {
        let identity = IdentityConfig {
            self_narrative: "I am a lighthouse keeper.".into(),
            traits: vec!["patient".into(), "wry".into()],
        };
        let s = PromptBuilder::new(300).system_prompt(&identity);
        assert!(s.contains("WHO YOU ARE"));
        assert!(s.contains("I am a lighthouse keeper."));
        assert!(s.contains("Your tendencies: patient. wry."));
        assert!(s.contains("[STATE: arousal=A, valence=V]"));

        let bare = PromptBuilder::new(300).system_prompt(&IdentityConfig::default());
        assert!(!bare.contains("WHO YOU ARE"));
    }

    #[test]
    fn test_state_block_bands() {
        let psych = PsychologicalState {
            arousal: 0.8,
            valence: -0.6,
            energy: 0.1,
            cognitive_load: 0.7,
            regulation_capacity: 0.1,
            isolation: IsolationState {
                phase: IsolationPhase::Severe,
                ..Default::default()
            },
            ..Default::default()
        };
        let block = state_block(&psych);
        assert!(block.contains("heart pounding"));
        assert!(block.contains("heavy darkness"));
        assert!(block.contains("deeply exhausted"));
        assert!(block.contains("muddled"));
        assert!(block.contains("raw"));
        assert!(block.contains("unbearable"));
    }

    #[test]
    fn test_distortion_context() {
        assert_eq!(distortion_context(&[]), "");
        let ctx = distortion_context(&[Distortion::Catastrophizing, Distortion::MindReading]);
        assert!(ctx.contains(Distortion::Catastrophizing.tendency()));
        assert!(ctx.contains("; "));
        assert!(!ctx.contains("catastrophizing"));
    }

    #[test]
    fn test_reactive_prompt_order() {
        let psych = PsychologicalState {
            distortions: vec![Distortion::Catastrophizing],
            ..Default::default()
        };
        let p = PromptBuilder::new(300).reactive(&psych, "arousal changed significantly", &[thought("So tired.")]);
        let state = p.find("HOW YOU FEEL").unwrap();
        let stream = p.find("So tired.").unwrap();
        let trigger = p.find("Something just shifted: arousal").unwrap();
        let tendency = p.find("Right now,").unwrap();
        assert!(state < stream && stream < trigger && trigger < tendency);
        assert!(p.ends_with("natural inner voice."));
    }

    #[test]
    fn test_thought_stream_keeps_most_recent() {
        let builder = PromptBuilder::new(300);
        assert_eq!(builder.stream_capacity(), 3);
        let recent: Vec<Thought> = (0..5).map(|i| thought(&format!("thought {}", i))).collect();
        let p = builder.spontaneous(
            &PsychologicalState::default(),
            &ThoughtCandidate {
                priority: Priority::GoalRehearsal,
                label: "goal_rehearsal",
                prompt: "the letter you never sent".into(),
                weight: 3.0,
            },
            &recent,
        );
        assert!(!p.contains("thought 1"));
        assert!(p.contains("thought 2") && p.contains("thought 4"));
        assert!(p.contains("Your mind turns to: the letter you never sent"));
    }

    #[test]
    fn test_conversational_framing() {
        let b = PromptBuilder::new(300);
        let psych = PsychologicalState::default();
        assert!(b
            .conversational(&psych, &ExternalInput::speech("hello?"), &[])
            .contains("Someone says to you: \"hello?\""));
        assert!(b
            .conversational(&psych, &ExternalInput::action("hands you a blanket"), &[])
            .contains("Someone hands you a blanket."));
    }
}
