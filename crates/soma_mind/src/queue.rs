//! Spontaneous thought queue.
//!
//! Pending items are kept per category. Selection is weighted-random across
//! every pending item plus an associative-drift fallback built from the
//! current mood, so urgent categories usually win without starving the rest.
//! Drift is always on offer; absorption only makes it less likely.

use rand::Rng;
use serde::Serialize;
use soma_psyche::{IsolationPhase, PsychologicalState};

use crate::thought::Priority;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThoughtCandidate {
    pub priority: Priority,
    pub label: &'static str,
    /// What the mind turns to, fed into the prompt
    pub prompt: String,
    /// Selection weight; the priority weight except for damped drift
    pub weight: f64,
}

impl ThoughtCandidate {
    fn new(priority: Priority, prompt: impl Into<String>) -> Self {
        Self {
            priority,
            label: priority.name(),
            prompt: prompt.into(),
            weight: priority.weight(),
        }
    }
}

/// How much full absorption damps the drift weight.
const ABSORPTION_DRIFT_DAMPING: f64 = 0.9;

#[derive(Debug, Clone, Default)]
pub struct ThoughtQueue {
    prediction_errors: Vec<String>,
    needs: Vec<String>,
    goals: Vec<String>,
    social_concerns: Vec<String>,
    /// Depth of the current thought chain, `None` when not absorbed
    absorption: Option<f64>,
}

impl ThoughtQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a candidate using the thread RNG.
    pub fn select(&self, psych: &PsychologicalState) -> ThoughtCandidate {
        self.select_with(psych, rand::thread_rng().gen::<f64>())
    }

    /// Deterministic selection; `r` is a uniform draw in `[0, 1)`.
    pub fn select_with(&self, psych: &PsychologicalState, r: f64) -> ThoughtCandidate {
        let (mut candidates, drift) = self.candidates(psych);
        let total: f64 = candidates.iter().map(|c| c.weight).sum::<f64>() + drift.weight;
        let target = if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 } * total;

        let mut cumulative = 0.0;
        for i in 0..candidates.len() {
            cumulative += candidates[i].weight;
            if target <= cumulative {
                return candidates.swap_remove(i);
            }
        }
        drift
    }

    /// Pending candidates, and the drift fallback that closes the list.
    fn candidates(&self, psych: &PsychologicalState) -> (Vec<ThoughtCandidate>, ThoughtCandidate) {
        let pending = [
            (Priority::PredictionError, &self.prediction_errors),
            (Priority::BiologicalNeed, &self.needs),
            (Priority::GoalRehearsal, &self.goals),
            (Priority::SocialModeling, &self.social_concerns),
        ];
        let candidates = pending
            .into_iter()
            .flat_map(|(priority, items)| items.iter().map(move |item| ThoughtCandidate::new(priority, item.as_str())))
            .collect();

        let mut drift = ThoughtCandidate::new(Priority::AssociativeDrift, drift_prompt(psych));
        drift.weight *= 1.0 - ABSORPTION_DRIFT_DAMPING * self.absorption_depth();
        (candidates, drift)
    }

    /// Rebuild the biological needs list from the current state.
    pub fn update_needs(&mut self, psych: &PsychologicalState) {
        self.needs.clear();
        if psych.energy < 0.2 {
            self.needs.push("You are worn out. Your body is asking for rest.".into());
        }
        if psych.valence < -0.5 && psych.arousal > 0.6 {
            self.needs.push("Something is wrong. You feel distressed and agitated.".into());
        }
        if psych.isolation.phase >= IsolationPhase::Loneliness {
            self.needs.push("You feel very alone. You want someone to talk to.".into());
        }
    }

    pub fn needs(&self) -> &[String] {
        &self.needs
    }

    pub fn add_prediction_error(&mut self, description: impl Into<String>) {
        self.prediction_errors.push(description.into());
    }

    /// Remove the first matching prediction error.
    pub fn resolve_prediction_error(&mut self, description: &str) -> bool {
        match self.prediction_errors.iter().position(|e| e == description) {
            Some(i) => {
                self.prediction_errors.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn prediction_errors(&self) -> &[String] {
        &self.prediction_errors
    }

    pub fn add_goal(&mut self, goal: impl Into<String>) {
        self.goals.push(goal.into());
    }

    pub fn add_social_concern(&mut self, concern: impl Into<String>) {
        self.social_concerns.push(concern.into());
    }

    /// Deep in a chain of thought: the mind wanders less, the deeper the more.
    pub fn enter_absorption(&mut self, depth: f64) {
        let depth = if depth.is_finite() { depth.clamp(0.0, 1.0) } else { 0.0 };
        self.absorption = Some(depth);
    }

    pub fn exit_absorption(&mut self) {
        self.absorption = None;
    }

    pub fn is_absorbed(&self) -> bool {
        self.absorption.is_some()
    }

    pub fn absorption_depth(&self) -> f64 {
        self.absorption.unwrap_or(0.0)
    }
}

fn drift_prompt(psych: &PsychologicalState) -> &'static str {
    if psych.energy < 0.3 {
        "Your mind drifts, thoughts moving slowly. You feel drained."
    } else if psych.valence < -0.3 {
        "Your thoughts wander somewhere darker. Something keeps nagging at you."
    } else if psych.arousal < 0.2 && psych.energy > 0.5 {
        "Your mind is quiet and open. Thoughts come and go without urgency."
    } else {
        "Your mind wanders, one thought leading to the next."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_psyche::IsolationState;

    fn calm() -> PsychologicalState {
        PsychologicalState {
            arousal: 0.3,
            valence: 0.2,
            energy: 0.7,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_queue_drifts() {
        let q = ThoughtQueue::new();
        let c = q.select_with(&calm(), 0.5);
        assert_eq!(c.priority, Priority::AssociativeDrift);
        assert_eq!(c.label, "associative_drift");
    }

    #[test]
    fn test_weighted_selection_boundaries() {
        let mut q = ThoughtQueue::new();
        q.add_prediction_error("The door was open.");
        q.add_goal("Finish the letter.");
        // weights 8 + 3 + 1 = 12
        let pick = |r| q.select_with(&calm(), r).priority;
        assert_eq!(pick(0.0), Priority::PredictionError);
        assert_eq!(pick(0.6), Priority::PredictionError);
        assert_eq!(pick(0.8), Priority::GoalRehearsal);
        assert_eq!(pick(0.99), Priority::AssociativeDrift);
    }

    #[test]
    fn test_resolve_prediction_error() {
        let mut q = ThoughtQueue::new();
        q.add_prediction_error("a");
        q.add_prediction_error("b");
        assert!(q.resolve_prediction_error("a"));
        assert!(!q.resolve_prediction_error("a"));
        assert_eq!(q.prediction_errors(), ["b".to_string()]);
    }

    #[test]
    fn test_update_needs_replaces_list() {
        let mut q = ThoughtQueue::new();
        let mut p = PsychologicalState {
            energy: 0.1,
            valence: -0.7,
            arousal: 0.8,
            isolation: IsolationState {
                phase: IsolationPhase::Loneliness,
                ..Default::default()
            },
            ..Default::default()
        };
        q.update_needs(&p);
        assert_eq!(q.needs().len(), 3);

        p = calm();
        q.update_needs(&p);
        assert!(q.needs().is_empty());
    }

    #[test]
    fn test_absorption_damps_but_keeps_drift() {
        let mut q = ThoughtQueue::new();
        q.enter_absorption(1.0);
        assert!(q.is_absorbed());
        // nothing pending: drift is still offered
        assert_eq!(q.select_with(&calm(), 0.5).priority, Priority::AssociativeDrift);

        q.add_social_concern("Did I sound rude?");
        // weights 2 + 0.1: drift only wins the top sliver
        let drift = q.select_with(&calm(), 0.99);
        assert_eq!(drift.priority, Priority::AssociativeDrift);
        assert!((drift.weight - 0.1).abs() < 1e-9);
        assert_eq!(q.select_with(&calm(), 0.9).priority, Priority::SocialModeling);

        q.exit_absorption();
        assert_eq!(q.absorption_depth(), 0.0);
        // weights 2 + 1
        assert_eq!(q.select_with(&calm(), 0.9).priority, Priority::AssociativeDrift);
        assert_eq!(q.select_with(&calm(), 0.9).weight, 1.0);
    }

    #[test]
    fn test_drift_prompt_follows_mood() {
        let q = ThoughtQueue::new();
        let drained = PsychologicalState {
            energy: 0.1,
            ..Default::default()
        };
        assert!(q.select_with(&drained, 0.0).prompt.contains("drained"));
        let dark = PsychologicalState {
            energy: 0.6,
            valence: -0.5,
            ..Default::default()
        };
        assert!(q.select_with(&dark, 0.0).prompt.contains("darker"));
    }
}
