//! Coping strategy selection.
//!
//! A fixed decision tree over stress, personality, available resources and
//! how controllable the stressor is. Yields a primary strategy and at most
//! one secondary.

use crate::personality::Personality;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopingStrategy {
    ProblemSolving,
    Reappraisal,
    Acceptance,
    Distraction,
    /// Pushing emotions down, physiologically costly
    Suppression,
    Rumination,
    Denial,
}

impl CopingStrategy {
    pub const ALL: [CopingStrategy; 7] = [
        CopingStrategy::ProblemSolving,
        CopingStrategy::Reappraisal,
        CopingStrategy::Acceptance,
        CopingStrategy::Distraction,
        CopingStrategy::Suppression,
        CopingStrategy::Rumination,
        CopingStrategy::Denial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CopingStrategy::ProblemSolving => "problem_solving",
            CopingStrategy::Reappraisal => "reappraisal",
            CopingStrategy::Acceptance => "acceptance",
            CopingStrategy::Distraction => "distraction",
            CopingStrategy::Suppression => "suppression",
            CopingStrategy::Rumination => "rumination",
            CopingStrategy::Denial => "denial",
        }
    }
}

impl fmt::Display for CopingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resources available for coping, each `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopingResources {
    /// `1 - cognitive_load`
    pub cognitive: f64,
    pub energy: f64,
    pub regulation: f64,
}

/// Primary strategy plus an optional fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coping {
    pub primary: CopingStrategy,
    pub secondary: Option<CopingStrategy>,
}

impl Coping {
    fn one(primary: CopingStrategy) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    fn two(primary: CopingStrategy, secondary: CopingStrategy) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn strategies(&self) -> impl Iterator<Item = CopingStrategy> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    pub fn contains(&self, strategy: CopingStrategy) -> bool {
        self.strategies().any(|s| s == strategy)
    }
}

impl Default for Coping {
    fn default() -> Self {
        Self::one(CopingStrategy::ProblemSolving)
    }
}

/// Walk the decision tree. `controllability` above 0.5 means the agent can
/// act on the stressor.
pub fn select(
    stress: f64,
    p: &Personality,
    resources: &CopingResources,
    controllability: f64,
) -> Coping {
    use CopingStrategy::*;

    // higher-order coping collapses under extreme stress
    if stress > 0.85 {
        if resources.cognitive < 0.2 {
            return Coping::one(Denial);
        }
        if p.neuroticism() > 0.7 {
            return Coping::one(Rumination);
        }
    }

    if controllability > 0.5 {
        if resources.cognitive > 0.4 && resources.energy > 0.3 {
            if p.conscientiousness() > 0.5 {
                return Coping::one(ProblemSolving);
            }
            return Coping::two(ProblemSolving, Distraction);
        }
        return Coping::one(Distraction);
    }

    if resources.cognitive > 0.4 {
        if p.openness() > 0.5 && resources.regulation > 0.4 {
            return Coping::one(Reappraisal);
        }
        if p.agreeableness() > 0.6 {
            return Coping::one(Acceptance);
        }
        return Coping::one(Distraction);
    }

    if p.neuroticism() > 0.6 {
        Coping::two(Rumination, Suppression)
    } else {
        Coping::two(Distraction, Acceptance)
    }
}
