use super::answers::Answers;
use super::domain::Outcome;
use super::fact_base::FactBase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const NO_RECOMMENDATIONS: &str = "No recommendations for this combination of answers.";
pub const DEFAULT_RANKED_LIMIT: usize = 5;

/// Outcomes whose every condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictRecommendation {
    pub count: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredOutcome {
    pub description: String,
    pub percentage: u32,
}

/// Best partial matches, highest percentage first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub count: usize,
    pub recommendations: Vec<ScoredOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct RecommendationRanker<'a> {
    base: &'a FactBase,
    limit: usize,
}

impl<'a> RecommendationRanker<'a> {
    pub fn new(base: &'a FactBase, limit: usize) -> Self {
        Self {
            base,
            limit: limit.max(1),
        }
    }

    /// An outcome with a condition on an unanswered factor never qualifies.
    pub fn strict(&self, answers: &Answers) -> StrictRecommendation {
        let mut seen = HashSet::new();
        let recommendations: Vec<String> = self
            .base
            .outcomes_with_conditions()
            .filter(|outcome| {
                self.base
                    .conditions_for_outcome(outcome.id)
                    .all(|condition| condition.holds_for(answers))
            })
            .filter(|outcome| seen.insert(outcome.description.as_str()))
            .map(|outcome| outcome.description.clone())
            .collect();

        if recommendations.is_empty() {
            return StrictRecommendation {
                count: 0,
                recommendations: vec![NO_RECOMMENDATIONS.to_string()],
            };
        }

        StrictRecommendation {
            count: recommendations.len(),
            recommendations,
        }
    }

    /// Unanswered conditions stay in the denominator but never count as
    /// matched. Ties keep catalog order.
    pub fn ranked(&self, answers: &Answers) -> RankedRecommendation {
        let mut scored: Vec<ScoredOutcome> = self
            .base
            .outcomes_with_conditions()
            .filter_map(|outcome| self.score(outcome, answers))
            .filter(|scored| scored.percentage > 0)
            .collect();

        scored.sort_by(|left, right| right.percentage.cmp(&left.percentage));
        scored.truncate(self.limit);

        let message = scored
            .is_empty()
            .then(|| NO_RECOMMENDATIONS.to_string());

        RankedRecommendation {
            count: scored.len(),
            recommendations: scored,
            message,
        }
    }

    fn score(&self, outcome: &Outcome, answers: &Answers) -> Option<ScoredOutcome> {
        let (total, matched) = self
            .base
            .conditions_for_outcome(outcome.id)
            .fold((0u64, 0u64), |(total, matched), condition| {
                let hit = u64::from(condition.holds_for(answers));
                (total + 1, matched + hit)
            });

        if total == 0 {
            return None;
        }

        Some(ScoredOutcome {
            description: outcome.description.clone(),
            percentage: (matched * 100 / total) as u32,
        })
    }
}
