//! Adaptive questionnaire.
//!
//! The altitude factor gates everything else: while it is unanswered it is the
//! only question offered. Afterwards the remaining factors are asked in
//! priority order, each with the values still reachable from the outcomes the
//! answers have not ruled out.

mod options;

use super::answers::Answers;
use super::domain::{Factor, FactorId, OutcomeId};
use super::fact_base::FactBase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const NO_COMPATIBLE_OUTCOMES: &str = "No compatible outcomes for the answers supplied.";
pub const QUESTIONNAIRE_COMPLETE: &str = "No more questions.";

/// Ordering and labelling knobs for the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Name of the factor asked before anything else.
    pub altitude_factor: String,
    /// Factor names asked right after altitude, in this order.
    pub priority_factors: Vec<String>,
    /// Also ask every other factor, ordered by first appearance in the rules.
    pub include_unlisted_factors: bool,
    /// Unit appended to altitude option labels.
    pub unit_label: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            altitude_factor: "altitud".to_string(),
            priority_factors: Vec::new(),
            include_unlisted_factors: true,
            unit_label: "msnm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(rename = "v")]
    pub value: String,
    #[serde(rename = "t")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    fn for_factor(factor: &Factor, options: Vec<QuestionOption>) -> Self {
        Self {
            id: factor.key(),
            text: factor.name.clone(),
            options,
        }
    }
}

/// Every question still open, for rendering an upfront form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullPlan {
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Single step of the turn-by-turn flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub question: Option<Question>,
    /// Questions still ahead, including the one returned. While altitude is
    /// unanswered it is the only askable question; the count also includes the
    /// factors that will open up once it is answered.
    #[serde(rename = "pendingCount")]
    pub pending_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

enum Pending {
    Altitude { question: Question, remaining: usize },
    Questions(Vec<Question>),
    NoCompatibleOutcomes,
}

pub struct QuestionPlanner<'a> {
    base: &'a FactBase,
    config: &'a PlannerConfig,
}

impl<'a> QuestionPlanner<'a> {
    pub fn new(base: &'a FactBase, config: &'a PlannerConfig) -> Self {
        Self { base, config }
    }

    pub fn plan_all(&self, answers: &Answers) -> FullPlan {
        match self.pending(answers) {
            Pending::Altitude { question, .. } => FullPlan {
                questions: vec![question],
                message: None,
            },
            Pending::Questions(questions) => FullPlan {
                questions,
                message: None,
            },
            Pending::NoCompatibleOutcomes => FullPlan {
                questions: Vec::new(),
                message: Some(NO_COMPATIBLE_OUTCOMES.to_string()),
            },
        }
    }

    pub fn plan_next(&self, answers: &Answers) -> NextStep {
        match self.pending(answers) {
            Pending::Altitude {
                question,
                remaining,
            } => NextStep {
                question: Some(question),
                pending_count: remaining + 1,
                message: None,
            },
            Pending::Questions(questions) => {
                let pending_count = questions.len();
                let question = questions.into_iter().next();
                let message = question
                    .is_none()
                    .then(|| QUESTIONNAIRE_COMPLETE.to_string());
                NextStep {
                    question,
                    pending_count,
                    message,
                }
            }
            Pending::NoCompatibleOutcomes => NextStep {
                question: None,
                pending_count: 0,
                message: Some(NO_COMPATIBLE_OUTCOMES.to_string()),
            },
        }
    }

    /// Outcomes not yet ruled out. Conditions on unanswered factors are
    /// ignored here; only answered ones can eliminate an outcome.
    pub fn candidate_outcomes(&self, answers: &Answers) -> Vec<OutcomeId> {
        self.base
            .outcomes_with_conditions()
            .filter(|outcome| {
                self.base
                    .conditions_for_outcome(outcome.id)
                    .all(|condition| match condition.answer(answers) {
                        Some(_) => condition.holds_for(answers),
                        None => true,
                    })
            })
            .map(|outcome| outcome.id)
            .collect()
    }

    /// Non-altitude factors in the order they are asked.
    pub fn question_order(&self) -> Vec<&'a Factor> {
        let altitude = self.altitude_factor().map(|factor| factor.id);
        let mut seen: HashSet<FactorId> = HashSet::new();
        let mut ordered = Vec::new();

        let listed = self
            .config
            .priority_factors
            .iter()
            .filter_map(|name| self.base.factor_by_name(name));
        for factor in listed {
            if Some(factor.id) != altitude && seen.insert(factor.id) {
                ordered.push(factor);
            }
        }

        if self.config.include_unlisted_factors {
            for factor in self.base.factors_by_first_appearance() {
                if Some(factor.id) != altitude && seen.insert(factor.id) {
                    ordered.push(factor);
                }
            }
        }

        ordered
    }

    fn altitude_factor(&self) -> Option<&'a Factor> {
        self.base.factor_by_name(&self.config.altitude_factor)
    }

    fn pending(&self, answers: &Answers) -> Pending {
        if let Some(altitude) = self.altitude_factor() {
            if !answers.is_answered(&altitude.key()) {
                let options =
                    options::altitude_options(self.base, altitude, &self.config.unit_label);
                if !options.is_empty() {
                    let remaining = self
                        .question_order()
                        .into_iter()
                        .filter(|factor| !answers.is_answered(&factor.key()))
                        .filter(|factor| self.has_values(factor))
                        .count();
                    return Pending::Altitude {
                        question: Question::for_factor(altitude, options),
                        remaining,
                    };
                }
            }
        }

        let candidates: HashSet<OutcomeId> =
            self.candidate_outcomes(answers).into_iter().collect();
        if candidates.is_empty() {
            return Pending::NoCompatibleOutcomes;
        }

        let questions = self
            .question_order()
            .into_iter()
            .filter(|factor| !answers.is_answered(&factor.key()))
            .filter_map(|factor| {
                let options = options::factor_options(self.base, factor, &candidates);
                (!options.is_empty()).then(|| Question::for_factor(factor, options))
            })
            .collect();

        Pending::Questions(questions)
    }

    fn has_values(&self, factor: &Factor) -> bool {
        self.base
            .conditions_for_factor(factor.id)
            .any(|condition| !condition.rule().is_empty())
    }
}
