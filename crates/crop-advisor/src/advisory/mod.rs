//! Rule-based advisory engine.
//!
//! A catalog snapshot (factors, outcomes and the conditions linking them) is
//! indexed into a [`FactBase`] per request. The [`QuestionPlanner`] decides what
//! to ask next given the answers so far, and the [`RecommendationRanker`]
//! scores outcomes against those answers.

pub mod answers;
pub mod catalog;
pub mod domain;
pub mod evaluator;
pub mod fact_base;
pub mod planner;
pub mod ranker;
pub mod router;
pub mod service;
pub mod value;

#[cfg(test)]
mod tests;

pub use answers::Answers;
pub use catalog::{
    CatalogError, CatalogSnapshot, CatalogSource, CsvRuleCatalog, FileCatalog, InMemoryCatalog,
    JsonFileCatalog,
};
pub use domain::{Condition, ConditionId, Factor, FactorId, Operator, Outcome, OutcomeId};
pub use evaluator::evaluate;
pub use fact_base::{CatalogSummary, FactBase, FactorValues};
pub use planner::{
    FullPlan, NextStep, PlannerConfig, Question, QuestionOption, QuestionPlanner,
    NO_COMPATIBLE_OUTCOMES, QUESTIONNAIRE_COMPLETE,
};
pub use ranker::{
    RankedRecommendation, RecommendationRanker, ScoredOutcome, StrictRecommendation,
    DEFAULT_RANKED_LIMIT, NO_RECOMMENDATIONS,
};
pub use router::advisory_router;
pub use service::{AdvisoryConfig, AdvisoryError, AdvisoryService};
pub use value::{ParsedValue, ValueShape};
