use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::answers::Answers;
use super::catalog::{CatalogError, CatalogSource};
use super::fact_base::{CatalogSummary, FactBase, FactorValues};
use super::planner::{FullPlan, NextStep, PlannerConfig, QuestionPlanner};
use super::ranker::{
    RankedRecommendation, RecommendationRanker, StrictRecommendation, DEFAULT_RANKED_LIMIT,
};

/// Knobs shared by every request handled by the advisory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    pub planner: PlannerConfig,
    pub ranked_limit: usize,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            ranked_limit: DEFAULT_RANKED_LIMIT,
        }
    }
}

/// Service fetching a fresh catalog snapshot per call and running the planner
/// or ranker over it.
pub struct AdvisoryService<C> {
    catalog: Arc<C>,
    config: Arc<AdvisoryConfig>,
}

impl<C> AdvisoryService<C>
where
    C: CatalogSource + 'static,
{
    pub fn new(catalog: Arc<C>, config: AdvisoryConfig) -> Self {
        Self {
            catalog,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Full list of questions still open for `answers`.
    pub fn plan_all(&self, answers: &Answers) -> Result<FullPlan, AdvisoryError> {
        let base = self.fact_base()?;
        let plan = QuestionPlanner::new(&base, &self.config.planner).plan_all(answers);
        debug!(
            answers = answers.len(),
            questions = plan.questions.len(),
            "planned questionnaire"
        );
        Ok(plan)
    }

    /// Next question to ask, if any.
    pub fn plan_next(&self, answers: &Answers) -> Result<NextStep, AdvisoryError> {
        let base = self.fact_base()?;
        let step = QuestionPlanner::new(&base, &self.config.planner).plan_next(answers);
        debug!(
            answers = answers.len(),
            question = step.question.as_ref().map(|question| question.id.as_str()),
            pending = step.pending_count,
            "planned next question"
        );
        Ok(step)
    }

    pub fn recommend_strict(
        &self,
        answers: &Answers,
    ) -> Result<StrictRecommendation, AdvisoryError> {
        let base = self.fact_base()?;
        let result = RecommendationRanker::new(&base, self.config.ranked_limit).strict(answers);
        debug!(
            answers = answers.len(),
            count = result.count,
            "strict recommendation"
        );
        Ok(result)
    }

    pub fn recommend_ranked(
        &self,
        answers: &Answers,
    ) -> Result<RankedRecommendation, AdvisoryError> {
        let base = self.fact_base()?;
        let result = RecommendationRanker::new(&base, self.config.ranked_limit).ranked(answers);
        debug!(
            answers = answers.len(),
            count = result.count,
            "ranked recommendation"
        );
        Ok(result)
    }

    pub fn factor_values(&self) -> Result<Vec<FactorValues>, AdvisoryError> {
        Ok(self.fact_base()?.factor_values())
    }

    pub fn summary(&self) -> Result<CatalogSummary, AdvisoryError> {
        Ok(self.fact_base()?.summary())
    }

    fn fact_base(&self) -> Result<FactBase, AdvisoryError> {
        let snapshot = self.catalog.snapshot().map_err(|err| {
            warn!(error = %err, "catalog snapshot unavailable");
            err
        })?;
        Ok(FactBase::build(snapshot))
    }
}

/// Error raised by the advisory service.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
