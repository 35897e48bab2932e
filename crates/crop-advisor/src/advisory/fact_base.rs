use super::answers::Answers;
use super::catalog::CatalogSnapshot;
use super::domain::{Condition, Factor, FactorId, Operator, Outcome, OutcomeId};
use super::evaluator::evaluate_parsed;
use super::value::ParsedValue;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Condition row with its operator and rule value parsed up front.
#[derive(Debug, Clone)]
pub struct IndexedCondition {
    condition: Condition,
    operator: Option<Operator>,
    rule: ParsedValue,
    factor_key: Option<String>,
}

impl IndexedCondition {
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn rule(&self) -> &ParsedValue {
        &self.rule
    }

    /// Lower-cased name of the referenced factor; `None` when it is dangling.
    pub fn factor_key(&self) -> Option<&str> {
        self.factor_key.as_deref()
    }

    pub fn answer<'a>(&self, answers: &'a Answers) -> Option<&'a ParsedValue> {
        self.factor_key().and_then(|key| answers.get(key))
    }

    /// Unanswered and dangling conditions never hold.
    pub fn holds_for(&self, answers: &Answers) -> bool {
        match self.answer(answers) {
            Some(answer) => evaluate_parsed(self.operator, &self.rule, answer),
            None => false,
        }
    }
}

/// Per-request index over a catalog snapshot.
#[derive(Debug, Clone)]
pub struct FactBase {
    factors: Vec<Factor>,
    outcomes: Vec<Outcome>,
    conditions: Vec<IndexedCondition>,
    factor_by_id: HashMap<FactorId, usize>,
    factor_by_name: HashMap<String, usize>,
    outcome_ids: HashSet<OutcomeId>,
    conditions_by_outcome: HashMap<OutcomeId, Vec<usize>>,
    conditions_by_factor: HashMap<FactorId, Vec<usize>>,
}

impl FactBase {
    pub fn build(snapshot: CatalogSnapshot) -> Self {
        let CatalogSnapshot {
            factors,
            outcomes,
            conditions,
        } = snapshot;

        let mut factor_by_id = HashMap::with_capacity(factors.len());
        let mut factor_by_name = HashMap::with_capacity(factors.len());
        for (index, factor) in factors.iter().enumerate() {
            factor_by_id.entry(factor.id).or_insert(index);
            factor_by_name.entry(factor.key()).or_insert(index);
        }

        let outcome_ids: HashSet<OutcomeId> = outcomes.iter().map(|outcome| outcome.id).collect();

        let mut conditions_by_outcome: HashMap<OutcomeId, Vec<usize>> = HashMap::new();
        let mut conditions_by_factor: HashMap<FactorId, Vec<usize>> = HashMap::new();
        let mut indexed = Vec::with_capacity(conditions.len());

        for (index, condition) in conditions.into_iter().enumerate() {
            let factor_key = factor_by_id
                .get(&condition.factor_id)
                .map(|position| factors[*position].key());
            if factor_key.is_none() {
                debug!(
                    condition = condition.id.0,
                    factor = %condition.factor_id,
                    "condition references unknown factor"
                );
            }
            if !outcome_ids.contains(&condition.outcome_id) {
                debug!(
                    condition = condition.id.0,
                    outcome = %condition.outcome_id,
                    "condition references unknown outcome"
                );
            }

            conditions_by_outcome
                .entry(condition.outcome_id)
                .or_default()
                .push(index);
            conditions_by_factor
                .entry(condition.factor_id)
                .or_default()
                .push(index);

            indexed.push(IndexedCondition {
                operator: Operator::parse(&condition.operator),
                rule: ParsedValue::parse(&condition.value),
                factor_key,
                condition,
            });
        }

        Self {
            factors,
            outcomes,
            conditions: indexed,
            factor_by_id,
            factor_by_name,
            outcome_ids,
            conditions_by_outcome,
            conditions_by_factor,
        }
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn conditions(&self) -> &[IndexedCondition] {
        &self.conditions
    }

    pub fn factor(&self, id: FactorId) -> Option<&Factor> {
        self.factor_by_id.get(&id).map(|index| &self.factors[*index])
    }

    pub fn factor_by_name(&self, name: &str) -> Option<&Factor> {
        self.factor_by_name
            .get(&name.trim().to_lowercase())
            .map(|index| &self.factors[*index])
    }

    pub fn conditions_for_outcome(
        &self,
        id: OutcomeId,
    ) -> impl Iterator<Item = &IndexedCondition> + '_ {
        self.indexed(self.conditions_by_outcome.get(&id))
    }

    pub fn conditions_for_factor(
        &self,
        id: FactorId,
    ) -> impl Iterator<Item = &IndexedCondition> + '_ {
        self.indexed(self.conditions_by_factor.get(&id))
    }

    /// Outcomes in snapshot order that carry at least one condition.
    pub fn outcomes_with_conditions(&self) -> impl Iterator<Item = &Outcome> + '_ {
        self.outcomes
            .iter()
            .filter(|outcome| self.conditions_by_outcome.contains_key(&outcome.id))
    }

    /// Factors ordered by their first use across conditions, followed by the
    /// factors no condition mentions.
    pub fn factors_by_first_appearance(&self) -> Vec<&Factor> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(self.factors.len());

        for condition in &self.conditions {
            if let Some(factor) = self.factor(condition.condition.factor_id) {
                if seen.insert(factor.id) {
                    ordered.push(factor);
                }
            }
        }
        for factor in &self.factors {
            if seen.insert(factor.id) {
                ordered.push(factor);
            }
        }

        ordered
    }

    /// Distinct raw condition values per factor, factors sorted by name.
    pub fn factor_values(&self) -> Vec<FactorValues> {
        let mut listing: Vec<FactorValues> = self
            .factors
            .iter()
            .map(|factor| {
                let mut values: Vec<String> = Vec::new();
                for condition in self.conditions_for_factor(factor.id) {
                    let raw = condition.condition.value.trim();
                    if !raw.is_empty() && !values.iter().any(|value| value == raw) {
                        values.push(raw.to_string());
                    }
                }
                FactorValues {
                    name: factor.key(),
                    values,
                }
            })
            .collect();

        listing.sort_by(|left, right| left.name.cmp(&right.name));
        listing
    }

    pub fn summary(&self) -> CatalogSummary {
        let dangling_conditions = self
            .conditions
            .iter()
            .filter(|condition| {
                condition.factor_key.is_none()
                    || !self.outcome_ids.contains(&condition.condition.outcome_id)
            })
            .count();

        CatalogSummary {
            factors: self.factors.len(),
            outcomes: self.outcomes.len(),
            conditions: self.conditions.len(),
            dangling_conditions,
        }
    }

    fn indexed<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a IndexedCondition> + 'a {
        positions
            .into_iter()
            .flatten()
            .map(move |index| &self.conditions[*index])
    }
}

/// Values a factor takes across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorValues {
    pub name: String,
    pub values: Vec<String>,
}

/// Catalog size counters, including conditions whose factor or outcome is
/// missing from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub factors: usize,
    pub outcomes: usize,
    pub conditions: usize,
    pub dangling_conditions: usize,
}
