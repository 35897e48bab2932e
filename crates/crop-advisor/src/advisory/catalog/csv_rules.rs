use super::CatalogSnapshot;
use crate::advisory::domain::{Condition, ConditionId, Factor, FactorId, Outcome, OutcomeId};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;

/// Build a snapshot from a flat rule export with one condition per row.
///
/// Factors and outcomes are numbered in order of first appearance; factor
/// names are matched case-insensitively, outcome descriptions exactly.
pub(crate) fn parse_rules<R: Read>(reader: R) -> Result<CatalogSnapshot, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut builder = SnapshotBuilder::default();

    for record in csv_reader.deserialize::<RuleRow>() {
        let row = record?;
        if row.factor.is_empty() || row.outcome.is_empty() {
            continue;
        }
        builder.push(row);
    }

    Ok(builder.finish())
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    #[serde(alias = "Factor", alias = "factor_name")]
    factor: String,
    #[serde(alias = "Outcome", alias = "crop")]
    outcome: String,
    #[serde(
        alias = "Operator",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    operator: Option<String>,
    #[serde(alias = "Value", default)]
    value: String,
}

#[derive(Default)]
struct SnapshotBuilder {
    snapshot: CatalogSnapshot,
    factor_ids: HashMap<String, FactorId>,
    outcome_ids: HashMap<String, OutcomeId>,
}

impl SnapshotBuilder {
    fn push(&mut self, row: RuleRow) {
        let factor_id = self.factor_id(&row.factor);
        let outcome_id = self.outcome_id(&row.outcome);
        let id = ConditionId(self.snapshot.conditions.len() as i64 + 1);

        self.snapshot.conditions.push(Condition {
            id,
            factor_id,
            outcome_id,
            operator: row.operator.unwrap_or_else(|| "=".to_string()),
            value: row.value,
        });
    }

    fn factor_id(&mut self, name: &str) -> FactorId {
        let key = name.to_lowercase();
        if let Some(id) = self.factor_ids.get(&key) {
            return *id;
        }
        let id = FactorId(self.snapshot.factors.len() as i64 + 1);
        self.snapshot.factors.push(Factor {
            id,
            name: name.to_string(),
        });
        self.factor_ids.insert(key, id);
        id
    }

    fn outcome_id(&mut self, description: &str) -> OutcomeId {
        if let Some(id) = self.outcome_ids.get(description) {
            return *id;
        }
        let id = OutcomeId(self.snapshot.outcomes.len() as i64 + 1);
        self.snapshot.outcomes.push(Outcome {
            id,
            description: description.to_string(),
        });
        self.outcome_ids.insert(description.to_string(), id);
        id
    }

    fn finish(self) -> CatalogSnapshot {
        self.snapshot
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
