use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(pub i64);

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factor-{}", self.0)
    }
}

impl fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "outcome-{}", self.0)
    }
}

/// Observable attribute the questionnaire can ask about (altitude, climate, soil).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub id: FactorId,
    pub name: String,
}

impl Factor {
    /// Lookup key used for answers and question ids.
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// Recommendable result, e.g. a crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub description: String,
}

/// Single `(factor, operator, value)` requirement attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    pub factor_id: FactorId,
    pub outcome_id: OutcomeId,
    pub operator: String,
    pub value: String,
}

/// Comparator carried by a condition. `=<` and `=>` are accepted spellings of
/// `<=` and `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    AtMost,
    AtLeast,
}

impl Operator {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "=" | "==" => Some(Self::Equal),
            "<=" | "=<" => Some(Self::AtMost),
            ">=" | "=>" => Some(Self::AtLeast),
            _ => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::AtMost => "<=",
            Self::AtLeast => ">=",
        }
    }
}
