use super::value::ParsedValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answers supplied for a single request, keyed by lower-cased factor name.
///
/// Keys are trimmed and lower-cased and every value is parsed once on the way
/// in. Blank values are dropped, so a factor answered with `""` reads as
/// unanswered everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, String>"
)]
pub struct Answers {
    entries: BTreeMap<String, ParsedValue>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut answers = Self::new();
        for (key, value) in pairs {
            answers.insert(key.as_ref(), value.as_ref());
        }
        answers
    }

    pub fn insert(&mut self, factor: &str, value: &str) {
        let key = normalize_key(factor);
        let parsed = ParsedValue::parse(value);
        if key.is_empty() || parsed.is_empty() {
            self.entries.remove(&key);
            return;
        }
        self.entries.insert(key, parsed);
    }

    pub fn get(&self, factor: &str) -> Option<&ParsedValue> {
        self.entries.get(&normalize_key(factor))
    }

    pub fn is_answered(&self, factor: &str) -> bool {
        self.get(factor).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_key(factor: &str) -> String {
    factor.trim().to_lowercase()
}

impl From<BTreeMap<String, Option<String>>> for Answers {
    fn from(raw: BTreeMap<String, Option<String>>) -> Self {
        let mut answers = Self::new();
        for (key, value) in raw {
            answers.insert(&key, value.as_deref().unwrap_or_default());
        }
        answers
    }
}

impl From<Answers> for BTreeMap<String, String> {
    fn from(answers: Answers) -> Self {
        answers
            .entries
            .into_iter()
            .map(|(key, value)| (key, value.normalized().to_string()))
            .collect()
    }
}
