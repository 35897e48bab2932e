use super::QuestionOption;
use crate::advisory::domain::{Factor, Operator, OutcomeId};
use crate::advisory::fact_base::{FactBase, IndexedCondition};
use std::collections::HashSet;

/// Options for the altitude question: every distinct value across all
/// outcomes, thresholds carrying their comparator (`>=2000`), in catalog order.
pub(crate) fn altitude_options(
    base: &FactBase,
    factor: &Factor,
    unit: &str,
) -> Vec<QuestionOption> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();

    for condition in base.conditions_for_factor(factor.id) {
        let Some(option) = altitude_option(condition, unit) else {
            continue;
        };
        if seen.insert(option.value.clone()) {
            options.push(option);
        }
    }

    options
}

fn altitude_option(condition: &IndexedCondition, unit: &str) -> Option<QuestionOption> {
    let raw = condition.condition().value.trim();
    if raw.is_empty() {
        return None;
    }

    let rule = condition.rule();
    if rule.is_range() {
        return Some(QuestionOption {
            value: rule.normalized().to_string(),
            label: with_unit(raw, unit),
        });
    }

    let direction = rule.threshold_direction().or(match condition.operator() {
        Some(Operator::AtLeast) | Some(Operator::AtMost) => condition.operator(),
        _ => None,
    });

    let option = match (direction, rule.numeric_bound()) {
        (Some(operator @ (Operator::AtLeast | Operator::AtMost)), Some(bound)) => {
            let glyph = if operator == Operator::AtLeast { "≥" } else { "≤" };
            QuestionOption {
                value: format!("{}{bound}", operator.symbol()),
                label: with_unit(&format!("{glyph} {bound}"), unit),
            }
        }
        (_, Some(_)) => QuestionOption {
            value: rule.normalized().to_string(),
            label: with_unit(raw, unit),
        },
        (_, None) => QuestionOption {
            value: rule.normalized().to_string(),
            label: raw.to_string(),
        },
    };

    Some(option)
}

/// Options for an ordinary factor, restricted to the candidate outcomes and
/// widened to the whole catalog when fewer than two remain.
pub(crate) fn factor_options(
    base: &FactBase,
    factor: &Factor,
    candidates: &HashSet<OutcomeId>,
) -> Vec<QuestionOption> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();

    let restricted = base
        .conditions_for_factor(factor.id)
        .filter(|condition| candidates.contains(&condition.condition().outcome_id));
    push_distinct(restricted, &mut seen, &mut options);

    if options.len() < 2 {
        push_distinct(base.conditions_for_factor(factor.id), &mut seen, &mut options);
    }

    options.sort_by_cached_key(|option| option.label.to_lowercase());
    options
}

fn push_distinct<'a>(
    conditions: impl Iterator<Item = &'a IndexedCondition>,
    seen: &mut HashSet<String>,
    options: &mut Vec<QuestionOption>,
) {
    for condition in conditions {
        let value = condition.rule().normalized();
        if value.is_empty() || !seen.insert(value.to_string()) {
            continue;
        }
        options.push(QuestionOption {
            value: value.to_string(),
            label: condition.condition().value.trim().to_string(),
        });
    }
}

fn with_unit(text: &str, unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        text.to_string()
    } else {
        format!("{text} {unit}")
    }
}
