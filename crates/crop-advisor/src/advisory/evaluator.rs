//! Condition predicate shared by the planner and the ranker.
//!
//! [`evaluate`] is total: malformed numbers fall through to a
//! case-insensitive string comparison, and an empty answer never satisfies a
//! condition.

use super::domain::Operator;
use super::value::{ParsedValue, ValueShape};

/// Decide whether `answer_value` satisfies the rule `operator rule_value`.
pub fn evaluate(operator: &str, rule_value: &str, answer_value: &str) -> bool {
    let rule = ParsedValue::parse(rule_value);
    let answer = ParsedValue::parse(answer_value);
    evaluate_parsed(Operator::parse(operator), &rule, &answer)
}

/// Same as [`evaluate`] over values that were already parsed at the boundary.
/// `None` stands for an operator outside the supported set.
pub fn evaluate_parsed(
    operator: Option<Operator>,
    rule: &ParsedValue,
    answer: &ParsedValue,
) -> bool {
    if answer.is_empty() {
        return false;
    }

    if operator == Some(Operator::Equal) && !rule.is_range() && rule.threshold_direction().is_none()
    {
        return rule.text_eq(answer);
    }

    if let ValueShape::Range { low, high } = rule.shape() {
        return within_range(low, high, rule, answer);
    }

    // A prefix on the rule value outranks the operator column.
    let direction = rule.threshold_direction().or(match operator {
        Some(Operator::AtLeast) | Some(Operator::AtMost) => operator,
        _ => None,
    });

    if let Some(direction) = direction {
        if let Some(holds) = compare_threshold(direction, rule, answer) {
            return holds;
        }
    }

    rule.text_eq(answer)
}

fn within_range(low: u64, high: u64, rule: &ParsedValue, answer: &ParsedValue) -> bool {
    match answer.shape() {
        ValueShape::Integer(value) => low <= value && value <= high,
        ValueShape::Range {
            low: answer_low,
            high: answer_high,
        } => answer_low >= low && answer_high <= high,
        ValueShape::AtLeast(Some(bound)) => bound >= low,
        ValueShape::AtMost(Some(bound)) => bound <= high,
        _ => rule.text_eq(answer),
    }
}

fn compare_threshold(
    direction: Operator,
    rule: &ParsedValue,
    answer: &ParsedValue,
) -> Option<bool> {
    let bound = rule.numeric_bound()?;
    let observed = match answer.shape() {
        ValueShape::Integer(value) => Some(value),
        ValueShape::AtLeast(value) if direction == Operator::AtLeast => value,
        ValueShape::AtMost(value) if direction == Operator::AtMost => value,
        ValueShape::AtLeast(_) | ValueShape::AtMost(_) => None,
        ValueShape::Range { low, high } => match direction {
            Operator::AtLeast => Some(low),
            _ => Some(high),
        },
        ValueShape::Text { .. } => None,
    }?;

    Some(match direction {
        Operator::AtLeast => observed >= bound,
        Operator::AtMost => observed <= bound,
        Operator::Equal => observed == bound,
    })
}
