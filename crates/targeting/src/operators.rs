//! Comparison operators for the three stored data shapes.
//!
//! `actual` is `None` when the source value is absent. Apart from the presence
//! checks (`exists` / `does_not_exist`), an absent value never matches.

use optimize_core::types::Operator;

/// Compares a raw string value.
pub fn compare_string(actual: Option<&str>, operator: Operator, expected: &str) -> bool {
    match operator {
        Operator::Exists => actual.is_some(),
        Operator::DoesNotExist => actual.is_none(),
        Operator::Is => actual.is_some_and(|a| a == expected),
        Operator::IsNot => actual.is_some_and(|a| a != expected),
        Operator::Contains => actual.is_some_and(|a| a.contains(expected)),
        Operator::DoesNotContain => actual.is_some_and(|a| !a.contains(expected)),
    }
}

/// Compares a comma separated list by element membership.
///
/// Only `contains` / `does_not_contain` (and the presence checks) apply to lists.
pub fn compare_list(actual: Option<&str>, operator: Operator, expected: &str) -> bool {
    let expected = expected.trim();
    let member = |raw: &str| raw.split(',').map(str::trim).any(|item| item == expected);
    match operator {
        Operator::Exists => actual.is_some(),
        Operator::DoesNotExist => actual.is_none(),
        Operator::Contains => actual.is_some_and(member),
        Operator::DoesNotContain => actual.is_some_and(|raw| !member(raw)),
        Operator::Is | Operator::IsNot => false,
    }
}

/// Extracts `key` from a JSON object and compares it.
///
/// Unparseable payloads and non-object payloads never match. Non-string fields
/// compare by their JSON text for `is` / `is_not`; substring operators only
/// apply to string fields.
pub fn compare_object_field(
    actual: Option<&str>,
    key: &str,
    operator: Operator,
    expected: &str,
) -> bool {
    let Some(raw) = actual else {
        return operator == Operator::DoesNotExist;
    };
    let Ok(serde_json::Value::Object(object)) = serde_json::from_str::<serde_json::Value>(raw)
    else {
        return false;
    };

    match object.get(key) {
        None | Some(serde_json::Value::Null) => operator == Operator::DoesNotExist,
        Some(serde_json::Value::String(field)) => {
            compare_string(Some(field.as_str()), operator, expected)
        }
        Some(field) => match operator {
            Operator::Exists => true,
            Operator::DoesNotExist => false,
            Operator::Is => field.to_string() == expected,
            Operator::IsNot => field.to_string() != expected,
            Operator::Contains | Operator::DoesNotContain => false,
        },
    }
}
