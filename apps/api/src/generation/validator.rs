//! Turns raw model text into a stage's typed result.
//!
//! Parse, and on failure repair once (code fences, surrounding prose) and parse again.
//! The parsed value is then checked against the stage's `FieldRule`s before it is
//! deserialized. Nothing is ever defaulted: a missing required field is a contract
//! violation.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::generation::contract::{FieldKind, FieldRule, Items, Stage};

/// Validates `raw` against `stage`'s contract and deserializes it as `T`.
pub fn validate_as<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<T, AppError> {
    let mut value = parse_with_repair(stage, raw)?;
    check_object(stage, &mut value, stage.rules(), "")?;
    serde_json::from_value(value)
        .map_err(|e| AppError::contract(stage.name(), format!("unexpected shape: {e}")))
}

fn parse_with_repair(stage: Stage, raw: &str) -> Result<Value, AppError> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!("Stage {stage} returned unparsable JSON ({first}); attempting repair");
            serde_json::from_str::<Value>(repair(raw)).map_err(|e| {
                AppError::contract(stage.name(), format!("output is not valid JSON: {e}"))
            })
        }
    }
}

/// Strips code fences, then cuts everything outside the outermost braces.
fn repair(text: &str) -> &str {
    let text = strip_json_fences(text);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Strips markdown code fences (```json ... ``` or ``` ... ```) if present.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

fn check_object(
    stage: Stage,
    value: &mut Value,
    rules: &[FieldRule],
    path: &str,
) -> Result<(), AppError> {
    let violation = |reason: String| AppError::contract(stage.name(), reason);

    let Some(obj) = value.as_object_mut() else {
        let at = if path.is_empty() { "output" } else { path.trim_end_matches('.') };
        return Err(violation(format!("{at} must be a JSON object")));
    };

    for rule in rules {
        let key = format!("{path}{}", rule.key);
        let field = match obj.get_mut(rule.key) {
            Some(Value::Null) | None if rule.required => {
                return Err(violation(format!("missing required key '{key}'")));
            }
            Some(Value::Null) | None => continue,
            Some(field) => field,
        };

        if !matches_kind(field, &rule.kind) {
            if rule.required {
                return Err(violation(format!(
                    "'{key}' must be {}",
                    rule.kind.describe()
                )));
            }
            warn!("Stage {stage}: optional '{key}' is not {}; coercing to null", rule.kind.describe());
            *field = Value::Null;
            continue;
        }

        match (&rule.kind, field) {
            (FieldKind::String, Value::String(s)) if rule.required && s.trim().is_empty() => {
                return Err(violation(format!("'{key}' is blank")));
            }
            (FieldKind::Array { items, non_empty }, Value::Array(elements)) => {
                if *non_empty && elements.is_empty() {
                    return Err(violation(format!("'{key}' must not be empty")));
                }
                for (i, element) in elements.iter_mut().enumerate() {
                    match items {
                        Items::Any => {}
                        Items::Strings if element.is_string() => {}
                        Items::Strings => {
                            return Err(violation(format!("'{key}[{i}]' must be a string")));
                        }
                        Items::Objects(item_rules) => {
                            check_object(stage, element, item_rules, &format!("{key}[{i}]."))?;
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn matches_kind(value: &Value, kind: &FieldKind) -> bool {
    match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Array { .. } => value.is_array(),
        FieldKind::Any => true,
    }
}
