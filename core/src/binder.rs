//! Converts the opaque parameters value of a turn into an actual tool call.
//!
//! The model may legally express "no parameters", "named parameters", or
//! "one free-form string" depending on which schema dialect is in force.
//! This module is the single place that absorbs that ambiguity; the loop
//! and the tools themselves stay agnostic to it.

use crate::error::ToolError;
use crate::traits::tool::value_to_text;
use crate::traits::{Tool, ToolArgs};
use serde_json::{Map, Value};
use std::sync::Arc;

/// The closed set of shapes a parameters value can take. Classification is
/// total: every JSON value lands in exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParamShape {
    /// Absent, null, the sentinel, or an empty container.
    Empty,
    /// A mapping whose first key looks like a parameter name.
    Named(Map<String, Value>),
    /// A single comma-delimited string smuggled through a mapping whose
    /// key does not look like a name (e.g. `{"2,3": null}`).
    Delimited(String),
    /// An ordered sequence, one argument per element.
    Positional(Vec<Value>),
    /// Any other scalar, passed as the sole positional argument.
    Scalar(Value),
}

pub(crate) fn classify(params: Option<&Value>, sentinel: &str) -> ParamShape {
    match params {
        None | Some(Value::Null) => ParamShape::Empty,
        Some(Value::String(s)) => classify_text(s, sentinel),
        Some(Value::Object(map)) => classify_map(map, sentinel),
        Some(Value::Array(items)) if items.is_empty() => ParamShape::Empty,
        Some(Value::Array(items)) => ParamShape::Positional(items.clone()),
        Some(other) => ParamShape::Scalar(other.clone()),
    }
}

fn classify_text(s: &str, sentinel: &str) -> ParamShape {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == sentinel {
        return ParamShape::Empty;
    }
    // Models sometimes double-encode: a string field whose content is
    // itself a JSON document. Unwrap one level and reclassify.
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && let Ok(inner) = serde_json::from_str::<Value>(trimmed)
    {
        return classify(Some(&inner), sentinel);
    }
    ParamShape::Scalar(Value::String(trimmed.to_string()))
}

fn classify_map(map: &Map<String, Value>, _sentinel: &str) -> ParamShape {
    let Some((first_key, first_value)) = map.iter().next() else {
        return ParamShape::Empty;
    };
    if first_key.chars().any(|c| c.is_alphabetic()) {
        return ParamShape::Named(map.clone());
    }
    // The values themselves are the arguments; the key carries them only
    // when no value was given.
    let raw = match first_value {
        Value::Null => first_key.clone(),
        Value::String(s) if s.trim().is_empty() => first_key.clone(),
        other => value_to_text(other),
    };
    ParamShape::Delimited(raw)
}

pub(crate) fn to_args(shape: ParamShape) -> ToolArgs {
    match shape {
        ParamShape::Empty => ToolArgs::Empty,
        ParamShape::Named(map) => ToolArgs::Named(map),
        ParamShape::Delimited(raw) => ToolArgs::Positional(
            raw.split(',').map(|part| part.trim().to_string()).collect(),
        ),
        ParamShape::Positional(items) => {
            ToolArgs::Positional(items.iter().map(value_to_text).collect())
        }
        ParamShape::Scalar(value) => ToolArgs::Positional(vec![value_to_text(&value)]),
    }
}

fn check_contract(tool: &dyn Tool, args: &ToolArgs) -> Result<(), String> {
    let Some(contract) = tool.contract() else {
        return Ok(());
    };
    match args {
        ToolArgs::Named(map) => {
            let missing: Vec<&str> = contract
                .iter()
                .filter(|name| !map.contains_key(name.as_str()))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(format!(
                    "missing required parameters: {}",
                    missing.join(", ")
                ))
            }
        }
        ToolArgs::Positional(values) if values.len() != contract.len() => Err(format!(
            "expected {} positional parameters ({}), got {}",
            contract.len(),
            contract.join(", "),
            values.len()
        )),
        _ => Ok(()),
    }
}

/// Classifies `params`, checks the tool's contract, and invokes it. Tool
/// failures and empty results come back as [`ToolError`], never as a raw
/// fault to the loop's caller.
pub async fn bind_and_call(
    tool: &Arc<dyn Tool>,
    params: Option<&Value>,
    sentinel: &str,
) -> Result<String, ToolError> {
    let args = to_args(classify(params, sentinel));

    if let Err(message) = check_contract(tool.as_ref(), &args) {
        return Err(ToolError::new(tool.name(), message));
    }

    match tool.invoke(args).await {
        Ok(result) if result.trim().is_empty() => {
            Err(ToolError::new(tool.name(), "tool returned an empty result"))
        }
        Ok(result) => Ok(result),
        Err(e) => Err(ToolError::new(tool.name(), e.to_string())),
    }
}
