//! Turns a raw model reply into a role-keyed [`ParsedTurn`].
//!
//! The model is instructed to wrap its structured answer in one fenced
//! block. Extraction, decoding and validation are pure; any failure is
//! reported to the loop, which decides how to react.

use crate::error::ParseError;
use crate::schema::{ParsedTurn, ResponseSchema};
use serde_json::Value;

/// Fence pairs accepted for the structured block, tried in order. Some
/// models emit `'''json` instead of a proper backtick fence.
const FENCES: &[(&str, &str)] = &[("```json", "```"), ("'''json", "'''")];

/// Returns the contents of the first structured block in `raw`, if any.
pub fn extract_block(raw: &str) -> Option<&str> {
    for (open, close) in FENCES {
        if let Some(start) = raw.find(open) {
            let body = &raw[start + open.len()..];
            if let Some(end) = body.find(close) {
                return Some(body[..end].trim());
            }
        }
    }
    None
}

pub fn interpret(raw: &str, schema: &ResponseSchema) -> Result<ParsedTurn, ParseError> {
    let block = extract_block(raw).ok_or(ParseError::NoStructuredBlock)?;

    let value: Value =
        serde_json::from_str(block).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let fields = value
        .as_object()
        .ok_or_else(|| ParseError::Malformed("structured block is not a JSON object".into()))?;

    schema.validate(fields)?;
    Ok(schema.project(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ResponseSchema, Role};
    use serde_json::json;

    fn schema() -> ResponseSchema {
        ResponseSchema::new(["Tool call", "Tool Parameters", "Final Response"])
            .with_role(Role::Tool, "Tool call")
            .with_role(Role::Parameters, "Tool Parameters")
            .with_role(Role::Answer, "Final Response")
    }

    #[test]
    fn extract_backtick_fence() {
        let raw = "Sure, let me work on that.\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_block(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_quote_fence() {
        let raw = "'''json\n{\"a\": 1}\n'''";
        assert_eq!(extract_block(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_prefers_first_block() {
        let raw = "```json\n{\"a\": 1}\n```\ntext\n```json\n{\"a\": 2}\n```";
        assert_eq!(extract_block(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn no_block_is_an_error() {
        let err = interpret("I cannot answer in that format.", &schema()).unwrap_err();
        assert_eq!(err, ParseError::NoStructuredBlock);
    }

    #[test]
    fn unclosed_fence_is_no_block() {
        assert_eq!(extract_block("```json\n{\"a\": 1}"), None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let raw = "```json\n{\"Tool call\": }\n```";
        assert!(matches!(
            interpret(raw, &schema()),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn non_object_block_is_malformed() {
        let raw = "```json\n[1, 2, 3]\n```";
        assert!(matches!(
            interpret(raw, &schema()),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn missing_fields_surface_from_validate() {
        let raw = "```json\n{\"Tool call\": \"calculator\"}\n```";
        assert!(matches!(
            interpret(raw, &schema()),
            Err(ParseError::MissingFields(_))
        ));
    }

    #[test]
    fn full_tool_turn_round_trip() {
        let raw = concat!(
            "I will use the calculator.\n",
            "```json\n",
            "{\"Tool call\": \"calculator\", ",
            "\"Tool Parameters\": {\"expression\": \"456*789\"}, ",
            "\"Final Response\": \"None\"}\n",
            "```\n"
        );
        let turn = interpret(raw, &schema()).unwrap();
        assert_eq!(turn.tool.as_deref(), Some("calculator"));
        assert_eq!(turn.parameters, Some(json!({"expression": "456*789"})));
        assert_eq!(turn.answer, None);
        assert_eq!(turn.reasoning, None);
    }

    #[test]
    fn answer_turn_round_trip() {
        let raw = "```json\n{\"Tool call\": \"None\", \"Tool Parameters\": \"None\", \"Final Response\": \"359784\"}\n```";
        let turn = interpret(raw, &schema()).unwrap();
        assert_eq!(turn.tool, None);
        assert_eq!(turn.answer.as_deref(), Some("359784"));
    }

    #[test]
    fn reasoning_rides_along_when_mapped() {
        let schema = ResponseSchema::new(["Action", "Action Input", "Final Answer"])
            .with_role(Role::Tool, "Action")
            .with_role(Role::Parameters, "Action Input")
            .with_role(Role::Answer, "Final Answer")
            .with_role(Role::Reasoning, "Thought")
            .with_default("Thought", "");
        let raw = concat!(
            "```json\n",
            "{\"Thought\": \"the user wants arithmetic\", ",
            "\"Action\": \"calculator\", ",
            "\"Action Input\": \"2+2\", ",
            "\"Final Answer\": \"None\"}\n",
            "```"
        );
        let turn = interpret(raw, &schema).unwrap();
        assert_eq!(turn.reasoning.as_deref(), Some("the user wants arithmetic"));
        assert_eq!(turn.tool.as_deref(), Some("calculator"));
    }
}
