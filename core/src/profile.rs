//! Agent personalities: a prompt template plus the response schema that
//! template teaches the model to follow. Immutable once an agent binds to
//! one; cheap to clone and share between agents.

use crate::schema::{ResponseSchema, Role};

const DEFAULT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub prompt_template: String,
    pub response_schema: ResponseSchema,
    /// Upper bound on model round-trips per `invoke` call. Always ≥ 1.
    pub max_iterations: usize,
    pub special_instructions: Option<String>,
    pub examples: Vec<String>,
}

impl AgentConfig {
    pub fn new(
        name: impl Into<String>,
        prompt_template: impl Into<String>,
        response_schema: ResponseSchema,
    ) -> Self {
        Self {
            name: name.into(),
            prompt_template: prompt_template.into(),
            response_schema,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            special_instructions: None,
            examples: Vec::new(),
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_special_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.special_instructions = Some(instructions.into());
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Fixed registry of built-in personalities, looked up by name.
    pub fn builtin(name: &str) -> Option<AgentConfig> {
        match name {
            "tool-call" => Some(tool_call_profile()),
            "react" => Some(react_profile()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["tool-call", "react"]
    }
}

const TOOL_CALL_TEMPLATE: &str = r#"You are a capable assistant that can call tools to answer the user's request.

Available tools:
{tool_list}

On every turn, reply with exactly one fenced JSON block:

```json
{
    "Tool call": "<tool name, or None>",
    "Tool Parameters": <parameters for the tool, or None>,
    "Final Response": "<your answer to the user, or None>"
}
```

Rules:
- To call a tool, put its name in "Tool call" and set "Final Response" to None.
- Pass parameters as a JSON object of name/value pairs, or None for tools that take none.
- Once you have everything you need, set "Tool call" to None and put your answer in "Final Response".
- Never fill both "Tool call" and "Final Response" on the same turn.

User request: {user_input}"#;

const REACT_TEMPLATE: &str = r#"Answer the user's request by working step by step. You may consult tools.

Available tools:
{tool_list}

Reply with exactly one fenced JSON block per turn:

```json
{
    "Thought": "<your reasoning for this step>",
    "Action": "<tool name, or None>",
    "Action Input": <tool parameters, or None>,
    "Final Answer": "<the answer, or None>"
}
```

Set "Action" to None and fill in "Final Answer" once you can answer.

User request: {user_input}"#;

/// The plain tool-calling dialect.
fn tool_call_profile() -> AgentConfig {
    let schema = ResponseSchema::new(["Tool call", "Tool Parameters", "Final Response"])
        .with_role(Role::Tool, "Tool call")
        .with_role(Role::Parameters, "Tool Parameters")
        .with_role(Role::Answer, "Final Response");
    AgentConfig::new("tool-call", TOOL_CALL_TEMPLATE, schema)
}

/// Same loop, different wire vocabulary, plus a reasoning side channel.
/// "Thought" is optional: it defaults to empty rather than failing
/// validation when the model omits it.
fn react_profile() -> AgentConfig {
    let schema = ResponseSchema::new(["Action", "Action Input", "Final Answer"])
        .with_role(Role::Tool, "Action")
        .with_role(Role::Parameters, "Action Input")
        .with_role(Role::Answer, "Final Answer")
        .with_role(Role::Reasoning, "Thought")
        .with_default("Thought", "");
    AgentConfig::new("react", REACT_TEMPLATE, schema)
}
