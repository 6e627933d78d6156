//! Merges an agent profile's template with the live tool list. The result
//! still contains the user-input placeholder, which is bound per request.

use crate::profile::AgentConfig;
use std::fmt::Write;

pub const TOOL_LIST_PLACEHOLDER: &str = "{tool_list}";
pub const USER_INPUT_PLACEHOLDER: &str = "{user_input}";

/// Cached compiled form, valid while the registry revision is unchanged.
pub(crate) struct CompiledPrompt {
    pub revision: u64,
    pub text: String,
}

/// Deterministic: the same profile and tool list always compile to
/// byte-identical text.
pub fn compile(config: &AgentConfig, tools: &[(String, String)]) -> String {
    let tool_list = tools
        .iter()
        .map(|(name, description)| format!("- {name}: {description}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut compiled = config
        .prompt_template
        .replace(TOOL_LIST_PLACEHOLDER, &tool_list);

    if let Some(instructions) = &config.special_instructions {
        let _ = write!(compiled, "\n\n{instructions}");
    }

    if !config.examples.is_empty() {
        compiled.push_str("\n\nExamples:");
        for example in &config.examples {
            let _ = write!(compiled, "\n\n{example}");
        }
    }

    compiled
}
