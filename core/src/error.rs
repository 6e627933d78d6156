use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures that terminate an `invoke` call. Returned as tagged values,
/// never panicked across the loop boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Missing provider, empty tool set, bad template or schema. Surfaced
    /// before any network call is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model collaborator failed or returned an empty reply.
    #[error("model call failed: {0}")]
    ModelCall(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The reply carried neither an answer nor a usable tool call.
    #[error("unresolvable turn: {}", .tool.as_deref().map(|t| format!("unknown tool '{t}'")).unwrap_or_else(|| "no answer and no tool named".to_string()))]
    UnresolvableTurn { tool: Option<String> },

    #[error("{phase} did not complete within {timeout:?}")]
    TimedOut { phase: TimedOutPhase, timeout: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedOutPhase {
    Model,
    Tool,
}

impl fmt::Display for TimedOutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimedOutPhase::Model => write!(f, "model call"),
            TimedOutPhase::Tool => write!(f, "tool call"),
        }
    }
}

/// Interpreter failures. The interpreter never guesses or repairs; the loop
/// decides what to do with these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no structured block found in model reply")]
    NoStructuredBlock,

    #[error("malformed structured block: {0}")]
    Malformed(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// A tool invocation that went wrong. Absorbed by the loop: the message is
/// written into the transcript so the model can react on its next turn.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("tool '{tool}' failed: {message}")]
pub struct ToolError {
    pub tool: String,
    pub message: String,
}

impl ToolError {
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
