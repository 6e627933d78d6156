use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// The call shapes the parameter binder can produce. Tools receive exactly
/// one of these; helper accessors let a tool accept either shape without
/// caring which schema dialect produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolArgs {
    #[default]
    Empty,
    Named(Map<String, Value>),
    Positional(Vec<String>),
}

impl ToolArgs {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            ToolArgs::Empty => 0,
            ToolArgs::Named(map) => map.len(),
            ToolArgs::Positional(values) => values.len(),
        }
    }

    /// Looks up a named argument, stringified.
    pub fn named(&self, key: &str) -> Option<String> {
        match self {
            ToolArgs::Named(map) => map.get(key).map(value_to_text),
            _ => None,
        }
    }

    pub fn positional(&self, index: usize) -> Option<String> {
        match self {
            ToolArgs::Positional(values) => values.get(index).cloned(),
            _ => None,
        }
    }

    /// Named lookup with a positional fallback, so `{"path": "x"}` and a
    /// bare `"x"` both reach the same parameter.
    pub fn get(&self, key: &str, index: usize) -> Option<String> {
        self.named(key).or_else(|| self.positional(index))
    }

    pub fn require(&self, key: &str, index: usize) -> anyhow::Result<String> {
        self.get(key, index)
            .ok_or_else(|| anyhow::anyhow!("missing '{}' parameter", key))
    }
}

impl fmt::Display for ToolArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolArgs::Empty => write!(f, "(no arguments)"),
            ToolArgs::Named(map) => {
                let pairs: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, value_to_text(v)))
                    .collect();
                write!(f, "{}", pairs.join(", "))
            }
            ToolArgs::Positional(values) => write!(f, "{}", values.join(", ")),
        }
    }
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An invocable capability. `name` is the registry key and must be unique;
/// `description` is injected verbatim into the compiled prompt.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Required parameter names, if the tool declares them. The binder
    /// rejects named calls missing any of these and positional calls of
    /// the wrong arity.
    fn contract(&self) -> Option<Vec<String>> {
        None
    }

    async fn invoke(&self, args: ToolArgs) -> anyhow::Result<String>;
}

type ToolFn = dyn Fn(ToolArgs) -> anyhow::Result<String> + Send + Sync;

/// Adapts a plain closure into a [`Tool`], for callers that just want to
/// hand the agent a function with a name and a description.
pub struct FnTool {
    name: String,
    description: String,
    contract: Option<Vec<String>>,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(ToolArgs) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            contract: None,
            func: Box::new(func),
        }
    }

    pub fn with_contract<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contract = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn contract(&self) -> Option<Vec<String>> {
        self.contract.clone()
    }

    async fn invoke(&self, args: ToolArgs) -> anyhow::Result<String> {
        (self.func)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(value: Value) -> ToolArgs {
        ToolArgs::Named(value.as_object().unwrap().clone())
    }

    #[test]
    fn named_lookup_stringifies() {
        let args = named(json!({"expression": "2+2", "count": 3}));
        assert_eq!(args.named("expression").as_deref(), Some("2+2"));
        assert_eq!(args.named("count").as_deref(), Some("3"));
        assert_eq!(args.named("missing"), None);
    }

    #[test]
    fn get_falls_back_to_positional() {
        let args = ToolArgs::Positional(vec!["2".into(), "3".into()]);
        assert_eq!(args.get("min", 0).as_deref(), Some("2"));
        assert_eq!(args.get("max", 1).as_deref(), Some("3"));
        assert!(args.require("missing", 5).is_err());
    }

    #[tokio::test]
    async fn fn_tool_round_trip() {
        let tool = FnTool::new("echo", "Echoes its input", |args: ToolArgs| {
            args.require("text", 0)
        })
        .with_contract(["text"]);

        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.contract(), Some(vec!["text".to_string()]));
        let out = tool
            .invoke(ToolArgs::Positional(vec!["hello".into()]))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }
}
