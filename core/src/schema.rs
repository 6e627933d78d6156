use crate::error::ParseError;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const DEFAULT_SENTINEL: &str = "None";

/// The generic meanings the loop reasons in. Every schema maps these onto
/// its own literal field names, so the loop never sees wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Tool,
    Parameters,
    Answer,
    Reasoning,
}

/// Declares which fields a model reply must contain and how they map onto
/// the role vocabulary. One loop supports arbitrarily many prompt dialects
/// by swapping this out.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    required_fields: Vec<String>,
    role_to_field: HashMap<Role, String>,
    defaults: HashMap<String, Value>,
    sentinel: String,
}

impl ResponseSchema {
    pub fn new<I, S>(required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = Vec::new();
        for field in required_fields {
            let field = field.into();
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Self {
            required_fields: fields,
            role_to_field: HashMap::new(),
            defaults: HashMap::new(),
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }

    pub fn with_role(mut self, role: Role, field: impl Into<String>) -> Self {
        self.role_to_field.insert(role, field.into());
        self
    }

    /// Value used when the model omits the field entirely.
    pub fn with_default(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(field.into(), value.into());
        self
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn field_for(&self, role: Role) -> Option<&str> {
        self.role_to_field.get(&role).map(String::as_str)
    }

    /// Construction-time invariant: the roles the loop depends on must
    /// resolve to a field that is either required or defaulted. A schema
    /// that omits `Parameters` implies zero-argument tool calls.
    pub fn verify(&self) -> Result<(), String> {
        for role in [Role::Tool, Role::Answer] {
            match self.role_to_field.get(&role) {
                None => return Err(format!("role {role:?} is not mapped to any field")),
                Some(field)
                    if !self.required_fields.contains(field)
                        && !self.defaults.contains_key(field) =>
                {
                    return Err(format!(
                        "role {role:?} targets field '{field}' which is neither required nor defaulted"
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Every required field must be present in the decoded block, unless it
    /// carries an explicit default.
    pub fn validate(&self, fields: &Map<String, Value>) -> Result<(), ParseError> {
        let missing: Vec<String> = self
            .required_fields
            .iter()
            .filter(|f| !fields.contains_key(f.as_str()) && !self.defaults.contains_key(f.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParseError::MissingFields(missing))
        }
    }

    /// Map the raw field/value pairs into the role vocabulary. Pure: same
    /// input mapping, same `ParsedTurn`, always.
    pub fn project(&self, fields: &Map<String, Value>) -> ParsedTurn {
        let value_of = |role: Role| -> Option<Value> {
            let field = self.role_to_field.get(&role)?;
            fields
                .get(field.as_str())
                .or_else(|| self.defaults.get(field.as_str()))
                .cloned()
        };

        ParsedTurn {
            tool: self.text_role(value_of(Role::Tool)),
            parameters: value_of(Role::Parameters).filter(|v| !self.is_unpopulated(v)),
            answer: self.text_role(value_of(Role::Answer)),
            reasoning: self.text_role(value_of(Role::Reasoning)),
        }
    }

    /// Null, the sentinel, and blank strings all mean "role not populated".
    fn is_unpopulated(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == self.sentinel
            }
            _ => false,
        }
    }

    fn text_role(&self, value: Option<Value>) -> Option<String> {
        let value = value?;
        if self.is_unpopulated(&value) {
            return None;
        }
        Some(match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

/// One interpreted model reply, keyed by role. Transient: produced each
/// iteration, consumed by the loop's decision step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTurn {
    pub tool: Option<String>,
    pub parameters: Option<Value>,
    pub answer: Option<String>,
    pub reasoning: Option<String>,
}
