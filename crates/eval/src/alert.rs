//! Alert message templates.
//!
//! A template such as `"Form {form} from {provider} is a test entry"`
//! names variables in braces; each variable maps to a path resolved
//! against the record when the alert fires. `{{` and `}}` produce literal
//! braces. Placeholders are checked against the declared variables when
//! the template is loaded, so rendering never fails.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ConfigError;
use crate::path::resolve;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A parsed alert: message template plus variable paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    message: String,
    segments: Vec<Segment>,
    variables: BTreeMap<String, String>,
}

impl Alert {
    /// Parse `message` and check every placeholder against `variables`.
    ///
    /// `rule_set` is the index of the owning rule set, used in errors.
    pub fn parse(
        rule_set: usize,
        message: &str,
        variables: BTreeMap<String, String>,
    ) -> Result<Alert, ConfigError> {
        let segments = parse_segments(message).map_err(|message| ConfigError::MalformedAlert {
            rule_set,
            message,
        })?;
        for segment in &segments {
            if let Segment::Var(name) = segment {
                if !variables.contains_key(name) {
                    return Err(ConfigError::UndeclaredVariable {
                        rule_set,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(Alert {
            message: message.to_string(),
            segments,
            variables,
        })
    }

    /// The unrendered template.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Resolve every placeholder against `record` and build the message.
    pub fn render(&self, record: &Value) -> String {
        let mut out = String::with_capacity(self.message.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = self
                        .variables
                        .get(name)
                        .and_then(|path| resolve(record, path));
                    out.push_str(&render_value(value));
                }
            }
        }
        out
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_segments(message: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = message.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err("nested '{' in placeholder".to_string()),
                        Some(ch) => name.push(ch),
                        None => return Err("unterminated placeholder".to_string()),
                    }
                }
                if name.is_empty() {
                    return Err("empty placeholder".to_string());
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var(name));
            }
            '}' => return Err("single '}' outside placeholder".to_string()),
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
