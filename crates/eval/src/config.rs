//! Declarative rule configuration.
//!
//! The on-disk shape is a list of rule-set objects:
//!
//! ```json
//! [
//!   {
//!     "rule_set": [
//!       {"target": "Entry/AnswersJson/PAGE/STATUS", "type": "equals", "type_args": ["test"]},
//!       {"target": "Entry/AnswersJson/PAGE/PHOTO", "type": "empty", "invert": true}
//!     ],
//!     "alert": {"message": "test entry {id}", "variables": {"id": "Entry/DsRowId"}}
//!   }
//! ]
//! ```
//!
//! Routing rule sets carry `routing_data` (alias `routing`) instead of, or
//! next to, an alert. These types only describe the document; turning them
//! into evaluable rule sets happens in [`crate::rules`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One predicate applied to one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub type_args: Vec<Value>,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default)]
    pub message: String,
    /// Placeholder name to record path.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSetConfig {
    #[serde(default)]
    pub rule_set: Vec<RuleConfig>,
    #[serde(default)]
    pub alert: Option<AlertConfig>,
    #[serde(default, alias = "routing")]
    pub routing_data: Option<Value>,
}

/// Everything a [`crate::RuleEngine`] is built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule sets that flag a submission as excluded (first match wins).
    #[serde(default)]
    pub exclude_rules: Vec<RuleSetConfig>,
    /// Rule sets that select a destination (last match wins).
    #[serde(default)]
    pub routes: Vec<RuleSetConfig>,
    /// Routing payload used when no route matches.
    #[serde(default)]
    pub default_route: Option<Value>,
}
