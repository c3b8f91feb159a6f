/// Errors raised while turning declarative rule configuration into rule sets.
///
/// These are load-time failures: a `RuleEngine` that was built successfully
/// never produces them during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A rule names a predicate type outside EMPTY, EQUALS, BIGGER, SMALLER.
    #[error("rule set {rule_set}, rule {rule}: unknown predicate type '{kind}'")]
    UnknownPredicate {
        rule_set: usize,
        rule: usize,
        kind: String,
    },

    /// A predicate was given the wrong number of `type_args`.
    #[error(
        "rule set {rule_set}, rule {rule}: predicate {predicate} takes {expected} argument(s), got {got}"
    )]
    ArgumentCount {
        rule_set: usize,
        rule: usize,
        predicate: &'static str,
        expected: usize,
        got: usize,
    },

    /// An alert message references a placeholder with no matching variable.
    #[error("rule set {rule_set}: alert message references undeclared variable '{name}'")]
    UndeclaredVariable { rule_set: usize, name: String },

    /// An alert message has an unbalanced `{` or `}`.
    #[error("rule set {rule_set}: malformed alert message: {message}")]
    MalformedAlert { rule_set: usize, message: String },

    /// A routing rule set has no `routing_data` to select.
    #[error("route {rule_set}: missing routing_data")]
    MissingRouting { rule_set: usize },

    /// The configuration document itself could not be deserialized
    /// (including a rule missing `target` or `type`).
    #[error("malformed rule configuration: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Malformed(e.to_string())
    }
}
