/// Errors building a [`crate::Form`] from a raw submission.
///
/// Any of these means the submission is structurally invalid: callers skip
/// and log it instead of failing a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// An identity field or the answers section is absent (or null).
    #[error("missing {field} at '{path}'")]
    MissingField { field: &'static str, path: String },

    /// An identity field holds something other than a string or number.
    #[error("{field} at '{path}' must be a string or number, got {found}")]
    InvalidField {
        field: &'static str,
        path: String,
        found: &'static str,
    },

    /// The answers section exists but is not a mapping of pages.
    #[error("answers at '{path}' must be an object of pages")]
    InvalidAnswers { path: String },

    /// The submission document is not valid JSON.
    #[error("invalid submission JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors deriving a geocoding address from a submission.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// Neither the key field nor its fallback holds a string.
    #[error("no address key at '{key}' or '{fallback}'")]
    MissingKey { key: String, fallback: String },

    /// The address key does not match the configured address pattern.
    #[error("address key '{0}' does not match the address pattern")]
    Unmatched(String),

    /// The configured address pattern is not a usable regex.
    #[error("invalid address pattern: {0}")]
    Pattern(String),
}
