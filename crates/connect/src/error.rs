/// All errors that can be returned by an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// No object is stored under the key.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The key cannot name an object (empty, absolute, or escaping the store).
    #[error("invalid object key: {key}")]
    InvalidKey { key: String },

    /// Filesystem failure in a directory-backed store.
    #[error("i/o error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The publisher rejected or failed to deliver a message.
    #[error("publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },

    /// The coordinate service failed (as opposed to finding nothing).
    #[error("coordinate lookup failed: {0}")]
    Lookup(String),

    /// A push delivery body could not be decoded.
    #[error("invalid push envelope: {0}")]
    Envelope(String),

    /// Any other backend-specific failure (serialization, clock, ...).
    #[error("backend error: {0}")]
    Backend(String),
}
