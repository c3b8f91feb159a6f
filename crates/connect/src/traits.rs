use async_trait::async_trait;

use formroute_form::{Address, Coordinates};

use crate::error::ConnectError;
use crate::record::ObjectMeta;

/// A flat key/value object store holding submissions and attachments.
///
/// Keys are `/`-separated names; listing is by plain string prefix, the
/// way bucket listings behave. Implementations must be `Send + Sync` so a
/// store can be shared across tasks processing forms concurrently.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All objects whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, ConnectError>;

    /// The object's bytes, or `ConnectError::NotFound`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ConnectError>;

    async fn exists(&self, key: &str) -> Result<bool, ConnectError>;

    /// Create or replace an object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ConnectError>;
}

/// A message-queue publisher.
///
/// Retry and backoff are the implementation's concern.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` on `topic`, returning the message id.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<String, ConnectError>;
}

/// The geocoding service.
///
/// `Ok(None)` means the service answered but knows no such address;
/// `Err` is reserved for failures to get an answer at all.
#[async_trait]
pub trait CoordinateLookup: Send + Sync {
    async fn lookup(&self, address: &Address) -> Result<Option<Coordinates>, ConnectError>;
}

/// Where attachments are downloaded from before they are stored.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ConnectError>;
}
