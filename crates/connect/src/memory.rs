//! In-memory collaborators for tests, dry runs and local tooling.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use formroute_form::{Address, Coordinates};

use crate::error::ConnectError;
use crate::record::ObjectMeta;
use crate::traits::{AttachmentSource, CoordinateLookup, ObjectStore, Publisher};

// ──────────────────────────────────────────────
// MemoryObjectStore
// ──────────────────────────────────────────────

/// An object store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `objects`.
    pub fn with_objects<K, V>(objects: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let objects = objects
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        MemoryObjectStore {
            objects: RwLock::new(objects),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, ConnectError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, bytes)| ObjectMeta {
                key: key.clone(),
                size: bytes.len() as u64,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ConnectError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ConnectError::NotFound {
                key: key.to_string(),
            })
    }

    async fn exists(&self, key: &str) -> Result<bool, ConnectError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ConnectError> {
        if key.is_empty() {
            return Err(ConnectError::InvalidKey {
                key: key.to_string(),
            });
        }
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// MemoryPublisher
// ──────────────────────────────────────────────

/// A message published to a [`MemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub id: String,
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A publisher that keeps every message it is given, in order.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: RwLock<Vec<PublishedMessage>>,
    next_id: AtomicU64,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.read().await.clone()
    }

    pub async fn on_topic(&self, topic: &str) -> Vec<PublishedMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<String, ConnectError> {
        if topic.is_empty() {
            return Err(ConnectError::Publish {
                topic: topic.to_string(),
                message: "empty topic".to_string(),
            });
        }
        let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        self.messages.write().await.push(PublishedMessage {
            id: id.clone(),
            topic: topic.to_string(),
            payload,
        });
        Ok(id)
    }
}

// ──────────────────────────────────────────────
// StaticCoordinateLookup
// ──────────────────────────────────────────────

/// A coordinate lookup answering from a fixed table.
///
/// Addresses are keyed by `postcode`, `house_number` and the optional
/// suffix joined with `_`, the same shape as the submission keys
/// (`1234AB12_A`). A fallback point, when set, answers every address not
/// in the table.
#[derive(Debug, Clone, Default)]
pub struct StaticCoordinateLookup {
    points: HashMap<String, Coordinates>,
    fallback: Option<Coordinates>,
}

impl StaticCoordinateLookup {
    pub fn new(points: HashMap<String, Coordinates>) -> Self {
        StaticCoordinateLookup {
            points,
            fallback: None,
        }
    }

    /// Every address resolves to `point`.
    pub fn fixed(point: Coordinates) -> Self {
        StaticCoordinateLookup {
            points: HashMap::new(),
            fallback: Some(point),
        }
    }

    /// No address resolves.
    pub fn empty() -> Self {
        Self::default()
    }

    fn key(address: &Address) -> String {
        match &address.suffix {
            Some(suffix) => format!("{}{}_{}", address.postcode, address.house_number, suffix),
            None => format!("{}{}", address.postcode, address.house_number),
        }
    }
}

#[async_trait]
impl CoordinateLookup for StaticCoordinateLookup {
    async fn lookup(&self, address: &Address) -> Result<Option<Coordinates>, ConnectError> {
        Ok(self
            .points
            .get(&Self::key(address))
            .copied()
            .or(self.fallback))
    }
}

// ──────────────────────────────────────────────
// MemoryAttachmentSource
// ──────────────────────────────────────────────

/// Serves attachment bytes by download URL and counts the fetches.
#[derive(Debug, Default)]
pub struct MemoryAttachmentSource {
    files: HashMap<String, Vec<u8>>,
    fetches: AtomicU64,
}

impl MemoryAttachmentSource {
    pub fn new(files: HashMap<String, Vec<u8>>) -> Self {
        MemoryAttachmentSource {
            files,
            fetches: AtomicU64::new(0),
        }
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AttachmentSource for MemoryAttachmentSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ConnectError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| ConnectError::NotFound {
                key: url.to_string(),
            })
    }
}
