//! External collaborators of the form pipeline.
//!
//! The rule engine and form model are pure; everything that touches the
//! outside world goes through the async traits defined here:
//!
//! - [`ObjectStore`]: where submissions and attachments are kept
//! - [`Publisher`]: the message queue the GIS integration listens on
//! - [`CoordinateLookup`]: the geocoding service
//! - [`AttachmentSource`]: the form provider's attachment downloads
//!
//! In-memory and directory-backed implementations are provided for tests
//! and local runs. The [`batch`] module wires the collaborators to the
//! rule engine.

pub mod batch;
pub mod directory;
pub mod error;
pub mod memory;
pub mod record;
pub mod traits;

pub use batch::{
    list_submissions, missing_attachments, query_store, sync_attachments, sync_store, BatchReport,
    BatchSummary, Outcome, Pipeline, StoreSyncSummary, SyncSummary,
};
pub use directory::{DirectoryAttachmentSource, DirectoryStore};
pub use error::ConnectError;
pub use memory::{
    MemoryAttachmentSource, MemoryObjectStore, MemoryPublisher, PublishedMessage,
    StaticCoordinateLookup,
};
pub use record::{ObjectMeta, PublishMessage, PublishMetadata, PushEnvelope};
pub use traits::{AttachmentSource, CoordinateLookup, ObjectStore, Publisher};
