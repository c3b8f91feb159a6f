//! Batch operations over the submissions held in an object store.
//!
//! Each submission is handled on its own: an unreadable or invalid object
//! is logged and counted, never allowed to stop the batch. A failing
//! collaborator ends the batch with its error.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use formroute_eval::{evaluate_first_match, expand_ranges, RuleEngine, RuleSet};
use formroute_form::{to_geojson, AddressParser, Attachment, Form, FormSettings};

use crate::error::ConnectError;
use crate::record::{PublishMessage, PublishMetadata};
use crate::traits::{AttachmentSource, CoordinateLookup, ObjectStore, Publisher};

/// Keys of every non-empty object under `entry_prefix` followed by any
/// expansion of `suffix`, in key order and without duplicates.
pub async fn list_submissions(
    store: &dyn ObjectStore,
    entry_prefix: &str,
    suffix: &str,
) -> Result<Vec<String>, ConnectError> {
    let mut keys = BTreeSet::new();
    for expansion in expand_ranges(suffix) {
        let prefix = format!("{}{}", entry_prefix, expansion);
        for meta in store.list(&prefix).await? {
            if meta.is_placeholder() {
                continue;
            }
            keys.insert(meta.key);
        }
    }
    Ok(keys.into_iter().collect())
}

/// Run an ad-hoc query over stored submissions.
///
/// Returns the keys of the submissions for which some query rule set
/// passes. Objects that are not JSON are skipped with a warning.
pub async fn query_store(
    store: &dyn ObjectStore,
    entry_prefix: &str,
    suffix: &str,
    query: &[RuleSet],
) -> Result<Vec<String>, ConnectError> {
    let mut matching = Vec::new();
    for key in list_submissions(store, entry_prefix, suffix).await? {
        let bytes = store.get(&key).await?;
        let record: Value = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %key, error = %e, "skipping submission that is not JSON");
                continue;
            }
        };
        if evaluate_first_match(&record, query).matched {
            debug!(key = %key, "submission matches query");
            matching.push(key);
        }
    }
    Ok(matching)
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Invalid { reason: String },
    Excluded { message: Option<String> },
    Unrouted,
    Unlocated { reason: String },
    Published { topic: String, message_id: String },
}

/// Counts over a processed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub invalid: usize,
    pub excluded: usize,
    pub unrouted: usize,
    pub published: usize,
    pub unlocated: usize,
}

impl BatchSummary {
    fn count(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Invalid { .. } => self.invalid += 1,
            Outcome::Excluded { .. } => self.excluded += 1,
            Outcome::Unrouted => self.unrouted += 1,
            Outcome::Unlocated { .. } => self.unlocated += 1,
            Outcome::Published { .. } => self.published += 1,
        }
    }
}

/// The outcome of every processed submission, keyed by object key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<(String, Outcome)>,
    pub summary: BatchSummary,
}

/// Screens, routes, geocodes and publishes stored submissions.
pub struct Pipeline<'a> {
    store: &'a dyn ObjectStore,
    publisher: &'a dyn Publisher,
    lookup: &'a dyn CoordinateLookup,
    engine: &'a RuleEngine,
    settings: &'a FormSettings,
    addresses: &'a AddressParser,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        publisher: &'a dyn Publisher,
        lookup: &'a dyn CoordinateLookup,
        engine: &'a RuleEngine,
        settings: &'a FormSettings,
        addresses: &'a AddressParser,
    ) -> Self {
        Pipeline {
            store,
            publisher,
            lookup,
            engine,
            settings,
            addresses,
        }
    }

    /// Process every submission under `entry_prefix` + `suffix`.
    pub async fn run(&self, entry_prefix: &str, suffix: &str) -> Result<BatchReport, ConnectError> {
        let mut report = BatchReport::default();
        for key in list_submissions(self.store, entry_prefix, suffix).await? {
            let outcome = self.process(&key).await?;
            report.summary.count(&outcome);
            report.outcomes.push((key, outcome));
        }
        info!(
            total = report.summary.total,
            published = report.summary.published,
            "batch finished"
        );
        Ok(report)
    }

    /// Process the submission stored under `key`.
    pub async fn process(&self, key: &str) -> Result<Outcome, ConnectError> {
        let bytes = self.store.get(key).await?;
        let form = match Form::from_slice(&bytes, self.settings) {
            Ok(form) => form,
            Err(e) => {
                error!(key = %key, error = %e, "invalid submission");
                return Ok(Outcome::Invalid {
                    reason: e.to_string(),
                });
            }
        };

        let screened = form.is_excluded(self.engine);
        if screened.matched {
            info!(
                key = %key,
                alert = screened.message.as_deref().unwrap_or(""),
                "submission excluded"
            );
            return Ok(Outcome::Excluded {
                message: screened.message,
            });
        }

        let Some(topic) = form.route_topic(self.engine) else {
            warn!(key = %key, "no route selected and no default topic");
            return Ok(Outcome::Unrouted);
        };

        let address = match self.addresses.parse(form.raw()) {
            Ok(address) => address,
            Err(e) => {
                warn!(key = %key, error = %e, "no address");
                return Ok(Outcome::Unlocated {
                    reason: e.to_string(),
                });
            }
        };
        let Some(coordinates) = self.lookup.lookup(&address).await? else {
            warn!(key = %key, postcode = %address.postcode, "address not found");
            return Ok(Outcome::Unlocated {
                reason: format!(
                    "no coordinates for {} {}",
                    address.postcode, address.house_number
                ),
            });
        };

        let message = PublishMessage {
            survey: to_geojson(&form, coordinates),
            metadata: PublishMetadata::now(key, &topic)?,
        };
        let message_id = self.publisher.publish(&topic, message.to_bytes()?).await?;
        info!(key = %key, topic = %topic, message_id = %message_id, "submission published");
        Ok(Outcome::Published { topic, message_id })
    }
}

/// Counts over the attachments of one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Already in the store.
    pub present: usize,
    /// Not in the store before the sync.
    pub missing: usize,
    pub copied: usize,
    /// Downloads that failed; the attachment stays missing.
    pub failed: usize,
}

/// The form's attachments that are not yet in `store`.
pub async fn missing_attachments<'f>(
    form: &'f Form,
    store: &dyn ObjectStore,
) -> Result<Vec<&'f Attachment>, ConnectError> {
    let mut missing = Vec::new();
    for attachment in form.attachments() {
        if !store.exists(&attachment.storage_path).await? {
            missing.push(attachment);
        }
    }
    Ok(missing)
}

/// Download each attachment into the store. A failed download is logged
/// and counted; only store failures are returned as errors.
async fn copy_attachments(
    attachments: &[&Attachment],
    source: &dyn AttachmentSource,
    store: &dyn ObjectStore,
    summary: &mut SyncSummary,
) -> Result<(), ConnectError> {
    for attachment in attachments {
        let bytes = match source.fetch(&attachment.download_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    url = %attachment.download_url,
                    path = %attachment.storage_path,
                    error = %e,
                    "attachment download failed"
                );
                summary.failed += 1;
                continue;
            }
        };
        store.put(&attachment.storage_path, bytes).await?;
        debug!(path = %attachment.storage_path, "attachment copied");
        summary.copied += 1;
    }
    Ok(())
}

/// Copy the form's attachments that are not yet in `store` from the form
/// provider.
pub async fn sync_attachments(
    form: &Form,
    source: &dyn AttachmentSource,
    store: &dyn ObjectStore,
) -> Result<SyncSummary, ConnectError> {
    let missing = missing_attachments(form, store).await?;
    let mut summary = SyncSummary {
        present: form.attachments().len() - missing.len(),
        missing: missing.len(),
        ..SyncSummary::default()
    };
    copy_attachments(&missing, source, store, &mut summary).await?;
    Ok(summary)
}

/// Counts over an attachment sync of stored submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSyncSummary {
    pub total_form_count: usize,
    pub invalid_form_count: usize,
    pub form_with_missing_attachment_count: usize,
    pub missing_attachment_count: usize,
    pub downloaded_attachment_count: usize,
    pub failed_download_count: usize,
}

/// Bring the attachments of every submission under `entry_prefix` +
/// `suffix` into `store`, which holds both submissions and attachments.
///
/// With `skip_download` the missing attachments are only counted.
pub async fn sync_store(
    store: &dyn ObjectStore,
    source: &dyn AttachmentSource,
    settings: &FormSettings,
    entry_prefix: &str,
    suffix: &str,
    skip_download: bool,
) -> Result<StoreSyncSummary, ConnectError> {
    let mut result = StoreSyncSummary::default();
    for key in list_submissions(store, entry_prefix, suffix).await? {
        result.total_form_count += 1;
        let bytes = store.get(&key).await?;
        let form = match Form::from_slice(&bytes, settings) {
            Ok(form) => form,
            Err(e) => {
                error!(key = %key, error = %e, "invalid submission");
                result.invalid_form_count += 1;
                continue;
            }
        };

        let missing = missing_attachments(&form, store).await?;
        if missing.is_empty() {
            continue;
        }
        result.form_with_missing_attachment_count += 1;
        result.missing_attachment_count += missing.len();
        if skip_download {
            continue;
        }

        info!(key = %key, missing = missing.len(), "downloading missing attachments");
        let mut summary = SyncSummary::default();
        copy_attachments(&missing, source, store, &mut summary).await?;
        result.downloaded_attachment_count += summary.copied;
        result.failed_download_count += summary.failed;
    }
    info!(
        total = result.total_form_count,
        downloaded = result.downloaded_attachment_count,
        "attachment sync finished"
    );
    Ok(result)
}
