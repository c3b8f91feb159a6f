use std::path::Path;

use formroute_connect::{sync_store, DirectoryAttachmentSource, DirectoryStore};

use crate::commands::{print_json, runtime};
use crate::config::Config;
use crate::OutputFormat;

/// Copy missing attachments of stored submissions from a local mirror of
/// the form provider's downloads.
pub(crate) fn cmd_sync(
    store: &Path,
    suffix: &str,
    source: Option<&Path>,
    skip_download: bool,
    config: &Config,
    output: OutputFormat,
) -> Result<(), String> {
    let source = match (source, skip_download) {
        (Some(dir), _) => DirectoryAttachmentSource::new(&config.form.download_base_url, dir),
        // Nothing is fetched when only counting.
        (None, true) => DirectoryAttachmentSource::new(&config.form.download_base_url, store),
        (None, false) => {
            return Err("--source is required unless --skip-download is given".to_string())
        }
    };
    let store = DirectoryStore::new(store);
    let result = runtime()?
        .block_on(sync_store(
            &store,
            &source,
            &config.form,
            &config.entry_prefix,
            suffix,
            skip_download,
        ))
        .map_err(|e| e.to_string())?;

    match output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => println!(
            "total {}, invalid {}, with missing attachments {}, missing {}, downloaded {}, failed {}",
            result.total_form_count,
            result.invalid_form_count,
            result.form_with_missing_attachment_count,
            result.missing_attachment_count,
            result.downloaded_attachment_count,
            result.failed_download_count
        ),
    }
    Ok(())
}
