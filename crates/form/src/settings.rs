//! Where identity fields and answers live in a submission, and how
//! attachment locations are derived from them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Path of the provider id.
    pub provider_id_path: String,
    /// Path of the submission (data source row) id.
    pub submission_id_path: String,
    /// Path of the form code.
    pub form_code_path: String,
    /// Path of the answers section: page name -> field name -> value.
    pub answers_path: String,
    /// File extensions, including the dot, that mark a field value as an
    /// attachment.
    pub image_extensions: Vec<String>,
    /// Compare extensions ignoring ASCII case. Off by default: `.JPG` is
    /// not an attachment unless listed.
    pub case_insensitive_extensions: bool,
    /// Root of attachment object names in the store.
    pub storage_path: String,
    /// Bucket holding attachments, used in public URLs.
    pub storage_bucket: String,
    /// Base of the public object URL (`{base}/{bucket}/o/{name}?alt=media`).
    pub public_url_base: String,
    /// Base of the form provider's attachment download URL.
    pub download_base_url: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        FormSettings {
            provider_id_path: "ProviderId".to_string(),
            submission_id_path: "Entry/DsRowId".to_string(),
            form_code_path: "Entry/FormCode".to_string(),
            answers_path: "Entry/AnswersJson".to_string(),
            image_extensions: vec![".jpg".to_string(), ".jpeg".to_string(), ".png".to_string()],
            case_insensitive_extensions: false,
            storage_path: "attachments".to_string(),
            storage_bucket: "formroute-attachments".to_string(),
            public_url_base: "https://storage.googleapis.com/storage/v1/b".to_string(),
            download_base_url: "https://forms.example.com/attachments".to_string(),
        }
    }
}

impl FormSettings {
    /// True when `value` names a file whose extension is on the allow-list.
    ///
    /// The extension is taken from the last path component, ignoring leading
    /// dots, so `photo.jpg` and `a/b.c.png` have one but `.jpg` does not.
    pub fn is_attachment_value(&self, value: &str) -> bool {
        let Some(ext) = extension(value) else {
            return false;
        };
        self.image_extensions.iter().any(|allowed| {
            let allowed = allowed.strip_prefix('.').unwrap_or(allowed);
            if self.case_insensitive_extensions {
                allowed.eq_ignore_ascii_case(ext)
            } else {
                allowed == ext
            }
        })
    }
}

/// Extension without its dot, or `None` when the name has none.
fn extension(value: &str) -> Option<&str> {
    let name = value.rsplit('/').next().unwrap_or(value);
    let stem_start = name.len() - name.trim_start_matches('.').len();
    let dot = name[stem_start..].rfind('.')?;
    Some(&name[stem_start + dot + 1..])
}
