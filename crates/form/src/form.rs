//! The form model: a validated submission plus its discovered attachments.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use formroute_eval::{evaluate_first_match, resolve, MatchResult, RuleEngine, RuleSet};

use crate::error::FormError;
use crate::settings::FormSettings;

/// An image reference found in the answers section.
///
/// Both locations are pure functions of the form identity and the field
/// the reference was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Page name the field belongs to.
    pub category: String,
    /// Field name holding the file name.
    pub field: String,
    /// Object name in the attachment store.
    pub storage_path: String,
    /// Where the form provider serves the file.
    pub download_url: String,
}

/// Identity fields every submission must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormIdentity {
    pub provider_id: String,
    pub submission_id: String,
    pub form_code: String,
}

/// A filled-in form.
///
/// Owns the raw record, which is never mutated; derived views such as
/// [`Form::to_compiled_data`] return new values.
#[derive(Debug, Clone)]
pub struct Form {
    raw: Value,
    identity: FormIdentity,
    answers_path: String,
    storage_prefix: String,
    download_prefix: String,
    public_object_base: String,
    attachments: Vec<Attachment>,
}

impl Form {
    /// Validate `raw` and discover its attachments.
    ///
    /// Fails without producing a form when an identity field or the answers
    /// section is missing.
    pub fn new(raw: Value, settings: &FormSettings) -> Result<Form, FormError> {
        let identity = FormIdentity {
            provider_id: identity_field(&raw, "provider id", &settings.provider_id_path)?,
            submission_id: identity_field(&raw, "submission id", &settings.submission_id_path)?,
            form_code: identity_field(&raw, "form code", &settings.form_code_path)?,
        };

        let storage_prefix = format!(
            "{}/{}/{}/{}",
            settings.storage_path, identity.provider_id, identity.form_code, identity.submission_id
        );
        let download_prefix = format!(
            "{}/{}-{}",
            settings.download_base_url, identity.provider_id, identity.submission_id
        );

        let answers = lookup(&raw, &settings.answers_path)
            .filter(|v| !v.is_null())
            .ok_or_else(|| FormError::MissingField {
                field: "answers",
                path: settings.answers_path.clone(),
            })?;
        let pages = answers
            .as_object()
            .ok_or_else(|| FormError::InvalidAnswers {
                path: settings.answers_path.clone(),
            })?;

        let mut attachments = Vec::new();
        for (page_name, page) in pages {
            // Pages that are not field mappings carry no attachments.
            let Some(fields) = page.as_object() else {
                continue;
            };
            for (field, value) in fields {
                let Some(file_name) = value.as_str() else {
                    continue;
                };
                if !settings.is_attachment_value(file_name) {
                    continue;
                }
                attachments.push(Attachment {
                    category: page_name.clone(),
                    field: field.clone(),
                    storage_path: format!("{}/{}_{}", storage_prefix, field, file_name),
                    download_url: format!("{}{}", download_prefix, file_name),
                });
            }
        }
        debug!(
            provider_id = %identity.provider_id,
            submission_id = %identity.submission_id,
            attachments = attachments.len(),
            "form loaded"
        );

        Ok(Form {
            public_object_base: format!(
                "{}/{}/o/",
                settings.public_url_base.trim_end_matches('/'),
                settings.storage_bucket
            ),
            answers_path: settings.answers_path.clone(),
            raw,
            identity,
            storage_prefix,
            download_prefix,
            attachments,
        })
    }

    /// Parse a submission document and build the form.
    pub fn from_slice(bytes: &[u8], settings: &FormSettings) -> Result<Form, FormError> {
        let raw: Value = serde_json::from_slice(bytes)?;
        Form::new(raw, settings)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn identity(&self) -> &FormIdentity {
        &self.identity
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// `{storage_path}/{provider}/{form_code}/{submission}`.
    pub fn storage_prefix(&self) -> &str {
        &self.storage_prefix
    }

    /// `{download_base_url}/{provider}-{submission}`; file names are
    /// appended without a separator.
    pub fn download_prefix(&self) -> &str {
        &self.download_prefix
    }

    /// Resolve a path against the raw record.
    pub fn get(&self, path: &str) -> Option<&Value> {
        resolve(&self.raw, path)
    }

    /// A deep copy of the raw record.
    pub fn to_dict(&self) -> Value {
        self.raw.clone()
    }

    /// Publicly resolvable URL of an attachment's stored object.
    pub fn public_url(&self, attachment: &Attachment) -> String {
        format!(
            "{}{}?alt=media",
            self.public_object_base,
            quote_plus(&attachment.storage_path)
        )
    }

    /// A copy of the record with every attachment field replaced by the
    /// public URL of its stored object. Shape is otherwise unchanged.
    pub fn to_compiled_data(&self) -> Value {
        let mut compiled = self.raw.clone();
        for attachment in &self.attachments {
            let url = self.public_url(attachment);
            let answers_keys = self.answers_path.split('/');
            let keys = answers_keys.chain([attachment.category.as_str(), attachment.field.as_str()]);
            if let Some(slot) = lookup_mut(&mut compiled, keys) {
                *slot = Value::String(url);
            }
        }
        compiled
    }

    /// First-match evaluation of the engine's exclusion rules.
    pub fn is_excluded(&self, engine: &RuleEngine) -> MatchResult {
        engine.screen(&self.raw)
    }

    /// First-match evaluation of arbitrary rule sets, e.g. a query.
    pub fn is_passing_rules(&self, rule_sets: &[RuleSet]) -> MatchResult {
        evaluate_first_match(&self.raw, rule_sets)
    }

    /// Destination identifier selected by the engine's routes.
    pub fn route_topic(&self, engine: &RuleEngine) -> Option<String> {
        engine.route_topic(&self.raw)
    }
}

fn identity_field(raw: &Value, field: &'static str, path: &str) -> Result<String, FormError> {
    match lookup(raw, path) {
        None | Some(Value::Null) => Err(FormError::MissingField {
            field,
            path: path.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(FormError::InvalidField {
            field,
            path: path.to_string(),
            found: type_name(other),
        }),
    }
}

/// Strict path lookup: unlike [`resolve`], falsy intermediates are not
/// treated as absent.
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/').try_fold(root, |current, key| match current {
        Value::Object(fields) => fields.get(key),
        Value::Array(items) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    })
}

fn lookup_mut<'a, 'k>(
    root: &'a mut Value,
    keys: impl IntoIterator<Item = &'k str>,
) -> Option<&'a mut Value> {
    keys.into_iter()
        .try_fold(root, |current, key| match current {
            Value::Object(fields) => fields.get_mut(key),
            Value::Array(items) => items.get_mut(key.parse::<usize>().ok()?),
            _ => None,
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Form encoding with `~` left literal and `*` escaped.
fn quote_plus(text: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
    encoded.replace("%7E", "~").replace('*', "%2A")
}
