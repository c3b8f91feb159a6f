use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ConnectError;

/// A listed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

impl ObjectMeta {
    /// Zero-byte objects are folder placeholders, not submissions.
    pub fn is_placeholder(&self) -> bool {
        self.size == 0
    }
}

/// Trace metadata sent along with every published survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    /// Object key the submission was read from.
    pub source: String,
    pub topic: String,
    /// RFC 3339 UTC timestamp.
    pub published_at: String,
}

impl PublishMetadata {
    pub fn now(source: &str, topic: &str) -> Result<Self, ConnectError> {
        let published_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| ConnectError::Backend(e.to_string()))?;
        Ok(PublishMetadata {
            source: source.to_string(),
            topic: topic.to_string(),
            published_at,
        })
    }
}

/// The message the GIS integration consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMessage {
    /// GeoJSON FeatureCollection with the compiled record as properties.
    #[serde(rename = "appee_survey")]
    pub survey: Value,
    #[serde(rename = "gobits")]
    pub metadata: PublishMetadata,
}

impl PublishMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectError> {
        serde_json::to_vec(self).map_err(|e| ConnectError::Backend(e.to_string()))
    }
}

/// A push delivery: `{"message": {"data": "<base64 JSON>"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushedMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushedMessage {
    pub data: String,
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
}

impl PushEnvelope {
    /// Decode a push body into the published message it carries.
    pub fn decode(body: &[u8]) -> Result<PublishMessage, ConnectError> {
        let envelope: PushEnvelope =
            serde_json::from_slice(body).map_err(|e| ConnectError::Envelope(e.to_string()))?;
        let data = BASE64
            .decode(envelope.message.data.as_bytes())
            .map_err(|e| ConnectError::Envelope(format!("data is not base64: {}", e)))?;
        serde_json::from_slice(&data).map_err(|e| ConnectError::Envelope(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message() -> PublishMessage {
        PublishMessage {
            survey: json!({"type": "FeatureCollection", "features": []}),
            metadata: PublishMetadata {
                source: "entries/1.json".to_string(),
                topic: "surveys".to_string(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn wire_keys() {
        let value: Value = serde_json::from_slice(&message().to_bytes().unwrap()).unwrap();
        assert_eq!(value["appee_survey"]["type"], json!("FeatureCollection"));
        assert_eq!(value["gobits"]["topic"], json!("surveys"));
    }

    #[test]
    fn push_envelope_round_trip() {
        let data = BASE64.encode(message().to_bytes().unwrap());
        let body = json!({"message": {"data": data, "messageId": "42"}}).to_string();
        assert_eq!(PushEnvelope::decode(body.as_bytes()).unwrap(), message());
    }

    #[test]
    fn push_envelope_errors() {
        assert!(matches!(
            PushEnvelope::decode(b"{}"),
            Err(ConnectError::Envelope(_))
        ));
        let body = json!({"message": {"data": "***"}}).to_string();
        assert!(matches!(
            PushEnvelope::decode(body.as_bytes()),
            Err(ConnectError::Envelope(_))
        ));
    }

    #[test]
    fn metadata_timestamp_is_rfc3339() {
        let meta = PublishMetadata::now("k", "t").unwrap();
        assert!(OffsetDateTime::parse(&meta.published_at, &Rfc3339).is_ok());
    }

    #[test]
    fn placeholder_objects() {
        let folder = ObjectMeta {
            key: "entries/".to_string(),
            size: 0,
        };
        assert!(folder.is_placeholder());
    }
}
