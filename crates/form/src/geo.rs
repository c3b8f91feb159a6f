//! Address extraction and GeoJSON assembly for the geocoding service.
//!
//! The GIS service is addressed with a feature-layer query string and
//! answers with feature attributes holding a latitude/longitude pair.
//! Everything between (authentication, HTTP, retries) belongs to the
//! caller.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::form_urlencoded;

use formroute_eval::{is_falsy, resolve};

use crate::error::GeoError;
use crate::form::Form;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Path of the field holding the address key, e.g. `1234AB12_A`.
    pub key_field: String,
    /// Path tried when the key field is absent or falsy.
    pub fallback_key_field: String,
    /// Pattern splitting the key into postcode, house number and an
    /// optional suffix (capture groups 1, 2 and 3).
    pub address_pattern: String,
    /// Attribute names returned by the service: latitude first, then
    /// longitude.
    pub out_fields: Vec<String>,
    pub postcode_attribute: String,
    pub house_number_attribute: String,
    pub suffix_attribute: String,
}

impl Default for GeoSettings {
    fn default() -> Self {
        GeoSettings {
            key_field: "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/DSS".to_string(),
            fallback_key_field: "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/FCA_SLEUTEL".to_string(),
            address_pattern: r"^(\d{4}[A-Z]{2})(\d+)(?:_(.+))?$".to_string(),
            out_fields: vec!["lat_wgs84".to_string(), "lon_wgs84".to_string()],
            postcode_attribute: "postcode".to_string(),
            house_number_attribute: "huisnummer".to_string(),
            suffix_attribute: "huisext".to_string(),
        }
    }
}

/// A postal address parsed from a submission key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub postcode: String,
    pub house_number: String,
    pub suffix: Option<String>,
}

impl Address {
    /// The feature-layer `where` clause selecting this address.
    pub fn where_clause(&self, geo: &GeoSettings) -> String {
        let base = format!(
            "{}='{}' AND {}='{}'",
            geo.postcode_attribute, self.postcode, geo.house_number_attribute, self.house_number
        );
        match &self.suffix {
            Some(suffix) => format!("{} AND {}='{}'", base, geo.suffix_attribute, suffix),
            None => format!("{} AND {} IS NULL", base, geo.suffix_attribute),
        }
    }
}

/// Parses address keys out of submissions.
#[derive(Debug, Clone)]
pub struct AddressParser {
    pattern: Regex,
    key_field: String,
    fallback_key_field: String,
}

impl AddressParser {
    pub fn new(geo: &GeoSettings) -> Result<Self, GeoError> {
        let pattern =
            Regex::new(&geo.address_pattern).map_err(|e| GeoError::Pattern(e.to_string()))?;
        if pattern.captures_len() < 3 {
            return Err(GeoError::Pattern(
                "needs capture groups for postcode and house number".to_string(),
            ));
        }
        Ok(AddressParser {
            pattern,
            key_field: geo.key_field.clone(),
            fallback_key_field: geo.fallback_key_field.clone(),
        })
    }

    /// Read the address key (or its fallback) from `record` and split it.
    pub fn parse(&self, record: &Value) -> Result<Address, GeoError> {
        let key = resolve(record, &self.key_field)
            .filter(|v| !is_falsy(v))
            .or_else(|| resolve(record, &self.fallback_key_field))
            .and_then(Value::as_str)
            .ok_or_else(|| GeoError::MissingKey {
                key: self.key_field.clone(),
                fallback: self.fallback_key_field.clone(),
            })?;
        self.parse_key(key)
    }

    pub fn parse_key(&self, key: &str) -> Result<Address, GeoError> {
        let caps = self
            .pattern
            .captures(key)
            .ok_or_else(|| GeoError::Unmatched(key.to_string()))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        match (group(1), group(2)) {
            (Some(postcode), Some(house_number)) => Ok(Address {
                postcode,
                house_number,
                suffix: group(3).filter(|s| !s.is_empty()),
            }),
            _ => Err(GeoError::Unmatched(key.to_string())),
        }
    }
}

/// The URL query string for a feature-layer lookup of `address`.
pub fn feature_query(address: &Address, geo: &GeoSettings, token: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("where", &address.where_clause(geo))
        .append_pair("outFields", &geo.out_fields.join(","))
        .append_pair("f", "json")
        .append_pair("token", token)
        .finish()
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Read the first feature's coordinates from a feature-layer query
    /// response. Attribute values may be numbers or numeric strings.
    pub fn from_query_response(response: &Value, geo: &GeoSettings) -> Option<Coordinates> {
        let attributes = response.get("features")?.get(0)?.get("attributes")?;
        let read = |name: &String| -> Option<f64> {
            match attributes.get(name)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        };
        Some(Coordinates {
            latitude: read(geo.out_fields.first()?)?,
            longitude: read(geo.out_fields.get(1)?)?,
        })
    }
}

/// A FeatureCollection with one point feature carrying the compiled record.
pub fn to_geojson(form: &Form, at: Coordinates) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [at.longitude, at.latitude],
                },
                "properties": form.to_compiled_data(),
            }
        ],
    })
}
