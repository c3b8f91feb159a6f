//! Form submission model.
//!
//! A [`Form`] wraps one raw submission, checks its identity fields and
//! discovers image attachments in its answers section. It can produce a
//! compiled copy of the record in which attachment fields point at their
//! stored objects, and it delegates exclusion, query and routing decisions
//! to a `formroute_eval::RuleEngine`.

pub mod error;
pub mod form;
pub mod geo;
pub mod settings;

pub use error::{FormError, GeoError};
pub use form::{Attachment, Form, FormIdentity};
pub use geo::{feature_query, to_geojson, Address, AddressParser, Coordinates, GeoSettings};
pub use settings::FormSettings;
