//! Serde adapter that keeps timestamps as timestamps.
//!
//! Without it a `DateTime<Utc>` field serializes as a plain string and
//! [`to_value`](super::to_value) cannot tell it apart from text, which
//! matters for truthiness (a zero timestamp is falsy).
//!
//! ```rust
//! use batis_core::value::{Value, to_value};
//! use chrono::{DateTime, Utc};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Filter {
//!     #[serde(with = "batis_core::value::timestamp")]
//!     since: DateTime<Utc>,
//! }
//!
//! let value = to_value(&Filter { since: DateTime::default() }).unwrap();
//! assert!(matches!(value.field("since"), Some(Value::Timestamp(_))));
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Newtype name recognised by the value serializer.
pub(crate) const TOKEN: &str = "$batis::private::Timestamp";

/// Whether `t` is the zero timestamp.
pub fn is_zero(t: &DateTime<Utc>) -> bool {
    *t == DateTime::<Utc>::default()
}

/// Serialize a timestamp as an RFC 3339 string wrapped in a marker newtype.
///
/// Other serializers see the plain string.
pub fn serialize<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_newtype_struct(TOKEN, &t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Deserialize a timestamp from an RFC 3339 string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
