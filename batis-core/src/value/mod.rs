//! Dynamic parameter values.
//!
//! [`Value`] is what every parameter turns into before it reaches a parser:
//! scalars, timestamps, lists, string-keyed maps and named structs. Any
//! `serde::Serialize` type converts through [`to_value`].
//!
//! ```rust
//! use batis_core::value::{Value, to_value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let value = to_value(&User { id: 1, name: "ann".into() }).unwrap();
//! match value {
//!     Value::Struct(s) => {
//!         assert_eq!(s.name, "User");
//!         assert_eq!(s.fields["id"], Value::Int(1));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

mod ser;
pub mod timestamp;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub use ser::{ValueError, to_value};

/// A named record: the dynamic counterpart of a Rust struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    /// Type name, used as the key prefix when flattening.
    pub name: String,
    /// Fields in declaration order.
    pub fields: IndexMap<String, Value>,
}

impl StructValue {
    /// Create an empty struct value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (`None`, unit).
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Ordered sequence.
    List(Vec<Value>),
    /// String-keyed map.
    Map(IndexMap<String, Value>),
    /// Named record.
    Struct(StructValue),
}

impl Value {
    /// Whether the value is a scalar (anything but a list, map or struct).
    pub fn is_simple(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_) | Self::Struct(_))
    }

    /// Check if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Template truthiness.
    ///
    /// Zero numbers, empty strings and containers, `false` and null are
    /// falsy, as is the zero timestamp (the Unix epoch). Structs are always
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::UInt(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
            Self::Timestamp(t) => !timestamp::is_zero(t),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
            Self::Struct(_) => true,
        }
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to `i64` if the value is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Length of a string, byte string, list, map or struct.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.len()),
            Self::Bytes(b) => Some(b.len()),
            Self::List(l) => Some(l.len()),
            Self::Map(m) => Some(m.len()),
            Self::Struct(s) => Some(s.fields.len()),
            _ => None,
        }
    }

    /// Field or map-entry access.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Map(m) => m.get(name),
            Self::Struct(s) => s.get(name),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
        }
    }
}

/// The default text rendering, used wherever a value is spliced into SQL.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::UInt(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Map(map) => write_entries(f, "", map),
            Self::Struct(s) => write_entries(f, &s.name, &s.fields),
        }
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, name: &str, map: &IndexMap<String, Value>) -> fmt::Result {
    if !name.is_empty() {
        write!(f, "{} ", name)?;
    }
    write!(f, "{{")?;
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", k, v)?;
    }
    write!(f, "}}")
}

/// Values serialize to their natural serde shape. Structs serialize as maps
/// (the type name is dropped); timestamps keep their kind when the target is
/// [`to_value`].
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::UInt(n) => serializer.serialize_u64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.serialize_bytes(b),
            Self::Timestamp(t) => timestamp::serialize(t, serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => serialize_entries(serializer, map),
            Self::Struct(s) => serialize_entries(serializer, &s.fields),
        }
    }
}

fn serialize_entries<S: Serializer>(
    serializer: S,
    entries: &IndexMap<String, Value>,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (k, v) in entries {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

macro_rules! impl_from {
    ($variant:ident: $($ty:ty),+ => $target:ty) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v as $target)
                }
            }
        )+
    };
}

impl_from!(Int: i8, i16, i32, i64, isize => i64);
impl_from!(UInt: u8, u16, u32, u64, usize => u64);
impl_from!(Float: f32, f64 => f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v.and_utc())
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Self::Struct(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<IndexMap<String, V>> for Value {
    fn from(v: IndexMap<String, V>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(v: BTreeMap<String, V>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Entries are sorted by key since `HashMap` iteration order is unspecified.
impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(v: HashMap<String, V>) -> Self {
        let mut entries: Vec<_> = v.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Struct(StructValue::new("Empty")).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
    }

    #[test]
    fn test_zero_timestamp_is_falsy() {
        assert!(!Value::Timestamp(DateTime::<Utc>::default()).is_truthy());
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert!(Value::from(t).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from(100).to_string(), "100");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("hello").to_string(), "hello");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "ab01");

        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(Value::from(t).to_string(), "2024-05-01 08:30:00");

        let s = StructValue::new("User").field("id", 1).field("name", "ann");
        assert_eq!(Value::from(s).to_string(), "User {id: 1, name: ann}");
    }

    #[test]
    fn test_from_option_and_maps() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3u8)), Value::UInt(3));

        let mut map = HashMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        match Value::from(map) {
            Value::Map(m) => assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"id": 7, "tags": ["a"], "score": 1.5, "ok": null});
        let value = Value::from(json);
        assert_eq!(value.field("id"), Some(&Value::Int(7)));
        assert_eq!(value.field("tags"), Some(&Value::List(vec![Value::from("a")])));
        assert_eq!(value.field("ok"), Some(&Value::Null));
    }

    #[test]
    fn test_serialize_to_json() {
        let s = StructValue::new("User").field("id", 1).field("name", "ann");
        let json = serde_json::to_string(&Value::from(s)).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"ann"}"#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::UInt(5).as_i64(), Some(5));
        assert_eq!(Value::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::from("abc").len(), Some(3));
        assert_eq!(Value::Int(1).len(), None);
        assert_eq!(Value::Int(1).kind(), "int");
        assert!(Value::Int(1).is_simple());
        assert!(!Value::List(vec![]).is_simple());
    }
}
