//! A serde `Serializer` producing [`Value`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{self, Impossible, Serialize};

use super::timestamp::TOKEN as TIMESTAMP_TOKEN;
use super::{StructValue, Value};

/// Error raised while converting a type into a [`Value`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValueError(pub String);

impl ser::Error for ValueError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Convert any serializable type into a [`Value`].
///
/// Structs keep their type name, maps keep only their string-keyed entries
/// and unit enum variants become strings.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ValueError> {
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeList;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStruct;

    fn serialize_bool(self, v: bool) -> Result<Value, ValueError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, ValueError> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, ValueError> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| ValueError(format!("integer {} out of range", v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, ValueError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, ValueError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, ValueError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, ValueError> {
        Ok(Value::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, ValueError> {
        u64::try_from(v)
            .map(Value::UInt)
            .map_err(|_| ValueError(format!("integer {} out of range", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, ValueError> {
        Ok(Value::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, ValueError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, ValueError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, ValueError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, ValueError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        let inner = value.serialize(self)?;
        if name != TIMESTAMP_TOKEN {
            return Ok(inner);
        }
        match inner {
            Value::String(s) => chrono::DateTime::parse_from_rfc3339(&s)
                .map(|t| Value::Timestamp(t.with_timezone(&chrono::Utc)))
                .map_err(|e| ValueError(format!("invalid timestamp `{}`: {}", s, e))),
            other => Err(ValueError(format!(
                "expected timestamp string, got {}",
                other.kind()
            ))),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeList, ValueError> {
        Ok(SerializeList {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeList, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeList, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<SerializeList, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap, ValueError> {
        Ok(SerializeMap {
            entries: IndexMap::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeStruct, ValueError> {
        Ok(SerializeStruct {
            value: StructValue {
                name: name.to_string(),
                fields: IndexMap::with_capacity(len),
            },
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStruct, ValueError> {
        self.serialize_struct(variant, len)
    }
}

struct SerializeList {
    items: Vec<Value>,
}

impl SerializeList {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTuple for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTupleStruct for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTupleVariant for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::List(self.items))
    }
}

struct SerializeMap {
    entries: IndexMap<String, Value>,
    /// Pending key; `None` inside when the key was not a string.
    key: Option<Option<String>>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ValueError> {
        self.key = Some(key.serialize(MapKeySerializer).ok());
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        match self.key.take() {
            Some(Some(key)) => {
                self.entries.insert(key, value.serialize(ValueSerializer)?);
                Ok(())
            }
            Some(None) => Ok(()),
            None => Err(ValueError("map value without key".to_string())),
        }
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Map(self.entries))
    }
}

struct SerializeStruct {
    value: StructValue,
}

impl SerializeStruct {
    fn insert<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), ValueError> {
        self.value
            .fields
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.insert(key, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Struct(self.value))
    }
}

impl ser::SerializeStructVariant for SerializeStruct {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.insert(key, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Struct(self.value))
    }
}

/// Accepts string-like keys only; anything else is rejected so the entry
/// can be skipped.
struct MapKeySerializer;

fn non_string_key() -> ValueError {
    ValueError("map key is not a string".to_string())
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = ValueError;

    type SerializeSeq = Impossible<String, ValueError>;
    type SerializeTuple = Impossible<String, ValueError>;
    type SerializeTupleStruct = Impossible<String, ValueError>;
    type SerializeTupleVariant = Impossible<String, ValueError>;
    type SerializeMap = Impossible<String, ValueError>;
    type SerializeStruct = Impossible<String, ValueError>;
    type SerializeStructVariant = Impossible<String, ValueError>;

    fn serialize_str(self, v: &str) -> Result<String, ValueError> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, ValueError> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<String, ValueError> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, ValueError> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_i8(self, _v: i8) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_i16(self, _v: i16) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_i32(self, _v: i32) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_i64(self, _v: i64) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_u8(self, _v: u8) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_u16(self, _v: u16) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_u32(self, _v: u32) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_u64(self, _v: u64) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_f32(self, _v: f32) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_f64(self, _v: f64) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_none(self) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_unit(self) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, ValueError> {
        Err(non_string_key())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, ValueError> {
        Err(non_string_key())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, ValueError> {
        Err(non_string_key())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, ValueError> {
        Err(non_string_key())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, ValueError> {
        Err(non_string_key())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, ValueError> {
        Err(non_string_key())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, ValueError> {
        Err(non_string_key())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, ValueError> {
        Err(non_string_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct User {
        id: i64,
        name: String,
        email: Option<String>,
    }

    #[derive(Serialize)]
    #[serde(rename = "u")]
    struct Renamed {
        #[serde(rename = "Id")]
        id: i64,
    }

    #[derive(Serialize)]
    enum Role {
        Admin,
    }

    #[test]
    fn test_struct_keeps_name() {
        let value = to_value(&User {
            id: 1,
            name: "ann".into(),
            email: None,
        })
        .unwrap();

        let expected = StructValue::new("User")
            .field("id", 1)
            .field("name", "ann")
            .field("email", Value::Null);
        assert_eq!(value, Value::Struct(expected));
    }

    #[test]
    fn test_serde_rename() {
        match to_value(&Renamed { id: 100 }).unwrap() {
            Value::Struct(s) => {
                assert_eq!(s.name, "u");
                assert_eq!(s.get("Id"), Some(&Value::Int(100)));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_scalars_and_enums() {
        assert_eq!(to_value(&7u16).unwrap(), Value::UInt(7));
        assert_eq!(to_value(&'x').unwrap(), Value::from("x"));
        assert_eq!(to_value(&Role::Admin).unwrap(), Value::from("Admin"));
        assert_eq!(to_value(&()).unwrap(), Value::Null);
        assert!(to_value(&u128::MAX).is_err());
    }

    #[test]
    fn test_map_keeps_string_keys_only() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        assert_eq!(to_value(&map).unwrap(), Value::Map([("a".to_string(), Value::Int(1))].into()));

        let mut numeric = BTreeMap::new();
        numeric.insert(1, "x");
        assert_eq!(to_value(&numeric).unwrap(), Value::Map(IndexMap::new()));
    }

    #[test]
    fn test_value_round_trips_timestamp() {
        let t: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let value = Value::List(vec![Value::Timestamp(t), Value::Int(1)]);
        assert_eq!(to_value(&value).unwrap(), value);
    }

    #[test]
    fn test_tuple_becomes_list() {
        assert_eq!(
            to_value(&(1, "a")).unwrap(),
            Value::List(vec![Value::Int(1), Value::from("a")])
        );
    }
}
