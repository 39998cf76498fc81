//! Parameter flattening.
//!
//! Turns an ordered list of parameter values into the flat, string-keyed
//! dictionary that named placeholders are resolved against:
//!
//! | Input | Keys |
//! |-------|------|
//! | top-level scalar | its position among top-level scalars and lists: `"0"`, `"1"`, ... |
//! | struct | `"Type.Field"` for every field (nested structs are stored whole, not descended) |
//! | map | each string key whose value is a scalar |
//! | list | each element flattened under `"{n}[{i}]."`, plus the length under `"{n}"` |
//!
//! Scalars reached through a list prefix drop the trailing dot, so
//! `[10, 20]` flattens to `"0[0]"`, `"0[1]"` and `"0"` (the length).
//!
//! The list length is stored under the bare counter, not under the parent
//! prefix, so a list nested inside a list advances the shared counter and
//! the outer length lands one slot later. Later writes win on key
//! collisions.

use indexmap::IndexMap;

use crate::value::Value;

/// Flattened parameters.
pub type ParamMap = IndexMap<String, Value>;

/// Flatten parameter values into a [`ParamMap`].
pub fn flatten(params: &[Value]) -> ParamMap {
    let mut flattener = Flattener::default();
    for value in params {
        flattener.flatten_one("", value);
    }
    flattener.map
}

#[derive(Default)]
struct Flattener {
    map: ParamMap,
    index: usize,
}

impl Flattener {
    fn flatten_one(&mut self, parent: &str, value: &Value) {
        match value {
            Value::Struct(s) => {
                for (field, v) in &s.fields {
                    self.map
                        .insert(format!("{}{}.{}", parent, s.name, field), v.clone());
                }
            }
            Value::Map(entries) => {
                for (key, v) in entries.iter().filter(|(_, v)| v.is_simple()) {
                    self.map.insert(format!("{}{}", parent, key), v.clone());
                }
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    let prefix = format!("{}{}[{}].", parent, self.index, i);
                    self.flatten_one(&prefix, item);
                }
                self.map
                    .insert(self.index.to_string(), Value::Int(items.len() as i64));
                self.index += 1;
            }
            scalar => match parent.strip_suffix('.') {
                Some(key) => {
                    self.map.insert(key.to_string(), scalar.clone());
                }
                None => {
                    self.map.insert(self.index.to_string(), scalar.clone());
                    self.index += 1;
                }
            },
        }
    }
}
