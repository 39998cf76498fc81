//! Macros for building parameter lists.

/// Convert each argument to a [`Value`](crate::value::Value) through serde.
///
/// Evaluates to `Result<Vec<Value>, ValueError>`, failing on the first
/// argument that cannot be represented.
///
/// ```rust
/// use batis_core::params;
/// use batis_core::value::Value;
///
/// let params = params![100, "hello", None::<i32>].unwrap();
/// assert_eq!(params, vec![Value::Int(100), Value::from("hello"), Value::Null]);
///
/// let empty = params![].unwrap();
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::result::Result::<::std::vec::Vec<$crate::value::Value>, $crate::value::ValueError>::Ok(
            ::std::vec::Vec::new(),
        )
    };
    ($($param:expr),+ $(,)?) => {
        [$($crate::value::to_value(&$param)),+]
            .into_iter()
            .collect::<::std::result::Result<::std::vec::Vec<$crate::value::Value>, $crate::value::ValueError>>()
    };
}

#[cfg(test)]
mod tests {
    use crate::value::{StructValue, Value};
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct User {
        id: i64,
        name: &'static str,
    }

    #[test]
    fn test_params_mixed() {
        let params = params![User { id: 1, name: "ann" }, vec![1, 2], "x"].unwrap();
        assert_eq!(
            params,
            vec![
                Value::from(StructValue::new("User").field("id", 1).field("name", "ann")),
                Value::from(vec![1, 2]),
                Value::from("x"),
            ]
        );
    }

    #[test]
    fn test_params_trailing_comma() {
        let params = params![1u8, 2.5,].unwrap();
        assert_eq!(params, vec![Value::UInt(1), Value::Float(2.5)]);
    }
}
