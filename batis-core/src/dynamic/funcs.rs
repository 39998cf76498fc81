//! Template functions.

use std::cmp::Ordering;

use batis_template::functions;

use super::state::RenderState;
use crate::error::{BatisError, BatisResult};
use crate::value::Value;

/// Call a function with already-evaluated arguments. `and`/`or` are
/// short-circuited by the evaluator and only reach here with every
/// argument evaluated.
pub(crate) fn call(name: &str, args: Vec<Value>, state: &mut RenderState) -> BatisResult<Value> {
    match name {
        functions::SET => {
            let [cond, column, value, origin] = arity::<4>(name, args)?;
            Ok(Value::String(set(state, &cond, &string_arg(name, column)?, &value, &string_arg(name, origin)?)))
        }
        functions::WHERE => {
            let [cond, connector, column, value, origin] = arity::<5>(name, args)?;
            Ok(Value::String(where_clause(
                state,
                &cond,
                &string_arg(name, connector)?,
                &string_arg(name, column)?,
                &value,
                &string_arg(name, origin)?,
            )))
        }
        functions::ARG => {
            let [value] = arity::<1>(name, args)?;
            Ok(Value::String(state.arg(value)))
        }
        functions::ADD => {
            let [a, b] = arity::<2>(name, args)?;
            add(&a, &b)
        }
        "and" => Ok(args
            .iter()
            .find(|v| !v.is_truthy())
            .or(args.last())
            .cloned()
            .unwrap_or_default()),
        "or" => Ok(args
            .iter()
            .find(|v| v.is_truthy())
            .or(args.last())
            .cloned()
            .unwrap_or_default()),
        "not" => {
            let [value] = arity::<1>(name, args)?;
            Ok(Value::Bool(!value.is_truthy()))
        }
        "eq" => {
            if args.len() < 2 {
                return Err(wrong_arity(name, 2, args.len()));
            }
            for other in &args[1..] {
                if equal(&args[0], other)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "ne" => {
            let [a, b] = arity::<2>(name, args)?;
            Ok(Value::Bool(!equal(&a, &b)?))
        }
        "lt" | "le" | "gt" | "ge" => {
            let [a, b] = arity::<2>(name, args)?;
            let ord = compare(&a, &b)?;
            Ok(Value::Bool(match name {
                "lt" => ord == Ordering::Less,
                "le" => ord != Ordering::Greater,
                "gt" => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        "len" => {
            let [value] = arity::<1>(name, args)?;
            value
                .len()
                .map(|n| Value::Int(n as i64))
                .ok_or_else(|| BatisError::execution(format!("len of {}", value.kind())))
        }
        "index" => {
            let mut args = args.into_iter();
            let mut item = args
                .next()
                .ok_or_else(|| wrong_arity(name, 1, 0))?;
            for key in args {
                item = index(&item, &key)?;
            }
            Ok(item)
        }
        "print" => Ok(Value::String(print(&args))),
        other => Err(BatisError::execution(format!(
            "function `{}` not defined",
            other
        ))),
    }
}

/// Append `column` + `value` to a `SET` list when `cond` is truthy.
///
/// The first emission starts the list with ` SET `; later ones add a comma
/// unless `origin` already ends with one. String values are quoted unless
/// they are `arg` sentinels. Values are not escaped.
pub(crate) fn set(state: &RenderState, cond: &Value, column: &str, value: &Value, origin: &str) -> String {
    if !cond.is_truthy() {
        return origin.to_string();
    }

    let mut buf = String::new();
    if origin.is_empty() {
        buf.push_str(" SET ");
    } else {
        let origin = origin.trim();
        buf.push_str(origin);
        if !origin.ends_with(',') {
            buf.push(',');
        }
    }
    buf.push_str(column);
    push_value(&mut buf, state, value);
    buf
}

/// Append a condition to a `WHERE` clause when `cond` is truthy.
///
/// The first emission starts the clause with ` WHERE ` and drops the
/// connector; later ones join with `connector`. Values render as in [`set`]
/// and follow `column` directly, so the column text carries its operator
/// (`"status="`, `"age > "`).
pub(crate) fn where_clause(
    state: &RenderState,
    cond: &Value,
    connector: &str,
    column: &str,
    value: &Value,
    origin: &str,
) -> String {
    if !cond.is_truthy() {
        return origin.to_string();
    }

    let mut buf = String::new();
    if origin.is_empty() {
        buf.push_str(" WHERE ");
    } else {
        buf.push_str(origin.trim());
        buf.push(' ');
        buf.push_str(connector);
        buf.push(' ');
    }
    buf.push_str(column);
    push_value(&mut buf, state, value);
    buf
}

fn push_value(buf: &mut String, state: &RenderState, value: &Value) {
    match value {
        Value::String(s) if state.is_sentinel(s) => buf.push_str(s),
        Value::String(s) => {
            buf.push('\'');
            buf.push_str(s);
            buf.push('\'');
        }
        other => buf.push_str(&other.to_string()),
    }
}

fn add(a: &Value, b: &Value) -> BatisResult<Value> {
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| BatisError::execution("add: integer overflow")),
        _ => Err(BatisError::execution(format!(
            "add: expected integers, got {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}

/// Numeric view used by comparisons.
enum Number {
    Int(i128),
    Float(f64),
}

fn number(v: &Value) -> Option<Number> {
    match v {
        Value::Int(n) => Some(Number::Int((*n).into())),
        Value::UInt(n) => Some(Number::Int((*n).into())),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn equal(a: &Value, b: &Value) -> BatisResult<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Timestamp(x), Value::Timestamp(y)) => Ok(x == y),
        _ => compare(a, b).map(|o| o == Ordering::Equal),
    }
}

fn compare(a: &Value, b: &Value) -> BatisResult<Ordering> {
    let ord = match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        _ => match (number(a), number(b)) {
            (Some(Number::Int(x)), Some(Number::Int(y))) => Some(x.cmp(&y)),
            (Some(Number::Float(x)), Some(Number::Float(y))) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ord.ok_or_else(|| {
        BatisError::execution(format!(
            "incompatible types for comparison: {} and {}",
            a.kind(),
            b.kind()
        ))
    })
}

fn index(item: &Value, key: &Value) -> BatisResult<Value> {
    match (item, key) {
        (Value::List(items), _) => {
            let i = key
                .as_i64()
                .ok_or_else(|| BatisError::execution(format!("cannot index list with {}", key.kind())))?;
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| BatisError::execution(format!("index out of range: {}", i)))
        }
        (Value::Map(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or_default()),
        (Value::Struct(s), Value::String(k)) => s.get(k).cloned().ok_or_else(|| {
            BatisError::execution(format!("can't evaluate field {} in struct {}", k, s.name))
        }),
        (Value::Null, _) => Err(BatisError::execution("index of untyped nil")),
        _ => Err(BatisError::execution(format!(
            "cannot index {} with {}",
            item.kind(),
            key.kind()
        ))),
    }
}

/// Concatenate arguments, adding a space between two operands when neither
/// is a string.
fn print(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, Value::String(_));
        if i > 0 && !is_string && !matches!(args[i - 1], Value::String(_)) {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}

fn arity<const N: usize>(name: &str, args: Vec<Value>) -> BatisResult<[Value; N]> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| wrong_arity(name, N, got))
}

fn wrong_arity(name: &str, want: usize, got: usize) -> BatisError {
    BatisError::execution(format!(
        "wrong number of args for {}: want {} got {}",
        name, want, got
    ))
}

fn string_arg(name: &str, value: Value) -> BatisResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(BatisError::execution(format!(
            "{}: expected string argument, got {}",
            name,
            other.kind()
        ))),
    }
}
