//! Raw statement parsing.
//!
//! Statements use two placeholder forms:
//!
//! - `#{name}` binds a value: it becomes the driver's next placeholder token
//!   and the value is appended to [`Metadata::params`].
//! - `${name}` splices the value's text straight into the SQL. Nothing is
//!   escaped, so only use it for trusted input such as table names.
//!
//! A name runs to the first `}`; whitespace or a comma before it, or a
//! missing `}`, is a [`BatisError::MalformedPlaceholder`]. An empty `#{}` is
//! left in the text untouched.

use crate::error::{BatisError, BatisResult};
use crate::flatten::ParamMap;
use crate::metadata::Metadata;
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;

/// A piece of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain SQL.
    Text(&'a str),
    /// `#{name}`.
    Bound(&'a str),
    /// `${name}`.
    Raw(&'a str),
}

/// Splits a statement into [`Segment`]s.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    sql: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Scanner<'a> {
    /// Scan `sql` from the beginning.
    pub fn new(sql: &'a str) -> Self {
        Self {
            sql,
            pos: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = BatisResult<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.sql.len() {
            return None;
        }

        let rest = &self.sql[self.pos..];
        let Some(offset) = find_marker(rest) else {
            self.pos = self.sql.len();
            return Some(Ok(Segment::Text(rest)));
        };

        if offset > 0 {
            self.pos += offset;
            return Some(Ok(Segment::Text(&rest[..offset])));
        }

        let name_start = self.pos + 2;
        let Some(len) = name_len(&self.sql[name_start..]) else {
            self.failed = true;
            return Some(Err(BatisError::malformed(self.sql, self.pos)));
        };

        let name = &self.sql[name_start..name_start + len];
        let whole = &self.sql[self.pos..name_start + len + 1];
        self.pos = name_start + len + 1;

        let segment = match (name.is_empty(), whole.as_bytes()[0]) {
            (true, _) => Segment::Text(whole),
            (false, b'#') => Segment::Bound(name),
            (false, _) => Segment::Raw(name),
        };
        Some(Ok(segment))
    }
}

/// Offset of the next `#{` or `${`.
fn find_marker(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    bytes
        .windows(2)
        .position(|w| (w[0] == b'#' || w[0] == b'$') && w[1] == b'{')
}

/// Length of a placeholder name up to its closing `}`.
fn name_len(s: &str) -> Option<usize> {
    for (i, c) in s.char_indices() {
        if c == '}' {
            return Some(i);
        }
        if c.is_whitespace() || c == ',' {
            return None;
        }
    }
    None
}

/// Collect placeholder names and rewrite every `#{..}` to `?`, without
/// resolving any values. `${..}` is left as written.
pub fn parse_simple(sql: &str) -> BatisResult<Metadata> {
    let sql = sql.trim();
    let mut prepared = String::with_capacity(sql.len());
    let mut vars = Vec::new();

    for segment in Scanner::new(sql) {
        match segment? {
            Segment::Text(text) => prepared.push_str(text),
            Segment::Bound(name) => {
                vars.push(name.to_string());
                prepared.push('?');
            }
            Segment::Raw(name) => {
                prepared.push_str("${");
                prepared.push_str(name);
                prepared.push('}');
            }
        }
    }

    Ok(Metadata::new(prepared, vars, Vec::new()))
}

/// Resolve placeholders as indexes into `params`: `#{0}` is the first value.
pub fn parse_positional(
    style: &PlaceholderStyle,
    sql: &str,
    params: &[Value],
) -> BatisResult<Metadata> {
    bind(style, sql, |name| {
        let index: usize = name.parse().map_err(|_| BatisError::InvalidParamIndex {
            name: name.to_string(),
        })?;
        params
            .get(index)
            .cloned()
            .ok_or(BatisError::ParamIndexOutOfRange {
                index,
                len: params.len(),
            })
    })
}

/// Resolve placeholders by key in a flattened parameter map.
pub fn parse_named(style: &PlaceholderStyle, sql: &str, params: &ParamMap) -> BatisResult<Metadata> {
    bind(style, sql, |name| {
        params
            .get(name)
            .cloned()
            .ok_or_else(|| BatisError::ParamKeyNotFound {
                key: name.to_string(),
            })
    })
}

fn bind(
    style: &PlaceholderStyle,
    sql: &str,
    mut resolve: impl FnMut(&str) -> BatisResult<Value>,
) -> BatisResult<Metadata> {
    let sql = sql.trim();
    let mut prepared = String::with_capacity(sql.len());
    let mut vars = Vec::new();
    let mut params = Vec::new();

    for segment in Scanner::new(sql) {
        match segment? {
            Segment::Text(text) => prepared.push_str(text),
            Segment::Bound(name) => {
                vars.push(name.to_string());
                params.push(resolve(name)?);
                prepared.push_str(&style.token(params.len()));
            }
            Segment::Raw(name) => {
                vars.push(name.to_string());
                prepared.push_str(&resolve(name)?.to_string());
            }
        }
    }

    Ok(Metadata::new(prepared, vars, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::metadata::Action;
    use crate::value::StructValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scanner_segments() {
        let segments: Vec<_> = Scanner::new("a #{x} b ${y}")
            .collect::<BatisResult<_>>()
            .unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Text("a "),
                Segment::Bound("x"),
                Segment::Text(" b "),
                Segment::Raw("y"),
            ]
        );
    }

    #[test]
    fn test_positional_postgres() {
        let md = parse_positional(
            &PlaceholderStyle::Dollar,
            "SELECT * FROM t WHERE id = #{0} AND name = #{1}",
            &[Value::from(100), Value::from("hello")],
        )
        .unwrap();

        assert_eq!(md.action, Action::Select);
        assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = $1 AND name = $2");
        assert_eq!(md.params, vec![Value::from(100), Value::from("hello")]);
        assert_eq!(md.vars, vec!["0", "1"]);
    }

    #[test]
    fn test_positional_errors() {
        let err = parse_positional(&PlaceholderStyle::Question, "SELECT #{2}", &[Value::Int(1)])
            .unwrap_err();
        assert!(matches!(err, BatisError::ParamIndexOutOfRange { index: 2, len: 1 }));

        let err = parse_positional(&PlaceholderStyle::Question, "SELECT #{id}", &[Value::Int(1)])
            .unwrap_err();
        assert!(matches!(err, BatisError::InvalidParamIndex { ref name } if name == "id"));
    }

    #[test]
    fn test_named_struct() {
        let u = StructValue::new("u").field("Id", 100).field("Name", "hello");
        let params = flatten(&[Value::from(u)]);

        let md = parse_named(
            &PlaceholderStyle::Question,
            "SELECT * FROM t WHERE id = #{u.Id} AND name = #{u.Name}",
            &params,
        )
        .unwrap();

        assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = ? AND name = ?");
        assert_eq!(md.params, vec![Value::from(100), Value::from("hello")]);
    }

    #[test]
    fn test_named_missing_key() {
        let err = parse_named(
            &PlaceholderStyle::Question,
            "SELECT * FROM t WHERE id = #{missing}",
            &ParamMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BatisError::ParamKeyNotFound { ref key } if key == "missing"));
    }

    #[test]
    fn test_raw_substitution_is_not_bound() {
        let params = flatten(&[Value::from("user_2024"), Value::from(7)]);
        let md = parse_named(
            &PlaceholderStyle::Dollar,
            "SELECT * FROM ${0} WHERE id = #{1}",
            &params,
        )
        .unwrap();

        assert_eq!(md.prepared_sql, "SELECT * FROM user_2024 WHERE id = $1");
        assert_eq!(md.params, vec![Value::from(7)]);
        assert_eq!(md.vars, vec!["0", "1"]);
    }

    #[test]
    fn test_spliced_text_is_not_rescanned() {
        let params = flatten(&[Value::from("#{1}"), Value::from(7)]);
        let md = parse_named(&PlaceholderStyle::Question, "SELECT ${0}", &params).unwrap();
        assert_eq!(md.prepared_sql, "SELECT #{1}");
        assert!(md.params.is_empty());
    }

    #[test]
    fn test_repeated_name_binds_twice() {
        let params = flatten(&[Value::from(5)]);
        let md = parse_named(
            &PlaceholderStyle::Dollar,
            "SELECT * FROM t WHERE a = #{0} OR b = #{0}",
            &params,
        )
        .unwrap();
        assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE a = $1 OR b = $2");
        assert_eq!(md.params.len(), 2);
    }

    #[test]
    fn test_malformed_placeholders() {
        for sql in [
            "SELECT * FROM t WHERE id = #{a b}",
            "SELECT * FROM t WHERE id = #{a,b}",
            "SELECT * FROM t WHERE id = #{id",
        ] {
            let err = parse_named(&PlaceholderStyle::Question, sql, &ParamMap::new()).unwrap_err();
            assert!(
                matches!(err, BatisError::MalformedPlaceholder { offset: 27, .. }),
                "{}: {:?}",
                sql,
                err
            );
        }
    }

    #[test]
    fn test_empty_placeholder_left_verbatim() {
        let md = parse_named(&PlaceholderStyle::Question, "SELECT '#{}'", &ParamMap::new()).unwrap();
        assert_eq!(md.prepared_sql, "SELECT '#{}'");
        assert!(md.vars.is_empty());
    }

    #[test]
    fn test_parse_simple() {
        let md = parse_simple("  UPDATE t SET a = #{a}, b = #{b} WHERE t = ${table}  ").unwrap();
        assert_eq!(md.action, Action::Update);
        assert_eq!(md.prepared_sql, "UPDATE t SET a = ?, b = ? WHERE t = ${table}");
        assert_eq!(md.vars, vec!["a", "b"]);
        assert!(md.params.is_empty());
    }

    #[test]
    fn test_dollar_tokens_in_text_are_untouched() {
        let md = parse_named(&PlaceholderStyle::Question, "SELECT $1, '#'", &ParamMap::new()).unwrap();
        assert_eq!(md.prepared_sql, "SELECT $1, '#'");
    }

    #[test]
    fn test_unicode_text() {
        let params = flatten(&[Value::from("é")]);
        let md = parse_named(&PlaceholderStyle::Question, "SELECT 'ü' || #{0}", &params).unwrap();
        assert_eq!(md.prepared_sql, "SELECT 'ü' || ?");
    }
}
