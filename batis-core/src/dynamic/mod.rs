//! Dynamic SQL templates.
//!
//! A template is compiled once and rendered per call. Rendering walks the
//! template with the parameters as dot, then rewrites every value bound with
//! `arg` to the driver's placeholder token:
//!
//! ```rust
//! use batis_core::dynamic::TemplateParser;
//! use batis_core::placeholder::PlaceholderStyle;
//! use batis_core::value::{StructValue, Value};
//!
//! let parser = TemplateParser::compile(
//!     r#"SELECT * FROM user{{where .Name "" "name=" (arg .Name) "" | where .Age "AND" "age=" (arg .Age)}}"#,
//! ).unwrap();
//!
//! let user = StructValue::new("User").field("Name", "ann").field("Age", 0);
//! let md = parser.render(&PlaceholderStyle::Dollar, &[Value::from(user)]).unwrap();
//!
//! assert_eq!(md.prepared_sql, "SELECT * FROM user WHERE name=$1");
//! assert_eq!(md.params, vec![Value::from("ann")]);
//! ```
//!
//! Template functions:
//!
//! | Function | Result |
//! |----------|--------|
//! | `arg v` | binds `v`, renders as the next placeholder |
//! | `set cond column value origin` | appends `column` + `value` to a `SET` list when `cond` holds |
//! | `where cond connector column value origin` | appends a condition to a `WHERE` clause when `cond` holds |
//! | `add a b` | integer sum |
//!
//! plus `and`, `or`, `not`, `eq`, `ne`, `lt`, `le`, `gt`, `ge`, `len`,
//! `index` and `print`.

mod eval;
mod funcs;
mod state;

use std::fmt;
use std::sync::Arc;

use batis_template::{Node, Template, compile_template};
use smol_str::SmolStr;

use crate::error::{BatisError, BatisResult};
use crate::metadata::Metadata;
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;

/// A compiled template, rendered either from its top-level body or from one
/// of its defines.
///
/// Cloning is cheap; the compiled template is shared.
#[derive(Clone)]
pub struct TemplateParser {
    template: Arc<Template>,
    entry: Option<SmolStr>,
}

impl TemplateParser {
    /// Compile `source`. Every call compiles afresh; callers that want to
    /// reuse a template keep the parser (or its [`template`](Self::template)).
    pub fn compile(source: &str) -> BatisResult<Self> {
        Ok(Self::from_template(Arc::new(compile_template(source)?)))
    }

    /// Render the top-level body of an already compiled template.
    pub fn from_template(template: Arc<Template>) -> Self {
        Self {
            template,
            entry: None,
        }
    }

    /// Render the define `name` of `template`.
    pub fn for_define(template: Arc<Template>, name: &str) -> BatisResult<Self> {
        if template.define(name).is_none() {
            return Err(BatisError::execution(format!("no such template {:?}", name)));
        }
        Ok(Self {
            template,
            entry: Some(SmolStr::new(name)),
        })
    }

    /// The compiled template.
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// The define this parser renders, if not the top-level body.
    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    /// Render with `params` as data: a single parameter becomes dot itself,
    /// anything else is passed as a list.
    pub fn render(&self, style: &PlaceholderStyle, params: &[Value]) -> BatisResult<Metadata> {
        let data = match params {
            [single] => single.clone(),
            many => Value::List(many.to_vec()),
        };
        self.render_value(style, data)
    }

    /// Render with `data` as dot.
    pub fn render_value(&self, style: &PlaceholderStyle, data: Value) -> BatisResult<Metadata> {
        let name = self.entry().unwrap_or("root");
        eval::render(&self.template, name, self.body()?, data, style)
    }

    fn body(&self) -> BatisResult<&[Node]> {
        match &self.entry {
            None => Ok(&self.template.root),
            Some(name) => self
                .template
                .define(name)
                .map(|d| d.body.as_slice())
                .ok_or_else(|| BatisError::execution(format!("no such template {:?}", name.as_str()))),
        }
    }
}

impl fmt::Debug for TemplateParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateParser")
            .field("entry", &self.entry)
            .field("defines", &self.template.defines.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Action;
    use crate::value::StructValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_single_param_is_dot() {
        let parser = TemplateParser::compile("SELECT * FROM t WHERE id = {{arg .Id}}").unwrap();
        let user = StructValue::new("User").field("Id", 3);
        let md = parser.render(&PlaceholderStyle::Colon, &[Value::from(user)]).unwrap();

        assert_eq!(md.action, Action::Select);
        assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = :1");
        assert_eq!(md.params, vec![Value::Int(3)]);
        assert!(md.vars.is_empty());
    }

    #[test]
    fn test_render_many_params_is_list() {
        let parser = TemplateParser::compile("SELECT {{arg (index . 1)}}, {{arg (index . 0)}}").unwrap();
        let md = parser
            .render(&PlaceholderStyle::Question, &[Value::from("a"), Value::from("b")])
            .unwrap();
        assert_eq!(md.prepared_sql, "SELECT ?, ?");
        assert_eq!(md.params, vec![Value::from("b"), Value::from("a")]);
    }

    #[test]
    fn test_for_define() {
        let template = Arc::new(
            compile_template(r#"{{define "byId"}}DELETE FROM t WHERE id = {{arg .}}{{end}}"#).unwrap(),
        );
        let parser = TemplateParser::for_define(template.clone(), "byId").unwrap();
        let md = parser.render(&PlaceholderStyle::Dollar, &[Value::Int(9)]).unwrap();

        assert_eq!(md.action, Action::Delete);
        assert_eq!(md.prepared_sql, "DELETE FROM t WHERE id = $1");
        assert_eq!(parser.entry(), Some("byId"));

        assert!(TemplateParser::for_define(template, "missing").is_err());
    }

    #[test]
    fn test_compile_error() {
        let err = TemplateParser::compile("{{nope .}}").unwrap_err();
        assert!(matches!(err, BatisError::TemplateCompile(_)));
    }

    #[test]
    fn test_renders_are_independent() {
        let parser = TemplateParser::compile("SELECT {{arg .}}").unwrap();
        let a = parser.render(&PlaceholderStyle::Question, &[Value::Int(1)]).unwrap();
        let b = parser.render(&PlaceholderStyle::Question, &[Value::Int(2)]).unwrap();
        assert_eq!(a.params, vec![Value::Int(1)]);
        assert_eq!(b.params, vec![Value::Int(2)]);
    }

    #[test]
    fn test_concurrent_renders() {
        let parser = Arc::new(TemplateParser::compile("SELECT {{arg .}} + {{arg .}}").unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let parser = Arc::clone(&parser);
                std::thread::spawn(move || {
                    parser
                        .render(&PlaceholderStyle::Dollar, &[Value::Int(i)])
                        .unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let md = handle.join().unwrap();
            assert_eq!(md.prepared_sql, "SELECT $1 + $2");
            assert_eq!(md.params, vec![Value::Int(i as i64), Value::Int(i as i64)]);
        }
    }
}
