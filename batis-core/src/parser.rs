//! Compiled statements.
//!
//! A [`Parser`] is what the registry stores per SQL id: either a raw
//! statement with `#{}`/`${}` placeholders or a dynamic template. Both turn
//! a driver name and parameters into [`Metadata`].

use tracing::trace;

use crate::dynamic::TemplateParser;
use crate::error::BatisResult;
use crate::flatten::flatten;
use crate::metadata::Metadata;
use crate::placeholder::{PlaceholderStyle, PlaceholderStyles};
use crate::statement::parse_named;
use crate::value::Value;

/// A raw statement resolved against flattened named parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementParser {
    sql: String,
}

impl StatementParser {
    /// Wrap statement text. Placeholders are checked when parsing.
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// The statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Flatten `params` and resolve every placeholder by name.
    pub fn parse(&self, style: &PlaceholderStyle, params: &[Value]) -> BatisResult<Metadata> {
        parse_named(style, &self.sql, &flatten(params))
    }
}

/// A compiled statement of either kind.
#[derive(Debug, Clone)]
pub enum Parser {
    /// Raw statement.
    Statement(StatementParser),
    /// Dynamic template.
    Template(TemplateParser),
}

impl Parser {
    /// Raw statement parser.
    pub fn statement(sql: impl Into<String>) -> Self {
        Self::Statement(StatementParser::new(sql))
    }

    /// Compile a template parser.
    pub fn template(source: &str) -> BatisResult<Self> {
        TemplateParser::compile(source).map(Self::Template)
    }

    /// Parse for `driver`, using the process-wide placeholder styles.
    pub fn parse_metadata(&self, driver: &str, params: &[Value]) -> BatisResult<Metadata> {
        self.parse_metadata_with(PlaceholderStyles::global(), driver, params)
    }

    /// Parse for `driver`, resolving its placeholder style in `styles`.
    pub fn parse_metadata_with(
        &self,
        styles: &PlaceholderStyles,
        driver: &str,
        params: &[Value],
    ) -> BatisResult<Metadata> {
        let style = styles.select(driver);
        let md = match self {
            Self::Statement(p) => p.parse(&style, params)?,
            Self::Template(p) => p.render(&style, params)?,
        };
        trace!(driver, sql = %md.prepared_sql, params = md.params.len(), "parsed statement");
        Ok(md)
    }

    /// Whether this is a raw statement.
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement(_))
    }
}

impl From<StatementParser> for Parser {
    fn from(p: StatementParser) -> Self {
        Self::Statement(p)
    }
}

impl From<TemplateParser> for Parser {
    fn from(p: TemplateParser) -> Self {
        Self::Template(p)
    }
}
