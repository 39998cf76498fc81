//! The statement manager.
//!
//! [`SqlManager`] owns everything needed to go from a SQL id and parameters
//! to [`Metadata`]: a driver name, placeholder styles, a parser registry,
//! mapper formats and an optional metadata cache.
//!
//! ```rust
//! use batis_core::manager::SqlManager;
//! use batis_core::metadata::Action;
//! use batis_core::params;
//!
//! let manager = SqlManager::new().with_driver("postgres");
//! manager.register_sql("user.find", "SELECT * FROM user WHERE id = #{0}").unwrap();
//!
//! let md = manager.prepare(Action::Select, "user.find", &params![7].unwrap()).unwrap();
//! assert_eq!(md.prepared_sql, "SELECT * FROM user WHERE id = $1");
//! ```

use std::ops::Deref;
use std::sync::Arc;

use batis_template::NAMESPACE_DEFINE;
use tracing::{debug, warn};

use crate::cache::MetadataCache;
use crate::config::BatisConfig;
use crate::dynamic::TemplateParser;
use crate::error::{BatisError, BatisResult};
use crate::flatten::flatten;
use crate::format::{FormatRegistry, MapperFormat};
use crate::metadata::{Action, Metadata};
use crate::parser::Parser;
use crate::placeholder::PlaceholderStyles;
use crate::registry::ParserRegistry;
use crate::statement::parse_named;
use crate::value::Value;

/// Either a manager-owned instance or a process-wide one.
#[derive(Debug)]
enum Shared<T: 'static> {
    Owned(T),
    Global(&'static T),
}

impl<T: 'static> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Owned(value) => value,
            Self::Global(value) => value,
        }
    }
}

/// Registers statements and turns SQL ids into [`Metadata`].
#[derive(Debug)]
pub struct SqlManager {
    driver: String,
    styles: Shared<PlaceholderStyles>,
    parsers: Shared<ParserRegistry>,
    formats: FormatRegistry,
    cache: Option<MetadataCache>,
    default_format: MapperFormat,
    raw_sql_fallback: bool,
    log_sql: bool,
}

impl Default for SqlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlManager {
    /// Create a manager with its own registries, for the `mysql` driver.
    pub fn new() -> Self {
        Self::with_parts(
            Shared::Owned(PlaceholderStyles::new()),
            Shared::Owned(ParserRegistry::new()),
        )
    }

    /// Create a manager backed by the process-wide placeholder styles and
    /// parser registry. Managers created this way see each other's
    /// registrations.
    pub fn shared() -> Self {
        Self::with_parts(
            Shared::Global(PlaceholderStyles::global()),
            Shared::Global(ParserRegistry::global()),
        )
    }

    fn with_parts(styles: Shared<PlaceholderStyles>, parsers: Shared<ParserRegistry>) -> Self {
        Self {
            driver: "mysql".to_string(),
            styles,
            parsers,
            formats: FormatRegistry::new(),
            cache: None,
            default_format: MapperFormat::Statement,
            raw_sql_fallback: true,
            log_sql: false,
        }
    }

    /// Build an isolated manager from configuration.
    pub fn from_config(config: &BatisConfig) -> BatisResult<Self> {
        let manager = Self::new()
            .with_driver(config.driver.name.clone())
            .with_metadata_cache(config.cache.metadata)
            .with_default_format(config.mapper.default_format)
            .with_raw_sql_fallback(config.mapper.raw_sql_fallback)
            .with_sql_logging(config.debug.log_sql);

        for (driver, style) in config.placeholder_styles()? {
            manager.styles.register(driver, style);
        }
        debug!(driver = %manager.driver, "sql manager configured");
        Ok(manager)
    }

    /// Set the driver whose placeholder style is used.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        self
    }

    /// Enable or disable metadata caching for raw statements.
    pub fn with_metadata_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(MetadataCache::new);
        self
    }

    /// Set the format used by [`register_sql`](Self::register_sql).
    pub fn with_default_format(mut self, format: MapperFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Whether unknown SQL ids are treated as raw statement text.
    pub fn with_raw_sql_fallback(mut self, enabled: bool) -> Self {
        self.raw_sql_fallback = enabled;
        self
    }

    /// Log every prepared statement at debug level.
    pub fn with_sql_logging(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// The driver name.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Placeholder styles used by this manager.
    pub fn styles(&self) -> &PlaceholderStyles {
        &self.styles
    }

    /// Parser registry used by this manager.
    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Mapper formats known to this manager.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// The metadata cache, when enabled.
    pub fn metadata_cache(&self) -> Option<&MetadataCache> {
        self.cache.as_ref()
    }

    /// Register `text` under `sql_id` in the default format.
    pub fn register_sql(&self, sql_id: &str, text: &str) -> BatisResult<()> {
        let parser = self.default_format.compile(text)?;
        crate::batis_debug!(sql_id, format = %self.default_format, "registering statement");
        self.parsers.add(sql_id, parser)
    }

    /// Register `text` under `sql_id` in the format claimed by `tag`.
    pub fn register_sql_as(&self, sql_id: &str, tag: &str, text: &str) -> BatisResult<()> {
        let parser = self.formats.compile(tag, text)?;
        crate::batis_debug!(sql_id, format = tag, "registering statement");
        self.parsers.add(sql_id, parser)
    }

    /// Remove a statement. Returns whether it was registered.
    pub fn unregister_sql(&self, sql_id: &str) -> bool {
        self.parsers.remove(sql_id)
    }

    /// Register every define of a template document as its own statement.
    ///
    /// A `namespace` define, if present, is rendered and its trimmed text
    /// prefixes every id as `namespace.id`. The document is compiled before
    /// anything is registered; registration itself stops at the first
    /// duplicate id and keeps what was added before it. Returns the ids
    /// registered.
    pub fn register_document(&self, source: &str) -> BatisResult<Vec<String>> {
        let template = Arc::clone(TemplateParser::compile(source)?.template());

        let namespace = match template.namespace() {
            Some(_) => {
                TemplateParser::for_define(Arc::clone(&template), NAMESPACE_DEFINE)?
                    .render_value(&self.styles.select(&self.driver), Value::Null)?
                    .prepared_sql
            }
            None => String::new(),
        };

        let mut parsers = Vec::new();
        for define in template.statements() {
            let name = define.name.as_str();
            let sql_id = if namespace.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", namespace, name)
            };
            parsers.push((sql_id, TemplateParser::for_define(Arc::clone(&template), name)?));
        }

        crate::batis_debug!(namespace = %namespace, defines = parsers.len(), "registering document");
        self.parsers.with_lock(|table| {
            let mut ids = Vec::with_capacity(parsers.len());
            for (sql_id, parser) in parsers {
                table.add(sql_id.clone(), Parser::Template(parser))?;
                ids.push(sql_id);
            }
            Ok(ids)
        })
    }

    /// Look up a registered parser.
    pub fn find_parser(&self, sql_id: &str) -> Option<Arc<Parser>> {
        self.parsers.find(sql_id)
    }

    /// Resolve `sql_id` to metadata.
    ///
    /// An unregistered id is parsed as raw statement text when the fallback
    /// is enabled, otherwise it is a [`BatisError::NilParser`].
    pub fn metadata(&self, sql_id: &str, params: &[Value]) -> BatisResult<Metadata> {
        let parser = match self.find_parser(sql_id) {
            Some(parser) => parser,
            None if self.raw_sql_fallback => {
                crate::batis_trace!(sql_id, "no parser registered, using id as statement text");
                Arc::new(Parser::statement(sql_id))
            }
            None => {
                return Err(BatisError::NilParser {
                    sql_id: sql_id.to_string(),
                });
            }
        };

        let md = match (&*parser, &self.cache) {
            (Parser::Statement(statement), Some(cache)) => {
                let flat = flatten(params);
                // Read the generation before the style so a concurrent
                // register can only file fresh tokens under an old scope.
                let scope = format!("{}#{}", self.driver, self.styles.generation());
                let key = MetadataCache::scoped_key(&scope, statement.sql(), &flat);
                match cache.find(&key) {
                    Some(md) => Metadata::clone(&md),
                    None => {
                        let style = self.styles.select(&self.driver);
                        let md = parse_named(&style, statement.sql(), &flat)?;
                        cache.put(key, Arc::new(md.clone()));
                        md
                    }
                }
            }
            _ => parser.parse_metadata_with(&self.styles, &self.driver, params)?,
        };

        if self.log_sql {
            debug!(sql_id, sql = %md.prepared_sql, params = ?md.params, "prepared statement");
        }
        Ok(md)
    }

    /// Resolve `sql_id` for an operation of kind `expected`. A different
    /// detected action is logged, not rejected.
    pub fn prepare(&self, expected: Action, sql_id: &str, params: &[Value]) -> BatisResult<Metadata> {
        let md = self.metadata(sql_id, params)?;
        if md.action != expected {
            warn!(
                sql_id,
                expected = %expected,
                actual = %md.action,
                "sql action does not match the operation"
            );
        }
        Ok(md)
    }
}
