//! # batis-core
//!
//! Runtime for batis: turns SQL statements and dynamic templates plus
//! parameters into driver-ready SQL and an ordered list of bound values.
//!
//! This crate provides:
//! - Raw statements with `#{name}` (bound) and `${name}` (spliced) placeholders
//! - Dynamic templates with `set`, `where`, `arg` and `add`
//! - Per-driver placeholder styles (`?`, `$1`, `:1`)
//! - Parameter flattening from structs, maps and lists
//! - A parser registry keyed by SQL id, and a manager on top of it
//! - An optional metadata cache
//!
//! ## Raw Statements
//!
//! ```rust
//! use batis_core::{Parser, Value, params};
//!
//! let parser = Parser::statement("SELECT * FROM t WHERE id = #{0} AND name = #{1}");
//! let md = parser.parse_metadata("postgres", &params![100, "hello"].unwrap()).unwrap();
//!
//! assert_eq!(md.action.as_str(), "select");
//! assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = $1 AND name = $2");
//! assert_eq!(md.params, vec![Value::from(100), Value::from("hello")]);
//! ```
//!
//! ## Struct Parameters
//!
//! Structs flatten to `TypeName.field` keys:
//!
//! ```rust
//! use batis_core::{Parser, params};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! #[serde(rename = "u")]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let parser = Parser::statement("SELECT * FROM t WHERE id = #{u.id} AND name = #{u.name}");
//! let user = User { id: 100, name: "hello".into() };
//! let md = parser.parse_metadata("mysql", &params![user].unwrap()).unwrap();
//!
//! assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = ? AND name = ?");
//! ```
//!
//! ## Templates
//!
//! ```rust
//! use batis_core::{Parser, params};
//!
//! let parser = Parser::template(
//!     r#"SELECT * FROM t{{where .status "" "status=" (arg .status) "" | where .role "AND" "role=" (arg .role)}}"#,
//! ).unwrap();
//!
//! let mut filter = std::collections::BTreeMap::new();
//! filter.insert("status", "");
//! filter.insert("role", "admin");
//! let md = parser.parse_metadata("oci8", &params![filter].unwrap()).unwrap();
//!
//! assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE role=:1");
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use batis_core::{ErrorCode, Parser};
//!
//! let err = Parser::statement("SELECT #{missing}").parse_metadata("mysql", &[]).unwrap_err();
//! assert_eq!(err.code(), ErrorCode::ParamKeyNotFound);
//! ```

pub mod cache;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod flatten;
pub mod format;
pub mod logging;
#[macro_use]
pub mod macros;
pub mod manager;
pub mod metadata;
pub mod parser;
pub mod placeholder;
pub mod registry;
pub mod statement;
pub mod value;

pub use cache::{MetadataCache, MetadataCacheKey};
pub use config::BatisConfig;
pub use dynamic::TemplateParser;
pub use error::{BatisError, BatisResult, ErrorCode};
pub use flatten::{ParamMap, flatten};
pub use format::{FormatRegistry, MapperFormat};
pub use manager::SqlManager;
pub use metadata::{Action, Metadata};
pub use parser::{Parser, StatementParser};
pub use placeholder::{PlaceholderStyle, PlaceholderStyles};
pub use registry::{ParserRegistry, ParserTable};
pub use statement::{parse_named, parse_positional, parse_simple};
pub use value::{StructValue, Value, ValueError, to_value};

// Re-export logging utilities
pub use logging::{
    get_log_format, get_log_level, init as init_logging, init_debug, init_with_level,
    is_debug_enabled,
};

#[doc(hidden)]
pub use tracing as __tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{BatisError, BatisResult};
    pub use crate::manager::SqlManager;
    pub use crate::metadata::{Action, Metadata};
    pub use crate::params;
    pub use crate::parser::Parser;
    pub use crate::placeholder::PlaceholderStyle;
    pub use crate::value::{StructValue, Value};
}
