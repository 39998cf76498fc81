//! # Batis
//!
//! MyBatis-style dynamic SQL for Rust: register statements under ids, then
//! turn an id plus parameters into driver-ready SQL and an ordered list of
//! bound values.
//!
//! Batis provides:
//! - Raw statements with `#{name}` (bound) and `${name}` (spliced) placeholders
//! - Dynamic templates with conditionals, loops and `set`/`where` helpers
//! - Per-driver placeholder styles for MySQL, PostgreSQL, Oracle and more
//! - A statement manager with parser registry and metadata cache
//!
//! Batis does not talk to databases. The output is meant to be handed to
//! whatever driver you already use.
//!
//! ## Quick Start
//!
//! ```rust
//! use batis::prelude::*;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let manager = SqlManager::new().with_driver("postgres");
//! manager
//!     .register_sql("user.rename", "UPDATE user SET name = #{User.name} WHERE id = #{User.id}")
//!     .unwrap();
//!
//! let user = User { id: 7, name: "ann".into() };
//! let md = manager
//!     .prepare(Action::Update, "user.rename", &params![user].unwrap())
//!     .unwrap();
//!
//! assert_eq!(md.prepared_sql, "UPDATE user SET name = $1 WHERE id = $2");
//! assert_eq!(md.params, vec![Value::from("ann"), Value::from(7)]);
//! ```
//!
//! ## Mapper Documents
//!
//! ```rust
//! use batis::prelude::*;
//!
//! let manager = SqlManager::new();
//! let ids = manager
//!     .register_document(r#"
//! {{define "namespace"}}user{{end}}
//! {{define "count"}}SELECT COUNT(*) FROM user{{end}}
//! "#)
//!     .unwrap();
//!
//! assert_eq!(ids, vec!["user.count"]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Template grammar, AST and validation.
pub mod template {
    pub use batis_template::*;
}

/// Statement parsing, rendering and the statement manager.
pub mod core {
    pub use batis_core::*;
}

pub use batis_core::params;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use batis_core::prelude::*;
    pub use batis_core::{BatisConfig, MapperFormat, TemplateParser};
}

// Re-export key types at the crate root
pub use batis_core::{
    Action, BatisConfig, BatisError, BatisResult, ErrorCode, Metadata, Parser, SqlManager, Value,
};
pub use batis_template::{Template, TemplateError};
