//! # batis-template
//!
//! Parser and AST for batis dynamic SQL templates.
//!
//! Templates use a `{{ ... }}` action syntax with conditionals, loops,
//! named defines and pipelines. This crate only turns text into a validated
//! [`Template`]; rendering against parameters lives in `batis-core`.
//!
//! ## Example
//!
//! ```rust
//! use batis_template::compile_template;
//!
//! let template = compile_template(
//!     r#"UPDATE user {{set .Name "name" (arg .Name) ""}} WHERE id = {{arg .Id}}"#,
//! ).unwrap();
//! assert_eq!(template.root.len(), 4);
//! ```

pub mod ast;
pub mod error;
pub mod functions;
pub mod parser;
pub mod validator;

pub use ast::*;
pub use error::{TemplateError, TemplateResult};
pub use parser::{parse_template, parse_template_file};
pub use validator::{Validator, compile_template};
