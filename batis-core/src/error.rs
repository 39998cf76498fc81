//! Error types for parsing, binding and registration.
//!
//! Every failure in this crate is returned as a [`BatisError`]. Each variant
//! maps to a stable [`ErrorCode`] so callers can branch programmatically.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: B{category}{number}
//! - 1xxx: Statement errors (malformed placeholder, missing parameter)
//! - 2xxx: Registry errors (duplicate id, duplicate format, missing parser)
//! - 3xxx: Template errors (compile, execution)
//! - 6xxx: Data errors (value conversion)
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use batis_core::{BatisError, ErrorCode};
//!
//! let err = BatisError::ParamKeyNotFound { key: "missing".into() };
//! assert_eq!(err.code(), ErrorCode::ParamKeyNotFound);
//! assert_eq!(err.code().code(), "B1004");
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::parser::Parser;
use crate::value::ValueError;

/// Result type for batis operations.
pub type BatisResult<T> = Result<T, BatisError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Statement errors (1xxx)
    /// Placeholder not closed, or name contains whitespace or a comma (B1001).
    MalformedPlaceholder = 1001,
    /// Positional placeholder index past the end of the parameters (B1002).
    ParamIndexOutOfRange = 1002,
    /// Positional placeholder name is not an integer (B1003).
    InvalidParamIndex = 1003,
    /// Named placeholder has no matching parameter (B1004).
    ParamKeyNotFound = 1004,

    // Registry errors (2xxx)
    /// SQL id already registered (B2001).
    DuplicateSqlId = 2001,
    /// Mapper format tag already claimed (B2002).
    DuplicateManagerFormat = 2002,
    /// No parser for the SQL id (B2003).
    NilParser = 2003,

    // Template errors (3xxx)
    /// Template failed to compile (B3001).
    TemplateCompile = 3001,
    /// Template failed while rendering (B3002).
    TemplateExecution = 3002,

    // Data errors (6xxx)
    /// Parameter could not be converted to a value (B6001).
    InvalidValue = 6001,

    // Configuration errors (7xxx)
    /// Invalid configuration (B7001).
    InvalidConfiguration = 7001,
    /// Configuration file could not be read (B7002).
    ConfigIo = 7002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "B1001").
    pub fn code(&self) -> String {
        format!("B{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedPlaceholder => "Malformed placeholder",
            Self::ParamIndexOutOfRange => "Parameter index out of range",
            Self::InvalidParamIndex => "Invalid parameter index",
            Self::ParamKeyNotFound => "Parameter key not found",
            Self::DuplicateSqlId => "Duplicate SQL id",
            Self::DuplicateManagerFormat => "Duplicate mapper format",
            Self::NilParser => "Parser not found",
            Self::TemplateCompile => "Template compile error",
            Self::TemplateExecution => "Template execution error",
            Self::InvalidValue => "Invalid parameter value",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::ConfigIo => "Configuration I/O error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur while parsing statements or managing parsers.
#[derive(Error, Debug)]
pub enum BatisError {
    /// A `#{` or `${` without a clean closing `}`.
    #[error("malformed placeholder at byte {offset}: {snippet}")]
    MalformedPlaceholder {
        /// Byte offset of the opening `#` or `$`.
        offset: usize,
        /// The offending text, truncated.
        snippet: String,
    },

    /// Positional index past the end of the parameter list.
    #[error("parameter index {index} out of range ({len} parameters)")]
    ParamIndexOutOfRange { index: usize, len: usize },

    /// Positional placeholder name that is not a non-negative integer.
    #[error("placeholder `{name}` is not a parameter index")]
    InvalidParamIndex { name: String },

    /// Named placeholder with no parameter of that name.
    #[error("parameter `{key}` not found")]
    ParamKeyNotFound { key: String },

    /// SQL id already registered. `existing` holds the registered parser
    /// when the error comes from a load-or-create.
    #[error("sql id `{sql_id}` already registered")]
    DuplicateSqlId {
        sql_id: String,
        existing: Option<Arc<Parser>>,
    },

    /// Format tag already claimed by another mapper format.
    #[error("mapper format `{format}` already registered")]
    DuplicateManagerFormat { format: String },

    /// Template text failed to compile.
    #[error("template compile error: {0}")]
    TemplateCompile(#[from] batis_template::TemplateError),

    /// Template failed while rendering.
    #[error("template execution error: {0}")]
    TemplateExecution(String),

    /// No parser is registered for the SQL id.
    #[error("no parser registered for sql id `{sql_id}`")]
    NilParser { sql_id: String },

    /// Parameter could not be converted to a value.
    #[error("invalid parameter value: {0}")]
    Value(#[from] ValueError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration could not be parsed as TOML.
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BatisError {
    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedPlaceholder { .. } => ErrorCode::MalformedPlaceholder,
            Self::ParamIndexOutOfRange { .. } => ErrorCode::ParamIndexOutOfRange,
            Self::InvalidParamIndex { .. } => ErrorCode::InvalidParamIndex,
            Self::ParamKeyNotFound { .. } => ErrorCode::ParamKeyNotFound,
            Self::DuplicateSqlId { .. } => ErrorCode::DuplicateSqlId,
            Self::DuplicateManagerFormat { .. } => ErrorCode::DuplicateManagerFormat,
            Self::TemplateCompile(_) => ErrorCode::TemplateCompile,
            Self::TemplateExecution(_) => ErrorCode::TemplateExecution,
            Self::NilParser { .. } => ErrorCode::NilParser,
            Self::Value(_) => ErrorCode::InvalidValue,
            Self::Config(_) | Self::Toml(_) => ErrorCode::InvalidConfiguration,
            Self::Io { .. } => ErrorCode::ConfigIo,
        }
    }

    /// Create a duplicate SQL id error.
    pub fn duplicate_sql_id(sql_id: impl Into<String>) -> Self {
        Self::DuplicateSqlId {
            sql_id: sql_id.into(),
            existing: None,
        }
    }

    /// Create a template execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::TemplateExecution(message.into())
    }

    /// Create a malformed placeholder error, keeping a short snippet of the
    /// source for context.
    pub fn malformed(sql: &str, offset: usize) -> Self {
        let snippet: String = sql.get(offset..).unwrap_or_default().chars().take(24).collect();
        Self::MalformedPlaceholder { offset, snippet }
    }

    /// Check if this is a duplicate registration error.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSqlId { .. } | Self::DuplicateManagerFormat { .. }
        )
    }

    /// The already-registered parser carried by a load-or-create conflict.
    pub fn existing_parser(&self) -> Option<&Arc<Parser>> {
        match self {
            Self::DuplicateSqlId { existing, .. } => existing.as_ref(),
            _ => None,
        }
    }
}
