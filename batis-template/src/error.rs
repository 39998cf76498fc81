//! Error types for template compilation.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Span;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while compiling a template.
#[derive(Error, Debug, Diagnostic)]
pub enum TemplateError {
    /// Syntax error in the template text.
    #[error("syntax error in template: {message}")]
    #[diagnostic(code(batis::template::syntax_error))]
    SyntaxError {
        #[source_code]
        src: String,
        #[label("error here")]
        span: miette::SourceSpan,
        message: String,
    },

    /// A define name is declared twice in one document.
    #[error("duplicate define `{name}`")]
    #[diagnostic(code(batis::template::duplicate_define))]
    DuplicateDefine {
        name: String,
        #[source_code]
        src: String,
        #[label("redefined here")]
        span: miette::SourceSpan,
    },

    /// A call to a function the dialect does not provide.
    #[error("function `{name}` not defined")]
    #[diagnostic(
        code(batis::template::unknown_function),
        help("available functions: set, where, arg, add, and, or, not, eq, ne, lt, le, gt, ge, len, index, print")
    )]
    UnknownFunction {
        name: String,
        #[source_code]
        src: String,
        #[label("unknown function")]
        span: miette::SourceSpan,
    },

    /// A `template` action names a define that does not exist.
    #[error("no such template `{name}`")]
    #[diagnostic(code(batis::template::undefined_template))]
    UndefinedTemplate {
        name: String,
        #[source_code]
        src: String,
        #[label("referenced here")]
        span: miette::SourceSpan,
    },

    /// A `$variable` used outside the scope that declares it.
    #[error("undefined variable `{name}`")]
    #[diagnostic(code(batis::template::undefined_variable))]
    UndefinedVariable {
        name: String,
        #[source_code]
        src: String,
        #[label("not in scope")]
        span: miette::SourceSpan,
    },

    /// A literal that does not fit its type.
    #[error("invalid literal `{literal}`: {message}")]
    #[diagnostic(code(batis::template::invalid_literal))]
    InvalidLiteral {
        literal: String,
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
    },

    /// The parse tree did not have the expected shape.
    #[error("internal template parser error: {message}")]
    #[diagnostic(code(batis::template::internal))]
    Internal { message: String },

    /// Validation error with multiple issues.
    #[error("template validation failed with {count} error(s)")]
    #[diagnostic(code(batis::template::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<TemplateError>,
    },
}

impl TemplateError {
    /// Create a syntax error with source location.
    pub fn syntax(
        src: impl Into<String>,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::SyntaxError {
            src: src.into(),
            span: (offset, len).into(),
            message: message.into(),
        }
    }

    /// Create a duplicate define error.
    pub fn duplicate_define(name: impl Into<String>, src: impl Into<String>, span: Span) -> Self {
        Self::DuplicateDefine {
            name: name.into(),
            src: src.into(),
            span: span.into(),
        }
    }

    /// Create an unknown function error.
    pub fn unknown_function(name: impl Into<String>, src: impl Into<String>, span: Span) -> Self {
        Self::UnknownFunction {
            name: name.into(),
            src: src.into(),
            span: span.into(),
        }
    }

    /// Create an undefined template error.
    pub fn undefined_template(
        name: impl Into<String>,
        src: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UndefinedTemplate {
            name: name.into(),
            src: src.into(),
            span: span.into(),
        }
    }

    /// Create an undefined variable error.
    pub fn undefined_variable(
        name: impl Into<String>,
        src: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            src: src.into(),
            span: span.into(),
        }
    }

    /// Create an invalid literal error.
    pub fn invalid_literal(
        literal: impl Into<String>,
        message: impl Into<String>,
        src: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::InvalidLiteral {
            literal: literal.into(),
            message: message.into(),
            src: src.into(),
            span: span.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
