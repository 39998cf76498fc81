//! Template body nodes.

use serde::Serialize;
use smol_str::SmolStr;

use super::types::{Ident, Span};

/// A node in a template body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    /// Literal SQL text, emitted verbatim.
    Text(String),
    /// `{{pipeline}}`: the pipeline result is printed (declarations print nothing).
    Output(Pipeline),
    /// `{{if}} ... {{else if}} ... {{else}} ... {{end}}`.
    If(IfNode),
    /// `{{range}} ... {{else}} ... {{end}}`.
    Range(RangeNode),
    /// `{{with}} ... {{else}} ... {{end}}`.
    With(WithNode),
    /// `{{template "name" pipeline}}`.
    Call(CallNode),
}

/// One guarded branch of an `if` chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    /// The guard.
    pub condition: Pipeline,
    /// Nodes rendered when the guard is truthy.
    pub body: Vec<Node>,
}

/// An `if` / `else if` / `else` chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfNode {
    /// Guarded branches in source order (at least one).
    pub branches: Vec<Branch>,
    /// The final `else` body.
    pub otherwise: Option<Vec<Node>>,
    /// Source location.
    pub span: Span,
}

/// A `range` loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeNode {
    /// `$i` in `range $i, $v := ...`.
    pub index: Option<Ident>,
    /// `$v` in `range $v := ...` or `range $i, $v := ...`.
    pub element: Option<Ident>,
    /// The ranged-over value.
    pub pipeline: Pipeline,
    /// Loop body, rendered with the element as dot.
    pub body: Vec<Node>,
    /// Rendered when the value is empty.
    pub otherwise: Option<Vec<Node>>,
    /// Source location.
    pub span: Span,
}

/// A `with` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithNode {
    /// The value that becomes dot.
    pub pipeline: Pipeline,
    /// Rendered when the value is truthy.
    pub body: Vec<Node>,
    /// Rendered otherwise.
    pub otherwise: Option<Vec<Node>>,
    /// Source location.
    pub span: Span,
}

/// A `template` invocation of a named define.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallNode {
    /// Name of the define.
    pub name: Ident,
    /// Data passed as dot, `nil` when absent.
    pub pipeline: Option<Pipeline>,
    /// Source location.
    pub span: Span,
}

/// Commands joined by `|`, optionally bound to a fresh variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    /// `$x` in `$x := ...`.
    pub decl: Option<Ident>,
    /// Commands, left to right. The result of each is passed as the final
    /// argument of the next.
    pub commands: Vec<Command>,
    /// Source location.
    pub span: Span,
}

/// A single command: a function call or a lone operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// Operands; when the first is a function the rest are its arguments.
    pub operands: Vec<Operand>,
    /// Source location.
    pub span: Span,
}

impl Command {
    /// The function called by this command, if any.
    pub fn function(&self) -> Option<&Ident> {
        match self.operands.first() {
            Some(Operand::Function(ident)) => Some(ident),
            _ => None,
        }
    }
}

/// An argument or value reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    /// `.` (empty path) or a field chain such as `.User.Name`.
    Field {
        /// Field names after the dot.
        path: Vec<SmolStr>,
        /// Source location.
        span: Span,
    },
    /// `$`, `$x` or `$x.Field`.
    Variable {
        /// Variable name including the `$`.
        name: SmolStr,
        /// Field names after the variable.
        path: Vec<SmolStr>,
        /// Source location.
        span: Span,
    },
    /// A function name.
    Function(Ident),
    /// A constant.
    Literal {
        /// The constant value.
        value: Literal,
        /// Source location.
        span: Span,
    },
    /// A parenthesized pipeline.
    Pipeline(Box<Pipeline>),
}

impl Operand {
    /// Source location of the operand.
    pub fn span(&self) -> Span {
        match self {
            Self::Field { span, .. } | Self::Variable { span, .. } | Self::Literal { span, .. } => {
                *span
            }
            Self::Function(ident) => ident.span,
            Self::Pipeline(pipeline) => pipeline.span,
        }
    }
}

/// A constant written in the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// `nil`.
    Nil,
    /// `true` / `false`.
    Bool(bool),
    /// Integer constant.
    Int(i64),
    /// Floating point constant.
    Float(f64),
    /// Quoted or raw string.
    String(String),
}
