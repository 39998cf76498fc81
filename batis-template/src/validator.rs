//! Template validation and semantic analysis.
//!
//! Checks that a parsed template only calls known functions, only invokes
//! defines that exist and only reads variables that are in scope.

use crate::ast::*;
use crate::error::{TemplateError, TemplateResult};
use crate::functions;
use crate::parser::parse_template;

/// Template validator for semantic analysis.
#[derive(Debug, Default)]
pub struct Validator {
    /// Collected validation errors.
    errors: Vec<TemplateError>,
    /// Variables in scope, innermost last.
    scope: Vec<String>,
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a template and return it, or the errors found.
    pub fn validate(&mut self, template: Template) -> TemplateResult<Template> {
        self.errors.clear();

        self.validate_body(&template.root, &template);
        for define in template.defines.values() {
            self.validate_body(&define.body, &template);
        }

        match self.errors.len() {
            0 => Ok(template),
            1 => Err(self.errors.remove(0)),
            count => Err(TemplateError::ValidationFailed {
                count,
                errors: std::mem::take(&mut self.errors),
            }),
        }
    }

    /// Each body starts with only `$` in scope.
    fn validate_body(&mut self, nodes: &[Node], template: &Template) {
        self.scope.clear();
        self.scope.push("$".to_string());
        self.validate_nodes(nodes, template);
    }

    fn validate_nodes(&mut self, nodes: &[Node], template: &Template) {
        let mark = self.scope.len();

        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Output(pipeline) => self.validate_pipeline(pipeline, template),
                Node::If(node) => {
                    let mark = self.scope.len();
                    for branch in &node.branches {
                        self.validate_pipeline(&branch.condition, template);
                        self.validate_nodes(&branch.body, template);
                    }
                    if let Some(otherwise) = &node.otherwise {
                        self.validate_nodes(otherwise, template);
                    }
                    self.scope.truncate(mark);
                }
                Node::Range(node) => {
                    let mark = self.scope.len();
                    self.validate_pipeline(&node.pipeline, template);
                    for var in node.index.iter().chain(node.element.iter()) {
                        self.scope.push(var.name.to_string());
                    }
                    self.validate_nodes(&node.body, template);
                    if let Some(otherwise) = &node.otherwise {
                        self.validate_nodes(otherwise, template);
                    }
                    self.scope.truncate(mark);
                }
                Node::With(node) => {
                    let mark = self.scope.len();
                    self.validate_pipeline(&node.pipeline, template);
                    self.validate_nodes(&node.body, template);
                    if let Some(otherwise) = &node.otherwise {
                        self.validate_nodes(otherwise, template);
                    }
                    self.scope.truncate(mark);
                }
                Node::Call(call) => {
                    if template.define(call.name.as_str()).is_none() {
                        self.errors.push(TemplateError::undefined_template(
                            call.name.as_str(),
                            template.source(),
                            call.name.span,
                        ));
                    }
                    if let Some(pipeline) = &call.pipeline {
                        self.validate_pipeline(pipeline, template);
                    }
                }
            }
        }

        self.scope.truncate(mark);
    }

    /// Validate a pipeline; a declared variable stays in scope afterwards.
    fn validate_pipeline(&mut self, pipeline: &Pipeline, template: &Template) {
        for command in &pipeline.commands {
            for operand in &command.operands {
                self.validate_operand(operand, template);
            }
        }
        if let Some(decl) = &pipeline.decl {
            self.scope.push(decl.name.to_string());
        }
    }

    fn validate_operand(&mut self, operand: &Operand, template: &Template) {
        match operand {
            Operand::Function(ident) => {
                if !functions::is_known(ident.as_str()) {
                    self.errors.push(TemplateError::unknown_function(
                        ident.as_str(),
                        template.source(),
                        ident.span,
                    ));
                }
            }
            Operand::Variable { name, span, .. } => {
                if !self.scope.iter().any(|v| v == name.as_str()) {
                    self.errors.push(TemplateError::undefined_variable(
                        name.as_str(),
                        template.source(),
                        *span,
                    ));
                }
            }
            Operand::Pipeline(inner) => self.validate_pipeline(inner, template),
            Operand::Field { .. } | Operand::Literal { .. } => {}
        }
    }
}

/// Parse and validate a template.
pub fn compile_template(input: &str) -> TemplateResult<Template> {
    let template = parse_template(input)?;
    Validator::new().validate(template)
}
