//! Template parser.

mod grammar;
mod trim;

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use smol_str::SmolStr;

use crate::ast::*;
use crate::error::{TemplateError, TemplateResult};

pub use grammar::{Rule, TemplateGrammar};

/// Parse a template from a string.
///
/// Only the syntax is checked here; see [`crate::compile_template`] for
/// parsing plus validation of function and define references.
pub fn parse_template(input: &str) -> TemplateResult<Template> {
    let source = trim::apply_trim_markers(input);
    let source: &str = &source;

    let mut pairs = TemplateGrammar::parse(Rule::template, source).map_err(|e| {
        let (offset, len) = match e.location {
            InputLocation::Pos(pos) => (pos, 0),
            InputLocation::Span((start, end)) => (start, end - start),
        };
        TemplateError::syntax(source, offset, len, e.to_string())
    })?;

    let template_pair = pairs
        .next()
        .ok_or_else(|| TemplateError::internal("empty parse result"))?;

    let mut builder = Builder {
        source,
        defines: IndexMap::new(),
    };

    let mut root = Vec::new();
    for pair in template_pair.into_inner() {
        if pair.as_rule() == Rule::nodes {
            root = builder.top_level(pair)?;
        }
    }

    Ok(Template::new(Arc::from(source), root, builder.defines))
}

/// Parse a template from a file.
pub fn parse_template_file(path: impl AsRef<Path>) -> TemplateResult<Template> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        TemplateError::internal(format!("failed to read {}: {}", path.display(), e))
    })?;

    parse_template(&content)
}

struct Builder<'s> {
    source: &'s str,
    defines: IndexMap<SmolStr, Define>,
}

impl Builder<'_> {
    /// The document body. `define` blocks are collected here and nowhere
    /// else.
    fn top_level(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Vec<Node>> {
        let mut nodes = Vec::new();
        for item in pair.into_inner() {
            if item.as_rule() == Rule::define_block {
                self.define(item)?;
            } else if let Some(node) = self.node(item)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn define(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<()> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let name_pair = expect(inner.next(), "define name")?;
        let name = Ident::new(self.string_lit(name_pair.clone())?, span_of(&name_pair));
        let body = self.nodes(expect(inner.next(), "define body")?)?;

        if self.defines.contains_key(&name.name) {
            return Err(TemplateError::duplicate_define(
                name.as_str(),
                self.source,
                name.span,
            ));
        }

        self.defines
            .insert(name.name.clone(), Define { name, body, span });
        Ok(())
    }

    fn nodes(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Vec<Node>> {
        let mut nodes = Vec::new();
        for item in pair.into_inner() {
            if item.as_rule() == Rule::define_block {
                let span = span_of(&item);
                return Err(TemplateError::syntax(
                    self.source,
                    span.start,
                    span.len(),
                    "define blocks are only allowed at the top level",
                ));
            }
            if let Some(node) = self.node(item)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn node(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Option<Node>> {
        let node = match pair.as_rule() {
            Rule::text => Node::Text(pair.as_str().to_string()),
            Rule::comment => return Ok(None),
            Rule::output => {
                let pipeline = self.pipeline(expect(pair.into_inner().next(), "pipeline")?)?;
                Node::Output(pipeline)
            }
            Rule::if_block => Node::If(self.if_block(pair)?),
            Rule::range_block => Node::Range(self.range_block(pair)?),
            Rule::with_block => Node::With(self.with_block(pair)?),
            Rule::template_call => Node::Call(self.template_call(pair)?),
            other => {
                return Err(TemplateError::internal(format!(
                    "unexpected rule {:?} in template body",
                    other
                )));
            }
        };
        Ok(Some(node))
    }

    fn if_block(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<IfNode> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let condition = self.pipeline(expect(inner.next(), "if condition")?)?;
        let body = self.nodes(expect(inner.next(), "if body")?)?;

        let mut branches = vec![Branch { condition, body }];
        let mut otherwise = None;

        for item in inner {
            match item.as_rule() {
                Rule::else_if_branch => {
                    let mut parts = item.into_inner();
                    let condition = self.pipeline(expect(parts.next(), "else if condition")?)?;
                    let body = self.nodes(expect(parts.next(), "else if body")?)?;
                    branches.push(Branch { condition, body });
                }
                Rule::else_branch => otherwise = Some(self.else_branch(item)?),
                _ => {}
            }
        }

        Ok(IfNode {
            branches,
            otherwise,
            span,
        })
    }

    fn range_block(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<RangeNode> {
        let span = span_of(&pair);

        let mut index = None;
        let mut element = None;
        let mut pipeline = None;
        let mut body = Vec::new();
        let mut otherwise = None;

        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::range_decl => {
                    let vars: Vec<Ident> = item.into_inner().map(|p| ident_of(&p)).collect();
                    match <[Ident; 2]>::try_from(vars) {
                        Ok([i, e]) => {
                            index = Some(i);
                            element = Some(e);
                        }
                        Err(mut vars) => element = vars.pop(),
                    }
                }
                Rule::pipeline => pipeline = Some(self.pipeline(item)?),
                Rule::nodes => body = self.nodes(item)?,
                Rule::else_branch => otherwise = Some(self.else_branch(item)?),
                _ => {}
            }
        }

        Ok(RangeNode {
            index,
            element,
            pipeline: expect(pipeline, "range pipeline")?,
            body,
            otherwise,
            span,
        })
    }

    fn with_block(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<WithNode> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let pipeline = self.pipeline(expect(inner.next(), "with pipeline")?)?;
        let body = self.nodes(expect(inner.next(), "with body")?)?;
        let otherwise = match inner.next() {
            Some(item) => Some(self.else_branch(item)?),
            None => None,
        };

        Ok(WithNode {
            pipeline,
            body,
            otherwise,
            span,
        })
    }

    fn else_branch(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Vec<Node>> {
        self.nodes(expect(pair.into_inner().next(), "else body")?)
    }

    fn template_call(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<CallNode> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let name_pair = expect(inner.next(), "template name")?;
        let name = Ident::new(self.string_lit(name_pair.clone())?, span_of(&name_pair));
        let pipeline = match inner.next() {
            Some(p) => Some(self.pipeline(p)?),
            None => None,
        };

        Ok(CallNode {
            name,
            pipeline,
            span,
        })
    }

    fn pipeline(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Pipeline> {
        let span = span_of(&pair);
        let mut decl = None;
        let mut commands = Vec::new();

        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::pipe_decl => {
                    let var = expect(item.into_inner().next(), "declared variable")?;
                    decl = Some(ident_of(&var));
                }
                Rule::command => commands.push(self.command(item)?),
                _ => {}
            }
        }

        Ok(Pipeline {
            decl,
            commands,
            span,
        })
    }

    fn command(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Command> {
        let span = span_of(&pair);
        let operands = pair
            .into_inner()
            .map(|p| self.operand(p))
            .collect::<TemplateResult<Vec<_>>>()?;
        Ok(Command { operands, span })
    }

    fn operand(&mut self, pair: Pair<'_, Rule>) -> TemplateResult<Operand> {
        let span = span_of(&pair);
        let text = pair.as_str();

        let literal =
            |value: Literal| -> TemplateResult<Operand> { Ok(Operand::Literal { value, span }) };

        match pair.as_rule() {
            Rule::sub_pipeline => {
                let inner = expect(pair.into_inner().next(), "parenthesized pipeline")?;
                Ok(Operand::Pipeline(Box::new(self.pipeline(inner)?)))
            }
            Rule::nil_lit => literal(Literal::Nil),
            Rule::bool_lit => literal(Literal::Bool(text == "true")),
            Rule::int_lit => match text.parse::<i64>() {
                Ok(n) => literal(Literal::Int(n)),
                Err(e) => Err(TemplateError::invalid_literal(
                    text,
                    e.to_string(),
                    self.source,
                    span,
                )),
            },
            Rule::float_lit => match text.parse::<f64>() {
                Ok(n) => literal(Literal::Float(n)),
                Err(e) => Err(TemplateError::invalid_literal(
                    text,
                    e.to_string(),
                    self.source,
                    span,
                )),
            },
            Rule::string_lit | Rule::raw_string => {
                literal(Literal::String(self.string_lit(pair)?))
            }
            Rule::field_chain => Ok(Operand::Field {
                path: text.split('.').skip(1).map(SmolStr::new).collect(),
                span,
            }),
            Rule::variable => {
                let mut parts = text.split('.');
                let name = SmolStr::new(parts.next().unwrap_or("$"));
                Ok(Operand::Variable {
                    name,
                    path: parts.map(SmolStr::new).collect(),
                    span,
                })
            }
            Rule::function_name => Ok(Operand::Function(Ident::new(text, span))),
            other => Err(TemplateError::internal(format!(
                "unexpected rule {:?} in command",
                other
            ))),
        }
    }

    /// Decode a quoted or raw string literal.
    fn string_lit(&self, pair: Pair<'_, Rule>) -> TemplateResult<String> {
        let span = span_of(&pair);
        let raw = pair.as_rule() == Rule::raw_string;
        let body = expect(pair.into_inner().next(), "string body")?;

        if raw {
            return Ok(body.as_str().to_string());
        }
        unescape(body.as_str())
            .map_err(|message| TemplateError::invalid_literal(body.as_str(), message, self.source, span))
    }
}

fn span_of(pair: &Pair<'_, Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

fn ident_of(pair: &Pair<'_, Rule>) -> Ident {
    Ident::new(pair.as_str(), span_of(pair))
}

fn expect<T>(value: Option<T>, what: &str) -> TemplateResult<T> {
    value.ok_or_else(|| TemplateError::internal(format!("missing {}", what)))
}

/// Resolve backslash escapes in a double-quoted string body.
fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| "trailing backslash".to_string())?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => out.push(hex_char(&mut chars, 2)?),
            'u' => out.push(hex_char(&mut chars, 4)?),
            other => return Err(format!("unknown escape sequence `\\{}`", other)),
        }
    }

    Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err("truncated escape sequence".to_string());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape value `{}`", hex))
}
