//! Template rendering.

use batis_template::{Command, IfNode, Literal, Node, Operand, Pipeline, RangeNode, Template};
use smol_str::SmolStr;

use super::funcs;
use super::state::RenderState;
use crate::error::{BatisError, BatisResult};
use crate::metadata::Metadata;
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;

/// Maximum nesting of `template` calls.
const MAX_DEPTH: usize = 200;

/// Render `body` of `template` with `data` as dot and `$`, then turn the
/// collected `arg` sentinels into driver tokens.
pub(crate) fn render(
    template: &Template,
    name: &str,
    body: &[Node],
    data: Value,
    style: &PlaceholderStyle,
) -> BatisResult<Metadata> {
    let mut eval = Evaluator::new(template, data.clone());
    eval.walk(body, &data).map_err(|err| match err {
        BatisError::TemplateExecution(msg) => {
            BatisError::TemplateExecution(format!("template {:?}: {}", name, msg))
        }
        other => other,
    })?;

    let Evaluator { state, out, .. } = eval;
    Ok(state.finish(&out, style))
}

struct Evaluator<'t> {
    template: &'t Template,
    state: RenderState,
    vars: Vec<(SmolStr, Value)>,
    depth: usize,
    out: String,
}

impl<'t> Evaluator<'t> {
    fn new(template: &'t Template, data: Value) -> Self {
        Self {
            template,
            state: RenderState::new(),
            vars: vec![(SmolStr::new("$"), data)],
            depth: 0,
            out: String::new(),
        }
    }

    fn walk(&mut self, nodes: &[Node], dot: &Value) -> BatisResult<()> {
        for node in nodes {
            self.node(node, dot)?;
        }
        Ok(())
    }

    /// Walk a nested body; variables it declares go out of scope afterwards.
    fn block(&mut self, nodes: &[Node], dot: &Value) -> BatisResult<()> {
        let mark = self.vars.len();
        let result = self.walk(nodes, dot);
        self.vars.truncate(mark);
        result
    }

    fn node(&mut self, node: &Node, dot: &Value) -> BatisResult<()> {
        match node {
            Node::Text(text) => self.out.push_str(text),
            Node::Output(pipeline) => {
                let value = self.pipeline(pipeline, dot)?;
                if pipeline.decl.is_none() {
                    self.out.push_str(&value.to_string());
                }
            }
            Node::If(node) => {
                let mark = self.vars.len();
                let result = self.if_chain(node, dot);
                self.vars.truncate(mark);
                result?;
            }
            Node::Range(node) => {
                let mark = self.vars.len();
                let result = self.range(node, dot);
                self.vars.truncate(mark);
                result?;
            }
            Node::With(node) => {
                let mark = self.vars.len();
                let value = self.pipeline(&node.pipeline, dot);
                let result = value.and_then(|value| {
                    if value.is_truthy() {
                        self.block(&node.body, &value)
                    } else if let Some(otherwise) = &node.otherwise {
                        self.block(otherwise, dot)
                    } else {
                        Ok(())
                    }
                });
                self.vars.truncate(mark);
                result?;
            }
            Node::Call(call) => {
                let template = self.template;
                let define = template.define(call.name.as_str()).ok_or_else(|| {
                    BatisError::execution(format!("no such template {:?}", call.name.as_str()))
                })?;
                let data = match &call.pipeline {
                    Some(pipeline) => {
                        let mark = self.vars.len();
                        let value = self.pipeline(pipeline, dot);
                        self.vars.truncate(mark);
                        value?
                    }
                    None => Value::Null,
                };

                if self.depth >= MAX_DEPTH {
                    return Err(BatisError::execution(format!(
                        "exceeded maximum template depth ({})",
                        MAX_DEPTH
                    )));
                }
                self.depth += 1;
                let outer = std::mem::replace(&mut self.vars, vec![(SmolStr::new("$"), data.clone())]);
                let result = self.walk(&define.body, &data);
                self.vars = outer;
                self.depth -= 1;
                result?;
            }
        }
        Ok(())
    }

    fn if_chain(&mut self, node: &IfNode, dot: &Value) -> BatisResult<()> {
        for branch in &node.branches {
            if self.pipeline(&branch.condition, dot)?.is_truthy() {
                return self.block(&branch.body, dot);
            }
        }
        match &node.otherwise {
            Some(otherwise) => self.block(otherwise, dot),
            None => Ok(()),
        }
    }

    fn range(&mut self, node: &RangeNode, dot: &Value) -> BatisResult<()> {
        let value = self.pipeline(&node.pipeline, dot)?;
        let items: Vec<(Value, Value)> = match value {
            Value::Null => Vec::new(),
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i as i64), v))
                .collect(),
            Value::Map(map) => {
                let mut entries: Vec<_> = map.into_iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v))
                    .collect()
            }
            Value::Int(_) | Value::UInt(_) => {
                let n = value.as_i64().ok_or_else(|| {
                    BatisError::execution(format!("range count {} too large", value))
                })?;
                (0..n.max(0)).map(|i| (Value::Int(i), Value::Int(i))).collect()
            }
            other => {
                return Err(BatisError::execution(format!(
                    "range can't iterate over {}",
                    other.kind()
                )));
            }
        };

        if items.is_empty() {
            if let Some(otherwise) = &node.otherwise {
                self.block(otherwise, dot)?;
            }
            return Ok(());
        }

        for (index, element) in items {
            let mark = self.vars.len();
            if let Some(var) = &node.index {
                self.vars.push((var.name.clone(), index));
            }
            if let Some(var) = &node.element {
                self.vars.push((var.name.clone(), element.clone()));
            }
            let result = self.walk(&node.body, &element);
            self.vars.truncate(mark);
            result?;
        }
        Ok(())
    }

    /// Evaluate a pipeline. A declared variable stays in scope until the
    /// enclosing block ends.
    fn pipeline(&mut self, pipeline: &Pipeline, dot: &Value) -> BatisResult<Value> {
        let mut value = None;
        for command in &pipeline.commands {
            value = Some(self.command(command, dot, value.take())?);
        }
        let value = value.unwrap_or_default();

        if let Some(decl) = &pipeline.decl {
            self.vars.push((decl.name.clone(), value.clone()));
        }
        Ok(value)
    }

    fn command(&mut self, command: &Command, dot: &Value, piped: Option<Value>) -> BatisResult<Value> {
        let Some(function) = command.function() else {
            if command.operands.len() > 1 {
                return Err(BatisError::execution(format!(
                    "can't give argument to non-function {}",
                    describe(&command.operands[0])
                )));
            }
            if piped.is_some() {
                return Err(BatisError::execution(format!(
                    "can't pipe into non-function {}",
                    command.operands.first().map(describe).unwrap_or_default()
                )));
            }
            return match command.operands.first() {
                Some(operand) => self.operand(operand, dot),
                None => Ok(Value::Null),
            };
        };

        let name = function.as_str();
        let args = &command.operands[1..];

        if name == "and" || name == "or" {
            return self.logical(name == "and", args, dot, piped);
        }

        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            values.push(self.operand(arg, dot)?);
        }
        values.extend(piped);
        funcs::call(name, values, &mut self.state)
    }

    /// `and` stops at the first falsy argument, `or` at the first truthy
    /// one. The deciding argument is the result.
    fn logical(
        &mut self,
        is_and: bool,
        args: &[Operand],
        dot: &Value,
        piped: Option<Value>,
    ) -> BatisResult<Value> {
        if args.len() + usize::from(piped.is_some()) == 0 {
            return Err(BatisError::execution(format!(
                "wrong number of args for {}: want at least 1 got 0",
                if is_and { "and" } else { "or" }
            )));
        }

        let mut last = Value::Null;
        for arg in args {
            last = self.operand(arg, dot)?;
            if last.is_truthy() != is_and {
                return Ok(last);
            }
        }
        Ok(piped.unwrap_or(last))
    }

    fn operand(&mut self, operand: &Operand, dot: &Value) -> BatisResult<Value> {
        match operand {
            Operand::Field { path, .. } => walk_path(dot.clone(), path),
            Operand::Variable { name, path, .. } => {
                let value = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(var, _)| var == name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| BatisError::execution(format!("undefined variable: {}", name)))?;
                walk_path(value, path)
            }
            Operand::Function(ident) => funcs::call(ident.as_str(), Vec::new(), &mut self.state),
            Operand::Literal { value, .. } => Ok(literal(value)),
            Operand::Pipeline(pipeline) => self.pipeline(pipeline, dot),
        }
    }
}

fn walk_path(mut value: Value, path: &[SmolStr]) -> BatisResult<Value> {
    for name in path {
        value = field(value, name)?;
    }
    Ok(value)
}

/// Field lookup. Missing map keys and fields of null are null; struct fields
/// match exactly first, then ignoring ASCII case.
fn field(receiver: Value, name: &str) -> BatisResult<Value> {
    match receiver {
        Value::Null => Ok(Value::Null),
        Value::Map(mut map) => Ok(map.swap_remove(name).unwrap_or_default()),
        Value::Struct(mut s) => {
            if let Some(value) = s.fields.swap_remove(name) {
                return Ok(value);
            }
            let key = s.fields.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned();
            key.and_then(|k| s.fields.swap_remove(&k)).ok_or_else(|| {
                BatisError::execution(format!("can't evaluate field {} in struct {}", name, s.name))
            })
        }
        other => Err(BatisError::execution(format!(
            "can't evaluate field {} in type {}",
            name,
            other.kind()
        ))),
    }
}

fn literal(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn describe(operand: &Operand) -> String {
    match operand {
        Operand::Field { path, .. } if path.is_empty() => ".".to_string(),
        Operand::Field { path, .. } => format!(".{}", path.join(".")),
        Operand::Variable { name, path, .. } if path.is_empty() => name.to_string(),
        Operand::Variable { name, path, .. } => format!("{}.{}", name, path.join(".")),
        Operand::Function(ident) => ident.to_string(),
        Operand::Literal { value, .. } => literal(value).to_string(),
        Operand::Pipeline(_) => "(pipeline)".to_string(),
    }
}
