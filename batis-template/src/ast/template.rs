//! Compiled template document.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

use super::node::Node;
use super::types::{Ident, Span};

/// Name of the define that carries a document's namespace.
pub const NAMESPACE_DEFINE: &str = "namespace";

/// A `{{define "name"}} ... {{end}}` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Define {
    /// The define name.
    pub name: Ident,
    /// The define body.
    pub body: Vec<Node>,
    /// Source location of the whole block.
    pub span: Span,
}

/// A parsed template: the top-level body plus every named define.
///
/// Templates are immutable once built and can be shared across threads;
/// rendering state lives with the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(skip)]
    source: Arc<str>,
    /// Top-level nodes (defines removed).
    pub root: Vec<Node>,
    /// Named defines in declaration order.
    pub defines: IndexMap<SmolStr, Define>,
}

impl Template {
    /// Create a template from its parts.
    pub fn new(source: Arc<str>, root: Vec<Node>, defines: IndexMap<SmolStr, Define>) -> Self {
        Self {
            source,
            root,
            defines,
        }
    }

    /// The source text the template was parsed from (after trim markers
    /// were applied).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Look up a define by name.
    pub fn define(&self, name: &str) -> Option<&Define> {
        self.defines.get(name)
    }

    /// Names of all defines, in declaration order.
    pub fn define_names(&self) -> impl Iterator<Item = &str> {
        self.defines.keys().map(SmolStr::as_str)
    }

    /// Defines that name statements, i.e. everything except the namespace
    /// define.
    pub fn statements(&self) -> impl Iterator<Item = &Define> {
        self.defines
            .values()
            .filter(|d| d.name.as_str() != NAMESPACE_DEFINE && !d.name.as_str().is_empty())
    }

    /// The namespace define, if the document declares one.
    pub fn namespace(&self) -> Option<&Define> {
        self.defines.get(NAMESPACE_DEFINE)
    }

    /// Whether the top-level body renders only whitespace.
    pub fn root_is_blank(&self) -> bool {
        self.root
            .iter()
            .all(|n| matches!(n, Node::Text(t) if t.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(name: &str) -> Define {
        Define {
            name: Ident::new(name, Span::default()),
            body: vec![Node::Text("SELECT 1".into())],
            span: Span::default(),
        }
    }

    #[test]
    fn test_statements_skip_namespace() {
        let mut defines = IndexMap::new();
        defines.insert(SmolStr::new("namespace"), define("namespace"));
        defines.insert(SmolStr::new("findUser"), define("findUser"));

        let template = Template::new(Arc::from(""), vec![Node::Text("\n  ".into())], defines);

        let names: Vec<_> = template.statements().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["findUser"]);
        assert!(template.namespace().is_some());
        assert!(template.root_is_blank());
    }
}
