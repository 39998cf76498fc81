//! Pest grammar parser for batis templates.

use pest_derive::Parser;

/// The batis template parser.
#[derive(Parser)]
#[grammar = "parser/template.pest"]
pub struct TemplateGrammar;
