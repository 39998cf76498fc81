//! Abstract Syntax Tree (AST) types for batis templates.

mod node;
mod template;
mod types;

pub use node::*;
pub use template::*;
pub use types::*;
