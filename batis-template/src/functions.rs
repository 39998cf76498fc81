//! Names of the functions callable from templates.
//!
//! The fragment builders (`set`, `where`, `arg`, `add`) are the SQL-specific
//! part of the dialect; the rest are the usual comparison and logic helpers.

/// Conditionally append a `SET column=value` clause.
pub const SET: &str = "set";
/// Conditionally append a `WHERE` / connector clause.
pub const WHERE: &str = "where";
/// Bind a value as the next driver placeholder.
pub const ARG: &str = "arg";
/// Integer addition.
pub const ADD: &str = "add";

/// The SQL fragment builders.
pub const FRAGMENT_BUILDERS: [&str; 4] = [SET, WHERE, ARG, ADD];

/// General-purpose helpers.
pub const BUILTINS: [&str; 12] = [
    "and", "or", "not", "eq", "ne", "lt", "le", "gt", "ge", "len", "index", "print",
];

/// Check whether `name` is a function templates may call.
pub fn is_known(name: &str) -> bool {
    FRAGMENT_BUILDERS.contains(&name) || BUILTINS.contains(&name)
}
