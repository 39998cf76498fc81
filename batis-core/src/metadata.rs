//! Parse results.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// The statement kind, detected from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `SELECT ...`
    Select,
    /// `INSERT ...`
    Insert,
    /// `UPDATE ...`
    Update,
    /// `DELETE ...`
    Delete,
    /// Anything else, including statements shorter than a keyword.
    Other,
}

impl Action {
    /// Detect the action from the first six characters of the trimmed
    /// statement, case-insensitively. No further SQL analysis is done, so
    /// `WITH ... SELECT` or a leading comment yields [`Action::Other`].
    pub fn detect(sql: &str) -> Self {
        let head: String = sql.trim().chars().take(6).collect();
        match head.to_lowercase().as_str() {
            "select" => Self::Select,
            "insert" => Self::Insert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Other,
        }
    }

    /// Lowercase keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement ready for execution: driver-specific SQL plus the values to
/// bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Statement kind.
    pub action: Action,
    /// SQL with driver placeholder tokens.
    pub prepared_sql: String,
    /// Placeholder names in the order they appeared, bound and raw alike.
    pub vars: Vec<String>,
    /// Bound values, one per placeholder token in `prepared_sql`.
    pub params: Vec<Value>,
}

impl Metadata {
    /// Build metadata, detecting the action from `prepared_sql`.
    pub fn new(prepared_sql: String, vars: Vec<String>, params: Vec<Value>) -> Self {
        Self {
            action: Action::detect(&prepared_sql),
            prepared_sql,
            vars,
            params,
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} [", self.action, self.prepared_sql)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}
