//! Mapper formats.
//!
//! A format tag says how statement text registered with a manager is
//! compiled: `"sql"` is a raw statement, `"tpl"` a dynamic template.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BatisError, BatisResult};
use crate::parser::Parser;

/// How statement text is compiled into a [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapperFormat {
    /// `#{}`/`${}` placeholders.
    #[serde(rename = "sql")]
    Statement,
    /// `{{ ... }}` templates.
    #[serde(rename = "tpl")]
    Template,
}

impl MapperFormat {
    /// Compile `text` in this format.
    pub fn compile(&self, text: &str) -> BatisResult<Parser> {
        match self {
            Self::Statement => Ok(Parser::statement(text)),
            Self::Template => Parser::template(text),
        }
    }

    /// The built-in tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Statement => "sql",
            Self::Template => "tpl",
        }
    }
}

impl fmt::Display for MapperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MapperFormat {
    type Err = BatisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sql" => Ok(Self::Statement),
            "tpl" => Ok(Self::Template),
            other => Err(BatisError::Config(format!("unknown mapper format `{}`", other))),
        }
    }
}

/// Format tags known to a manager.
#[derive(Debug)]
pub struct FormatRegistry {
    formats: RwLock<HashMap<String, MapperFormat>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a registry with the `sql` and `tpl` tags.
    pub fn new() -> Self {
        let formats = [MapperFormat::Statement, MapperFormat::Template]
            .into_iter()
            .map(|f| (f.tag().to_string(), f))
            .collect();
        Self {
            formats: RwLock::new(formats),
        }
    }

    /// Claim `tag` for `format`. A tag can only be claimed once.
    pub fn register(&self, tag: impl Into<String>, format: MapperFormat) -> BatisResult<()> {
        let tag = tag.into();
        let mut formats = self.formats.write();
        if formats.contains_key(&tag) {
            return Err(BatisError::DuplicateManagerFormat { format: tag });
        }
        debug!(tag = %tag, format = %format, "registered mapper format");
        formats.insert(tag, format);
        Ok(())
    }

    /// Look up a tag.
    pub fn get(&self, tag: &str) -> Option<MapperFormat> {
        self.formats.read().get(tag).copied()
    }

    /// Compile `text` with the format registered under `tag`.
    pub fn compile(&self, tag: &str, text: &str) -> BatisResult<Parser> {
        let format = self
            .get(tag)
            .ok_or_else(|| BatisError::Config(format!("unknown mapper format `{}`", tag)))?;
        format.compile(text)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.formats.read().keys().cloned().collect();
        tags.sort();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_tags() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.tags(), vec!["sql", "tpl"]);
        assert_eq!(registry.get("tpl"), Some(MapperFormat::Template));
        assert!(registry.compile("sql", "SELECT 1").unwrap().is_statement());
        assert!(!registry.compile("tpl", "SELECT 1").unwrap().is_statement());
    }

    #[test]
    fn test_duplicate_tag() {
        let registry = FormatRegistry::new();
        registry.register("mapper", MapperFormat::Template).unwrap();

        let err = registry.register("sql", MapperFormat::Template).unwrap_err();
        assert!(matches!(err, BatisError::DuplicateManagerFormat { ref format } if format == "sql"));
        assert_eq!(registry.get("sql"), Some(MapperFormat::Statement));
    }

    #[test]
    fn test_unknown_tag() {
        let registry = FormatRegistry::new();
        assert!(matches!(registry.compile("xml", "SELECT 1"), Err(BatisError::Config(_))));
        assert!("xml".parse::<MapperFormat>().is_err());
        assert_eq!("tpl".parse::<MapperFormat>().unwrap(), MapperFormat::Template);
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&MapperFormat::Statement).unwrap();
        assert_eq!(json, r#""sql""#);
        let format: MapperFormat = serde_json::from_str(r#""tpl""#).unwrap();
        assert_eq!(format, MapperFormat::Template);
    }
}
