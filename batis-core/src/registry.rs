//! SQL id → parser registry.
//!
//! ```rust
//! use batis_core::parser::Parser;
//! use batis_core::registry::ParserRegistry;
//!
//! let registry = ParserRegistry::new();
//! registry.add("user.find", Parser::statement("SELECT * FROM user WHERE id = #{0}")).unwrap();
//!
//! assert!(registry.find("user.find").is_some());
//! assert!(registry.add("user.find", Parser::statement("SELECT 1")).is_err());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{BatisError, BatisResult};
use crate::parser::Parser;

/// The unlocked table behind a [`ParserRegistry`], handed to
/// [`ParserRegistry::with_lock`] batches.
#[derive(Debug, Default)]
pub struct ParserTable {
    parsers: HashMap<String, Arc<Parser>>,
}

impl ParserTable {
    /// Register a parser. An existing id is left untouched.
    pub fn add(&mut self, sql_id: impl Into<String>, parser: impl Into<Arc<Parser>>) -> BatisResult<()> {
        let sql_id = sql_id.into();
        if self.parsers.contains_key(&sql_id) {
            warn!(sql_id = %sql_id, "sql id already registered");
            return Err(BatisError::duplicate_sql_id(sql_id));
        }
        debug!(sql_id = %sql_id, "registered parser");
        self.parsers.insert(sql_id, parser.into());
        Ok(())
    }

    /// Remove a parser. Returns whether the id was registered.
    pub fn remove(&mut self, sql_id: &str) -> bool {
        self.parsers.remove(sql_id).is_some()
    }

    /// Look up a parser.
    pub fn find(&self, sql_id: &str) -> Option<Arc<Parser>> {
        self.parsers.get(sql_id).cloned()
    }

    /// Check if an id is registered.
    pub fn contains(&self, sql_id: &str) -> bool {
        self.parsers.contains_key(sql_id)
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.parsers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// A thread-safe parser registry.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    table: RwLock<ParserTable>,
}

static GLOBAL_REGISTRY: LazyLock<ParserRegistry> = LazyLock::new(ParserRegistry::new);

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static ParserRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a parser; fails with [`BatisError::DuplicateSqlId`] if the id
    /// is taken.
    pub fn add(&self, sql_id: impl Into<String>, parser: impl Into<Arc<Parser>>) -> BatisResult<()> {
        self.table.write().add(sql_id, parser)
    }

    /// Remove a parser. Returns whether the id was registered.
    pub fn remove(&self, sql_id: &str) -> bool {
        self.table.write().remove(sql_id)
    }

    /// Look up a parser.
    pub fn find(&self, sql_id: &str) -> Option<Arc<Parser>> {
        self.table.read().find(sql_id)
    }

    /// Check if an id is registered.
    pub fn contains(&self, sql_id: &str) -> bool {
        self.table.read().contains(sql_id)
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.table.read().ids()
    }

    /// Return the parser for `sql_id`, compiling and storing `text` with
    /// `compile` if the id is new.
    ///
    /// If the id is already registered the error is
    /// [`BatisError::DuplicateSqlId`] carrying the existing parser, so
    /// callers can tell a lost race from a real conflict. The compile step
    /// runs under the write lock, so `compile` must not use this registry.
    pub fn load_or_create<F>(&self, sql_id: &str, text: &str, compile: F) -> BatisResult<Arc<Parser>>
    where
        F: FnOnce(&str) -> BatisResult<Parser>,
    {
        if let Some(existing) = self.find(sql_id) {
            return Err(duplicate_with(sql_id, existing));
        }

        let mut table = self.table.write();
        if let Some(existing) = table.find(sql_id) {
            return Err(duplicate_with(sql_id, existing));
        }

        let parser = Arc::new(compile(text)?);
        table.add(sql_id, Arc::clone(&parser))?;
        Ok(parser)
    }

    /// Run several operations under one exclusive lock.
    ///
    /// This is mutual exclusion only: if `f` fails halfway, whatever it
    /// already registered stays registered. `f` must not call back into
    /// this registry.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut ParserTable) -> BatisResult<T>) -> BatisResult<T> {
        f(&mut self.table.write())
    }
}

fn duplicate_with(sql_id: &str, existing: Arc<Parser>) -> BatisError {
    BatisError::DuplicateSqlId {
        sql_id: sql_id.to_string(),
        existing: Some(existing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sql_of(parser: &Parser) -> &str {
        match parser {
            Parser::Statement(p) => p.sql(),
            Parser::Template(_) => "",
        }
    }

    #[test]
    fn test_add_find_remove() {
        let registry = ParserRegistry::new();
        assert!(registry.is_empty());

        registry.add("a", Parser::statement("SELECT 1")).unwrap();
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(sql_of(&registry.find("a").unwrap()), "SELECT 1");

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.find("a").is_none());
    }

    #[test]
    fn test_duplicate_add_keeps_first() {
        let registry = ParserRegistry::new();
        registry.add("a", Parser::statement("SELECT 1")).unwrap();

        let err = registry.add("a", Parser::statement("SELECT 2")).unwrap_err();
        assert!(matches!(err, BatisError::DuplicateSqlId { ref sql_id, existing: None } if sql_id == "a"));
        assert_eq!(sql_of(&registry.find("a").unwrap()), "SELECT 1");
    }

    #[test]
    fn test_load_or_create() {
        let registry = ParserRegistry::new();
        let compile = |text: &str| -> BatisResult<Parser> { Ok(Parser::statement(text)) };

        let created = registry.load_or_create("q", "SELECT 1", compile).unwrap();
        assert_eq!(sql_of(&created), "SELECT 1");

        let err = registry.load_or_create("q", "SELECT 2", compile).unwrap_err();
        let existing = err.existing_parser().expect("existing parser");
        assert!(Arc::ptr_eq(existing, &created));
    }

    #[test]
    fn test_load_or_create_compile_error_stores_nothing() {
        let registry = ParserRegistry::new();
        let result = registry.load_or_create("bad", "{{nope}}", Parser::template);
        assert!(matches!(result, Err(BatisError::TemplateCompile(_))));
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn test_with_lock_is_not_atomic() {
        let registry = ParserRegistry::new();
        registry.add("b", Parser::statement("SELECT 0")).unwrap();

        let result = registry.with_lock(|table| {
            table.add("a", Parser::statement("SELECT 1"))?;
            table.add("b", Parser::statement("SELECT 2"))?;
            table.add("c", Parser::statement("SELECT 3"))
        });

        assert!(result.unwrap_err().is_duplicate());
        assert_eq!(registry.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_load_or_create_single_winner() {
        let registry = Arc::new(ParserRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .load_or_create("race", "SELECT 1", |t| Ok(Parser::statement(t)))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }
}
