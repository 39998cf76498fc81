//! Driver placeholder styles.
//!
//! A style turns the 1-based position of a bound parameter into the token
//! the driver expects: `?` for MySQL, `$1` for Postgres, `:1` for Oracle.
//! [`PlaceholderStyles`] maps driver names to styles and falls back to `?`
//! for unknown drivers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::error::BatisError;

/// Token generator for a custom style.
pub type TokenFn = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// How a driver spells a positional parameter.
#[derive(Clone, Default)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    #[default]
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `:1`, `:2`, ...
    Colon,
    /// Anything else.
    Custom(TokenFn),
}

impl PlaceholderStyle {
    /// Wrap a custom token function.
    pub fn custom(f: impl Fn(usize) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// The token for the `index`-th bound parameter (1-based).
    pub fn token(&self, index: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", index),
            Self::Colon => format!(":{}", index),
            Self::Custom(f) => f(index),
        }
    }
}

impl fmt::Debug for PlaceholderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Question => write!(f, "Question"),
            Self::Dollar => write!(f, "Dollar"),
            Self::Colon => write!(f, "Colon"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Parses the style names used in configuration files.
impl FromStr for PlaceholderStyle {
    type Err = BatisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "question" | "?" => Ok(Self::Question),
            "dollar" | "$" => Ok(Self::Dollar),
            "colon" | ":" => Ok(Self::Colon),
            other => Err(BatisError::Config(format!(
                "unknown placeholder style `{}` (expected question, dollar or colon)",
                other
            ))),
        }
    }
}

/// Registry of placeholder styles keyed by driver name.
#[derive(Debug)]
pub struct PlaceholderStyles {
    styles: RwLock<HashMap<String, PlaceholderStyle>>,
    generation: AtomicU64,
}

static GLOBAL_STYLES: LazyLock<PlaceholderStyles> = LazyLock::new(PlaceholderStyles::new);

impl Default for PlaceholderStyles {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderStyles {
    /// Create a registry with the built-in drivers: `mysql`, `postgres`,
    /// `oci8` and `adodb`.
    pub fn new() -> Self {
        let styles = HashMap::from([
            ("mysql".to_string(), PlaceholderStyle::Question),
            ("postgres".to_string(), PlaceholderStyle::Dollar),
            ("oci8".to_string(), PlaceholderStyle::Colon),
            ("adodb".to_string(), PlaceholderStyle::Question),
        ]);
        Self {
            styles: RwLock::new(styles),
            generation: AtomicU64::new(0),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static PlaceholderStyles {
        &GLOBAL_STYLES
    }

    /// Register (or replace) the style for a driver. Returns whether the
    /// driver already had a style.
    pub fn register(&self, driver: impl Into<String>, style: PlaceholderStyle) -> bool {
        let driver = driver.into();
        tracing::debug!(driver = %driver, style = ?style, "registering placeholder style");
        let existed = self.styles.write().insert(driver, style).is_some();
        self.generation.fetch_add(1, Ordering::Release);
        existed
    }

    /// Counter bumped by every [`register`](Self::register). Anything derived
    /// from a selected style is stale once this changes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Look up the style for a driver.
    pub fn lookup(&self, driver: &str) -> Option<PlaceholderStyle> {
        self.styles.read().get(driver).cloned()
    }

    /// The style for a driver, or `?` if the driver is unknown.
    pub fn select(&self, driver: &str) -> PlaceholderStyle {
        self.lookup(driver).unwrap_or_default()
    }

    /// Registered driver names, sorted.
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<_> = self.styles.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokens() {
        assert_eq!(PlaceholderStyle::Question.token(3), "?");
        assert_eq!(PlaceholderStyle::Dollar.token(1), "$1");
        assert_eq!(PlaceholderStyle::Dollar.token(12), "$12");
        assert_eq!(PlaceholderStyle::Colon.token(2), ":2");
        assert_eq!(PlaceholderStyle::custom(|i| format!("@p{}", i)).token(4), "@p4");
    }

    #[test]
    fn test_builtin_drivers() {
        let styles = PlaceholderStyles::new();
        assert_eq!(styles.select("mysql").token(1), "?");
        assert_eq!(styles.select("postgres").token(1), "$1");
        assert_eq!(styles.select("oci8").token(1), ":1");
        assert_eq!(styles.select("adodb").token(1), "?");
        assert_eq!(styles.drivers(), vec!["adodb", "mysql", "oci8", "postgres"]);
    }

    #[test]
    fn test_unknown_driver_falls_back() {
        let styles = PlaceholderStyles::new();
        assert!(styles.lookup("sqlite3").is_none());
        assert_eq!(styles.select("sqlite3").token(7), "?");
    }

    #[test]
    fn test_register_reports_existing() {
        let styles = PlaceholderStyles::new();
        assert!(!styles.register("mssql", PlaceholderStyle::custom(|i| format!("@p{}", i))));
        assert_eq!(styles.select("mssql").token(2), "@p2");

        assert!(styles.register("mysql", PlaceholderStyle::Dollar));
        assert_eq!(styles.select("mysql").token(1), "$1");
    }

    #[test]
    fn test_register_bumps_generation() {
        let styles = PlaceholderStyles::new();
        assert_eq!(styles.generation(), 0);
        styles.register("sqlserver", PlaceholderStyle::Dollar);
        styles.register("sqlserver", PlaceholderStyle::Colon);
        assert_eq!(styles.generation(), 2);
    }

    #[test]
    fn test_isolated_from_global() {
        let styles = PlaceholderStyles::new();
        styles.register("isolated-driver", PlaceholderStyle::Colon);
        assert!(PlaceholderStyles::global().lookup("isolated-driver").is_none());
    }

    #[test]
    fn test_parse_style_name() {
        assert!(matches!("dollar".parse::<PlaceholderStyle>(), Ok(PlaceholderStyle::Dollar)));
        assert!(matches!("Colon".parse::<PlaceholderStyle>(), Ok(PlaceholderStyle::Colon)));
        assert!("at".parse::<PlaceholderStyle>().is_err());
    }
}
