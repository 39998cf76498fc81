//! Configuration file parsing for `batis.toml`.
//!
//! ```toml
//! [driver]
//! name = "postgres"
//!
//! [placeholders]
//! mssql = "question"
//!
//! [cache]
//! metadata = true
//!
//! [mapper]
//! default_format = "tpl"
//! raw_sql_fallback = false
//!
//! [debug]
//! log_sql = true
//!
//! [environments.test.driver]
//! name = "mysql"
//! ```
//!
//! Values may reference environment variables as `${VAR_NAME}`; unset
//! variables are left as written.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{BatisError, BatisResult};
use crate::format::MapperFormat;
use crate::placeholder::PlaceholderStyle;

/// Main configuration structure for `batis.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatisConfig {
    /// Driver selection.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Extra placeholder styles by driver name.
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,

    /// Metadata cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Statement registration settings.
    #[serde(default)]
    pub mapper: MapperConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl BatisConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> BatisResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BatisError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        content.parse()
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(name) = overrides.driver.and_then(|d| d.name) {
                self.driver.name = name;
            }
            if let Some(metadata) = overrides.cache.and_then(|c| c.metadata) {
                self.cache.metadata = metadata;
            }
            if let Some(log_sql) = overrides.debug.and_then(|d| d.log_sql) {
                self.debug.log_sql = log_sql;
            }
        }
        self
    }

    /// The `[placeholders]` table as styles.
    pub fn placeholder_styles(&self) -> BatisResult<Vec<(String, PlaceholderStyle)>> {
        self.placeholders
            .iter()
            .map(|(driver, style)| {
                let style = style.parse::<PlaceholderStyle>().map_err(|_| {
                    BatisError::Config(format!(
                        "unknown placeholder style `{}` for driver `{}`",
                        style, driver
                    ))
                })?;
                Ok((driver.clone(), style))
            })
            .collect()
    }
}

impl FromStr for BatisConfig {
    type Err = BatisError;

    /// Parse configuration from a TOML string.
    fn from_str(content: &str) -> BatisResult<Self> {
        let expanded = expand_env_vars(content)?;
        Ok(toml::from_str(&expanded)?)
    }
}

/// Driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Driver name used to pick the placeholder style.
    #[serde(default = "default_driver")]
    pub name: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_driver(),
        }
    }
}

fn default_driver() -> String {
    "mysql".to_string()
}

/// Metadata cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Reuse parsed metadata for raw statements.
    #[serde(default)]
    pub metadata: bool,
}

/// Statement registration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// Format used by `register_sql`.
    #[serde(default = "default_format")]
    pub default_format: MapperFormat,

    /// Treat an unregistered SQL id as raw statement text.
    #[serde(default = "default_true")]
    pub raw_sql_fallback: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            raw_sql_fallback: true,
        }
    }
}

fn default_format() -> MapperFormat {
    MapperFormat::Statement
}

fn default_true() -> bool {
    true
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every prepared statement at debug level.
    #[serde(default)]
    pub log_sql: bool,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Driver overrides.
    pub driver: Option<DriverOverride>,

    /// Cache overrides.
    pub cache: Option<CacheOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Driver configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DriverOverride {
    /// Override the driver name.
    pub name: Option<String>,
}

/// Cache configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheOverride {
    /// Override metadata caching.
    pub metadata: Option<bool>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_sql.
    pub log_sql: Option<bool>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> BatisResult<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BatisError::Config(e.to_string()))?;
    let expanded = re.replace_all(content, |caps: &Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = BatisConfig::default();
        assert_eq!(config.driver.name, "mysql");
        assert_eq!(config.mapper.default_format, MapperFormat::Statement);
        assert!(config.mapper.raw_sql_fallback);
        assert!(!config.cache.metadata);
        assert!(!config.debug.log_sql);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [driver]
            name = "postgres"

            [placeholders]
            mssql = "question"
            firebird = "?"

            [cache]
            metadata = true

            [mapper]
            default_format = "tpl"
            raw_sql_fallback = false

            [debug]
            log_sql = true
        "#;

        let config: BatisConfig = toml.parse().unwrap();
        assert_eq!(config.driver.name, "postgres");
        assert!(config.cache.metadata);
        assert_eq!(config.mapper.default_format, MapperFormat::Template);
        assert!(!config.mapper.raw_sql_fallback);

        let styles = config.placeholder_styles().unwrap();
        let drivers: Vec<_> = styles.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(drivers, vec!["firebird", "mssql"]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "[driver]\nnmae = \"mysql\"".parse::<BatisConfig>().unwrap_err();
        assert!(matches!(err, BatisError::Toml(_)));
    }

    #[test]
    fn test_bad_placeholder_style() {
        let config: BatisConfig = "[placeholders]\nx = \"percent\"".parse().unwrap();
        let err = config.placeholder_styles().unwrap_err();
        assert!(matches!(err, BatisError::Config(_)));
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [driver]
            name = "postgres"

            [environments.test.driver]
            name = "mysql"

            [environments.test.debug]
            log_sql = true
        "#;

        let config = toml.parse::<BatisConfig>().unwrap().with_environment("test");
        assert_eq!(config.driver.name, "mysql");
        assert!(config.debug.log_sql);
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("BATIS_TEST_DRIVER", "oci8");
        }
        let expanded = expand_env_vars("name = \"${BATIS_TEST_DRIVER}\" # ${BATIS_TEST_UNSET}").unwrap();
        assert_eq!(expanded, "name = \"oci8\" # ${BATIS_TEST_UNSET}");
        unsafe {
            std::env::remove_var("BATIS_TEST_DRIVER");
        }
    }

    #[test]
    fn test_from_file_missing() {
        let err = BatisConfig::from_file("/nonexistent/batis.toml").unwrap_err();
        assert!(matches!(err, BatisError::Io { .. }));
    }
}
