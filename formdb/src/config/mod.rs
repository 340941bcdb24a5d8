use crate::error::{FormDbError, Result};
use crate::naming::ColumnNaming;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compiler settings, usually read from a YAML file. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub naming: NamingConfig,
    pub mysql: MySqlConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub columns: ColumnNaming,
    /// Longest identifier allowed before hashed shortening kicks in
    pub max_identifier_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlConfig {
    pub engine: String,
    pub charset: String,
    pub collation: String,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        MySqlConfig {
            engine: "innodb".into(),
            charset: "utf8mb4".into(),
            collation: "utf8mb4_unicode_ci".into(),
        }
    }
}

/// Load a config file
pub fn load_config(path: &Path) -> Result<CompilerConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse a config YAML string. An empty document yields the defaults.
pub fn parse_config_str(content: &str) -> Result<CompilerConfig> {
    if content.trim().is_empty() {
        return Ok(CompilerConfig::default());
    }

    let config: CompilerConfig = serde_yaml::from_str(content)?;
    let mysql = &config.mysql;
    if mysql.engine.is_empty() || mysql.charset.is_empty() || mysql.collation.is_empty() {
        return Err(FormDbError::Config(
            "mysql engine, charset and collation must not be empty".into(),
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.naming.columns, ColumnNaming::Raw);
        assert_eq!(config.mysql.engine, "innodb");
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config_str(
            r#"
naming:
  columns: underscore
  max_identifier_len: 64
"#,
        )
        .unwrap();
        assert_eq!(config.naming.columns, ColumnNaming::Underscore);
        assert_eq!(config.naming.max_identifier_len, Some(64));
        assert_eq!(config.mysql, MySqlConfig::default());
    }

    #[test]
    fn test_mysql_overrides() {
        let config = parse_config_str(
            r#"
mysql:
  charset: latin1
  collation: latin1_swedish_ci
"#,
        )
        .unwrap();
        assert_eq!(config.mysql.engine, "innodb");
        assert_eq!(config.mysql.charset, "latin1");
    }

    #[test]
    fn test_unknown_column_policy_is_error() {
        assert!(parse_config_str("naming: { columns: camel }").is_err());
    }

    #[test]
    fn test_blank_engine_is_error() {
        let err = parse_config_str("mysql: { engine: '' }").unwrap_err();
        assert!(matches!(err, FormDbError::Config(_)));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formdb.yaml");
        std::fs::write(&path, "naming: { columns: underscore }\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.naming.columns, ColumnNaming::Underscore);
    }
}
