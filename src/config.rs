//! Application configuration.
//!
//! Loaded from a YAML, JSON or TOML file chosen by extension. Every key is
//! optional:
//!
//! ```yaml
//! openapi:
//!   title: Pet Store
//!   version: 2.0.0
//! docs:
//!   path: /openapi.yaml
//!   format: yaml
//! error_status: 422
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::hooks::DEFAULT_ERROR_STATUS;
use crate::openapi::{DocFormat, Info};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "BINDERY_CONFIG";

/// Route serving the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub path: String,
    pub format: DocFormat,
}

impl Default for DocsConfig {
    fn default() -> Self {
        DocsConfig {
            path: "/openapi.json".to_string(),
            format: DocFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `info` block of the document.
    pub openapi: Info,
    pub docs: DocsConfig,
    /// Status answered by the default error hook.
    pub error_status: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            openapi: Info::default(),
            docs: DocsConfig::default(),
            error_status: DEFAULT_ERROR_STATUS,
        }
    }
}

impl AppConfig {
    /// Load and check a configuration file.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, unknown extensions, parse errors and
    /// error statuses outside `100..=599`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config: AppConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&raw)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
            "json" => serde_json::from_str(&raw)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
            "toml" => toml::from_str(&raw)
                .with_context(|| format!("invalid TOML config {}", path.display()))?,
            other => bail!(
                "unsupported config extension '{}' for {}",
                other,
                path.display()
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `BINDERY_CONFIG`, or defaults when unset.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if !(100..=599).contains(&self.error_status) {
            bail!("error_status {} is not an HTTP status", self.error_status);
        }
        if !self.docs.path.starts_with('/') {
            bail!("docs.path '{}' must start with '/'", self.docs.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(ext: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            "yaml",
            "openapi:\n  title: Pets\n  version: 2.0.0\ndocs:\n  format: yaml\nerror_status: 422\n",
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.openapi.title, "Pets");
        assert_eq!(config.openapi.version, "2.0.0");
        assert_eq!(config.docs.format, DocFormat::Yaml);
        assert_eq!(config.docs.path, "/openapi.json");
        assert_eq!(config.error_status, 422);
    }

    #[test]
    fn test_load_toml_and_json() {
        let file = write_config("toml", "error_status = 409\n[openapi]\ntitle = \"T\"\n");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.error_status, 409);
        assert_eq!(config.openapi.version, "1.0.0");

        let file = write_config("json", r#"{"docs": {"path": "/spec"}}"#);
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.docs.path, "/spec");
        assert_eq!(config.error_status, 400);
    }

    #[test]
    fn test_rejects_bad_input() {
        let file = write_config("ini", "x=1");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config extension"));

        let file = write_config("yaml", "error_status: 42\n");
        assert!(AppConfig::load(file.path()).is_err());

        let file = write_config("yaml", "docs:\n  format: xml\n");
        assert!(AppConfig::load(file.path()).is_err());
    }
}
