//! Configuration Loader
//!
//! Layers a TOML configuration file with environment overrides and validates
//! the result. Environment overrides use the `PIPELINE_MONITOR__` prefix with
//! `__` separating nested keys, e.g. `PIPELINE_MONITOR__BREAKER__TIMEOUT_MS=8000`.

use super::error::{ConfigResult, ConfigurationError};
use super::MonitorConfig;
use ::config::builder::{ConfigBuilder, DefaultState};
use ::config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "PIPELINE_MONITOR_CONFIG";

/// Configuration file used when `PIPELINE_MONITOR_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline-monitor.toml";

const ENV_PREFIX: &str = "PIPELINE_MONITOR";

/// Loaded and validated configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: MonitorConfig,
    source: String,
}

impl ConfigManager {
    /// Load configuration from `PIPELINE_MONITOR_CONFIG` or the default path
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_path(path: &Path) -> ConfigResult<Arc<ConfigManager>> {
        if !path.is_file() {
            return Err(ConfigurationError::config_file_not_found(path));
        }

        debug!(path = %path.display(), "Loading monitor configuration");

        let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
        Self::build(builder, path.display().to_string())
    }

    /// Load configuration from TOML text, still applying environment overrides
    pub fn load_from_toml_str(contents: &str) -> ConfigResult<Arc<ConfigManager>> {
        let builder = Config::builder().add_source(File::from_str(contents, FileFormat::Toml));
        Self::build(builder, "inline TOML".to_string())
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        source: String,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::parse_error(source.clone(), e))?;

        let config: MonitorConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::parse_error(source.clone(), e))?;

        config.validate()?;

        info!(
            source = %source,
            pipeline = %config.pipeline_name,
            checks = config.checks.len(),
            store_backend = ?config.store.backend,
            alerts_enabled = config.notifier.webhook_url.is_some(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager { config, source }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Where the configuration came from
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CheckKind, StoreBackend};
    use std::io::Write;

    const SAMPLE: &str = r#"
pipeline_name = "ess-publishing"
health_interval_ms = 2000
warm_up_url = "https://validator.example.com/warm"

[breaker]
timeout_ms = 5000
error_threshold_percentage = 50
volume_threshold = 5
reset_timeout_ms = 15000

[[checks]]
name = "ValidatorAPI"
kind = "http"
target = "https://validator.example.com/health"
timeout_ms = 4000

[[checks]]
name = "DBWrite"
kind = "db_write"
target = "pipeline_probe"
"#;

    #[test]
    fn test_load_from_toml_str() {
        let manager = ConfigManager::load_from_toml_str(SAMPLE).unwrap();
        let config = manager.config();

        assert_eq!(config.pipeline_name, "ess-publishing");
        assert_eq!(config.health_interval_ms, 2000);
        assert_eq!(config.checks.len(), 2);
        assert_eq!(config.checks[1].kind, CheckKind::DbWrite);
        assert_eq!(config.checks[1].timeout_ms, 3_000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.audit_ttl_days, 7);
        assert_eq!(manager.source(), "inline TOML");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let manager = ConfigManager::load_from_path(file.path()).unwrap();
        assert_eq!(
            manager.config().warm_up_url.as_deref(),
            Some("https://validator.example.com/warm")
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = ConfigManager::load_from_path(Path::new("/nonexistent/pipeline-monitor.toml"));
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigFileNotFound { .. })
        ));
    }

    #[test]
    fn test_oversized_audit_ttl_is_rejected() {
        let contents = format!("audit_ttl_days = 4000000000\n{SAMPLE}");
        let result = ConfigManager::load_from_toml_str(&contents);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_config_without_checks_fails_validation() {
        let result = ConfigManager::load_from_toml_str("pipeline_name = \"ess-publishing\"\n");
        assert!(matches!(
            result,
            Err(ConfigurationError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = ConfigManager::load_from_toml_str("pipeline_name = [unterminated");
        assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
    }
}
