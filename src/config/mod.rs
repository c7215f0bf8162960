//! # Pipeline Monitor Configuration
//!
//! Explicit configuration constructed once at process start and handed to each
//! component constructor. Loading is layered (TOML file, then environment
//! overrides) by [`ConfigManager`]; [`MonitorConfig::validate`] rejects anything
//! the monitor cannot safely run with.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_monitor::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! println!("monitoring {} with {} checks", config.pipeline_name, config.checks.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub use crate::health::{CheckDefinition, CheckKind};
pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Name of the single pipeline being monitored
    pub pipeline_name: String,

    /// Port the API layer listens on
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Interval between scheduled breaker invocations
    #[serde(default = "defaults::health_interval_ms")]
    pub health_interval_ms: u64,

    /// Circuit breaker tuning
    #[serde(default)]
    pub breaker: BreakerSettings,

    /// Ordered, fixed set of health checks
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,

    /// Optional dependency primed before a recovery attempt
    #[serde(default)]
    pub warm_up_url: Option<String>,

    /// Advisory retention for audit records
    #[serde(default = "defaults::audit_ttl_days")]
    pub audit_ttl_days: u32,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Circuit breaker tuning, mirroring the classic options of the wrapped call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerSettings {
    /// Upper bound for one aggregator invocation
    #[serde(default = "defaults::breaker_timeout_ms")]
    pub timeout_ms: u64,

    /// Failure percentage (1-100) that opens the circuit
    #[serde(default = "defaults::error_threshold_percentage")]
    pub error_threshold_percentage: u8,

    /// Minimum outcomes in the rolling window before the rate is evaluated
    #[serde(default = "defaults::volume_threshold")]
    pub volume_threshold: u32,

    /// Delay before an open circuit allows a trial call
    #[serde(default = "defaults::reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    /// Age limit for outcomes kept in the rolling window. When unset it is
    /// derived from the health interval; see [`MonitorConfig::min_rolling_window_ms`].
    #[serde(default)]
    pub rolling_window_ms: Option<u64>,

    /// Hard cap on outcomes kept in the rolling window
    #[serde(default = "defaults::max_window_samples")]
    pub max_window_samples: usize,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::breaker_timeout_ms(),
            error_threshold_percentage: defaults::error_threshold_percentage(),
            volume_threshold: defaults::volume_threshold(),
            reset_timeout_ms: defaults::reset_timeout_ms(),
            rolling_window_ms: None,
            max_window_samples: defaults::max_window_samples(),
        }
    }
}

/// Which implementation backs the status and audit stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Required when `backend = "postgres"`
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    #[serde(default = "defaults::status_table")]
    pub status_table: String,

    #[serde(default = "defaults::audit_table")]
    pub audit_table: String,

    /// Bound for one status write or audit append made on a breaker transition
    #[serde(default = "defaults::store_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
            max_connections: defaults::max_connections(),
            status_table: defaults::status_table(),
            audit_table: defaults::audit_table(),
            write_timeout_ms: defaults::store_write_timeout_ms(),
        }
    }
}

/// Alert channel settings. Without a webhook, alerts are logged and skipped.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "defaults::notifier_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence when set
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: LogFormat,
}

mod defaults {
    pub fn port() -> u16 {
        8080
    }
    pub fn health_interval_ms() -> u64 {
        10_000
    }
    pub fn audit_ttl_days() -> u32 {
        7
    }
    pub fn breaker_timeout_ms() -> u64 {
        5_000
    }
    pub fn error_threshold_percentage() -> u8 {
        50
    }
    pub fn volume_threshold() -> u32 {
        5
    }
    pub fn reset_timeout_ms() -> u64 {
        15_000
    }
    pub fn max_window_samples() -> usize {
        1_000
    }
    pub fn max_connections() -> u32 {
        5
    }
    pub fn status_table() -> String {
        "pipeline_status".to_string()
    }
    pub fn audit_table() -> String {
        "pipeline_audit".to_string()
    }
    pub fn notifier_timeout_ms() -> u64 {
        5_000
    }
    pub fn store_write_timeout_ms() -> u64 {
        crate::constants::DEFAULT_SINK_TIMEOUT_MS
    }
}

/// Upper bound for `audit_ttl_days`, roughly one century
pub const MAX_AUDIT_TTL_DAYS: u32 = 36_500;

/// True for names safe to interpolate into SQL as a table identifier
pub(crate) fn is_valid_table_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl MonitorConfig {
    /// Minimal configuration for a pipeline; callers add checks.
    pub fn for_pipeline(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            port: defaults::port(),
            health_interval_ms: defaults::health_interval_ms(),
            breaker: BreakerSettings::default(),
            checks: Vec::new(),
            warm_up_url: None,
            audit_ttl_days: defaults::audit_ttl_days(),
            store: StoreConfig::default(),
            notifier: NotifierConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    /// Shortest rolling window that still holds `volume_threshold` scheduled
    /// cycles, each finishing up to one breaker timeout after its tick
    pub fn min_rolling_window_ms(&self) -> u64 {
        self.health_interval_ms
            .saturating_mul(u64::from(self.breaker.volume_threshold))
            .saturating_add(self.breaker.timeout_ms)
    }

    /// Configured rolling window, or the minimum derived from the schedule
    pub fn rolling_window_ms(&self) -> u64 {
        self.breaker
            .rolling_window_ms
            .unwrap_or_else(|| self.min_rolling_window_ms())
    }

    /// Breaker settings in the resilience module's format
    pub fn breaker_config(&self) -> crate::resilience::CircuitBreakerConfig {
        let breaker = &self.breaker;
        crate::resilience::CircuitBreakerConfig {
            timeout: Duration::from_millis(breaker.timeout_ms),
            error_threshold_percentage: breaker.error_threshold_percentage,
            volume_threshold: breaker.volume_threshold,
            reset_timeout: Duration::from_millis(breaker.reset_timeout_ms),
            rolling_window: Duration::from_millis(self.rolling_window_ms()),
            max_window_samples: breaker.max_window_samples,
        }
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pipeline_name.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "pipeline_name",
                "monitor configuration",
            ));
        }

        if self.health_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "health_interval_ms",
                "0",
                "must be greater than 0",
            ));
        }

        if !(1..=MAX_AUDIT_TTL_DAYS).contains(&self.audit_ttl_days) {
            return Err(ConfigurationError::invalid_value(
                "audit_ttl_days",
                self.audit_ttl_days.to_string(),
                format!("must be between 1 and {MAX_AUDIT_TTL_DAYS}"),
            ));
        }

        self.validate_breaker()?;
        self.validate_checks()?;
        self.validate_store()?;

        Ok(())
    }

    fn validate_breaker(&self) -> ConfigResult<()> {
        let breaker = &self.breaker;

        if breaker.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "breaker.timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if !(1..=100).contains(&breaker.error_threshold_percentage) {
            return Err(ConfigurationError::invalid_value(
                "breaker.error_threshold_percentage",
                breaker.error_threshold_percentage.to_string(),
                "must be between 1 and 100",
            ));
        }
        if breaker.volume_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "breaker.volume_threshold",
                "0",
                "must be greater than 0",
            ));
        }
        if breaker.reset_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "breaker.reset_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if let Some(window_ms) = breaker.rolling_window_ms {
            let min_ms = self.min_rolling_window_ms();
            if window_ms < min_ms {
                return Err(ConfigurationError::validation_error(format!(
                    "breaker.rolling_window_ms ({window_ms}) must be at least \
                     health_interval_ms * breaker.volume_threshold + breaker.timeout_ms ({min_ms})"
                )));
            }
        }
        if breaker.max_window_samples < breaker.volume_threshold as usize {
            return Err(ConfigurationError::validation_error(format!(
                "breaker.max_window_samples ({}) must be at least breaker.volume_threshold ({})",
                breaker.max_window_samples, breaker.volume_threshold
            )));
        }

        Ok(())
    }

    fn validate_checks(&self) -> ConfigResult<()> {
        if self.checks.is_empty() {
            return Err(ConfigurationError::validation_error(
                "No valid health checks configured",
            ));
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            let context = format!("check '{}'", check.name);

            if check.name.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "name",
                    "check definition",
                ));
            }
            if !seen.insert(check.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "checks.name",
                    check.name.clone(),
                    "check names must be unique",
                ));
            }
            if check.target.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field("target", context));
            }
            if check.timeout_ms == 0 {
                return Err(ConfigurationError::invalid_value(
                    "timeout_ms",
                    "0",
                    format!("{context} must have a positive timeout"),
                ));
            }
            // An aggregation must be able to outlive its slowest probe
            if check.timeout_ms > self.breaker.timeout_ms {
                return Err(ConfigurationError::validation_error(format!(
                    "{context} timeout ({}ms) exceeds breaker.timeout_ms ({}ms)",
                    check.timeout_ms, self.breaker.timeout_ms
                )));
            }

            match check.kind {
                CheckKind::Http => {
                    if reqwest::Method::from_bytes(check.method.as_bytes()).is_err() {
                        return Err(ConfigurationError::invalid_value(
                            "method",
                            check.method.clone(),
                            format!("{context} has an invalid HTTP method"),
                        ));
                    }
                }
                CheckKind::DbWrite => {
                    if !is_valid_table_identifier(&check.target) {
                        return Err(ConfigurationError::invalid_value(
                            "target",
                            check.target.clone(),
                            format!("{context} must name a valid table"),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_store(&self) -> ConfigResult<()> {
        if self.store.write_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "store.write_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }

        for (field, table) in [
            ("store.status_table", &self.store.status_table),
            ("store.audit_table", &self.store.audit_table),
        ] {
            if !is_valid_table_identifier(table) {
                return Err(ConfigurationError::invalid_value(
                    field,
                    table.clone(),
                    "must be a valid table identifier",
                ));
            }
        }

        if self.store.backend == StoreBackend::Postgres {
            let has_url = self
                .store
                .database_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_url {
                return Err(ConfigurationError::missing_required_field(
                    "store.database_url",
                    "postgres store backend",
                ));
            }
        }

        Ok(())
    }
}
