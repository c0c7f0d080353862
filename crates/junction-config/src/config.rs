//! Configuration types.

use std::time::Duration;

use junction_router::{MethodResolver, PathNormalizer, DEFAULT_OVERRIDE_FIELD};
use junction_telemetry::logging::create_env_filter;
use junction_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete dispatcher configuration.
///
/// # Example
///
/// ```
/// use junction_config::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert!(!config.routing.case_sensitive);
/// assert_eq!(config.routing.method_override_field, "_method");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Path handling and verb override settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

/// Routing section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Base URL or path whose path component is stripped from requests.
    pub base_url: Option<String>,

    /// Entry-file segment stripped after the base prefix, e.g. `index.php`.
    pub entry_stub: Option<String>,

    /// Whether templates match case-sensitively.
    pub case_sensitive: bool,

    /// Header consulted for POST verb overrides.
    pub method_override_header: String,

    /// Form field consulted for POST verb overrides.
    pub method_override_field: String,

    /// Default per-dispatch deadline in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            entry_stub: None,
            case_sensitive: false,
            method_override_header: "X-HTTP-Method-Override".to_string(),
            method_override_field: DEFAULT_OVERRIDE_FIELD.to_string(),
            request_timeout_ms: None,
        }
    }
}

impl RoutingConfig {
    /// Returns the default deadline as a duration.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl DispatchConfig {
    /// Development preset: human-readable debug logging.
    pub fn development() -> Self {
        Self {
            routing: RoutingConfig::default(),
            logging: LogConfig::development(),
        }
    }

    /// Production preset: JSON logging at `info`.
    pub fn production() -> Self {
        Self {
            routing: RoutingConfig::default(),
            logging: LogConfig::production(),
        }
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let routing = &self.routing;

        if let Some(base_url) = &routing.base_url {
            PathNormalizer::new()
                .with_base_url(base_url)
                .map_err(|e| ConfigError::invalid_value("routing.base_url", e.to_string()))?;
        }

        MethodResolver::new()
            .with_override_header(&routing.method_override_header)
            .map_err(|e| {
                ConfigError::invalid_value("routing.method_override_header", e.to_string())
            })?;

        if routing.method_override_field.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "routing.method_override_field",
                "must not be empty",
            ));
        }

        if routing.request_timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "routing.request_timeout_ms",
                "must be greater than 0",
            ));
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }
}
