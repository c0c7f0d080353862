//! Layered configuration loading.
//!
//! Layers, later overriding earlier:
//! 1. Defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. Environment variables `PREFIX__SECTION__KEY`, optionally seeded
//!    from a `.env` file

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use junction_telemetry::LogFormat;

use crate::{ConfigError, DispatchConfig};

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use junction_config::ConfigLoader;
///
/// # fn main() -> Result<(), junction_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("junction.toml")?
///     .with_dotenv()?
///     .with_env_prefix("JUNCTION")
///     .load()?;
/// # let _ = config;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: DispatchConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the development preset.
    pub fn with_development(mut self) -> Self {
        self.config = DispatchConfig::development();
        self
    }

    /// Resets to the production preset.
    pub fn with_production(mut self) -> Self {
        self.config = DispatchConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// Sections missing from the file take their default values.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in `format` (`toml` or `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use junction_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[routing]\nbase_url = \"/blog\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.routing.base_url.as_deref(), Some("/blog"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory or a parent, if present.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::DotenvError(e.to_string())),
        }
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<DispatchConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let vars: HashMap<String, String> =
                env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without env overrides or validation.
    pub fn load_unvalidated(self) -> DispatchConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = rest.split("__").collect();
        let routing = &mut self.config.routing;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["ROUTING", "BASE_URL"] => routing.base_url = optional(value),
            ["ROUTING", "ENTRY_STUB"] => routing.entry_stub = optional(value),
            ["ROUTING", "CASE_SENSITIVE"] => {
                routing.case_sensitive = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["ROUTING", "METHOD_OVERRIDE_HEADER"] => {
                routing.method_override_header = value.to_string();
            }
            ["ROUTING", "METHOD_OVERRIDE_FIELD"] => {
                routing.method_override_field = value.to_string();
            }
            ["ROUTING", "REQUEST_TIMEOUT_MS"] => {
                routing.request_timeout_ms = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected integer or 'none'")
                    })?)
                };
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<DispatchConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
