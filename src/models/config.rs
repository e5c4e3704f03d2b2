//! Runtime configuration data model and validation

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names understood by [`Config::merge_from_env`]
pub const ENV_DIAL_TIMEOUT: &str = "NC_HAMMER_DIAL_TIMEOUT";
pub const ENV_EXEC_TIMEOUT: &str = "NC_HAMMER_EXEC_TIMEOUT";
pub const ENV_OUTPUT_DIR: &str = "NC_HAMMER_OUTPUT_DIR";
pub const ENV_COLOR: &str = "NC_HAMMER_COLOR";

/// Main application configuration
///
/// This is everything about a run that is not part of the suite document
/// itself: where results go, transport timeouts and console behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the suite document being run
    #[serde(default)]
    pub suite_file: Option<PathBuf>,

    /// Directory receiving one sub-directory of results per run
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Upper bound on establishing one SSH/NETCONF session
    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_seconds: u64,

    /// Optional upper bound on a single RPC round trip
    #[serde(default)]
    pub exec_timeout_seconds: Option<u64>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Print one marker per result while the run is in progress
    #[serde(default = "default_progress")]
    pub progress: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suite_file: None,
            output_dir: None,
            dial_timeout_seconds: default_dial_timeout_secs(),
            exec_timeout_seconds: None,
            enable_color: default_enable_color(),
            progress: default_progress(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Dial timeout as Duration
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_seconds)
    }

    /// Exec timeout as Duration, if one is configured
    pub fn exec_timeout(&self) -> Option<Duration> {
        self.exec_timeout_seconds.map(Duration::from_secs)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.dial_timeout_seconds == 0 {
            return Err(AppError::config("Dial timeout must be greater than 0"));
        }

        if self.dial_timeout_seconds > 600 {
            return Err(AppError::config("Dial timeout cannot exceed 600 seconds"));
        }

        if self.exec_timeout_seconds == Some(0) {
            return Err(AppError::config("Exec timeout must be greater than 0 when set"));
        }

        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(AppError::config("Output directory cannot be empty"));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary variable source
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = lookup(ENV_DIAL_TIMEOUT) {
            self.dial_timeout_seconds = timeout.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid {} value '{}': {}", ENV_DIAL_TIMEOUT, timeout, e))
            })?;
        }

        if let Some(timeout) = lookup(ENV_EXEC_TIMEOUT) {
            let seconds = timeout.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid {} value '{}': {}", ENV_EXEC_TIMEOUT, timeout, e))
            })?;
            self.exec_timeout_seconds = Some(seconds);
        }

        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            let dir = dir.trim();
            if !dir.is_empty() {
                self.output_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(enable_color) = lookup(ENV_COLOR) {
            self.enable_color = enable_color.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid {} value '{}': {}", ENV_COLOR, enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_dial_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_DIAL_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_progress() -> bool {
    crate::defaults::DEFAULT_PROGRESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dial_timeout(), Duration::from_secs(30));
        assert!(config.exec_timeout().is_none());
    }

    #[test]
    fn test_zero_dial_timeout_invalid() {
        let mut config = Config::default();
        config.dial_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_exec_timeout_invalid() {
        let mut config = Config::default();
        config.exec_timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_from_lookup() {
        let mut config = Config::default();
        config
            .merge_from_lookup(lookup_from(&[
                (ENV_DIAL_TIMEOUT, "5"),
                (ENV_EXEC_TIMEOUT, " 12 "),
                (ENV_OUTPUT_DIR, "/tmp/results"),
                (ENV_COLOR, "false"),
            ]))
            .unwrap();

        assert_eq!(config.dial_timeout_seconds, 5);
        assert_eq!(config.exec_timeout_seconds, Some(12));
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/results")));
        assert!(!config.enable_color);
    }

    #[test]
    fn test_merge_rejects_garbage() {
        let mut config = Config::default();
        let result = config.merge_from_lookup(lookup_from(&[(ENV_DIAL_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_empty_lookup_keeps_defaults() {
        let mut config = Config::default();
        config.merge_from_lookup(|_| None).unwrap();
        assert_eq!(config.dial_timeout_seconds, 30);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"verbose": true}"#).unwrap();
        assert!(config.verbose);
        assert!(config.progress);
        assert_eq!(config.dial_timeout_seconds, 30);
    }
}
