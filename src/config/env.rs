//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::config::{ENV_COLOR, ENV_DIAL_TIMEOUT, ENV_EXEC_TIMEOUT, ENV_OUTPUT_DIR};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the working directory if it exists
    ///
    /// Variables already present in the process environment are not
    /// replaced.
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        format!(
            r#"# nc-hammer configuration
#
# Values here are defaults for `nc-hammer run`; command line flags win.

# Seconds allowed for establishing one SSH/NETCONF session
# {dial}=30

# Seconds allowed for a single RPC round trip (unset: no limit)
# {exec}=10

# Directory receiving one sub-directory of results per run
# {output}=results

# Enable colored output (true/false)
# {color}=true
"#,
            dial = ENV_DIAL_TIMEOUT,
            exec = ENV_EXEC_TIMEOUT,
            output = ENV_OUTPUT_DIR,
            color = ENV_COLOR,
        )
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            ENV_DIAL_TIMEOUT | ENV_EXEC_TIMEOUT => {
                let seconds: u64 = value
                    .trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if seconds == 0 || seconds > 600 {
                    return Err(AppError::config(format!(
                        "{} must be between 1 and 600, got: {}",
                        key, seconds
                    )));
                }
            }
            ENV_OUTPUT_DIR => {
                if value.trim().is_empty() {
                    return Err(AppError::config(format!("{} cannot be empty", key)));
                }
            }
            ENV_COLOR => {
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported variables with a description and an example value
    pub fn supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            (ENV_DIAL_TIMEOUT, "Session establishment timeout in seconds (1-600)", "30"),
            (ENV_EXEC_TIMEOUT, "RPC round trip timeout in seconds (1-600)", "10"),
            (ENV_OUTPUT_DIR, "Directory for per-run result files", "results"),
            (ENV_COLOR, "Enable colored output", "true"),
        ]
    }

    /// Warnings for currently set variables that would fail to parse
    pub fn validate_current_env() -> Vec<String> {
        Self::supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| e.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timeouts() {
        assert!(EnvManager::validate_env_var(ENV_DIAL_TIMEOUT, "30").is_ok());
        assert!(EnvManager::validate_env_var(ENV_EXEC_TIMEOUT, "0").is_err());
        assert!(EnvManager::validate_env_var(ENV_DIAL_TIMEOUT, "601").is_err());
        assert!(EnvManager::validate_env_var(ENV_DIAL_TIMEOUT, "soon").is_err());
    }

    #[test]
    fn test_validate_other_vars() {
        assert!(EnvManager::validate_env_var(ENV_COLOR, "false").is_ok());
        assert!(EnvManager::validate_env_var(ENV_COLOR, "maybe").is_err());
        assert!(EnvManager::validate_env_var(ENV_OUTPUT_DIR, "  ").is_err());
        assert!(EnvManager::validate_env_var("UNRELATED", "anything").is_ok());
    }

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (name, _, example) in EnvManager::supported_env_vars() {
            assert!(content.contains(name), "{} missing", name);
            assert!(EnvManager::validate_env_var(name, example).is_ok());
        }
    }

    #[test]
    fn test_save_example_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.example");
        EnvManager::save_example_env_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, EnvManager::create_example_env_content());
    }
}
