//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::RunArgs, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines `run` arguments with environment variables
///
/// Precedence, lowest first: built-in defaults, `.env`, process
/// environment, command line.
pub struct ConfigParser {
    args: RunArgs,
}

impl ConfigParser {
    pub fn new(args: RunArgs) -> Self {
        Self { args }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.args.debug)?;
        self.parse_with_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`parse`](Self::parse) with an explicit variable source and no `.env` loading
    pub fn parse_with_lookup<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_lookup(lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        config.suite_file = Some(self.args.suite_file.clone());

        if let Some(dir) = &self.args.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(timeout) = self.args.dial_timeout {
            config.dial_timeout_seconds = timeout;
        }
        if let Some(timeout) = self.args.exec_timeout {
            config.exec_timeout_seconds = Some(timeout);
        }
        if self.args.no_color || !self.args.use_colors() {
            config.enable_color = false;
        }
        if self.args.no_progress {
            config.progress = false;
        }

        // CLI-only flags
        config.verbose = self.args.verbose || self.args.debug;
        config.debug = self.args.debug;
    }
}

/// Convenience function to load the configuration for a `run` invocation
pub fn load_config(args: RunArgs) -> Result<Config> {
    ConfigParser::new(args).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    let suite = config
        .suite_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    summary.push(format!("Suite: {}", suite));

    let output_dir = config
        .output_dir
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(not persisted)".to_string());
    summary.push(format!("Output Dir: {}", output_dir));

    summary.push(format!("Dial Timeout: {}s", config.dial_timeout_seconds));
    match config.exec_timeout_seconds {
        Some(seconds) => summary.push(format!("Exec Timeout: {}s", seconds)),
        None => summary.push("Exec Timeout: none".to_string()),
    }
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Progress: {}", config.progress));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
