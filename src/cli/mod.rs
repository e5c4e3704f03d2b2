//! Command-line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// nc-hammer - load testing for NETCONF servers over SSH
#[derive(Parser, Debug, Clone)]
#[command(name = "nc-hammer")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute a test suite against the configured NETCONF servers
    Run(RunArgs),

    /// Print the report for a results file of an earlier run
    Analyse(AnalyseArgs),

    /// Write an example test suite
    Init(InitArgs),

    /// Show version and build information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Test suite YAML file
    #[arg(value_name = "SUITE")]
    pub suite_file: PathBuf,

    /// Directory receiving one sub-directory of results per run
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds allowed for establishing one session
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub dial_timeout: Option<u64>,

    /// Seconds allowed for a single RPC round trip
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub exec_timeout: Option<u64>,

    /// Do not print a marker per result while running
    #[arg(long)]
    pub no_progress: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyseArgs {
    /// results.jsonl written by a previous run
    #[arg(value_name = "RESULTS")]
    pub results_file: PathBuf,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Where to write the example suite
    #[arg(value_name = "PATH", default_value = "suite.yml")]
    pub path: PathBuf,

    /// Also write .env.example listing the supported environment variables
    #[arg(long)]
    pub env: bool,
}

impl RunArgs {
    /// Check flag combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.suite_file.as_os_str().is_empty() {
            return Err("Suite file path cannot be empty".to_string());
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err("--output-dir cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

impl AnalyseArgs {
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Version string including build metadata
pub fn version_info() -> String {
    let mut info = format!("{} {}", crate::PKG_NAME, crate::VERSION);
    let details = [
        ("built", option_env!("BUILD_TIME")),
        ("commit", option_env!("GIT_COMMIT")),
        ("target", option_env!("TARGET_TRIPLE")),
    ];
    for (label, value) in details {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            info.push_str(&format!("\n  {}: {}", label, value));
        }
    }
    info
}

/// Parse a whole number of seconds, rejecting zero
fn parse_seconds(s: &str) -> Result<u64, String> {
    let seconds: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number of seconds: {}", s))?;

    if seconds == 0 {
        return Err("Timeout must be greater than 0".to_string());
    }
    if seconds > 600 {
        return Err("Timeout cannot exceed 600 seconds".to_string());
    }
    Ok(seconds)
}

/// Check if the terminal supports colors
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    std::env::var("TERM").map(|term| term != "dumb").unwrap_or(false)
}
