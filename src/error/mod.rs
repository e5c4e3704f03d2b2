//! Error handling for nc-hammer

use thiserror::Error;

/// Custom error types for nc-hammer
#[derive(Error, Debug)]
pub enum AppError {
    /// Runtime configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Test suite validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (YAML, JSON, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Establishing a transport session failed
    #[error("Dial error: {0}")]
    Dial(String),

    /// SSH authentication was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Errors on an established session (framing, channel, rpc-error replies)
    #[error("Transport error: {0}")]
    Transport(String),

    /// An operation did not complete in time
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The encoder has no mapping for the requested NETCONF operation
    #[error("{0} is not a supported operation")]
    UnsupportedOperation(String),

    /// Building the RPC payload failed
    #[error("Encoding error: {0}")]
    Encode(String),

    /// An action references a host with no SSH config
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new dial error
    pub fn dial<S: Into<String>>(message: S) -> Self {
        Self::Dial(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported_operation<S: Into<String>>(operation: S) -> Self {
        Self::UnsupportedOperation(operation.into())
    }

    /// Create a new encoding error
    pub fn encode<S: Into<String>>(message: S) -> Self {
        Self::Encode(message.into())
    }

    /// Create a new unknown host error
    pub fn unknown_host<S: Into<String>>(hostname: S) -> Self {
        Self::UnknownHost(hostname.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Dial(_) => "DIAL",
            Self::Auth(_) => "AUTH",
            Self::Transport(_) => "TRANSPORT",
            Self::Timeout(_) => "TIMEOUT",
            Self::UnsupportedOperation(_) => "UNSUPPORTED",
            Self::Encode(_) => "ENCODE",
            Self::UnknownHost(_) => "HOST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error only affects a single action.
    ///
    /// Recoverable errors end up in a result record and the run carries on;
    /// the rest abort the process before or after the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Dial(_)
            | Self::Auth(_)
            | Self::Transport(_)
            | Self::Timeout(_)
            | Self::UnsupportedOperation(_)
            | Self::Encode(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnknownHost(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnknownHost(_) => 1,
            Self::Dial(_) | Self::Auth(_) | Self::Transport(_) => 2,
            Self::Timeout(_) => 3,
            Self::UnsupportedOperation(_) | Self::Encode(_) => 4,
            Self::Io(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnknownHost(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Dial(_) | Self::Auth(_) | Self::Transport(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::UnsupportedOperation(_) | Self::Encode(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::parse(format!("YAML parse error: {}", error))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(error: quick_xml::Error) -> Self {
        Self::encode(format!("XML error: {}", error))
    }
}

impl From<russh::Error> for AppError {
    fn from(error: russh::Error) -> Self {
        Self::transport(format!("SSH error: {}", error))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        Self::timeout(error.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for fatal errors at process exit
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.format_error(error));
    }

    /// Render an error the way `report_error` prints it
    pub fn format_error(&self, error: &AppError) -> String {
        let mut output = error.format_for_console(self.use_color);
        if self.verbose {
            output.push_str(&format!("\n  exit code: {}", error.exit_code()));
            if let Some(hint) = Self::hint(error) {
                output.push_str(&format!("\n  hint: {}", hint));
            }
        }
        output
    }

    fn hint(error: &AppError) -> Option<&'static str> {
        match error {
            AppError::Validation(_) | AppError::UnknownHost(_) => {
                Some("check the suite file; every netconf action needs a matching entry under configs")
            }
            AppError::Parse(_) => Some("suite keys are lowercase (iterations, clients, rampup, configs, blocks)"),
            AppError::Config(_) => Some("check the .env file, NC_HAMMER_* variables and command line flags"),
            _ => None,
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let dial_error = AppError::dial("Connection refused");
        assert_eq!(dial_error.category(), "DIAL");
        assert!(dial_error.is_recoverable());
        assert_eq!(dial_error.exit_code(), 2);
    }

    #[test]
    fn test_unsupported_operation_message() {
        let error = AppError::unsupported_operation("commit");
        assert_eq!(error.to_string(), "commit is not a supported operation");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::validation("validation"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::dial("dial"),
            AppError::auth("auth"),
            AppError::transport("transport"),
            AppError::timeout("timeout"),
            AppError::unsupported_operation("commit"),
            AppError::encode("encode"),
            AppError::unknown_host("router9"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "VALIDATION", "IO", "PARSE", "DIAL", "AUTH",
            "TRANSPORT", "TIMEOUT", "UNSUPPORTED", "ENCODE", "HOST", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_load_time_errors_are_fatal() {
        assert!(!AppError::validation("no configs").is_recoverable());
        assert!(!AppError::unknown_host("r1").is_recoverable());
        assert!(!AppError::parse("bad yaml").is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yml");
        let error: AppError = io_error.into();
        assert_eq!(error.category(), "IO");
        assert!(error.to_string().contains("missing.yml"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<u32>("not: [a number").unwrap_err();
        let error: AppError = yaml_error.into();
        assert_eq!(error.category(), "PARSE");
    }

    #[test]
    fn test_error_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let error = result.context("writing results").unwrap_err();
        assert!(error.to_string().contains("writing results"));
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn test_console_format_without_color() {
        let error = AppError::validation("hostname cannot be empty");
        assert_eq!(
            error.format_for_console(false),
            "[VALIDATION] Validation error: hostname cannot be empty"
        );
    }

    #[test]
    fn test_reporter_verbose_hint() {
        let reporter = ErrorReporter::new(false, true);
        let output = reporter.format_error(&AppError::unknown_host("r9"));
        assert!(output.contains("exit code: 1"));
        assert!(output.contains("hint:"));
    }
}
