//! Structured logging for nc-hammer
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console, JSON and compact output formats
//! - NETCONF specific logging (dials, RPC exchanges, encoder warnings)
//! - Run lifecycle logging (run start, client ramp-up, completion)

use crate::error::{AppError, Result};
use crate::models::{Config, NetconfResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - degraded behaviour, run continues
    Warn = 3,
    /// Error level - an action or client failed
    Error = 4,
    /// Fatal level - the run is aborted
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

/// Shared logging context
#[derive(Debug, Default)]
struct LogContext {
    /// Run identifier attached to every entry
    run_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set output format
    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    /// Enable or disable colored output
    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Builder form of [`set_run_id`](Self::set_run_id) for a logger nobody shares yet
    pub fn with_run_id(self, run_id: impl Into<String>) -> Self {
        let context = LogContext {
            run_id: Some(run_id.into()),
            ..LogContext::default()
        };
        Self {
            context: Arc::new(RwLock::new(context)),
            ..self
        }
    }

    /// Set the run identifier
    pub async fn set_run_id(&self, run_id: String) {
        let mut context = self.context.write().await;
        context.run_id = Some(run_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(run_id) = &context.run_id {
            entry.fields.insert("run_id".to_string(), serde_json::Value::String(run_id.clone()));
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        // Result progress markers own stdout, keep the log off it
        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}",
                entry.message
            ),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add location information
    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add the identifying fields of a result record
    pub fn result(self, result: &NetconfResult) -> Self {
        self.field("client", result.client)
            .field("hostname", &result.hostname)
            .field("operation", &result.operation)
            .field("session_id", result.session_id)
            .field("latency_ms", result.latency)
            .field("success", result.is_successful())
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for NETCONF session and RPC activity
#[derive(Clone)]
pub struct NetconfLogger {
    logger: Logger,
}

impl NetconfLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("NETCONF".to_string(), config),
        }
    }

    /// Log a session dial attempt
    pub async fn log_dial(&self, client: usize, address: &str, reused: bool, error: Option<&AppError>) {
        match error {
            None => {
                self.logger
                    .debug(&format!("Session to {} ready for client {}", address, client))
                    .field("client", client)
                    .field("address", address)
                    .field("reused", reused)
                    .log()
                    .await;
            }
            Some(err) => {
                self.logger
                    .warn(&format!("Failed to dial {} for client {}: {}", address, client, err))
                    .field("client", client)
                    .field("address", address)
                    .error_info(err)
                    .log()
                    .await;
            }
        }
    }

    /// Log the outcome of one executed action
    pub async fn log_result(&self, result: &NetconfResult) {
        let (level, message) = match &result.err {
            None => (
                LogLevel::Debug,
                format!("{} on {} took {}ms", result.operation, result.hostname, result.latency),
            ),
            Some(err) => (
                LogLevel::Info,
                format!("{} on {} failed: {}", result.operation, result.hostname, err),
            ),
        };

        self.logger.log(level, &message).result(result).log().await;
    }

    /// Log a malformed embedded fragment that was replaced by an empty element
    pub async fn log_encode_warning(&self, client: usize, operation: &str, warning: &str) {
        self.logger
            .warn(warning)
            .field("client", client)
            .field("operation", operation)
            .log()
            .await;
    }

    /// Log a session close that failed during shutdown
    pub async fn log_close_failure(&self, address: &str, error: &AppError) {
        self.logger
            .warn(&format!("Closing session to {} failed: {}", address, error))
            .field("address", address)
            .error_info(error)
            .log()
            .await;
    }
}

/// Logger for run and virtual client lifecycle events
#[derive(Clone)]
pub struct RunLogger {
    logger: Logger,
}

impl RunLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("RUN".to_string(), config),
        }
    }

    /// Log the start of a run
    pub async fn log_run_start(&self, run_id: &str, clients: usize, iterations: usize, rampup: u64) {
        self.logger
            .info(&format!(
                "Starting run with {} clients x {} iterations (rampup {}s)",
                clients, iterations, rampup
            ))
            .correlation_id(run_id)
            .field("clients", clients)
            .field("iterations", iterations)
            .field("rampup_seconds", rampup)
            .log()
            .await;
    }

    /// Log a client leaving its ramp-up delay
    pub async fn log_client_start(&self, client: usize, delay: Duration) {
        self.logger
            .debug(&format!("Client {} starting after {}ms", client, delay.as_millis()))
            .field("client", client)
            .field("delay_ms", delay.as_millis() as u64)
            .log()
            .await;
    }

    /// Log a client finishing its iteration loop
    pub async fn log_client_done(&self, client: usize, results: usize) {
        self.logger
            .debug(&format!("Client {} done, {} results", client, results))
            .field("client", client)
            .field("results", results)
            .log()
            .await;
    }

    /// Log a client task that did not finish normally
    pub async fn log_client_failure(&self, message: &str) {
        self.logger.error(message).log().await;
    }

    /// Log run completion
    pub async fn log_run_complete(&self, run_id: &str, elapsed: Duration, sessions_closed: usize) {
        self.logger
            .info(&format!(
                "Run completed in {:.3}s, {} cached sessions closed",
                elapsed.as_secs_f64(),
                sessions_closed
            ))
            .correlation_id(run_id)
            .field("elapsed_seconds", elapsed.as_secs_f64())
            .field("sessions_closed", sessions_closed)
            .log()
            .await;
    }
}

/// Logger factory shared by the components of one run
pub struct LoggerFactory {
    config: Config,
    run_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_run_id(self.run_id.clone()).await;
        logger
    }

    pub fn create_netconf_logger(&self) -> NetconfLogger {
        NetconfLogger {
            logger: Logger::with_config("NETCONF".to_string(), &self.config).with_run_id(self.run_id.clone()),
        }
    }

    pub fn create_run_logger(&self) -> RunLogger {
        RunLogger {
            logger: Logger::with_config("RUN".to_string(), &self.config).with_run_id(self.run_id.clone()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_entry() -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "Test message".to_string(),
            logger: "TEST".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields: {
                let mut map = HashMap::new();
                map.insert("key".to_string(), serde_json::Value::String("value".to_string()));
                map
            },
            location: None,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };

        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);
        assert!(logger.include_location);
    }

    #[test]
    fn test_quiet_config_logs_warnings_only() {
        let logger = Logger::with_config("TEST".to_string(), &Config::default());
        assert!(!logger.would_log(LogLevel::Info));
        assert!(logger.would_log(LogLevel::Warn));
    }

    #[tokio::test]
    async fn test_run_id_management() {
        let logger = Logger::new("TEST".to_string());
        logger.set_run_id("run-1".to_string()).await;

        let context = logger.context.read().await;
        assert_eq!(context.run_id.as_deref(), Some("run-1"));
    }

    #[tokio::test]
    async fn test_log_entry_builder() {
        let logger = Logger::new("TEST".to_string());
        let result = NetconfResult::new(1, "r1", "get");

        logger
            .info("test message")
            .correlation_id("test-id")
            .field("test_field", "test_value")
            .result(&result)
            .location("test.rs", 123, Some("test::module"))
            .log()
            .await;
    }

    #[test]
    fn test_log_formats() {
        let entry = sample_entry();
        let mut logger = Logger::new("TEST".to_string());
        logger.set_color(false);

        let console_output = logger.format_console(&entry);
        assert!(console_output.contains("INFO"));
        assert!(console_output.contains("Test message"));
        assert!(console_output.contains("[01234567]"));
        assert!(console_output.contains("key=\"value\""));

        let json_output = logger.format_json(&entry);
        assert!(json_output.starts_with('{'));
        assert!(json_output.ends_with('}'));

        let compact_output = logger.format_compact(&entry);
        assert!(compact_output.contains(" I TEST: Test message"));
    }

    #[tokio::test]
    async fn test_specialised_loggers() {
        let config = Config::default();
        let netconf = NetconfLogger::new(&config);
        netconf.log_dial(0, "r1:830", false, None).await;
        netconf.log_dial(0, "r1:830", false, Some(&AppError::dial("refused"))).await;
        netconf.log_encode_warning(0, "edit-config", "Config data is not valid xml").await;

        let run = RunLogger::new(&config);
        run.log_run_start("run", 2, 1, 0).await;
        run.log_client_start(1, Duration::from_millis(500)).await;
        run.log_run_complete("run", Duration::from_secs(1), 2).await;
    }

    #[tokio::test]
    async fn test_logger_factory() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("TEST").await;
        assert_eq!(logger.name, "TEST");
        assert!(Uuid::parse_str(factory.run_id()).is_ok());
    }

    #[tokio::test]
    async fn test_engine_loggers_carry_run_id() {
        let factory = LoggerFactory::new(Config::default());

        let netconf = factory.create_netconf_logger();
        let run = factory.create_run_logger();
        assert_eq!(netconf.logger.context.read().await.run_id.as_deref(), Some(factory.run_id()));
        assert_eq!(run.logger.context.read().await.run_id.as_deref(), Some(factory.run_id()));
        assert_eq!(netconf.logger.name, "NETCONF");
        assert_eq!(run.logger.name, "RUN");
    }

    #[test]
    fn test_log_entry_serialization() {
        let entry = sample_entry();
        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: LogEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.level, LogLevel::Info);
        assert_eq!(deserialized.message, "Test message");
    }
}
