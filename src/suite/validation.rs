//! Load-time validation rules for test suites

use super::{Action, BlockType, TestSuite};
use crate::error::{AppError, Result};
use crate::netconf::{is_element_name, SUPPORTED_OPERATIONS};
use std::collections::HashSet;

/// Suite validator
///
/// `validate` enforces the rules a run cannot start without; `warnings`
/// reports things that are legal but probably not what the author meant.
pub struct SuiteValidator;

impl SuiteValidator {
    /// Validate a suite, failing on the first violated rule
    pub fn validate(suite: &TestSuite) -> Result<()> {
        if suite.configs.is_empty() {
            return Err(AppError::validation("Testsuite should contain at least one SSH Config section"));
        }

        let mut hostnames = HashSet::new();
        for config in &suite.configs {
            if config.hostname.is_empty() {
                return Err(AppError::validation("ssh config: hostname cannot be empty"));
            }
            if config.username.is_empty() {
                return Err(AppError::validation("ssh config: username cannot be empty"));
            }
            if config.password.is_empty() {
                return Err(AppError::validation("ssh config: password cannot be empty"));
            }
            if !hostnames.insert(config.hostname.as_str()) {
                return Err(AppError::validation(format!(
                    "ssh config: hostname {} is defined more than once",
                    config.hostname
                )));
            }
        }

        if suite.iterations == 0 {
            return Err(AppError::validation("iterations must be at least 1"));
        }

        if suite.clients == 0 {
            return Err(AppError::validation("clients must be at least 1"));
        }

        let init_blocks = suite
            .blocks
            .iter()
            .filter(|block| block.block_type == BlockType::Init)
            .count();
        if init_blocks > 1 {
            return Err(AppError::validation(format!(
                "at most one init block is allowed, found {}",
                init_blocks
            )));
        }

        for netconf in suite.netconf_actions() {
            if netconf.operation.is_empty() {
                return Err(AppError::validation("netconf: operation cannot be empty"));
            }
            if !hostnames.contains(netconf.hostname.as_str()) {
                return Err(AppError::unknown_host(format!(
                    "netconf action targets {} which has no ssh config",
                    netconf.hostname
                )));
            }
            for (field, datastore) in [("source", &netconf.source), ("target", &netconf.target)] {
                if let Some(datastore) = datastore.as_deref().filter(|name| !name.is_empty()) {
                    if !is_element_name(datastore) {
                        return Err(AppError::validation(format!(
                            "netconf: {} {:?} is not a valid datastore name",
                            field, datastore
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Collect non-fatal observations
    pub fn warnings(suite: &TestSuite) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if suite.rampup == 0 && suite.clients > 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("rampup is 0, all {} clients will connect at once", suite.clients),
            ));
        }

        let reused = suite.configs.iter().filter(|config| config.reuse_connection).count();
        if reused > 0 && suite.clients > 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "{} reused host(s) x {} clients keeps up to {} sessions open",
                    reused,
                    suite.clients,
                    reused * suite.clients
                ),
            ));
        }

        let mut reported = HashSet::new();
        for netconf in suite.netconf_actions() {
            if !SUPPORTED_OPERATIONS.contains(&netconf.operation.as_str())
                && reported.insert(netconf.operation.as_str())
            {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "operation {} is not supported, every attempt will be recorded as an error",
                        netconf.operation
                    ),
                ));
            }
        }

        for (index, block) in suite.blocks.iter().enumerate() {
            if block.actions.is_empty() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("block {} ({}) has no actions", index, block.block_type.as_str()),
                ));
            }
            if block.block_type == BlockType::Concurrent
                && block.actions.iter().all(|action| matches!(action, Action::Sleep(_)))
                && !block.actions.is_empty()
            {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("concurrent block {} only sleeps", index),
                ));
            }
        }

        warnings
    }
}

/// Severity of a validation warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Info => "INFO",
            ValidationLevel::Warning => "WARN",
        }
    }
}

/// Suite validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().cyan(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}
