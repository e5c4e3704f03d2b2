//! Per-operation timing record

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One record per executed NETCONF action.
///
/// `when` and `latency` are whole milliseconds. A record with `err` set
/// still carries the client, host and operation it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetconfResult {
    /// Virtual client that issued the action
    pub client: usize,
    /// Target host as named in the suite
    pub hostname: String,
    /// NETCONF operation name
    pub operation: String,
    /// Session id assigned by the server, 0 when no session was obtained
    #[serde(default)]
    pub session_id: u64,
    /// Milliseconds since the suite started
    #[serde(default)]
    pub when: f64,
    /// Round-trip time of the RPC in milliseconds
    #[serde(default)]
    pub latency: f64,
    /// Error description when the action failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl NetconfResult {
    /// Create an empty record for the given action
    pub fn new(client: usize, hostname: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            client,
            hostname: hostname.into(),
            operation: operation.into(),
            session_id: 0,
            when: 0.0,
            latency: 0.0,
            err: None,
        }
    }

    /// Mark this record as failed
    pub fn failed(mut self, error: impl ToString) -> Self {
        self.err = Some(error.to_string());
        self
    }

    /// Whether the action completed without error
    pub fn is_successful(&self) -> bool {
        self.err.is_none()
    }

    /// Whole milliseconds of a duration, as reported in records
    pub fn millis(duration: Duration) -> f64 {
        duration.as_millis() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record() {
        let result = NetconfResult::new(3, "r1", "get").failed("connection refused");
        assert!(!result.is_successful());
        assert_eq!(result.err.as_deref(), Some("connection refused"));
        assert_eq!(result.session_id, 0);
    }

    #[test]
    fn test_millis_truncates() {
        assert_eq!(NetconfResult::millis(Duration::from_micros(12_999)), 12.0);
    }

    #[test]
    fn test_json_line_shape() {
        let mut result = NetconfResult::new(0, "r1", "get-config");
        result.session_id = 42;
        result.latency = 7.0;
        let line = serde_json::to_string(&result).unwrap();
        assert!(line.contains("\"session_id\":42"));
        assert!(!line.contains("err"));
    }
}
