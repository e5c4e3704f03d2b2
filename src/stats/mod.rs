//! Aggregation of result records into per-operation latency statistics

use crate::models::NetconfResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latency statistics for one (hostname, operation) pair
///
/// Latency figures are in milliseconds and only consider successful
/// results; `errors` counts the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    pub hostname: String,
    pub operation: String,
    pub count: usize,
    pub errors: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

impl OperationStats {
    pub fn successful(&self) -> usize {
        self.count - self.errors
    }

    /// Share of results without an error, in percent
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.successful() as f64 / self.count as f64 * 100.0
        }
    }
}

/// Whole-run figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub results: usize,
    pub errors: usize,
    pub clients: usize,
    /// Completion time of the last successful result, ms since suite start
    pub duration_ms: f64,
    /// Successful requests per second over `duration_ms`
    pub throughput: f64,
}

impl RunTotals {
    pub fn success_rate(&self) -> f64 {
        if self.results == 0 {
            0.0
        } else {
            (self.results - self.errors) as f64 / self.results as f64 * 100.0
        }
    }
}

/// How often a particular error message occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCount {
    pub message: String,
    pub count: usize,
}

/// Statistics engine for result records
pub struct StatisticsEngine;

impl StatisticsEngine {
    /// Group results by (hostname, operation), sorted by host then operation
    pub fn summarize(results: &[NetconfResult]) -> Vec<OperationStats> {
        let mut groups: BTreeMap<(&str, &str), Vec<&NetconfResult>> = BTreeMap::new();
        for result in results {
            groups
                .entry((result.hostname.as_str(), result.operation.as_str()))
                .or_default()
                .push(result);
        }

        groups
            .into_iter()
            .map(|((hostname, operation), group)| Self::operation_stats(hostname, operation, &group))
            .collect()
    }

    fn operation_stats(hostname: &str, operation: &str, group: &[&NetconfResult]) -> OperationStats {
        let mut latencies: Vec<f64> = group
            .iter()
            .filter(|result| result.is_successful())
            .map(|result| result.latency)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        OperationStats {
            hostname: hostname.to_string(),
            operation: operation.to_string(),
            count: group.len(),
            errors: group.len() - latencies.len(),
            min: latencies.first().copied().unwrap_or(0.0),
            mean,
            max: latencies.last().copied().unwrap_or(0.0),
            p50: Self::percentile(&latencies, 50.0),
            p90: Self::percentile(&latencies, 90.0),
            p99: Self::percentile(&latencies, 99.0),
        }
    }

    /// Percentile of already sorted values, interpolating between ranks
    pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
        if sorted_values.is_empty() {
            return 0.0;
        }

        let index = (percentile / 100.0) * (sorted_values.len() as f64 - 1.0);
        let lower_index = index.floor() as usize;
        let upper_index = index.ceil() as usize;

        if lower_index == upper_index {
            sorted_values[lower_index]
        } else {
            let lower_value = sorted_values[lower_index];
            let upper_value = sorted_values[upper_index];
            let weight = index - lower_index as f64;
            lower_value + weight * (upper_value - lower_value)
        }
    }

    pub fn totals(results: &[NetconfResult]) -> RunTotals {
        let errors = results.iter().filter(|result| !result.is_successful()).count();
        let successful = results.len() - errors;

        let mut clients: Vec<usize> = results.iter().map(|result| result.client).collect();
        clients.sort_unstable();
        clients.dedup();

        let duration_ms = results
            .iter()
            .filter(|result| result.is_successful())
            .map(|result| result.when)
            .fold(0.0, f64::max);
        let throughput = if duration_ms > 0.0 {
            successful as f64 / (duration_ms / 1000.0)
        } else {
            0.0
        };

        RunTotals {
            results: results.len(),
            errors,
            clients: clients.len(),
            duration_ms,
            throughput,
        }
    }

    /// Distinct error messages, most frequent first
    pub fn error_counts(results: &[NetconfResult]) -> Vec<ErrorCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for err in results.iter().filter_map(|result| result.err.as_deref()) {
            *counts.entry(err).or_default() += 1;
        }

        let mut errors: Vec<ErrorCount> = counts
            .into_iter()
            .map(|(message, count)| ErrorCount {
                message: message.to_string(),
                count,
            })
            .collect();
        errors.sort_by(|a, b| b.count.cmp(&a.count));
        errors
    }
}
