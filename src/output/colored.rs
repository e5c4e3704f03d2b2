//! Colored report formatter
//!
//! Same layout as the plain formatter, with latency cells colored by how
//! fast the operation was and error cells highlighted.

use super::formatter::{format_duration, format_percentage, operations_table, ReportFormatter, ERRORS_COLUMN};
use crate::error::{AppError, Result};
use crate::stats::{ErrorCount, OperationStats, RunTotals};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Excellent, // < 50ms
    Good,      // 50-200ms
    Fair,      // 200-1000ms
    Poor,      // >= 1000ms
}

impl LatencyLevel {
    pub fn from_latency(latency_ms: f64) -> Self {
        if latency_ms < 50.0 {
            Self::Excellent
        } else if latency_ms < 200.0 {
            Self::Good
        } else if latency_ms < 1000.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
#[derive(Debug, Default)]
pub struct ColoredFormatter {
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color_scheme(color_scheme: ColorScheme) -> Self {
        Self { color_scheme }
    }

    fn format_percentage_colored(&self, percentage: f64) -> ColoredString {
        let formatted = format_percentage(percentage);
        let color = if percentage >= 99.0 {
            self.color_scheme.success
        } else if percentage >= 90.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };
        formatted.color(color)
    }

    fn paint_cell(&self, column: usize, stats: &OperationStats, cell: &str) -> String {
        match column {
            ERRORS_COLUMN if stats.errors > 0 => cell.color(self.color_scheme.error).bold().to_string(),
            ERRORS_COLUMN => cell.color(self.color_scheme.muted).to_string(),
            c if c > ERRORS_COLUMN => {
                if stats.successful() == 0 {
                    return cell.color(self.color_scheme.muted).to_string();
                }
                let latency = match c {
                    4 => stats.min,
                    5 => stats.mean,
                    6 => stats.max,
                    7 => stats.p50,
                    8 => stats.p90,
                    _ => stats.p99,
                };
                cell.color(LatencyLevel::from_latency(latency).color()).to_string()
            }
            _ => cell.to_string(),
        }
    }
}

impl ReportFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        let mut output = String::new();
        writeln!(output, "{}", border.color(self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        writeln!(output, "  {}  ", title.bold().color(self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        write!(output, "{}", border.color(self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        Ok(output)
    }

    fn format_totals(&self, totals: &RunTotals) -> Result<String> {
        let mut output = String::new();
        let fail = |e: std::fmt::Error| AppError::io(format!("Failed to format summary: {}", e));

        writeln!(output, "{}", "Run Summary".bold()).map_err(fail)?;
        writeln!(output, "  Results:      {}", totals.results.to_string().bold()).map_err(fail)?;
        let errors = if totals.errors > 0 {
            totals.errors.to_string().color(self.color_scheme.error).bold()
        } else {
            totals.errors.to_string().color(self.color_scheme.success)
        };
        writeln!(output, "  Errors:       {}", errors).map_err(fail)?;
        writeln!(output, "  Success Rate: {}", self.format_percentage_colored(totals.success_rate())).map_err(fail)?;
        writeln!(output, "  Clients:      {}", totals.clients).map_err(fail)?;
        writeln!(output, "  Duration:     {}", format_duration(totals.duration_ms)).map_err(fail)?;
        write!(output, "  Throughput:   {:.2} req/s", totals.throughput).map_err(fail)?;
        Ok(output)
    }

    fn format_operations(&self, stats: &[OperationStats]) -> Result<String> {
        if stats.is_empty() {
            return Ok("No results recorded".color(self.color_scheme.muted).to_string());
        }

        let table = operations_table(stats);
        Ok(table.render_with(
            |row, column, cell| match stats.get(row) {
                Some(stats) => self.paint_cell(column, stats, cell),
                None => cell.to_string(),
            },
            |header| header.bold().to_string(),
        ))
    }

    fn format_errors(&self, errors: &[ErrorCount]) -> Result<String> {
        let mut output = String::new();
        write!(output, "{}", "Errors".bold().color(self.color_scheme.error))
            .map_err(|e| AppError::io(format!("Failed to format errors: {}", e)))?;
        for error in errors {
            write!(
                output,
                "\n  {:>5}  {}",
                error.count.to_string().color(self.color_scheme.error),
                error.message
            )
            .map_err(|e| AppError::io(format!("Failed to format errors: {}", e)))?;
        }
        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("{} {}", "Warning:".color(self.color_scheme.warning).bold(), warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_levels() {
        assert_eq!(LatencyLevel::from_latency(3.0), LatencyLevel::Excellent);
        assert_eq!(LatencyLevel::from_latency(50.0), LatencyLevel::Good);
        assert_eq!(LatencyLevel::from_latency(999.0), LatencyLevel::Fair);
        assert_eq!(LatencyLevel::from_latency(1500.0), LatencyLevel::Poor);
        assert_eq!(LatencyLevel::Poor.color(), Color::Red);
    }

    #[test]
    fn test_colored_report_keeps_content() {
        let stats = vec![OperationStats {
            hostname: "r1".to_string(),
            operation: "get".to_string(),
            count: 2,
            errors: 1,
            min: 4.0,
            mean: 4.0,
            max: 4.0,
            p50: 4.0,
            p90: 4.0,
            p99: 4.0,
        }];

        let output = ColoredFormatter::new().format_operations(&stats).unwrap();
        assert!(output.contains("r1"));
        assert!(output.contains("get"));
        assert!(output.contains("4.0ms"));
    }

    #[test]
    fn test_colored_errors() {
        let errors = vec![ErrorCount {
            message: "Dial error: refused".to_string(),
            count: 3,
        }];
        let output = ColoredFormatter::new().format_errors(&errors).unwrap();
        assert!(output.contains("Dial error: refused"));
        assert_eq!(output.lines().count(), 2);
    }
}
