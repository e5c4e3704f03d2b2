//! Report formatting traits and the plain text implementation

use crate::error::{AppError, Result};
use crate::models::NetconfResult;
use crate::stats::{ErrorCount, OperationStats, RunTotals, StatisticsEngine};
use std::fmt::Write as _;

/// Renders the statistics of a finished run
pub trait ReportFormatter {
    fn format_header(&self, title: &str) -> Result<String>;

    fn format_totals(&self, totals: &RunTotals) -> Result<String>;

    /// One row per (hostname, operation)
    fn format_operations(&self, stats: &[OperationStats]) -> Result<String>;

    fn format_errors(&self, errors: &[ErrorCount]) -> Result<String>;

    fn format_warning(&self, warning: &str) -> String;

    /// Full report for a set of results
    fn format_report(&self, results: &[NetconfResult]) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("NETCONF Load Test Results")?);
        output.push_str("\n\n");
        output.push_str(&self.format_totals(&StatisticsEngine::totals(results))?);
        output.push_str("\n\n");
        output.push_str(&self.format_operations(&StatisticsEngine::summarize(results))?);

        let errors = StatisticsEngine::error_counts(results);
        if !errors.is_empty() {
            output.push_str("\n\n");
            output.push_str(&self.format_errors(&errors)?);
        }
        Ok(output)
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            max_width: 48,
        }
    }

    pub fn right(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Right,
            max_width: 16,
        }
    }
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Bordered text table
///
/// Widths are computed on the raw cell text, so any styling has to be
/// applied to the already padded cell through `render_with`.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<RowData>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: RowData) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        self.render_with(|_, _, cell| cell.to_string(), |header| header.to_string())
    }

    /// Render, passing each padded data cell through `paint(row, column, cell)`
    /// and each padded header through `paint_header`
    pub fn render_with<P, H>(&self, paint: P, paint_header: H) -> String
    where
        P: Fn(usize, usize, &str) -> String,
        H: Fn(&str) -> String,
    {
        let widths = self.column_widths();
        let border = Self::horizontal_border(&widths);
        let mut output = String::new();

        output.push_str(&border);
        output.push('\n');
        let headers: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| paint_header(&Self::align_text(&column.header, width, column.alignment)))
            .collect();
        output.push_str(&Self::join_cells(&headers));
        output.push('\n');
        output.push_str(&border);
        output.push('\n');

        for (row_idx, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(idx, (cell, &width))| {
                    let alignment = self.columns.get(idx).map(|c| c.alignment).unwrap_or(Alignment::Left);
                    paint(row_idx, idx, &Self::align_text(cell, width, alignment))
                })
                .collect();
            output.push_str(&Self::join_cells(&cells));
            output.push('\n');
        }

        output.push_str(&border);
        output
    }

    fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let content = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                content.max(column.header.chars().count()).min(column.max_width)
            })
            .collect()
    }

    fn join_cells(cells: &[String]) -> String {
        let mut row = String::from("|");
        for cell in cells {
            row.push(' ');
            row.push_str(cell);
            row.push_str(" |");
        }
        row
    }

    fn horizontal_border(widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
        let length = text.chars().count();
        if length >= width {
            return text.chars().take(width).collect();
        }

        let padding = " ".repeat(width - length);
        match alignment {
            Alignment::Left => format!("{}{}", text, padding),
            Alignment::Right => format!("{}{}", padding, text),
        }
    }
}

/// Milliseconds in a human readable unit
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Operations table shared by the plain and colored formatters
pub fn operations_table(stats: &[OperationStats]) -> Table {
    let mut table = Table::new(vec![
        Column::left("Host"),
        Column::left("Operation"),
        Column::right("Count"),
        Column::right("Errors"),
        Column::right("Min"),
        Column::right("Mean"),
        Column::right("Max"),
        Column::right("p50"),
        Column::right("p90"),
        Column::right("p99"),
    ]);

    for s in stats {
        table.push(vec![
            s.hostname.clone(),
            s.operation.clone(),
            s.count.to_string(),
            s.errors.to_string(),
            format_duration(s.min),
            format_duration(s.mean),
            format_duration(s.max),
            format_duration(s.p50),
            format_duration(s.p90),
            format_duration(s.p99),
        ]);
    }
    table
}

/// Column of the operations table holding the error count
pub const ERRORS_COLUMN: usize = 3;

/// Plain text formatter implementation
#[derive(Debug, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        writeln!(output, "  {}  ", title).map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        write!(output, "{}", border).map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;

        Ok(output)
    }

    fn format_totals(&self, totals: &RunTotals) -> Result<String> {
        let mut output = String::new();
        let fail = |e: std::fmt::Error| AppError::io(format!("Failed to format summary: {}", e));

        writeln!(output, "Run Summary:").map_err(fail)?;
        writeln!(output, "------------").map_err(fail)?;
        writeln!(output, "Results:      {}", totals.results).map_err(fail)?;
        writeln!(output, "Errors:       {}", totals.errors).map_err(fail)?;
        writeln!(output, "Success Rate: {}", format_percentage(totals.success_rate())).map_err(fail)?;
        writeln!(output, "Clients:      {}", totals.clients).map_err(fail)?;
        writeln!(output, "Duration:     {}", format_duration(totals.duration_ms)).map_err(fail)?;
        write!(output, "Throughput:   {:.2} req/s", totals.throughput).map_err(fail)?;

        Ok(output)
    }

    fn format_operations(&self, stats: &[OperationStats]) -> Result<String> {
        if stats.is_empty() {
            return Ok("No results recorded".to_string());
        }
        Ok(operations_table(stats).render())
    }

    fn format_errors(&self, errors: &[ErrorCount]) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Errors:").map_err(|e| AppError::io(format!("Failed to format errors: {}", e)))?;
        for (idx, error) in errors.iter().enumerate() {
            if idx > 0 {
                output.push('\n');
            }
            write!(output, "  {:>5}  {}", error.count, error.message)
                .map_err(|e| AppError::io(format!("Failed to format errors: {}", e)))?;
        }
        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("Warning: {}", warning)
    }
}
