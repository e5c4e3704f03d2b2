//! Result sink and report output
//!
//! [`ResultCollector`] is the consumer end of the result channel: it stores
//! every record, optionally appends it to a JSON lines file and prints a
//! progress marker per record. The formatters render the statistics of the
//! collected records as a table.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use formatter::{
    format_duration, format_percentage, operations_table, Alignment, Column, PlainFormatter, ReportFormatter,
    RowData, Table,
};

use crate::defaults::{RESULTS_FILE_NAME, SUITE_COPY_FILE_NAME};
use crate::error::{AppError, ErrorContext, Result};
use crate::models::NetconfResult;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

/// Output formatting factory
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    pub fn create_formatter(enable_color: bool) -> Box<dyn ReportFormatter> {
        if enable_color {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}

/// Consumer of the run's result stream
pub struct ResultCollector {
    writer: Option<BufWriter<File>>,
    run_dir: Option<PathBuf>,
    progress: bool,
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCollector {
    /// Collector that only keeps records in memory
    pub fn new() -> Self {
        Self {
            writer: None,
            run_dir: None,
            progress: false,
        }
    }

    /// Print `.` per successful and `E` per failed result on stdout
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Persist records under `<output_dir>/<run_id>/`
    ///
    /// The suite document, when given, is copied next to the results so the
    /// directory describes the run on its own.
    pub async fn with_output_dir(mut self, output_dir: &Path, run_id: &str, suite_file: Option<&Path>) -> Result<Self> {
        let run_dir = output_dir.join(run_id);
        fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}: {}", run_dir.display(), e)))?;

        if let Some(suite_file) = suite_file {
            let copy = run_dir.join(SUITE_COPY_FILE_NAME);
            fs::copy(suite_file, &copy)
                .await
                .map_err(|e| AppError::io(format!("Failed to copy {} to {}: {}", suite_file.display(), copy.display(), e)))?;
        }

        let results_path = run_dir.join(RESULTS_FILE_NAME);
        let file = File::create(&results_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}: {}", results_path.display(), e)))?;

        self.writer = Some(BufWriter::new(file));
        self.run_dir = Some(run_dir);
        Ok(self)
    }

    /// Directory holding this run's files, if any are written
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    pub fn results_path(&self) -> Option<PathBuf> {
        self.run_dir.as_ref().map(|dir| dir.join(RESULTS_FILE_NAME))
    }

    /// Drain `receiver` until every sender is gone and return all records
    pub async fn collect(&mut self, mut receiver: mpsc::UnboundedReceiver<NetconfResult>) -> Result<Vec<NetconfResult>> {
        let mut results = Vec::new();

        while let Some(result) = receiver.recv().await {
            if let Some(writer) = self.writer.as_mut() {
                let mut line = serde_json::to_string(&result).context("Failed to serialize result")?;
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
            }
            if self.progress {
                Self::print_marker(&result);
            }
            results.push(result);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await?;
        }
        if self.progress && !results.is_empty() {
            println!();
        }
        Ok(results)
    }

    fn print_marker(result: &NetconfResult) {
        let marker = if result.is_successful() { "." } else { "E" };
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}", marker);
        let _ = stdout.flush();
    }
}

/// Read records written by a [`ResultCollector`]
pub async fn load_results(path: &Path) -> Result<Vec<NetconfResult>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(format!("Failed to read results file {}: {}", path.display(), e)))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| AppError::parse(format!("{} line {}: {}", path.display(), index + 1, e)))
        })
        .collect()
}
