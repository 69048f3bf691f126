use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

pub mod csv_exporter;
pub mod json_exporter;

use crate::config::ExportConfig;

/// Report output formats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(anyhow::anyhow!("Invalid export format: {}", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Statistics describing one written report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStats {
    pub format: ExportFormat,
    pub file_path: String,
    pub record_count: usize,
    pub file_size_bytes: u64,
    pub export_duration_ms: u64,
}

/// Writes scan and fill reports to disk
pub struct ExportManager {
    config: ExportConfig,
}

impl ExportManager {
    pub fn new(config: &ExportConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_directory)?;

        Ok(Self {
            config: config.clone(),
        })
    }

    /// Write report rows in the requested format
    pub async fn export(
        &self,
        rows: &[Value],
        output_path: &str,
        format: ExportFormat,
    ) -> Result<ExportStats> {
        info!("Writing {} report rows to {} as {}", rows.len(), output_path, format);
        let started = std::time::Instant::now();

        let written = match format {
            ExportFormat::Json => json_exporter::export_json(rows, output_path, &self.config).await?,
            ExportFormat::Csv => csv_exporter::export_csv(rows, output_path, &self.config).await?,
        };

        let stats = ExportStats {
            format,
            file_path: output_path.to_string(),
            record_count: rows.len(),
            file_size_bytes: written.file_size_bytes,
            export_duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Report written: {} rows, {} bytes in {}ms",
            stats.record_count, stats.file_size_bytes, stats.export_duration_ms
        );

        Ok(stats)
    }

    /// Write the same rows in several formats, skipping formats that fail
    pub async fn export_multiple(
        &self,
        rows: &[Value],
        base_path: &str,
        formats: &[ExportFormat],
    ) -> Result<Vec<ExportStats>> {
        let mut all_stats = Vec::new();

        for format in formats {
            let output_path = format!("{}.{}", base_path, format);

            match self.export(rows, &output_path, format.clone()).await {
                Ok(stats) => all_stats.push(stats),
                Err(e) => error!("Report in {} format failed: {}", format, e),
            }
        }

        Ok(all_stats)
    }

    pub fn get_supported_formats() -> Vec<ExportFormat> {
        vec![ExportFormat::Json, ExportFormat::Csv]
    }

    pub fn get_file_extension(format: &ExportFormat) -> &'static str {
        match format {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// Default filename carrying the run id and a timestamp
    pub fn generate_filename(run_id: &str, format: &ExportFormat) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let extension = Self::get_file_extension(format);
        format!("formfill_{}_{}.{}", run_id, timestamp, extension)
    }

    pub fn default_output_path(&self, run_id: &str, format: &ExportFormat) -> String {
        self.config
            .output_directory
            .join(Self::generate_filename(run_id, format))
            .to_string_lossy()
            .to_string()
    }
}

/// What the format-specific writers report back
#[derive(Debug)]
pub(crate) struct InternalExportStats {
    pub file_size_bytes: u64,
}

/// Turns report rows into flat tables for CSV output
pub struct DataTransformer;

impl DataTransformer {
    /// Flatten each row into a string map keyed by underscore paths
    pub fn flatten_json(rows: &[Value]) -> Result<Vec<HashMap<String, String>>> {
        let mut flattened = Vec::with_capacity(rows.len());

        for row in rows {
            let mut flat_row = HashMap::new();
            Self::flatten_value(row, "", &mut flat_row);
            flattened.push(flat_row);
        }

        Ok(flattened)
    }

    fn flatten_value(value: &Value, path: &str, row: &mut HashMap<String, String>) {
        match value {
            Value::Object(map) => {
                for (key, nested) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}_{}", path, key)
                    };
                    Self::flatten_value(nested, &child_path, row);
                }
            }
            Value::Array(items) => {
                for (index, nested) in items.iter().enumerate() {
                    Self::flatten_value(nested, &format!("{}_{}", path, index), row);
                }
            }
            scalar => {
                row.insert(path.to_string(), Self::scalar_text(scalar));
            }
        }
    }

    fn scalar_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            _ => value.to_string(),
        }
    }

    /// Sorted union of the column names across flattened rows
    pub fn column_union(rows: &[HashMap<String, String>]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        for row in rows {
            for key in row.keys() {
                seen.insert(key);
            }
        }

        let mut columns: Vec<String> = seen.into_iter().map(str::to_string).collect();
        columns.sort();
        columns
    }
}
