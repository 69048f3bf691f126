use anyhow::Result;
use csv::WriterBuilder;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{DataTransformer, InternalExportStats};
use crate::config::ExportConfig;

/// Write report rows as a flat CSV table
pub async fn export_csv(
    rows: &[serde_json::Value],
    output_path: &str,
    _config: &ExportConfig,
) -> Result<InternalExportStats> {
    debug!("Writing {} report rows as CSV to {}", rows.len(), output_path);

    let flat_rows = DataTransformer::flatten_json(rows)?;
    let columns = DataTransformer::column_union(&flat_rows);

    let file = std::fs::File::create(output_path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    if columns.is_empty() {
        // A headerless file confuses spreadsheet importers, so an empty
        // report still gets a marker column.
        writer.write_record(["no_data"])?;
    } else {
        writer.write_record(&columns)?;
        for row in &flat_rows {
            writer.write_record(columns.iter().map(|column| cell(row, column)))?;
        }
    }

    writer.flush()?;
    drop(writer);

    let file_size = tokio::fs::metadata(output_path).await?.len();
    info!("CSV report written: {} rows, {} bytes", rows.len(), file_size);

    Ok(InternalExportStats {
        file_size_bytes: file_size,
    })
}

fn cell<'a>(row: &'a HashMap<String, String>, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn test_config() -> ExportConfig {
        ExportConfig {
            default_format: "csv".to_string(),
            output_directory: std::path::PathBuf::from("/tmp"),
            pretty_json: true,
        }
    }

    #[tokio::test]
    async fn test_csv_export() {
        let rows = vec![
            json!({"label": "email", "category": "email", "status": "filled"}),
            json!({"label": "phone", "category": "phone", "status": "write_failed"}),
        ];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        let stats = export_csv(&rows, output_path, &test_config()).await.unwrap();

        assert!(stats.file_size_bytes > 0);

        // Columns are sorted alphabetically
        let contents = std::fs::read_to_string(output_path).unwrap();
        assert!(contents.contains("category,label,status"));
        assert!(contents.contains("email,email,filled"));
        assert!(contents.contains("phone,phone,write_failed"));
    }

    #[tokio::test]
    async fn test_empty_csv_export() {
        let rows: Vec<serde_json::Value> = vec![];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        let stats = export_csv(&rows, output_path, &test_config()).await.unwrap();

        assert!(stats.file_size_bytes > 0);

        let contents = std::fs::read_to_string(output_path).unwrap();
        assert!(contents.contains("no_data"));
    }

    #[tokio::test]
    async fn test_missing_columns_become_empty_cells() {
        let rows = vec![
            json!({"label": "email", "status": "filled"}),
            json!({"label": "resume", "status": "skipped", "note": "file input"}),
        ];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        export_csv(&rows, output_path, &test_config()).await.unwrap();

        let contents = std::fs::read_to_string(output_path).unwrap();
        assert!(contents.contains("label,note,status"));
        assert!(contents.contains("email,,filled"));
    }

    #[tokio::test]
    async fn test_nested_rows_are_flattened() {
        let rows = vec![json!({
            "field": {"form": 0, "field": 3},
            "label": "work_location",
            "status": "no_option_match"
        })];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        export_csv(&rows, output_path, &test_config()).await.unwrap();

        let contents = std::fs::read_to_string(output_path).unwrap();
        assert!(contents.contains("field_field,field_form,label,status"));
        assert!(contents.contains("3,0,work_location,no_option_match"));
    }
}
