use anyhow::Result;
use tracing::{debug, info};

use super::InternalExportStats;
use crate::config::ExportConfig;

/// Write report rows as a JSON array
pub async fn export_json(
    rows: &[serde_json::Value],
    output_path: &str,
    config: &ExportConfig,
) -> Result<InternalExportStats> {
    debug!("Writing {} report rows as JSON to {}", rows.len(), output_path);

    let body = if config.pretty_json {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    tokio::fs::write(output_path, body).await?;

    let file_size = tokio::fs::metadata(output_path).await?.len();
    info!("JSON report written: {} rows, {} bytes", rows.len(), file_size);

    Ok(InternalExportStats {
        file_size_bytes: file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    fn test_config(pretty: bool) -> ExportConfig {
        ExportConfig {
            default_format: "json".to_string(),
            output_directory: std::path::PathBuf::from("/tmp"),
            pretty_json: pretty,
        }
    }

    #[tokio::test]
    async fn test_json_export() {
        let rows = vec![
            json!({"label": "email", "category": "email", "status": "filled"}),
            json!({"label": "resume", "category": "resume", "status": "no_profile_value"}),
        ];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        let stats = export_json(&rows, output_path, &test_config(true)).await.unwrap();

        assert!(stats.file_size_bytes > 0);

        let contents = std::fs::read_to_string(output_path).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["status"], json!("filled"));
    }

    #[tokio::test]
    async fn test_compact_json_export() {
        let rows = vec![json!({"label": "phone", "status": "filled"})];

        let temp_file = NamedTempFile::new().unwrap();
        let output_path = temp_file.path().to_str().unwrap();

        export_json(&rows, output_path, &test_config(false)).await.unwrap();

        let contents = std::fs::read_to_string(output_path).unwrap();
        assert!(!contents.contains('\n'));
        let parsed: Vec<Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
