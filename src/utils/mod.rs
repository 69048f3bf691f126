//! Small helpers shared across modules

use std::path::Path;

pub mod text_utils;

/// Render a duration for console summaries
pub fn format_duration(duration: std::time::Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.1}s", total_ms as f64 / 1000.0)
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Fresh identifier for a run
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn is_valid_url(url: &str) -> bool {
    url::Url::parse(url).is_ok()
}

/// Lowercased extension of a path, if any
pub fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(std::time::Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://github.com/adalovelace"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("policy.YAML"), Some("yaml".to_string()));
        assert_eq!(get_file_extension("report.json"), Some("json".to_string()));
        assert_eq!(get_file_extension("no_extension"), None);
    }

    #[test]
    fn test_generate_id_is_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
