/// Text utility functions
pub struct TextUtils;

impl TextUtils {
    /// Trim and lowercase for case-insensitive matching
    pub fn fold(s: &str) -> String {
        s.trim().to_lowercase()
    }

    /// Collapse whitespace runs into single spaces
    pub fn collapse_whitespace(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Check if string is empty or whitespace only
    pub fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }

    /// Truncate string to max length
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(TextUtils::fold("  First Name "), "first name");
        assert_eq!(TextUtils::fold("EMAIL"), "email");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(TextUtils::collapse_whitespace("Apply  for\n this\tjob"), "Apply for this job");
        assert_eq!(TextUtils::collapse_whitespace("   "), "");
    }

    #[test]
    fn test_is_blank() {
        assert!(TextUtils::is_blank(""));
        assert!(TextUtils::is_blank(" \t\n"));
        assert!(!TextUtils::is_blank(" x "));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(TextUtils::truncate("hello", 10), "hello");
        assert_eq!(TextUtils::truncate("hello world", 8), "hello...");
    }
}
