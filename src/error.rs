use thiserror::Error;

/// Comprehensive error types for FormFill Studio
#[derive(Error, Debug)]
pub enum FormFillError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid configuration file: {path}")]
    InvalidConfig { path: String },

    // Detection policy errors
    #[error("Policy validation error: {message}")]
    PolicyValidation { message: String },

    #[error("Policy parsing error: {message}")]
    PolicyParsing { message: String },

    #[error("Invalid policy structure: {field}")]
    InvalidPolicy { field: String },

    // Document errors
    #[error("Document parsing error: {message}")]
    DocumentParse { message: String },

    #[error("Document read failed: {path}")]
    DocumentRead { path: String },

    // Profile errors
    #[error("Profile error: {message}")]
    Profile { message: String },

    #[error("Profile not found: {path}")]
    ProfileNotFound { path: String },

    #[error("Invalid profile field: {field}")]
    InvalidProfile { field: String },

    // Export errors
    #[error("Export error: {message}")]
    Export { message: String },

    #[error("File write failed: {path}")]
    FileWrite { path: String },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    // System errors
    #[error("File system error: {path}")]
    FileSystem { path: String },

    #[error("Permission denied: {resource}")]
    PermissionDenied { resource: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Invalid state: {state}")]
    InvalidState { state: String },
}

impl FormFillError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a policy validation error
    pub fn policy_validation(message: impl Into<String>) -> Self {
        Self::PolicyValidation { message: message.into() }
    }

    /// Create a policy parsing error
    pub fn policy_parsing(message: impl Into<String>) -> Self {
        Self::PolicyParsing { message: message.into() }
    }

    /// Create a document parsing error
    pub fn document_parse(message: impl Into<String>) -> Self {
        Self::DocumentParse { message: message.into() }
    }

    /// Create a profile error
    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile { message: message.into() }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export { message: message.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::InvalidConfig { .. } => "configuration",
            Self::PolicyValidation { .. } | Self::PolicyParsing { .. } | Self::InvalidPolicy { .. } => "policy",
            Self::DocumentParse { .. } | Self::DocumentRead { .. } => "document",
            Self::Profile { .. } | Self::ProfileNotFound { .. } | Self::InvalidProfile { .. } => "profile",
            Self::Export { .. } | Self::FileWrite { .. } | Self::UnsupportedFormat { .. } => "export",
            Self::FileSystem { .. } | Self::PermissionDenied { .. } => "system",
            Self::Internal { .. } | Self::InvalidState { .. } => "internal",
        }
    }

    /// Check if the error stems from user-supplied input rather than the system
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Configuration { .. } |
            Self::InvalidConfig { .. } |
            Self::PolicyValidation { .. } |
            Self::PolicyParsing { .. } |
            Self::InvalidPolicy { .. } |
            Self::ProfileNotFound { .. } |
            Self::InvalidProfile { .. } |
            Self::UnsupportedFormat { .. } => true,

            _ => false,
        }
    }
}

/// Result type alias for FormFill Studio
pub type FormFillResult<T> = std::result::Result<T, FormFillError>;

/// Convert anyhow::Error to FormFillError
impl From<anyhow::Error> for FormFillError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = FormFillError::config("missing policy path");
        assert_eq!(error.category(), "configuration");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(FormFillError::policy_validation("dup alias").category(), "policy");
        assert_eq!(FormFillError::document_parse("bad html").category(), "document");
        assert_eq!(FormFillError::profile("empty record").category(), "profile");
        assert_eq!(FormFillError::export("no rows").category(), "export");
        assert_eq!(FormFillError::internal("oops").category(), "internal");
    }

    #[test]
    fn test_user_error_split() {
        assert!(FormFillError::policy_parsing("bad yaml").is_user_error());
        assert!(!FormFillError::internal("poisoned lock").is_user_error());
        assert!(!FormFillError::FileWrite { path: "/tmp/x".into() }.is_user_error());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: FormFillError = anyhow::anyhow!("wrapped").into();
        assert_eq!(err.category(), "internal");
        assert!(err.to_string().contains("wrapped"));
    }
}
