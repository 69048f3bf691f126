//! FormFill Studio - job application form detection and autofill
//!
//! This library provides the core functionality for FormFill Studio, including:
//! - Headless page model with a synthetic notification log
//! - Keyword-based application form detection
//! - Multi-source field classification driven by policy tables
//! - Best-effort profile-to-form filling
//! - Report export capabilities

pub mod core;
pub mod config;
pub mod detector;
pub mod dom;
pub mod export;
pub mod policy;
pub mod profile;
pub mod utils;
pub mod error;
pub mod logging;

// Re-export main types for convenience
pub use crate::core::FormFillStudio;
pub use crate::config::AppConfig;
pub use crate::detector::{FillResult, FormFieldDetector, ScanReport};
pub use crate::dom::{Page, PageParser};
pub use crate::policy::{DetectionPolicy, FieldCategory};
pub use crate::profile::Profile;
