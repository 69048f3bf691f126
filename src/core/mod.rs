use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::detector::{ClassifiedField, FillResult, FormFieldDetector, ScanReport};
use crate::dom::{Page, PageParser};
use crate::export::{ExportFormat, ExportManager, ExportStats};
use crate::policy::DetectionPolicy;
use crate::profile::{JsonFileProfileStore, Profile, ProfileStore};

/// Core application state and orchestrator
pub struct FormFillStudio {
    config: AppConfig,
    detector: Arc<FormFieldDetector>,
    profile_store: Arc<dyn ProfileStore>,
    export_manager: Arc<ExportManager>,
    run_id: String,
}

impl FormFillStudio {
    /// Initialize the core application with all subsystems
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing FormFill Studio core");

        // Load and validate the detection policy
        let policy = Self::load_policy(&config).await?;
        let detector = Arc::new(FormFieldDetector::new(policy));
        info!("Form field detector initialized");

        // Initialize profile store
        let profile_store: Arc<dyn ProfileStore> =
            Arc::new(JsonFileProfileStore::new(&config.profile.profile_file));
        info!("Profile store initialized");

        // Initialize export manager
        let export_manager = Arc::new(ExportManager::new(&config.export)?);
        info!("Export manager initialized");

        let run_id = crate::utils::generate_id();
        info!("Session {} ready", run_id);

        Ok(Self {
            config,
            detector,
            profile_store,
            export_manager,
            run_id,
        })
    }

    /// Replace the profile store, for embedding hosts and tests
    pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = store;
        self
    }

    async fn load_policy(config: &AppConfig) -> Result<DetectionPolicy> {
        let policy = match &config.policy.policy_file {
            Some(path) => {
                info!("Loading detection policy from {}", path.display());
                DetectionPolicy::load_from_file(path).await?
            }
            None => DetectionPolicy::default(),
        };

        policy.validate()?;
        Ok(policy)
    }

    /// Survey a document without touching it
    pub fn scan_document(&self, html: &str) -> Result<ScanReport> {
        let page = PageParser::parse_document(html)?;
        Ok(self.detector.scan(&page))
    }

    /// Classify every field of the matched forms in a document
    pub fn classify_document(&self, html: &str) -> Result<Vec<ClassifiedField>> {
        let page = PageParser::parse_document(html)?;
        Ok(self.detector.classify_page(&page))
    }

    /// Parse a document and fill it from the stored profile.
    /// Returns the mutated page alongside the fill result.
    pub async fn fill_document(&self, html: &str) -> Result<(Page, FillResult)> {
        let mut page = PageParser::parse_document(html)?;
        let profile = self.fetch_profile().await?;

        let result = self.detector.auto_fill(&mut page, profile.as_ref());
        Ok((page, result))
    }

    /// Fill an already-parsed page
    pub fn auto_fill_page(&self, page: &mut Page, profile: Option<&Profile>) -> FillResult {
        self.detector.auto_fill(page, profile)
    }

    /// Fetch the stored profile, validating it when configured to
    pub async fn fetch_profile(&self) -> Result<Option<Profile>> {
        let profile = self.profile_store.fetch_profile().await?;

        if let Some(profile) = &profile {
            if self.config.profile.validate_on_load {
                profile.validate()?;
            }
        }

        Ok(profile)
    }

    /// Export a fill result as report rows
    pub async fn export_fill_result(
        &self,
        result: &FillResult,
        output_path: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportStats> {
        let rows = Self::fill_result_rows(result);
        let path = match output_path {
            Some(path) => path.to_string(),
            None => self.export_manager.default_output_path(&self.run_id, &format),
        };

        self.export_manager.export(&rows, &path, format).await
    }

    /// Export a scan report
    pub async fn export_scan_report(
        &self,
        report: &ScanReport,
        output_path: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportStats> {
        let rows = vec![serde_json::to_value(report)?];
        let path = match output_path {
            Some(path) => path.to_string(),
            None => self.export_manager.default_output_path(&self.run_id, &format),
        };

        self.export_manager.export(&rows, &path, format).await
    }

    /// One row per field outcome; failures collapse to a single summary row
    fn fill_result_rows(result: &FillResult) -> Vec<serde_json::Value> {
        if result.outcomes.is_empty() {
            return vec![serde_json::json!({
                "success": result.success,
                "count": result.count,
                "reason": result.reason_text(),
            })];
        }

        result
            .outcomes
            .iter()
            .map(|outcome| {
                serde_json::json!({
                    "form": outcome.field.form,
                    "field": outcome.field.field,
                    "label": outcome.label,
                    "category": outcome.category.map(|category| category.as_str()),
                    "status": outcome.status,
                })
            })
            .collect()
    }

    /// Active detection policy
    pub fn policy(&self) -> &DetectionPolicy {
        self.detector.policy()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
