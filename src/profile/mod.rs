use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::policy::FieldCategory;
use crate::utils::text_utils::TextUtils;

/// Candidate profile record supplied by the host application.
/// Field names follow the host's camelCase JSON contract; the record
/// is read-only from this crate's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub portfolio: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl Profile {
    /// Resolve the candidate value for a field category.
    ///
    /// Resolution order per category is fixed: full name falls back to
    /// composing first and last names, location falls back to city, and
    /// portfolio walks the profile links in preference order. Resume and
    /// cover letter have no text mapping and always resolve to None.
    pub fn resolve(&self, category: FieldCategory) -> Option<String> {
        match category {
            FieldCategory::Name => non_blank(&self.full_name).or_else(|| self.composed_name()),
            FieldCategory::FirstName => non_blank(&self.first_name),
            FieldCategory::LastName => non_blank(&self.last_name),
            FieldCategory::Email => non_blank(&self.email),
            FieldCategory::Phone => non_blank(&self.phone),
            FieldCategory::Location => non_blank(&self.location).or_else(|| non_blank(&self.city)),
            FieldCategory::Portfolio => non_blank(&self.portfolio)
                .or_else(|| non_blank(&self.website))
                .or_else(|| non_blank(&self.linkedin))
                .or_else(|| non_blank(&self.github)),
            FieldCategory::Linkedin => non_blank(&self.linkedin),
            FieldCategory::Github => non_blank(&self.github),
            FieldCategory::Resume | FieldCategory::CoverLetter => None,
        }
    }

    /// Compose a full name from first and last, skipping absent halves
    fn composed_name(&self) -> Option<String> {
        let parts: Vec<String> = [non_blank(&self.first_name), non_blank(&self.last_name)]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// True when no field resolves to a usable value
    pub fn is_empty(&self) -> bool {
        FieldCategory::ALL
            .iter()
            .all(|category| self.resolve(*category).is_none())
    }

    /// Quality checks on the record. Structural problems are errors;
    /// merely suspicious values are logged and tolerated.
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = non_blank(&self.email) {
            let email_format = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?;
            if !email_format.is_match(&email) {
                return Err(crate::error::FormFillError::InvalidProfile {
                    field: format!("email ({})", email),
                }
                .into());
            }
        }

        if let Some(phone) = non_blank(&self.phone) {
            let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
            if digits < 7 {
                warn!("Profile phone number looks short: {}", phone);
            }
        }

        for (label, value) in [
            ("portfolio", &self.portfolio),
            ("website", &self.website),
            ("linkedin", &self.linkedin),
            ("github", &self.github),
        ] {
            if let Some(link) = non_blank(value) {
                if link.starts_with("http") && !crate::utils::is_valid_url(&link) {
                    return Err(crate::error::FormFillError::InvalidProfile {
                        field: format!("{} ({})", label, link),
                    }
                    .into());
                }
            }
        }

        debug!("Profile validation passed");
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|s| !TextUtils::is_blank(s))
        .map(|s| s.trim().to_string())
}

/// Source of the candidate profile record
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the stored profile, or None when no record exists
    async fn fetch_profile(&self) -> Result<Option<Profile>>;
}

/// Profile store backed by a JSON file on disk
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn fetch_profile(&self) -> Result<Option<Profile>> {
        if !self.path.exists() {
            info!("No profile record at {}", self.path.display());
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let profile: Profile = serde_json::from_str(&content)?;

        debug!("Profile record loaded from {}", self.path.display());
        Ok(Some(profile))
    }
}

/// In-memory profile store for embedding hosts and tests
pub struct InMemoryProfileStore {
    profile: Option<Profile>,
}

impl InMemoryProfileStore {
    pub fn new(profile: Option<Profile>) -> Self {
        Self { profile }
    }

    pub fn empty() -> Self {
        Self { profile: None }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(&self) -> Result<Option<Profile>> {
        Ok(self.profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Profile {
        Profile {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("+1 555 010 2030".to_string()),
            city: Some("London".to_string()),
            github: Some("https://github.com/adalovelace".to_string()),
            ..Profile::default()
        }
    }

    #[test]
    fn test_name_composition_fallback() {
        let profile = ada();
        assert_eq!(profile.resolve(FieldCategory::Name), Some("Ada Lovelace".to_string()));

        let explicit = Profile {
            full_name: Some("Augusta Ada King".to_string()),
            ..ada()
        };
        assert_eq!(
            explicit.resolve(FieldCategory::Name),
            Some("Augusta Ada King".to_string())
        );

        let first_only = Profile {
            first_name: Some("Ada".to_string()),
            ..Profile::default()
        };
        assert_eq!(first_only.resolve(FieldCategory::Name), Some("Ada".to_string()));
    }

    #[test]
    fn test_location_falls_back_to_city() {
        let profile = ada();
        assert_eq!(profile.resolve(FieldCategory::Location), Some("London".to_string()));

        let with_location = Profile {
            location: Some("London, UK".to_string()),
            ..ada()
        };
        assert_eq!(
            with_location.resolve(FieldCategory::Location),
            Some("London, UK".to_string())
        );
    }

    #[test]
    fn test_portfolio_link_preference_order() {
        let profile = ada();
        // Only the github link is present, so portfolio borrows it
        assert_eq!(
            profile.resolve(FieldCategory::Portfolio),
            Some("https://github.com/adalovelace".to_string())
        );

        let with_site = Profile {
            website: Some("https://ada.dev".to_string()),
            ..ada()
        };
        assert_eq!(
            with_site.resolve(FieldCategory::Portfolio),
            Some("https://ada.dev".to_string())
        );
    }

    #[test]
    fn test_upload_categories_never_resolve() {
        let profile = ada();
        assert_eq!(profile.resolve(FieldCategory::Resume), None);
        assert_eq!(profile.resolve(FieldCategory::CoverLetter), None);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let profile = Profile {
            email: Some("   ".to_string()),
            ..Profile::default()
        };
        assert_eq!(profile.resolve(FieldCategory::Email), None);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_camel_case_contract() {
        let json = r#"{
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "linkedin": "https://linkedin.com/in/adalovelace"
        }"#;

        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.resolve(FieldCategory::Linkedin).as_deref(), Some("https://linkedin.com/in/adalovelace"));

        let back = serde_json::to_string(&profile).unwrap();
        assert!(back.contains("fullName"));
        assert!(!back.contains("full_name"));
    }

    #[test]
    fn test_validate_flags_malformed_email() {
        let profile = Profile {
            email: Some("not-an-email".to_string()),
            ..Profile::default()
        };
        assert!(profile.validate().is_err());
        assert!(ada().validate().is_ok());
    }

    #[tokio::test]
    async fn test_json_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileProfileStore::new(dir.path().join("profile.json"));
        assert_eq!(store.fetch_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        tokio::fs::write(&path, serde_json::to_string(&ada()).unwrap())
            .await
            .unwrap();

        let store = JsonFileProfileStore::new(&path);
        let fetched = store.fetch_profile().await.unwrap().unwrap();
        assert_eq!(fetched, ada());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryProfileStore::new(Some(ada()));
        assert_eq!(store.fetch_profile().await.unwrap(), Some(ada()));
        assert_eq!(InMemoryProfileStore::empty().fetch_profile().await.unwrap(), None);
    }
}
