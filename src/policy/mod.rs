use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod validator;

pub use validator::PolicyValidator;

/// Semantic categories a form field can be classified into.
///
/// Declaration order is part of the contract: classification walks the
/// policy rules top to bottom and the first matching category wins, so
/// earlier categories shadow later ones for ambiguous descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    Location,
    Portfolio,
    Linkedin,
    Github,
    Resume,
    CoverLetter,
}

impl FieldCategory {
    /// All categories in matching order
    pub const ALL: [FieldCategory; 11] = [
        FieldCategory::Name,
        FieldCategory::FirstName,
        FieldCategory::LastName,
        FieldCategory::Email,
        FieldCategory::Phone,
        FieldCategory::Location,
        FieldCategory::Portfolio,
        FieldCategory::Linkedin,
        FieldCategory::Github,
        FieldCategory::Resume,
        FieldCategory::CoverLetter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Name => "name",
            FieldCategory::FirstName => "first_name",
            FieldCategory::LastName => "last_name",
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::Location => "location",
            FieldCategory::Portfolio => "portfolio",
            FieldCategory::Linkedin => "linkedin",
            FieldCategory::Github => "github",
            FieldCategory::Resume => "resume",
            FieldCategory::CoverLetter => "cover_letter",
        }
    }
}

impl std::fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classification rule: a category and the lowercase substrings
/// that map a field's descriptive strings onto it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: FieldCategory,
    pub aliases: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: FieldCategory, aliases: &[&str]) -> Self {
        Self {
            category,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Detection policy: what marks a form as a job application, and how
/// field descriptors map onto categories. Externally suppliable as
/// YAML or JSON; the built-in default carries the stock tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionPolicy {
    pub version: String,
    pub form_keywords: Vec<String>,
    pub categories: Vec<CategoryRule>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            form_keywords: vec![
                "apply".to_string(),
                "application".to_string(),
                "resume".to_string(),
                "cv".to_string(),
                "cover letter".to_string(),
                "job".to_string(),
                "position".to_string(),
            ],
            categories: vec![
                // A bare "name" alias would swallow first/last name fields,
                // so the full-name rule matches explicit phrasings only.
                CategoryRule::new(
                    FieldCategory::Name,
                    &["full name", "full_name", "fullname", "full-name", "your name", "applicant name"],
                ),
                CategoryRule::new(
                    FieldCategory::FirstName,
                    &["first name", "first_name", "firstname", "first-name", "given name", "fname"],
                ),
                CategoryRule::new(
                    FieldCategory::LastName,
                    &["last name", "last_name", "lastname", "last-name", "surname", "family name", "lname"],
                ),
                CategoryRule::new(FieldCategory::Email, &["email", "e-mail"]),
                CategoryRule::new(FieldCategory::Phone, &["phone", "mobile", "tel", "cell"]),
                CategoryRule::new(
                    FieldCategory::Location,
                    &["location", "city", "address", "state", "country", "postal", "zip"],
                ),
                CategoryRule::new(FieldCategory::Portfolio, &["portfolio", "website", "personal site"]),
                CategoryRule::new(FieldCategory::Linkedin, &["linkedin", "linked-in", "linked in"]),
                CategoryRule::new(FieldCategory::Github, &["github", "git-hub"]),
                CategoryRule::new(FieldCategory::Resume, &["resume", "cv", "curriculum vitae"]),
                CategoryRule::new(
                    FieldCategory::CoverLetter,
                    &["cover letter", "cover_letter", "coverletter", "cover-letter", "motivation"],
                ),
            ],
            metadata: None,
        }
    }
}

impl DetectionPolicy {
    /// Create a detection policy from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let policy: DetectionPolicy = serde_yaml::from_str(yaml)?;
        Ok(policy)
    }

    /// Convert the policy to a YAML string
    pub fn to_yaml(&self) -> Result<String, PolicyError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a detection policy from a JSON string
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: DetectionPolicy = serde_json::from_str(json)?;
        Ok(policy)
    }

    /// Convert the policy to a JSON string
    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a policy file, dispatching on its extension
    pub async fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;

        let policy = match crate::utils::get_file_extension(path).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            Some("json") => Self::from_json(&content)?,
            other => {
                return Err(PolicyError::UnsupportedFile(
                    other.unwrap_or("none").to_string(),
                )
                .into())
            }
        };

        Ok(policy)
    }

    /// Validate the policy structure
    pub fn validate(&self) -> Result<()> {
        let validator = PolicyValidator::new();
        validator.validate(self)
    }

    /// Find the rule for a category
    pub fn rule_for(&self, category: FieldCategory) -> Option<&CategoryRule> {
        self.categories.iter().find(|rule| rule.category == category)
    }

    /// Check whether a category is covered by this policy
    pub fn has_category(&self, category: FieldCategory) -> bool {
        self.rule_for(category).is_some()
    }

    /// Add metadata
    pub fn add_metadata(&mut self, key: String, value: serde_json::Value) {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
    }

    /// Get metadata value
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref()?.get(key)
    }
}

/// Policy parsing errors
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid YAML format: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unsupported policy file type: {0}")]
    UnsupportedFile(String),
}

/// Policy examples for testing and documentation
pub struct PolicyExamples;

impl PolicyExamples {
    /// A reduced policy that only screens for contact basics
    pub fn contact_basics() -> DetectionPolicy {
        DetectionPolicy {
            version: "1.0".to_string(),
            form_keywords: vec!["apply".to_string(), "application".to_string()],
            categories: vec![
                CategoryRule::new(FieldCategory::Email, &["email", "e-mail"]),
                CategoryRule::new(FieldCategory::Phone, &["phone", "mobile"]),
            ],
            metadata: Some({
                let mut metadata = HashMap::new();
                metadata.insert(
                    "description".to_string(),
                    serde_json::Value::String("Contact-only screening policy".to_string()),
                );
                metadata
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = DetectionPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.categories.len(), FieldCategory::ALL.len());
    }

    #[test]
    fn test_default_category_order_matches_contract() {
        let policy = DetectionPolicy::default();
        let declared: Vec<FieldCategory> = policy.categories.iter().map(|r| r.category).collect();
        assert_eq!(declared, FieldCategory::ALL.to_vec());
    }

    #[test]
    fn test_yaml_round_trip() {
        let policy = DetectionPolicy::default();
        let yaml = policy.to_yaml().unwrap();
        assert!(yaml.contains("first_name"));
        assert!(yaml.contains("cover letter"));

        let restored = DetectionPolicy::from_yaml(&yaml).unwrap();
        assert_eq!(restored.form_keywords, policy.form_keywords);
        assert_eq!(restored.categories.len(), policy.categories.len());
    }

    #[test]
    fn test_json_round_trip() {
        let policy = PolicyExamples::contact_basics();
        let json = policy.to_json().unwrap();
        let restored = DetectionPolicy::from_json(&json).unwrap();
        assert_eq!(restored.categories.len(), 2);
        assert_eq!(restored.categories[0].category, FieldCategory::Email);
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let result = DetectionPolicy::from_yaml("version: [unclosed");
        assert!(matches!(result, Err(PolicyError::InvalidYaml(_))));
    }

    #[test]
    fn test_rule_lookup() {
        let policy = DetectionPolicy::default();
        let rule = policy.rule_for(FieldCategory::Linkedin).unwrap();
        assert!(rule.aliases.contains(&"linkedin".to_string()));
        assert!(policy.has_category(FieldCategory::CoverLetter));

        let reduced = PolicyExamples::contact_basics();
        assert!(!reduced.has_category(FieldCategory::Github));
    }

    #[test]
    fn test_example_policy_is_valid() {
        assert!(PolicyExamples::contact_basics().validate().is_ok());
    }

    #[test]
    fn test_metadata_helpers() {
        let mut policy = DetectionPolicy::default();
        policy.add_metadata("owner".to_string(), serde_json::Value::String("growth".to_string()));
        assert_eq!(
            policy.get_metadata("owner"),
            Some(&serde_json::Value::String("growth".to_string()))
        );
        assert_eq!(policy.get_metadata("missing"), None);
    }
}
