use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::policy::{CategoryRule, DetectionPolicy};

/// Validates a detection policy before it drives classification
pub struct PolicyValidator {
    alias_charset: Regex,
}

impl PolicyValidator {
    pub fn new() -> Self {
        Self {
            // Matching folds the document to lowercase, so policy entries
            // must already be lowercase to ever hit.
            alias_charset: Regex::new(r"^[a-z0-9 _\-']+$").unwrap(),
        }
    }

    /// Validate a complete detection policy
    pub fn validate(&self, policy: &DetectionPolicy) -> Result<()> {
        debug!("Starting policy validation, version {}", policy.version);

        self.validate_version(&policy.version)?;
        self.validate_keywords(&policy.form_keywords)?;
        self.validate_rules(&policy.categories)?;
        self.validate_cross_references(&policy.categories);

        debug!("Policy validation completed successfully");
        Ok(())
    }

    fn validate_version(&self, version: &str) -> Result<()> {
        if version.is_empty() {
            return Err(anyhow::anyhow!("Version cannot be empty"));
        }

        if !version.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-') {
            return Err(anyhow::anyhow!("Invalid version format: {}", version));
        }

        Ok(())
    }

    fn validate_keywords(&self, keywords: &[String]) -> Result<()> {
        if keywords.is_empty() {
            return Err(anyhow::anyhow!("At least one form keyword is required"));
        }

        for keyword in keywords {
            if keyword.trim().is_empty() {
                return Err(anyhow::anyhow!("Form keywords cannot be blank"));
            }

            if !self.alias_charset.is_match(keyword) {
                return Err(anyhow::anyhow!(
                    "Form keyword '{}' must be lowercase text",
                    keyword
                ));
            }
        }

        Ok(())
    }

    fn validate_rules(&self, categories: &[CategoryRule]) -> Result<()> {
        if categories.is_empty() {
            return Err(anyhow::anyhow!("At least one category rule must be defined"));
        }

        let mut seen = HashSet::new();
        for rule in categories {
            if !seen.insert(rule.category) {
                return Err(anyhow::anyhow!("Duplicate category rule: {}", rule.category));
            }

            self.validate_rule(rule)?;
        }

        Ok(())
    }

    fn validate_rule(&self, rule: &CategoryRule) -> Result<()> {
        if rule.aliases.is_empty() {
            return Err(anyhow::anyhow!(
                "Category '{}' must declare at least one alias",
                rule.category
            ));
        }

        let mut seen = HashSet::new();
        for alias in &rule.aliases {
            if alias.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "Category '{}' contains a blank alias",
                    rule.category
                ));
            }

            if !self.alias_charset.is_match(alias) {
                return Err(anyhow::anyhow!(
                    "Alias '{}' in category '{}' must be lowercase text",
                    alias,
                    rule.category
                ));
            }

            if !seen.insert(alias.as_str()) {
                return Err(anyhow::anyhow!(
                    "Duplicate alias '{}' in category '{}'",
                    alias,
                    rule.category
                ));
            }
        }

        Ok(())
    }

    /// Warn about aliases an earlier rule will always claim first
    fn validate_cross_references(&self, categories: &[CategoryRule]) {
        for (index, rule) in categories.iter().enumerate() {
            for alias in &rule.aliases {
                for earlier in &categories[..index] {
                    if let Some(shadowing) = earlier
                        .aliases
                        .iter()
                        .find(|candidate| alias.contains(candidate.as_str()))
                    {
                        warn!(
                            "Alias '{}' in category '{}' is shadowed by alias '{}' in earlier category '{}'",
                            alias, rule.category, shadowing, earlier.category
                        );
                    }
                }
            }
        }
    }
}
