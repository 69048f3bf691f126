use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::dom::{ControlKind, DomError, EventKind, FieldNode, FieldRef, Page};
use crate::policy::{DetectionPolicy, FieldCategory};
use crate::profile::Profile;
use crate::utils::text_utils::TextUtils;

/// Terminal reasons an auto-fill pass refuses to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillFailure {
    NoFormDetected,
    NoProfileData,
}

impl std::fmt::Display for FillFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillFailure::NoFormDetected => write!(f, "No form detected"),
            FillFailure::NoProfileData => write!(f, "No profile data"),
        }
    }
}

/// Per-field outcome of one auto-fill pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    /// Value written and notifications delivered
    Filled,
    /// No category rule matched the field's descriptors
    Unmatched,
    /// Category matched but the profile resolves no value for it
    NoProfileValue,
    /// The control refuses programmatic values (toggles, file inputs)
    Rejected,
    /// Select control with no option equal to the candidate
    NoOptionMatch,
    /// The host rejected the interaction (detached, disabled, readonly)
    WriteFailed,
}

/// One field of a matched form with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedField {
    pub field: FieldRef,
    pub label: String,
    pub category: Option<FieldCategory>,
}

/// One field's fate during an auto-fill pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub field: FieldRef,
    pub label: String,
    pub category: Option<FieldCategory>,
    pub status: FillStatus,
}

/// Outcome of one auto-fill pass.
///
/// `success` is true when at least one field was filled. A pass that ran
/// but filled nothing reports `success: false` with no reason; the
/// outcomes list carries the per-field explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResult {
    pub success: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FillFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<FieldOutcome>,
}

impl FillResult {
    /// A pass that never ran because a precondition failed
    pub fn failure(reason: FillFailure) -> Self {
        Self { success: false, count: 0, reason: Some(reason), outcomes: Vec::new() }
    }

    /// A pass that ran to completion
    pub fn completed(count: usize, outcomes: Vec<FieldOutcome>) -> Self {
        Self { success: count > 0, count, reason: None, outcomes }
    }

    /// Human-readable failure reason, when one applies
    pub fn reason_text(&self) -> Option<String> {
        self.reason.map(|reason| reason.to_string())
    }
}

/// Read-only survey of a page, for the host's notification banner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub forms_total: usize,
    pub forms_matched: usize,
    pub fields_surveyed: usize,
    pub fillable_fields: usize,
    pub per_category: HashMap<String, usize>,
    pub scanned_at: DateTime<Utc>,
}

/// Detection, classification, and fill engine.
///
/// The policy tables are folded once at construction so that per-field
/// matching never re-normalizes alias text.
pub struct FormFieldDetector {
    policy: DetectionPolicy,
    keywords: Vec<String>,
    rules: Vec<(FieldCategory, Vec<String>)>,
}

impl FormFieldDetector {
    pub fn new(policy: DetectionPolicy) -> Self {
        let keywords = policy
            .form_keywords
            .iter()
            .map(|keyword| TextUtils::fold(keyword))
            .collect();
        let rules = policy
            .categories
            .iter()
            .map(|rule| {
                let aliases = rule.aliases.iter().map(|alias| TextUtils::fold(alias)).collect();
                (rule.category, aliases)
            })
            .collect();

        Self { policy, keywords, rules }
    }

    /// Detector over the built-in keyword and alias tables
    pub fn with_defaults() -> Self {
        Self::new(DetectionPolicy::default())
    }

    pub fn policy(&self) -> &DetectionPolicy {
        &self.policy
    }

    /// Indices of forms whose visible text contains any form keyword,
    /// compared case-insensitively. Order follows document order.
    pub fn detect_forms(&self, page: &Page) -> Vec<usize> {
        page.forms
            .iter()
            .enumerate()
            .filter(|(_, form)| {
                let text = TextUtils::fold(&form.text);
                self.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Classify a field by substring-matching its descriptors against the
    /// category rules. Rules are tried in declared order and the first
    /// matching rule wins, so one field never lands in two categories.
    pub fn classify_field(&self, field: &FieldNode) -> Option<FieldCategory> {
        let descriptors: Vec<String> = field
            .attrs
            .descriptors()
            .into_iter()
            .map(TextUtils::fold)
            .filter(|descriptor| !descriptor.is_empty())
            .collect();

        if descriptors.is_empty() {
            return None;
        }

        for (category, aliases) in &self.rules {
            for alias in aliases {
                if descriptors.iter().any(|descriptor| descriptor.contains(alias.as_str())) {
                    return Some(*category);
                }
            }
        }

        None
    }

    /// Survey every field of the matched forms with its classification
    pub fn classify_page(&self, page: &Page) -> Vec<ClassifiedField> {
        let mut surveyed = Vec::new();
        for form_index in self.detect_forms(page) {
            let form = &page.forms[form_index];
            for (field_index, field) in form.fields.iter().enumerate() {
                surveyed.push(ClassifiedField {
                    field: FieldRef::new(form_index, field_index),
                    label: field.display_label(),
                    category: self.classify_field(field),
                });
            }
        }
        surveyed
    }

    /// Write one value into one field. Returns true only when the value
    /// landed and the notification pair was delivered.
    pub fn fill_field(&self, page: &mut Page, at: FieldRef, value: &str) -> bool {
        matches!(self.attempt_fill(page, at, value), FillStatus::Filled)
    }

    fn attempt_fill(&self, page: &mut Page, at: FieldRef, value: &str) -> FillStatus {
        let (label, control) = match page.field(at) {
            Ok(field) => (field.display_label(), field.control),
            Err(err) => {
                warn!("Fill skipped at {}: {}", at, err);
                return FillStatus::WriteFailed;
            }
        };

        // Toggles carry consent or preference state; never flip them.
        if control.is_toggle() {
            debug!("Refusing to toggle '{}'", label);
            return FillStatus::Rejected;
        }

        if control == ControlKind::Select {
            return match page.select_option(at, value) {
                Ok(true) => {
                    if let Err(err) = page.dispatch(at, EventKind::Change) {
                        warn!("Change notification failed for '{}': {}", label, err);
                        return FillStatus::WriteFailed;
                    }
                    FillStatus::Filled
                }
                Ok(false) => {
                    debug!("No option of '{}' equals '{}'", label, value);
                    FillStatus::NoOptionMatch
                }
                Err(DomError::ValueRejected { reason, .. }) => {
                    warn!("Selection rejected for '{}': {}", label, reason);
                    FillStatus::Rejected
                }
                Err(err) => {
                    warn!("Selection failed for '{}': {}", label, err);
                    FillStatus::WriteFailed
                }
            };
        }

        if let Err(err) = page.focus(at) {
            warn!("Could not focus '{}': {}", label, err);
            return FillStatus::WriteFailed;
        }

        if let Err(err) = page.set_value(at, value) {
            return match err {
                DomError::ValueRejected { reason, .. } => {
                    warn!("Value rejected for '{}': {}", label, reason);
                    FillStatus::Rejected
                }
                other => {
                    warn!("Write failed for '{}': {}", label, other);
                    FillStatus::WriteFailed
                }
            };
        }

        for kind in [EventKind::Input, EventKind::Change] {
            if let Err(err) = page.dispatch(at, kind) {
                warn!("{} notification failed for '{}': {}", kind, label, err);
                return FillStatus::WriteFailed;
            }
        }

        if let Err(err) = page.blur(at) {
            warn!("Could not blur '{}': {}", label, err);
        }

        FillStatus::Filled
    }

    /// Fill every classifiable field of the matched forms from the profile.
    ///
    /// Best-effort: skipped and failed fields are recorded in the outcomes
    /// list but never abort the pass. No retries, no rollback.
    pub fn auto_fill(&self, page: &mut Page, profile: Option<&Profile>) -> FillResult {
        let matched = self.detect_forms(page);
        if matched.is_empty() {
            info!("Auto-fill aborted: no form detected");
            return FillResult::failure(FillFailure::NoFormDetected);
        }

        let profile = match profile {
            Some(profile) => profile,
            None => {
                info!("Auto-fill aborted: no profile data");
                return FillResult::failure(FillFailure::NoProfileData);
            }
        };

        // Snapshot the classification plan before any mutation so writes
        // cannot influence later matching decisions.
        let plan = self.classify_page(page);
        let mut outcomes = Vec::with_capacity(plan.len());
        let mut filled = 0usize;

        for entry in plan {
            let status = match entry.category {
                None => FillStatus::Unmatched,
                Some(category) => match profile.resolve(category) {
                    None => {
                        debug!("No profile value for {} field '{}'", category, entry.label);
                        FillStatus::NoProfileValue
                    }
                    Some(value) => self.attempt_fill(page, entry.field, &value),
                },
            };

            if status == FillStatus::Filled {
                filled += 1;
            }

            outcomes.push(FieldOutcome {
                field: entry.field,
                label: entry.label,
                category: entry.category,
                status,
            });
        }

        info!("Auto-fill completed: {} of {} fields filled", filled, outcomes.len());
        FillResult::completed(filled, outcomes)
    }

    /// Detection and classification only; never mutates the page
    pub fn scan(&self, page: &Page) -> ScanReport {
        let matched = self.detect_forms(page);
        let mut fields_surveyed = 0;
        let mut fillable_fields = 0;
        let mut per_category: HashMap<String, usize> = HashMap::new();

        for &form_index in &matched {
            let form = &page.forms[form_index];
            fields_surveyed += form.fields.len();
            for field in &form.fields {
                if let Some(category) = self.classify_field(field) {
                    *per_category.entry(category.as_str().to_string()).or_insert(0) += 1;
                    if field.control.accepts_text() || field.control == ControlKind::Select {
                        fillable_fields += 1;
                    }
                }
            }
        }

        debug!(
            "Scan: {} of {} forms matched, {} fillable fields",
            matched.len(),
            page.forms.len(),
            fillable_fields
        );

        ScanReport {
            forms_total: page.forms.len(),
            forms_matched: matched.len(),
            fields_surveyed,
            fillable_fields,
            per_category,
            scanned_at: Utc::now(),
        }
    }
}

impl Default for FormFieldDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
