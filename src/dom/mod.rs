use serde::{Deserialize, Serialize};

pub mod events;
pub mod parser;

pub use events::{EventKind, SyntheticEvent};
pub use parser::PageParser;

use crate::utils::text_utils::TextUtils;

/// Control kinds a form field can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    TextInput,
    TextArea,
    Select,
    Checkbox,
    Radio,
    FileUpload,
}

impl ControlKind {
    /// Toggle controls carry binary state instead of text
    pub fn is_toggle(&self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }

    /// Controls that accept a programmatic text value
    pub fn accepts_text(&self) -> bool {
        matches!(self, ControlKind::TextInput | ControlKind::TextArea)
    }
}

/// Descriptive attributes of a field, as found in the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldAttributes {
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub label_text: Option<String>,
    pub input_type: Option<String>,
}

impl FieldAttributes {
    /// Descriptive strings used for classification, in source order.
    /// The raw input type is excluded; it names the control, not the field.
    pub fn descriptors(&self) -> Vec<&str> {
        [
            self.name.as_deref(),
            self.id.as_deref(),
            self.placeholder.as_deref(),
            self.aria_label.as_deref(),
            self.label_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// One entry of a select control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: text.into(), value: value.into() }
    }
}

/// One form control and its mutable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNode {
    pub control: ControlKind,
    pub attrs: FieldAttributes,
    pub options: Vec<SelectOption>,
    pub selected: Option<usize>,
    pub value: String,
    pub disabled: bool,
    pub readonly: bool,
    pub detached: bool,
}

impl FieldNode {
    pub fn new(control: ControlKind) -> Self {
        Self {
            control,
            attrs: FieldAttributes::default(),
            options: Vec::new(),
            selected: None,
            value: String::new(),
            disabled: false,
            readonly: false,
            detached: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.attrs.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.attrs.id = Some(id.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.attrs.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_aria_label(mut self, aria_label: impl Into<String>) -> Self {
        self.attrs.aria_label = Some(aria_label.into());
        self
    }

    pub fn with_label(mut self, label_text: impl Into<String>) -> Self {
        self.attrs.label_text = Some(label_text.into());
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.attrs.input_type = Some(input_type.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Best human-readable handle for log lines and reports
    pub fn display_label(&self) -> String {
        self.attrs
            .name
            .as_deref()
            .or(self.attrs.id.as_deref())
            .or(self.attrs.aria_label.as_deref())
            .or(self.attrs.placeholder.as_deref())
            .or(self.attrs.label_text.as_deref())
            .unwrap_or("unnamed field")
            .to_string()
    }
}

/// One form grouping: its fields plus the visible text used for keyword matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormScope {
    pub id: Option<String>,
    pub text: String,
    pub fields: Vec<FieldNode>,
}

impl FormScope {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), fields: Vec::new() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }
}

/// Stable address of a field inside a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub form: usize,
    pub field: usize,
}

impl FieldRef {
    pub fn new(form: usize, field: usize) -> Self {
        Self { form, field }
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.form, self.field)
    }
}

/// Field interaction errors
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("No field at {at}")]
    MissingField { at: FieldRef },

    #[error("Field '{label}' is detached from the document")]
    Detached { label: String },

    #[error("Field '{label}' is not interactable: {reason}")]
    NotInteractable { label: String, reason: String },

    #[error("Value assignment rejected for '{label}': {reason}")]
    ValueRejected { label: String, reason: String },
}

/// Headless document model: ordered forms plus a synthetic-event log.
///
/// All mutation goes through the primitives below so that every write
/// leaves the same notification trail a framework-controlled document
/// would observe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub forms: Vec<FormScope>,
    pub events: Vec<SyntheticEvent>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, form: FormScope) -> Self {
        self.forms.push(form);
        self
    }

    /// Look up a form by index
    pub fn form(&self, index: usize) -> Option<&FormScope> {
        self.forms.get(index)
    }

    /// Resolve a field reference
    pub fn field(&self, at: FieldRef) -> Result<&FieldNode, DomError> {
        self.forms
            .get(at.form)
            .and_then(|form| form.fields.get(at.field))
            .ok_or(DomError::MissingField { at })
    }

    fn field_mut(&mut self, at: FieldRef) -> Result<&mut FieldNode, DomError> {
        self.forms
            .get_mut(at.form)
            .and_then(|form| form.fields.get_mut(at.field))
            .ok_or(DomError::MissingField { at })
    }

    /// Move focus to a field, recording a focus notification
    pub fn focus(&mut self, at: FieldRef) -> Result<(), DomError> {
        {
            let field = self.field(at)?;
            if field.detached {
                return Err(DomError::Detached { label: field.display_label() });
            }
            if field.disabled {
                return Err(DomError::NotInteractable {
                    label: field.display_label(),
                    reason: "disabled".to_string(),
                });
            }
        }
        self.record_event(at, EventKind::Focus);
        Ok(())
    }

    /// Release focus from a field, recording a blur notification
    pub fn blur(&mut self, at: FieldRef) -> Result<(), DomError> {
        {
            let field = self.field(at)?;
            if field.detached {
                return Err(DomError::Detached { label: field.display_label() });
            }
        }
        self.record_event(at, EventKind::Blur);
        Ok(())
    }

    /// Assign a text value to a field. Only text-bearing controls accept
    /// programmatic assignment; everything else is rejected.
    pub fn set_value(&mut self, at: FieldRef, value: &str) -> Result<(), DomError> {
        let field = self.field_mut(at)?;
        let label = field.display_label();

        if field.detached {
            return Err(DomError::Detached { label });
        }
        if field.disabled {
            return Err(DomError::NotInteractable { label, reason: "disabled".to_string() });
        }
        if field.readonly {
            return Err(DomError::NotInteractable { label, reason: "readonly".to_string() });
        }

        match field.control {
            ControlKind::TextInput | ControlKind::TextArea => {
                field.value = value.to_string();
                Ok(())
            }
            ControlKind::FileUpload => Err(DomError::ValueRejected {
                label,
                reason: "file inputs cannot receive programmatic values".to_string(),
            }),
            ControlKind::Checkbox | ControlKind::Radio => Err(DomError::ValueRejected {
                label,
                reason: "toggle controls take no text value".to_string(),
            }),
            ControlKind::Select => Err(DomError::ValueRejected {
                label,
                reason: "select controls are driven through option selection".to_string(),
            }),
        }
    }

    /// Select the option whose text or value equals the candidate,
    /// compared case-insensitively. Returns false when no option matches.
    pub fn select_option(&mut self, at: FieldRef, candidate: &str) -> Result<bool, DomError> {
        let field = self.field_mut(at)?;
        let label = field.display_label();

        if field.detached {
            return Err(DomError::Detached { label });
        }
        if field.disabled {
            return Err(DomError::NotInteractable { label, reason: "disabled".to_string() });
        }
        if field.control != ControlKind::Select {
            return Err(DomError::ValueRejected {
                label,
                reason: "option selection applies to select controls only".to_string(),
            });
        }

        let folded = TextUtils::fold(candidate);
        let hit = field
            .options
            .iter()
            .position(|opt| TextUtils::fold(&opt.text) == folded || TextUtils::fold(&opt.value) == folded);

        match hit {
            Some(index) => {
                field.selected = Some(index);
                field.value = field.options[index].value.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dispatch a notification against a field
    pub fn dispatch(&mut self, at: FieldRef, kind: EventKind) -> Result<(), DomError> {
        {
            let field = self.field(at)?;
            if field.detached {
                return Err(DomError::Detached { label: field.display_label() });
            }
        }
        self.record_event(at, kind);
        Ok(())
    }

    /// Mark a field detached, as if the host removed it mid-pass
    pub fn detach_field(&mut self, at: FieldRef) -> Result<(), DomError> {
        let field = self.field_mut(at)?;
        field.detached = true;
        Ok(())
    }

    /// Notification kinds recorded against one field, in dispatch order
    pub fn event_kinds_for(&self, at: FieldRef) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|event| event.target == at)
            .map(|event| event.kind)
            .collect()
    }

    fn record_event(&mut self, at: FieldRef, kind: EventKind) {
        let sequence = self.events.len() as u64;
        self.events.push(SyntheticEvent {
            target: at,
            kind,
            sequence,
            dispatched_at: chrono::Utc::now(),
        });
    }
}
