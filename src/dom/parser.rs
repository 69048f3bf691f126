use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

use super::{ControlKind, FieldNode, FormScope, Page, SelectOption};
use crate::utils::text_utils::TextUtils;

/// Input types that never hold applicant data
const NON_FILLABLE_INPUT_TYPES: [&str; 5] = ["hidden", "submit", "button", "reset", "image"];

/// Parses HTML documents into the page model
pub struct PageParser;

impl PageParser {
    /// Parse a full HTML document into forms and fields
    pub fn parse_document(html: &str) -> Result<Page> {
        let document = Html::parse_document(html);

        let form_selector = Self::selector("form")?;
        let control_selector = Self::selector("input, textarea, select")?;
        let label_selector = Self::selector("label[for]")?;
        let option_selector = Self::selector("option")?;

        let labels = Self::collect_labels(&document, &label_selector);

        let mut page = Page::new();

        for form_element in document.select(&form_selector) {
            let mut form = FormScope::new(Self::element_text(&form_element));
            form.id = form_element.value().attr("id").map(|s| s.to_string());

            for control in form_element.select(&control_selector) {
                if let Some(field) = Self::build_field(&control, &labels, &option_selector) {
                    form.fields.push(field);
                }
            }

            debug!(
                "Parsed form '{}' with {} fields",
                form.id.as_deref().unwrap_or("anonymous"),
                form.fields.len()
            );
            page.forms.push(form);
        }

        debug!("Parsed document: {} forms", page.forms.len());
        Ok(page)
    }

    /// Map label `for` targets to their visible text
    fn collect_labels(document: &Html, label_selector: &Selector) -> HashMap<String, String> {
        let mut labels = HashMap::new();

        for label in document.select(label_selector) {
            if let Some(target) = label.value().attr("for") {
                let text = Self::element_text(&label);
                if !TextUtils::is_blank(&text) {
                    labels.insert(target.to_string(), text);
                }
            }
        }

        labels
    }

    /// Build one field node from a control element, or None for
    /// controls that carry no applicant data
    fn build_field(
        control: &ElementRef<'_>,
        labels: &HashMap<String, String>,
        option_selector: &Selector,
    ) -> Option<FieldNode> {
        let raw_type = control.value().attr("type");

        let kind = match control.value().name() {
            "textarea" => ControlKind::TextArea,
            "select" => ControlKind::Select,
            "input" => {
                let input_type = raw_type.map(TextUtils::fold).unwrap_or_else(|| "text".to_string());
                if NON_FILLABLE_INPUT_TYPES.contains(&input_type.as_str()) {
                    return None;
                }
                match input_type.as_str() {
                    "checkbox" => ControlKind::Checkbox,
                    "radio" => ControlKind::Radio,
                    "file" => ControlKind::FileUpload,
                    _ => ControlKind::TextInput,
                }
            }
            _ => return None,
        };

        let mut field = FieldNode::new(kind);
        field.attrs.name = control.value().attr("name").map(|s| s.to_string());
        field.attrs.id = control.value().attr("id").map(|s| s.to_string());
        field.attrs.placeholder = control.value().attr("placeholder").map(|s| s.to_string());
        field.attrs.aria_label = control.value().attr("aria-label").map(|s| s.to_string());
        field.attrs.input_type = raw_type.map(|s| s.to_string());
        field.attrs.label_text = field
            .attrs
            .id
            .as_ref()
            .and_then(|id| labels.get(id).cloned())
            .or_else(|| Self::enclosing_label_text(control));

        field.disabled = control.value().attr("disabled").is_some();
        field.readonly = control.value().attr("readonly").is_some();

        match kind {
            ControlKind::TextArea => {
                field.value = Self::element_text(control);
            }
            ControlKind::Select => {
                for (index, option) in control.select(option_selector).enumerate() {
                    let text = Self::element_text(&option);
                    let value = option
                        .value()
                        .attr("value")
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| text.clone());

                    if option.value().attr("selected").is_some() {
                        field.selected = Some(index);
                    }
                    field.options.push(SelectOption { text, value });
                }

                // Browsers treat the first option as selected by default
                if field.selected.is_none() && !field.options.is_empty() {
                    field.selected = Some(0);
                }
                if let Some(index) = field.selected {
                    field.value = field.options[index].value.clone();
                }
            }
            _ => {
                field.value = control.value().attr("value").unwrap_or_default().to_string();
            }
        }

        Some(field)
    }

    /// Text of the nearest enclosing label, for controls wrapped in one
    fn enclosing_label_text(control: &ElementRef<'_>) -> Option<String> {
        for ancestor in control.ancestors() {
            if let Some(element) = ElementRef::wrap(ancestor) {
                if element.value().name() == "label" {
                    let text = Self::element_text(&element);
                    if !TextUtils::is_blank(&text) {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    /// Collapsed visible text of an element
    fn element_text(element: &ElementRef<'_>) -> String {
        TextUtils::collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
    }

    fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector '{}': {}", css, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLICATION_FORM: &str = r#"
        <html><body>
        <h1>Careers</h1>
        <form id="application">
            <h2>Apply for this position</h2>
            <label for="full-name">Full Name</label>
            <input id="full-name" name="full_name" type="text">
            <label for="email">Email Address</label>
            <input id="email" name="email" type="email" value="old@example.com">
            <input name="phone" type="tel" placeholder="Phone number">
            <input aria-label="LinkedIn profile" name="linkedin_url" type="url">
            <select name="location">
                <option value="nyc">New York</option>
                <option value="sf" selected>San Francisco</option>
            </select>
            <label>Subscribe to updates <input type="checkbox" name="subscribe"></label>
            <input type="file" name="resume">
            <textarea name="cover_letter">Dear team,</textarea>
            <input type="hidden" name="csrf_token" value="abc123">
            <input type="submit" value="Send application">
        </form>
        </body></html>
    "#;

    #[test]
    fn test_parse_application_form() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();

        assert_eq!(page.forms.len(), 1);
        let form = &page.forms[0];
        assert_eq!(form.id.as_deref(), Some("application"));
        // hidden and submit inputs are dropped
        assert_eq!(form.fields.len(), 8);
        assert!(form.text.contains("Apply for this position"));
    }

    #[test]
    fn test_label_for_resolution() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();
        let form = &page.forms[0];

        let full_name = &form.fields[0];
        assert_eq!(full_name.control, ControlKind::TextInput);
        assert_eq!(full_name.attrs.label_text.as_deref(), Some("Full Name"));

        let email = &form.fields[1];
        assert_eq!(email.attrs.label_text.as_deref(), Some("Email Address"));
        assert_eq!(email.attrs.input_type.as_deref(), Some("email"));
        assert_eq!(email.value, "old@example.com");
    }

    #[test]
    fn test_enclosing_label_fallback() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();
        let form = &page.forms[0];

        let subscribe = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("subscribe"))
            .unwrap();
        assert_eq!(subscribe.control, ControlKind::Checkbox);
        assert_eq!(subscribe.attrs.label_text.as_deref(), Some("Subscribe to updates"));
    }

    #[test]
    fn test_aria_label_and_placeholder() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();
        let form = &page.forms[0];

        let phone = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("phone"))
            .unwrap();
        assert_eq!(phone.attrs.placeholder.as_deref(), Some("Phone number"));

        let linkedin = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("linkedin_url"))
            .unwrap();
        assert_eq!(linkedin.attrs.aria_label.as_deref(), Some("LinkedIn profile"));
    }

    #[test]
    fn test_select_options_and_default_selection() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();
        let form = &page.forms[0];

        let location = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("location"))
            .unwrap();
        assert_eq!(location.control, ControlKind::Select);
        assert_eq!(location.options.len(), 2);
        assert_eq!(location.options[0].text, "New York");
        assert_eq!(location.selected, Some(1));
        assert_eq!(location.value, "sf");
    }

    #[test]
    fn test_first_option_selected_by_default() {
        let html = r#"<form>apply<select name="source">
            <option value="board">Job board</option>
            <option value="referral">Referral</option>
        </select></form>"#;

        let page = PageParser::parse_document(html).unwrap();
        let field = &page.forms[0].fields[0];
        assert_eq!(field.selected, Some(0));
        assert_eq!(field.value, "board");
    }

    #[test]
    fn test_textarea_and_file_controls() {
        let page = PageParser::parse_document(APPLICATION_FORM).unwrap();
        let form = &page.forms[0];

        let cover = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("cover_letter"))
            .unwrap();
        assert_eq!(cover.control, ControlKind::TextArea);
        assert_eq!(cover.value, "Dear team,");

        let resume = form
            .fields
            .iter()
            .find(|f| f.attrs.name.as_deref() == Some("resume"))
            .unwrap();
        assert_eq!(resume.control, ControlKind::FileUpload);
    }

    #[test]
    fn test_disabled_and_readonly_flags() {
        let html = r#"<form>apply
            <input name="a" disabled>
            <input name="b" readonly>
            <input name="c">
        </form>"#;

        let page = PageParser::parse_document(html).unwrap();
        let fields = &page.forms[0].fields;
        assert!(fields[0].disabled);
        assert!(fields[1].readonly);
        assert!(!fields[2].disabled && !fields[2].readonly);
    }

    #[test]
    fn test_untyped_input_defaults_to_text() {
        let html = r#"<form>apply<input name="nickname"></form>"#;
        let page = PageParser::parse_document(html).unwrap();
        let field = &page.forms[0].fields[0];
        assert_eq!(field.control, ControlKind::TextInput);
        assert_eq!(field.attrs.input_type, None);
    }

    #[test]
    fn test_document_without_forms() {
        let page = PageParser::parse_document("<html><body><p>No forms here</p></body></html>").unwrap();
        assert!(page.forms.is_empty());
    }
}
