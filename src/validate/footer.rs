use serde_json::{Map, Value};

use super::{has_field, is_blank, PayloadValidator, SectionShape, ValidationError};
use crate::cache::CacheKey;

const FOOTER_KEYS: &[&str] = &[SETTINGS, QUICK_LINKS, SOCIAL_LINKS];

const SETTINGS_FIELDS: &[&str] = &["brand_name", "footer_description", "developer_name", "accent_color"];

const SETTINGS: &str = "footer_settings";
const QUICK_LINKS: &str = "footer_quick_links";
const SOCIAL_LINKS: &str = "footer_social_links";

/// Guards the footer settings record, quick links and social links
///
/// Each key accepts only its own shape family; a social list stored under
/// the quick-links key is unrecognized, not checked as the other family.
/// An empty quick-links list is rejected because the footer would render
/// without navigation; an empty social list is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FooterValidator;

impl PayloadValidator for FooterValidator {
    fn name(&self) -> &'static str {
        "footer"
    }

    fn supports(&self, key: &CacheKey) -> bool {
        FOOTER_KEYS.contains(&key.name())
    }

    fn validate(&self, key: &CacheKey, shape: &SectionShape<'_>) -> Option<ValidationError> {
        match (key.name(), *shape) {
            (SETTINGS, SectionShape::FooterSettings(settings)) => validate_settings(settings),
            (QUICK_LINKS, SectionShape::LinkList(items)) => validate_quick_links(items),
            (QUICK_LINKS, SectionShape::EmptyList) => Some(ValidationError::semantic(
                "Footer quick links semantic violation (empty list)",
            )),
            (SOCIAL_LINKS, SectionShape::SocialList(items)) => validate_social_links(items),
            (SOCIAL_LINKS, SectionShape::EmptyList) => None,
            _ => Some(ValidationError::unrecognized(
                "Footer cache payload shape unrecognized",
            )),
        }
    }
}

fn validate_settings(settings: &Map<String, Value>) -> Option<ValidationError> {
    if let Some(field) = SETTINGS_FIELDS.iter().find(|f| !settings.contains_key(**f)) {
        return Some(ValidationError::missing_field(format!(
            "Footer settings schema missing field '{}'",
            field
        )));
    }

    match settings.get("brand_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => None,
        _ => Some(ValidationError::semantic(
            "Footer settings semantic violation (empty brand_name)",
        )),
    }
}

fn validate_quick_links(items: &[Value]) -> Option<ValidationError> {
    validate_items(items, "Footer quick links", &["label", "url"])
}

fn validate_social_links(items: &[Value]) -> Option<ValidationError> {
    validate_items(items, "Footer social links", &["platform", "url", "icon_class"])
}

/// Each item must carry every field (schema) with a non-blank value (semantics)
fn validate_items(items: &[Value], family: &str, fields: &[&str]) -> Option<ValidationError> {
    for (index, item) in items.iter().enumerate() {
        if !fields.iter().all(|f| has_field(item, f)) {
            return Some(ValidationError::missing_field(format!(
                "{} schema corruption at index {}",
                family, index
            )));
        }
        if fields.iter().any(|f| is_blank(item, f)) {
            return Some(ValidationError::semantic(format!(
                "{} semantic violation at index {}",
                family, index
            )));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DefectClass, CACHE_VERSION};
    use serde_json::json;

    fn check(name: &str, payload: &Value) -> Option<ValidationError> {
        let key = CacheKey::new(name, CACHE_VERSION);
        FooterValidator.validate(&key, &SectionShape::sniff(payload))
    }

    #[test]
    fn test_supports_footer_keys_only() {
        assert!(FooterValidator.supports(&CacheKey::new("footer_social_links", "v1")));
        assert!(!FooterValidator.supports(&CacheKey::new("header_navigation", "v1")));
    }

    #[test]
    fn test_settings_pass_and_fail() {
        let good = json!({
            "brand_name": "Folio",
            "footer_description": "Building things",
            "developer_name": "Folio",
            "accent_color": null
        });
        assert!(check("footer_settings", &good).is_none());

        let blank = json!({
            "brand_name": "   ",
            "footer_description": "",
            "developer_name": "",
            "accent_color": ""
        });
        let err = check("footer_settings", &blank).expect("should reject");
        assert_eq!(err.defect(), DefectClass::SemanticViolation);

        let missing = json!({"brand_name": "Folio", "footer_description": ""});
        let err = check("footer_settings", &missing).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);
        assert!(err.message().contains("developer_name"));
    }

    #[test]
    fn test_quick_link_with_empty_url_at_index_zero() {
        let err = check("footer_quick_links", &json!([{"label": "Home", "url": ""}]))
            .expect("should reject");
        assert_eq!(err.defect(), DefectClass::SemanticViolation);
        assert_eq!(err.to_string(), "DC-05 Footer quick links semantic violation at index 0");
    }

    #[test]
    fn test_quick_link_schema_corruption_later_in_list() {
        let payload = json!([
            {"label": "Home", "url": "/"},
            {"label": "About", "url": "/about"},
            {"label": "Notes"}
        ]);
        let err = check("footer_quick_links", &payload).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);
        assert!(err.message().ends_with("index 2"));
    }

    #[test]
    fn test_empty_list_policy_depends_on_key() {
        let err = check("footer_quick_links", &json!([])).expect("should reject");
        assert_eq!(err.defect(), DefectClass::SemanticViolation);
        assert!(check("footer_social_links", &json!([])).is_none());
    }

    #[test]
    fn test_social_links() {
        let good = json!([{"platform": "GitHub", "url": "https://github.com", "icon_class": "fa-github"}]);
        assert!(check("footer_social_links", &good).is_none());

        let no_icon = json!([{"platform": "GitHub", "url": "https://github.com"}]);
        let err = check("footer_social_links", &no_icon).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);

        let blank_icon = json!([{"platform": "GitHub", "url": "https://github.com", "icon_class": " "}]);
        let err = check("footer_social_links", &blank_icon).expect("should reject");
        assert_eq!(err.defect(), DefectClass::SemanticViolation);
    }

    #[test]
    fn test_unknown_shape() {
        let err = check("footer_settings", &json!({"title": "x"})).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);

        let err = check("footer_quick_links", &json!([{"name": "x"}])).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);
    }

    #[test]
    fn test_shape_must_match_key() {
        let social = json!([{"platform": "GitHub", "url": "https://github.com", "icon_class": "fa-github"}]);
        let err = check("footer_quick_links", &social).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);

        let links = json!([{"label": "Home", "url": "/"}]);
        let err = check("footer_social_links", &links).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);

        let err = check("footer_settings", &links).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);
        assert!(check("footer_settings", &json!([])).is_some());
    }
}
