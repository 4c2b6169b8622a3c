use serde_json::{Map, Value};

use super::{as_flag, has_field, PayloadValidator, SectionShape, ValidationError};
use crate::cache::CacheKey;

const HEADER_KEYS: &[&str] = &["header_settings", "header_navigation"];

const SETTINGS_FIELDS: &[&str] = &["logo_path", "button_text", "button_link", "is_active"];

/// Guards the header settings record and the navigation link list
///
/// Any mapping is checked as settings: the four settings fields must be
/// present and `is_active` must be 1, since only the active row should ever
/// reach the cache. Sequences are checked as navigation, where every item
/// needs a `label` and `url`; an empty navigation list is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderValidator;

impl PayloadValidator for HeaderValidator {
    fn name(&self) -> &'static str {
        "header"
    }

    fn supports(&self, key: &CacheKey) -> bool {
        HEADER_KEYS.contains(&key.name())
    }

    fn validate(&self, _key: &CacheKey, shape: &SectionShape<'_>) -> Option<ValidationError> {
        if let Some(settings) = shape.as_record() {
            return validate_settings(settings);
        }
        if let Some(items) = shape.as_list() {
            return validate_navigation(items);
        }
        Some(ValidationError::unrecognized("Header cache payload shape unrecognized"))
    }
}

fn validate_settings(settings: &Map<String, Value>) -> Option<ValidationError> {
    if let Some(field) = SETTINGS_FIELDS
        .iter()
        .find(|field| settings.get(**field).map_or(true, Value::is_null))
    {
        return Some(ValidationError::missing_field(format!(
            "Header settings schema missing field '{}'",
            field
        )));
    }

    if settings.get("is_active").map(as_flag) != Some(1) {
        return Some(ValidationError::semantic(
            "Header settings semantic violation (inactive config cached)",
        ));
    }

    None
}

fn validate_navigation(items: &[Value]) -> Option<ValidationError> {
    items.iter().enumerate().find_map(|(index, item)| {
        (!has_field(item, "label") || !has_field(item, "url")).then(|| {
            ValidationError::missing_field(format!(
                "Header navigation schema corruption at index {}",
                index
            ))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DefectClass, CACHE_VERSION};
    use serde_json::json;

    fn check(name: &str, payload: &Value) -> Option<ValidationError> {
        let key = CacheKey::new(name, CACHE_VERSION);
        HeaderValidator.validate(&key, &SectionShape::sniff(payload))
    }

    fn active_settings() -> Value {
        json!({
            "site_title": "Folio",
            "logo_path": "/img/logo.png",
            "button_text": "Download CV",
            "button_link": "/cv.pdf",
            "accent_color": "#ff5a5a",
            "is_active": 1
        })
    }

    #[test]
    fn test_supports_header_keys_only() {
        assert!(HeaderValidator.supports(&CacheKey::new("header_settings", "v1")));
        assert!(HeaderValidator.supports(&CacheKey::new("Header Navigation", "v2")));
        assert!(!HeaderValidator.supports(&CacheKey::new("footer_settings", "v1")));
    }

    #[test]
    fn test_active_settings_pass() {
        assert!(check("header_settings", &active_settings()).is_none());
    }

    #[test]
    fn test_inactive_settings_are_a_semantic_violation() {
        let payload = json!({
            "logo_path": "...",
            "button_text": "Go",
            "button_link": "/x",
            "is_active": 0
        });
        let err = check("header_settings", &payload).expect("should reject");
        assert_eq!(err.defect(), DefectClass::SemanticViolation);
        assert!(err.message().contains("inactive config cached"));
    }

    #[test]
    fn test_flag_as_string_is_accepted() {
        let mut payload = active_settings();
        payload["is_active"] = json!("1");
        assert!(check("header_settings", &payload).is_none());
    }

    #[test]
    fn test_missing_settings_field() {
        let mut payload = active_settings();
        payload.as_object_mut().unwrap().remove("button_link");
        let err = check("header_settings", &payload).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);
        assert!(err.message().contains("button_link"));
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut payload = active_settings();
        payload["logo_path"] = Value::Null;
        let err = check("header_settings", &payload).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);
    }

    #[test]
    fn test_navigation_items_need_label_and_url() {
        let payload = json!([
            {"label": "Home", "url": "/"},
            {"label": "About"}
        ]);
        let err = check("header_navigation", &payload).expect("should reject");
        assert_eq!(err.defect(), DefectClass::MissingField);
        assert!(err.message().ends_with("index 1"));
    }

    #[test]
    fn test_navigation_valid_and_empty() {
        let payload = json!([{"label": "Home", "url": "/"}, {"label": "Notes", "url": "/notes"}]);
        assert!(check("header_navigation", &payload).is_none());
        assert!(check("header_navigation", &json!([])).is_none());
    }

    #[test]
    fn test_scalar_is_unrecognized() {
        let err = check("header_navigation", &json!(42)).expect("should reject");
        assert_eq!(err.defect(), DefectClass::UnrecognizedShape);
    }
}
