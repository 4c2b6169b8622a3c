use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::source::SectionQuery;

/// Everything the resolver needs to know about one content section
#[derive(Debug, Clone)]
pub struct SectionDef {
    /// Logical name; doubles as the cache key and the default file name
    pub name: String,
    /// Query against the primary source
    pub query: SectionQuery,
    /// Cache TTL for primary results; the store default when `None`
    pub ttl: Option<Duration>,
    /// Keys guaranteed to be present (as `""` if absent) in record payloads
    pub required_keys: Vec<String>,
    hardcoded: Value,
}

impl SectionDef {
    /// Defines a section; `hardcoded` is the last-resort payload
    pub fn new(name: impl Into<String>, query: SectionQuery, hardcoded: Value) -> Self {
        Self {
            name: name.into(),
            query,
            ttl: None,
            required_keys: Vec::new(),
            hardcoded,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_required_keys(mut self, keys: &[&str]) -> Self {
        self.required_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// The hard-coded payload, never empty
    ///
    /// A definition built with an empty value still yields a placeholder
    /// record naming the section.
    pub fn hardcoded(&self) -> Value {
        if super::has_content(&self.hardcoded) {
            self.hardcoded.clone()
        } else {
            json!({ "section": self.name, "placeholder": true })
        }
    }

    /// Fills missing or null required keys with `""`
    pub fn normalize(&self, mut data: Value) -> Value {
        if let Value::Object(map) = &mut data {
            for key in &self.required_keys {
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                if entry.is_null() {
                    *entry = Value::String(String::new());
                }
            }
        }
        data
    }
}

/// Section definitions by name
#[derive(Debug, Clone, Default)]
pub struct SectionCatalog {
    sections: HashMap<String, SectionDef>,
}

impl SectionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition
    pub fn register(&mut self, def: SectionDef) {
        self.sections.insert(def.name.clone(), def);
    }

    pub fn with(mut self, def: SectionDef) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SectionDef> {
        self.sections.get(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
