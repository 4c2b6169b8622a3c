//! Page aggregation with source locking
//!
//! A page is one anchor section plus dependents. The anchor decides which
//! tiers its dependents may use, so a page never mixes live data with stale
//! fallbacks in a way that contradicts the anchor. Whole pages are cached
//! under their own key, but only when every section came from the cache or
//! the primary source. Sections read back from a cached page pass the same
//! validators as their own cache entries, and the page expires with its
//! shortest-lived section.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::resolve::{SectionCatalog, SectionResolver, SectionResult, Source, Tier};
use crate::source::PrimarySource;

/// Layout of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    /// Page name shown to users
    pub name: String,
    /// Cache key for the whole aggregate
    pub page_key: String,
    /// Section whose source locks the others
    pub anchor: String,
    pub dependents: Vec<String>,
}

impl PageSpec {
    pub fn new(name: &str, page_key: &str, anchor: &str, dependents: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            page_key: page_key.to_string(),
            anchor: anchor.to_string(),
            dependents: dependents.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Anchor first, then dependents in declaration order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.anchor.as_str()).chain(self.dependents.iter().map(String::as_str))
    }
}

/// A rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatePage {
    pub page: String,
    pub sections: BTreeMap<String, SectionResult>,
    /// True when every section came from the cache or the primary source
    pub all_primary: bool,
}

impl AggregatePage {
    /// Source of one section, if the page has it
    pub fn source_of(&self, section: &str) -> Option<Source> {
        self.sections.get(section).map(|s| s.source)
    }
}

/// Renders pages from a catalog of section definitions
#[derive(Debug, Clone)]
pub struct Aggregator<P> {
    resolver: SectionResolver<P>,
    catalog: SectionCatalog,
}

impl<P: PrimarySource> Aggregator<P> {
    pub fn new(resolver: SectionResolver<P>, catalog: SectionCatalog) -> Self {
        Self { resolver, catalog }
    }

    pub fn resolver(&self) -> &SectionResolver<P> {
        &self.resolver
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    /// Resolves one section by name through every tier
    ///
    /// Names missing from the catalog resolve to an `error` result.
    pub async fn section(&self, name: &str) -> SectionResult {
        self.section_through(name, Tier::ALL).await
    }

    async fn section_through(&self, name: &str, tiers: &[Tier]) -> SectionResult {
        match self.catalog.get(name) {
            Some(def) => self.resolver.resolve_through(def, tiers).await,
            None => {
                warn!(section = name, "No definition for section");
                SectionResult::new(Source::Error, json!({ "section": name, "unavailable": true }))
            }
        }
    }

    /// Renders a page
    ///
    /// # Arguments
    /// * `spec` - Anchor, dependents and page cache key
    ///
    /// # Returns
    /// Every section of the page with its source. Never fails; the worst case
    /// is a page built from hard-coded defaults.
    pub async fn render(&self, spec: &PageSpec) -> AggregatePage {
        if let Some(page) = self.from_page_cache(spec) {
            debug!(page = %spec.name, "Page cache hit");
            return page;
        }

        let mut sections = BTreeMap::new();

        let anchor = self.section(&spec.anchor).await;
        let tiers = anchor.source.locked_tiers();
        if anchor.source.is_primary() {
            debug!(page = %spec.name, anchor = %spec.anchor, source = %anchor.source, "Anchor is live");
        } else {
            info!(
                page = %spec.name,
                anchor = %spec.anchor,
                source = %anchor.source,
                "Anchor fell back, locking dependents"
            );
        }
        sections.insert(spec.anchor.clone(), anchor);

        for name in &spec.dependents {
            let result = self.section_through(name, tiers).await;
            sections.insert(name.clone(), result);
        }

        let all_primary = sections.values().all(|s| s.source.is_primary());
        let page = AggregatePage {
            page: spec.name.clone(),
            sections,
            all_primary,
        };

        if all_primary {
            self.store_page(spec, &page);
        } else {
            debug!(page = %spec.name, "Page has fallback sections, not caching");
        }

        page
    }

    fn from_page_cache(&self, spec: &PageSpec) -> Option<AggregatePage> {
        let cache = self.resolver.cache();
        let Value::Object(mut cached) = cache.load(&spec.page_key)? else {
            return None;
        };

        let mut sections = BTreeMap::new();
        for name in spec.section_names() {
            let Some(data) = cached.remove(name) else {
                debug!(page = %spec.name, section = name, "Cached page lacks section, rebuilding");
                return None;
            };
            if let Some(err) = cache.validate(name, &data) {
                warn!(
                    code = err.defect().code(),
                    defect = %err.defect(),
                    page = %spec.name,
                    section = name,
                    "Cached page section rejected: {}",
                    err.message()
                );
                if let Err(e) = cache.delete(&spec.page_key) {
                    warn!(page = %spec.name, error = %e, "Failed to delete rejected page");
                }
                return None;
            }
            sections.insert(name.to_string(), SectionResult::new(Source::Cache, data));
        }

        Some(AggregatePage {
            page: spec.name.clone(),
            sections,
            all_primary: true,
        })
    }

    /// Shortest TTL among the page's sections
    fn page_ttl(&self, spec: &PageSpec) -> Duration {
        let default_ttl = self.resolver.cache().default_ttl();
        spec.section_names()
            .filter_map(|name| self.catalog.get(name))
            .map(|def| def.ttl.unwrap_or(default_ttl))
            .min()
            .unwrap_or(default_ttl)
    }

    fn store_page(&self, spec: &PageSpec, page: &AggregatePage) {
        for (name, section) in &page.sections {
            if let Some(err) = self.resolver.cache().validate(name, &section.data) {
                info!(
                    code = err.defect().code(),
                    page = %spec.name,
                    section = %name,
                    "Section would not survive the cache, not caching page"
                );
                return;
            }
        }

        let payload: Map<String, Value> = page
            .sections
            .iter()
            .map(|(name, section)| (name.clone(), section.data.clone()))
            .collect();

        if let Err(e) = self.resolver.cache().save(&spec.page_key, &payload, self.page_ttl(spec)) {
            warn!(page = %spec.name, error = %e, "Failed to cache page");
        }
    }
}
