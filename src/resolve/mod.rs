//! Four-tier section resolution
//!
//! Every content section is resolved through the same ordered tiers:
//! cache, primary source, static default file, hard-coded default. The first
//! tier that yields content wins and later tiers are never consulted.
//! Resolution itself cannot fail; the hard-coded tier always has content.

mod defaults;
mod section;

pub use defaults::StaticDefaults;
pub use section::{SectionCatalog, SectionDef};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::source::{PrimarySource, SourceError};

/// Where a section's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Cache,
    Primary,
    StaticDefault,
    Hardcoded,
    Error,
}

impl Source {
    /// Cache hits count as primary: cached data once came from the source
    pub fn is_primary(self) -> bool {
        matches!(self, Source::Cache | Source::Primary)
    }

    /// Tiers a dependent section may use when this is its anchor's source
    pub fn locked_tiers(self) -> &'static [Tier] {
        match self {
            Source::Cache | Source::Primary => Tier::ALL,
            Source::StaticDefault => &[Tier::StaticDefault, Tier::Hardcoded],
            Source::Hardcoded | Source::Error => &[Tier::Hardcoded],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Primary => "primary",
            Source::StaticDefault => "static-default",
            Source::Hardcoded => "hardcoded",
            Source::Error => "error",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fallback level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Cache,
    Primary,
    StaticDefault,
    Hardcoded,
}

impl Tier {
    /// Every tier, in resolution order
    pub const ALL: &'static [Tier] = &[
        Tier::Cache,
        Tier::Primary,
        Tier::StaticDefault,
        Tier::Hardcoded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Cache => "cache",
            Tier::Primary => "primary",
            Tier::StaticDefault => "static-default",
            Tier::Hardcoded => "hardcoded",
        }
    }
}

/// Resolved data for one section, tagged with its tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    pub source: Source,
    pub data: Value,
}

impl SectionResult {
    pub fn new(source: Source, data: Value) -> Self {
        Self { source, data }
    }
}

/// Why a single tier produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionOutcome {
    /// Nothing stored for this section in the tier
    #[error("miss")]
    Miss,
    /// The tier answered with an empty mapping or sequence
    #[error("empty result")]
    Empty,
    /// The primary source could not be reached or the query failed
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// The tier has no path configured
    #[error("configuration missing")]
    ConfigurationMissing,
}

/// True for non-empty mappings and sequences
pub(crate) fn has_content(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Resolves sections through the four tiers
///
/// Generic over the primary source so tests and deployments can plug in any
/// store. The cache store and static defaults are injected, never global.
#[derive(Debug, Clone)]
pub struct SectionResolver<P> {
    cache: CacheStore,
    source: P,
    defaults: StaticDefaults,
}

impl<P: PrimarySource> SectionResolver<P> {
    pub fn new(cache: CacheStore, source: P, defaults: StaticDefaults) -> Self {
        Self {
            cache,
            source,
            defaults,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn defaults(&self) -> &StaticDefaults {
        &self.defaults
    }

    /// Resolves a section through every tier
    pub async fn resolve(&self, def: &SectionDef) -> SectionResult {
        self.resolve_through(def, Tier::ALL).await
    }

    /// Resolves a section using only `tiers`, in order
    ///
    /// The hard-coded default is returned if none of the given tiers yields
    /// content, so the result always has data.
    pub async fn resolve_through(&self, def: &SectionDef, tiers: &[Tier]) -> SectionResult {
        for &tier in tiers {
            match self.try_tier(def, tier).await {
                Ok(result) => {
                    debug!(section = %def.name, source = %result.source, "Section resolved");
                    return SectionResult::new(result.source, def.normalize(result.data));
                }
                Err(outcome) => {
                    debug!(
                        section = %def.name,
                        tier = tier.as_str(),
                        outcome = %outcome,
                        "Tier yielded nothing, falling through"
                    );
                }
            }
        }

        SectionResult::new(Source::Hardcoded, def.normalize(def.hardcoded()))
    }

    /// Runs a single tier
    pub async fn try_tier(
        &self,
        def: &SectionDef,
        tier: Tier,
    ) -> Result<SectionResult, ResolutionOutcome> {
        match tier {
            Tier::Cache => self
                .cache
                .load(&def.name)
                .map(|data| SectionResult::new(Source::Cache, data))
                .ok_or(ResolutionOutcome::Miss),
            Tier::Primary => self.from_primary(def).await,
            Tier::StaticDefault => self.from_static(def),
            Tier::Hardcoded => Ok(SectionResult::new(Source::Hardcoded, def.hardcoded())),
        }
    }

    async fn from_primary(&self, def: &SectionDef) -> Result<SectionResult, ResolutionOutcome> {
        match self.source.fetch(&def.query).await {
            Ok(Some(data)) if has_content(&data) => {
                let ttl = def.ttl.unwrap_or_else(|| self.cache.default_ttl());
                if let Err(e) = self.cache.save(&def.name, &data, ttl) {
                    warn!(section = %def.name, error = %e, "Failed to cache primary result");
                }
                Ok(SectionResult::new(Source::Primary, data))
            }
            Ok(_) => {
                info!(section = %def.name, "Primary source returned nothing");
                Err(ResolutionOutcome::Empty)
            }
            Err(SourceError::Unavailable(reason)) => {
                error!(section = %def.name, reason = %reason, "DB unavailable");
                Err(ResolutionOutcome::SourceUnavailable(reason))
            }
            Err(e) => {
                error!(section = %def.name, error = %e, "Primary source query failed");
                Err(ResolutionOutcome::SourceUnavailable(e.to_string()))
            }
        }
    }

    fn from_static(&self, def: &SectionDef) -> Result<SectionResult, ResolutionOutcome> {
        self.defaults.lookup(&def.name).map(|data| {
            info!(section = %def.name, "Serving static default");
            SectionResult::new(Source::StaticDefault, data)
        })
    }
}
