//! Primary content sources
//!
//! The primary source is the authoritative store behind every section (the
//! site's relational database, or a content API in front of it). Resolvers
//! only see the [`PrimarySource`] trait; a failed query is never retried here.

mod http;
mod sqlite;

pub use http::HttpSource;
pub use sqlite::SqliteSource;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Whether a query yields one record or an ordered list of records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    Single,
    List,
}

/// A query for one content section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionQuery {
    /// Section name; HTTP sources use it as the path segment
    pub section: String,
    /// SQL statement for relational sources
    pub statement: String,
    /// Named parameters (e.g. `":limit"`) bound into the statement
    pub params: Vec<(String, Value)>,
    pub shape: QueryShape,
}

impl SectionQuery {
    /// Query returning the first row of `statement`
    pub fn single(section: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            statement: statement.into(),
            params: Vec::new(),
            shape: QueryShape::Single,
        }
    }

    /// Query returning every row of `statement` in order
    pub fn list(section: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            statement: statement.into(),
            params: Vec::new(),
            shape: QueryShape::List,
        }
    }

    /// Binds a named parameter
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// Errors that can occur when querying a primary source
#[derive(Debug, Error)]
pub enum SourceError {
    /// No connection could be obtained
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The query itself failed
    #[error("Query failed: {0}")]
    Query(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Failed to parse the response body
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    /// True when no connection was obtainable, as opposed to a failed query
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// The authoritative store behind content sections
///
/// `Ok(None)` means the source answered but had nothing for the query.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    async fn fetch(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError>;
}

#[async_trait]
impl<S: PrimarySource + ?Sized> PrimarySource for Box<S> {
    async fn fetch(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        (**self).fetch(query).await
    }
}

#[async_trait]
impl<S: PrimarySource + ?Sized> PrimarySource for Arc<S> {
    async fn fetch(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        (**self).fetch(query).await
    }
}

/// Source used when nothing is configured; every query reports no connection
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

#[async_trait]
impl PrimarySource for NoSource {
    async fn fetch(&self, _query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        Err(SourceError::Unavailable("no primary source configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_builders() {
        let query = SectionQuery::list("projects_page", "SELECT * FROM projects LIMIT :limit")
            .bind(":limit", 12);
        assert_eq!(query.shape, QueryShape::List);
        assert_eq!(query.params, vec![(":limit".to_string(), json!(12))]);

        let single = SectionQuery::single("home", "SELECT 1");
        assert_eq!(single.shape, QueryShape::Single);
        assert!(single.params.is_empty());
    }

    #[tokio::test]
    async fn test_no_source_is_unavailable() {
        let err = NoSource
            .fetch(&SectionQuery::single("home", "SELECT 1"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_boxed_source_delegates() {
        let boxed: Box<dyn PrimarySource> = Box::new(NoSource);
        let result = boxed.fetch(&SectionQuery::single("home", "SELECT 1")).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
