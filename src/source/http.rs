//! Content API primary source
//!
//! Fetches sections as JSON from `GET <base_url>/<section>`, passing bound
//! parameters as query-string pairs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::{PrimarySource, SectionQuery, SourceError};

/// Default request timeout for the content API
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a JSON content API
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// Creates a source for `base_url` with the given request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// URL queried for a section
    pub fn section_url(&self, section: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), section)
    }
}

#[async_trait]
impl PrimarySource for HttpSource {
    async fn fetch(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        let url = self.section_url(&query.section);
        let pairs = query_pairs(query);

        let response = self
            .client
            .get(&url)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    SourceError::Unavailable(e.to_string())
                } else {
                    SourceError::Http(e)
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(None),
            status if !status.is_success() => {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    url,
                })
            }
            _ => {}
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;

        Ok((!body.is_null()).then_some(body))
    }
}

/// Parameter names without their SQL sigil, values rendered as plain text
fn query_pairs(query: &SectionQuery) -> Vec<(String, String)> {
    query
        .params
        .iter()
        .map(|(name, value)| {
            let name = name.trim_start_matches([':', '@', '$']).to_string();
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name, value)
        })
        .collect()
}
