//! Paginated project listing
//!
//! Filtering and paging run in the content database when it is reachable.
//! Otherwise the `projects_all` section is resolved through the usual tiers
//! and filtered in process, so the gallery still pages over whatever data
//! the fallbacks provide.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::aggregate::Aggregator;
use crate::resolve::Source;
use crate::source::{PrimarySource, SectionQuery, SourceError};
use crate::validate::as_flag;

/// Projects shown per page when no limit is given
pub const DEFAULT_LIMIT: usize = 12;

/// Filters and paging for the project gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectQuery {
    pub offset: usize,
    pub limit: usize,
    /// Case-insensitive technology substring
    pub tech: Option<String>,
    /// Only featured projects
    pub featured: bool,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            tech: None,
            featured: false,
        }
    }
}

impl ProjectQuery {
    fn tech_filter(&self) -> Option<&str> {
        self.tech.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Query for one page of matching projects
    pub fn items_query(&self) -> SectionQuery {
        let sql = format!(
            "SELECT DISTINCT p.* FROM projects p {} \
             ORDER BY p.sort_order ASC, p.id DESC \
             LIMIT :limit OFFSET :offset",
            self.filter_clause()
        );
        self.bind_filters(SectionQuery::list("projects_page", sql))
            .bind(":limit", self.limit as i64)
            .bind(":offset", self.offset as i64)
    }

    /// Query counting every matching project
    pub fn count_query(&self) -> SectionQuery {
        let sql = format!(
            "SELECT COUNT(DISTINCT p.id) AS total FROM projects p {}",
            self.filter_clause()
        );
        self.bind_filters(SectionQuery::single("projects_count", sql))
    }

    fn filter_clause(&self) -> String {
        let mut clause = String::new();
        if self.tech_filter().is_some() {
            clause.push_str("LEFT JOIN project_tech pt ON pt.project_id = p.id ");
        }
        clause.push_str("WHERE p.is_active = 1");
        if self.featured {
            clause.push_str(" AND p.is_featured = 1");
        }
        if self.tech_filter().is_some() {
            clause.push_str(" AND pt.tech_name LIKE :tech");
        }
        clause
    }

    fn bind_filters(&self, query: SectionQuery) -> SectionQuery {
        match self.tech_filter() {
            Some(tech) => query.bind(":tech", format!("%{}%", tech)),
            None => query,
        }
    }

    /// True when an in-memory project record passes the filters
    pub fn matches(&self, project: &Value) -> bool {
        if self.featured && project.get("is_featured").map(as_flag) != Some(1) {
            return false;
        }
        match self.tech_filter() {
            Some(tech) => project
                .get("technologies")
                .and_then(Value::as_str)
                .is_some_and(|techs| techs.to_lowercase().contains(&tech.to_lowercase())),
            None => true,
        }
    }
}

/// One page of projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListing {
    pub items: Vec<Value>,
    /// Matching projects across all pages
    pub total: usize,
    pub source: Source,
}

/// Lists projects for the gallery
///
/// # Arguments
/// * `aggregator` - Supplies the primary source and the `projects_all` fallback
/// * `query` - Filters and paging
///
/// # Returns
/// Never fails. An empty page from the database is a valid answer; only a
/// source failure switches to in-process filtering.
pub async fn list_projects<P: PrimarySource>(
    aggregator: &Aggregator<P>,
    query: &ProjectQuery,
) -> ProjectListing {
    match from_primary(aggregator.resolver().source(), query).await {
        Ok(listing) => listing,
        Err(e) => {
            warn!(error = %e, "Project listing query failed, filtering fallback data");
            let all = aggregator.section("projects_all").await;
            filter_in_process(all.data, all.source, query)
        }
    }
}

async fn from_primary<P: PrimarySource>(
    source: &P,
    query: &ProjectQuery,
) -> Result<ProjectListing, SourceError> {
    let items = match source.fetch(&query.items_query()).await? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    let total = source
        .fetch(&query.count_query())
        .await?
        .as_ref()
        .and_then(|row| row.get("total"))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(query.offset + items.len());

    debug!(items = items.len(), total, "Project page from primary source");
    Ok(ProjectListing {
        items,
        total,
        source: Source::Primary,
    })
}

fn filter_in_process(data: Value, source: Source, query: &ProjectQuery) -> ProjectListing {
    let projects = match data {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let filtered: Vec<Value> = projects.into_iter().filter(|p| query.matches(p)).collect();
    let total = filtered.len();
    let items = filtered
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    ProjectListing {
        items,
        total,
        source,
    }
}
