//! Command-line interface for folio
//!
//! This module handles parsing of CLI arguments using clap and runs the
//! selected command against a configured resolution stack. Every command
//! returns its output as a string so it can be tested without a terminal.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::{ConfigError, SiteConfig};
use crate::content::Page;
use crate::projects::{list_projects, ProjectQuery, DEFAULT_LIMIT};

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified page name is not recognized
    #[error("Invalid page: '{0}'. Valid pages: home, about, projects, notes, contact, layout")]
    InvalidPage(String),

    /// The specified section has no definition
    #[error("Unknown section: '{0}'")]
    UnknownSection(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// folio - Resolve portfolio content through cache, database and defaults
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Tiered content resolution for portfolio pages")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render a page as JSON
    ///
    /// Valid pages: home, about, projects, notes, contact, layout
    Render {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Resolve a single section
    Section {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List projects with filters and paging
    Projects {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Only projects using this technology
        #[arg(long)]
        tech: Option<String>,
        /// Only featured projects
        #[arg(long)]
        featured: bool,
    },

    /// Inspect or clear the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// Remove every cache entry
    Clear,
    /// Remove one entry
    Delete { key: String },
    /// Print one entry, or null on a miss
    Show { key: String },
}

/// Parses a page string argument into a Page.
///
/// # Arguments
/// * `s` - The page string from CLI
///
/// # Returns
/// * `Ok(Page)` if the string matches a valid page
/// * `Err(CliError::InvalidPage)` if the string doesn't match
pub fn parse_page_arg(s: &str) -> Result<Page, CliError> {
    Page::from_str(s).ok_or_else(|| CliError::InvalidPage(s.to_string()))
}

/// Runs a command and returns what should be printed.
///
/// # Arguments
/// * `command` - The parsed subcommand
/// * `config` - Loaded site configuration
pub async fn execute(command: &Command, config: &SiteConfig) -> Result<String, CliError> {
    match command {
        Command::Render { page } => {
            let page = parse_page_arg(page)?;
            let aggregator = config.aggregator()?;
            let rendered = aggregator.render(&page.spec()).await;
            Ok(serde_json::to_string_pretty(&rendered)?)
        }
        Command::Section { name } => {
            let aggregator = config.aggregator()?;
            if aggregator.catalog().get(name).is_none() {
                return Err(CliError::UnknownSection(name.clone()));
            }
            let result = aggregator.section(name).await;
            Ok(serde_json::to_string_pretty(&result)?)
        }
        Command::Projects {
            offset,
            limit,
            tech,
            featured,
        } => {
            let aggregator = config.aggregator()?;
            let query = ProjectQuery {
                offset: *offset,
                limit: *limit,
                tech: tech.clone(),
                featured: *featured,
            };
            let listing = list_projects(&aggregator, &query).await;
            Ok(serde_json::to_string_pretty(&listing)?)
        }
        Command::Cache { action } => {
            let store = config.cache_store();
            match action {
                CacheAction::Clear => {
                    let removed = store.clear()?;
                    Ok(format!("Removed {} cache entries from {}", removed, store.dir().display()))
                }
                CacheAction::Delete { key } => {
                    store.delete(key)?;
                    Ok(format!("Deleted {}", store.key(key).token()))
                }
                CacheAction::Show { key } => {
                    let entry = json!({
                        "key": store.key(key).token(),
                        "path": store.entry_path(key).display().to_string(),
                        "payload": store.load(key),
                    });
                    Ok(serde_json::to_string_pretty(&entry)?)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_config() -> (SiteConfig, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = SiteConfig {
            cache_dir: temp_dir.path().join("cache"),
            ..SiteConfig::default()
        };
        (config, temp_dir)
    }

    #[test]
    fn test_parse_page_arg_aliases() {
        assert_eq!(parse_page_arg("home").unwrap(), Page::Home);
        assert_eq!(parse_page_arg("Blog").unwrap(), Page::Notes);
        assert_eq!(parse_page_arg("layout").unwrap(), Page::Layout);
    }

    #[test]
    fn test_parse_page_arg_invalid() {
        let result = parse_page_arg("pricing");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid page"));
        assert!(err.to_string().contains("pricing"));
    }

    #[test]
    fn test_cli_parse_render() {
        let cli = Cli::parse_from(["folio", "render", "home"]);
        assert_eq!(cli.command, Command::Render { page: "home".to_string() });
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["folio", "section", "skills", "--config", "/etc/folio.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/folio.toml")));
        assert_eq!(cli.command, Command::Section { name: "skills".to_string() });
    }

    #[test]
    fn test_cli_parse_projects_defaults() {
        let cli = Cli::parse_from(["folio", "projects"]);
        assert_eq!(
            cli.command,
            Command::Projects {
                offset: 0,
                limit: DEFAULT_LIMIT,
                tech: None,
                featured: false
            }
        );
    }

    #[test]
    fn test_cli_parse_projects_filters() {
        let cli = Cli::parse_from([
            "folio", "projects", "--offset", "12", "--limit", "6", "--tech", "rust", "--featured",
        ]);
        assert_eq!(
            cli.command,
            Command::Projects {
                offset: 12,
                limit: 6,
                tech: Some("rust".to_string()),
                featured: true
            }
        );
    }

    #[test]
    fn test_cli_parse_cache_actions() {
        let cli = Cli::parse_from(["folio", "cache", "show", "header_settings"]);
        assert_eq!(
            cli.command,
            Command::Cache {
                action: CacheAction::Show { key: "header_settings".to_string() }
            }
        );
        assert!(Cli::try_parse_from(["folio", "cache"]).is_err());
    }

    #[tokio::test]
    async fn test_render_without_sources_is_hardcoded() {
        let (config, _temp_dir) = create_test_config();

        let output = execute(&Command::Render { page: "about".to_string() }, &config)
            .await
            .unwrap();

        let page: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(page["page"], "about");
        assert_eq!(page["all_primary"], false);
        assert_eq!(page["sections"]["about_hero"]["source"], "hardcoded");
        assert_eq!(page["sections"]["skills"]["source"], "hardcoded");
    }

    #[tokio::test]
    async fn test_render_invalid_page_fails() {
        let (config, _temp_dir) = create_test_config();
        let err = execute(&Command::Render { page: "nope".to_string() }, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidPage(_)));
    }

    #[tokio::test]
    async fn test_unknown_section_fails() {
        let (config, _temp_dir) = create_test_config();
        let err = execute(&Command::Section { name: "testimonials".to_string() }, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("testimonials"));
    }

    #[tokio::test]
    async fn test_cache_show_delete_clear() {
        let (config, _temp_dir) = create_test_config();
        let store = config.cache_store();
        store
            .save("skills", &serde_json::json!([{"skill_name": "Rust"}]), Duration::from_secs(60))
            .unwrap();
        store
            .save("home", &serde_json::json!({"hero_title": "Hi"}), Duration::from_secs(60))
            .unwrap();

        let shown = execute(
            &Command::Cache { action: CacheAction::Show { key: "skills".to_string() } },
            &config,
        )
        .await
        .unwrap();
        let shown: Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(shown["key"], "v1_skills");
        assert_eq!(shown["payload"][0]["skill_name"], "Rust");

        let deleted = execute(
            &Command::Cache { action: CacheAction::Delete { key: "skills".to_string() } },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(deleted, "Deleted v1_skills");
        assert!(store.load("skills").is_none());

        let cleared = execute(&Command::Cache { action: CacheAction::Clear }, &config)
            .await
            .unwrap();
        assert!(cleared.starts_with("Removed 1 cache entries"));
    }
}
