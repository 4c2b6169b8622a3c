//! End-to-end resolution against a real SQLite content database

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use folio::config::SiteConfig;
use folio::content::Page;
use folio::resolve::Source;

fn seed_layout_db(path: &Path) {
    let conn = Connection::open(path).expect("Failed to create database");
    conn.execute_batch(
        "CREATE TABLE header_settings (site_title TEXT, logo_path TEXT, button_text TEXT,
                                       button_link TEXT, accent_color TEXT, is_active INTEGER);
         INSERT INTO header_settings VALUES ('Folio', '/logo.png', 'CV', '/cv.pdf', NULL, 1);

         CREATE TABLE navigation_links (label TEXT, url TEXT, order_no INTEGER, is_active INTEGER);
         INSERT INTO navigation_links VALUES ('Home', '/', 1, 1), ('Notes', '/notes', 2, 1);

         CREATE TABLE footer_settings (brand_name TEXT, footer_description TEXT,
                                       developer_name TEXT, accent_color TEXT, is_active INTEGER);
         INSERT INTO footer_settings VALUES ('Folio', 'Notes and projects', 'Dev', '#000', 1);

         CREATE TABLE social_links (id INTEGER PRIMARY KEY, platform TEXT, url TEXT,
                                    icon_class TEXT, is_active INTEGER);
         INSERT INTO social_links (platform, url, icon_class, is_active)
             VALUES ('GitHub', 'https://github.com/folio', 'fab fa-github', 1);",
    )
    .expect("Failed to seed database");
}

fn config_for(dir: &Path, database: Option<PathBuf>) -> SiteConfig {
    SiteConfig {
        cache_dir: dir.join("cache"),
        defaults_dir: Some(dir.join("defaults")),
        database_path: database,
        ..SiteConfig::default()
    }
}

#[tokio::test]
async fn test_layout_goes_live_then_serves_from_page_cache() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = temp_dir.path().join("content.db");
    seed_layout_db(&db);
    let aggregator = config_for(temp_dir.path(), Some(db)).aggregator().unwrap();
    let spec = Page::Layout.spec();

    let first = aggregator.render(&spec).await;
    assert!(first.all_primary, "{:?}", first);
    assert!(first.sections.values().all(|s| s.source == Source::Primary));
    // null required key normalized
    assert_eq!(first.sections["header_settings"].data["accent_color"], "");

    let second = aggregator.render(&spec).await;
    assert!(second.sections.values().all(|s| s.source == Source::Cache));
    assert_eq!(
        second.sections["footer_social_links"].data,
        json!([{"platform": "GitHub", "url": "https://github.com/folio", "icon_class": "fab fa-github"}])
    );
}

#[tokio::test]
async fn test_warm_cache_survives_missing_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = temp_dir.path().join("content.db");
    seed_layout_db(&db);
    let spec = Page::Layout.spec();

    let live = config_for(temp_dir.path(), Some(db)).aggregator().unwrap();
    live.render(&spec).await;
    live.resolver().cache().delete(&spec.page_key).unwrap();

    let offline = config_for(temp_dir.path(), Some(temp_dir.path().join("gone.db")))
        .aggregator()
        .unwrap();
    let page = offline.render(&spec).await;

    assert!(page.all_primary);
    assert!(page.sections.values().all(|s| s.source == Source::Cache));
}

#[tokio::test]
async fn test_poisoned_cache_entries_heal_from_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = temp_dir.path().join("content.db");
    seed_layout_db(&db);
    let aggregator = config_for(temp_dir.path(), Some(db)).aggregator().unwrap();
    let cache = aggregator.resolver().cache();

    cache
        .save(
            "header_settings",
            &json!({"logo_path": "/a.png", "button_text": "x", "button_link": "/", "is_active": 0}),
            Duration::from_secs(600),
        )
        .unwrap();
    cache
        .save(
            "footer_quick_links",
            &json!([{"label": "Home", "url": ""}]),
            Duration::from_secs(600),
        )
        .unwrap();

    let page = aggregator.render(&Page::Layout.spec()).await;

    assert_eq!(page.source_of("header_settings"), Some(Source::Primary));
    assert_eq!(page.source_of("footer_quick_links"), Some(Source::Primary));
    assert_eq!(page.sections["header_settings"].data["site_title"], "Folio");
}

#[tokio::test]
async fn test_invalid_live_quick_links_never_served_from_page_cache() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = temp_dir.path().join("content.db");
    seed_layout_db(&db);
    Connection::open(&db)
        .unwrap()
        .execute("UPDATE navigation_links SET url = '' WHERE label = 'Home'", [])
        .unwrap();
    let aggregator = config_for(temp_dir.path(), Some(db)).aggregator().unwrap();
    let spec = Page::Layout.spec();

    let first = aggregator.render(&spec).await;
    assert!(first.all_primary);
    assert!(aggregator.resolver().cache().load(&spec.page_key).is_none());

    let second = aggregator.render(&spec).await;
    assert_eq!(second.source_of("footer_quick_links"), Some(Source::Primary));
    assert_eq!(second.source_of("header_settings"), Some(Source::Cache));
}

#[tokio::test]
async fn test_truncated_cache_file_is_discarded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let aggregator = config_for(temp_dir.path(), None).aggregator().unwrap();
    let path = aggregator.resolver().cache().entry_path("skills");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, r#"{"expires_at": "#).unwrap();

    let result = aggregator.section("skills").await;

    assert_eq!(result.source, Source::Hardcoded);
    assert!(!path.exists(), "Truncated entry should be deleted");
}

#[tokio::test]
async fn test_missing_database_renders_from_defaults_and_locks_dependents() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let defaults = temp_dir.path().join("defaults").join("v1");
    fs::create_dir_all(&defaults).unwrap();
    fs::write(defaults.join("notes_list.json"), r#"[{"title": "Offline note"}]"#).unwrap();
    fs::write(defaults.join("note_tags.json"), r#"[{"name": "rust", "slug": "rust"}]"#).unwrap();

    let aggregator = config_for(temp_dir.path(), Some(temp_dir.path().join("absent.db")))
        .aggregator()
        .unwrap();
    let page = aggregator.render(&Page::Notes.spec()).await;

    assert_eq!(page.source_of("notes_list"), Some(Source::StaticDefault));
    assert_eq!(page.source_of("note_tags"), Some(Source::StaticDefault));
    assert_eq!(page.source_of("note_categories"), Some(Source::Hardcoded));
    assert_eq!(page.source_of("note_pinned"), Some(Source::Hardcoded));
    assert!(!page.all_primary);
    assert!(aggregator.resolver().cache().load("notes_page").is_none());
}
