//! Section definitions for the portfolio site
//!
//! Each section carries the SQL run against the content database and the
//! hard-coded payload served when nothing else is available.

use serde_json::json;
use std::time::Duration;

use crate::resolve::{SectionCatalog, SectionDef};
use crate::source::SectionQuery;

/// Keys every header settings payload carries after normalization
pub const HEADER_KEYS: &[&str] = &[
    "site_title",
    "logo_path",
    "button_text",
    "button_link",
    "accent_color",
];

/// Keys every footer settings payload carries after normalization
pub const FOOTER_KEYS: &[&str] = &[
    "brand_name",
    "footer_description",
    "developer_name",
    "accent_color",
];

/// Notes change more often than the rest of the site
const NOTES_TTL: Duration = Duration::from_secs(900);

/// Builds the catalog of every section the site renders
pub fn standard_catalog() -> SectionCatalog {
    let mut catalog = SectionCatalog::new();
    for def in layout_sections()
        .into_iter()
        .chain(page_sections())
        .chain(note_sections())
    {
        catalog.register(def);
    }
    catalog
}

fn layout_sections() -> Vec<SectionDef> {
    vec![
        SectionDef::new(
            "header_settings",
            SectionQuery::single(
                "header_settings",
                "SELECT * FROM header_settings WHERE is_active = 1 LIMIT 1",
            ),
            json!({
                "site_title": "Portfolio",
                "logo_path": "/assets/img/logo.svg",
                "button_text": "Download CV",
                "button_link": "/download/cv",
                "accent_color": "#4f46e5"
            }),
        )
        .with_required_keys(HEADER_KEYS),
        SectionDef::new(
            "header_navigation",
            SectionQuery::list(
                "header_navigation",
                "SELECT label, url FROM navigation_links WHERE is_active = 1 ORDER BY order_no ASC",
            ),
            nav_links(),
        ),
        SectionDef::new(
            "footer_settings",
            SectionQuery::single(
                "footer_settings",
                "SELECT * FROM footer_settings WHERE is_active = 1 LIMIT 1",
            ),
            json!({
                "brand_name": "Portfolio",
                "footer_description": "Projects, notes and experiments.",
                "developer_name": "Site Owner",
                "accent_color": "#4f46e5"
            }),
        )
        .with_required_keys(FOOTER_KEYS),
        SectionDef::new(
            "footer_quick_links",
            SectionQuery::list(
                "footer_quick_links",
                "SELECT label, url FROM navigation_links WHERE is_active = 1 ORDER BY order_no ASC",
            ),
            nav_links(),
        ),
        SectionDef::new(
            "footer_social_links",
            SectionQuery::list(
                "footer_social_links",
                "SELECT platform, url, icon_class FROM social_links WHERE is_active = 1 ORDER BY id ASC",
            ),
            json!([
                {"platform": "GitHub", "url": "https://github.com", "icon_class": "fab fa-github"},
                {"platform": "LinkedIn", "url": "https://www.linkedin.com", "icon_class": "fab fa-linkedin"}
            ]),
        ),
    ]
}

fn nav_links() -> serde_json::Value {
    json!([
        {"label": "Home", "url": "/"},
        {"label": "About", "url": "/about"},
        {"label": "Projects", "url": "/projects"},
        {"label": "Notes", "url": "/notes"},
        {"label": "Contact", "url": "/contact"}
    ])
}

fn page_sections() -> Vec<SectionDef> {
    vec![
        SectionDef::new(
            "home",
            SectionQuery::single("home", "SELECT * FROM home_section WHERE is_active = 1 LIMIT 1"),
            json!({
                "hero_title": "Hi, I build things for the web",
                "hero_subtitle": "Developer portfolio",
                "hero_description": "A collection of projects, notes and experiments.",
                "hero_image": "/assets/img/hero.svg"
            }),
        ),
        SectionDef::new(
            "about_hero",
            SectionQuery::single(
                "about_hero",
                "SELECT * FROM about_hero WHERE is_active = 1 LIMIT 1",
            ),
            json!({
                "title": "About Me",
                "subtitle": "Developer and lifelong learner",
                "image_path": "/assets/img/about.svg"
            }),
        ),
        SectionDef::new(
            "skills",
            SectionQuery::list(
                "skills",
                "SELECT skill_name, icon_class, color_class FROM skills WHERE is_active = 1 ORDER BY id ASC",
            ),
            json!([
                {"skill_name": "HTML", "icon_class": "fab fa-html5", "color_class": "text-orange"},
                {"skill_name": "CSS", "icon_class": "fab fa-css3-alt", "color_class": "text-blue"},
                {"skill_name": "JavaScript", "icon_class": "fab fa-js", "color_class": "text-yellow"}
            ]),
        ),
        SectionDef::new(
            "projects_featured",
            SectionQuery::list(
                "projects_featured",
                "SELECT * FROM projects WHERE is_active = 1 AND is_featured = 1 ORDER BY sort_order ASC, id DESC",
            ),
            json!([sample_project()]),
        ),
        SectionDef::new(
            "projects_all",
            SectionQuery::list(
                "projects_all",
                "SELECT * FROM projects WHERE is_active = 1 ORDER BY sort_order ASC, id DESC",
            ),
            json!([sample_project()]),
        ),
        SectionDef::new(
            "contact",
            SectionQuery::single(
                "contact",
                "SELECT title, subtitle, button_text, button_link FROM contact_section WHERE is_active = 1 LIMIT 1",
            ),
            json!({
                "title": "Let's work together",
                "subtitle": "Have a project in mind? Get in touch.",
                "button_text": "Contact me",
                "button_link": "/contact"
            }),
        ),
        SectionDef::new(
            "contact_hero",
            SectionQuery::single(
                "contact_hero",
                "SELECT * FROM contact_page_settings WHERE is_active = 1 LIMIT 1",
            ),
            json!({
                "hero_title": "Contact",
                "hero_subtitle": "Questions, ideas or just a hello.",
                "form_title": "Send a message"
            }),
        ),
        SectionDef::new(
            "contact_info",
            SectionQuery::list(
                "contact_info",
                "SELECT * FROM contact_info WHERE is_active = 1 ORDER BY sort_order ASC",
            ),
            json!([
                {"label": "Email", "value": "hello@example.com", "icon_class": "fas fa-envelope"}
            ]),
        ),
        SectionDef::new(
            "contact_socials",
            SectionQuery::list(
                "contact_socials",
                "SELECT * FROM contact_social_links WHERE is_active = 1 ORDER BY sort_order ASC",
            ),
            json!([
                {"platform": "GitHub", "url": "https://github.com", "icon_class": "fab fa-github"}
            ]),
        ),
    ]
}

fn sample_project() -> serde_json::Value {
    json!({
        "id": 0,
        "title": "Portfolio Site",
        "slug": "portfolio-site",
        "short_description": "This site: content served through a tiered cache.",
        "technologies": "Rust, SQLite",
        "is_featured": 1,
        "sort_order": 0
    })
}

fn note_sections() -> Vec<SectionDef> {
    vec![
        SectionDef::new(
            "notes_list",
            SectionQuery::list(
                "notes_list",
                "SELECT n.*, c.slug, c.name AS category_name
                 FROM notes n
                 JOIN note_categories c ON n.category_id = c.id
                 WHERE n.is_active = 1
                 ORDER BY n.created_at DESC",
            ),
            json!([{
                "title": "Welcome",
                "excerpt": "Notes will appear here once published.",
                "slug": "general",
                "category_name": "General",
                "is_pinned": 0
            }]),
        )
        .with_ttl(NOTES_TTL),
        SectionDef::new(
            "note_categories",
            SectionQuery::list(
                "note_categories",
                "SELECT * FROM note_categories ORDER BY name ASC",
            ),
            json!([{"name": "General", "slug": "general"}]),
        )
        .with_ttl(NOTES_TTL),
        SectionDef::new(
            "note_tags",
            SectionQuery::list("note_tags", "SELECT * FROM note_tags ORDER BY name ASC"),
            json!([{"name": "general", "slug": "general"}]),
        )
        .with_ttl(NOTES_TTL),
        SectionDef::new(
            "note_pinned",
            SectionQuery::list(
                "note_pinned",
                "SELECT n.*, c.slug, c.name AS category_name
                 FROM notes n
                 JOIN note_categories c ON n.category_id = c.id
                 WHERE n.is_pinned = 1
                 ORDER BY n.created_at DESC
                 LIMIT 6",
            ),
            json!([{
                "title": "Welcome",
                "excerpt": "Pinned notes will appear here.",
                "slug": "general",
                "category_name": "General",
                "is_pinned": 1
            }]),
        )
        .with_ttl(NOTES_TTL),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::validate::ValidatorRegistry;

    #[test]
    fn test_catalog_has_every_section() {
        let catalog = standard_catalog();
        let expected = [
            "about_hero",
            "contact",
            "contact_hero",
            "contact_info",
            "contact_socials",
            "footer_quick_links",
            "footer_settings",
            "footer_social_links",
            "header_navigation",
            "header_settings",
            "home",
            "note_categories",
            "note_pinned",
            "note_tags",
            "notes_list",
            "projects_all",
            "projects_featured",
            "skills",
        ];
        assert_eq!(catalog.names(), expected.to_vec());
    }

    #[test]
    fn test_settings_sections_declare_required_keys() {
        let catalog = standard_catalog();
        assert_eq!(catalog.get("header_settings").unwrap().required_keys, HEADER_KEYS);
        assert_eq!(catalog.get("footer_settings").unwrap().required_keys, FOOTER_KEYS);
        assert!(catalog.get("skills").unwrap().required_keys.is_empty());
    }

    #[test]
    fn test_notes_use_shorter_ttl() {
        let catalog = standard_catalog();
        assert_eq!(catalog.get("note_tags").unwrap().ttl, Some(NOTES_TTL));
        assert_eq!(catalog.get("home").unwrap().ttl, None);
    }

    #[test]
    fn test_hardcoded_link_defaults_pass_validation() {
        // hard-coded header settings have no is_active flag and are never cached
        let registry = ValidatorRegistry::standard();
        let catalog = standard_catalog();
        for name in ["footer_settings", "footer_quick_links", "footer_social_links", "header_navigation"] {
            let def = catalog.get(name).unwrap();
            let key = CacheKey::new(name, "v1");
            assert!(
                registry.check(&key, &def.hardcoded()).is_none(),
                "{} default fails validation",
                name
            );
        }
    }
}
