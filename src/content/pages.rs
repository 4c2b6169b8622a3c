//! Site pages and their section layouts.

use crate::aggregate::PageSpec;

/// Pages the site renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Landing page
    Home,
    /// About me
    About,
    /// Project gallery
    Projects,
    /// Notes and articles
    Notes,
    /// Contact form and details
    Contact,
    /// Header and footer shared by every page
    Layout,
}

impl Page {
    /// Returns a slice containing all pages.
    pub fn all() -> &'static [Page] {
        &[
            Page::Home,
            Page::About,
            Page::Projects,
            Page::Notes,
            Page::Contact,
            Page::Layout,
        ]
    }

    /// Lowercase page name as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::About => "about",
            Page::Projects => "projects",
            Page::Notes => "notes",
            Page::Contact => "contact",
            Page::Layout => "layout",
        }
    }

    /// Parses user input into a Page.
    ///
    /// Matching is case-insensitive and supports aliases:
    /// - "home" | "index" | "/" -> Home
    /// - "about" | "about-me" -> About
    /// - "projects" | "project" | "work" -> Projects
    /// - "notes" | "note" | "blog" -> Notes
    /// - "contact" | "contact-me" -> Contact
    /// - "layout" | "chrome" -> Layout
    ///
    /// Returns `None` if the input doesn't match any page.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Page> {
        match s.trim().to_lowercase().as_str() {
            "home" | "index" | "/" => Some(Page::Home),
            "about" | "about-me" => Some(Page::About),
            "projects" | "project" | "work" => Some(Page::Projects),
            "notes" | "note" | "blog" => Some(Page::Notes),
            "contact" | "contact-me" => Some(Page::Contact),
            "layout" | "chrome" => Some(Page::Layout),
            _ => None,
        }
    }

    /// Anchor, dependents and cache key for this page.
    pub fn spec(&self) -> PageSpec {
        match self {
            Page::Home => PageSpec::new(
                "home",
                "home_page",
                "home",
                &["skills", "projects_featured", "contact"],
            ),
            Page::About => PageSpec::new("about", "about_page", "about_hero", &["skills"]),
            Page::Projects => PageSpec::new(
                "projects",
                "projects_page",
                "projects_all",
                &["projects_featured"],
            ),
            Page::Notes => PageSpec::new(
                "notes",
                "notes_page",
                "notes_list",
                &["note_categories", "note_tags", "note_pinned"],
            ),
            Page::Contact => PageSpec::new(
                "contact",
                "contact_page",
                "contact_hero",
                &["contact_info", "contact_socials"],
            ),
            Page::Layout => PageSpec::new(
                "layout",
                "layout",
                "header_settings",
                &[
                    "header_navigation",
                    "footer_settings",
                    "footer_quick_links",
                    "footer_social_links",
                ],
            ),
        }
    }
}
