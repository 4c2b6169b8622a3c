//! Portfolio content: section catalog and page layouts

mod pages;
mod sections;

pub use pages::Page;
pub use sections::{standard_catalog, FOOTER_KEYS, HEADER_KEYS};
