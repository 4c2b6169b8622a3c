//! folio - Tiered content resolution for portfolio pages
//!
//! Every content section resolves through four tiers: a validated file
//! cache, the primary content source, static default files and hard-coded
//! defaults. Pages group sections around an anchor whose tier decides which
//! tiers the remaining sections may use.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod logging;
pub mod projects;
pub mod resolve;
pub mod source;
pub mod validate;
