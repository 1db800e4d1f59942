//! URL helpers for newsbot
//!
//! Host keys used to pick a site-specific extractor, and resolution of
//! relative links and image sources against a page's base URL.

mod domain;
mod resolve;

pub use domain::host_key;
pub use resolve::resolve_link;
