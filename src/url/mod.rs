//! URL handling for the crawl engine
//!
//! Provides URL normalization for dedup comparison plus host extraction and
//! same-domain checks used by the traversal filters.

mod domain;
mod normalize;

pub use domain::{extract_host, is_same_domain};
pub use normalize::normalize;
