//! The crawl engine: fetching, extraction, frontier, and orchestration

mod extractor;
mod fetcher;
mod frontier;
mod orchestrator;

pub use extractor::{extract, ExtractedContent};
pub use fetcher::{build_http_client, FetchFailure, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierEntry, FrontierState};
pub use orchestrator::Orchestrator;
