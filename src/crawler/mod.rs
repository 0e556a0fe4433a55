//! Crawling engine module
//!
//! Structure:
//! - `frontier`: crawl queue, visited-set, depth/budget admission
//! - `fetcher`: bounded HTTP GET with timing and redirect capture
//! - `extractor`: HTML to structured content record
//! - `gate`: per-host politeness interval
//! - `engine`: the run-scoped orchestration tying it all together

mod engine;
mod extractor;
mod fetcher;
mod frontier;
mod gate;

pub use engine::{CrawlEngine, CrawlSummary};
pub use extractor::{extract_content, ExtractedContent};
pub use fetcher::{build_http_client, fetch_url, FetchError, PageFetch};
pub use frontier::Frontier;
pub use gate::HostGate;
