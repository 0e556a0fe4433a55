//! Politeness resolver: robots.txt directives and sitemap discovery
//!
//! Answers "may this path be fetched" for the crawl's agent token and
//! supplies the sitemap-derived URL set. Absence of either document is
//! never fatal: a missing robots.txt allows everything and a missing
//! sitemap yields an empty seed set.

mod parser;
mod sitemap;

pub use parser::{RobotsRules, RuleGroup};
pub use self::sitemap::{parse_sitemap, ParsedSitemap};

/// Well-known sitemap locations probed when robots.txt declares none
pub const SITEMAP_CANDIDATES: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemaps.xml"];
