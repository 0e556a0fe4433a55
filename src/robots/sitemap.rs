//! Sitemap XML parsing
//!
//! Wraps the `sitemap` crate's streaming reader. A document is either a
//! urlset (page URLs) or a sitemap index (child sitemap URLs); the crawl
//! engine follows one level of index nesting.

use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;

/// Outcome of parsing one sitemap document
#[derive(Debug, Clone, Default)]
pub struct ParsedSitemap {
    /// Page URLs from `<url><loc>` entries
    pub urls: Vec<String>,
    /// Child sitemap URLs from `<sitemap><loc>` entries (index documents)
    pub children: Vec<String>,
}

impl ParsedSitemap {
    /// Returns true if this document is a sitemap index
    pub fn is_index(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parses sitemap XML content
///
/// Malformed XML degrades to whatever entries were readable before the
/// error; it never fails the caller.
pub fn parse_sitemap(xml: &[u8]) -> ParsedSitemap {
    let mut parsed = ParsedSitemap::default();
    let reader = SiteMapReader::new(Cursor::new(xml));

    for entity in reader {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.children.push(url.to_string());
                }
            }
            _ => {}
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc><lastmod>2024-01-01</lastmod></url>
</urlset>"#;

        let parsed = parse_sitemap(xml);
        assert!(!parsed.is_index());
        assert_eq!(
            parsed.urls,
            vec![
                "https://example.com/".to_string(),
                "https://example.com/about".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_index() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
</sitemapindex>"#;

        let parsed = parse_sitemap(xml);
        assert!(parsed.is_index());
        assert_eq!(parsed.children.len(), 2);
        assert!(parsed.urls.is_empty());
    }

    #[test]
    fn test_malformed_xml_degrades() {
        let parsed = parse_sitemap(b"<urlset><url><loc>not closed");
        // No panic, partial or empty result
        assert!(!parsed.is_index());
    }

    #[test]
    fn test_empty_document() {
        let parsed = parse_sitemap(b"");
        assert!(parsed.urls.is_empty());
        assert!(parsed.children.is_empty());
    }
}
