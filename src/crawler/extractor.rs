//! Content extractor
//!
//! Parses a fetched HTML body into a structured content record: title,
//! meta description, headings, images, outbound links, robots directives
//! and derived word/keyword metrics. Parsing is lenient (html5ever error
//! recovery): malformed markup degrades to partial results, it never
//! aborts the page.

use crate::storage::{NewImage, NewLink, NewPageContent};
use crate::url::{classify_link, LinkKind};
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Tokens shorter than this never count as keywords
const MIN_KEYWORD_CHARS: usize = 4;
/// Size of the reported keyword-density map
const TOP_KEYWORDS: usize = 10;
/// Number of primary keywords drawn from title + H1
const MAIN_KEYWORDS: usize = 5;

/// Everything extracted from one HTML page
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    /// Heading counts for h1..h6
    pub heading_counts: [u32; 6],
    pub robots_meta: Option<String>,
    pub canonical_url: Option<String>,
    pub has_structured_data: bool,
    pub word_count: u32,
    /// Top keywords with density percentages, frequency-ranked
    pub keyword_density: Vec<(String, f64)>,
    /// Primary keywords drawn from title + H1
    pub main_keywords: Vec<String>,
    pub images: Vec<NewImage>,
    pub images_without_alt: u32,
    pub links: Vec<NewLink>,
}

impl ExtractedContent {
    /// Returns true unless the page's robots meta carries `noindex`
    pub fn is_indexable(&self) -> bool {
        self.robots_meta
            .as_deref()
            .map(|m| !m.to_lowercase().contains("noindex"))
            .unwrap_or(true)
    }

    /// Builds the persistable content record
    pub fn content_record(&self) -> NewPageContent {
        let density_json: serde_json::Map<String, serde_json::Value> = self
            .keyword_density
            .iter()
            .map(|(word, pct)| (word.clone(), serde_json::json!(pct)))
            .collect();

        let internal = self
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::Internal)
            .count() as u32;
        let external = self
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::External)
            .count() as u32;

        NewPageContent {
            title: self.title.clone(),
            title_length: self.title.as_deref().map(count_chars).unwrap_or(0),
            meta_description: self.meta_description.clone(),
            meta_description_length: self
                .meta_description
                .as_deref()
                .map(count_chars)
                .unwrap_or(0),
            h1: self.h1.clone(),
            h1_count: self.heading_counts[0],
            h2_count: self.heading_counts[1],
            h3_count: self.heading_counts[2],
            h4_count: self.heading_counts[3],
            h5_count: self.heading_counts[4],
            h6_count: self.heading_counts[5],
            word_count: self.word_count,
            internal_links_count: internal,
            external_links_count: external,
            image_count: self.images.len() as u32,
            images_without_alt: self.images_without_alt,
            keyword_density: serde_json::Value::Object(density_json).to_string(),
            main_keywords: serde_json::json!(self.main_keywords).to_string(),
            has_structured_data: self.has_structured_data,
        }
    }
}

fn count_chars(s: &str) -> u32 {
    s.chars().count() as u32
}

/// Extracts the content profile of an HTML page
///
/// `page_url` is the fetched page's URL (base for relative links) and
/// `crawl_domain` the host the run was started on, used to classify each
/// outbound link.
pub fn extract_content(html: &str, page_url: &Url, crawl_domain: &str) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title");
    let meta_description = select_attr(&document, "meta[name=\"description\"]", "content");
    let h1 = select_text(&document, "h1");
    let robots_meta = select_attr(&document, "meta[name=\"robots\"]", "content");

    let canonical_url = select_attr(&document, "link[rel=\"canonical\"]", "href")
        .and_then(|href| page_url.join(&href).ok())
        .map(|u| u.to_string());

    let has_structured_data = Selector::parse("script[type=\"application/ld+json\"]")
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false);

    let mut heading_counts = [0u32; 6];
    for (index, tag) in ["h1", "h2", "h3", "h4", "h5", "h6"].iter().enumerate() {
        if let Ok(sel) = Selector::parse(tag) {
            heading_counts[index] = document.select(&sel).count() as u32;
        }
    }

    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    let word_count = text.split_whitespace().count() as u32;

    let keyword_density = keyword_density(&title, &h1, &text);
    let main_keywords = main_keywords(&title, &h1);

    let (images, images_without_alt) = extract_images(&document);
    let links = extract_links(&document, page_url, crawl_domain);

    ExtractedContent {
        title,
        meta_description,
        h1,
        heading_counts,
        robots_meta,
        canonical_url,
        has_structured_data,
        word_count,
        keyword_density,
        main_keywords,
        images,
        images_without_alt,
        links,
    }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_images(document: &Html) -> (Vec<NewImage>, u32) {
    let mut images = Vec::new();
    let mut without_alt = 0;

    if let Ok(sel) = Selector::parse("img[src]") {
        for element in document.select(&sel) {
            let Some(src) = element.value().attr("src").filter(|s| !s.is_empty()) else {
                continue;
            };
            let alt = element.value().attr("alt").map(|a| a.to_string());
            if alt.as_deref().map(str::is_empty).unwrap_or(true) {
                without_alt += 1;
            }

            images.push(NewImage {
                src: src.to_string(),
                alt,
                title: element.value().attr("title").map(|t| t.to_string()),
                is_lazy: element.value().attr("loading") == Some("lazy"),
            });
        }
    }

    (images, without_alt)
}

fn extract_links(document: &Html, page_url: &Url, crawl_domain: &str) -> Vec<NewLink> {
    let mut links = Vec::new();

    let Ok(sel) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&sel) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href == "#" || href.starts_with('#') {
            continue;
        }
        if href.starts_with("javascript:") || href.starts_with("data:") {
            continue;
        }

        let target_url = if href.starts_with("mailto:") || href.starts_with("tel:") {
            href.to_string()
        } else {
            match page_url.join(href) {
                Ok(absolute) => absolute.to_string(),
                Err(_) => continue,
            }
        };

        let anchor_text = element.text().collect::<String>().trim().to_string();
        let rel = element.value().attr("rel").unwrap_or("");
        let is_follow = !rel.to_lowercase().contains("nofollow");
        let kind = classify_link(&target_url, crawl_domain);

        links.push(NewLink {
            target_url,
            anchor_text,
            kind,
            is_follow,
            position: links.len() as u32,
        });
    }

    links
}

/// Case-folded tokens longer than three characters
fn keyword_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_CHARS)
}

/// Frequency-ranked keyword density over title + H1 + body text
///
/// The top entries are reported as percentages of all qualifying tokens,
/// rounded to two decimals. Ties are broken alphabetically so the result
/// is deterministic.
fn keyword_density(title: &Option<String>, h1: &Option<String>, text: &str) -> Vec<(String, f64)> {
    let combined = format!(
        "{} {} {}",
        title.as_deref().unwrap_or(""),
        h1.as_deref().unwrap_or(""),
        text
    );

    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut total = 0u32;
    for token in keyword_tokens(&combined) {
        *counts.entry(token).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(word, count)| {
            let pct = (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0;
            (word, pct)
        })
        .collect()
}

/// First distinct qualifying tokens of title + H1, in occurrence order
fn main_keywords(title: &Option<String>, h1: &Option<String>) -> Vec<String> {
    let combined = format!(
        "{} {}",
        title.as_deref().unwrap_or(""),
        h1.as_deref().unwrap_or("")
    );

    let mut seen = Vec::new();
    for token in keyword_tokens(&combined) {
        if !seen.contains(&token) {
            seen.push(token);
            if seen.len() == MAIN_KEYWORDS {
                break;
            }
        }
    }
    seen
}
