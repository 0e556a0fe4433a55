//! Topic clustering
//!
//! Pages are grouped by the first content-length-filtered token of their
//! lowercased title. Clusters with a single page are discarded; the
//! opportunity level of a surviving cluster grows with its size.

use crate::analyzer::OpportunityLevel;
use crate::storage::{NewCluster, PageContentView};
use std::collections::BTreeMap;

const MIN_TOKEN_CHARS: usize = 4;

/// Builds topic clusters from the crawled corpus
///
/// Output is sorted by cluster name so repeated passes over an unchanged
/// corpus produce identical rows.
pub fn build_clusters(pages: &[PageContentView]) -> Vec<NewCluster> {
    let mut groups: BTreeMap<String, u32> = BTreeMap::new();

    for page in pages {
        if page.status_code != Some(200) {
            continue;
        }
        let Some(title) = page.title.as_deref() else {
            continue;
        };

        let Some(topic) = first_topic_token(title) else {
            continue;
        };
        *groups.entry(topic).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| NewCluster {
            main_topic: capitalize(&name),
            name,
            page_count: count,
            opportunity: OpportunityLevel::from_page_count(count as usize),
        })
        .collect()
}

/// First lowercased title token longer than three characters
fn first_topic_token(title: &str) -> Option<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .find(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(|token| token.to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str) -> PageContentView {
        PageContentView {
            page_id: 0,
            url: "https://example.com/".to_string(),
            status_code: Some(200),
            load_time_ms: None,
            page_size: None,
            redirect_url: None,
            canonical_url: None,
            robots_meta: None,
            title: Some(title.to_string()),
            title_length: title.chars().count() as u32,
            meta_description: None,
            meta_description_length: 0,
            h1: None,
            h1_count: 0,
            h2_count: 0,
            h3_count: 0,
            h4_count: 0,
            h5_count: 0,
            h6_count: 0,
            word_count: 0,
            internal_links_count: 0,
            external_links_count: 0,
            image_count: 0,
            images_without_alt: 0,
            keyword_density: "{}".to_string(),
            main_keywords: "[]".to_string(),
            has_structured_data: false,
        }
    }

    #[test]
    fn test_first_topic_token_skips_short_words() {
        assert_eq!(
            first_topic_token("The best coffee makers"),
            Some("best".to_string())
        );
        assert_eq!(first_topic_token("a b c"), None);
    }

    #[test]
    fn test_singleton_clusters_discarded() {
        let pages = vec![page("Coffee brewing basics"), page("Tea ceremonies explained")];
        let clusters = build_clusters(&pages);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_cluster_built_from_shared_topic() {
        let pages = vec![
            page("Coffee brewing basics"),
            page("Coffee grinder reviews"),
            page("Unrelated article here"),
        ];
        let clusters = build_clusters(&pages);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "coffee");
        assert_eq!(clusters[0].main_topic, "Coffee");
        assert_eq!(clusters[0].page_count, 2);
        assert_eq!(clusters[0].opportunity, OpportunityLevel::Low);
    }

    #[test]
    fn test_opportunity_scales_with_size() {
        let pages: Vec<_> = (0..12).map(|i| page(&format!("Coffee article {}", i))).collect();
        let clusters = build_clusters(&pages);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].opportunity, OpportunityLevel::High);
    }

    #[test]
    fn test_non_200_pages_excluded() {
        let mut broken = page("Coffee page that failed");
        broken.status_code = Some(500);
        let pages = vec![page("Coffee brewing basics"), broken];
        assert!(build_clusters(&pages).is_empty());
    }

    #[test]
    fn test_deterministic_ordering() {
        let pages = vec![
            page("Zebra facts one"),
            page("Zebra facts two"),
            page("Apple pie recipe"),
            page("Apple tart recipe"),
        ];
        let clusters = build_clusters(&pages);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].name, "apple");
        assert_eq!(clusters[1].name, "zebra");
    }
}
