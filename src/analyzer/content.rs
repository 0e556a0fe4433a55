//! Content quality rules
//!
//! Heading structure, thin content, generic titles, orphan pages,
//! featured-snippet opportunities and keyword stuffing.

use crate::analyzer::{IssueDraft, IssueKind, Severity};
use crate::storage::Storage;
use crate::ScopeError;
use serde_json::json;
use std::collections::BTreeMap;

const THIN_CONTENT_WORDS: u32 = 300;
const VERY_THIN_CONTENT_WORDS: u32 = 100;
const KEYWORD_STUFFING_PERCENT: f64 = 3.0;

/// Title fragments that mark a page title as generic
const GENERIC_TITLE_PATTERNS: &[&str] = &[
    "home", "index", "welcome", "untitled", "about", "contact", "products", "services",
    "category", "new page",
];

/// Title keywords suggesting list/question content that can win a snippet
const SNIPPET_KEYWORDS: &[&str] = &["how", "what", "best", "top"];

/// Evaluates all content rules against the corpus
pub fn evaluate<S: Storage>(storage: &S, run_id: i64) -> Result<Vec<IssueDraft>, ScopeError> {
    let mut drafts = Vec::new();

    for view in storage.page_contents_for_run(run_id)? {
        if view.status_code != Some(200) {
            continue;
        }

        check_heading_structure(&view, &mut drafts);
        check_content_length(&view, &mut drafts);
        check_generic_title(&view, &mut drafts);
        check_snippet_potential(&view, &mut drafts);
        check_keyword_stuffing(&view, &mut drafts)?;
    }

    check_orphan_pages(storage, run_id, &mut drafts)?;
    check_images(storage, run_id, &mut drafts)?;

    Ok(drafts)
}

fn check_heading_structure(view: &crate::storage::PageContentView, drafts: &mut Vec<IssueDraft>) {
    let h1_missing = view.h1_count == 0 || view.h1.as_deref().map(str::is_empty).unwrap_or(true);
    if h1_missing {
        drafts.push(IssueDraft {
            kind: IssueKind::MissingH1,
            severity: Severity::High,
            page_id: Some(view.page_id),
            title: "Missing H1".to_string(),
            description: format!("Page {} has no H1", view.url),
            recommendation: "Add a single descriptive H1 element".to_string(),
            data: Some(json!({ "url": view.url })),
        });
    } else if view.h1_count > 1 {
        drafts.push(IssueDraft {
            kind: IssueKind::MultipleH1,
            severity: Severity::Medium,
            page_id: Some(view.page_id),
            title: "Multiple H1".to_string(),
            description: format!("Page {} has {} H1 elements", view.url, view.h1_count),
            recommendation: "Use exactly one H1 per page".to_string(),
            data: Some(json!({ "url": view.url, "h1_count": view.h1_count })),
        });
    }
}

fn check_content_length(view: &crate::storage::PageContentView, drafts: &mut Vec<IssueDraft>) {
    if view.word_count >= THIN_CONTENT_WORDS {
        return;
    }

    let severity = if view.word_count < VERY_THIN_CONTENT_WORDS {
        Severity::High
    } else {
        Severity::Medium
    };
    drafts.push(IssueDraft {
        kind: IssueKind::ShortContent,
        severity,
        page_id: Some(view.page_id),
        title: "Thin Content".to_string(),
        description: format!("Page {} has only {} words", view.url, view.word_count),
        recommendation: "Expand the content with relevant, useful information".to_string(),
        data: Some(json!({ "url": view.url, "word_count": view.word_count })),
    });
}

fn check_generic_title(view: &crate::storage::PageContentView, drafts: &mut Vec<IssueDraft>) {
    let Some(title) = view.title.as_deref().filter(|t| !t.is_empty()) else {
        return;
    };

    let lowered = title.to_lowercase();
    if GENERIC_TITLE_PATTERNS.iter().any(|p| lowered.contains(p)) {
        drafts.push(IssueDraft {
            kind: IssueKind::GenericTitle,
            severity: Severity::Medium,
            page_id: Some(view.page_id),
            title: "Generic Title".to_string(),
            description: format!("Page {} has a generic title: {}", view.url, title),
            recommendation: "Write a more specific, descriptive title".to_string(),
            data: Some(json!({ "url": view.url, "title": title })),
        });
    }
}

fn check_snippet_potential(view: &crate::storage::PageContentView, drafts: &mut Vec<IssueDraft>) {
    let Some(title) = view.title.as_deref() else {
        return;
    };

    if contains_any_word(&title.to_lowercase(), SNIPPET_KEYWORDS) {
        drafts.push(IssueDraft {
            kind: IssueKind::FeaturedSnippetOpportunity,
            severity: Severity::Medium,
            page_id: Some(view.page_id),
            title: "Featured Snippet Opportunity".to_string(),
            description: format!("Page {} could be formatted to win a featured snippet", view.url),
            recommendation: "Structure the content as lists, tables or direct answers".to_string(),
            data: Some(json!({ "url": view.url })),
        });
    }
}

fn check_keyword_stuffing(
    view: &crate::storage::PageContentView,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    // BTreeMap keeps the per-keyword iteration order deterministic
    let density: BTreeMap<String, f64> = match serde_json::from_str(&view.keyword_density) {
        Ok(map) => map,
        Err(_) => return Ok(()),
    };

    for (keyword, percent) in density {
        if percent > KEYWORD_STUFFING_PERCENT {
            drafts.push(IssueDraft {
                kind: IssueKind::KeywordStuffing,
                severity: Severity::Medium,
                page_id: Some(view.page_id),
                title: "Possible Keyword Stuffing".to_string(),
                description: format!(
                    "Page {} has a density of {}% for '{}'",
                    view.url, percent, keyword
                ),
                recommendation: "Reduce the keyword density and vary with synonyms".to_string(),
                data: Some(json!({ "url": view.url, "keyword": keyword, "density": percent })),
            });
        }
    }

    Ok(())
}

fn check_orphan_pages<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for (page_id, url) in storage.orphan_pages(run_id)? {
        drafts.push(IssueDraft {
            kind: IssueKind::OrphanPage,
            severity: Severity::Medium,
            page_id: Some(page_id),
            title: "Orphan Page".to_string(),
            description: format!("Page {} has no internal links pointing to it", url),
            recommendation: "Add relevant internal links to this page".to_string(),
            data: Some(json!({ "url": url })),
        });
    }

    Ok(())
}

fn check_images<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for (page_id, url, count) in storage.pages_with_missing_alt(run_id)? {
        drafts.push(IssueDraft {
            kind: IssueKind::ImagesWithoutAlt,
            severity: Severity::Medium,
            page_id: Some(page_id),
            title: "Images Without Alt Text".to_string(),
            description: format!("Page {} has {} images without alternative text", url, count),
            recommendation: "Add a descriptive alt attribute to every image".to_string(),
            data: Some(json!({ "url": url, "count": count })),
        });
    }

    Ok(())
}

/// Word-boundary match: true when any keyword appears as a whole token
fn contains_any_word(text: &str, keywords: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| keywords.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewImage, NewPage, NewPageContent, NewRun, SqliteStorage, Storage};

    fn seeded_storage() -> (SqliteStorage, i64) {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let run_id = storage
            .create_run(&NewRun {
                url: "https://example.com/".to_string(),
                domain: "example.com".to_string(),
                max_pages: 50,
                respect_robots: true,
                include_external: false,
            })
            .unwrap();
        (storage, run_id)
    }

    fn insert_page_with_content(
        storage: &mut SqliteStorage,
        run_id: i64,
        url: &str,
        content: NewPageContent,
    ) -> i64 {
        let page_id = storage
            .insert_page(
                run_id,
                &NewPage {
                    url: url.to_string(),
                    status_code: Some(200),
                    content_type: Some("text/html".to_string()),
                    page_size: Some(2048),
                    load_time_ms: Some(100),
                    depth: 0,
                    redirect_url: None,
                },
            )
            .unwrap();
        storage.insert_page_content(page_id, &content).unwrap();
        page_id
    }

    fn healthy_content(title: &str) -> NewPageContent {
        NewPageContent {
            title: Some(title.to_string()),
            title_length: title.chars().count() as u32,
            meta_description: Some("desc".to_string()),
            meta_description_length: 130,
            h1: Some("Heading".to_string()),
            h1_count: 1,
            word_count: 500,
            keyword_density: "{}".to_string(),
            main_keywords: "[]".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_h1() {
        let (mut storage, run_id) = seeded_storage();
        let mut content = healthy_content("Regular specific descriptive heading");
        content.h1 = None;
        content.h1_count = 0;
        insert_page_with_content(&mut storage, run_id, "https://example.com/x", content);

        let drafts = evaluate(&storage, run_id).unwrap();
        assert!(drafts.iter().any(|d| d.kind == IssueKind::MissingH1));
    }

    #[test]
    fn test_multiple_h1() {
        let (mut storage, run_id) = seeded_storage();
        let mut content = healthy_content("Regular specific descriptive heading");
        content.h1_count = 3;
        insert_page_with_content(&mut storage, run_id, "https://example.com/x", content);

        let drafts = evaluate(&storage, run_id).unwrap();
        let multi: Vec<_> = drafts
            .iter()
            .filter(|d| d.kind == IssueKind::MultipleH1)
            .collect();
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].data.as_ref().unwrap()["h1_count"], 3);
    }

    #[test]
    fn test_thin_content_severity() {
        let (mut storage, run_id) = seeded_storage();

        let mut thin = healthy_content("Somewhat thin but not terrible piece");
        thin.word_count = 150;
        insert_page_with_content(&mut storage, run_id, "https://example.com/thin", thin);

        let mut very_thin = healthy_content("Nearly empty placeholder article text");
        very_thin.word_count = 40;
        insert_page_with_content(&mut storage, run_id, "https://example.com/very-thin", very_thin);

        let drafts = evaluate(&storage, run_id).unwrap();
        let short: Vec<_> = drafts
            .iter()
            .filter(|d| d.kind == IssueKind::ShortContent)
            .collect();
        assert_eq!(short.len(), 2);
        // Views are ordered by URL: /thin then /very-thin
        assert_eq!(short[0].severity, Severity::Medium);
        assert_eq!(short[1].severity, Severity::High);
    }

    #[test]
    fn test_generic_title_detected() {
        let (mut storage, run_id) = seeded_storage();
        insert_page_with_content(
            &mut storage,
            run_id,
            "https://example.com/",
            healthy_content("Welcome to our homepage friends"),
        );

        let drafts = evaluate(&storage, run_id).unwrap();
        assert!(drafts.iter().any(|d| d.kind == IssueKind::GenericTitle));
    }

    #[test]
    fn test_snippet_keyword_matches_whole_words_only() {
        assert!(contains_any_word("how to bake bread", SNIPPET_KEYWORDS));
        assert!(contains_any_word("the best laptops ranked", SNIPPET_KEYWORDS));
        // "show" contains "how" as a substring but not as a token
        assert!(!contains_any_word("fashion show highlights", SNIPPET_KEYWORDS));
    }

    #[test]
    fn test_keyword_stuffing() {
        let (mut storage, run_id) = seeded_storage();
        let mut content = healthy_content("A specific enough descriptive title");
        content.keyword_density = r#"{"widgets": 5.2, "other": 1.0}"#.to_string();
        insert_page_with_content(&mut storage, run_id, "https://example.com/w", content);

        let drafts = evaluate(&storage, run_id).unwrap();
        let stuffing: Vec<_> = drafts
            .iter()
            .filter(|d| d.kind == IssueKind::KeywordStuffing)
            .collect();
        assert_eq!(stuffing.len(), 1);
        assert_eq!(stuffing[0].data.as_ref().unwrap()["keyword"], "widgets");
    }

    #[test]
    fn test_images_without_alt() {
        let (mut storage, run_id) = seeded_storage();
        let page_id = insert_page_with_content(
            &mut storage,
            run_id,
            "https://example.com/gallery",
            healthy_content("Photo gallery of assorted things"),
        );

        storage
            .insert_image(
                page_id,
                &NewImage {
                    src: "/a.jpg".to_string(),
                    alt: None,
                    title: None,
                    is_lazy: false,
                },
            )
            .unwrap();
        storage
            .insert_image(
                page_id,
                &NewImage {
                    src: "/b.jpg".to_string(),
                    alt: Some("described".to_string()),
                    title: None,
                    is_lazy: true,
                },
            )
            .unwrap();

        let drafts = evaluate(&storage, run_id).unwrap();
        let alt: Vec<_> = drafts
            .iter()
            .filter(|d| d.kind == IssueKind::ImagesWithoutAlt)
            .collect();
        assert_eq!(alt.len(), 1);
        assert_eq!(alt[0].data.as_ref().unwrap()["count"], 1);
    }
}
