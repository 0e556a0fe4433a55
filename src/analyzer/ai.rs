//! AI / answer-engine readiness rules
//!
//! FAQ schema opportunities, structured-data coverage, a per-page E-E-A-T
//! heuristic and an AI answer-potential heuristic built from title/H1
//! signals.

use crate::analyzer::{IssueDraft, IssueKind, Severity};
use crate::storage::{PageContentView, Storage};
use crate::ScopeError;
use serde_json::json;

const LOW_EAT_THRESHOLD: u32 = 50;
const HIGH_AI_POTENTIAL_THRESHOLD: u32 = 70;

const QUESTION_WORDS: &[&str] = &["how", "what", "why", "when", "where", "which"];
const LIST_WORDS: &[&str] = &["best", "top", "list", "ranking", "versus", "vs", "comparison"];
const TUTORIAL_WORDS: &[&str] = &["tutorial", "guide", "step", "steps", "walkthrough"];
const DEFINITION_PHRASES: &[&str] = &["what is", "definition", "meaning of"];

/// Evaluates all AI-readiness rules against the corpus
pub fn evaluate<S: Storage>(storage: &S, run_id: i64) -> Result<Vec<IssueDraft>, ScopeError> {
    let mut drafts = Vec::new();

    for view in storage.page_contents_for_run(run_id)? {
        if view.status_code != Some(200) {
            continue;
        }

        check_faq_content(&view, &mut drafts);
        check_structured_data(&view, &mut drafts);
        check_eeat(&view, &mut drafts);
        check_ai_potential(&view, &mut drafts);
    }

    Ok(drafts)
}

fn title_and_h1(view: &PageContentView) -> String {
    format!(
        "{} {}",
        view.title.as_deref().unwrap_or(""),
        view.h1.as_deref().unwrap_or("")
    )
    .to_lowercase()
}

fn check_faq_content(view: &PageContentView, drafts: &mut Vec<IssueDraft>) {
    let text = title_and_h1(view);
    if text.contains("faq") || text.contains("question") {
        drafts.push(IssueDraft {
            kind: IssueKind::FaqSchemaOpportunity,
            severity: Severity::Medium,
            page_id: Some(view.page_id),
            title: "FAQ Schema Opportunity".to_string(),
            description: format!("Page {} has FAQ content without structured data", view.url),
            recommendation: "Add schema.org FAQPage markup for better answer-engine visibility"
                .to_string(),
            data: Some(json!({ "url": view.url })),
        });
    }
}

fn check_structured_data(view: &PageContentView, drafts: &mut Vec<IssueDraft>) {
    if !view.has_structured_data {
        drafts.push(IssueDraft {
            kind: IssueKind::MissingStructuredData,
            severity: Severity::Low,
            page_id: Some(view.page_id),
            title: "Missing Structured Data".to_string(),
            description: format!("Page {} has no structured data", view.url),
            recommendation: "Add appropriate schema.org markup (Article, Product, ...)".to_string(),
            data: Some(json!({ "url": view.url })),
        });
    }
}

/// E-E-A-T sub-scores, each capped at 25, summing to at most 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EeatScore {
    pub experience: u32,
    pub expertise: u32,
    pub authoritativeness: u32,
    pub trustworthiness: u32,
    pub total: u32,
}

/// Computes the E-E-A-T heuristic for a page
///
/// Experience grows with content depth, expertise with heading richness,
/// authoritativeness with outbound references, trustworthiness with basic
/// metadata hygiene.
pub fn eeat_score(view: &PageContentView) -> EeatScore {
    let mut experience = 10;
    let mut expertise = 10;
    let mut authoritativeness = 10;
    let mut trustworthiness = 10;

    if view.word_count > 500 {
        experience += 5;
    }
    if view.word_count > 1000 {
        experience += 5;
    }

    if view.h2_count > 0 {
        expertise += 3;
    }
    if view.h3_count > 0 {
        expertise += 2;
    }

    if view.external_links_count > 0 {
        authoritativeness += 5;
    }
    if view.external_links_count > 3 {
        authoritativeness += 5;
    }

    if view.title.as_deref().map(|t| !t.is_empty()).unwrap_or(false) {
        trustworthiness += 3;
    }
    if view
        .meta_description
        .as_deref()
        .map(|m| !m.is_empty())
        .unwrap_or(false)
    {
        trustworthiness += 2;
    }

    let experience = experience.min(25);
    let expertise = expertise.min(25);
    let authoritativeness = authoritativeness.min(25);
    let trustworthiness = trustworthiness.min(25);

    EeatScore {
        experience,
        expertise,
        authoritativeness,
        trustworthiness,
        total: (experience + expertise + authoritativeness + trustworthiness).min(100),
    }
}

fn check_eeat(view: &PageContentView, drafts: &mut Vec<IssueDraft>) {
    let score = eeat_score(view);
    if score.total < LOW_EAT_THRESHOLD {
        drafts.push(IssueDraft {
            kind: IssueKind::LowEatScore,
            severity: Severity::High,
            page_id: Some(view.page_id),
            title: "Low E-E-A-T Score".to_string(),
            description: format!(
                "Page {} has an E-E-A-T score of {}/100",
                view.url, score.total
            ),
            recommendation:
                "Strengthen experience, expertise, authority and trust signals on the page"
                    .to_string(),
            data: Some(json!({
                "url": view.url,
                "eat_score": score.total,
                "experience": score.experience,
                "expertise": score.expertise,
                "authoritativeness": score.authoritativeness,
                "trustworthiness": score.trustworthiness
            })),
        });
    }
}

/// AI answer-potential heuristic built from title/H1 content shape
pub fn ai_potential(view: &PageContentView) -> (u32, Vec<&'static str>) {
    let text = title_and_h1(view);
    let mut score = 0;
    let mut factors = Vec::new();

    if contains_any_word(&text, QUESTION_WORDS) {
        score += 25;
        factors.push("direct question");
    }

    if contains_any_word(&text, LIST_WORDS) {
        score += 20;
        factors.push("list or comparison content");
    }

    if view.word_count > 500 && view.word_count < 2000 {
        score += 15;
        factors.push("ideal length for answer extraction");
    }

    if contains_any_word(&text, TUTORIAL_WORDS) {
        score += 20;
        factors.push("tutorial or guide content");
    }

    if DEFINITION_PHRASES.iter().any(|p| text.contains(p)) {
        score += 20;
        factors.push("definition content");
    }

    (score, factors)
}

fn check_ai_potential(view: &PageContentView, drafts: &mut Vec<IssueDraft>) {
    let (score, factors) = ai_potential(view);
    if score > HIGH_AI_POTENTIAL_THRESHOLD {
        drafts.push(IssueDraft {
            kind: IssueKind::HighAiPotential,
            severity: Severity::Low,
            page_id: Some(view.page_id),
            title: "High AI Answer Potential".to_string(),
            description: format!(
                "Page {} is well shaped for answer-engine ranking",
                view.url
            ),
            recommendation: "Optimize for direct answers and add structured data".to_string(),
            data: Some(json!({ "url": view.url, "score": score, "factors": factors })),
        });
    }
}

fn contains_any_word(text: &str, keywords: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| keywords.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(title: &str, h1: &str, word_count: u32) -> PageContentView {
        PageContentView {
            page_id: 1,
            url: "https://example.com/p".to_string(),
            status_code: Some(200),
            load_time_ms: Some(100),
            page_size: Some(1000),
            redirect_url: None,
            canonical_url: None,
            robots_meta: None,
            title: Some(title.to_string()),
            title_length: title.chars().count() as u32,
            meta_description: Some("desc".to_string()),
            meta_description_length: 4,
            h1: Some(h1.to_string()),
            h1_count: 1,
            h2_count: 0,
            h3_count: 0,
            h4_count: 0,
            h5_count: 0,
            h6_count: 0,
            word_count,
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
    fn test_eeat_baseline() {
        let v = view("T", "H", 50);
        let score = eeat_score(&v);
        // Base 10 each, +3 title, +2 meta
        assert_eq!(score.experience, 10);
        assert_eq!(score.expertise, 10);
        assert_eq!(score.authoritativeness, 10);
        assert_eq!(score.trustworthiness, 15);
        assert_eq!(score.total, 45);
    }

    #[test]
    fn test_eeat_rich_page() {
        let mut v = view("T", "H", 1200);
        v.h2_count = 4;
        v.h3_count = 2;
        v.external_links_count = 5;
        let score = eeat_score(&v);
        assert_eq!(score.experience, 20);
        assert_eq!(score.expertise, 15);
        assert_eq!(score.authoritativeness, 20);
        assert_eq!(score.trustworthiness, 15);
        assert_eq!(score.total, 70);
    }

    #[test]
    fn test_eeat_subscores_capped() {
        let v = view("T", "H", 5000);
        let score = eeat_score(&v);
        assert!(score.experience <= 25);
        assert!(score.total <= 100);
    }

    #[test]
    fn test_ai_potential_question_and_guide() {
        let v = view("How to plant tomatoes", "A step by step guide", 800);
        let (score, factors) = ai_potential(&v);
        // question (25) + length (15) + tutorial (20)
        assert_eq!(score, 60);
        assert_eq!(factors.len(), 3);
    }

    #[test]
    fn test_ai_potential_crosses_threshold() {
        let v = view("What is the best compost", "Top ranking guide", 900);
        let (score, _) = ai_potential(&v);
        // question (25) + list (20) + length (15) + tutorial (20) + definition (20)
        assert!(score > HIGH_AI_POTENTIAL_THRESHOLD);
    }

    #[test]
    fn test_faq_detection() {
        let v = view("Shipping FAQ", "Frequently asked questions", 400);
        let mut drafts = Vec::new();
        check_faq_content(&v, &mut drafts);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, IssueKind::FaqSchemaOpportunity);
    }

    #[test]
    fn test_low_eeat_emits_issue() {
        let v = view("T", "H", 50);
        let mut drafts = Vec::new();
        check_eeat(&v, &mut drafts);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].severity, Severity::High);
        assert_eq!(drafts[0].data.as_ref().unwrap()["eat_score"], 45);
    }
}
