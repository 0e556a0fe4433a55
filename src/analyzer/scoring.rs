//! Impact, effort and priority computation
//!
//! Scoring is a pure function of (severity, category, kind): re-running it
//! against an unchanged corpus yields identical scores.

use crate::analyzer::{Category, IssueDraft, Severity};
use crate::storage::NewIssue;

/// Impact score: severity base weighted by the category multiplier
pub fn impact_score(severity: Severity, category: Category) -> u32 {
    (severity.base_score() as f64 * category.multiplier()).round() as u32
}

/// Priority score: impact dominates, low effort raises the rank
pub fn priority_score(impact: u32, effort: u32) -> f64 {
    impact as f64 * 0.7 + (100 - effort) as f64 * 0.3
}

/// Converts a rule draft into a fully scored issue row
pub fn score(draft: IssueDraft) -> NewIssue {
    let category = draft.kind.category();
    let impact = impact_score(draft.severity, category);
    let effort = draft.kind.effort();

    NewIssue {
        page_id: draft.page_id,
        kind: draft.kind,
        category,
        severity: draft.severity,
        title: draft.title,
        description: draft.description,
        recommendation: draft.recommendation,
        impact_score: impact,
        effort_score: effort,
        priority_score: priority_score(impact, effort),
        data: draft.data.map(|v| v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::IssueKind;

    #[test]
    fn test_impact_score_tables() {
        assert_eq!(impact_score(Severity::Critical, Category::Technical), 90);
        assert_eq!(impact_score(Severity::High, Category::Technical), 75);
        assert_eq!(impact_score(Severity::High, Category::Performance), 68); // 75 * 0.9 = 67.5 rounds up
        assert_eq!(impact_score(Severity::Medium, Category::Content), 40);
        assert_eq!(impact_score(Severity::Medium, Category::Accessibility), 35);
        assert_eq!(impact_score(Severity::Low, Category::Ai), 15);
    }

    #[test]
    fn test_priority_formula() {
        assert_eq!(priority_score(90, 20), 90.0 * 0.7 + 80.0 * 0.3);
        assert_eq!(priority_score(50, 50), 50.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let draft = IssueDraft {
            kind: IssueKind::SlowPage,
            severity: Severity::High,
            page_id: Some(7),
            title: "Slow Page".to_string(),
            description: "x".to_string(),
            recommendation: "y".to_string(),
            data: None,
        };

        let a = score(draft.clone());
        let b = score(draft);
        assert_eq!(a.impact_score, b.impact_score);
        assert_eq!(a.effort_score, b.effort_score);
        assert_eq!(a.priority_score, b.priority_score);
        assert_eq!(
            a.priority_score,
            priority_score(a.impact_score, a.effort_score)
        );
    }
}
