//! Technical and performance rules
//!
//! Covers markup/protocol problems (titles, meta descriptions, status
//! codes, broken links, canonicals, robots/sitemap coverage) plus the
//! performance rules for slow and heavy pages.

use crate::analyzer::{IssueDraft, IssueKind, Severity};
use crate::storage::Storage;
use crate::url::normalize_url;
use crate::ScopeError;
use serde_json::json;

const SLOW_PAGE_MS: i64 = 3000;
const VERY_SLOW_PAGE_MS: i64 = 5000;
const HEAVY_PAGE_BYTES: i64 = 1024 * 1024;
const VERY_HEAVY_PAGE_BYTES: i64 = 2 * 1024 * 1024;

/// Evaluates all technical and performance rules against the corpus
pub fn evaluate<S: Storage>(storage: &S, run_id: i64) -> Result<Vec<IssueDraft>, ScopeError> {
    let mut drafts = Vec::new();

    check_duplicate_titles(storage, run_id, &mut drafts)?;
    check_titles_and_descriptions(storage, run_id, &mut drafts)?;
    check_status_codes(storage, run_id, &mut drafts)?;
    check_performance(storage, run_id, &mut drafts)?;
    check_broken_internal_links(storage, run_id, &mut drafts)?;
    check_canonicals(storage, run_id, &mut drafts)?;
    check_robots_compliance(storage, run_id, &mut drafts)?;
    check_sitemap_compliance(storage, run_id, &mut drafts)?;

    Ok(drafts)
}

fn check_duplicate_titles<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for (title, count) in storage.duplicate_titles(run_id)? {
        drafts.push(IssueDraft {
            kind: IssueKind::DuplicateTitles,
            severity: Severity::High,
            page_id: None,
            title: "Duplicate Titles".to_string(),
            description: format!("The title '{}' appears on {} pages", title, count),
            recommendation: "Each page should have a unique, descriptive title".to_string(),
            data: Some(json!({ "title": title, "count": count })),
        });
    }

    for (meta, count) in storage.duplicate_meta_descriptions(run_id)? {
        let preview: String = meta.chars().take(100).collect();
        drafts.push(IssueDraft {
            kind: IssueKind::DuplicateMetaDescriptions,
            severity: Severity::Medium,
            page_id: None,
            title: "Duplicate Meta Descriptions".to_string(),
            description: format!("The same meta description appears on {} pages", count),
            recommendation: "Each page should have a unique meta description".to_string(),
            data: Some(json!({ "meta_description": preview, "count": count })),
        });
    }

    Ok(())
}

fn check_titles_and_descriptions<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for view in storage.page_contents_for_run(run_id)? {
        if view.status_code != Some(200) {
            continue;
        }

        let title_missing = view.title.as_deref().map(str::is_empty).unwrap_or(true);
        if title_missing {
            drafts.push(IssueDraft {
                kind: IssueKind::MissingTitle,
                severity: Severity::Critical,
                page_id: Some(view.page_id),
                title: "Missing Title".to_string(),
                description: format!("Page {} has no title", view.url),
                recommendation: "Add a <title> element with a unique description of the page"
                    .to_string(),
                data: Some(json!({ "url": view.url })),
            });
        } else if view.title_length < 30 || view.title_length > 60 {
            let severity = if view.title_length < 20 || view.title_length > 70 {
                Severity::High
            } else {
                Severity::Medium
            };
            let problem = if view.title_length < 30 {
                "Too Short"
            } else {
                "Too Long"
            };
            drafts.push(IssueDraft {
                kind: IssueKind::TitleLength,
                severity,
                page_id: Some(view.page_id),
                title: format!("Title {}", problem),
                description: format!(
                    "Page {} has a title of {} characters",
                    view.url, view.title_length
                ),
                recommendation:
                    "Titles should be 30-60 characters for best display in search results"
                        .to_string(),
                data: Some(json!({ "url": view.url, "title_length": view.title_length })),
            });
        }

        let meta_missing = view
            .meta_description
            .as_deref()
            .map(str::is_empty)
            .unwrap_or(true);
        if meta_missing {
            drafts.push(IssueDraft {
                kind: IssueKind::MissingMetaDescription,
                severity: Severity::Medium,
                page_id: Some(view.page_id),
                title: "Missing Meta Description".to_string(),
                description: format!("Page {} has no meta description", view.url),
                recommendation: "Add a meta description of 120-160 characters".to_string(),
                data: Some(json!({ "url": view.url })),
            });
        } else if view.meta_description_length < 120 || view.meta_description_length > 160 {
            let severity = if view.meta_description_length < 50 || view.meta_description_length > 200
            {
                Severity::Medium
            } else {
                Severity::Low
            };
            let problem = if view.meta_description_length < 120 {
                "Too Short"
            } else {
                "Too Long"
            };
            drafts.push(IssueDraft {
                kind: IssueKind::MetaDescriptionLength,
                severity,
                page_id: Some(view.page_id),
                title: format!("Meta Description {}", problem),
                description: format!(
                    "Page {} has a meta description of {} characters",
                    view.url, view.meta_description_length
                ),
                recommendation: "Meta descriptions should be 120-160 characters".to_string(),
                data: Some(json!({ "url": view.url, "length": view.meta_description_length })),
            });
        }
    }

    Ok(())
}

fn check_status_codes<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for page in storage.pages_for_run(run_id)? {
        match page.status_code {
            Some(404) => drafts.push(IssueDraft {
                kind: IssueKind::Page404,
                severity: Severity::High,
                page_id: Some(page.id),
                title: "Page Not Found (404)".to_string(),
                description: format!("Page {} returns 404", page.url),
                recommendation: "Fix the link or add a 301 redirect".to_string(),
                data: Some(json!({ "url": page.url })),
            }),
            Some(code) if code >= 500 => drafts.push(IssueDraft {
                kind: IssueKind::ServerError,
                severity: Severity::Critical,
                page_id: Some(page.id),
                title: "Server Error".to_string(),
                description: format!("Page {} returns a server error ({})", page.url, code),
                recommendation: "Investigate and fix the server-side failure".to_string(),
                data: Some(json!({ "url": page.url, "status_code": code })),
            }),
            Some(301) | Some(302) | Some(307) | Some(308) => {
                if let Some(target) = &page.redirect_url {
                    drafts.push(IssueDraft {
                        kind: IssueKind::RedirectChain,
                        severity: Severity::Low,
                        page_id: Some(page.id),
                        title: "Redirect".to_string(),
                        description: format!("Page {} redirects to {}", page.url, target),
                        recommendation:
                            "Check whether the redirect is necessary and avoid redirect chains"
                                .to_string(),
                        data: Some(json!({ "url": page.url, "redirect_url": target })),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn check_performance<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for page in storage.pages_for_run(run_id)? {
        if page.status_code != Some(200) {
            continue;
        }

        if let Some(load_time) = page.load_time_ms {
            if load_time > SLOW_PAGE_MS {
                let severity = if load_time > VERY_SLOW_PAGE_MS {
                    Severity::High
                } else {
                    Severity::Medium
                };
                drafts.push(IssueDraft {
                    kind: IssueKind::SlowPage,
                    severity,
                    page_id: Some(page.id),
                    title: "Slow Page".to_string(),
                    description: format!("Page {} loads in {}ms", page.url, load_time),
                    recommendation: "Optimize images, minify CSS/JS, use caching and a CDN"
                        .to_string(),
                    data: Some(json!({ "url": page.url, "load_time_ms": load_time })),
                });
            }
        }

        if let Some(size) = page.page_size {
            if size > HEAVY_PAGE_BYTES {
                let severity = if size > VERY_HEAVY_PAGE_BYTES {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                let size_mb = (size as f64 / HEAVY_PAGE_BYTES as f64 * 100.0).round() / 100.0;
                drafts.push(IssueDraft {
                    kind: IssueKind::HeavyPage,
                    severity,
                    page_id: Some(page.id),
                    title: "Heavy Page".to_string(),
                    description: format!("Page {} weighs {}MB", page.url, size_mb),
                    recommendation:
                        "Optimize images, compress assets and remove unused resources".to_string(),
                    data: Some(json!({ "url": page.url, "size_mb": size_mb })),
                });
            }
        }
    }

    Ok(())
}

fn check_broken_internal_links<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for broken in storage.broken_internal_links(run_id)? {
        drafts.push(IssueDraft {
            kind: IssueKind::BrokenInternalLink,
            severity: Severity::Medium,
            page_id: Some(broken.source_page_id),
            title: "Broken Internal Link".to_string(),
            description: format!(
                "Link from {} to {} is broken",
                broken.source_url, broken.target_url
            ),
            recommendation: "Fix the URL or remove the link".to_string(),
            data: Some(json!({
                "source_url": broken.source_url,
                "target_url": broken.target_url
            })),
        });
    }

    Ok(())
}

fn check_canonicals<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for view in storage.page_contents_for_run(run_id)? {
        if view.status_code != Some(200) {
            continue;
        }
        if view.url.contains('?') && view.canonical_url.is_none() {
            drafts.push(IssueDraft {
                kind: IssueKind::MissingCanonical,
                severity: Severity::Low,
                page_id: Some(view.page_id),
                title: "Missing Canonical".to_string(),
                description: format!("Parameterized page {} has no canonical URL", view.url),
                recommendation: "Add a canonical tag to avoid duplicate content".to_string(),
                data: Some(json!({ "url": view.url })),
            });
        }
    }

    Ok(())
}

fn check_robots_compliance<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for target in storage.noindex_linked_targets(run_id)? {
        drafts.push(IssueDraft {
            kind: IssueKind::BlockedButLinked,
            severity: Severity::Medium,
            page_id: None,
            title: "Noindex Page Receiving Links".to_string(),
            description: format!(
                "Page {} is marked noindex but receives internal links",
                target
            ),
            recommendation: "Remove links to noindex pages or allow indexing".to_string(),
            data: Some(json!({ "url": target })),
        });
    }

    Ok(())
}

fn check_sitemap_compliance<S: Storage>(
    storage: &S,
    run_id: i64,
    drafts: &mut Vec<IssueDraft>,
) -> Result<(), ScopeError> {
    for loc in storage.sitemap_urls(run_id)? {
        // Sitemap locs are raw; pages are stored under normalized URLs
        let Ok(normalized) = normalize_url(&loc) else {
            continue;
        };

        let crawled = storage.page_by_url(run_id, normalized.as_str())?;
        let errored = match &crawled {
            Some(page) => page.status_code.map(|c| c >= 400).unwrap_or(true),
            None => true,
        };

        if errored {
            drafts.push(IssueDraft {
                kind: IssueKind::SitemapErrorUrl,
                severity: Severity::Medium,
                page_id: crawled.map(|p| p.id),
                title: "Sitemap URL Error".to_string(),
                description: format!(
                    "URL {} is listed in the sitemap but was not crawled or returns an error",
                    loc
                ),
                recommendation: "Fix the URL or remove it from the sitemap".to_string(),
                data: Some(json!({ "url": loc })),
            });
        }
    }

    Ok(())
}
