//! Result queries and progress payloads
//!
//! Everything here is derived read-only from the persisted corpus,
//! computed on demand rather than cached.

use crate::analyzer::{Category, Severity};
use crate::storage::{
    ClusterRecord, IssueRecord, LinkRecord, LogRecord, PageContentView, PageRecord, RunRecord,
    RunStatus, Storage,
};
use crate::ScopeError;
use chrono::{DateTime, Utc};

/// Load-time histogram over successfully fetched pages
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceBuckets {
    /// Under 1 second
    pub fast: u64,
    /// 1 to 3 seconds
    pub moderate: u64,
    /// Over 3 seconds
    pub slow: u64,
}

/// Aggregate summary of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run: RunRecord,
    pub total_pages: u64,
    pub status_distribution: Vec<(u16, u64)>,
    pub performance: PerformanceBuckets,
    pub issues_by_severity: Vec<(Severity, u64)>,
    pub issues_by_category: Vec<(Category, u64)>,
    pub clusters: Vec<ClusterRecord>,
}

/// Technical and content detail for one page
#[derive(Debug, Clone)]
pub struct PageDetail {
    pub page: PageRecord,
    pub content: Option<PageContentView>,
    pub links: Vec<LinkRecord>,
}

/// Client-facing progress payload
#[derive(Debug, Clone)]
pub struct ProgressPayload {
    pub status: RunStatus,
    pub progress: f64,
    /// Naive linear estimate; None while timing data is incomplete
    pub eta_seconds: Option<i64>,
    /// Most recent error-level message for a failed run
    pub failure_reason: Option<String>,
    pub recent_logs: Vec<LogRecord>,
}

/// Builds the aggregate summary for a run
pub fn summary<S: Storage>(storage: &S, run_id: i64) -> Result<RunSummary, ScopeError> {
    let run = storage.get_run(run_id)?;
    let total_pages = storage.count_pages(run_id)?;
    let status_distribution = storage.status_code_distribution(run_id)?;

    let mut performance = PerformanceBuckets::default();
    for page in storage.pages_for_run(run_id)? {
        if page.status_code != Some(200) {
            continue;
        }
        let Some(load_time) = page.load_time_ms else {
            continue;
        };
        if load_time < 1000 {
            performance.fast += 1;
        } else if load_time <= 3000 {
            performance.moderate += 1;
        } else {
            performance.slow += 1;
        }
    }

    Ok(RunSummary {
        total_pages,
        status_distribution,
        performance,
        issues_by_severity: storage.issue_counts_by_severity(run_id)?,
        issues_by_category: storage.issue_counts_by_category(run_id)?,
        clusters: storage.clusters_for_run(run_id)?,
        run,
    })
}

/// The full issue list, ranked by priority
pub fn ranked_issues<S: Storage>(storage: &S, run_id: i64) -> Result<Vec<IssueRecord>, ScopeError> {
    Ok(storage.issues_for_run(run_id)?)
}

/// Per-page technical and content detail
pub fn page_detail<S: Storage>(
    storage: &S,
    run_id: i64,
    url: &str,
) -> Result<Option<PageDetail>, ScopeError> {
    let Some(page) = storage.page_by_url(run_id, url)? else {
        return Ok(None);
    };

    let content = storage
        .page_contents_for_run(run_id)?
        .into_iter()
        .find(|view| view.page_id == page.id);
    let links = storage.links_for_page(page.id)?;

    Ok(Some(PageDetail {
        page,
        content,
        links,
    }))
}

/// Builds the progress payload from run status and the latest log entries
pub fn progress<S: Storage>(
    storage: &S,
    run_id: i64,
    log_limit: u32,
) -> Result<ProgressPayload, ScopeError> {
    let run = storage.get_run(run_id)?;
    let recent_logs = storage.recent_logs(run_id, log_limit)?;

    let failure_reason = if run.status == RunStatus::Failed {
        storage.last_error_log(run_id)?.map(|log| log.message)
    } else {
        None
    };

    Ok(ProgressPayload {
        status: run.status,
        progress: run.progress,
        eta_seconds: estimate_eta(&run),
        failure_reason,
        recent_logs,
    })
}

/// Naive linear ETA: `elapsed / progress * 100 - elapsed`
///
/// Returns None when the run is not in flight, no progress has been made
/// yet, or the start timestamp is missing or unparsable.
fn estimate_eta(run: &RunRecord) -> Option<i64> {
    if run.status != RunStatus::Running || run.progress <= 0.0 {
        return None;
    }

    let started = DateTime::parse_from_rfc3339(run.started_at.as_deref()?).ok()?;
    let elapsed = (Utc::now() - started.with_timezone(&Utc)).num_seconds();
    if elapsed < 0 {
        return None;
    }

    let total = elapsed as f64 / run.progress * 100.0;
    Some((total - elapsed as f64).round() as i64)
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Analysis Summary ===\n");
    println!("Target: {}", summary.run.url);
    println!("Status: {}", summary.run.status.to_db_string());
    println!("Pages crawled: {}", summary.total_pages);
    println!();

    if !summary.status_distribution.is_empty() {
        println!("Status Codes:");
        for (code, count) in &summary.status_distribution {
            println!("  {}: {}", code, count);
        }
        println!();
    }

    println!("Load Times:");
    println!("  < 1s: {}", summary.performance.fast);
    println!("  1-3s: {}", summary.performance.moderate);
    println!("  > 3s: {}", summary.performance.slow);
    println!();

    if !summary.issues_by_severity.is_empty() {
        println!("Issues by Severity:");
        let mut by_severity = summary.issues_by_severity.clone();
        by_severity.sort_by(|a, b| b.0.cmp(&a.0));
        for (severity, count) in by_severity {
            println!("  {}: {}", severity.to_db_string(), count);
        }
        println!();
    }

    if !summary.issues_by_category.is_empty() {
        println!("Issues by Category:");
        for (category, count) in &summary.issues_by_category {
            println!("  {}: {}", category.to_db_string(), count);
        }
        println!();
    }

    if !summary.clusters.is_empty() {
        println!("Content Clusters:");
        for cluster in &summary.clusters {
            println!(
                "  {} ({} pages, {} opportunity)",
                cluster.main_topic,
                cluster.page_count,
                cluster.opportunity.to_db_string()
            );
        }
        println!();
    }
}

/// Prints the top ranked issues to stdout
pub fn print_issues(issues: &[IssueRecord], limit: usize) {
    if issues.is_empty() {
        println!("No issues found.");
        return;
    }

    println!("=== Top Issues (by priority) ===\n");
    for issue in issues.iter().take(limit) {
        println!(
            "[{:>5.1}] {} ({}/{})",
            issue.priority_score,
            issue.title,
            issue.category.to_db_string(),
            issue.severity.to_db_string()
        );
        println!("        {}", issue.description);
        println!("        Fix: {}", issue.recommendation);
    }
    if issues.len() > limit {
        println!("... and {} more", issues.len() - limit);
    }
}
