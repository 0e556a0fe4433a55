//! Storage trait and error types

use crate::analyzer::{Category, Severity};
use crate::storage::{
    BrokenLink, ClusterRecord, IssueRecord, LinkRecord, LogLevel, LogRecord, NewCluster, NewImage,
    NewIssue, NewLink, NewPage, NewPageContent, NewRobotsReport, NewRun, NewSitemapReport,
    PageContentView, PageRecord, RunRecord, RunStatus,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Defines every database operation needed by the crawl engine, the rule
/// catalog and the report queries.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a run in `pending` state, returning its id
    fn create_run(&mut self, run: &NewRun) -> StorageResult<i64>;

    /// Gets a run by id
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Finds the most recent `pending` or `running` run for a domain
    fn find_active_run(&self, domain: &str) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as started (status `running`, start timestamp set)
    fn mark_run_started(&mut self, run_id: i64) -> StorageResult<()>;

    /// Updates run status and progress; progress never decreases
    fn update_run_progress(
        &mut self,
        run_id: i64,
        status: RunStatus,
        progress: f64,
    ) -> StorageResult<()>;

    /// Finishes a run with a terminal status and finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a fetched page, returning its id
    ///
    /// The (run, normalized URL) pair is unique; inserting a duplicate is
    /// a constraint error, not an upsert.
    fn insert_page(&mut self, run_id: i64, page: &NewPage) -> StorageResult<i64>;

    /// Updates robots/canonical metadata discovered during extraction
    fn update_page_meta(
        &mut self,
        page_id: i64,
        robots_meta: Option<&str>,
        is_indexable: bool,
        canonical_url: Option<&str>,
    ) -> StorageResult<()>;

    /// Inserts the extracted content profile for a page
    fn insert_page_content(&mut self, page_id: i64, content: &NewPageContent) -> StorageResult<()>;

    /// Inserts an outbound link
    fn insert_link(&mut self, source_page_id: i64, link: &NewLink) -> StorageResult<()>;

    /// Inserts an image
    fn insert_image(&mut self, page_id: i64, image: &NewImage) -> StorageResult<()>;

    /// All pages of a run, in insertion order
    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// A page looked up by its normalized URL
    fn page_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Number of pages persisted for a run
    fn count_pages(&self, run_id: i64) -> StorageResult<u64>;

    /// Joined page + content rows for a run, ordered by URL
    fn page_contents_for_run(&self, run_id: i64) -> StorageResult<Vec<PageContentView>>;

    /// Outbound links of one page, ordered by position
    fn links_for_page(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>>;

    // ===== Rule Read-back Queries =====

    /// Non-empty titles appearing on more than one page: (title, count)
    fn duplicate_titles(&self, run_id: i64) -> StorageResult<Vec<(String, u32)>>;

    /// Non-empty meta descriptions appearing on more than one page
    fn duplicate_meta_descriptions(&self, run_id: i64) -> StorageResult<Vec<(String, u32)>>;

    /// Internal links whose target page is missing or returned >= 400
    fn broken_internal_links(&self, run_id: i64) -> StorageResult<Vec<BrokenLink>>;

    /// 200 pages with zero inbound internal links from other pages
    fn orphan_pages(&self, run_id: i64) -> StorageResult<Vec<(i64, String)>>;

    /// Pages with alt-less images: (page_id, url, missing count)
    fn pages_with_missing_alt(&self, run_id: i64) -> StorageResult<Vec<(i64, String, u32)>>;

    /// Internal link targets whose page carries a noindex robots meta
    fn noindex_linked_targets(&self, run_id: i64) -> StorageResult<Vec<String>>;

    /// All URLs collected from the run's sitemap documents
    fn sitemap_urls(&self, run_id: i64) -> StorageResult<Vec<String>>;

    // ===== Issues and Clusters =====

    /// Deletes every issue of a run (start of a scoring pass)
    fn clear_issues(&mut self, run_id: i64) -> StorageResult<()>;

    /// Inserts a scored issue
    fn insert_issue(&mut self, run_id: i64, issue: &NewIssue) -> StorageResult<i64>;

    /// Recomputes every stored priority score from its impact/effort pair
    fn normalize_priorities(&mut self, run_id: i64) -> StorageResult<()>;

    /// Issues of a run ranked by priority (descending)
    fn issues_for_run(&self, run_id: i64) -> StorageResult<Vec<IssueRecord>>;

    /// Issue counts grouped by severity
    fn issue_counts_by_severity(&self, run_id: i64) -> StorageResult<Vec<(Severity, u64)>>;

    /// Issue counts grouped by category
    fn issue_counts_by_category(&self, run_id: i64) -> StorageResult<Vec<(Category, u64)>>;

    /// Deletes every cluster of a run
    fn clear_clusters(&mut self, run_id: i64) -> StorageResult<()>;

    /// Inserts a content cluster
    fn insert_cluster(&mut self, run_id: i64, cluster: &NewCluster) -> StorageResult<()>;

    /// Clusters of a run, ordered by page count (descending)
    fn clusters_for_run(&self, run_id: i64) -> StorageResult<Vec<ClusterRecord>>;

    // ===== Politeness Reports =====

    /// Records the robots.txt resolution outcome
    fn insert_robots_report(&mut self, run_id: i64, report: &NewRobotsReport) -> StorageResult<()>;

    /// Records one fetched sitemap document
    fn insert_sitemap_report(
        &mut self,
        run_id: i64,
        report: &NewSitemapReport,
    ) -> StorageResult<()>;

    // ===== Log Sink =====

    /// Appends a step event to the run log
    fn add_log(
        &mut self,
        run_id: i64,
        step: &str,
        level: LogLevel,
        message: &str,
    ) -> StorageResult<()>;

    /// Latest `limit` log entries, newest first
    fn recent_logs(&self, run_id: i64, limit: u32) -> StorageResult<Vec<LogRecord>>;

    /// The most recent error-level log entry, if any
    fn last_error_log(&self, run_id: i64) -> StorageResult<Option<LogRecord>>;

    // ===== Report Queries =====

    /// Page counts grouped by HTTP status code
    fn status_code_distribution(&self, run_id: i64) -> StorageResult<Vec<(u16, u64)>>;
}
