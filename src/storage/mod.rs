//! Storage module for persisting crawl and analysis data
//!
//! Handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run lifecycle (status, progress) tracking
//! - Append-only persistence of pages, content, links and images
//! - Bulk replacement of issues and clusters per scoring pass
//! - Read-back queries used by the rule catalog and reports

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::analyzer::{Category, IssueKind, OpportunityLevel, Severity};
use crate::url::LinkKind;

/// Lifecycle status of a crawl+analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Returns true while the run still occupies its domain slot
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Severity level of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Parameters for creating a run
#[derive(Debug, Clone)]
pub struct NewRun {
    pub url: String,
    pub domain: String,
    pub max_pages: u32,
    pub respect_robots: bool,
    pub include_external: bool,
}

/// A crawl+analysis run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub max_pages: u32,
    pub respect_robots: bool,
    pub include_external: bool,
    pub status: RunStatus,
    pub progress: f64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub created_at: String,
}

/// Parameters for inserting a fetched page
#[derive(Debug, Clone)]
pub struct NewPage {
    pub url: String,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub page_size: Option<i64>,
    pub load_time_ms: Option<i64>,
    pub depth: u32,
    pub redirect_url: Option<String>,
}

/// A fetched page row
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub run_id: i64,
    pub url: String,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub page_size: Option<i64>,
    pub load_time_ms: Option<i64>,
    pub depth: u32,
    pub redirect_url: Option<String>,
    pub canonical_url: Option<String>,
    pub robots_meta: Option<String>,
    pub is_indexable: bool,
    pub discovered_at: String,
}

impl PageRecord {
    /// Returns true for a successfully fetched HTML page
    pub fn is_ok_html(&self) -> bool {
        self.status_code == Some(200)
            && self
                .content_type
                .as_deref()
                .map(|ct| ct.contains("text/html"))
                .unwrap_or(false)
    }
}

/// Parameters for inserting extracted page content
#[derive(Debug, Clone, Default)]
pub struct NewPageContent {
    pub title: Option<String>,
    pub title_length: u32,
    pub meta_description: Option<String>,
    pub meta_description_length: u32,
    pub h1: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub word_count: u32,
    pub internal_links_count: u32,
    pub external_links_count: u32,
    pub image_count: u32,
    pub images_without_alt: u32,
    /// JSON object of keyword -> density percentage
    pub keyword_density: String,
    /// JSON array of primary keywords
    pub main_keywords: String,
    pub has_structured_data: bool,
}

/// Joined page + content row used by rules and reports
#[derive(Debug, Clone)]
pub struct PageContentView {
    pub page_id: i64,
    pub url: String,
    pub status_code: Option<u16>,
    pub load_time_ms: Option<i64>,
    pub page_size: Option<i64>,
    pub redirect_url: Option<String>,
    pub canonical_url: Option<String>,
    pub robots_meta: Option<String>,
    pub title: Option<String>,
    pub title_length: u32,
    pub meta_description: Option<String>,
    pub meta_description_length: u32,
    pub h1: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub word_count: u32,
    pub internal_links_count: u32,
    pub external_links_count: u32,
    pub image_count: u32,
    pub images_without_alt: u32,
    pub keyword_density: String,
    pub main_keywords: String,
    pub has_structured_data: bool,
}

/// Parameters for inserting an outbound link
#[derive(Debug, Clone)]
pub struct NewLink {
    pub target_url: String,
    pub anchor_text: String,
    pub kind: LinkKind,
    pub is_follow: bool,
    pub position: u32,
}

/// An outbound link row
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub id: i64,
    pub source_page_id: i64,
    pub target_url: String,
    pub anchor_text: String,
    pub kind: LinkKind,
    pub is_follow: bool,
    pub position: u32,
}

/// Parameters for inserting an image
#[derive(Debug, Clone)]
pub struct NewImage {
    pub src: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub is_lazy: bool,
}

/// Parameters for inserting a scored issue
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub page_id: Option<i64>,
    pub kind: IssueKind,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub impact_score: u32,
    pub effort_score: u32,
    pub priority_score: f64,
    pub data: Option<String>,
}

/// A scored issue row
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub id: i64,
    pub run_id: i64,
    pub page_id: Option<i64>,
    pub kind: IssueKind,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub impact_score: u32,
    pub effort_score: u32,
    pub priority_score: f64,
    pub data: Option<String>,
}

/// Parameters for inserting a content cluster
#[derive(Debug, Clone)]
pub struct NewCluster {
    pub name: String,
    pub main_topic: String,
    pub page_count: u32,
    pub opportunity: OpportunityLevel,
}

/// A content cluster row
#[derive(Debug, Clone)]
pub struct ClusterRecord {
    pub id: i64,
    pub run_id: i64,
    pub name: String,
    pub main_topic: String,
    pub page_count: u32,
    pub opportunity: OpportunityLevel,
}

/// A run log entry
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: i64,
    pub run_id: i64,
    pub step: String,
    pub level: LogLevel,
    pub message: String,
    pub created_at: String,
}

/// Robots.txt resolution report for a run
#[derive(Debug, Clone)]
pub struct NewRobotsReport {
    pub robots_url: String,
    pub content: Option<String>,
    pub is_accessible: bool,
    /// JSON array of sitemap URLs declared in the document
    pub sitemap_urls: String,
}

/// Sitemap resolution report for a run
#[derive(Debug, Clone)]
pub struct NewSitemapReport {
    pub sitemap_url: String,
    pub is_accessible: bool,
    pub total_urls: u32,
    pub valid_urls: u32,
    /// JSON array of URLs found in the document
    pub urls: String,
}

/// A broken internal link as reported by the rule read-back query
#[derive(Debug, Clone)]
pub struct BrokenLink {
    pub source_page_id: i64,
    pub source_url: String,
    pub target_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_db_string(status.to_db_string()), Some(status));
        }
    }

    #[test]
    fn test_run_status_active() {
        assert!(RunStatus::Pending.is_active());
        assert!(RunStatus::Running.is_active());
        assert!(!RunStatus::Completed.is_active());
        assert!(!RunStatus::Failed.is_active());
    }

    #[test]
    fn test_page_is_ok_html() {
        let mut page = PageRecord {
            id: 1,
            run_id: 1,
            url: "https://example.com/".to_string(),
            status_code: Some(200),
            content_type: Some("text/html; charset=utf-8".to_string()),
            page_size: Some(100),
            load_time_ms: Some(10),
            depth: 0,
            redirect_url: None,
            canonical_url: None,
            robots_meta: None,
            is_indexable: true,
            discovered_at: "2024-01-01T00:00:00Z".to_string(),
        };
        assert!(page.is_ok_html());

        page.status_code = Some(404);
        assert!(!page.is_ok_html());

        page.status_code = Some(200);
        page.content_type = Some("application/pdf".to_string());
        assert!(!page.is_ok_html());
    }
}
