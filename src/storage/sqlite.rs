//! SQLite storage implementation

use crate::analyzer::{Category, IssueKind, OpportunityLevel, Severity};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    BrokenLink, ClusterRecord, IssueRecord, LinkRecord, LogLevel, LogRecord, NewCluster, NewImage,
    NewIssue, NewLink, NewPage, NewPageContent, NewRobotsReport, NewRun, NewSitemapReport,
    PageContentView, PageRecord, RunRecord, RunStatus,
};
use crate::url::LinkKind;
use crate::ScopeError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database at the given path
    pub fn new(path: &Path) -> Result<Self, ScopeError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, ScopeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn map_run_row(row: &Row) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            domain: row.get(2)?,
            max_pages: row.get(3)?,
            respect_robots: row.get(4)?,
            include_external: row.get(5)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
                .unwrap_or(RunStatus::Failed),
            progress: row.get(7)?,
            started_at: row.get(8)?,
            finished_at: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn map_page_row(row: &Row) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            run_id: row.get(1)?,
            url: row.get(2)?,
            status_code: row.get(3)?,
            content_type: row.get(4)?,
            page_size: row.get(5)?,
            load_time_ms: row.get(6)?,
            depth: row.get(7)?,
            redirect_url: row.get(8)?,
            canonical_url: row.get(9)?,
            robots_meta: row.get(10)?,
            is_indexable: row.get(11)?,
            discovered_at: row.get(12)?,
        })
    }

    fn map_content_row(row: &Row) -> rusqlite::Result<PageContentView> {
        Ok(PageContentView {
            page_id: row.get(0)?,
            url: row.get(1)?,
            status_code: row.get(2)?,
            load_time_ms: row.get(3)?,
            page_size: row.get(4)?,
            redirect_url: row.get(5)?,
            canonical_url: row.get(6)?,
            robots_meta: row.get(7)?,
            title: row.get(8)?,
            title_length: row.get(9)?,
            meta_description: row.get(10)?,
            meta_description_length: row.get(11)?,
            h1: row.get(12)?,
            h1_count: row.get(13)?,
            h2_count: row.get(14)?,
            h3_count: row.get(15)?,
            h4_count: row.get(16)?,
            h5_count: row.get(17)?,
            h6_count: row.get(18)?,
            word_count: row.get(19)?,
            internal_links_count: row.get(20)?,
            external_links_count: row.get(21)?,
            image_count: row.get(22)?,
            images_without_alt: row.get(23)?,
            keyword_density: row.get(24)?,
            main_keywords: row.get(25)?,
            has_structured_data: row.get(26)?,
        })
    }

    fn map_issue_row(row: &Row) -> rusqlite::Result<IssueRecord> {
        let kind_str: String = row.get(3)?;
        let category_str: String = row.get(4)?;
        let severity_str: String = row.get(5)?;
        Ok(IssueRecord {
            id: row.get(0)?,
            run_id: row.get(1)?,
            page_id: row.get(2)?,
            kind: IssueKind::from_db_string(&kind_str).unwrap_or(IssueKind::MissingTitle),
            category: Category::from_db_string(&category_str).unwrap_or(Category::Technical),
            severity: Severity::from_db_string(&severity_str).unwrap_or(Severity::Low),
            title: row.get(6)?,
            description: row.get(7)?,
            recommendation: row.get(8)?,
            impact_score: row.get(9)?,
            effort_score: row.get(10)?,
            priority_score: row.get(11)?,
            data: row.get(12)?,
        })
    }
}

const PAGE_COLUMNS: &str = "id, run_id, url, status_code, content_type, page_size, load_time_ms, \
     depth, redirect_url, canonical_url, robots_meta, is_indexable, discovered_at";

const CONTENT_COLUMNS: &str = "p.id, p.url, p.status_code, p.load_time_ms, p.page_size, \
     p.redirect_url, p.canonical_url, p.robots_meta, pc.title, pc.title_length, \
     pc.meta_description, pc.meta_description_length, pc.h1, pc.h1_count, pc.h2_count, \
     pc.h3_count, pc.h4_count, pc.h5_count, pc.h6_count, pc.word_count, \
     pc.internal_links_count, pc.external_links_count, pc.image_count, \
     pc.images_without_alt, pc.keyword_density, pc.main_keywords, pc.has_structured_data";

const ISSUE_COLUMNS: &str = "id, run_id, page_id, kind, category, severity, title, description, \
     recommendation, impact_score, effort_score, priority_score, data";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, run: &NewRun) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (url, domain, max_pages, respect_robots, include_external, status, progress, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                run.url,
                run.domain,
                run.max_pages,
                run.respect_robots,
                run.include_external,
                RunStatus::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, url, domain, max_pages, respect_robots, include_external, status,
                 progress, started_at, finished_at, created_at FROM runs WHERE id = ?1",
                params![run_id],
                Self::map_run_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn find_active_run(&self, domain: &str) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, url, domain, max_pages, respect_robots, include_external, status,
                 progress, started_at, finished_at, created_at FROM runs
                 WHERE domain = ?1 AND status IN ('pending', 'running')
                 ORDER BY id DESC LIMIT 1",
                params![domain],
                Self::map_run_row,
            )
            .optional()?;
        Ok(run)
    }

    fn mark_run_started(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, started_at = ?2 WHERE id = ?3",
            params![RunStatus::Running.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    fn update_run_progress(
        &mut self,
        run_id: i64,
        status: RunStatus,
        progress: f64,
    ) -> StorageResult<()> {
        // MAX keeps progress monotonic even if a phase reports a lower value
        self.conn.execute(
            "UPDATE runs SET status = ?1, progress = MAX(progress, ?2) WHERE id = ?3",
            params![status.to_db_string(), progress, run_id],
        )?;
        Ok(())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        if status == RunStatus::Completed {
            self.conn.execute(
                "UPDATE runs SET status = ?1, progress = 100, finished_at = ?2 WHERE id = ?3",
                params![status.to_db_string(), now, run_id],
            )?;
        } else {
            self.conn.execute(
                "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
                params![status.to_db_string(), now, run_id],
            )?;
        }
        Ok(())
    }

    // ===== Page Management =====

    fn insert_page(&mut self, run_id: i64, page: &NewPage) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (run_id, url, status_code, content_type, page_size, load_time_ms,
             depth, redirect_url, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                page.url,
                page.status_code,
                page.content_type,
                page.page_size,
                page.load_time_ms,
                page.depth,
                page.redirect_url,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_page_meta(
        &mut self,
        page_id: i64,
        robots_meta: Option<&str>,
        is_indexable: bool,
        canonical_url: Option<&str>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE pages SET robots_meta = ?1, is_indexable = ?2, canonical_url = ?3 WHERE id = ?4",
            params![robots_meta, is_indexable, canonical_url, page_id],
        )?;
        Ok(())
    }

    fn insert_page_content(&mut self, page_id: i64, content: &NewPageContent) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO page_content (page_id, title, title_length, meta_description,
             meta_description_length, h1, h1_count, h2_count, h3_count, h4_count, h5_count,
             h6_count, word_count, internal_links_count, external_links_count, image_count,
             images_without_alt, keyword_density, main_keywords, has_structured_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                page_id,
                content.title,
                content.title_length,
                content.meta_description,
                content.meta_description_length,
                content.h1,
                content.h1_count,
                content.h2_count,
                content.h3_count,
                content.h4_count,
                content.h5_count,
                content.h6_count,
                content.word_count,
                content.internal_links_count,
                content.external_links_count,
                content.image_count,
                content.images_without_alt,
                content.keyword_density,
                content.main_keywords,
                content.has_structured_data
            ],
        )?;
        Ok(())
    }

    fn insert_link(&mut self, source_page_id: i64, link: &NewLink) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO links (source_page_id, target_url, anchor_text, link_type, is_follow, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                source_page_id,
                link.target_url,
                link.anchor_text,
                link.kind.to_db_string(),
                link.is_follow,
                link.position
            ],
        )?;
        Ok(())
    }

    fn insert_image(&mut self, page_id: i64, image: &NewImage) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO images (page_id, src, alt, title, is_lazy) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![page_id, image.src, image.alt, image.title, image.is_lazy],
        )?;
        Ok(())
    }

    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE run_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![run_id], Self::map_page_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn page_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE run_id = ?1 AND url = ?2",
                    PAGE_COLUMNS
                ),
                params![run_id, url],
                Self::map_page_row,
            )
            .optional()?;
        Ok(page)
    }

    fn count_pages(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn page_contents_for_run(&self, run_id: i64) -> StorageResult<Vec<PageContentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages p JOIN page_content pc ON pc.page_id = p.id
             WHERE p.run_id = ?1 ORDER BY p.url",
            CONTENT_COLUMNS
        ))?;
        let views = stmt
            .query_map(params![run_id], Self::map_content_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(views)
    }

    fn links_for_page(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_page_id, target_url, anchor_text, link_type, is_follow, position
             FROM links WHERE source_page_id = ?1 ORDER BY position",
        )?;
        let links = stmt
            .query_map(params![page_id], |row| {
                let kind_str: String = row.get(4)?;
                Ok(LinkRecord {
                    id: row.get(0)?,
                    source_page_id: row.get(1)?,
                    target_url: row.get(2)?,
                    anchor_text: row.get(3)?,
                    kind: LinkKind::from_db_string(&kind_str).unwrap_or(LinkKind::External),
                    is_follow: row.get(5)?,
                    position: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    // ===== Rule Read-back Queries =====

    fn duplicate_titles(&self, run_id: i64) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT pc.title, COUNT(*) FROM page_content pc
             JOIN pages p ON pc.page_id = p.id
             WHERE p.run_id = ?1 AND pc.title IS NOT NULL AND pc.title != ''
             GROUP BY pc.title HAVING COUNT(*) > 1 ORDER BY pc.title",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn duplicate_meta_descriptions(&self, run_id: i64) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT pc.meta_description, COUNT(*) FROM page_content pc
             JOIN pages p ON pc.page_id = p.id
             WHERE p.run_id = ?1 AND pc.meta_description IS NOT NULL AND pc.meta_description != ''
             GROUP BY pc.meta_description HAVING COUNT(*) > 1 ORDER BY pc.meta_description",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn broken_internal_links(&self, run_id: i64) -> StorageResult<Vec<BrokenLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT l.source_page_id, sp.url, l.target_url
             FROM links l
             JOIN pages sp ON l.source_page_id = sp.id
             LEFT JOIN pages tp ON tp.run_id = sp.run_id AND tp.url = l.target_url
             WHERE sp.run_id = ?1 AND l.link_type = 'internal'
               AND (tp.id IS NULL OR tp.status_code >= 400)
             ORDER BY sp.url, l.target_url",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(BrokenLink {
                    source_page_id: row.get(0)?,
                    source_url: row.get(1)?,
                    target_url: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn orphan_pages(&self, run_id: i64) -> StorageResult<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.url FROM pages p
             WHERE p.run_id = ?1 AND p.status_code = 200
             AND NOT EXISTS (
                 SELECT 1 FROM links l
                 JOIN pages sp ON l.source_page_id = sp.id
                 WHERE sp.run_id = p.run_id AND l.link_type = 'internal'
                   AND l.target_url = p.url AND l.source_page_id != p.id
             )
             ORDER BY p.url",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn pages_with_missing_alt(&self, run_id: i64) -> StorageResult<Vec<(i64, String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.url, COUNT(*) FROM pages p
             JOIN images i ON i.page_id = p.id
             WHERE p.run_id = ?1 AND (i.alt IS NULL OR i.alt = '')
             GROUP BY p.id, p.url ORDER BY p.url",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn noindex_linked_targets(&self, run_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT l.target_url FROM links l
             JOIN pages sp ON l.source_page_id = sp.id
             JOIN pages tp ON tp.run_id = sp.run_id AND tp.url = l.target_url
             WHERE sp.run_id = ?1 AND l.link_type = 'internal'
               AND tp.robots_meta IS NOT NULL AND lower(tp.robots_meta) LIKE '%noindex%'
             ORDER BY l.target_url",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn sitemap_urls(&self, run_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT urls FROM sitemap_reports WHERE run_id = ?1 ORDER BY id")?;
        let json_blobs = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut urls = Vec::new();
        for blob in json_blobs {
            let parsed: Vec<String> = serde_json::from_str(&blob)?;
            urls.extend(parsed);
        }
        Ok(urls)
    }

    // ===== Issues and Clusters =====

    fn clear_issues(&mut self, run_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM issues WHERE run_id = ?1", params![run_id])?;
        Ok(())
    }

    fn insert_issue(&mut self, run_id: i64, issue: &NewIssue) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO issues (run_id, page_id, kind, category, severity, title, description,
             recommendation, impact_score, effort_score, priority_score, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run_id,
                issue.page_id,
                issue.kind.to_db_string(),
                issue.category.to_db_string(),
                issue.severity.to_db_string(),
                issue.title,
                issue.description,
                issue.recommendation,
                issue.impact_score,
                issue.effort_score,
                issue.priority_score,
                issue.data
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn normalize_priorities(&mut self, run_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE issues SET priority_score = impact_score * 0.7 + (100 - effort_score) * 0.3
             WHERE run_id = ?1",
            params![run_id],
        )?;
        Ok(())
    }

    fn issues_for_run(&self, run_id: i64) -> StorageResult<Vec<IssueRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM issues WHERE run_id = ?1 ORDER BY priority_score DESC, id",
            ISSUE_COLUMNS
        ))?;
        let issues = stmt
            .query_map(params![run_id], Self::map_issue_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    fn issue_counts_by_severity(&self, run_id: i64) -> StorageResult<Vec<(Severity, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT severity, COUNT(*) FROM issues WHERE run_id = ?1 GROUP BY severity",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(s, count)| Severity::from_db_string(&s).map(|sev| (sev, count as u64)))
            .collect())
    }

    fn issue_counts_by_category(&self, run_id: i64) -> StorageResult<Vec<(Category, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM issues WHERE run_id = ?1 GROUP BY category",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(c, count)| Category::from_db_string(&c).map(|cat| (cat, count as u64)))
            .collect())
    }

    fn clear_clusters(&mut self, run_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM content_clusters WHERE run_id = ?1",
            params![run_id],
        )?;
        Ok(())
    }

    fn insert_cluster(&mut self, run_id: i64, cluster: &NewCluster) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO content_clusters (run_id, name, main_topic, page_count, opportunity_level)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                cluster.name,
                cluster.main_topic,
                cluster.page_count,
                cluster.opportunity.to_db_string()
            ],
        )?;
        Ok(())
    }

    fn clusters_for_run(&self, run_id: i64) -> StorageResult<Vec<ClusterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, name, main_topic, page_count, opportunity_level
             FROM content_clusters WHERE run_id = ?1 ORDER BY page_count DESC, name",
        )?;
        let clusters = stmt
            .query_map(params![run_id], |row| {
                let level: String = row.get(5)?;
                Ok(ClusterRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    name: row.get(2)?,
                    main_topic: row.get(3)?,
                    page_count: row.get(4)?,
                    opportunity: OpportunityLevel::from_db_string(&level)
                        .unwrap_or(OpportunityLevel::Low),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clusters)
    }

    // ===== Politeness Reports =====

    fn insert_robots_report(&mut self, run_id: i64, report: &NewRobotsReport) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO robots_reports (run_id, robots_url, content, is_accessible, sitemap_urls)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                report.robots_url,
                report.content,
                report.is_accessible,
                report.sitemap_urls
            ],
        )?;
        Ok(())
    }

    fn insert_sitemap_report(
        &mut self,
        run_id: i64,
        report: &NewSitemapReport,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO sitemap_reports (run_id, sitemap_url, is_accessible, total_urls, valid_urls, urls)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                report.sitemap_url,
                report.is_accessible,
                report.total_urls,
                report.valid_urls,
                report.urls
            ],
        )?;
        Ok(())
    }

    // ===== Log Sink =====

    fn add_log(
        &mut self,
        run_id: i64,
        step: &str,
        level: LogLevel,
        message: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO run_logs (run_id, step, level, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, step, level.to_db_string(), message, now],
        )?;
        Ok(())
    }

    fn recent_logs(&self, run_id: i64, limit: u32) -> StorageResult<Vec<LogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, step, level, message, created_at FROM run_logs
             WHERE run_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let logs = stmt
            .query_map(params![run_id, limit], |row| {
                let level: String = row.get(3)?;
                Ok(LogRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    step: row.get(2)?,
                    level: LogLevel::from_db_string(&level).unwrap_or(LogLevel::Info),
                    message: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn last_error_log(&self, run_id: i64) -> StorageResult<Option<LogRecord>> {
        let log = self
            .conn
            .query_row(
                "SELECT id, run_id, step, level, message, created_at FROM run_logs
                 WHERE run_id = ?1 AND level = 'error' ORDER BY id DESC LIMIT 1",
                params![run_id],
                |row| {
                    let level: String = row.get(3)?;
                    Ok(LogRecord {
                        id: row.get(0)?,
                        run_id: row.get(1)?,
                        step: row.get(2)?,
                        level: LogLevel::from_db_string(&level).unwrap_or(LogLevel::Error),
                        message: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(log)
    }

    // ===== Report Queries =====

    fn status_code_distribution(&self, run_id: i64) -> StorageResult<Vec<(u16, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT status_code, COUNT(*) FROM pages
             WHERE run_id = ?1 AND status_code IS NOT NULL
             GROUP BY status_code ORDER BY status_code",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, u16>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
