//! Database schema definitions
//!
//! All SQL schema definitions for the Sitescope database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl+analysis runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    max_pages INTEGER NOT NULL,
    respect_robots INTEGER NOT NULL DEFAULT 1,
    include_external INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    progress REAL NOT NULL DEFAULT 0,
    started_at TEXT,
    finished_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_domain ON runs(domain, status);

-- Fetched pages; the normalized URL is unique within a run
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    status_code INTEGER,
    content_type TEXT,
    page_size INTEGER,
    load_time_ms INTEGER,
    depth INTEGER NOT NULL DEFAULT 0,
    redirect_url TEXT,
    canonical_url TEXT,
    robots_meta TEXT,
    is_indexable INTEGER NOT NULL DEFAULT 1,
    discovered_at TEXT NOT NULL,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);
CREATE INDEX IF NOT EXISTS idx_pages_status ON pages(run_id, status_code);

-- Extracted content profile; present only for HTML 200 pages
CREATE TABLE IF NOT EXISTS page_content (
    page_id INTEGER PRIMARY KEY REFERENCES pages(id),
    title TEXT,
    title_length INTEGER NOT NULL DEFAULT 0,
    meta_description TEXT,
    meta_description_length INTEGER NOT NULL DEFAULT 0,
    h1 TEXT,
    h1_count INTEGER NOT NULL DEFAULT 0,
    h2_count INTEGER NOT NULL DEFAULT 0,
    h3_count INTEGER NOT NULL DEFAULT 0,
    h4_count INTEGER NOT NULL DEFAULT 0,
    h5_count INTEGER NOT NULL DEFAULT 0,
    h6_count INTEGER NOT NULL DEFAULT 0,
    word_count INTEGER NOT NULL DEFAULT 0,
    internal_links_count INTEGER NOT NULL DEFAULT 0,
    external_links_count INTEGER NOT NULL DEFAULT 0,
    image_count INTEGER NOT NULL DEFAULT 0,
    images_without_alt INTEGER NOT NULL DEFAULT 0,
    keyword_density TEXT NOT NULL DEFAULT '{}',
    main_keywords TEXT NOT NULL DEFAULT '[]',
    has_structured_data INTEGER NOT NULL DEFAULT 0
);

-- Outbound links, one row per anchor
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_page_id INTEGER NOT NULL REFERENCES pages(id),
    target_url TEXT NOT NULL,
    anchor_text TEXT NOT NULL DEFAULT '',
    link_type TEXT NOT NULL,
    is_follow INTEGER NOT NULL DEFAULT 1,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_page_id);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(target_url);

-- Images per page
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    src TEXT NOT NULL,
    alt TEXT,
    title TEXT,
    is_lazy INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_images_page ON images(page_id);

-- Scored findings; bulk-replaced per analysis pass
CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_id INTEGER REFERENCES pages(id),
    category TEXT NOT NULL,
    kind TEXT NOT NULL,
    severity TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    recommendation TEXT NOT NULL,
    impact_score INTEGER NOT NULL,
    effort_score INTEGER NOT NULL,
    priority_score REAL NOT NULL,
    data TEXT
);

CREATE INDEX IF NOT EXISTS idx_issues_run ON issues(run_id);
CREATE INDEX IF NOT EXISTS idx_issues_priority ON issues(run_id, priority_score);

-- Topic clusters; bulk-replaced per analysis pass
CREATE TABLE IF NOT EXISTS content_clusters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    name TEXT NOT NULL,
    main_topic TEXT NOT NULL,
    page_count INTEGER NOT NULL,
    opportunity_level TEXT NOT NULL
);

-- Step events emitted by the crawl and analysis engines
CREATE TABLE IF NOT EXISTS run_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    step TEXT NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_run_logs_run ON run_logs(run_id);

-- Robots.txt resolution, persisted for coverage auditing
CREATE TABLE IF NOT EXISTS robots_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    robots_url TEXT NOT NULL,
    content TEXT,
    is_accessible INTEGER NOT NULL DEFAULT 0,
    sitemap_urls TEXT NOT NULL DEFAULT '[]'
);

-- Sitemap resolution, one row per fetched document
CREATE TABLE IF NOT EXISTS sitemap_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    sitemap_url TEXT NOT NULL,
    is_accessible INTEGER NOT NULL DEFAULT 0,
    total_urls INTEGER NOT NULL DEFAULT 0,
    valid_urls INTEGER NOT NULL DEFAULT 0,
    urls TEXT NOT NULL DEFAULT '[]'
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
