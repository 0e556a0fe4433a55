//! Crawl engine
//!
//! Orchestrates one run: resolves politeness rules and the sitemap,
//! seeds the frontier with the start URL, then drains the frontier in
//! sequence (robots check, fetch, extract, persist, admit new links)
//! until the queue is empty or the page budget is reached.
//!
//! A failure while processing a single page degrades that page's data
//! and is logged; only setup-phase faults, such as an unresolvable start
//! URL, fail the whole run.

use crate::config::Config;
use crate::crawler::extractor::extract_content;
use crate::crawler::fetcher::{build_http_client, fetch_url, PageFetch};
use crate::crawler::frontier::Frontier;
use crate::crawler::gate::HostGate;
use crate::robots::{parse_sitemap, RobotsRules, SITEMAP_CANDIDATES};
use crate::run::RunStep;
use crate::storage::{
    LogLevel, NewLink, NewPage, NewRobotsReport, NewSitemapReport, RunRecord, RunStatus, Storage,
};
use crate::url::{normalize_url, LinkKind};
use crate::ScopeError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Outcome of a finished crawl phase
#[derive(Debug, Clone, Copy)]
pub struct CrawlSummary {
    pub pages_processed: u64,
}

/// Run-scoped crawl orchestration
pub struct CrawlEngine<'a, S: Storage> {
    storage: &'a mut S,
    client: Client,
    config: &'a Config,
    run: RunRecord,
    gate: HostGate,
}

impl<'a, S: Storage> CrawlEngine<'a, S> {
    pub fn new(storage: &'a mut S, config: &'a Config, run: RunRecord) -> Result<Self, ScopeError> {
        let client = build_http_client(&config.crawler, &config.user_agent.header_value())?;
        let gate = HostGate::new(Duration::from_millis(config.crawler.delay_ms));
        Ok(Self {
            storage,
            client,
            config,
            run,
            gate,
        })
    }

    /// Runs the crawl to completion
    pub async fn run(&mut self) -> Result<CrawlSummary, ScopeError> {
        let start = normalize_url(&self.run.url).map_err(|e| {
            ScopeError::Setup(format!("cannot resolve start URL {}: {}", self.run.url, e))
        })?;

        let mut base = start.clone();
        base.set_path("/");
        base.set_query(None);

        self.storage.add_log(
            self.run.id,
            RunStep::CrawlStart.as_str(),
            LogLevel::Info,
            &format!("Starting crawl of {}", start),
        )?;

        let rules = if self.run.respect_robots {
            self.resolve_robots(&base).await?
        } else {
            RobotsRules::allow_all()
        };
        self.resolve_sitemaps(&base, &rules).await?;

        let agent_token = self.config.user_agent.agent_token();
        let mut frontier = Frontier::new(self.config.crawler.max_depth);
        frontier.admit(start, 0);

        let max_pages = self.run.max_pages as u64;
        let mut processed: u64 = 0;

        while processed < max_pages {
            // Run-scoped cancellation: a run marked failed stops draining
            if self.storage.get_run(self.run.id)?.status == RunStatus::Failed {
                tracing::warn!("Run {} marked failed, stopping frontier drain", self.run.id);
                break;
            }

            let Some((url, depth)) = frontier.next() else {
                break;
            };

            if self.run.respect_robots && !rules.is_allowed(url.path(), &agent_token) {
                self.storage.add_log(
                    self.run.id,
                    "robots_blocked",
                    LogLevel::Info,
                    &format!("URL blocked by robots.txt: {}", url),
                )?;
                frontier.mark_visited(&url);
                continue;
            }

            if let Some(host) = url.host_str() {
                let host = host.to_string();
                self.gate.wait(&host).await;
            }

            tracing::debug!("Fetching {} (depth {})", url, depth);
            match fetch_url(&self.client, url.as_str()).await {
                Ok(fetch) => {
                    if let Err(e) = self.persist_page(&url, depth, &fetch, &mut frontier) {
                        tracing::warn!("Failed to record {}: {}", url, e);
                        self.storage.add_log(
                            self.run.id,
                            "page_error",
                            LogLevel::Warning,
                            &format!("Failed to record {}: {}", url, e),
                        )?;
                    }
                    processed += 1;
                }
                Err(e) => {
                    // Transport failure: the page is skipped, the crawl goes on
                    tracing::warn!("Fetch failed for {}: {}", url, e);
                    self.storage.add_log(
                        self.run.id,
                        "fetch_error",
                        LogLevel::Warning,
                        &format!("Fetch failed for {}: {}", url, e),
                    )?;
                }
            }
            frontier.mark_visited(&url);

            // Crawling occupies the first half of total progress
            let progress = (processed as f64 / max_pages as f64 * 50.0).min(50.0);
            self.storage
                .update_run_progress(self.run.id, RunStatus::Running, progress)?;
        }

        self.storage.add_log(
            self.run.id,
            RunStep::CrawlComplete.as_str(),
            LogLevel::Info,
            &format!("Crawl complete: {} pages processed", processed),
        )?;
        tracing::info!("Crawl of {} complete: {} pages", self.run.domain, processed);

        Ok(CrawlSummary {
            pages_processed: processed,
        })
    }

    /// Persists one fetched page and, for HTML 200 responses, its content,
    /// links and images; qualifying internal links are admitted at depth+1
    fn persist_page(
        &mut self,
        url: &Url,
        depth: u32,
        fetch: &PageFetch,
        frontier: &mut Frontier,
    ) -> Result<(), ScopeError> {
        let page_id = self.storage.insert_page(
            self.run.id,
            &NewPage {
                url: url.as_str().to_string(),
                status_code: Some(fetch.status_code),
                content_type: fetch.content_type.clone(),
                page_size: Some(fetch.page_size),
                load_time_ms: Some(fetch.load_time_ms),
                depth,
                redirect_url: fetch.redirect_url.clone(),
            },
        )?;

        if !fetch.is_ok_html() {
            return Ok(());
        }

        let content = extract_content(&fetch.body, url, &self.run.domain);

        self.storage.update_page_meta(
            page_id,
            content.robots_meta.as_deref(),
            content.is_indexable(),
            content.canonical_url.as_deref(),
        )?;

        for image in &content.images {
            self.storage.insert_image(page_id, image)?;
        }

        for link in &content.links {
            // Internal targets persist under their normalized URL so the
            // link graph joins against the pages table exactly
            let stored = if link.kind == LinkKind::Internal {
                match normalize_url(&link.target_url) {
                    Ok(normalized) => {
                        if link.is_follow {
                            frontier.admit(normalized.clone(), depth + 1);
                        }
                        NewLink {
                            target_url: normalized.to_string(),
                            ..link.clone()
                        }
                    }
                    Err(_) => link.clone(),
                }
            } else {
                link.clone()
            };

            if stored.kind == LinkKind::External && !self.run.include_external {
                continue;
            }
            self.storage.insert_link(page_id, &stored)?;
        }

        self.storage
            .insert_page_content(page_id, &content.content_record())?;

        Ok(())
    }

    /// Fetches and parses robots.txt; any failure degrades to allow-all
    async fn resolve_robots(&mut self, base: &Url) -> Result<RobotsRules, ScopeError> {
        let robots_url = base.join("/robots.txt")?;

        match fetch_url(&self.client, robots_url.as_str()).await {
            Ok(fetch) if fetch.status_code == 200 => {
                let rules = RobotsRules::parse(&fetch.body);
                self.storage.insert_robots_report(
                    self.run.id,
                    &NewRobotsReport {
                        robots_url: robots_url.to_string(),
                        content: Some(fetch.body),
                        is_accessible: true,
                        sitemap_urls: serde_json::json!(rules.sitemaps).to_string(),
                    },
                )?;
                self.storage.add_log(
                    self.run.id,
                    "robots_resolved",
                    LogLevel::Info,
                    "robots.txt parsed",
                )?;
                Ok(rules)
            }
            _ => {
                self.storage.insert_robots_report(
                    self.run.id,
                    &NewRobotsReport {
                        robots_url: robots_url.to_string(),
                        content: None,
                        is_accessible: false,
                        sitemap_urls: "[]".to_string(),
                    },
                )?;
                self.storage.add_log(
                    self.run.id,
                    "robots_missing",
                    LogLevel::Info,
                    "robots.txt not found, allowing all paths",
                )?;
                Ok(RobotsRules::allow_all())
            }
        }
    }

    /// Resolves the first reachable sitemap, following one level of
    /// sitemap-index nesting; absence is non-fatal
    async fn resolve_sitemaps(&mut self, base: &Url, rules: &RobotsRules) -> Result<(), ScopeError> {
        let mut candidates = rules.sitemaps.clone();
        for path in SITEMAP_CANDIDATES {
            if let Ok(candidate) = base.join(path) {
                candidates.push(candidate.to_string());
            }
        }

        for candidate in candidates {
            let Ok(fetch) = fetch_url(&self.client, &candidate).await else {
                continue;
            };
            if fetch.status_code != 200 {
                continue;
            }

            let parsed = parse_sitemap(fetch.body.as_bytes());
            if parsed.is_index() {
                self.persist_sitemap_report(&candidate, &[])?;
                for child in &parsed.children {
                    if let Ok(child_fetch) = fetch_url(&self.client, child).await {
                        if child_fetch.status_code == 200 {
                            let child_parsed = parse_sitemap(child_fetch.body.as_bytes());
                            self.persist_sitemap_report(child, &child_parsed.urls)?;
                        }
                    }
                }
            } else {
                self.persist_sitemap_report(&candidate, &parsed.urls)?;
            }

            self.storage.add_log(
                self.run.id,
                "sitemap_resolved",
                LogLevel::Info,
                &format!("Sitemap resolved from {}", candidate),
            )?;
            return Ok(());
        }

        self.storage.add_log(
            self.run.id,
            "sitemap_missing",
            LogLevel::Info,
            "No reachable sitemap found",
        )?;
        Ok(())
    }

    fn persist_sitemap_report(&mut self, url: &str, urls: &[String]) -> Result<(), ScopeError> {
        let valid = urls.iter().filter(|u| Url::parse(u).is_ok()).count() as u32;
        self.storage.insert_sitemap_report(
            self.run.id,
            &NewSitemapReport {
                sitemap_url: url.to_string(),
                is_accessible: true,
                total_urls: urls.len() as u32,
                valid_urls: valid,
                urls: serde_json::json!(urls).to_string(),
            },
        )?;
        Ok(())
    }
}
