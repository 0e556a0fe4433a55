//! Run request boundary and end-to-end pipeline
//!
//! A run request is validated before anything is persisted; a request for
//! a domain that already has an active run returns that run's identity
//! instead of starting a duplicate. `process_run` then drives the crawl
//! and analysis phases to a terminal status.

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::crawler::CrawlEngine;
use crate::storage::{LogLevel, NewRun, RunStatus, Storage};
use crate::url::normalize_url;
use crate::ScopeError;

/// Smallest accepted page budget
pub const MIN_PAGE_BUDGET: u32 = 1;
/// Largest accepted page budget
pub const MAX_PAGE_BUDGET: u32 = 1000;

/// Canonical pipeline step identifiers emitted to the log sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Init,
    CrawlStart,
    CrawlComplete,
    TechnicalComplete,
    ContentComplete,
    AiComplete,
    ReportsComplete,
    Complete,
    Error,
}

impl RunStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CrawlStart => "crawl_start",
            Self::CrawlComplete => "crawl_complete",
            Self::TechnicalComplete => "technical_complete",
            Self::ContentComplete => "content_complete",
            Self::AiComplete => "ai_complete",
            Self::ReportsComplete => "reports_complete",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

/// Parameters of a run request
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub url: String,
    pub max_pages: u32,
    pub respect_robots: bool,
    pub include_external: bool,
}

impl RunRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pages: 100,
            respect_robots: true,
            include_external: false,
        }
    }
}

/// Outcome of a run request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new run was created
    Created(i64),
    /// An active run already exists for the domain
    AlreadyActive(i64),
}

impl RequestOutcome {
    pub fn run_id(&self) -> i64 {
        match self {
            Self::Created(id) | Self::AlreadyActive(id) => *id,
        }
    }
}

/// Validates a run request, returning the target domain
fn validate_request(request: &RunRequest) -> Result<String, ScopeError> {
    if request.max_pages < MIN_PAGE_BUDGET || request.max_pages > MAX_PAGE_BUDGET {
        return Err(ScopeError::Validation(format!(
            "page budget must be between {} and {}, got {}",
            MIN_PAGE_BUDGET, MAX_PAGE_BUDGET, request.max_pages
        )));
    }

    let url = normalize_url(&request.url)
        .map_err(|e| ScopeError::Validation(format!("invalid target URL: {}", e)))?;

    url.host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| ScopeError::Validation("target URL has no host".to_string()))
}

/// Validates a request and creates a `pending` run for it
///
/// Invalid requests are rejected before anything is persisted. If the
/// domain already has a `pending` or `running` run, its identity is
/// returned instead of creating a duplicate.
pub fn request_run<S: Storage>(
    storage: &mut S,
    request: &RunRequest,
) -> Result<RequestOutcome, ScopeError> {
    let domain = validate_request(request)?;

    if let Some(active) = storage.find_active_run(&domain)? {
        tracing::info!("Run {} already active for {}", active.id, domain);
        return Ok(RequestOutcome::AlreadyActive(active.id));
    }

    let run_id = storage.create_run(&NewRun {
        url: request.url.clone(),
        domain,
        max_pages: request.max_pages,
        respect_robots: request.respect_robots,
        include_external: request.include_external,
    })?;

    storage.add_log(
        run_id,
        RunStep::Init.as_str(),
        LogLevel::Info,
        &format!("Run created for {}", request.url),
    )?;

    Ok(RequestOutcome::Created(run_id))
}

/// Drives a created run through crawl and analysis to a terminal status
///
/// Any error fails the run: the message is captured verbatim in the log
/// sink and the run is marked `failed` before the error propagates.
pub async fn process_run<S: Storage>(
    storage: &mut S,
    config: &Config,
    run_id: i64,
) -> Result<(), ScopeError> {
    match drive(storage, config, run_id).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = storage.add_log(
                run_id,
                RunStep::Error.as_str(),
                LogLevel::Error,
                &e.to_string(),
            );
            let _ = storage.finish_run(run_id, RunStatus::Failed);
            tracing::error!("Run {} failed: {}", run_id, e);
            Err(e)
        }
    }
}

async fn drive<S: Storage>(
    storage: &mut S,
    config: &Config,
    run_id: i64,
) -> Result<(), ScopeError> {
    let run = storage.get_run(run_id)?;
    storage.mark_run_started(run_id)?;

    let summary = {
        let mut engine = CrawlEngine::new(&mut *storage, config, run)?;
        engine.run().await?
    };
    tracing::info!("Crawl phase done: {} pages", summary.pages_processed);

    Analyzer::new(&mut *storage, run_id).run()?;

    storage.finish_run(run_id, RunStatus::Completed)?;
    storage.add_log(
        run_id,
        RunStep::Complete.as_str(),
        LogLevel::Info,
        "Analysis completed successfully",
    )?;

    Ok(())
}
