//! Issue analysis and scoring engine
//!
//! The rule catalog is split by category: [`technical`] covers markup and
//! protocol problems, [`content`] covers editorial quality, [`ai`] covers
//! answer-engine readiness. Every rule is a read-only query over the
//! crawled corpus producing zero or more issue drafts; [`scoring`] turns
//! drafts into scored rows and [`clusters`] groups pages by topic.
//!
//! Issues and clusters are recomputed wholesale on every pass: the
//! previous rows are deleted before rules run, so stale findings never
//! survive a re-analysis.

pub mod ai;
pub mod clusters;
pub mod content;
pub mod scoring;
pub mod technical;

use crate::run::RunStep;
use crate::storage::{LogLevel, RunStatus, Storage};
use crate::ScopeError;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Base impact score for this severity
    pub fn base_score(&self) -> u32 {
        match self {
            Self::Critical => 90,
            Self::High => 75,
            Self::Medium => 50,
            Self::Low => 25,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Issue categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Technical,
    Content,
    Performance,
    Accessibility,
    Ai,
}

impl Category {
    /// Impact multiplier applied to the severity base score
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Technical => 1.0,
            Self::Performance => 0.9,
            Self::Content => 0.8,
            Self::Accessibility => 0.7,
            Self::Ai => 0.6,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Content => "content",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
            Self::Ai => "ai",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(Self::Technical),
            "content" => Some(Self::Content),
            "performance" => Some(Self::Performance),
            "accessibility" => Some(Self::Accessibility),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

/// Every issue kind the rule catalog can emit
///
/// Category and effort are total functions over this enum, so adding a
/// kind without mapping it is a compile error rather than a silent
/// fallback at scoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    DuplicateTitles,
    TitleLength,
    MissingTitle,
    MissingMetaDescription,
    DuplicateMetaDescriptions,
    MetaDescriptionLength,
    Page404,
    ServerError,
    RedirectChain,
    BrokenInternalLink,
    MissingCanonical,
    BlockedButLinked,
    SitemapErrorUrl,
    SlowPage,
    HeavyPage,
    MissingH1,
    MultipleH1,
    ShortContent,
    GenericTitle,
    OrphanPage,
    FeaturedSnippetOpportunity,
    KeywordStuffing,
    ImagesWithoutAlt,
    FaqSchemaOpportunity,
    MissingStructuredData,
    LowEatScore,
    HighAiPotential,
}

impl IssueKind {
    /// The category this kind reports under
    pub fn category(&self) -> Category {
        match self {
            Self::DuplicateTitles
            | Self::TitleLength
            | Self::MissingTitle
            | Self::MissingMetaDescription
            | Self::DuplicateMetaDescriptions
            | Self::MetaDescriptionLength
            | Self::Page404
            | Self::ServerError
            | Self::RedirectChain
            | Self::BrokenInternalLink
            | Self::MissingCanonical
            | Self::BlockedButLinked
            | Self::SitemapErrorUrl => Category::Technical,

            Self::SlowPage | Self::HeavyPage => Category::Performance,

            Self::MissingH1
            | Self::MultipleH1
            | Self::ShortContent
            | Self::GenericTitle
            | Self::OrphanPage
            | Self::FeaturedSnippetOpportunity
            | Self::KeywordStuffing => Category::Content,

            Self::ImagesWithoutAlt => Category::Accessibility,

            Self::FaqSchemaOpportunity
            | Self::MissingStructuredData
            | Self::LowEatScore
            | Self::HighAiPotential => Category::Ai,
        }
    }

    /// Estimated fix effort on a 0-100 scale
    pub fn effort(&self) -> u32 {
        match self {
            Self::MissingTitle => 20,
            Self::MissingH1 => 20,
            Self::MissingMetaDescription => 25,
            Self::BrokenInternalLink => 30,
            Self::DuplicateTitles => 40,
            Self::MissingStructuredData => 50,
            Self::HeavyPage => 60,
            Self::ShortContent => 60,
            Self::SlowPage => 70,
            Self::LowEatScore => 80,

            Self::TitleLength
            | Self::DuplicateMetaDescriptions
            | Self::MetaDescriptionLength
            | Self::Page404
            | Self::ServerError
            | Self::RedirectChain
            | Self::MissingCanonical
            | Self::BlockedButLinked
            | Self::SitemapErrorUrl
            | Self::MultipleH1
            | Self::GenericTitle
            | Self::OrphanPage
            | Self::FeaturedSnippetOpportunity
            | Self::KeywordStuffing
            | Self::ImagesWithoutAlt
            | Self::FaqSchemaOpportunity
            | Self::HighAiPotential => 50,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::DuplicateTitles => "duplicate_titles",
            Self::TitleLength => "title_length",
            Self::MissingTitle => "missing_title",
            Self::MissingMetaDescription => "missing_meta_description",
            Self::DuplicateMetaDescriptions => "duplicate_meta_descriptions",
            Self::MetaDescriptionLength => "meta_description_length",
            Self::Page404 => "page_404",
            Self::ServerError => "server_error",
            Self::RedirectChain => "redirect_chain",
            Self::BrokenInternalLink => "broken_internal_link",
            Self::MissingCanonical => "missing_canonical",
            Self::BlockedButLinked => "blocked_but_linked",
            Self::SitemapErrorUrl => "sitemap_error_url",
            Self::SlowPage => "slow_page",
            Self::HeavyPage => "heavy_page",
            Self::MissingH1 => "missing_h1",
            Self::MultipleH1 => "multiple_h1",
            Self::ShortContent => "short_content",
            Self::GenericTitle => "generic_title",
            Self::OrphanPage => "orphan_page",
            Self::FeaturedSnippetOpportunity => "featured_snippet_opportunity",
            Self::KeywordStuffing => "keyword_stuffing",
            Self::ImagesWithoutAlt => "images_without_alt",
            Self::FaqSchemaOpportunity => "faq_schema_opportunity",
            Self::MissingStructuredData => "missing_structured_data",
            Self::LowEatScore => "low_eat_score",
            Self::HighAiPotential => "high_ai_potential",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "duplicate_titles" => Some(Self::DuplicateTitles),
            "title_length" => Some(Self::TitleLength),
            "missing_title" => Some(Self::MissingTitle),
            "missing_meta_description" => Some(Self::MissingMetaDescription),
            "duplicate_meta_descriptions" => Some(Self::DuplicateMetaDescriptions),
            "meta_description_length" => Some(Self::MetaDescriptionLength),
            "page_404" => Some(Self::Page404),
            "server_error" => Some(Self::ServerError),
            "redirect_chain" => Some(Self::RedirectChain),
            "broken_internal_link" => Some(Self::BrokenInternalLink),
            "missing_canonical" => Some(Self::MissingCanonical),
            "blocked_but_linked" => Some(Self::BlockedButLinked),
            "sitemap_error_url" => Some(Self::SitemapErrorUrl),
            "slow_page" => Some(Self::SlowPage),
            "heavy_page" => Some(Self::HeavyPage),
            "missing_h1" => Some(Self::MissingH1),
            "multiple_h1" => Some(Self::MultipleH1),
            "short_content" => Some(Self::ShortContent),
            "generic_title" => Some(Self::GenericTitle),
            "orphan_page" => Some(Self::OrphanPage),
            "featured_snippet_opportunity" => Some(Self::FeaturedSnippetOpportunity),
            "keyword_stuffing" => Some(Self::KeywordStuffing),
            "images_without_alt" => Some(Self::ImagesWithoutAlt),
            "faq_schema_opportunity" => Some(Self::FaqSchemaOpportunity),
            "missing_structured_data" => Some(Self::MissingStructuredData),
            "low_eat_score" => Some(Self::LowEatScore),
            "high_ai_potential" => Some(Self::HighAiPotential),
            _ => None,
        }
    }
}

/// Opportunity level of a content cluster, driven by cluster size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityLevel {
    Low,
    Medium,
    High,
}

impl OpportunityLevel {
    /// Derives the level from the number of pages in a cluster
    pub fn from_page_count(count: usize) -> Self {
        if count >= 10 {
            Self::High
        } else if count >= 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A finding produced by a rule, before scoring
#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub kind: IssueKind,
    pub severity: Severity,
    pub page_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub data: Option<serde_json::Value>,
}

/// Runs the full analysis pipeline over a crawled run
///
/// Phases mirror the progress model: the crawl occupies 0-50, technical
/// analysis lands at 60, content at 75, AI at 90, and the report phase
/// (clustering plus priority normalization) completes the run. Progress
/// is monotonic across all phases.
pub struct Analyzer<'a, S: Storage> {
    storage: &'a mut S,
    run_id: i64,
}

impl<'a, S: Storage> Analyzer<'a, S> {
    pub fn new(storage: &'a mut S, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run(&mut self) -> Result<(), ScopeError> {
        // Wholesale recompute: stale findings never persist
        self.storage.clear_issues(self.run_id)?;
        self.storage.clear_clusters(self.run_id)?;

        let drafts = technical::evaluate(self.storage, self.run_id)?;
        self.insert_drafts(drafts)?;
        self.checkpoint(60.0, RunStep::TechnicalComplete, "Technical analysis complete")?;

        let drafts = content::evaluate(self.storage, self.run_id)?;
        self.insert_drafts(drafts)?;
        self.checkpoint(75.0, RunStep::ContentComplete, "Content analysis complete")?;

        let drafts = ai::evaluate(self.storage, self.run_id)?;
        self.insert_drafts(drafts)?;
        self.checkpoint(90.0, RunStep::AiComplete, "AI readiness analysis complete")?;

        let pages = self.storage.page_contents_for_run(self.run_id)?;
        for cluster in clusters::build_clusters(&pages) {
            self.storage.insert_cluster(self.run_id, &cluster)?;
        }

        // Priority scores are re-derived from stored impact/effort so they
        // can never drift from the formula
        self.storage.normalize_priorities(self.run_id)?;
        self.storage.add_log(
            self.run_id,
            RunStep::ReportsComplete.as_str(),
            LogLevel::Info,
            "Clustering and priority normalization complete",
        )?;

        Ok(())
    }

    fn insert_drafts(&mut self, drafts: Vec<IssueDraft>) -> Result<(), ScopeError> {
        for draft in drafts {
            let issue = scoring::score(draft);
            self.storage.insert_issue(self.run_id, &issue)?;
        }
        Ok(())
    }

    fn checkpoint(&mut self, progress: f64, step: RunStep, message: &str) -> Result<(), ScopeError> {
        self.storage
            .update_run_progress(self.run_id, RunStatus::Running, progress)?;
        self.storage
            .add_log(self.run_id, step.as_str(), LogLevel::Info, message)?;
        tracing::info!("{}", message);
        Ok(())
    }
}
