use serde::Deserialize;

/// Main configuration structure for Sitescope
///
/// Every section has sensible defaults so a config file is optional; a
/// TOML file only needs to name the values it overrides.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Overall timeout for a single fetch (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirect hops followed per fetch
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Minimum interval between requests to the same host (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the agent token matched in robots.txt
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl UserAgentConfig {
    /// Full User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }

    /// Agent token used when matching robots.txt groups
    pub fn agent_token(&self) -> String {
        self.crawler_name.to_lowercase()
    }
}

fn default_max_depth() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_crawler_name() -> String {
    "SitescopeBot".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://example.com/bot".to_string()
}

fn default_database_path() -> String {
    "./sitescope.db".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}
