use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max-depth must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.crawler.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_excessive_redirects_rejected() {
        let mut config = Config::default();
        config.crawler.max_redirects = 50;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_crawler_name_rejected() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_contact_url_rejected() {
        let mut config = Config::default();
        config.user_agent.contact_url = "not-a-url".to_string();
        assert!(validate(&config).is_err());
    }
}
