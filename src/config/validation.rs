use crate::config::types::{
    AgentConfig, Config, OracleConfig, OutputConfig, SearchConfig, SiteConfig, StaticAnswer,
    UserAgentConfig,
};
use crate::url::matches_wildcard;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_agent_config(&config.agent)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_oracle_config(&config.oracle)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    validate_static_answers(&config.static_answers)?;

    if config.questions.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "questions path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the allow-listed site and its seeds
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_domain_pattern(&config.domain)?;

    let start = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url: {}", e)))?;

    if start.scheme() != "http" && start.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url '{}' must use HTTP or HTTPS",
            config.start_url
        )));
    }

    let host = start.host_str().unwrap_or_default().to_lowercase();
    if !matches_wildcard(&config.domain.to_lowercase(), &host) {
        return Err(ConfigError::Validation(format!(
            "start-url host '{}' is outside the allowed domain '{}'",
            host, config.domain
        )));
    }

    for seed in &config.seed_paths {
        if seed.starts_with('/') {
            continue;
        }

        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed path '{}': {}", seed, e)))?;
        let seed_host = url.host_str().unwrap_or_default().to_lowercase();
        if !matches_wildcard(&config.domain.to_lowercase(), &seed_host) {
            return Err(ConfigError::Validation(format!(
                "Seed '{}' is outside the allowed domain '{}'",
                seed, config.domain
            )));
        }
    }

    Ok(())
}

/// Validates crawl budgets
fn validate_agent_config(config: &AgentConfig) -> Result<(), ConfigError> {
    if config.max_depth > 5 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be between 0 and 5, got {}",
            config.max_depth
        )));
    }

    if config.max_urls_per_tier < 1 || config.max_urls_per_tier > 500 {
        return Err(ConfigError::Validation(format!(
            "max-urls-per-tier must be between 1 and 500, got {}",
            config.max_urls_per_tier
        )));
    }

    if config.max_search_queries_per_question < 1 || config.max_search_queries_per_question > 20
    {
        return Err(ConfigError::Validation(format!(
            "max-search-queries-per-question must be between 1 and 20, got {}",
            config.max_search_queries_per_question
        )));
    }

    if config.request_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request-delay-ms must be >= 100ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.page_max_chars < 1000 {
        return Err(ConfigError::Validation(format!(
            "page-max-chars must be >= 1000, got {}",
            config.page_max_chars
        )));
    }

    if config.corpus_max_chars < config.page_max_chars {
        return Err(ConfigError::Validation(format!(
            "corpus-max-chars ({}) must be >= page-max-chars ({})",
            config.corpus_max_chars, config.page_max_chars
        )));
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

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_oracle_config(config: &OracleConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid oracle endpoint: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle api-key-env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "oracle timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search api-key-env cannot be empty".to_string(),
        ));
    }

    if config.max_results < 1 || config.max_results > 20 {
        return Err(ConfigError::Validation(format!(
            "search max-results must be between 1 and 20, got {}",
            config.max_results
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "search timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_static_answers(entries: &[StaticAnswer]) -> Result<(), ConfigError> {
    for entry in entries {
        if entry.keywords.is_empty() || entry.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "static answer '{}' needs at least one non-empty keyword",
                entry.answer
            )));
        }

        if entry.answer.trim().is_empty() {
            return Err(ConfigError::Validation(
                "static answer text cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.org')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(domain: &str, start_url: &str, seeds: &[&str]) -> SiteConfig {
        SiteConfig {
            domain: domain.to_string(),
            start_url: start_url.to_string(),
            seed_paths: seeds.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.org").is_ok());
        assert!(validate_domain_pattern("*.example.org").is_ok());
        assert!(validate_domain_pattern("sub.example.org").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.org").is_err());
        assert!(validate_domain_pattern("example.org.").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_site_start_url_must_be_in_domain() {
        assert!(validate_site_config(&site("example.org", "https://example.org/", &[])).is_ok());
        assert!(
            validate_site_config(&site("*.example.org", "https://www.example.org/", &[])).is_ok()
        );
        assert!(validate_site_config(&site("example.org", "https://other.org/", &[])).is_err());
        assert!(validate_site_config(&site("example.org", "ftp://example.org/", &[])).is_err());
    }

    #[test]
    fn test_seed_paths_must_stay_in_domain() {
        let ok = site(
            "example.org",
            "https://example.org/",
            &["/kontakt", "https://example.org/about"],
        );
        assert!(validate_site_config(&ok).is_ok());

        let bad = site("example.org", "https://example.org/", &["https://evil.com/"]);
        assert!(validate_site_config(&bad).is_err());
    }

    #[test]
    fn test_agent_limits() {
        let mut agent = AgentConfig::default();
        assert!(validate_agent_config(&agent).is_ok());

        agent.max_urls_per_tier = 0;
        assert!(validate_agent_config(&agent).is_err());

        let mut agent = AgentConfig::default();
        agent.request_delay_ms = 10;
        assert!(validate_agent_config(&agent).is_err());

        let mut agent = AgentConfig::default();
        agent.corpus_max_chars = agent.page_max_chars - 1;
        assert!(validate_agent_config(&agent).is_err());
    }
}
