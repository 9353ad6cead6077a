//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Confluence server connection parameters
    #[serde(default)]
    pub server: ServerConfig,

    /// Crawling behavior settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Job-level scoping
    #[serde(default)]
    pub job: JobSpec,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Server parameters are checked separately when the client session is
    /// built; a missing host there is a fatal configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.crawl.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawl.user_agent is empty"));
        }
        if self.crawl.timeout_secs == 0 {
            return Err(AppError::validation("crawl.timeout_secs must be > 0"));
        }
        if self.crawl.page_size == 0 {
            return Err(AppError::validation("crawl.page_size must be > 0"));
        }
        if self.crawl.max_concurrent == 0 {
            return Err(AppError::validation("crawl.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

/// Confluence server connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Protocol, "http" or "https"
    #[serde(default = "defaults::protocol")]
    pub protocol: String,

    /// Server hostname
    #[serde(default)]
    pub host: String,

    /// Server port; derived from the protocol when absent
    #[serde(default)]
    pub port: Option<u16>,

    /// Base path of the Confluence instance
    #[serde(default)]
    pub path: String,

    /// Username for basic authentication; empty for anonymous access
    #[serde(default)]
    pub username: String,

    /// Password for basic authentication
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: defaults::protocol(),
            host: String::new(),
            port: None,
            path: String::new(),
            username: String::new(),
            password: None,
        }
    }
}

impl ServerConfig {
    /// Check that all required connection parameters are present.
    ///
    /// Missing parameters block the crawl from starting and are never
    /// retried.
    pub fn validate(&self) -> Result<()> {
        if self.protocol.trim().is_empty() {
            return Err(AppError::config("Parameter protocol required but not set"));
        }
        if self.host.trim().is_empty() {
            return Err(AppError::config("Parameter host required but not set"));
        }
        if self.path.trim().is_empty() {
            return Err(AppError::config("Parameter path required but not set"));
        }
        Ok(())
    }

    /// Configured port, or the protocol default (80 for http, 443 otherwise).
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.protocol.eq_ignore_ascii_case("http") => 80,
            None => 443,
        }
    }

    /// Whether requests should carry basic authentication.
    pub fn use_basic_auth(&self) -> bool {
        !self.username.is_empty() && self.password.is_some()
    }
}

/// Crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Page size for listing requests
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Maximum concurrent permission checks during authority lookup
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Idle window after which the client session is released, in seconds
    #[serde(default = "defaults::idle_release")]
    pub idle_release_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
            max_concurrent: defaults::max_concurrent(),
            idle_release_secs: defaults::idle_release(),
        }
    }
}

/// Job-level crawl scoping.
///
/// At most one space key; absent means all spaces.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobSpec {
    /// Space key to restrict the crawl to
    #[serde(default)]
    pub space: Option<String>,
}

impl JobSpec {
    /// Effective space filter; blank values count as absent.
    pub fn space_filter(&self) -> Option<&str> {
        self.space
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

mod defaults {
    pub fn protocol() -> String {
        "http".to_string()
    }

    pub fn user_agent() -> String {
        format!("confluence-sync/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn page_size() -> usize {
        50
    }

    pub fn max_concurrent() -> usize {
        4
    }

    pub fn idle_release() -> u64 {
        300
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerConfig {
        ServerConfig {
            protocol: "http".to_string(),
            host: "wiki.example.com".to_string(),
            port: None,
            path: "/confluence".to_string(),
            username: String::new(),
            password: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(server().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_host() {
        let mut config = server();
        config.host = String::new();

        let err = config.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_validate_missing_path() {
        let mut config = server();
        config.path = "  ".to_string();

        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_effective_port_defaults() {
        let mut config = server();
        assert_eq!(config.effective_port(), 80);

        config.protocol = "https".to_string();
        assert_eq!(config.effective_port(), 443);

        config.port = Some(8090);
        assert_eq!(config.effective_port(), 8090);
    }

    #[test]
    fn test_space_filter_blank_is_none() {
        let spec = JobSpec {
            space: Some("  ".to_string()),
        };
        assert_eq!(spec.space_filter(), None);

        let spec = JobSpec {
            space: Some("ENG".to_string()),
        };
        assert_eq!(spec.space_filter(), Some("ENG"));
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            protocol = "https"
            host = "wiki.example.com"
            path = "/confluence"
            username = "crawler"
            password = "secret"

            [job]
            space = "ENG"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.effective_port(), 443);
        assert!(config.server.use_basic_auth());
        assert_eq!(config.job.space_filter(), Some("ENG"));
        assert_eq!(config.crawl.page_size, 50);
        assert!(config.validate().is_ok());
    }
}
