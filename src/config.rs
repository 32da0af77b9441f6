use std::env;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const DEFAULT_MAX_PAGES: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Connection settings for the tracker, built once at startup and shared by
/// reference with everything that talks to the upstream API.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub page_size: u64,
    /// Upper bound on pages fetched by a single paginated walk.
    pub max_pages: u64,
}

impl Config {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reads `REDMINE_URL`, `REDMINE_API_KEY` and the optional
    /// `REDMINE_MAX_PAGES` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required_var("REDMINE_URL")?;
        let api_key = required_var("REDMINE_API_KEY")?;

        let mut config = Config::new(base_url, api_key);
        if let Ok(raw) = env::var("REDMINE_MAX_PAGES") {
            config.max_pages = parse_positive("REDMINE_MAX_PAGES", &raw)?;
        }
        Ok(config)
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}
