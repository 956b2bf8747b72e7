use std::time::Duration;

use console_core::listing::pagination::DEFAULT_ITEMS_PER_PAGE;

/// Default delay between the last search keystroke and the reload.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local console backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the console REST API, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request, when set.
    pub api_token: Option<String>,
    pub search_debounce_ms: u64,
    pub items_per_page: u32,
    /// Timeout applied by the HTTP client to every request.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            api_token: None,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                     |
    /// |--------------------------------|-----------------------------|
    /// | `CONSOLE_API_URL`              | `http://localhost:8000/api` |
    /// | `CONSOLE_API_TOKEN`            | unset                       |
    /// | `CONSOLE_SEARCH_DEBOUNCE_MS`   | `400`                       |
    /// | `CONSOLE_PER_PAGE`             | `15`                        |
    /// | `CONSOLE_REQUEST_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = std::env::var("CONSOLE_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let api_token = std::env::var("CONSOLE_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            api_url,
            api_token,
            search_debounce_ms: parse_var(
                "CONSOLE_SEARCH_DEBOUNCE_MS",
                "u64",
                defaults.search_debounce_ms,
            )?,
            items_per_page: parse_var("CONSOLE_PER_PAGE", "u32", defaults.items_per_page)?,
            request_timeout_secs: parse_var(
                "CONSOLE_REQUEST_TIMEOUT_SECS",
                "u64",
                defaults.request_timeout_secs,
            )?,
        })
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}
