use std::time::Duration;

/// Public endpoint of the Ministry of Interior obligations service.
pub const DEFAULT_BASE_URL: &str = "https://e-uslugi.mvr.bg/api/Obligations/AND";

/// Upstream is slow a couple of times a day; anything past this is reported as a timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings owned by a `KatApiClient` for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Loads overrides from `KAT_API_BASE_URL` and `KAT_API_TIMEOUT_SECS`,
    /// falling back to the defaults when a variable is absent.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            base_url: match std::env::var("KAT_API_BASE_URL") {
                Ok(url) => {
                    if url.trim().is_empty() {
                        anyhow::bail!("KAT_API_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("KAT_API_BASE_URL must start with http:// or https://");
                    }
                    url
                }
                Err(_) => defaults.base_url,
            },
            timeout: match std::env::var("KAT_API_TIMEOUT_SECS") {
                Ok(secs) => {
                    let secs: u64 = secs.trim().parse().map_err(|_| {
                        anyhow::anyhow!("KAT_API_TIMEOUT_SECS must be a whole number of seconds")
                    })?;
                    if secs == 0 {
                        anyhow::bail!("KAT_API_TIMEOUT_SECS must be greater than zero");
                    }
                    Duration::from_secs(secs)
                }
                Err(_) => defaults.timeout,
            },
        };

        tracing::debug!("KAT API base URL: {}", config.base_url);
        tracing::debug!("KAT API timeout: {:?}", config.timeout);

        Ok(config)
    }
}
