use crate::config::ExchangeEnvConfig;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

/// Timeouts and retry budget for outbound REST calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

impl From<&ExchangeEnvConfig> for HttpClientSettings {
    fn from(config: &ExchangeEnvConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// HTTP client that retries transient failures (connect errors, 5xx, 429)
    /// with exponential backoff
    pub fn create_client(settings: &HttpClientSettings) -> ClientWithMiddleware {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Append `params` to `base_url` as a percent-encoded query string.
/// reqwest-middleware's request builder has no `.query()`, so URLs are built up front.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query)
}

/// RFC 3986 unreserved characters pass through, every other byte is `%XX`
fn percent_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
