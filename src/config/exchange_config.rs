//! Exchange connection settings parsed from environment variables.

use super::EnvReader;
use anyhow::Result;
use std::time::Duration;

/// Binance REST settings and fetch sizes
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeEnvConfig {
    pub base_url: String,
    /// Sent as `X-MBX-APIKEY` when present; market data endpoints work without it
    pub api_key: Option<String>,
    pub order_book_depth_limit: usize,
    pub recent_trades_limit: usize,
    /// Total base candles requested per kline fetch, paged 1000 at a time
    pub kline_history_limit: usize,
    pub kline_cache_ttl: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for ExchangeEnvConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            api_key: None,
            order_book_depth_limit: 100,
            recent_trades_limit: 1000,
            kline_history_limit: 1000,
            kline_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl ExchangeEnvConfig {
    pub(crate) fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();

        let depth = env.parse("ORDER_BOOK_DEPTH_LIMIT", defaults.order_book_depth_limit)?;
        if !(1..=5000).contains(&depth) {
            anyhow::bail!("ORDER_BOOK_DEPTH_LIMIT must be between 1 and 5000, got {}", depth);
        }
        let trades = env.parse("RECENT_TRADES_LIMIT", defaults.recent_trades_limit)?;
        if !(1..=1000).contains(&trades) {
            anyhow::bail!("RECENT_TRADES_LIMIT must be between 1 and 1000, got {}", trades);
        }
        let history = env.parse("KLINE_HISTORY_LIMIT", defaults.kline_history_limit)?;
        if history == 0 {
            anyhow::bail!("KLINE_HISTORY_LIMIT must be at least 1");
        }

        Ok(Self {
            base_url: env
                .string("BINANCE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: env.string("BINANCE_API_KEY"),
            order_book_depth_limit: depth,
            recent_trades_limit: trades,
            kline_history_limit: history,
            kline_cache_ttl: Duration::from_secs(env.parse("KLINE_CACHE_TTL_SECS", 60u64)?),
            request_timeout: Duration::from_secs(env.parse("HTTP_TIMEOUT_SECS", 30u64)?),
            max_retries: env.parse("HTTP_MAX_RETRIES", defaults.max_retries)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn read(vars: &[(&str, &str)]) -> Result<ExchangeEnvConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = |key: &str| vars.get(key).cloned();
        ExchangeEnvConfig::from_reader(&EnvReader::new(&lookup))
    }

    #[test]
    fn test_exchange_config_defaults() {
        let config = read(&[]).unwrap();
        assert_eq!(config, ExchangeEnvConfig::default());
        assert!(config.base_url.contains("binance.com"));
    }

    #[test]
    fn test_exchange_config_overrides() {
        let config = read(&[
            ("BINANCE_BASE_URL", "http://localhost:8080/"),
            ("BINANCE_API_KEY", "key"),
            ("KLINE_HISTORY_LIMIT", "5000"),
            ("KLINE_CACHE_TTL_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.kline_history_limit, 5000);
        assert_eq!(config.kline_cache_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_exchange_config_rejects_bad_values() {
        assert!(read(&[("ORDER_BOOK_DEPTH_LIMIT", "lots")]).is_err());
        assert!(read(&[("RECENT_TRADES_LIMIT", "0")]).is_err());
        assert!(read(&[("KLINE_HISTORY_LIMIT", "0")]).is_err());
    }
}
