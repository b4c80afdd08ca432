//! Stats API client configuration

use std::time::Duration;

/// Runtime configuration for [`NbaStatsClient`](crate::NbaStatsClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the stats API, with trailing slash
    pub base_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Sent as `User-Agent`; the stats site rejects non-browser agents
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stats.nba.com/stats/".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:72.0) Gecko/20100101 Firefox/72.0"
                .to_string(),
        }
    }
}
