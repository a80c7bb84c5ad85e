//! Blocking HTTP fetcher.

use super::{Fetcher, WatchlistError};
use log::debug;
use std::time::Duration;

/// Channel pages are served a consent wall without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// [`Fetcher`] backed by a `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, WatchlistError> {
        debug!("GET {}", url);
        let http_err = |reason: String| WatchlistError::Http {
            url: url.to_string(),
            reason,
        };
        match self.agent.get(url).call() {
            Ok(resp) => resp.into_string().map_err(|e| http_err(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(http_err(format!("HTTP {}", code))),
            Err(e) => Err(http_err(e.to_string())),
        }
    }
}
