//! Preflight reachability check for the site under audit

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AuditError, AuditResult};

pub struct SitePreflight {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl SitePreflight {
    pub fn new(base_url: impl Into<String>) -> AuditResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
            poll_interval: Duration::from_millis(250),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll the base URL until it answers with anything below 500.
    ///
    /// A dev server answering 404 on `/` is still up; only connection
    /// failures and server errors keep the preflight waiting.
    pub async fn wait_until_reachable(&self, timeout: Duration) -> AuditResult<()> {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.client.get(&self.base_url).send().await {
                Ok(resp) if !resp.status().is_server_error() => {
                    info!("Site reachable at {} ({})", self.base_url, resp.status());
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Preflight returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {} to respond...", self.base_url);
                    }
                    if !e.is_connect() {
                        warn!("Preflight error: {}", e);
                    }
                }
            }

            if start.elapsed() + self.poll_interval >= timeout {
                break;
            }
            sleep(self.poll_interval).await;
        }

        Err(AuditError::SiteUnreachable {
            url: self.base_url.clone(),
            attempts,
        })
    }
}
