//! Lazy client session shared by the connector roles.
//!
//! Connection parameters are stored at construction; the HTTP client is
//! built on first use and released again after a configured idle window.
//! Idle release happens in the explicit `poll` call, not a background
//! timer, so control flow stays deterministic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::models::{Config, CrawlConfig, ServerConfig};
use crate::services::ConfluenceClient;

pub(crate) struct Session {
    server: ServerConfig,
    crawl: CrawlConfig,
    client: Option<Arc<ConfluenceClient>>,
    last_activity: Option<Instant>,
}

impl Session {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            crawl: config.crawl.clone(),
            client: None,
            last_activity: None,
        }
    }

    pub(crate) fn crawl(&self) -> &CrawlConfig {
        &self.crawl
    }

    /// The client, building it on first use.
    ///
    /// Fails with a configuration error when required parameters are
    /// missing; that error blocks the crawl and is never retried.
    pub(crate) fn acquire(&mut self) -> Result<Arc<ConfluenceClient>> {
        let client = match &self.client {
            Some(client) => Arc::clone(client),
            None => {
                let client = Arc::new(ConfluenceClient::new(&self.server, &self.crawl)?);
                log::debug!("Session established for {}", self.server.host);
                self.client = Some(Arc::clone(&client));
                client
            }
        };
        self.last_activity = Some(Instant::now());
        Ok(client)
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Release the client when it has been idle for the configured window.
    pub(crate) fn poll(&mut self) {
        let Some(last_activity) = self.last_activity else {
            return;
        };
        if last_activity.elapsed() >= Duration::from_secs(self.crawl.idle_release_secs) {
            log::debug!("Releasing idle session for {}", self.server.host);
            self.client = None;
            self.last_activity = None;
        }
    }

    /// Drop the client eagerly.
    pub(crate) fn disconnect(&mut self) {
        self.client = None;
        self.last_activity = None;
    }
}
