//! Authority connector role.
//!
//! Maps a user identity to the set of spaces they may view, for access
//! filtering of previously ingested documents. Every lookup re-derives
//! the full set; nothing is cached across requests.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};

use crate::connector::session::Session;
use crate::error::AppError;
use crate::models::{AuthorityRecord, Config, Space};
use crate::pipeline::{ConnectorError, ConnectorResult, SEED_PAGE_SIZE, classify};
use crate::services::ContentSource;

/// Permission name granting read access to a space.
pub const VIEW_PERMISSION: &str = "view";

/// Authority connector instance.
pub struct AuthorityConnector {
    session: Session,
}

impl AuthorityConnector {
    /// Create a connector from configured parameters. No connection is
    /// established until the first remote call.
    pub fn new(config: &Config) -> Self {
        Self {
            session: Session::new(config),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Release the client session if it has been idle too long.
    pub fn poll(&mut self) {
        self.session.poll();
    }

    /// Drop the client session eagerly.
    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    /// Connectivity check. Never errors; returns a status string.
    pub async fn check(&mut self) -> String {
        let client = match self.session.acquire() {
            Ok(client) => client,
            Err(err) => return format!("Connection failed: {err}"),
        };
        match client.list_spaces(0, 1).await {
            Ok(_) => "Connection working".to_string(),
            Err(AppError::Interrupted(cause)) => format!("Connection temporarily failed: {cause}"),
            Err(err) => format!("Connection failed: {err}"),
        }
    }

    /// Resolve the spaces the user holds view permission in.
    pub async fn user_spaces(&mut self, username: &str) -> ConnectorResult<AuthorityRecord> {
        let max_concurrent = self.session.crawl().max_concurrent;
        let client = self.session.acquire().map_err(ConnectorError::Fatal)?;
        lookup_user_spaces(client.as_ref(), username, max_concurrent).await
    }

    /// Resolve the user's authorization, mapping any failure to deny-all.
    ///
    /// An unreachable server must deny access rather than surface an error
    /// to the end user.
    pub async fn authorize(&mut self, username: &str) -> AuthorityRecord {
        match self.user_spaces(username).await {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Authority lookup failed for {username}: {err}; denying all access");
                AuthorityRecord::deny_all(username)
            }
        }
    }
}

/// Enumerate all spaces and keep those where the user may view content.
pub async fn lookup_user_spaces(
    source: &dyn ContentSource,
    username: &str,
    max_concurrent: usize,
) -> ConnectorResult<AuthorityRecord> {
    let spaces = list_all_spaces(source).await?;
    log::debug!("Checking view permission for {username} across {} spaces", spaces.len());

    // One permission check per space; checks are independent, so bounded
    // concurrency does not affect the result.
    let mut checks = stream::iter(spaces.into_iter().map(|space| async move {
        let permissions = source.space_permissions(&space.key, username).await?;
        Ok::<_, AppError>((space.key, permissions))
    }))
    .buffer_unordered(max_concurrent.max(1));

    let mut allowed = BTreeSet::new();
    while let Some(result) = checks.next().await {
        let (key, permissions) = result.map_err(|err| classify(err, "permission check"))?;
        if permissions.iter().any(|p| p == VIEW_PERMISSION) {
            allowed.insert(key);
        }
    }

    Ok(AuthorityRecord::new(username, allowed))
}

async fn list_all_spaces(source: &dyn ContentSource) -> ConnectorResult<Vec<Space>> {
    let mut spaces = Vec::new();
    let mut start = 0usize;

    loop {
        let page = source
            .list_spaces(start, SEED_PAGE_SIZE)
            .await
            .map_err(|err| classify(err, "space listing"))?;

        let count = page.results.len();
        spaces.extend(page.results);
        start += count;

        if page.is_last || count == 0 {
            break;
        }
    }
    Ok(spaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpacePage;
    use crate::services::testing::ScriptedSource;

    fn space(key: &str) -> Space {
        Space {
            key: key.to_string(),
            name: format!("Space {key}"),
        }
    }

    fn space_page(keys: &[&str], start: usize, is_last: bool) -> SpacePage {
        SpacePage {
            results: keys.iter().map(|k| space(k)).collect(),
            start,
            limit: 50,
            is_last,
        }
    }

    #[tokio::test]
    async fn test_lookup_keeps_spaces_with_view_permission() {
        let mut source = ScriptedSource::default();
        source.space_pages = vec![space_page(&["ENG", "HR", "OPS"], 0, true)];
        source
            .permissions
            .insert("ENG".to_string(), vec!["view".to_string(), "edit".to_string()]);
        source
            .permissions
            .insert("HR".to_string(), vec!["edit".to_string()]);
        // OPS has no permissions scripted: empty list.

        let record = lookup_user_spaces(&source, "ada", 2).await.unwrap();

        assert_eq!(record.username, "ada");
        assert!(record.allows("ENG"));
        assert!(!record.allows("HR"));
        assert!(!record.allows("OPS"));
    }

    #[tokio::test]
    async fn test_lookup_walks_all_space_pages() {
        let mut source = ScriptedSource::default();
        source.space_pages = vec![
            space_page(&["A", "B"], 0, false),
            space_page(&["C"], 2, true),
        ];
        for key in ["A", "B", "C"] {
            source
                .permissions
                .insert(key.to_string(), vec!["view".to_string()]);
        }

        let record = lookup_user_spaces(&source, "ada", 1).await.unwrap();
        assert_eq!(record.spaces.len(), 3);
    }

    #[tokio::test]
    async fn test_lookup_failure_classifies_as_retryable() {
        let mut source = ScriptedSource::default();
        source.space_pages = vec![space_page(&["ENG"], 0, true)];
        source.fail_permissions = true;

        let err = lookup_user_spaces(&source, "ada", 1).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Retry(_)));
    }

    #[tokio::test]
    async fn test_authorize_denies_all_on_failure() {
        // No space pages scripted: the listing fails outright.
        let mut connector = AuthorityConnector::new(&Config::default());
        let record = connector.authorize("ada").await;

        assert_eq!(record, AuthorityRecord::deny_all("ada"));
    }
}
