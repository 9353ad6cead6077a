//! Confluence REST client.
//!
//! Implements [`ContentSource`] against the Confluence REST API, plus the
//! JSON-RPC permission endpoint that has no REST equivalent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{Attachment, ContentItem, CrawlConfig, ListingPage, Page, ServerConfig, SpacePage};
use crate::services::ContentSource;
use crate::utils::url;

const CONTENT_PATH: &str = "/rest/api/content";
const SPACE_PATH: &str = "/rest/api/space";
const RPC_PATH: &str = "/rpc/json-rpc/confluenceservice-v2";
const EXPAND_PARAMETERS: &str = "body.view,metadata.labels,space,history,version";

/// HTTP client for one Confluence instance.
#[derive(Debug)]
pub struct ConfluenceClient {
    server: ServerConfig,
    client: reqwest::Client,
}

impl ConfluenceClient {
    /// Create a new client from the configured parameters.
    ///
    /// Fails with a configuration error when a required parameter
    /// (protocol, host, path) is absent.
    pub fn new(server: &ServerConfig, crawl: &CrawlConfig) -> Result<Self> {
        server.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(&crawl.user_agent)
            .timeout(Duration::from_secs(crawl.timeout_secs))
            .build()?;

        Ok(Self {
            server: server.clone(),
            client,
        })
    }

    fn base_url(&self) -> String {
        url::sanitize(&format!(
            "{}://{}:{}/{}",
            self.server.protocol,
            self.server.host,
            self.server.effective_port(),
            self.server.path
        ))
    }

    fn content_url(&self, start: usize, limit: usize, space: Option<&str>) -> String {
        let mut url = format!(
            "{}?limit={limit}&start={start}",
            url::join(&self.base_url(), CONTENT_PATH)
        );
        if let Some(space) = space {
            url = format!("{url}&spaceKey={space}");
        }
        url
    }

    fn content_by_id_url(&self, id: &str) -> String {
        format!(
            "{}?expand={EXPAND_PARAMETERS}",
            url::join(&self.base_url(), &format!("{CONTENT_PATH}/{id}"))
        )
    }

    fn space_url(&self, start: usize, limit: usize) -> String {
        format!(
            "{}?limit={limit}&start={start}",
            url::join(&self.base_url(), SPACE_PATH)
        )
    }

    fn rpc_url(&self, method: &str) -> String {
        url::join(&self.base_url(), &format!("{RPC_PATH}/{method}"))
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if self.server.use_basic_auth() {
            request = request.basic_auth(&self.server.username, self.server.password.as_deref());
        }
        request
    }

    async fn get_json(&self, url: &str, context: &str) -> Result<Value> {
        log::debug!("Hitting url during {context}: {url}");

        let response = self.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote(context, status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentSource for ConfluenceClient {
    async fn check_reachable(&self) -> Result<()> {
        let url = self.content_url(0, 1, None);
        log::debug!("Hitting url for status check: {url}");

        let response = self.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote("status check", status));
        }
        Ok(())
    }

    async fn list_pages(
        &self,
        start: usize,
        limit: usize,
        space: Option<&str>,
    ) -> Result<ListingPage> {
        let url = self.content_url(start, limit, space);
        let raw = self.get_json(&url, "content listing").await?;

        let listing = ListingPage::parse(&raw)?;
        if listing.results.is_empty() {
            log::warn!("No content found in the listing response");
        }
        Ok(listing)
    }

    async fn list_spaces(&self, start: usize, limit: usize) -> Result<SpacePage> {
        let url = self.space_url(start, limit);
        let raw = self.get_json(&url, "space listing").await?;
        SpacePage::parse(&raw)
    }

    async fn fetch_content(&self, id: &str) -> Result<ContentItem> {
        let url = self.content_by_id_url(id);
        log::debug!("Hitting url for document content: {url}");

        let response = self.get(&url).send().await?;
        let status = response.status();

        // The remote signals a withdrawn or unreadable document with 404;
        // that is a deletion signal, not a transport failure.
        if status == StatusCode::NOT_FOUND {
            return Ok(ContentItem::Page(Page::absent(id)));
        }
        if !status.is_success() {
            return Err(AppError::remote("document fetch", status));
        }

        let text = response.text().await?;
        let raw: Value = serde_json::from_str(&text)?;
        ContentItem::parse(&raw)
    }

    async fn fetch_attachment_data(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        if attachment.download_url.is_empty() {
            return Err(AppError::remote(
                "attachment download",
                format!("attachment {} has no download link", attachment.record.id),
            ));
        }

        let url = url::join(&self.base_url(), &attachment.download_url);
        log::debug!("Hitting url for attachment content: {url}");

        let response = self.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote("attachment download", status));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn space_permissions(&self, space_key: &str, username: &str) -> Result<Vec<String>> {
        let url = self.rpc_url("getPermissionsForUser");
        log::debug!("Hitting url {url} for permissions of {username} in space {space_key}");

        let payload = json!([space_key, username]);
        let mut request = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(payload.to_string());
        if self.server.use_basic_auth() {
            request = request.basic_auth(&self.server.username, self.server.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote("permission check", status));
        }

        let text = response.text().await?;
        let raw: Value = serde_json::from_str(&text)?;
        let permissions = raw
            .as_array()
            .ok_or_else(|| AppError::parse("permission response is not an array"))?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ConfluenceClient {
        let server = ServerConfig {
            protocol: "http".to_string(),
            host: "wiki.example.com".to_string(),
            port: Some(8090),
            path: "/confluence".to_string(),
            username: String::new(),
            password: None,
        };
        ConfluenceClient::new(&server, &CrawlConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_parameters() {
        let server = ServerConfig {
            host: String::new(),
            ..ServerConfig::default()
        };
        let err = ConfluenceClient::new(&server, &CrawlConfig::default()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_content_url() {
        let client = client();
        assert_eq!(
            client.content_url(50, 50, None),
            "http://wiki.example.com:8090/confluence/rest/api/content?limit=50&start=50"
        );
        assert_eq!(
            client.content_url(0, 50, Some("ENG")),
            "http://wiki.example.com:8090/confluence/rest/api/content?limit=50&start=0&spaceKey=ENG"
        );
    }

    #[test]
    fn test_content_by_id_url() {
        let client = client();
        assert_eq!(
            client.content_by_id_url("42"),
            format!(
                "http://wiki.example.com:8090/confluence/rest/api/content/42?expand={EXPAND_PARAMETERS}"
            )
        );
    }

    #[test]
    fn test_rpc_url() {
        let client = client();
        assert_eq!(
            client.rpc_url("getPermissionsForUser"),
            "http://wiki.example.com:8090/confluence/rpc/json-rpc/confluenceservice-v2/getPermissionsForUser"
        );
    }

    #[test]
    fn test_base_url_collapses_doubled_slashes() {
        let server = ServerConfig {
            protocol: "https".to_string(),
            host: "wiki.example.com".to_string(),
            port: None,
            path: "//confluence/".to_string(),
            username: String::new(),
            password: None,
        };
        let client = ConfluenceClient::new(&server, &CrawlConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://wiki.example.com:443/confluence/");
    }
}
