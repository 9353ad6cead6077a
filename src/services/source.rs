//! The seam between the crawl engine and the wire protocol.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Attachment, ContentItem, ListingPage, SpacePage};

/// Executes listing, fetch and permission requests against the remote
/// instance.
///
/// Every call is a blocking (awaited) network call. Implementations must
/// not interpret "not found" as an error — see [`fetch_content`].
///
/// [`fetch_content`]: ContentSource::fetch_content
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Probe whether the remote instance is reachable.
    async fn check_reachable(&self) -> Result<()>;

    /// Fetch one page of the content listing, optionally scoped to a space.
    async fn list_pages(
        &self,
        start: usize,
        limit: usize,
        space: Option<&str>,
    ) -> Result<ListingPage>;

    /// Fetch one page of the space listing.
    async fn list_spaces(&self, start: usize, limit: usize) -> Result<SpacePage>;

    /// Fetch a full content item by id.
    ///
    /// A document the remote no longer serves comes back as an item without
    /// a body, not as an error; errors are reserved for transport and parse
    /// failures.
    async fn fetch_content(&self, id: &str) -> Result<ContentItem>;

    /// Download the content bytes of an attachment.
    async fn fetch_attachment_data(&self, attachment: &Attachment) -> Result<Vec<u8>>;

    /// Permission names the user holds in the given space.
    async fn space_permissions(&self, space_key: &str, username: &str) -> Result<Vec<String>>;
}
