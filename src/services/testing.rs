//! Scripted in-memory content source for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{Attachment, ContentItem, ListingPage, Page, SpacePage};
use crate::services::ContentSource;

/// Build a listing summary with just the required fields.
pub fn summary(id: &str) -> Page {
    Page::parse(&json!({
        "id": id,
        "type": "page",
        "title": format!("Page {id}")
    }))
    .unwrap()
}

/// Build a listing page from summary ids.
pub fn listing(ids: &[&str], start: usize, is_last: bool) -> ListingPage {
    ListingPage {
        results: ids.iter().map(|id| summary(id)).collect(),
        start,
        limit: 50,
        is_last,
    }
}

/// The transport error used by scripted failures.
pub fn transport_error() -> AppError {
    AppError::remote("test", "503 Service Unavailable")
}

/// Content source that replays scripted responses and records listing
/// offsets.
#[derive(Default)]
pub struct ScriptedSource {
    pub listings: Vec<ListingPage>,
    pub space_pages: Vec<SpacePage>,
    pub items: HashMap<String, ContentItem>,
    pub permissions: HashMap<String, Vec<String>>,
    pub attachment_data: HashMap<String, Vec<u8>>,
    pub reachable: bool,
    pub fail_listing_at: Option<usize>,
    pub fail_fetch: Vec<String>,
    pub fail_permissions: bool,
    pub listing_starts: Mutex<Vec<usize>>,
    listing_cursor: AtomicUsize,
    space_cursor: AtomicUsize,
}

impl ScriptedSource {
    pub fn with_listings(listings: Vec<ListingPage>) -> Self {
        Self {
            listings,
            ..Self::default()
        }
    }

    pub fn insert_item(&mut self, item: ContentItem) {
        self.items.insert(item.id().to_string(), item);
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn check_reachable(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(transport_error())
        }
    }

    async fn list_pages(
        &self,
        start: usize,
        _limit: usize,
        _space: Option<&str>,
    ) -> Result<ListingPage> {
        let call = self.listing_cursor.fetch_add(1, Ordering::SeqCst);
        self.listing_starts.lock().unwrap().push(start);

        if self.fail_listing_at == Some(call) {
            return Err(transport_error());
        }
        self.listings
            .get(call)
            .cloned()
            .ok_or_else(|| AppError::remote("test", "listing script exhausted"))
    }

    async fn list_spaces(&self, _start: usize, _limit: usize) -> Result<SpacePage> {
        let call = self.space_cursor.fetch_add(1, Ordering::SeqCst);
        self.space_pages
            .get(call)
            .cloned()
            .ok_or_else(|| AppError::remote("test", "space script exhausted"))
    }

    async fn fetch_content(&self, id: &str) -> Result<ContentItem> {
        if self.fail_fetch.iter().any(|failing| failing == id) {
            return Err(transport_error());
        }
        Ok(self
            .items
            .get(id)
            .cloned()
            .unwrap_or_else(|| ContentItem::Page(Page::absent(id))))
    }

    async fn fetch_attachment_data(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        self.attachment_data
            .get(&attachment.record.id)
            .cloned()
            .ok_or_else(transport_error_for_attachment)
    }

    async fn space_permissions(&self, space_key: &str, _username: &str) -> Result<Vec<String>> {
        if self.fail_permissions {
            return Err(transport_error());
        }
        Ok(self.permissions.get(space_key).cloned().unwrap_or_default())
    }
}

fn transport_error_for_attachment() -> AppError {
    AppError::remote("test", "attachment data not scripted")
}
