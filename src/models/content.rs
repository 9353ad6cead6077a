//! Content item models.
//!
//! A fetched unit of content is either a wiki page or an attachment.
//! Items are parsed once from the raw JSON record, never mutated, and
//! discarded after a single gate/assembly pass.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Media type assumed for pages without an explicit one.
pub const DEFAULT_MEDIA_TYPE: &str = "text/html";

/// Canonical timestamp rendering used for version markers and metadata.
///
/// Locale-independent UTC seconds, e.g. `2020-01-01T00:00:00Z`. The gate's
/// string-equality comparison and the marker recorded at ingestion must go
/// through this one function.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn required_str(raw: &Value, key: &str) -> Result<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::parse(format!("content record missing field `{key}`")))
}

fn str_at(raw: &Value, pointer: &str) -> String {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn timestamp_at(raw: &Value, pointer: &str) -> Option<DateTime<Utc>> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

/// A wiki page fetched from the remote instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Stable remote identifier
    pub id: String,

    /// Key of the space the page belongs to
    pub space: String,

    /// Remote content type ("page", "attachment", ...)
    pub content_type: String,

    /// Page title
    pub title: String,

    /// REST self link
    pub url: String,

    /// Browser-facing URL (base + webui link)
    pub web_url: String,

    /// Creation timestamp, when the remote reports one
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification timestamp
    pub modified_at: Option<DateTime<Utc>>,

    /// Creator display name
    pub creator: String,

    /// Creator username
    pub creator_username: String,

    /// Last modifier display name
    pub last_modifier: String,

    /// Last modifier username
    pub last_modifier_username: String,

    /// Media type of the rendered body
    pub media_type: String,

    /// Remote version number, informational only
    pub version: i64,

    /// Rendered body HTML; `None` means the content is withdrawn or
    /// unreadable and the document must be deleted downstream
    pub body: Option<String>,
}

impl Page {
    /// Parse a page from a raw content record.
    ///
    /// `id`, `type` and `title` are required; every optional nested field
    /// (links, history, version, body) defaults to empty/absent.
    pub fn parse(raw: &Value) -> Result<Self> {
        let base = str_at(raw, "/_links/base");
        let webui = str_at(raw, "/_links/webui");

        Ok(Self {
            id: required_str(raw, "id")?,
            content_type: required_str(raw, "type")?,
            title: required_str(raw, "title")?,
            space: str_at(raw, "/space/key"),
            url: str_at(raw, "/_links/self"),
            web_url: format!("{base}{webui}"),
            created_at: timestamp_at(raw, "/history/createdDate"),
            modified_at: timestamp_at(raw, "/version/when"),
            creator: str_at(raw, "/history/createdBy/displayName"),
            creator_username: str_at(raw, "/history/createdBy/username"),
            last_modifier: str_at(raw, "/version/by/displayName"),
            last_modifier_username: str_at(raw, "/version/by/username"),
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            version: raw
                .pointer("/version/number")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            body: raw
                .pointer("/body/view/value")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Placeholder for a document the remote no longer serves.
    ///
    /// Carries the requested id and no body, so the version gate deletes it.
    pub fn absent(id: &str) -> Self {
        Self {
            id: id.to_string(),
            space: String::new(),
            content_type: String::new(),
            title: String::new(),
            url: String::new(),
            web_url: String::new(),
            created_at: None,
            modified_at: None,
            creator: String::new(),
            creator_username: String::new(),
            last_modifier: String::new(),
            last_modifier_username: String::new(),
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            version: 0,
            body: None,
        }
    }

    /// Canonical version marker for this page, if it has a modification
    /// timestamp.
    pub fn version_marker(&self) -> Option<String> {
        self.modified_at.as_ref().map(format_timestamp)
    }

    /// Flattened metadata map of the page's scalar fields.
    ///
    /// Sorted map so repeated assembly of the same page is byte-identical.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), self.id.clone());
        map.insert("type".to_string(), self.content_type.clone());
        map.insert("title".to_string(), self.title.clone());
        map.insert("space".to_string(), self.space.clone());
        map.insert("url".to_string(), self.url.clone());
        map.insert("web_url".to_string(), self.web_url.clone());
        map.insert(
            "createdDate".to_string(),
            self.created_at.as_ref().map(format_timestamp).unwrap_or_default(),
        );
        map.insert(
            "lastModified".to_string(),
            self.modified_at.as_ref().map(format_timestamp).unwrap_or_default(),
        );
        map.insert("mimetype".to_string(), self.media_type.clone());
        map.insert("version".to_string(), self.version.to_string());
        map.insert("creator".to_string(), self.creator.clone());
        map.insert("creatorUsername".to_string(), self.creator_username.clone());
        map.insert("lastModifier".to_string(), self.last_modifier.clone());
        map.insert(
            "lastModifierUsername".to_string(),
            self.last_modifier_username.clone(),
        );
        map
    }
}

/// An attachment: the common page record plus a download link and,
/// once fetched, the raw content bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Common content record
    pub record: Page,

    /// Server-relative download link
    pub download_url: String,

    /// Downloaded content bytes; `None` until fetched
    pub content: Option<Vec<u8>>,
}

impl Attachment {
    /// Parse an attachment from a raw content record.
    pub fn parse(raw: &Value) -> Result<Self> {
        let mut record = Page::parse(raw)?;
        let media_type = str_at(raw, "/extensions/mediaType");
        if !media_type.is_empty() {
            record.media_type = media_type;
        }

        Ok(Self {
            record,
            download_url: str_at(raw, "/_links/download"),
            content: None,
        })
    }

    /// Attachment with its downloaded content attached.
    pub fn with_content(mut self, content: Vec<u8>) -> Self {
        self.content = Some(content);
        self
    }

    /// Metadata map including the download link.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut map = self.record.metadata();
        map.insert("downloadUrl".to_string(), self.download_url.clone());
        map
    }
}

/// A fetched content item, dispatched on the remote `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentItem {
    Page(Page),
    Attachment(Attachment),
}

impl ContentItem {
    /// Parse a content item from a raw record, dispatching on `type`.
    pub fn parse(raw: &Value) -> Result<Self> {
        let content_type = raw.get("type").and_then(Value::as_str).unwrap_or("");
        if content_type == "attachment" {
            Ok(Self::Attachment(Attachment::parse(raw)?))
        } else {
            Ok(Self::Page(Page::parse(raw)?))
        }
    }

    /// The common content record.
    pub fn record(&self) -> &Page {
        match self {
            Self::Page(page) => page,
            Self::Attachment(attachment) => &attachment.record,
        }
    }

    /// Remote identifier.
    pub fn id(&self) -> &str {
        &self.record().id
    }

    /// Whether the item carries ingestable content.
    ///
    /// A page is available iff it has a body; an attachment iff its content
    /// was fetched or it still offers a download link.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Page(page) => page.body.is_some(),
            Self::Attachment(attachment) => {
                attachment.content.is_some() || !attachment.download_url.is_empty()
            }
        }
    }

    /// Flattened metadata for the item.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        match self {
            Self::Page(page) => page.metadata(),
            Self::Attachment(attachment) => attachment.metadata(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_page_json() -> Value {
        json!({
            "id": "42",
            "type": "page",
            "title": "Release Notes",
            "space": { "key": "ENG" },
            "_links": {
                "self": "http://wiki.example.com/rest/api/content/42",
                "base": "http://wiki.example.com",
                "webui": "/display/ENG/Release+Notes"
            },
            "history": {
                "createdDate": "2019-12-01T08:30:00.000Z",
                "createdBy": { "displayName": "Ada Lovelace", "username": "ada" }
            },
            "version": {
                "when": "2020-01-01T00:00:00.000Z",
                "number": 7,
                "by": { "displayName": "Grace Hopper", "username": "grace" }
            },
            "body": { "view": { "value": "<p>hello</p>" } }
        })
    }

    #[test]
    fn test_parse_page() {
        let page = Page::parse(&sample_page_json()).unwrap();

        assert_eq!(page.id, "42");
        assert_eq!(page.space, "ENG");
        assert_eq!(page.title, "Release Notes");
        assert_eq!(
            page.web_url,
            "http://wiki.example.com/display/ENG/Release+Notes"
        );
        assert_eq!(page.creator, "Ada Lovelace");
        assert_eq!(page.last_modifier_username, "grace");
        assert_eq!(page.version, 7);
        assert_eq!(page.body.as_deref(), Some("<p>hello</p>"));
    }

    #[test]
    fn test_parse_page_missing_id() {
        let raw = json!({ "type": "page", "title": "No id" });
        let err = Page::parse(&raw).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_parse_page_optional_fields_default() {
        let raw = json!({ "id": "7", "type": "page", "title": "Bare" });
        let page = Page::parse(&raw).unwrap();

        assert_eq!(page.space, "");
        assert_eq!(page.web_url, "");
        assert!(page.created_at.is_none());
        assert!(page.modified_at.is_none());
        assert!(page.body.is_none());
        assert_eq!(page.media_type, DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_version_marker_format() {
        let page = Page::parse(&sample_page_json()).unwrap();
        assert_eq!(
            page.version_marker().unwrap(),
            "2020-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_metadata_map() {
        let page = Page::parse(&sample_page_json()).unwrap();
        let metadata = page.metadata();

        assert_eq!(metadata["id"], "42");
        assert_eq!(metadata["space"], "ENG");
        assert_eq!(metadata["lastModified"], "2020-01-01T00:00:00Z");
        assert_eq!(metadata["createdDate"], "2019-12-01T08:30:00Z");
        assert_eq!(metadata["version"], "7");
        assert_eq!(metadata["creatorUsername"], "ada");
    }

    #[test]
    fn test_parse_attachment() {
        let mut raw = sample_page_json();
        raw["type"] = json!("attachment");
        raw["_links"]["download"] = json!("/download/attachments/42/report.pdf");
        raw["extensions"] = json!({ "mediaType": "application/pdf" });

        let item = ContentItem::parse(&raw).unwrap();
        let ContentItem::Attachment(attachment) = &item else {
            panic!("expected attachment variant");
        };

        assert_eq!(attachment.download_url, "/download/attachments/42/report.pdf");
        assert_eq!(attachment.record.media_type, "application/pdf");
        assert_eq!(attachment.metadata()["downloadUrl"], attachment.download_url);
        assert!(item.is_available());
    }

    #[test]
    fn test_availability() {
        let page = Page::parse(&sample_page_json()).unwrap();
        assert!(ContentItem::Page(page).is_available());

        let absent = ContentItem::Page(Page::absent("42"));
        assert!(!absent.is_available());

        let mut raw = sample_page_json();
        raw["type"] = json!("attachment");
        let attachment = Attachment::parse(&raw).unwrap();
        // No download link and no content yet.
        assert!(!ContentItem::Attachment(attachment.clone()).is_available());

        let fetched = attachment.with_content(b"bytes".to_vec());
        assert!(ContentItem::Attachment(fetched).is_available());
    }
}
