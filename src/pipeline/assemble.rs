//! Document assembly.
//!
//! Converts a fetched content item into the record handed to the
//! ingestion sink. Assembly is pure: no I/O, no clock reads — the caller
//! supplies the indexing timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ContentItem;

/// Deny token representing "no default authority reachable".
///
/// Paired with the space-key allow token: a user may view a document iff
/// their authority record contains the document's space key.
pub const DENY_TOKEN: &str = "DEAD_AUTHORITY";

/// The ingestable form of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestableRecord {
    /// Remote document identifier
    pub id: String,

    /// Document URI presented to the index (the browser-facing URL)
    pub uri: String,

    /// Media type of the binary payload
    pub mime_type: String,

    /// Creation timestamp, when known
    pub created_at: Option<DateTime<Utc>>,

    /// Modification timestamp, when known
    pub modified_at: Option<DateTime<Utc>>,

    /// When this record was assembled for indexing
    pub indexed_at: DateTime<Utc>,

    /// Flattened scalar metadata, deterministically ordered
    pub metadata: BTreeMap<String, String>,

    /// Access tokens allowed to view the document
    pub allow_tokens: Vec<String>,

    /// Access tokens denied regardless of allow list
    pub deny_tokens: Vec<String>,

    /// Binary payload (UTF-8 body for pages, raw bytes for attachments)
    pub binary: Vec<u8>,
}

impl IngestableRecord {
    /// Byte length of the binary payload.
    pub fn size(&self) -> usize {
        self.binary.len()
    }
}

/// Assemble the ingestable record for an available content item.
pub fn assemble(item: &ContentItem, indexed_at: DateTime<Utc>) -> IngestableRecord {
    let record = item.record();

    let binary = match item {
        ContentItem::Page(page) => page
            .body
            .as_deref()
            .unwrap_or_default()
            .as_bytes()
            .to_vec(),
        ContentItem::Attachment(attachment) => attachment.content.clone().unwrap_or_default(),
    };

    let mut metadata = item.metadata();
    metadata.insert("size".to_string(), binary.len().to_string());

    IngestableRecord {
        id: record.id.clone(),
        uri: record.web_url.clone(),
        mime_type: record.media_type.clone(),
        created_at: record.created_at,
        modified_at: record.modified_at,
        indexed_at,
        metadata,
        allow_tokens: vec![record.space.clone()],
        deny_tokens: vec![DENY_TOKEN.to_string()],
        binary,
    }
}
