//! Sync-state persistence for the CLI.
//!
//! The host framework that normally embeds the connector owns its own
//! crawl database; this store only stands in for it so the binary can run
//! complete cycles. It keeps the per-document version markers and the
//! ingested records.
//!
//! ## Directory Structure
//!
//! ```text
//! state/
//! ├── markers.json          # id → stored version marker
//! └── docs/                 # One ingested record per document
//!     └── {id}.json
//! ```

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::connector::VersionLookup;
use crate::error::Result;
use crate::pipeline::IngestableRecord;

// Re-export for convenience
pub use local::LocalStateStore;

/// Per-document sync state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Stored version marker per document id
    pub markers: BTreeMap<String, String>,
}

impl SyncState {
    /// Stored marker for a document, if any.
    pub fn marker(&self, id: &str) -> Option<&str> {
        self.markers.get(id).map(String::as_str)
    }

    /// Record the marker a document was ingested under.
    pub fn set_marker(&mut self, id: &str, marker: &str) {
        self.markers.insert(id.to_string(), marker.to_string());
    }

    /// Forget a deleted document.
    pub fn remove(&mut self, id: &str) {
        self.markers.remove(id);
    }
}

impl VersionLookup for SyncState {
    fn stored_marker(&self, id: &str) -> Option<String> {
        self.marker(id).map(str::to_string)
    }
}

/// Trait for sync-state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the sync state, empty when none was saved yet.
    async fn load_state(&self) -> Result<SyncState>;

    /// Persist the sync state.
    async fn save_state(&self, state: &SyncState) -> Result<()>;

    /// Write one ingested record.
    async fn write_record(&self, record: &IngestableRecord) -> Result<()>;

    /// Remove the record of a deleted document.
    async fn remove_record(&self, id: &str) -> Result<()>;
}
