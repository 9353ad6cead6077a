//! Repository connector role.
//!
//! Drives one crawl cycle against the host framework's contracts: seed
//! every visible document id, then fetch, gate and ingest/retain/delete
//! each document the host hands back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::connector::session::Session;
use crate::error::{AppError, Result};
use crate::models::{Config, ContentItem};
use crate::pipeline::{
    ConnectorError, ConnectorResult, Decision, IngestableRecord, SeedSink, assemble, classify,
    decide, enumerate_seeds,
};
use crate::services::ContentSource;

/// Activity label recorded for document reads.
pub const ACTIVITY_READ: &str = "read document";

/// Cooperative cancellation handle.
///
/// Observed between blocking calls; once set, the current operation is
/// abandoned and the Interrupted outcome propagates without retry.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Looks up the version marker the host has stored for a document.
pub trait VersionLookup: Sync {
    fn stored_marker(&self, id: &str) -> Option<String>;
}

/// One recorded read activity.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub id: String,
    pub activity: &'static str,
    pub outcome: &'static str,
    pub size: Option<usize>,
}

/// Host-facing processing callbacks for one crawl batch.
///
/// Exactly one of `ingest`/`retain`/`delete` is called per processed
/// document. `retain` matters: a document that is neither retained nor
/// ingested is deleted by the host framework.
#[async_trait]
pub trait ProcessActivities: Send {
    /// Ingest the record under the given version marker.
    async fn ingest(&mut self, id: &str, marker: &str, record: IngestableRecord) -> Result<()>;

    /// Keep the previously indexed document as-is.
    async fn retain(&mut self, id: &str) -> Result<()>;

    /// Remove the document from the index.
    async fn delete(&mut self, id: &str) -> Result<()>;

    /// Record a read activity for reporting.
    fn record_activity(&mut self, _activity: ActivityRecord) {}
}

/// Repository connector instance.
pub struct RepositoryConnector {
    session: Session,
}

impl RepositoryConnector {
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
        match self.session.acquire() {
            Ok(client) => check_source(client.as_ref()).await,
            Err(err) => format!("Connection failed: {err}"),
        }
    }

    /// Seed every document id visible through the listing.
    ///
    /// The previous cycle marker is ignored and the returned marker is
    /// always empty: each cycle re-lists from the start.
    pub async fn add_seeds(
        &mut self,
        space: Option<&str>,
        _last_cycle_marker: Option<&str>,
        sink: &mut dyn SeedSink,
    ) -> ConnectorResult<String> {
        let client = self.session.acquire().map_err(ConnectorError::Fatal)?;
        enumerate_seeds(client.as_ref(), space, sink).await
    }

    /// Process a batch of seeded documents.
    pub async fn process_documents(
        &mut self,
        ids: &[String],
        versions: &dyn VersionLookup,
        activities: &mut dyn ProcessActivities,
        interrupt: &Interrupt,
    ) -> ConnectorResult<()> {
        let client = self.session.acquire().map_err(ConnectorError::Fatal)?;
        process_with(client.as_ref(), ids, versions, activities, interrupt).await
    }
}

/// Connectivity check against an arbitrary source. Never errors.
pub async fn check_source(source: &dyn ContentSource) -> String {
    match source.check_reachable().await {
        Ok(()) => "Connection working".to_string(),
        Err(AppError::Interrupted(cause)) => format!("Connection temporarily failed: {cause}"),
        Err(err) => format!("Connection failed: {err}"),
    }
}

/// Process each document in the batch against the given source.
pub async fn process_with(
    source: &dyn ContentSource,
    ids: &[String],
    versions: &dyn VersionLookup,
    activities: &mut dyn ProcessActivities,
    interrupt: &Interrupt,
) -> ConnectorResult<()> {
    for id in ids {
        if interrupt.is_requested() {
            return Err(ConnectorError::Interrupted(
                "stop requested during document processing".to_string(),
            ));
        }

        log::debug!("Processing document identifier '{id}'");
        let stored = versions.stored_marker(id);

        match process_one(source, id, stored.as_deref(), activities).await {
            Ok(activity) => activities.record_activity(activity),
            Err(err) => {
                activities.record_activity(ActivityRecord {
                    id: id.clone(),
                    activity: ACTIVITY_READ,
                    outcome: "FAILED",
                    size: None,
                });
                return Err(err);
            }
        }
    }
    Ok(())
}

async fn process_one(
    source: &dyn ContentSource,
    id: &str,
    stored_marker: Option<&str>,
    activities: &mut dyn ProcessActivities,
) -> ConnectorResult<ActivityRecord> {
    let item = source
        .fetch_content(id)
        .await
        .map_err(|err| classify(err, "document fetch"))?;

    // A transient fetch failure never reaches this point; only a document
    // the remote genuinely no longer serves can be deleted.
    match decide(&item, stored_marker) {
        Decision::Delete => {
            activities
                .delete(id)
                .await
                .map_err(|err| classify(err, "deletion"))?;
            Ok(activity(id, "DELETED", None))
        }
        Decision::Retain => {
            activities
                .retain(id)
                .await
                .map_err(|err| classify(err, "retention"))?;
            Ok(activity(id, "RETAINED", None))
        }
        Decision::Ingest { marker } => {
            let item = fetch_attachment_content(source, item).await?;
            let record = assemble(&item, Utc::now());
            let size = record.size();
            activities
                .ingest(id, &marker, record)
                .await
                .map_err(|err| classify(err, "ingestion"))?;
            Ok(activity(id, "OK", Some(size)))
        }
    }
}

/// Download attachment bytes when the item still lacks them.
async fn fetch_attachment_content(
    source: &dyn ContentSource,
    item: ContentItem,
) -> ConnectorResult<ContentItem> {
    match item {
        ContentItem::Attachment(attachment)
            if attachment.content.is_none() && !attachment.download_url.is_empty() =>
        {
            let data = source
                .fetch_attachment_data(&attachment)
                .await
                .map_err(|err| classify(err, "attachment download"))?;
            Ok(ContentItem::Attachment(attachment.with_content(data)))
        }
        item => Ok(item),
    }
}

fn activity(id: &str, outcome: &'static str, size: Option<usize>) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        activity: ACTIVITY_READ,
        outcome,
        size,
    }
}
