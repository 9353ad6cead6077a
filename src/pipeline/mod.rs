// src/pipeline/mod.rs

//! Crawl/sync pipeline stages.

mod assemble;
mod interruption;
mod seed;
mod version;

pub use assemble::{DENY_TOKEN, IngestableRecord, assemble};
pub use interruption::{
    ConnectorError, ConnectorResult, FAIL_INTERVAL_SECS, IO_RETRY_LIMIT, RETRY_INTERVAL_SECS,
    ServiceInterruption, UNLIMITED_RETRIES, classify, classify_seeding,
};
pub use seed::{SEED_PAGE_SIZE, SeedSink, enumerate_seeds};
pub use version::{Decision, decide};
