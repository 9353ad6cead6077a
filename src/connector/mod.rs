// src/connector/mod.rs

//! Connector roles and their shared session lifecycle.

mod authority;
mod repository;
mod session;

pub use authority::{AuthorityConnector, VIEW_PERMISSION, lookup_user_spaces};
pub use repository::{
    ACTIVITY_READ, ActivityRecord, Interrupt, ProcessActivities, RepositoryConnector,
    VersionLookup, check_source, process_with,
};
