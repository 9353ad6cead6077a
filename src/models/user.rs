//! Authority lookup result model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of spaces a user may view.
///
/// Rebuilt on every lookup request; never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    /// User the record was resolved for
    pub username: String,

    /// Keys of the spaces where the user holds view permission
    pub spaces: BTreeSet<String>,
}

impl AuthorityRecord {
    pub fn new(username: impl Into<String>, spaces: BTreeSet<String>) -> Self {
        Self {
            username: username.into(),
            spaces,
        }
    }

    /// The deny-all record used when the lookup fails outward.
    pub fn deny_all(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            spaces: BTreeSet::new(),
        }
    }

    /// Whether the user may view documents in the given space.
    pub fn allows(&self, space_key: &str) -> bool {
        self.spaces.contains(space_key)
    }
}
