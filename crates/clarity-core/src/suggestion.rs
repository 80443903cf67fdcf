//! Cached policy-improvement suggestions and their freshness window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Version tag written with every stored suggestion.
pub const SUGGESTION_VERSION: &str = "1.0";

/// How long a stored suggestion is served without regenerating it.
pub const SUGGESTION_TTL_HOURS: i64 = 24;

/// A policy suggestion attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySuggestion {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl PolicySuggestion {
    pub fn new(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            timestamp,
            version: SUGGESTION_VERSION.to_string(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }

    /// Non-empty and younger than [`SUGGESTION_TTL_HOURS`].
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.content.is_empty() && self.age(now) < Duration::hours(SUGGESTION_TTL_HOURS)
    }
}

/// The suggestion to serve from cache, if any.
///
/// Returns `None` when the caller forces a refresh, when nothing is stored,
/// or when the stored record is empty or stale.
pub fn cached_suggestion(
    txn: &Transaction,
    now: DateTime<Utc>,
    force: bool,
) -> Option<&PolicySuggestion> {
    if force {
        return None;
    }
    txn.policy_suggestion.as_ref().filter(|s| s.is_fresh(now))
}
