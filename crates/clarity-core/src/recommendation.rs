use serde::{Deserialize, Serialize};

use crate::status::{ApprovalStatus, PolicyStatus};

/// Reason attached when no chat-model credential is configured.
pub const REASON_NOT_CONFIGURED: &str = "API key not configured - defaulting to pending";

/// Reason attached when the model call fails or returns malformed content.
pub const REASON_PROCESSING_ERROR: &str = "Error processing approval - requires manual review";

/// An approval recommendation for a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub approved: bool,
    pub policy_status: PolicyStatus,
    pub approval_status: ApprovalStatus,
    pub reason: String,
}

impl Recommendation {
    /// Safe default used when no credential is configured.
    pub fn not_configured() -> Self {
        Self::manual_review(REASON_NOT_CONFIGURED)
    }

    /// Safe default used when the upstream call fails.
    pub fn processing_error() -> Self {
        Self::manual_review(REASON_PROCESSING_ERROR)
    }

    /// "Pending / Needs review" with the given reason.
    ///
    /// `approved` stays `true` so existing clients keep treating the row as
    /// actionable; the pending status is what routes it to a reviewer.
    fn manual_review(reason: &str) -> Self {
        Self {
            approved: true,
            policy_status: PolicyStatus::NeedsReview,
            approval_status: ApprovalStatus::Pending,
            reason: reason.to_string(),
        }
    }
}
