//! Card transactions as stored in `transactions.json` and exchanged with clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::recommendation::Recommendation;
use crate::status::{self, ApprovalStatus, PolicyStatus};
use crate::suggestion::PolicySuggestion;

/// Client-side flag set while an analysis is in flight. Dropped once a
/// recommendation is merged.
pub const ANALYZING_FLAG: &str = "isAnalyzing";

/// A card transaction, or a group owner row representing a submitter.
///
/// Fields the server does not know about (receipt thumbnails, client flags)
/// are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub group_owner: bool,
    /// Id of the owner row this transaction belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Submitter name supplied on creation; resolved to a `group_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_initials: Option<String>,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub merchant_category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default, deserialize_with = "status::lenient", skip_serializing_if = "Option::is_none")]
    pub policy_status: Option<PolicyStatus>,
    #[serde(default, deserialize_with = "status::lenient", skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_suggestion: Option<PolicySuggestion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Fresh server-side id.
    pub fn generate_id() -> String {
        format!("txn-{}", uuid::Uuid::new_v4().simple())
    }

    /// Assign a generated id when the client did not supply one.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = Self::generate_id();
        }
    }

    /// Merge an approval recommendation and clear the in-flight flag.
    pub fn apply_recommendation(&mut self, rec: &Recommendation) {
        self.policy_status = Some(rec.policy_status);
        self.approval_status = Some(rec.approval_status);
        self.approval_reason = Some(rec.reason.clone());
        self.extra.remove(ANALYZING_FLAG);
    }

    /// True for line items, false for group owner rows.
    pub fn is_member(&self) -> bool {
        !self.group_owner
    }

    /// Category for prompts and listings, `N/A` when blank.
    pub fn category_or_na(&self) -> &str {
        if self.merchant_category.trim().is_empty() {
            "N/A"
        } else {
            &self.merchant_category
        }
    }
}

/// Up to two uppercase initials from a display name ("Angela Martin" -> "AM").
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_body_deserializes_with_defaults() {
        let json = r#"{"merchantName": "Acme", "amount": "10.00", "date": "2024-01-01", "memo": "lunch"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert!(txn.id.is_empty());
        assert!(!txn.group_owner);
        assert_eq!(txn.merchant_name, "Acme");
        assert!(txn.merchant_category.is_empty());
        assert!(txn.policy_status.is_none());
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let json = r#"{
            "id": "2",
            "merchantName": "Uluh",
            "receiptThumbUrl": "/public/vite.svg",
            "policyStatus": "In policy",
            "approvalStatus": "Pending"
        }"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.extra["receiptThumbUrl"], "/public/vite.svg");
        let back = serde_json::to_value(&txn).unwrap();
        assert_eq!(back["receiptThumbUrl"], "/public/vite.svg");
        assert_eq!(back["policyStatus"], "In policy");
        assert!(back.get("groupOwner").is_none());
    }

    #[test]
    fn status_labels_load_leniently() {
        let json = r#"{"id": "t1", "policyStatus": "Needs Review", "approvalStatus": "Escalated"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.policy_status, Some(PolicyStatus::NeedsReview));
        assert!(txn.approval_status.is_none());

        let back = serde_json::to_value(&txn).unwrap();
        assert_eq!(back["policyStatus"], "Needs review");
        assert!(back.get("approvalStatus").is_none());
    }

    #[test]
    fn ensure_id_keeps_client_id() {
        let mut txn: Transaction = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        txn.ensure_id();
        assert_eq!(txn.id, "abc");

        let mut blank: Transaction = serde_json::from_str("{}").unwrap();
        blank.ensure_id();
        assert!(blank.id.starts_with("txn-"));
    }

    #[test]
    fn apply_recommendation_clears_analyzing_flag() {
        let json = r#"{"id": "t1", "isAnalyzing": true, "policyStatus": "Analyzing...", "approvalStatus": "Analyzing..."}"#;
        let mut txn: Transaction = serde_json::from_str(json).unwrap();
        txn.apply_recommendation(&Recommendation::not_configured());
        assert!(!txn.extra.contains_key(ANALYZING_FLAG));
        assert_eq!(txn.policy_status, Some(PolicyStatus::NeedsReview));
        assert_eq!(txn.approval_status, Some(ApprovalStatus::Pending));
        assert!(txn.approval_reason.unwrap().contains("not configured"));
    }

    #[test]
    fn category_falls_back_to_na() {
        let txn: Transaction = serde_json::from_str(r#"{"merchantCategory": "  "}"#).unwrap();
        assert_eq!(txn.category_or_na(), "N/A");
    }

    #[test]
    fn initials_from_name() {
        assert_eq!(initials("Angela Martin"), "AM");
        assert_eq!(initials("N.Y. Grill & Deli"), "NG");
        assert_eq!(initials("lyft"), "L");
        assert_eq!(initials(""), "");
    }
}
