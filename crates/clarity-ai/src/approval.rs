//! Approval recommendation from the chat model.

use clarity_core::{ApprovalStatus, PolicyDocument, PolicyStatus, Recommendation, Transaction};
use serde::Deserialize;
use tracing::{info, warn};

use crate::AiError;
use crate::chat::{ChatClient, ChatRequest};
use crate::prompt;

/// Default model for approval recommendations.
pub const DEFAULT_APPROVAL_MODEL: &str = "gpt-5";

/// Produces approval recommendations. Never fails: missing credentials and
/// upstream errors both degrade to a manual-review recommendation.
#[derive(Clone)]
pub struct ApprovalAdvisor {
    chat: Option<ChatClient>,
    model: String,
}

impl ApprovalAdvisor {
    pub fn new(chat: Option<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            chat,
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.chat.is_some()
    }

    pub async fn recommend(&self, txn: &Transaction, policies: &PolicyDocument) -> Recommendation {
        let Some(chat) = &self.chat else {
            info!(id = %txn.id, "no chat credential; recommending manual review");
            return Recommendation::not_configured();
        };

        match self.ask(chat, txn, policies).await {
            Ok(rec) => {
                info!(
                    id = %txn.id,
                    policy_status = %rec.policy_status,
                    approval_status = %rec.approval_status,
                    "approval recommendation"
                );
                rec
            }
            Err(e) => {
                warn!(id = %txn.id, error = %e, "approval recommendation failed");
                Recommendation::processing_error()
            }
        }
    }

    async fn ask(
        &self,
        chat: &ChatClient,
        txn: &Transaction,
        policies: &PolicyDocument,
    ) -> Result<Recommendation, AiError> {
        let prompt = prompt::approval_prompt(txn, policies);
        let content = chat
            .complete(&ChatRequest::text(&self.model, &prompt).json())
            .await?;
        parse_recommendation(&content)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    approved: Option<bool>,
    policy_status: String,
    approval_status: String,
    #[serde(default)]
    reason: String,
}

/// Parse the model's JSON answer. Status labels must be recognised; a
/// missing `approved` follows the approval status.
pub fn parse_recommendation(content: &str) -> Result<Recommendation, AiError> {
    let raw: RawRecommendation = serde_json::from_str(content.trim())?;
    let policy_status = PolicyStatus::from_label(&raw.policy_status)
        .ok_or_else(|| AiError::Malformed(format!("policy status {:?}", raw.policy_status)))?;
    let approval_status = ApprovalStatus::from_label(&raw.approval_status)
        .ok_or_else(|| AiError::Malformed(format!("approval status {:?}", raw.approval_status)))?;

    Ok(Recommendation {
        approved: raw
            .approved
            .unwrap_or(approval_status == ApprovalStatus::Approved),
        policy_status,
        approval_status,
        reason: raw.reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::spawn_chat_mock;
    use clarity_core::recommendation::{REASON_NOT_CONFIGURED, REASON_PROCESSING_ERROR};
    use serde_json::json;

    fn txn() -> Transaction {
        Transaction {
            id: "t1".into(),
            merchant_name: "Acme".into(),
            amount: "10.00".into(),
            date: "2024-01-01".into(),
            memo: "lunch".into(),
            ..Transaction::default()
        }
    }

    #[test]
    fn parses_well_formed_answer() {
        let rec = parse_recommendation(
            r#"{"approved": false, "policyStatus": "Out of policy", "approvalStatus": "Rejected", "reason": "Over the cap"}"#,
        )
        .unwrap();
        assert!(!rec.approved);
        assert_eq!(rec.policy_status, PolicyStatus::OutOfPolicy);
        assert_eq!(rec.approval_status, ApprovalStatus::Rejected);
        assert_eq!(rec.reason, "Over the cap");
    }

    #[test]
    fn missing_approved_follows_status() {
        let rec = parse_recommendation(
            r#"{"policyStatus": "In policy", "approvalStatus": "Approved", "reason": "ok"}"#,
        )
        .unwrap();
        assert!(rec.approved);
    }

    #[test]
    fn unknown_label_is_malformed() {
        let err = parse_recommendation(
            r#"{"approved": true, "policyStatus": "Fine", "approvalStatus": "Approved", "reason": ""}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(matches!(parse_recommendation("Approved!"), Err(AiError::Json(_))));
    }

    #[tokio::test]
    async fn unconfigured_advisor_recommends_review() {
        let advisor = ApprovalAdvisor::new(None, DEFAULT_APPROVAL_MODEL);
        let rec = advisor.recommend(&txn(), &PolicyDocument::default()).await;
        assert_eq!(rec.approval_status, ApprovalStatus::Pending);
        assert_eq!(rec.reason, REASON_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn model_answer_is_used() {
        let mock = spawn_chat_mock(|_| {
            Some(json!(
                r#"{"approved": true, "policyStatus": "In policy", "approvalStatus": "Approved", "reason": "Within meal cap"}"#
            ))
        })
        .await;
        let advisor = ApprovalAdvisor::new(Some(mock.client()), "gpt-5");
        let rec = advisor.recommend(&txn(), &PolicyDocument::default()).await;

        assert_eq!(rec.policy_status, PolicyStatus::InPolicy);
        assert_eq!(rec.reason, "Within meal cap");
        let sent = &mock.requests()[0];
        assert_eq!(sent["model"], "gpt-5");
        assert_eq!(sent["response_format"]["type"], "json_object");
        assert!(sent["messages"][0]["content"].as_str().unwrap().contains("- Memo: lunch"));
    }

    #[tokio::test]
    async fn upstream_failure_recommends_review_without_retry() {
        let mock = spawn_chat_mock(|_| None).await;
        let advisor = ApprovalAdvisor::new(Some(mock.client()), "gpt-5");
        let rec = advisor.recommend(&txn(), &PolicyDocument::default()).await;

        assert_eq!(rec.reason, REASON_PROCESSING_ERROR);
        assert_eq!(rec.policy_status, PolicyStatus::NeedsReview);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn garbage_content_recommends_review() {
        let mock = spawn_chat_mock(|_| Some(json!("I think it's fine"))).await;
        let advisor = ApprovalAdvisor::new(Some(mock.client()), "gpt-5");
        let rec = advisor.recommend(&txn(), &PolicyDocument::default()).await;
        assert_eq!(rec.reason, REASON_PROCESSING_ERROR);
    }
}
