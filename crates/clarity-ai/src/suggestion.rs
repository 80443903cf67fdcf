//! HTTP client for the policy-suggestion webhook.

use clarity_core::{PolicyDocument, Transaction};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::AiError;
use crate::prompt;

/// Returned when no webhook URL is configured.
pub const SUGGESTION_NOT_CONFIGURED: &str = "Policy suggestion webhook not configured";

/// Returned when the webhook call fails.
pub const SUGGESTION_FAILED: &str = "Error generating policy suggestion";

/// Where a suggestion's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOrigin {
    Remote,
    NotConfigured,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub origin: SuggestionOrigin,
}

impl Suggestion {
    fn fallback(origin: SuggestionOrigin) -> Self {
        let text = match origin {
            SuggestionOrigin::NotConfigured => SUGGESTION_NOT_CONFIGURED,
            _ => SUGGESTION_FAILED,
        };
        Self {
            text: text.to_string(),
            origin,
        }
    }

    /// Only webhook answers are worth caching; fallback strings are not.
    pub fn is_cacheable(&self) -> bool {
        self.origin == SuggestionOrigin::Remote
    }
}

/// Client for the suggestion webhook.
#[derive(Clone)]
pub struct SuggestionClient {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl SuggestionClient {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Ask for policy-improvement suggestions. Never fails.
    pub async fn suggest(
        &self,
        transactions: &[Transaction],
        policies: &PolicyDocument,
        focus: Option<&Transaction>,
    ) -> Suggestion {
        let Some(url) = &self.webhook_url else {
            info!("no suggestion webhook configured");
            return Suggestion::fallback(SuggestionOrigin::NotConfigured);
        };

        let message = prompt::suggestion_prompt(transactions, policies, focus);
        info!(url = %url, focus = ?focus.map(|t| &t.id), "requesting policy suggestion");
        match self.post(url, &message).await {
            Ok(text) => Suggestion {
                text,
                origin: SuggestionOrigin::Remote,
            },
            Err(e) => {
                warn!(error = %e, "policy suggestion failed");
                Suggestion::fallback(SuggestionOrigin::Failed)
            }
        }
    }

    async fn post(&self, url: &str, message: &str) -> Result<String, AiError> {
        let resp = self
            .client
            .post(url)
            .json(&json!({ "message": message }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        Ok(unwrap_body(body))
    }
}

/// A JSON string body is unwrapped; anything else is kept as raw text.
fn unwrap_body(body: String) -> String {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::String(text)) => text,
        _ => body,
    }
}
