//! Bundles the three AI clients behind one shared HTTP client.

use crate::approval::{ApprovalAdvisor, DEFAULT_APPROVAL_MODEL};
use crate::chat::{ChatClient, DEFAULT_BASE_URL};
use crate::receipt::{
    DEFAULT_RECEIPT_FALLBACK_MODEL, DEFAULT_RECEIPT_MODEL, ReceiptExtractor, default_stages,
};
use crate::suggestion::SuggestionClient;

/// Upstream endpoints, credentials and model names.
///
/// A `None` credential or webhook leaves that capability in its safe
/// fallback mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub approval_model: String,
    pub receipt_model: String,
    pub receipt_fallback_model: String,
    pub webhook_url: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            approval_model: DEFAULT_APPROVAL_MODEL.to_string(),
            receipt_model: DEFAULT_RECEIPT_MODEL.to_string(),
            receipt_fallback_model: DEFAULT_RECEIPT_FALLBACK_MODEL.to_string(),
            webhook_url: None,
        }
    }
}

#[derive(Clone)]
pub struct AiGateway {
    pub approvals: ApprovalAdvisor,
    pub suggestions: SuggestionClient,
    pub receipts: ReceiptExtractor,
}

impl AiGateway {
    pub fn new(settings: &AiSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: &AiSettings) -> Self {
        let chat = settings
            .api_key
            .as_ref()
            .map(|key| ChatClient::new(client.clone(), &settings.base_url, key.clone()));

        Self {
            approvals: ApprovalAdvisor::new(chat.clone(), settings.approval_model.clone()),
            suggestions: SuggestionClient::new(client, settings.webhook_url.clone()),
            receipts: ReceiptExtractor::new(
                chat,
                default_stages(&settings.receipt_model, &settings.receipt_fallback_model),
            ),
        }
    }
}
