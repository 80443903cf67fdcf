//! Receipt image extraction with an ordered model fallback.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clarity_core::ReceiptFields;
use serde_json::Value;
use tracing::{info, warn};

use crate::AiError;
use crate::chat::{ChatClient, ChatRequest, TokenLimit};
use crate::prompt;

pub const DEFAULT_RECEIPT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_RECEIPT_FALLBACK_MODEL: &str = "gpt-4o";

/// Output budget for each extraction call.
pub const RECEIPT_TOKEN_BUDGET: u32 = 500;

pub const RECEIPT_NOT_CONFIGURED: &str = "Chat model API key not configured";
pub const RECEIPT_FAILED: &str = "Failed to parse receipt";

/// One (model, token-limit) attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionStage {
    pub model: String,
    pub token_limit: TokenLimit,
}

/// Primary then fallback, each with the token field its model accepts.
pub fn default_stages(primary: &str, fallback: &str) -> Vec<ExtractionStage> {
    vec![
        ExtractionStage {
            model: primary.to_string(),
            token_limit: TokenLimit::MaxCompletionTokens(RECEIPT_TOKEN_BUDGET),
        },
        ExtractionStage {
            model: fallback.to_string(),
            token_limit: TokenLimit::MaxTokens(RECEIPT_TOKEN_BUDGET),
        },
    ]
}

/// `data:<mime>;base64,<bytes>`
pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads receipt images into [`ReceiptFields`].
#[derive(Clone)]
pub struct ReceiptExtractor {
    chat: Option<ChatClient>,
    stages: Vec<ExtractionStage>,
}

impl ReceiptExtractor {
    pub fn new(chat: Option<ChatClient>, stages: Vec<ExtractionStage>) -> Self {
        Self { chat, stages }
    }

    pub fn stages(&self) -> &[ExtractionStage] {
        &self.stages
    }

    /// Extract fields from an image. Always returns a well-shaped record;
    /// failures carry `error`.
    pub async fn extract(&self, bytes: &[u8], mime: &str) -> ReceiptFields {
        let Some(chat) = &self.chat else {
            info!("no chat credential; skipping receipt extraction");
            return ReceiptFields::failed(RECEIPT_NOT_CONFIGURED);
        };

        let image = data_url(bytes, mime);
        match self.run_stages(chat, &image).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, mime, size = bytes.len(), "receipt extraction failed");
                ReceiptFields::failed(RECEIPT_FAILED)
            }
        }
    }

    async fn run_stages(&self, chat: &ChatClient, image: &str) -> Result<ReceiptFields, AiError> {
        let prompt = prompt::receipt_prompt();
        for stage in &self.stages {
            let req = ChatRequest::text(&stage.model, &prompt)
                .with_image(image)
                .json()
                .with_token_limit(stage.token_limit);
            let content = chat.complete(&req).await?;
            if content.trim().is_empty() {
                info!(model = %stage.model, "empty extraction response; trying next stage");
                continue;
            }
            info!(model = %stage.model, "receipt extracted");
            return parse_receipt_fields(&content);
        }
        Err(AiError::EmptyResponse)
    }
}

/// Parse the model's JSON answer. Numbers become strings; missing or null
/// fields become empty.
pub fn parse_receipt_fields(content: &str) -> Result<ReceiptFields, AiError> {
    let value: Value = serde_json::from_str(content.trim())?;
    let Value::Object(map) = value else {
        return Err(AiError::Malformed("receipt answer is not an object".into()));
    };
    let field = |key: &str| match map.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };

    Ok(ReceiptFields {
        error: None,
        merchant_name: field("merchantName"),
        merchant_category: field("merchantCategory"),
        date: field("date"),
        amount: field("amount"),
        memo: field("memo"),
    })
}
