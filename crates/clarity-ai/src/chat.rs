//! Minimal client for an OpenAI-compatible chat-completion endpoint.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::AiError;

/// Public OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Output-token cap and the request field that carries it.
///
/// Newer models only accept `max_completion_tokens`; older ones only
/// `max_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimit {
    MaxCompletionTokens(u32),
    MaxTokens(u32),
}

impl TokenLimit {
    fn field(&self) -> (&'static str, u32) {
        match *self {
            Self::MaxCompletionTokens(n) => ("max_completion_tokens", n),
            Self::MaxTokens(n) => ("max_tokens", n),
        }
    }
}

/// A single-turn user request.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    /// Attached image, typically a `data:` URL.
    pub image_url: Option<&'a str>,
    /// Ask for a JSON object response.
    pub json_mode: bool,
    pub token_limit: Option<TokenLimit>,
}

impl<'a> ChatRequest<'a> {
    pub fn text(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            prompt,
            image_url: None,
            json_mode: false,
            token_limit: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn with_image(mut self, image_url: &'a str) -> Self {
        self.image_url = Some(image_url);
        self
    }

    pub fn with_token_limit(mut self, limit: TokenLimit) -> Self {
        self.token_limit = Some(limit);
        self
    }

    /// Request body in the chat-completions wire format.
    pub fn to_body(&self) -> Value {
        let content = match self.image_url {
            None => json!(self.prompt),
            Some(url) => json!([
                { "type": "text", "text": self.prompt },
                { "type": "image_url", "image_url": { "url": url } }
            ]),
        };

        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }],
        });
        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(limit) = self.token_limit {
            let (field, n) = limit.field();
            body[field] = json!(n);
        }
        body
    }
}

/// Chat-completion client bound to one credential.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// `base_url` should be like `https://api.openai.com/v1` (no trailing slash).
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Send `req` and return the first choice's content.
    ///
    /// A `null` content is returned as an empty string; deciding what an
    /// empty answer means is up to the caller.
    pub async fn complete(&self, req: &ChatRequest<'_>) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = req.model, image = req.image_url.is_some(), "chat completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req.to_body())
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

        let completion: CompletionResponse = resp.json().await?;
        let choice = completion.choices.into_iter().next().ok_or(AiError::NoChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}
