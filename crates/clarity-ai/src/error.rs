use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chat completion returned no choices")]
    NoChoices,

    #[error("malformed model output: {0}")]
    Malformed(String),

    #[error("every extraction stage returned an empty response")]
    EmptyResponse,
}
