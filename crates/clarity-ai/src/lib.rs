//! AI gateway: approval recommendations and receipt extraction over an
//! OpenAI-compatible chat API, policy suggestions over a webhook.

pub mod approval;
pub mod chat;
mod error;
mod gateway;
#[cfg(test)]
mod mock;
pub mod prompt;
pub mod receipt;
pub mod suggestion;

pub use approval::{ApprovalAdvisor, parse_recommendation};
pub use chat::{ChatClient, ChatRequest, TokenLimit};
pub use error::AiError;
pub use gateway::{AiGateway, AiSettings};
pub use receipt::{ExtractionStage, ReceiptExtractor, data_url, default_stages};
pub use suggestion::{Suggestion, SuggestionClient, SuggestionOrigin};
