//! Storage layer: flat JSON documents for transactions and policies.

mod cache;
mod document;
mod error;
mod store;

pub use cache::{CacheScope, ClearReport};
pub use document::JsonDocument;
pub use error::StoreError;
pub use store::{POLICIES_FILE, Removal, Store, TRANSACTIONS_FILE};
