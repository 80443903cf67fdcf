pub mod amount;
pub mod grouping;
pub mod policy;
pub mod receipt;
pub mod recommendation;
pub mod status;
pub mod suggestion;
pub mod transaction;

pub use amount::{parse_amount, sum_amounts};
pub use grouping::{GroupView, Grouped, Placement};
pub use policy::{Policy, PolicyDocument, PolicyError, PolicyGroup};
pub use receipt::{RECEIPT_CATEGORIES, ReceiptFields};
pub use recommendation::Recommendation;
pub use status::{ApprovalStatus, PolicyStatus, StatusLabel};
pub use suggestion::{PolicySuggestion, cached_suggestion};
pub use transaction::Transaction;
