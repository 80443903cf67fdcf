use serde::{Deserialize, Serialize};

/// Categories the extraction prompt asks the model to prefer.
pub const RECEIPT_CATEGORIES: &[&str] = &[
    "Groceries",
    "Restaurants",
    "Department Store",
    "Taxi and Rideshare",
    "Food Delivery",
    "Airlines",
    "Entertainment",
    "Technology",
    "Hotels",
    "Office Supplies",
    "Gas Station",
    "Healthcare",
    "Other",
];

/// Structured fields read off a receipt image.
///
/// On failure every field is empty and `error` says why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub merchant_name: String,
    pub merchant_category: String,
    /// `YYYY-MM-DD` when the model could read it.
    pub date: String,
    /// Numeric string without currency symbols.
    pub amount: String,
    pub memo: String,
}

impl ReceiptFields {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// True when the category is one of [`RECEIPT_CATEGORIES`].
    pub fn has_known_category(&self) -> bool {
        RECEIPT_CATEGORIES.contains(&self.merchant_category.as_str())
    }
}
