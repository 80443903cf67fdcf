//! Review status labels shared by the store, the AI gateway and the wire format.
//!
//! The serialized form is the human-readable label the web client renders
//! ("In policy", "Pending", ...). Both the ASCII and the Unicode ellipsis
//! spellings of the transient "Analyzing" state are accepted on input, and
//! labels are matched regardless of case ("Needs Review" reads as
//! [`PolicyStatus::NeedsReview`]).

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A status enum with a canonical label per variant.
pub trait StatusLabel: Sized {
    /// Field name used in log lines.
    const KIND: &'static str;
    /// Canonical labels, in declaration order.
    const LABELS: &'static [&'static str];

    fn from_label(label: &str) -> Option<Self>;
}

fn deserialize_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: StatusLabel,
{
    let label = String::deserialize(deserializer)?;
    T::from_label(&label).ok_or_else(|| de::Error::unknown_variant(&label, T::LABELS))
}

/// `deserialize_with` helper for optional status fields on stored rows.
///
/// Unknown labels and non-string values become `None` with a warning so a
/// single odd row never makes the whole document unreadable.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: StatusLabel,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(label)) => {
            let status = T::from_label(&label);
            if status.is_none() {
                warn!(kind = T::KIND, label = %label, "dropping unknown status label");
            }
            status
        }
        Some(other) => {
            warn!(kind = T::KIND, value = %other, "dropping non-string status");
            None
        }
    })
}

/// Whether a transaction conforms to the company policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PolicyStatus {
    #[serde(rename = "In policy")]
    InPolicy,
    #[serde(rename = "Out of policy")]
    OutOfPolicy,
    #[serde(rename = "Needs review")]
    NeedsReview,
    /// Transient state shown while an analysis is in flight.
    #[serde(rename = "Analyzing...")]
    Analyzing,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPolicy => "In policy",
            Self::OutOfPolicy => "Out of policy",
            Self::NeedsReview => "Needs review",
            Self::Analyzing => "Analyzing...",
        }
    }

    /// Match a free-text label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match normalize_label(label).as_str() {
            "in policy" => Some(Self::InPolicy),
            "out of policy" => Some(Self::OutOfPolicy),
            "needs review" => Some(Self::NeedsReview),
            "analyzing" => Some(Self::Analyzing),
            _ => None,
        }
    }
}

impl StatusLabel for PolicyStatus {
    const KIND: &'static str = "policyStatus";
    const LABELS: &'static [&'static str] = &["In policy", "Out of policy", "Needs review", "Analyzing..."];

    fn from_label(label: &str) -> Option<Self> {
        Self::from_label(label)
    }
}

impl<'de> Deserialize<'de> for PolicyStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Rejected,
    /// Transient state shown while an analysis is in flight.
    #[serde(rename = "Analyzing...")]
    Analyzing,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::Analyzing => "Analyzing...",
        }
    }

    /// Match a free-text label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match normalize_label(label).as_str() {
            "approved" => Some(Self::Approved),
            "pending" => Some(Self::Pending),
            "rejected" => Some(Self::Rejected),
            "analyzing" => Some(Self::Analyzing),
            _ => None,
        }
    }
}

impl StatusLabel for ApprovalStatus {
    const KIND: &'static str = "approvalStatus";
    const LABELS: &'static [&'static str] = &["Approved", "Pending", "Rejected", "Analyzing..."];

    fn from_label(label: &str) -> Option<Self> {
        Self::from_label(label)
    }
}

impl<'de> Deserialize<'de> for ApprovalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, trim, and strip a trailing ellipsis in either spelling.
fn normalize_label(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    lower
        .trim_end_matches("...")
        .trim_end_matches('…')
        .trim_end()
        .to_string()
}
