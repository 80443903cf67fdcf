//! Clearing cached AI artifacts from stored transactions.
//!
//! Two artifacts are cached on a transaction: the approval reason from the
//! chat model and the policy suggestion from the webhook. Clearing them
//! makes the next request regenerate.

use clarity_core::Transaction;

/// Which cached artifacts to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheScope {
    pub approvals: bool,
    pub suggestions: bool,
}

impl CacheScope {
    pub fn all() -> Self {
        Self {
            approvals: true,
            suggestions: true,
        }
    }

    /// Build from CLI-style flags. No flag at all means everything.
    pub fn from_flags(approvals: bool, suggestions: bool) -> Self {
        if !approvals && !suggestions {
            Self::all()
        } else {
            Self {
                approvals,
                suggestions,
            }
        }
    }
}

/// Counts from a clearing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Transactions considered (1 when filtered by id).
    pub processed: usize,
    /// Transactions with at least one artifact cleared.
    pub cleared: usize,
    pub approvals_cleared: usize,
    pub suggestions_cleared: usize,
}

pub(crate) fn clear(txns: &mut [Transaction], scope: CacheScope, id: Option<&str>) -> ClearReport {
    let mut report = ClearReport {
        processed: if id.is_some() { 1 } else { txns.len() },
        ..ClearReport::default()
    };

    for txn in txns.iter_mut() {
        if id.is_some_and(|id| txn.id != id) {
            continue;
        }

        let mut cleared = false;
        if scope.approvals && txn.approval_reason.take().is_some() {
            report.approvals_cleared += 1;
            cleared = true;
        }
        if scope.suggestions && txn.policy_suggestion.take().is_some() {
            report.suggestions_cleared += 1;
            cleared = true;
        }
        if cleared {
            report.cleared += 1;
        }
    }

    report
}
