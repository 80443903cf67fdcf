//! The two Clarity documents: `transactions.json` and `policies.json`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clarity_core::grouping::{self, Placement};
use clarity_core::{PolicyDocument, Transaction};
use tracing::{debug, info};

use crate::StoreError;
use crate::cache::{CacheScope, ClearReport};
use crate::document::JsonDocument;

pub const TRANSACTIONS_FILE: &str = "transactions.json";
pub const POLICIES_FILE: &str = "policies.json";

/// Outcome of deleting a single transaction.
#[derive(Debug, Clone, Default)]
pub struct Removal {
    /// False when the id was not present.
    pub removed: bool,
    /// Members that lost their owner and were ungrouped.
    pub detached: Vec<Transaction>,
}

/// File-backed store for transactions and policies.
///
/// Each document has its own write lock; a mutation on one never waits for
/// the other.
pub struct Store {
    data_dir: PathBuf,
    transactions: JsonDocument<Vec<Transaction>>,
    policies: JsonDocument<PolicyDocument>,
}

impl Store {
    /// Open the store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|source| StoreError::Write {
            path: data_dir.to_path_buf(),
            source,
        })?;
        info!(data_dir = %data_dir.display(), "opened document store");
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            transactions: JsonDocument::with_normalizer(
                data_dir.join(TRANSACTIONS_FILE),
                link_legacy_groups,
            ),
            policies: JsonDocument::new(data_dir.join(POLICIES_FILE)),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ── Transactions ──

    /// All transactions in document order.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        self.transactions.load().await
    }

    pub async fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let txns = self.transactions.load().await?;
        Ok(txns.into_iter().find(|t| t.id == id))
    }

    /// Insert a transaction, resolving its submitter group.
    pub async fn insert_transaction(&self, txn: Transaction) -> Result<Placement, StoreError> {
        let placement = self
            .transactions
            .update(|txns| grouping::place(txns, txn, Utc::now()))
            .await?;
        info!(
            id = %placement.member.id,
            group_id = ?placement.member.group_id,
            created_owner = placement.created_owner.is_some(),
            "inserted transaction"
        );
        Ok(placement)
    }

    /// Apply `f` to the transaction with `id`. Returns the updated record, or
    /// `None` when no such transaction exists.
    pub async fn update_transaction(
        &self,
        id: &str,
        f: impl FnOnce(&mut Transaction),
    ) -> Result<Option<Transaction>, StoreError> {
        self.transactions
            .update(|txns| {
                txns.iter_mut().find(|t| t.id == id).map(|t| {
                    f(t);
                    t.clone()
                })
            })
            .await
    }

    /// Delete a transaction. Deleting an absent id is a no-op.
    ///
    /// Deleting an owner row ungroups its members rather than deleting them;
    /// use [`remove_group`](Self::remove_group) for that.
    pub async fn remove_transaction(&self, id: &str) -> Result<Removal, StoreError> {
        let removal = self
            .transactions
            .update(|txns| {
                let before = txns.len();
                txns.retain(|t| t.id != id);
                let removed = txns.len() != before;
                let detached = if removed {
                    grouping::detach_members(txns, id)
                } else {
                    Vec::new()
                };
                Removal { removed, detached }
            })
            .await?;
        debug!(id, removed = removal.removed, detached = removal.detached.len(), "delete transaction");
        Ok(removal)
    }

    /// Delete an owner row and every member of its group. Returns the
    /// deleted ids, owner first.
    pub async fn remove_group(&self, owner_id: &str) -> Result<Vec<String>, StoreError> {
        let deleted = self
            .transactions
            .update(|txns| {
                let ids = grouping::group_member_ids(txns, owner_id);
                txns.retain(|t| !ids.contains(&t.id));
                ids
            })
            .await?;
        info!(owner_id, deleted = deleted.len(), "deleted group");
        Ok(deleted)
    }

    /// Clear cached AI artifacts, optionally for a single transaction.
    pub async fn clear_ai_caches(
        &self,
        scope: CacheScope,
        id: Option<&str>,
    ) -> Result<ClearReport, StoreError> {
        let report = self
            .transactions
            .update(|txns| crate::cache::clear(txns, scope, id))
            .await?;
        info!(
            processed = report.processed,
            cleared = report.cleared,
            "cleared AI caches"
        );
        Ok(report)
    }

    // ── Policies ──

    pub async fn policies(&self) -> Result<PolicyDocument, StoreError> {
        self.policies.load().await
    }

    /// Replace the whole policy document. Concurrent replacements resolve
    /// last-writer-wins.
    pub async fn replace_policies(&self, doc: &PolicyDocument) -> Result<(), StoreError> {
        self.policies.replace(doc).await?;
        info!(
            groups = doc.groups.len(),
            policies = doc.policy_count(),
            "replaced policy document"
        );
        Ok(())
    }
}

fn link_legacy_groups(txns: &mut Vec<Transaction>) {
    let linked = grouping::link_legacy_groups(txns);
    if linked > 0 {
        info!(linked, "linked legacy transactions to their group owners");
    }
}
