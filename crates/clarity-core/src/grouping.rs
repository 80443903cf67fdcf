//! Submitter groups.
//!
//! An owner row (`groupOwner: true`) stands for a submitter and members
//! point at it through `groupId`. Older documents relied on row order
//! instead: every member belonged to the nearest owner above it.
//! [`link_legacy_groups`] upgrades such a document once, on load.
//!
//! New rows are still inserted where the positional rule would put them
//! (members after their group, ungrouped rows before the first owner), so
//! the file reads the same way under either interpretation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::amount::sum_amounts;
use crate::transaction::{Transaction, initials};

/// Where [`place`] put a new transaction.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The inserted transaction, with `group_id` resolved.
    pub member: Transaction,
    /// Owner row created for a submitter seen for the first time.
    pub created_owner: Option<Transaction>,
}

/// An owner with its members, in document order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub owner: Transaction,
    pub members: Vec<Transaction>,
    /// Sum of parsable member amounts.
    pub total: Option<f64>,
}

/// All transactions arranged by owner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Grouped {
    pub groups: Vec<GroupView>,
    /// Members with no owner, or whose owner no longer exists.
    pub ungrouped: Vec<Transaction>,
}

/// True when the document has owners but no explicit `groupId` anywhere.
pub fn is_legacy_document(txns: &[Transaction]) -> bool {
    txns.iter().any(|t| t.group_owner) && txns.iter().all(|t| t.group_id.is_none())
}

/// Link members to the nearest preceding owner.
///
/// Only touches legacy documents (see [`is_legacy_document`]). Returns the
/// number of members linked.
pub fn link_legacy_groups(txns: &mut [Transaction]) -> usize {
    if !is_legacy_document(txns) {
        return 0;
    }

    let mut current_owner: Option<String> = None;
    let mut linked = 0;
    for txn in txns.iter_mut() {
        if txn.group_owner {
            current_owner = Some(txn.id.clone());
        } else if let Some(owner) = &current_owner {
            txn.group_id = Some(owner.clone());
            linked += 1;
        }
    }
    linked
}

/// Owner row id for a submitter: `"angela-martin-owner-1720353600000"`.
pub fn owner_id(name: &str, now: DateTime<Utc>) -> String {
    let slug = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("{slug}-owner-{}", now.timestamp_millis())
}

/// Insert `member` into `txns`, resolving its group.
///
/// - An explicit `group_id` wins.
/// - Otherwise a non-empty `assigned_to` is matched against owner names;
///   an owner is created when none matches.
/// - Otherwise the row is ungrouped.
pub fn place(txns: &mut Vec<Transaction>, mut member: Transaction, now: DateTime<Utc>) -> Placement {
    if member.group_owner {
        txns.push(member.clone());
        return Placement { member, created_owner: None };
    }

    let mut created_owner = None;
    if member.group_id.is_none()
        && let Some(name) = member.assigned_to.as_deref().map(str::trim)
        && !name.is_empty()
    {
        match txns.iter().find(|t| t.group_owner && t.merchant_name == name) {
            Some(owner) => member.group_id = Some(owner.id.clone()),
            None => {
                let owner = new_owner(name, &member, now);
                member.group_id = Some(owner.id.clone());
                txns.push(owner.clone());
                created_owner = Some(owner);
            }
        }
    }

    let index = match &member.group_id {
        Some(group_id) => end_of_group(txns, group_id).unwrap_or(txns.len()),
        None => txns.iter().position(|t| t.group_owner).unwrap_or(txns.len()),
    };
    txns.insert(index, member.clone());

    Placement { member, created_owner }
}

/// Clear `group_id` on every member of `owner_id` and move those rows ahead
/// of the first owner, keeping their relative order. Rows left after an
/// owner would be re-adopted by [`link_legacy_groups`] on the next load.
/// Returns the updated rows.
pub fn detach_members(txns: &mut Vec<Transaction>, owner_id: &str) -> Vec<Transaction> {
    let (mut detached, rest): (Vec<_>, Vec<_>) = txns
        .drain(..)
        .partition(|t| t.group_id.as_deref() == Some(owner_id));
    *txns = rest;
    for t in &mut detached {
        t.group_id = None;
    }

    let index = txns.iter().position(|t| t.group_owner).unwrap_or(txns.len());
    txns.splice(index..index, detached.iter().cloned());
    detached
}

/// Ids of an owner and all of its members, owner first.
pub fn group_member_ids(txns: &[Transaction], owner_id: &str) -> Vec<String> {
    let owner = txns
        .iter()
        .filter(|t| t.group_owner && t.id == owner_id)
        .map(|t| t.id.clone());
    let members = txns
        .iter()
        .filter(|t| t.group_id.as_deref() == Some(owner_id))
        .map(|t| t.id.clone());
    owner.chain(members).collect()
}

/// Arrange transactions by owner, keeping document order within each group.
pub fn group_transactions(txns: &[Transaction]) -> Grouped {
    let mut grouped = Grouped::default();

    for owner in txns.iter().filter(|t| t.group_owner) {
        let members: Vec<Transaction> = txns
            .iter()
            .filter(|t| t.is_member() && t.group_id.as_deref() == Some(owner.id.as_str()))
            .cloned()
            .collect();
        let total = sum_amounts(members.iter().map(|m| m.amount.as_str()));
        grouped.groups.push(GroupView {
            owner: owner.clone(),
            members,
            total,
        });
    }

    grouped.ungrouped = txns
        .iter()
        .filter(|t| t.is_member())
        .filter(|t| match &t.group_id {
            None => true,
            Some(gid) => !txns.iter().any(|o| o.group_owner && &o.id == gid),
        })
        .cloned()
        .collect();

    grouped
}

fn new_owner(name: &str, member: &Transaction, now: DateTime<Utc>) -> Transaction {
    Transaction {
        id: owner_id(name, now),
        group_owner: true,
        merchant_initials: Some(initials(name)),
        merchant_name: name.to_string(),
        date: member.date.clone(),
        policy_status: member.policy_status,
        approval_status: member.approval_status,
        ..Transaction::default()
    }
}

/// Index just past the owner row and its last member.
fn end_of_group(txns: &[Transaction], group_id: &str) -> Option<usize> {
    txns.iter()
        .rposition(|t| t.id == group_id || t.group_id.as_deref() == Some(group_id))
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ApprovalStatus;

    fn owner(id: &str, name: &str) -> Transaction {
        Transaction {
            id: id.into(),
            group_owner: true,
            merchant_name: name.into(),
            ..Transaction::default()
        }
    }

    fn member(id: &str, amount: &str) -> Transaction {
        Transaction {
            id: id.into(),
            merchant_name: format!("Merchant {id}"),
            amount: amount.into(),
            ..Transaction::default()
        }
    }

    fn ids(txns: &[Transaction]) -> Vec<&str> {
        txns.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn legacy_document_links_by_adjacency() {
        let mut txns = vec![
            owner("1", "Angela Martin"),
            member("2", "$712.65 USD"),
            member("3", "$78.00 USD"),
            owner("4", "Dwight Schrute"),
            member("5", "$12.00 USD"),
        ];
        assert_eq!(link_legacy_groups(&mut txns), 3);
        assert_eq!(txns[1].group_id.as_deref(), Some("1"));
        assert_eq!(txns[2].group_id.as_deref(), Some("1"));
        assert_eq!(txns[4].group_id.as_deref(), Some("4"));
        assert!(txns[0].group_id.is_none());
    }

    #[test]
    fn rows_before_first_owner_stay_ungrouped() {
        let mut txns = vec![member("0", "1"), owner("1", "A"), member("2", "2")];
        assert_eq!(link_legacy_groups(&mut txns), 1);
        assert!(txns[0].group_id.is_none());
    }

    #[test]
    fn explicit_documents_are_not_relinked() {
        let mut txns = vec![owner("1", "A"), member("2", "1"), member("3", "1")];
        txns[1].group_id = Some("1".into());
        assert_eq!(link_legacy_groups(&mut txns), 0);
        assert!(txns[2].group_id.is_none());
    }

    #[test]
    fn reordering_keeps_explicit_groups() {
        let mut txns = vec![owner("1", "A"), member("2", "5"), owner("3", "B"), member("4", "7")];
        link_legacy_groups(&mut txns);
        txns.reverse();
        let grouped = group_transactions(&txns);
        let a = grouped.groups.iter().find(|g| g.owner.id == "1").unwrap();
        assert_eq!(ids(&a.members), ["2"]);
        assert!(grouped.ungrouped.is_empty());
    }

    #[test]
    fn owner_id_slugifies_name() {
        let now = DateTime::from_timestamp_millis(1_720_353_600_000).unwrap();
        assert_eq!(owner_id("Angela  Martin", now), "angela-martin-owner-1720353600000");
    }

    #[test]
    fn place_creates_owner_for_new_submitter() {
        let mut txns = vec![];
        let mut m = member("t1", "10.00");
        m.assigned_to = Some("Angela Martin".into());
        m.approval_status = Some(ApprovalStatus::Pending);

        let placement = place(&mut txns, m, Utc::now());
        let created = placement.created_owner.expect("owner should be created");
        assert!(created.group_owner);
        assert_eq!(created.merchant_name, "Angela Martin");
        assert_eq!(created.merchant_initials.as_deref(), Some("AM"));
        assert_eq!(created.approval_status, Some(ApprovalStatus::Pending));
        assert_eq!(placement.member.group_id.as_deref(), Some(created.id.as_str()));
        assert_eq!(ids(&txns), [created.id.as_str(), "t1"]);
    }

    #[test]
    fn place_appends_to_existing_group() {
        let mut txns = vec![owner("1", "Angela Martin"), member("2", "1"), owner("3", "Dwight")];
        txns[1].group_id = Some("1".into());

        let mut m = member("t1", "10.00");
        m.assigned_to = Some("Angela Martin".into());
        let placement = place(&mut txns, m, Utc::now());

        assert!(placement.created_owner.is_none());
        assert_eq!(placement.member.group_id.as_deref(), Some("1"));
        assert_eq!(ids(&txns), ["1", "2", "t1", "3"]);
    }

    #[test]
    fn place_puts_ungrouped_before_first_owner() {
        let mut txns = vec![member("0", "1"), owner("1", "A")];
        let placement = place(&mut txns, member("t1", "2"), Utc::now());
        assert!(placement.member.group_id.is_none());
        assert_eq!(ids(&txns), ["0", "t1", "1"]);
    }

    #[test]
    fn detach_and_member_ids() {
        let mut txns = vec![owner("1", "A"), member("2", "1"), member("3", "1")];
        txns[1].group_id = Some("1".into());
        txns[2].group_id = Some("1".into());

        assert_eq!(group_member_ids(&txns, "1"), ["1", "2", "3"]);
        let detached = detach_members(&mut txns, "1");
        assert_eq!(ids(&detached), ["2", "3"]);
        assert!(txns.iter().all(|t| t.group_id.is_none()));
        assert_eq!(ids(&txns), ["2", "3", "1"]);
    }

    #[test]
    fn detached_rows_are_not_adopted_by_a_later_relink() {
        let mut txns = vec![owner("A", "Angela"), member("a", "1"), owner("D", "Dwight"), member("b", "2")];
        txns[1].group_id = Some("A".into());
        txns[3].group_id = Some("D".into());

        // Dwight's owner row is deleted on its own, leaving `b` behind `A`.
        txns.remove(2);
        detach_members(&mut txns, "D");
        assert_eq!(ids(&txns), ["b", "A", "a"]);

        // Removing `a` leaves a document with no links, which reloads as legacy.
        txns.retain(|t| t.id != "a");
        assert!(is_legacy_document(&txns));
        assert_eq!(link_legacy_groups(&mut txns), 0);
        assert!(txns.iter().all(|t| t.group_id.is_none()));
        assert_eq!(ids(&group_transactions(&txns).ungrouped), ["b"]);
    }

    #[test]
    fn group_totals_skip_owner_and_unparsable() {
        let mut txns = vec![
            owner("1", "A"),
            member("2", "$712.65 USD"),
            member("3", "pending"),
            member("4", "$78.00 USD"),
        ];
        link_legacy_groups(&mut txns);
        let grouped = group_transactions(&txns);
        let total = grouped.groups[0].total.unwrap();
        assert!((total - 790.65).abs() < 1e-9);
    }

    #[test]
    fn dangling_group_id_is_ungrouped() {
        let mut m = member("2", "1");
        m.group_id = Some("gone".into());
        let grouped = group_transactions(&[m]);
        assert_eq!(ids(&grouped.ungrouped), ["2"]);
    }
}
