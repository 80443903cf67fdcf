//! Plain-text rendering of transactions and policies for the terminal.

use clarity_core::grouping::{Grouped, group_transactions};
use clarity_core::{PolicyDocument, Transaction, sum_amounts};

const REVIEWER_MARKER: &str = "[reviewer]";

// ── Transactions ──

/// Transactions grouped by submitter, with per-group and grand totals.
/// Owner rows only head their group and never count toward a total.
pub fn render_transactions(txns: &[Transaction]) -> String {
    let Grouped { groups, ungrouped } = group_transactions(txns);
    let mut out = String::new();

    for group in &groups {
        let initials = group.owner.merchant_initials.as_deref().unwrap_or("--");
        out.push_str(&format!("=== {} ({initials}) ===\n", group.owner.merchant_name));
        for member in &group.members {
            push_row(&mut out, member);
        }
        out.push_str(&format!(
            "  {:<44} {}\n",
            format!("{} item(s)", group.members.len()),
            format_total(group.total)
        ));
        out.push('\n');
    }

    if !ungrouped.is_empty() {
        out.push_str("=== Ungrouped ===\n");
        for member in &ungrouped {
            push_row(&mut out, member);
        }
        out.push('\n');
    }

    let members: Vec<&str> = txns
        .iter()
        .filter(|t| t.is_member())
        .map(|t| t.amount.as_str())
        .collect();
    out.push_str(&format!(
        "{} transaction(s), {} group(s), total {}\n",
        members.len(),
        groups.len(),
        format_total(sum_amounts(members))
    ));
    out
}

fn push_row(out: &mut String, txn: &Transaction) {
    let status = txn.approval_status.map_or("-", |s| s.as_str());
    out.push_str(&format!(
        "  {:<10} {:<24} {:>14}  {:<12} {}\n",
        txn.date,
        truncate(&txn.merchant_name, 24),
        txn.amount,
        status,
        txn.id
    ));
}

fn format_total(total: Option<f64>) -> String {
    total.map_or_else(|| "-".to_string(), |t| format!("{t:.2}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{head}…")
    }
}

// ── Policies ──

/// The policy document, with hidden notes shown under a reviewer marker.
pub fn render_policies(doc: &PolicyDocument) -> String {
    if doc.groups.is_empty() {
        return "No policies.\n".to_string();
    }

    let mut out = String::new();
    for group in &doc.groups {
        out.push_str(&format!("=== {} ===\n", group.title));
        for policy in &group.policies {
            out.push_str(&format!("  {:<26} {}\n", policy.title, policy.description));
            if let Some(notes) = policy.hidden_notes.as_deref().filter(|n| !n.trim().is_empty()) {
                out.push_str(&format!("  {:<26} {REVIEWER_MARKER} {notes}\n", ""));
            }
        }
        out.push('\n');
    }
    out
}
