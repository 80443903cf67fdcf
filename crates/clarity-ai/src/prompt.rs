//! Prompt construction for the approval, suggestion and receipt calls.
//!
//! Hidden policy notes are reviewer-only and never rendered here.

use clarity_core::{PolicyDocument, RECEIPT_CATEGORIES, Transaction};

/// Pattern-context size when a focal transaction is given.
pub const FOCUSED_CONTEXT: usize = 5;

/// Pattern-context size for general policy feedback.
pub const GENERAL_CONTEXT: usize = 10;

/// Flatten the policy document into prompt text.
///
/// ```text
/// Travel:
/// - Airfare: Economy only
///
/// Meals:
/// - Dinner cap: Max $100 per person
/// ```
pub fn render_policies(policies: &PolicyDocument) -> String {
    policies
        .groups
        .iter()
        .map(|group| {
            let bullets: String = group
                .policies
                .iter()
                .map(|policy| format!("\n- {}: {}", policy.title, policy.description))
                .collect();
            format!("{}:{bullets}", group.title)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Approval prompt for one transaction.
pub fn approval_prompt(txn: &Transaction, policies: &PolicyDocument) -> String {
    format!(
        "Analyze this expense transaction against company policies:

Transaction:
- Merchant: {merchant}
- Amount: {amount}
- Date: {date}
- Memo: {memo}
- Category: {category}

Company Policies:
{policies}

Determine:
1. Should this be approved? (true/false)
2. Policy status: \"In policy\", \"Out of policy\", or \"Needs review\"
3. Approval status: \"Approved\", \"Rejected\", or \"Pending\"
4. Brief reason (1-2 sentences)

Respond in JSON format: {{ \"approved\": boolean, \"policyStatus\": string, \"approvalStatus\": string, \"reason\": string }}",
        merchant = txn.merchant_name,
        amount = txn.amount,
        date = txn.date,
        memo = txn.memo,
        category = txn.category_or_na(),
        policies = render_policies(policies),
    )
}

/// Policy-suggestion message for the webhook.
///
/// With a focal transaction the message carries its full detail plus the
/// last [`FOCUSED_CONTEXT`] transactions; without one it asks for general
/// feedback over the last [`GENERAL_CONTEXT`].
pub fn suggestion_prompt(
    transactions: &[Transaction],
    policies: &PolicyDocument,
    focus: Option<&Transaction>,
) -> String {
    let policy_text = render_policies(policies);
    match focus {
        Some(txn) => format!(
            "Analyze this specific transaction and provide policy improvement suggestions:

Transaction Details:
- Merchant: {merchant}
- Amount: {amount}
- Category: {category}
- Date: {date}
- Memo: {memo}
- Current Status: {approval}
- Policy Status: {policy}

Current Company Policies:
{policy_text}

Recent Transaction Patterns:
{patterns}

Please provide specific policy improvement suggestions based on this transaction and overall spending patterns.",
            merchant = txn.merchant_name,
            amount = txn.amount,
            category = non_empty_or(&txn.merchant_category, "Unknown"),
            date = txn.date,
            memo = non_empty_or(&txn.memo, "N/A"),
            approval = status_label(txn.approval_status.map(|s| s.as_str())),
            policy = status_label(txn.policy_status.map(|s| s.as_str())),
            patterns = pattern_lines(recent(transactions, FOCUSED_CONTEXT)),
        ),
        None => format!(
            "Review our company expense policies and recent transactions, then provide general policy improvement suggestions.

Current Policies:
{policy_text}

Recent Transactions:
{patterns}",
            patterns = pattern_lines(recent(transactions, GENERAL_CONTEXT)),
        ),
    }
}

/// Fixed instruction sent with every receipt image.
pub fn receipt_prompt() -> String {
    format!(
        "Analyze this receipt image and extract the following information. Return ONLY valid JSON with these exact fields:
{{
  \"merchantName\": \"name of the merchant/vendor\",
  \"merchantCategory\": \"category - MUST be one of these if applicable: {categories}\",
  \"date\": \"transaction date in YYYY-MM-DD format\",
  \"amount\": \"total amount as a number (no currency symbols)\",
  \"memo\": \"brief description of items purchased or purpose\"
}}

IMPORTANT: For merchantCategory, try to match one of the predefined categories listed above. Only use a different category if none of these apply. If any field cannot be determined, use an empty string. Make sure the date is in YYYY-MM-DD format.",
        categories = RECEIPT_CATEGORIES.join(", "),
    )
}

/// The last `n` transactions in document order.
fn recent(transactions: &[Transaction], n: usize) -> &[Transaction] {
    &transactions[transactions.len().saturating_sub(n)..]
}

fn pattern_lines(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| {
            format!(
                "- {}: {} ({}) - {}",
                t.merchant_name,
                t.amount,
                t.category_or_na(),
                status_label(t.approval_status.map(|s| s.as_str())),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn status_label(label: Option<&str>) -> &str {
    label.unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarity_core::{ApprovalStatus, Policy, PolicyGroup};

    fn policies() -> PolicyDocument {
        PolicyDocument {
            groups: vec![
                PolicyGroup {
                    id: "g1".into(),
                    title: "Travel".into(),
                    policies: vec![Policy {
                        id: "p1".into(),
                        title: "Airfare".into(),
                        description: "Economy only".into(),
                        hidden_notes: Some("VP exception list".into()),
                    }],
                },
                PolicyGroup {
                    id: "g2".into(),
                    title: "Meals".into(),
                    policies: vec![Policy {
                        id: "p1".into(),
                        title: "Dinner cap".into(),
                        description: "Max $100 per person".into(),
                        hidden_notes: None,
                    }],
                },
            ],
        }
    }

    fn txn(i: usize) -> Transaction {
        Transaction {
            id: format!("t{i}"),
            merchant_name: format!("Merchant{i}"),
            amount: format!("${i}.00"),
            approval_status: Some(ApprovalStatus::Pending),
            ..Transaction::default()
        }
    }

    #[test]
    fn policies_render_as_grouped_bullets() {
        assert_eq!(
            render_policies(&policies()),
            "Travel:\n- Airfare: Economy only\n\nMeals:\n- Dinner cap: Max $100 per person"
        );
    }

    #[test]
    fn empty_group_renders_title_only() {
        let mut doc = policies();
        doc.groups[1].policies.clear();
        assert_eq!(render_policies(&doc), "Travel:\n- Airfare: Economy only\n\nMeals:");
    }

    #[test]
    fn hidden_notes_never_reach_prompts() {
        let prompt = approval_prompt(&txn(1), &policies());
        assert!(!prompt.contains("VP exception list"));
        let prompt = suggestion_prompt(&[txn(1)], &policies(), None);
        assert!(!prompt.contains("VP exception list"));
    }

    #[test]
    fn approval_prompt_embeds_transaction() {
        let mut t = txn(7);
        t.memo = "Client dinner".into();
        let prompt = approval_prompt(&t, &policies());
        assert!(prompt.contains("- Merchant: Merchant7"));
        assert!(prompt.contains("- Amount: $7.00"));
        assert!(prompt.contains("- Memo: Client dinner"));
        assert!(prompt.contains("- Category: N/A"));
        assert!(prompt.contains("\"policyStatus\": string"));
    }

    #[test]
    fn focused_prompt_uses_last_five() {
        let txns: Vec<_> = (0..8).map(txn).collect();
        let prompt = suggestion_prompt(&txns, &policies(), Some(&txns[0]));
        assert!(prompt.contains("Transaction Details:\n- Merchant: Merchant0"));
        assert!(prompt.contains("- Category: Unknown"));
        assert!(prompt.contains("- Merchant7: $7.00 (N/A) - Pending"));
        assert!(prompt.contains("- Merchant3: $3.00"));
        assert!(!prompt.contains("- Merchant2: $2.00"));
    }

    #[test]
    fn general_prompt_uses_last_ten() {
        let txns: Vec<_> = (0..12).map(txn).collect();
        let prompt = suggestion_prompt(&txns, &policies(), None);
        assert!(prompt.starts_with("Review our company expense policies"));
        assert!(prompt.contains("- Merchant2: $2.00"));
        assert!(!prompt.contains("- Merchant1: $1.00"));
    }

    #[test]
    fn short_history_is_fine() {
        let prompt = suggestion_prompt(&[], &PolicyDocument::default(), None);
        assert!(prompt.ends_with("Recent Transactions:\n"));
    }

    #[test]
    fn receipt_prompt_lists_categories() {
        let prompt = receipt_prompt();
        assert!(prompt.contains("Groceries, Restaurants, Department Store"));
        assert!(prompt.contains("YYYY-MM-DD"));
    }
}
