//! Company expense policies as stored in `policies.json`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("duplicate policy id {policy_id:?} in group {group_id:?}")]
    DuplicatePolicyId { group_id: String, policy_id: String },
}

/// The whole policy document. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub groups: Vec<PolicyGroup>,
}

/// A named collection of policy rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// A single policy rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Reviewer-only annotation. Never sent to AI services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_notes: Option<String>,
}

impl PolicyDocument {
    /// Check that policy ids are unique within each group.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for group in &self.groups {
            let mut seen = HashSet::new();
            for policy in &group.policies {
                if !seen.insert(policy.id.as_str()) {
                    return Err(PolicyError::DuplicatePolicyId {
                        group_id: group.id.clone(),
                        policy_id: policy.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn policy_count(&self) -> usize {
        self.groups.iter().map(|g| g.policies.len()).sum()
    }
}
