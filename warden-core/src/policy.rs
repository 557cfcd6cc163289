//! Policy model and the storage adapter that fills it
//!
//! Grants are managed through the admin CRUD on groups and resources, so the
//! adapter only ever reads. Writes coming from the evaluation engine are
//! accepted and dropped; filtered removal is refused outright.

use crate::error::WardenResult;
use crate::traits::AuthLoader;
use crate::types::GrantRow;
use crate::unsupported_error;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Section holding role/group definitions
pub const GROUP_SECTION: &str = "g";
/// Policy type of the group policy list
pub const GROUP_POLICY_TYPE: &str = "g";

pub type PolicyRule = Vec<String>;

/// Encode a grant row the way the group-policy section expects it.
pub fn encode_grant(row: &GrantRow) -> PolicyRule {
    vec![
        row.v0.clone(),
        row.v1.clone(),
        String::new(),
        String::new(),
        ",".to_string(),
    ]
}

/// In-memory policy state keyed by section and policy type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyModel {
    assertions: BTreeMap<String, BTreeMap<String, Vec<PolicyRule>>>,
}

impl PolicyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to `sec`/`ptype`
    pub fn push(&mut self, sec: &str, ptype: &str, rule: PolicyRule) {
        self.assertions
            .entry(sec.to_string())
            .or_default()
            .entry(ptype.to_string())
            .or_default()
            .push(rule);
    }

    pub fn policy(&self, sec: &str, ptype: &str) -> &[PolicyRule] {
        self.assertions
            .get(sec)
            .and_then(|types| types.get(ptype))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn group_policy(&self) -> &[PolicyRule] {
        self.policy(GROUP_SECTION, GROUP_POLICY_TYPE)
    }

    /// Subject/target pairs of the group policy, without the encoding padding
    pub fn group_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.group_policy()
            .iter()
            .filter(|rule| rule.len() >= 2)
            .map(|rule| (rule[0].as_str(), rule[1].as_str()))
    }

    /// Total number of rules across all sections
    pub fn len(&self) -> usize {
        self.assertions
            .values()
            .flat_map(|types| types.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.assertions.clear();
    }
}

/// Storage adapter contract of the policy-evaluation engine
#[async_trait]
pub trait PolicyAdapter: Send + Sync {
    /// Append every stored rule to `model`
    async fn load_policy(&self, model: &mut PolicyModel) -> WardenResult<()>;

    async fn save_policy(&self, model: &PolicyModel) -> WardenResult<bool>;

    async fn add_policy(&self, sec: &str, ptype: &str, rule: PolicyRule) -> WardenResult<()>;

    /// Returns the number of removed rules
    async fn remove_policy(&self, sec: &str, ptype: &str, rule: PolicyRule)
        -> WardenResult<usize>;

    async fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: Vec<String>,
    ) -> WardenResult<usize>;
}

/// Read-only adapter turning grant rows into group-policy entries
pub struct GrantPolicyAdapter {
    name: String,
    loader: Arc<dyn AuthLoader>,
}

impl GrantPolicyAdapter {
    pub fn new(name: impl Into<String>, loader: Arc<dyn AuthLoader>) -> Self {
        Self {
            name: name.into(),
            loader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl PolicyAdapter for GrantPolicyAdapter {
    async fn load_policy(&self, model: &mut PolicyModel) -> WardenResult<()> {
        let rows = self.loader.load_all().await?;
        let count = rows.len();

        for row in &rows {
            model.push(GROUP_SECTION, GROUP_POLICY_TYPE, encode_grant(row));
        }

        info!(adapter = %self.name, rows = count, "Loaded grant rows into policy model");
        Ok(())
    }

    /// Nothing is persisted; grants are derived from storage, not authored here.
    async fn save_policy(&self, _model: &PolicyModel) -> WardenResult<bool> {
        Ok(true)
    }

    /// Intentionally unsupported: accepted and ignored.
    async fn add_policy(&self, sec: &str, ptype: &str, _rule: PolicyRule) -> WardenResult<()> {
        debug!(adapter = %self.name, sec, ptype, "Ignoring add_policy on read-only adapter");
        Ok(())
    }

    /// Intentionally unsupported: nothing is removed.
    async fn remove_policy(
        &self,
        sec: &str,
        ptype: &str,
        _rule: PolicyRule,
    ) -> WardenResult<usize> {
        debug!(adapter = %self.name, sec, ptype, "Ignoring remove_policy on read-only adapter");
        Ok(0)
    }

    async fn remove_filtered_policy(
        &self,
        _sec: &str,
        _ptype: &str,
        _field_index: usize,
        _field_values: Vec<String>,
    ) -> WardenResult<usize> {
        Err(unsupported_error!("remove_filtered_policy", "policy_adapter"))
    }
}
