//! Grant-based authorization backed by a casbin enforcer
//!
//! Each configured [`PolicyAdapter`] loads into its own [`PolicyModel`]; the
//! group-policy pairs become casbin grouping rules so that
//! `username -> user group -> admin resource` chains resolve transitively.
//! Usernames, groups and resources share one role graph, so every node is
//! tagged with its kind and a name never links to a node of another kind.

use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use warden_core::{ErrorContext, PolicyAdapter, PolicyModel, WardenError, WardenResult};

/// RBAC model without explicit permissions: access is role membership.
pub const MODEL: &str = r#"
[request_definition]
r = sub, obj

[policy_definition]
p = sub, obj

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, r.obj)
"#;

const USER_PREFIX: &str = "u:";
const GROUP_PREFIX: &str = "g:";
const RESOURCE_PREFIX: &str = "r:";

/// What the rows of an adapter link together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    /// username -> user group identifier
    Membership,
    /// user group identifier -> admin resource identifier
    Resource,
}

impl GrantKind {
    fn link(self, v0: &str, v1: &str) -> (String, String) {
        match self {
            GrantKind::Membership => (node(USER_PREFIX, v0), node(GROUP_PREFIX, v1)),
            GrantKind::Resource => (node(GROUP_PREFIX, v0), node(RESOURCE_PREFIX, v1)),
        }
    }
}

fn node(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

struct PolicySnapshot {
    enforcer: Enforcer,
    grants: usize,
}

/// Answers "may this user use this admin resource" from the stored grants
pub struct Authorizer {
    sources: Vec<(GrantKind, Arc<dyn PolicyAdapter>)>,
    state: RwLock<PolicySnapshot>,
}

impl Authorizer {
    /// Load every adapter and build the first enforcer
    pub async fn load(sources: Vec<(GrantKind, Arc<dyn PolicyAdapter>)>) -> WardenResult<Self> {
        let snapshot = Self::build_snapshot(&sources).await?;
        info!(
            adapters = sources.len(),
            grants = snapshot.grants,
            "Authorization policies loaded"
        );

        Ok(Self {
            sources,
            state: RwLock::new(snapshot),
        })
    }

    /// Re-run every loader and swap in the new policies. Returns the grant count.
    ///
    /// On failure the previous policies stay active.
    pub async fn reload(&self) -> WardenResult<usize> {
        let snapshot = Self::build_snapshot(&self.sources).await?;
        let grants = snapshot.grants;
        *self.state.write().await = snapshot;

        info!(grants, "Authorization policies reloaded");
        Ok(grants)
    }

    /// Whether `username` reaches `resource` through one of their user groups
    pub async fn is_allowed(&self, username: &str, resource: &str) -> WardenResult<bool> {
        let state = self.state.read().await;
        let allowed = state
            .enforcer
            .enforce((node(USER_PREFIX, username), node(RESOURCE_PREFIX, resource)))
            .map_err(|e| casbin_error("enforce", e))?;

        debug!(username, resource, allowed, "Authorization decision");
        Ok(allowed)
    }

    /// Number of grant entries loaded, duplicates included
    pub async fn grant_count(&self) -> usize {
        self.state.read().await.grants
    }

    async fn build_snapshot(
        sources: &[(GrantKind, Arc<dyn PolicyAdapter>)],
    ) -> WardenResult<PolicySnapshot> {
        let mut links = Vec::new();
        let mut grants = 0;

        for (kind, adapter) in sources {
            let mut model = PolicyModel::new();
            adapter.load_policy(&mut model).await?;

            grants += model.group_policy().len();
            links.extend(model.group_pairs().map(|(v0, v1)| kind.link(v0, v1)));
        }

        let enforcer = build_enforcer(&links).await?;
        Ok(PolicySnapshot { enforcer, grants })
    }
}

/// Build an in-memory enforcer holding `links` as grouping rules
async fn build_enforcer(links: &[(String, String)]) -> WardenResult<Enforcer> {
    let casbin_model = DefaultModel::from_str(MODEL)
        .await
        .map_err(|e| casbin_error("load_model", e))?;
    let mut enforcer = Enforcer::new(casbin_model, MemoryAdapter::default())
        .await
        .map_err(|e| casbin_error("create_enforcer", e))?;

    // One rule at a time; duplicate rows are accepted and ignored.
    for (from, to) in links {
        enforcer
            .add_grouping_policy(vec![from.clone(), to.clone()])
            .await
            .map_err(|e| casbin_error("add_grouping_policy", e))?;
    }

    enforcer
        .build_role_links()
        .map_err(|e| casbin_error("build_role_links", e))?;
    Ok(enforcer)
}

fn casbin_error(operation: &str, err: casbin::Error) -> WardenError {
    WardenError::Authorization {
        message: err.to_string(),
        context: ErrorContext::new("authorizer").with_operation(operation),
    }
}
