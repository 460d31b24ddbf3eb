use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

/// An authenticated caller and what it may do.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Principal {
    pub id: String,
    /// Businesses whose calendars this principal works on.
    #[serde(default)]
    pub staff_of: HashSet<String>,
    /// Businesses this principal owns.
    #[serde(default)]
    pub owner_of: HashSet<String>,
    /// Set when the principal is itself a bookable resource (an employee).
    #[serde(default)]
    pub resource_id: Option<String>,
}

impl Principal {
    pub fn client(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn is_owner_of_business(&self, business_id: &str) -> bool {
        self.owner_of.contains(business_id)
    }

    /// Owners count as staff.
    pub fn is_staff_for_business(&self, business_id: &str) -> bool {
        self.staff_of.contains(business_id) || self.is_owner_of_business(business_id)
    }

    pub fn is_owner_of_resource(&self, resource_id: &str) -> bool {
        self.resource_id.as_deref() == Some(resource_id)
    }

    /// The capability check guarding the force-override path.
    pub fn may_force(&self, business_id: &str, resource_id: &str) -> bool {
        self.is_staff_for_business(business_id) || self.is_owner_of_resource(resource_id)
    }
}

/// Resolves bearer tokens to principals. Authentication itself lives elsewhere.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Principal>>;
}

#[derive(Debug, Default)]
pub struct StaticIdentity {
    principals: HashMap<String, Principal>,
}

#[derive(Deserialize)]
struct PrincipalEntry {
    token: String,
    #[serde(flatten)]
    principal: Principal,
}

impl StaticIdentity {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let entries: Vec<PrincipalEntry> = serde_json::from_str(s)?;
        let principals = entries
            .into_iter()
            .map(|e| (e.token, e.principal))
            .collect();
        Ok(Self { principals })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "principals file not found, no callers can authenticate");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read principals: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid principals: {}", path.display()))
    }

    pub fn with_principal(mut self, token: &str, principal: Principal) -> Self {
        self.principals.insert(token.to_string(), principal);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Principal>> {
        Ok(self.principals.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_tokens_from_json() {
        let identity = StaticIdentity::from_json(
            r#"[
                {"token":"t-owner","id":"u-1","owner_of":["biz-1"]},
                {"token":"t-emp","id":"u-2","staff_of":["biz-1"],"resource_id":"res-1"},
                {"token":"t-client","id":"u-3"}
            ]"#,
        )
        .unwrap();

        let owner = identity.resolve("t-owner").await.unwrap().unwrap();
        assert!(owner.is_staff_for_business("biz-1"));
        assert!(owner.may_force("biz-1", "res-9"));

        let emp = identity.resolve("t-emp").await.unwrap().unwrap();
        assert!(emp.is_owner_of_resource("res-1"));
        assert!(!emp.is_owner_of_business("biz-1"));

        let client = identity.resolve("t-client").await.unwrap().unwrap();
        assert!(!client.may_force("biz-1", "res-1"));

        assert!(identity.resolve("nope").await.unwrap().is_none());
    }
}
