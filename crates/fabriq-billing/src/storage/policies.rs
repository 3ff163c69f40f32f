use crate::domain::policy::AccessPolicy;
use crate::domain::types::EquipmentId;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One access policy per equipment item.
///
/// Absence means the equipment is inaccessible (fail closed); defaults are
/// never invented here. Policies are read-mostly immutable snapshots.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn get(&self, equipment_id: &EquipmentId) -> Result<Option<AccessPolicy>>;

    /// Create or replace the policy for its equipment, stamping
    /// `updated_at`; returns the stored policy.
    async fn upsert(&self, policy: AccessPolicy) -> Result<AccessPolicy>;

    async fn list(&self) -> Result<Vec<AccessPolicy>>;
}

/// In-memory policy store for development and testing
pub struct InMemoryPolicyRepository {
    policies: Arc<RwLock<HashMap<EquipmentId, AccessPolicy>>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self {
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_policies(policies: Vec<AccessPolicy>) -> Self {
        let mut map = HashMap::new();
        for policy in policies {
            map.insert(policy.equipment_id.clone(), policy);
        }
        Self {
            policies: Arc::new(RwLock::new(map)),
        }
    }
}

impl Default for InMemoryPolicyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn get(&self, equipment_id: &EquipmentId) -> Result<Option<AccessPolicy>> {
        let policies = self.policies.read().await;
        Ok(policies.get(equipment_id).cloned())
    }

    async fn upsert(&self, mut policy: AccessPolicy) -> Result<AccessPolicy> {
        let mut policies = self.policies.write().await;
        if let Some(existing) = policies.get(&policy.equipment_id) {
            policy.created_at = existing.created_at;
        }
        policy.updated_at = Utc::now();
        policies.insert(policy.equipment_id.clone(), policy.clone());
        Ok(policy)
    }

    async fn list(&self) -> Result<Vec<AccessPolicy>> {
        let policies = self.policies.read().await;
        Ok(policies.values().cloned().collect())
    }
}
