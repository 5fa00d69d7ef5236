use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ProviderError, Result};
use crate::traits::{AutoScaleDriver, ProviderDriver};
use crate::types::{
    AutoScaleGroup, AutoScalePolicy, AutoScaleTerminationPolicy, CreateAutoScaleGroupRequest,
    CreateAutoScalePolicyRequest, Extra,
};

use super::PROVIDER;

#[derive(Default)]
struct State {
    groups: BTreeMap<String, AutoScaleGroup>,
    policies: BTreeMap<String, AutoScalePolicy>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory autoscaling groups. Groups are ready as soon as they are created.
#[derive(Default)]
pub struct DummyAutoScaleDriver {
    state: RwLock<State>,
}

impl DummyAutoScaleDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn invalid(param: &str, detail: String) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: PROVIDER.to_string(),
        param: param.to_string(),
        detail,
    }
}

#[async_trait]
impl ProviderDriver for DummyAutoScaleDriver {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn validate_credentials(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl AutoScaleDriver for DummyAutoScaleDriver {
    async fn list_auto_scale_groups(&self) -> Result<Vec<AutoScaleGroup>> {
        Ok(self.state.read().await.groups.values().cloned().collect())
    }

    async fn get_auto_scale_group(&self, group_id: &str) -> Result<AutoScaleGroup> {
        self.state
            .read()
            .await
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "autoscale group", group_id))
    }

    async fn create_auto_scale_group(
        &self,
        req: &CreateAutoScaleGroupRequest,
    ) -> Result<AutoScaleGroup> {
        if req.min_size > req.max_size {
            return Err(invalid(
                "min_size",
                format!("min_size {} exceeds max_size {}", req.min_size, req.max_size),
            ));
        }

        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.name == req.name) {
            return Err(ProviderError::ResourceExists {
                provider: PROVIDER.to_string(),
                resource: "autoscale group".to_string(),
                name: req.name.clone(),
                raw_message: None,
            });
        }

        let termination_policies = if req.termination_policies.is_empty() {
            vec![AutoScaleTerminationPolicy::Default]
        } else {
            req.termination_policies.clone()
        };
        let mut extra = req.extra.clone();
        extra.insert("status".to_string(), "ACTIVE".into());

        let group = AutoScaleGroup {
            id: state.next_id("group"),
            name: req.name.clone(),
            min_size: req.min_size,
            max_size: req.max_size,
            cooldown: req.cooldown,
            termination_policies,
            extra,
        };
        state.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn delete_auto_scale_group(&self, group_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .groups
            .remove(group_id)
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "autoscale group", group_id))?;
        state.policies.retain(|_, p| p.group_id != group_id);
        Ok(())
    }

    async fn list_auto_scale_policies(&self, group_id: &str) -> Result<Vec<AutoScalePolicy>> {
        let state = self.state.read().await;
        if !state.groups.contains_key(group_id) {
            return Err(ProviderError::not_found(
                PROVIDER,
                "autoscale group",
                group_id,
            ));
        }
        Ok(state
            .policies
            .values()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_auto_scale_policy(
        &self,
        req: &CreateAutoScalePolicyRequest,
    ) -> Result<AutoScalePolicy> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&req.group_id) {
            return Err(ProviderError::not_found(
                PROVIDER,
                "autoscale group",
                &req.group_id,
            ));
        }
        let policy = AutoScalePolicy {
            id: state.next_id("policy"),
            name: req.name.clone(),
            group_id: req.group_id.clone(),
            adjustment_type: req.adjustment_type,
            scaling_adjustment: req.scaling_adjustment,
            extra: Extra::new(),
        };
        state.policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    async fn delete_auto_scale_policy(&self, policy_id: &str) -> Result<()> {
        self.state
            .write()
            .await
            .policies
            .remove(policy_id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "autoscale policy", policy_id))
    }
}
