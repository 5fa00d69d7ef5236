//! SoftLayer AutoScaleDriver trait 实现

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::connection::HttpRequest;
use crate::error::{ProviderError, Result};
use crate::poller::{OperationStatus, StatusCheck, poll_until_complete};
use crate::traits::{AutoScaleDriver, ErrorContext, ProviderDriver, ProviderErrorMapper};
use crate::types::{
    AutoScaleAdjustmentType, AutoScaleGroup, AutoScalePolicy, AutoScaleTerminationPolicy,
    CreateAutoScaleGroupRequest, CreateAutoScalePolicyRequest,
};

use super::SoftlayerAutoScaleDriver;
use super::http::{GROUP_MASK, POLICY_MASK};
use super::types::{
    Parameters, ScaleActionBody, ScaleGroupBody, ScalePolicyBody, SlKeyName, SlScaleGroup,
    SlScalePolicy,
};

/// Member template domain used when the request does not set `extra.domain`.
const DEFAULT_DOMAIN: &str = "example.com";

impl SoftlayerAutoScaleDriver {
    fn termination_to_key(policy: AutoScaleTerminationPolicy) -> &'static str {
        match policy {
            AutoScaleTerminationPolicy::OldestInstance => "OLDEST",
            AutoScaleTerminationPolicy::NewestInstance => "NEWEST",
            AutoScaleTerminationPolicy::ClosestToNextCharge
            | AutoScaleTerminationPolicy::Default => "CLOSEST_TO_NEXT_CHARGE",
        }
    }

    fn termination_from_key(key: &str) -> AutoScaleTerminationPolicy {
        match key {
            "OLDEST" => AutoScaleTerminationPolicy::OldestInstance,
            "NEWEST" => AutoScaleTerminationPolicy::NewestInstance,
            "CLOSEST_TO_NEXT_CHARGE" => AutoScaleTerminationPolicy::ClosestToNextCharge,
            _ => AutoScaleTerminationPolicy::Default,
        }
    }

    fn adjustment_to_scale_type(adjustment: AutoScaleAdjustmentType) -> &'static str {
        match adjustment {
            AutoScaleAdjustmentType::ChangeInCapacity => "RELATIVE",
            AutoScaleAdjustmentType::ExactCapacity => "ABSOLUTE",
            AutoScaleAdjustmentType::PercentChangeInCapacity => "PERCENT",
        }
    }

    fn adjustment_from_scale_type(scale_type: &str) -> AutoScaleAdjustmentType {
        match scale_type {
            "ABSOLUTE" => AutoScaleAdjustmentType::ExactCapacity,
            "PERCENT" => AutoScaleAdjustmentType::PercentChangeInCapacity,
            _ => AutoScaleAdjustmentType::ChangeInCapacity,
        }
    }

    pub(crate) fn sl_group_to_group(group: SlScaleGroup) -> AutoScaleGroup {
        let mut extra = group.extra;
        if let Some(status) = group.status {
            extra.insert("status".to_string(), Value::String(status.key_name));
        }
        AutoScaleGroup {
            id: group.id.to_string(),
            name: group.name,
            min_size: group.minimum_member_count,
            max_size: group.maximum_member_count,
            cooldown: group.cooldown,
            termination_policies: group
                .termination_policy
                .map(|p| vec![Self::termination_from_key(&p.key_name)])
                .unwrap_or_default(),
            extra,
        }
    }

    /// SoftLayer 策略只取第一个 scale action
    fn sl_policy_to_policy(policy: SlScalePolicy) -> AutoScalePolicy {
        let (adjustment_type, scaling_adjustment) = policy
            .scale_actions
            .first()
            .map_or((AutoScaleAdjustmentType::ChangeInCapacity, 0), |a| {
                (Self::adjustment_from_scale_type(&a.scale_type), a.amount)
            });
        AutoScalePolicy {
            id: policy.id.to_string(),
            name: policy.name,
            group_id: policy.scale_group_id.to_string(),
            adjustment_type,
            scaling_adjustment,
            extra: policy.extra,
        }
    }

    fn numeric_id(&self, param: &str, id: &str) -> Result<u64> {
        id.parse().map_err(|_| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: param.to_string(),
            detail: format!("'{id}' is not a numeric id"),
        })
    }

    fn member_template(&self, req: &CreateAutoScaleGroupRequest) -> Result<Value> {
        let missing = |field: &str| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: field.to_string(),
            detail: format!("SoftLayer scale groups need a member {field}"),
        };
        let size = req.size.as_deref().ok_or_else(|| missing("size"))?;
        let image = req.image.as_deref().ok_or_else(|| missing("image"))?;
        let location = req.location.as_deref().ok_or_else(|| missing("location"))?;
        let domain = req
            .extra
            .get("domain")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DOMAIN);

        Ok(json!({
            "hostname": req.name,
            "domain": domain,
            "datacenter": {"name": location},
            "operatingSystemReferenceCode": image,
            "supplementalCreateObjectOptions": {"flavorKeyName": size},
            "hourlyBillingFlag": true,
            "localDiskFlag": false,
        }))
    }

    /// 轮询伸缩组状态直到 ACTIVE
    async fn wait_until_active(&self, group_id: &str) -> Result<()> {
        let outcome = poll_until_complete(self.provider_name(), group_id, &self.poll, || async move {
            match self.get_group_raw(group_id).await {
                Ok(group) => {
                    let key = group.status.map(|s| s.key_name).unwrap_or_default();
                    let state = if key == "ACTIVE" {
                        "done".to_string()
                    } else {
                        key.to_lowercase()
                    };
                    Ok(StatusCheck::Reported(OperationStatus::new(state)))
                }
                Err(ProviderError::ResourceNotFound { .. }) => Ok(StatusCheck::Gone),
                Err(e) => Err(e),
            }
        })
        .await?;
        outcome.into_result(self.provider_name(), "create_auto_scale_group", &self.poll)?;
        Ok(())
    }

    /// 轮询直到伸缩组消失（404 视为完成）
    async fn wait_until_gone(&self, group_id: &str) -> Result<()> {
        let policy = self.poll.not_found_means_done(true);
        let outcome = poll_until_complete(self.provider_name(), group_id, &policy, || async move {
            match self.get_group_raw(group_id).await {
                Ok(group) => {
                    let key = group.status.map_or_else(|| "unknown".to_string(), |s| s.key_name);
                    Ok(StatusCheck::Reported(OperationStatus::new(format!(
                        "deleting ({key})"
                    ))))
                }
                Err(ProviderError::ResourceNotFound { .. }) => Ok(StatusCheck::Gone),
                Err(e) => Err(e),
            }
        })
        .await?;
        outcome.into_result(self.provider_name(), "delete_auto_scale_group", &policy)?;
        Ok(())
    }
}

#[async_trait]
impl ProviderDriver for SoftlayerAutoScaleDriver {
    fn id(&self) -> &'static str {
        "softlayer"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self
            .call::<Value>(
                HttpRequest::get("/SoftLayer_Account.json").query("objectMask", "mask[id]"),
                ErrorContext::default(),
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AutoScaleDriver for SoftlayerAutoScaleDriver {
    async fn list_auto_scale_groups(&self) -> Result<Vec<AutoScaleGroup>> {
        let groups: Vec<SlScaleGroup> = self
            .call(
                HttpRequest::get("/SoftLayer_Account/getScaleGroups.json")
                    .query("objectMask", GROUP_MASK),
                ErrorContext::resource("autoscale group"),
            )
            .await?;
        Ok(groups.into_iter().map(Self::sl_group_to_group).collect())
    }

    async fn get_auto_scale_group(&self, group_id: &str) -> Result<AutoScaleGroup> {
        self.numeric_id("group_id", group_id)?;
        Ok(Self::sl_group_to_group(self.get_group_raw(group_id).await?))
    }

    async fn create_auto_scale_group(
        &self,
        req: &CreateAutoScaleGroupRequest,
    ) -> Result<AutoScaleGroup> {
        let termination = req
            .termination_policies
            .first()
            .copied()
            .unwrap_or(AutoScaleTerminationPolicy::Default);
        let body = Parameters::one(ScaleGroupBody {
            name: &req.name,
            minimum_member_count: req.min_size,
            maximum_member_count: req.max_size,
            cooldown: req.cooldown,
            termination_policy: SlKeyName::new(Self::termination_to_key(termination)),
            regional_group: req
                .extra
                .get("regional_group")
                .and_then(Value::as_str)
                .map(|name| json!({"name": name})),
            virtual_guest_member_template: self.member_template(req)?,
        });

        let created: SlScaleGroup = self
            .call(
                HttpRequest::post("/SoftLayer_Scale_Group.json")
                    .json(self.provider_name(), &body)?,
                ErrorContext::resource("autoscale group").name(&req.name),
            )
            .await?;
        let group_id = created.id.to_string();
        log::info!("[softlayer] Created scale group {group_id} ({}), waiting for ACTIVE", req.name);

        self.wait_until_active(&group_id).await?;
        self.get_auto_scale_group(&group_id).await
    }

    async fn delete_auto_scale_group(&self, group_id: &str) -> Result<()> {
        self.numeric_id("group_id", group_id)?;
        let accepted: bool = self
            .call(
                HttpRequest::get(format!(
                    "/SoftLayer_Scale_Group/{group_id}/forceDeleteObject.json"
                )),
                ErrorContext::resource("autoscale group").id(group_id),
            )
            .await?;
        if !accepted {
            return Err(ProviderError::OperationFailed {
                provider: self.provider_name().to_string(),
                operation: "delete_auto_scale_group".to_string(),
                raw_message: format!("SoftLayer refused to delete scale group {group_id}"),
            });
        }
        log::info!("[softlayer] Deleting scale group {group_id}");
        self.wait_until_gone(group_id).await
    }

    async fn list_auto_scale_policies(&self, group_id: &str) -> Result<Vec<AutoScalePolicy>> {
        self.numeric_id("group_id", group_id)?;
        let policies: Vec<SlScalePolicy> = self
            .call(
                HttpRequest::get(format!("/SoftLayer_Scale_Group/{group_id}/getPolicies.json"))
                    .query("objectMask", POLICY_MASK),
                ErrorContext::resource("autoscale group").id(group_id),
            )
            .await?;
        Ok(policies
            .into_iter()
            .map(Self::sl_policy_to_policy)
            .collect())
    }

    async fn create_auto_scale_policy(
        &self,
        req: &CreateAutoScalePolicyRequest,
    ) -> Result<AutoScalePolicy> {
        let scale_group_id = self.numeric_id("group_id", &req.group_id)?;
        let body = Parameters::one(ScalePolicyBody {
            name: &req.name,
            scale_group_id,
            complex_type: "SoftLayer_Scale_Policy",
            scale_actions: vec![ScaleActionBody {
                amount: req.scaling_adjustment,
                scale_type: Self::adjustment_to_scale_type(req.adjustment_type),
                complex_type: "SoftLayer_Scale_Policy_Action_Scale",
            }],
        });
        let policy: SlScalePolicy = self
            .call(
                HttpRequest::post("/SoftLayer_Scale_Policy.json")
                    .query("objectMask", POLICY_MASK)
                    .json(self.provider_name(), &body)?,
                ErrorContext::resource("autoscale policy").name(&req.name),
            )
            .await?;
        Ok(Self::sl_policy_to_policy(policy))
    }

    async fn delete_auto_scale_policy(&self, policy_id: &str) -> Result<()> {
        self.numeric_id("policy_id", policy_id)?;
        let _: bool = self
            .call(
                HttpRequest::delete(format!("/SoftLayer_Scale_Policy/{policy_id}.json")),
                ErrorContext::resource("autoscale policy").id(policy_id),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_is_normalized() {
        let group: SlScaleGroup = serde_json::from_value(json!({
            "id": 12345,
            "name": "web",
            "minimumMemberCount": 1,
            "maximumMemberCount": 5,
            "cooldown": 600,
            "status": {"keyName": "ACTIVE", "name": "Active"},
            "terminationPolicy": {"keyName": "OLDEST"},
            "regionalGroup": {"name": "na-usa-central-1"}
        }))
        .unwrap();

        let group = SoftlayerAutoScaleDriver::sl_group_to_group(group);
        assert_eq!(group.id, "12345");
        assert_eq!(group.max_size, 5);
        assert_eq!(
            group.termination_policies,
            vec![AutoScaleTerminationPolicy::OldestInstance]
        );
        assert_eq!(group.extra["status"], "ACTIVE");
        assert_eq!(group.extra["regionalGroup"]["name"], "na-usa-central-1");
    }

    #[test]
    fn adjustment_types_map_both_ways() {
        for adjustment in [
            AutoScaleAdjustmentType::ChangeInCapacity,
            AutoScaleAdjustmentType::ExactCapacity,
            AutoScaleAdjustmentType::PercentChangeInCapacity,
        ] {
            let scale_type = SoftlayerAutoScaleDriver::adjustment_to_scale_type(adjustment);
            assert_eq!(
                SoftlayerAutoScaleDriver::adjustment_from_scale_type(scale_type),
                adjustment
            );
        }
    }
}
