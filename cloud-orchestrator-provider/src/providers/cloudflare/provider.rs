//! Cloudflare DnsDriver trait 实现

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::connection::HttpRequest;
use crate::error::{ProviderError, Result};
use crate::providers::common::{
    full_name_to_relative, normalize_domain_name, parse_record_type, path_segment,
    relative_to_full_name,
};
use crate::traits::{DnsDriver, ErrorContext, ProviderDriver, ProviderErrorMapper};
use crate::types::{
    CreateRecordRequest, CreateZoneRequest, Extra, PaginatedResponse, PaginationParams, Record,
    RecordQueryParams, RecordType, UpdateRecordRequest, Zone, ZoneType,
};

use super::types::{AccountRef, RecordBody, ZoneBody};
use super::{CloudflareDnsDriver, CfRecord, CfZone, MAX_PAGE_SIZE_RECORDS};

/// TTL value meaning "automatic" for Cloudflare.
const AUTO_TTL: u32 = 1;

impl CloudflareDnsDriver {
    /// 将 Cloudflare zone 转换为 Zone
    /// Cloudflare zone 类型：full, partial, secondary
    pub(crate) fn cf_zone_to_zone(zone: CfZone) -> Zone {
        let zone_type = match zone.zone_type.as_deref() {
            Some("secondary") => ZoneType::Slave,
            _ => ZoneType::Master,
        };
        let mut extra = zone.extra;
        if let Some(t) = zone.zone_type {
            extra.insert("cloudflare_type".to_string(), Value::String(t));
        }

        Zone {
            id: zone.id,
            domain: normalize_domain_name(&zone.name),
            zone_type,
            ttl: None,
            extra,
        }
    }

    /// 将 Cloudflare 记录转换为 `Record`
    pub(crate) fn cf_record_to_record(
        &self,
        cf_record: CfRecord,
        zone_id: &str,
        zone_name: &str,
    ) -> Result<Record> {
        let record_type = parse_record_type(&cf_record.record_type, self.provider_name())?;

        Ok(Record {
            id: cf_record.id,
            zone_id: zone_id.to_string(),
            name: full_name_to_relative(&cf_record.name, zone_name),
            record_type,
            data: cf_record.content,
            ttl: (cf_record.ttl != AUTO_TTL).then_some(cf_record.ttl),
            extra: cf_record.extra,
        })
    }

    fn record_body(
        zone_name: &str,
        name: &str,
        record_type: RecordType,
        data: &str,
        ttl: Option<u32>,
        extra: &Extra,
    ) -> RecordBody {
        RecordBody {
            record_type: record_type.as_str(),
            name: relative_to_full_name(name, zone_name),
            content: data.to_string(),
            ttl: ttl.unwrap_or(AUTO_TTL),
            priority: extra.get("priority").and_then(Value::as_u64),
            proxied: extra.get("proxied").and_then(Value::as_bool),
        }
    }
}

#[async_trait]
impl ProviderDriver for CloudflareDnsDriver {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        #[derive(Deserialize)]
        struct VerifyResponse {
            status: String,
        }

        match self
            .call::<VerifyResponse>(
                HttpRequest::get("/user/tokens/verify"),
                ErrorContext::default(),
            )
            .await
        {
            Ok(resp) => Ok(resp.status == "active"),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DnsDriver for CloudflareDnsDriver {
    fn list_record_types(&self) -> Vec<RecordType> {
        vec![
            RecordType::A,
            RecordType::Aaaa,
            RecordType::Cname,
            RecordType::Mx,
            RecordType::Txt,
            RecordType::Ns,
            RecordType::Srv,
            RecordType::Caa,
            RecordType::Ptr,
        ]
    }

    async fn list_zones(&self, params: &PaginationParams) -> Result<PaginatedResponse<Zone>> {
        let page = self.list_zones_raw(params).await?;
        let zones = page.items.into_iter().map(Self::cf_zone_to_zone).collect();
        Ok(PaginatedResponse::new(
            zones,
            page.page,
            page.page_size,
            page.total_count,
        ))
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        Ok(Self::cf_zone_to_zone(self.get_zone_raw(zone_id).await?))
    }

    async fn create_zone(&self, req: &CreateZoneRequest) -> Result<Zone> {
        let body = ZoneBody {
            name: normalize_domain_name(&req.domain),
            zone_type: match req.zone_type {
                ZoneType::Master => "full",
                ZoneType::Slave => "secondary",
            },
            account: req
                .extra
                .get("account_id")
                .and_then(Value::as_str)
                .map(|id| AccountRef { id: id.to_string() }),
        };
        let request = HttpRequest::post("/zones").json(self.id(), &body)?;
        let zone: CfZone = self
            .call(request, ErrorContext::resource("zone").name(&req.domain))
            .await?;
        Ok(Self::cf_zone_to_zone(zone))
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.call_unit(
            HttpRequest::delete(format!("/zones/{}", path_segment(zone_id))),
            ErrorContext::resource("zone").id(zone_id),
        )
        .await
    }

    async fn list_records(
        &self,
        zone_id: &str,
        params: &RecordQueryParams,
    ) -> Result<PaginatedResponse<Record>> {
        // 先获取 zone 信息以获取域名
        let zone_name = self.get_zone_raw(zone_id).await?.name;

        let mut request = HttpRequest::get(format!("/zones/{}/dns_records", path_segment(zone_id)));

        // 添加搜索关键词（只搜索记录名称）
        if let Some(ref keyword) = params.keyword
            && !keyword.is_empty()
        {
            request = request.query("name.contains", keyword);
        }

        // 添加记录类型过滤
        if let Some(record_type) = params.record_type {
            request = request.query("type", record_type.as_str());
        }

        let page: PaginatedResponse<CfRecord> = self
            .get_paginated(
                request,
                &params.to_pagination(),
                MAX_PAGE_SIZE_RECORDS,
                ErrorContext::resource("zone").id(zone_id),
            )
            .await?;

        let records = page
            .items
            .into_iter()
            .map(|r| self.cf_record_to_record(r, zone_id, &zone_name))
            .collect::<Result<Vec<_>>>()?;

        Ok(PaginatedResponse::new(
            records,
            page.page,
            page.page_size,
            page.total_count,
        ))
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record> {
        let zone_name = self.get_zone_raw(zone_id).await?.name;
        let cf_record: CfRecord = self
            .call(
                HttpRequest::get(format!(
                    "/zones/{}/dns_records/{}",
                    path_segment(zone_id),
                    path_segment(record_id)
                )),
                ErrorContext::resource("record").id(record_id),
            )
            .await?;
        self.cf_record_to_record(cf_record, zone_id, &zone_name)
    }

    async fn create_record(&self, req: &CreateRecordRequest) -> Result<Record> {
        // 先获取 zone 信息
        let zone_name = self.get_zone_raw(&req.zone_id).await?.name;

        let body = Self::record_body(
            &zone_name,
            &req.name,
            req.record_type,
            &req.data,
            req.ttl,
            &req.extra,
        );
        let request = HttpRequest::post(format!("/zones/{}/dns_records", path_segment(&req.zone_id)))
            .json(self.id(), &body)?;

        let cf_record: CfRecord = self
            .call(request, ErrorContext::resource("record").name(&req.name))
            .await?;

        self.cf_record_to_record(cf_record, &req.zone_id, &zone_name)
    }

    async fn update_record(&self, record_id: &str, req: &UpdateRecordRequest) -> Result<Record> {
        let zone_name = self.get_zone_raw(&req.zone_id).await?.name;

        let body = Self::record_body(
            &zone_name,
            &req.name,
            req.record_type,
            &req.data,
            req.ttl,
            &req.extra,
        );
        let request =
            HttpRequest::patch(format!(
                "/zones/{}/dns_records/{}",
                path_segment(&req.zone_id),
                path_segment(record_id)
            ))
                .json(self.id(), &body)?;

        let cf_record: CfRecord = self
            .call(
                request,
                ErrorContext::resource("record")
                    .id(record_id)
                    .name(&req.name),
            )
            .await?;

        self.cf_record_to_record(cf_record, &req.zone_id, &zone_name)
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.call_unit(
            HttpRequest::delete(format!(
                    "/zones/{}/dns_records/{}",
                    path_segment(zone_id),
                    path_segment(record_id)
                )),
            ErrorContext::resource("record").id(record_id),
        )
        .await
    }
}
