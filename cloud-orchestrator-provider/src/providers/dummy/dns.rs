use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ProviderError, Result};
use crate::providers::common::normalize_domain_name;
use crate::traits::{DnsDriver, ProviderDriver};
use crate::types::{
    CreateRecordRequest, CreateZoneRequest, PaginatedResponse, PaginationParams, Record,
    RecordQueryParams, RecordType, UpdateRecordRequest, Zone,
};

use super::PROVIDER;

#[derive(Default)]
struct State {
    zones: BTreeMap<String, Zone>,
    /// zone id -> record id -> record
    records: BTreeMap<String, BTreeMap<String, Record>>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn zone_records(&mut self, zone_id: &str) -> Result<&mut BTreeMap<String, Record>> {
        self.records
            .get_mut(zone_id)
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "zone", zone_id))
    }
}

/// In-memory DNS driver.
#[derive(Default)]
pub struct DummyDnsDriver {
    state: RwLock<State>,
}

impl DummyDnsDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderDriver for DummyDnsDriver {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn validate_credentials(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl DnsDriver for DummyDnsDriver {
    fn list_record_types(&self) -> Vec<RecordType> {
        vec![
            RecordType::A,
            RecordType::Aaaa,
            RecordType::Cname,
            RecordType::Mx,
            RecordType::Txt,
            RecordType::Ns,
            RecordType::Srv,
        ]
    }

    async fn list_zones(&self, params: &PaginationParams) -> Result<PaginatedResponse<Zone>> {
        let zones = self.state.read().await.zones.values().cloned().collect();
        Ok(PaginatedResponse::from_full_list(zones, params))
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        self.state
            .read()
            .await
            .zones
            .get(zone_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "zone", zone_id))
    }

    async fn create_zone(&self, req: &CreateZoneRequest) -> Result<Zone> {
        let domain = normalize_domain_name(&req.domain);
        let mut state = self.state.write().await;
        if state.zones.values().any(|z| z.domain == domain) {
            return Err(ProviderError::ResourceExists {
                provider: PROVIDER.to_string(),
                resource: "zone".to_string(),
                name: domain,
                raw_message: None,
            });
        }
        let zone = Zone {
            id: state.next_id(),
            domain,
            zone_type: req.zone_type,
            ttl: req.ttl,
            extra: req.extra.clone(),
        };
        state.zones.insert(zone.id.clone(), zone.clone());
        state.records.insert(zone.id.clone(), BTreeMap::new());
        Ok(zone)
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .zones
            .remove(zone_id)
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "zone", zone_id))?;
        state.records.remove(zone_id);
        Ok(())
    }

    async fn list_records(
        &self,
        zone_id: &str,
        params: &RecordQueryParams,
    ) -> Result<PaginatedResponse<Record>> {
        let mut state = self.state.write().await;
        let records = state
            .zone_records(zone_id)?
            .values()
            .filter(|r| params.matches(r))
            .cloned()
            .collect();
        Ok(PaginatedResponse::from_full_list(
            records,
            &params.to_pagination(),
        ))
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record> {
        let mut state = self.state.write().await;
        state
            .zone_records(zone_id)?
            .get(record_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "record", record_id))
    }

    async fn create_record(&self, req: &CreateRecordRequest) -> Result<Record> {
        if !self.list_record_types().contains(&req.record_type) {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER.to_string(),
                param: "record_type".to_string(),
                detail: format!("unsupported record type: {}", req.record_type),
            });
        }
        let mut state = self.state.write().await;
        let id = state.next_id();
        let records = state.zone_records(&req.zone_id)?;
        if records
            .values()
            .any(|r| r.name == req.name && r.record_type == req.record_type && r.data == req.data)
        {
            return Err(ProviderError::ResourceExists {
                provider: PROVIDER.to_string(),
                resource: "record".to_string(),
                name: req.name.clone(),
                raw_message: None,
            });
        }
        let record = Record {
            id: id.clone(),
            zone_id: req.zone_id.clone(),
            name: req.name.clone(),
            record_type: req.record_type,
            data: req.data.clone(),
            ttl: req.ttl,
            extra: req.extra.clone(),
        };
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn update_record(&self, record_id: &str, req: &UpdateRecordRequest) -> Result<Record> {
        let mut state = self.state.write().await;
        let record = state
            .zone_records(&req.zone_id)?
            .get_mut(record_id)
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "record", record_id))?;
        record.name.clone_from(&req.name);
        record.record_type = req.record_type;
        record.data.clone_from(&req.data);
        record.ttl = req.ttl;
        record.extra.clone_from(&req.extra);
        Ok(record.clone())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .zone_records(zone_id)?
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::not_found(PROVIDER, "record", record_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extra;

    fn record(zone_id: &str, name: &str, data: &str) -> CreateRecordRequest {
        CreateRecordRequest {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            record_type: RecordType::A,
            data: data.to_string(),
            ttl: Some(300),
            extra: Extra::new(),
        }
    }

    async fn driver_with_zone() -> (DummyDnsDriver, Zone) {
        let driver = DummyDnsDriver::new();
        let zone = driver
            .create_zone(&CreateZoneRequest {
                domain: "example.com.".to_string(),
                ..CreateZoneRequest::default()
            })
            .await
            .unwrap();
        (driver, zone)
    }

    #[tokio::test]
    async fn zone_domain_is_normalized_and_unique() {
        let (driver, zone) = driver_with_zone().await;
        assert_eq!(zone.domain, "example.com");
        let dup = driver
            .create_zone(&CreateZoneRequest {
                domain: "example.com".to_string(),
                ..CreateZoneRequest::default()
            })
            .await;
        assert!(matches!(dup, Err(ProviderError::ResourceExists { .. })));
    }

    #[tokio::test]
    async fn record_crud_and_filtering() {
        let (driver, zone) = driver_with_zone().await;
        let www = driver
            .create_record(&record(&zone.id, "www", "192.0.2.1"))
            .await
            .unwrap();
        driver
            .create_record(&record(&zone.id, "api", "192.0.2.2"))
            .await
            .unwrap();

        let params = RecordQueryParams {
            keyword: Some("ww".to_string()),
            ..RecordQueryParams::default()
        };
        let found = driver.list_records(&zone.id, &params).await.unwrap();
        assert_eq!(found.total_count, 1);
        assert_eq!(found.items[0].id, www.id);

        let updated = driver
            .update_record(
                &www.id,
                &UpdateRecordRequest {
                    zone_id: zone.id.clone(),
                    name: "www".to_string(),
                    record_type: RecordType::A,
                    data: "192.0.2.9".to_string(),
                    ttl: None,
                    extra: Extra::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data, "192.0.2.9");

        driver.delete_record(&zone.id, &www.id).await.unwrap();
        assert!(matches!(
            driver.get_record(&zone.id, &www.id).await,
            Err(ProviderError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn batch_create_collects_failures() {
        let (driver, zone) = driver_with_zone().await;
        let requests = vec![
            record(&zone.id, "a", "192.0.2.1"),
            record("missing-zone", "b", "192.0.2.2"),
            record(&zone.id, "c", "192.0.2.3"),
        ];

        let result = driver.batch_create_records(&requests).await.unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.failures[0].request_index, 1);
        assert_eq!(result.failures[0].record_name, "b");
    }

    #[tokio::test]
    async fn unsupported_record_type_is_rejected() {
        let (driver, zone) = driver_with_zone().await;
        let mut req = record(&zone.id, "@", "ns1.example.com");
        req.record_type = RecordType::Soa;
        assert!(matches!(
            driver.create_record(&req).await,
            Err(ProviderError::InvalidParameter { .. })
        ));
    }
}
