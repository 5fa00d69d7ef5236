//! Registry and session tests over the built-in driver table
//!
//! ```bash
//! cargo test -p cloud-orchestrator-core --test registry_test
//! ```

#![cfg(feature = "all-providers")]

use cloud_orchestrator_core::{
    CoreError, DriverRegistry, SessionManager, DEFAULT_DRIVERS,
};
use cloud_orchestrator_provider::{
    provider_keys, CreateRecordRequest, CreateZoneRequest, DriverCredentials, DriverFamily,
    DriverOptions, Extra, ProviderError, ProviderKey, RecordType,
};

#[tokio::test]
async fn every_default_key_resolves_to_its_family() {
    let registry = DriverRegistry::with_defaults();
    for (key, _, class_name) in DEFAULT_DRIVERS {
        let class = registry
            .get_driver(key)
            .await
            .unwrap_or_else(|e| panic!("{key} did not resolve: {e}"));
        assert_eq!(class.name(), *class_name);
        assert_eq!(class.family(), key.family(), "{key}");
    }
}

#[tokio::test]
async fn listing_by_family() {
    let registry = DriverRegistry::with_defaults();
    let dns: Vec<_> = registry
        .list_providers(Some(DriverFamily::Dns))
        .await
        .into_iter()
        .map(|row| row.key)
        .collect();
    assert_eq!(dns, vec![provider_keys::dns::CLOUDFLARE, provider_keys::dns::DUMMY]);
    assert_eq!(
        registry.list_providers(None).await.len(),
        DEFAULT_DRIVERS.len()
    );
    assert_eq!(
        registry.provider_metadata().await.len(),
        DEFAULT_DRIVERS.len()
    );
}

#[tokio::test]
async fn dummy_dns_through_typed_constructor() {
    let registry = DriverRegistry::with_defaults();
    let dns = registry
        .create_dns_driver(
            &provider_keys::dns::DUMMY,
            DriverCredentials::default(),
            &DriverOptions::default(),
        )
        .await
        .unwrap();

    let zone = dns
        .create_zone(&CreateZoneRequest {
            domain: "example.org".to_string(),
            ..CreateZoneRequest::default()
        })
        .await
        .unwrap();
    let record = dns
        .create_record(&CreateRecordRequest {
            zone_id: zone.id.clone(),
            name: "www".to_string(),
            record_type: RecordType::A,
            data: "192.0.2.10".to_string(),
            ttl: Some(300),
            extra: Extra::new(),
        })
        .await
        .unwrap();
    assert_eq!(dns.get_record(&zone.id, &record.id).await.unwrap().data, "192.0.2.10");
}

#[tokio::test]
async fn wrong_family_constructor_is_rejected() {
    let registry = DriverRegistry::with_defaults();
    let err = registry
        .create_storage_driver(
            &provider_keys::compute::DUMMY,
            DriverCredentials::default(),
            &DriverOptions::default(),
        )
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        CoreError::FamilyMismatch {
            expected: DriverFamily::Storage,
            actual: DriverFamily::Compute,
            ..
        }
    ));
}

#[tokio::test]
async fn builtin_class_can_serve_an_extra_key() {
    let registry = DriverRegistry::with_defaults();
    let key = ProviderKey::new(DriverFamily::Compute, "sandbox");
    registry
        .set_driver(
            key.clone(),
            provider_keys::locators::DUMMY,
            "DummyNodeDriver",
        )
        .await
        .unwrap();

    let node = registry
        .create_node_driver(&key, DriverCredentials::default(), &DriverOptions::default())
        .await
        .unwrap();
    assert_eq!(node.id(), "dummy");
}

#[tokio::test]
async fn sessions_hold_independent_drivers() {
    let sessions = SessionManager::in_memory(DriverRegistry::with_defaults());
    let options = DriverOptions::default();
    let a = sessions
        .open(&provider_keys::dns::DUMMY, DriverCredentials::default(), &options, true)
        .await
        .unwrap();
    let b = sessions
        .open(&provider_keys::dns::DUMMY, DriverCredentials::default(), &options, false)
        .await
        .unwrap();
    assert_ne!(a, b);

    let dns_a = sessions.driver(&a).await.unwrap().into_dns().unwrap();
    dns_a
        .create_zone(&CreateZoneRequest {
            domain: "a.example".to_string(),
            ..CreateZoneRequest::default()
        })
        .await
        .unwrap();
    let dns_b = sessions.driver(&b).await.unwrap().into_dns().unwrap();
    let zones = dns_b.list_zones(&Default::default()).await.unwrap();
    assert_eq!(zones.total_count, 0);

    assert_eq!(sessions.sessions().await.len(), 2);
    sessions.close(&a).await.unwrap();
    assert!(matches!(
        sessions.driver(&a).await,
        Err(CoreError::SessionNotFound(_))
    ));
    assert!(matches!(
        sessions.close(&a).await,
        Err(CoreError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn session_open_surfaces_credential_errors() {
    let sessions = SessionManager::in_memory(DriverRegistry::with_defaults());
    let err = sessions
        .open(
            &provider_keys::storage::LOCAL,
            DriverCredentials::new(""),
            &DriverOptions::default(),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Provider(ProviderError::InvalidParameter { ref param, .. }) if param == "credentials"
    ));
    assert!(sessions.sessions().await.is_empty());
}
