//! Driver module and class resolution tests
//!
//! ```bash
//! cargo test -p cloud-orchestrator-provider --test factory_test
//! ```

#![cfg(feature = "dummy")]

mod common;

use cloud_orchestrator_provider::{
    CreateNodeRequest, DriverCredentials, DriverFamily, DriverOptions, NodeState,
    builtin_modules, get_all_provider_metadata, provider_keys,
};
use common::instantiate;

#[tokio::test]
async fn dummy_module_serves_every_family() {
    let cases = [
        ("DummyNodeDriver", DriverFamily::Compute),
        ("DummyStorageDriver", DriverFamily::Storage),
        ("DummyDnsDriver", DriverFamily::Dns),
        ("DummyAutoScaleDriver", DriverFamily::AutoScale),
    ];
    for (class_name, family) in cases {
        let driver = require_ok!(require_some!(
            instantiate(
                provider_keys::locators::DUMMY,
                class_name,
                DriverCredentials::default(),
                &DriverOptions::default(),
            ),
            "class {class_name} missing"
        ));
        assert_eq!(driver.family(), family, "{class_name}");
        assert_eq!(driver.id(), "dummy");
        assert!(require_ok!(driver.validate_credentials().await));
    }
}

#[tokio::test]
async fn instantiated_driver_converts_only_to_its_family() {
    let driver = require_ok!(require_some!(instantiate(
        provider_keys::locators::DUMMY,
        "DummyNodeDriver",
        DriverCredentials::default(),
        &DriverOptions::default(),
    )));
    assert!(driver.clone().into_dns().is_none());
    assert!(driver.clone().into_storage().is_none());
    assert!(driver.clone().into_autoscale().is_none());

    let compute = require_some!(driver.into_compute());
    let node = require_ok!(
        compute
            .create_node(&CreateNodeRequest {
                name: "n1".to_string(),
                size: "small".to_string(),
                image: "debian-12".to_string(),
                ..CreateNodeRequest::default()
            })
            .await
    );
    assert_eq!(node.state, NodeState::Pending);
}

#[test]
fn unknown_class_is_absent() {
    assert!(
        instantiate(
            provider_keys::locators::DUMMY,
            "NoSuchDriver",
            DriverCredentials::default(),
            &DriverOptions::default(),
        )
        .is_none()
    );
}

#[test]
fn builtin_locators_are_unique() {
    let mut locators: Vec<_> = builtin_modules().into_iter().map(|(l, _)| l).collect();
    let total = locators.len();
    locators.sort_unstable();
    locators.dedup();
    assert_eq!(locators.len(), total);
    assert!(locators.contains(&provider_keys::locators::DUMMY));
}

#[test]
fn metadata_lists_dummy_keys() {
    let keys: Vec<String> = get_all_provider_metadata()
        .iter()
        .map(|m| m.key.to_string())
        .collect();
    for expected in [
        provider_keys::compute::DUMMY,
        provider_keys::storage::DUMMY,
        provider_keys::dns::DUMMY,
        provider_keys::autoscale::DUMMY,
    ] {
        assert!(
            keys.contains(&expected.to_string()),
            "{expected} missing from {keys:?}"
        );
    }
}
