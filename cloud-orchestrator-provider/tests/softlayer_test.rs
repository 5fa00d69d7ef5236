//! SoftLayer driver tests against a wiremock server
//!
//! ```bash
//! cargo test -p cloud-orchestrator-provider --test softlayer_test
//! ```

#![cfg(feature = "softlayer")]

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cloud_orchestrator_provider::{
    AutoScaleAdjustmentType, AutoScaleDriver, CreateAutoScaleGroupRequest,
    CreateAutoScalePolicyRequest, DriverCredentials, Extra, ProviderError,
    SoftlayerAutoScaleDriver, provider_keys,
};
use common::{instantiate, json, mock_options};
use serde_json::json as body;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer};

fn driver(server: &MockServer) -> SoftlayerAutoScaleDriver {
    SoftlayerAutoScaleDriver::new(
        "sl-user".to_string(),
        "sl-key".to_string(),
        &mock_options(&server.uri()),
    )
    .expect("创建 driver 失败")
}

fn group(status: &str) -> serde_json::Value {
    body!({
        "id": 55,
        "name": "web",
        "minimumMemberCount": 1,
        "maximumMemberCount": 3,
        "cooldown": 300,
        "status": {"keyName": status},
        "terminationPolicy": {"keyName": "NEWEST"}
    })
}

fn group_request() -> CreateAutoScaleGroupRequest {
    CreateAutoScaleGroupRequest {
        name: "web".to_string(),
        min_size: 1,
        max_size: 3,
        cooldown: 300,
        termination_policies: Vec::new(),
        size: Some("B1_1X2X25".to_string()),
        image: Some("DEBIAN_LATEST".to_string()),
        location: Some("dal13".to_string()),
        extra: Extra::new(),
    }
}

#[tokio::test]
async fn create_waits_until_active() {
    let server = MockServer::start().await;
    let auth = format!("Basic {}", STANDARD.encode("sl-user:sl-key"));
    Mock::given(method("POST"))
        .and(path("/SoftLayer_Scale_Group.json"))
        .and(header("authorization", auth.as_str()))
        .respond_with(json(201, group("PENDING")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/55.json"))
        .respond_with(json(200, group("PENDING")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/55.json"))
        .respond_with(json(200, group("ACTIVE")))
        .mount(&server)
        .await;

    let created = require_ok!(driver(&server).create_auto_scale_group(&group_request()).await);
    assert_eq!(created.id, "55");
    assert_eq!(created.extra["status"], "ACTIVE");
}

#[tokio::test]
async fn delete_waits_until_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/55/forceDeleteObject.json"))
        .respond_with(json(200, body!(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/55.json"))
        .respond_with(json(200, group("ACTIVE")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/55.json"))
        .respond_with(json(
            404,
            body!({
                "error": "Unable to find object with id of '55'.",
                "code": "SoftLayer_Exception_ObjectNotFound"
            }),
        ))
        .mount(&server)
        .await;

    require_ok!(driver(&server).delete_auto_scale_group("55").await);
}

#[tokio::test]
async fn create_needs_member_template_fields() {
    let server = MockServer::start().await;
    let mut req = group_request();
    req.image = None;

    let err = driver(&server)
        .create_auto_scale_group(&req)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "image"
    ));
}

#[tokio::test]
async fn policies_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/SoftLayer_Scale_Policy.json"))
        .respond_with(json(
            201,
            body!({
                "id": 9,
                "name": "out",
                "scaleGroupId": 55,
                "scaleActions": [{"amount": 2, "scaleType": "RELATIVE"}]
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/SoftLayer_Scale_Policy/9.json"))
        .respond_with(json(200, body!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let driver = driver(&server);
    let policy = require_ok!(
        driver
            .create_auto_scale_policy(&CreateAutoScalePolicyRequest {
                group_id: "55".to_string(),
                name: "out".to_string(),
                adjustment_type: AutoScaleAdjustmentType::ChangeInCapacity,
                scaling_adjustment: 2,
            })
            .await
    );
    assert_eq!(policy.id, "9");
    assert_eq!(policy.group_id, "55");
    assert_eq!(policy.scaling_adjustment, 2);

    require_ok!(driver.delete_auto_scale_policy(&policy.id).await);
}

#[tokio::test]
async fn factory_requires_api_key() {
    let result = require_some!(instantiate(
        provider_keys::locators::SOFTLAYER,
        "SoftlayerAutoScaleDriver",
        DriverCredentials::new("sl-user"),
        &mock_options("http://127.0.0.1:1"),
    ));
    assert!(matches!(
        result,
        Err(ProviderError::InvalidParameter { ref param, .. }) if param == "credentials"
    ));
}

#[tokio::test]
async fn unmapped_exception_keeps_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SoftLayer_Scale_Group/9.json"))
        .respond_with(json(
            500,
            body!({"error": "Internal Error", "code": "SoftLayer_Exception_Public"}),
        ))
        .mount(&server)
        .await;

    let err = driver(&server).get_auto_scale_group("9").await.unwrap_err();
    assert!(
        matches!(
            err,
            ProviderError::HttpStatus { status: 500, raw_message: Some(ref m), .. }
                if m.contains("Internal Error")
        ),
        "got {err:?}"
    );
}
