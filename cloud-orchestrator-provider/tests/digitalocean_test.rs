//! DigitalOcean driver tests against a wiremock server
//!
//! ```bash
//! cargo test -p cloud-orchestrator-provider --test digitalocean_test
//! ```

#![cfg(feature = "digitalocean")]

mod common;

use cloud_orchestrator_provider::{
    CreateNodeRequest, DigitalOceanNodeDriver, DriverCredentials, NodeDriver, NodeState,
    ProviderError, VolumeState, provider_keys,
};
use common::{instantiate, json, mock_options};
use serde_json::json as body;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer};

fn driver(server: &MockServer) -> DigitalOceanNodeDriver {
    DigitalOceanNodeDriver::new("do-token".to_string(), &mock_options(&server.uri()))
        .expect("创建 driver 失败")
}

fn droplet(id: u64, name: &str, status: &str) -> serde_json::Value {
    body!({
        "id": id,
        "name": name,
        "status": status,
        "memory": 1024,
        "vcpus": 1,
        "disk": 25,
        "size_slug": "s-1vcpu-1gb",
        "created_at": "2024-05-01T12:00:00Z",
        "image": {"id": 1, "slug": "debian-12-x64", "name": "12 x64"},
        "region": {"slug": "ams3", "name": "Amsterdam 3"},
        "networks": {"v4": [{"ip_address": "203.0.113.10", "type": "public"}], "v6": []}
    })
}

#[tokio::test]
async fn list_nodes_follows_next_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets"))
        .and(header("authorization", "Bearer do-token"))
        .and(query_param("page", "1"))
        .respond_with(json(
            200,
            body!({
                "droplets": [droplet(1, "web-1", "active")],
                "links": {"pages": {
                    "next": "https://api.digitalocean.com/v2/droplets?page=2&per_page=200",
                    "last": "https://api.digitalocean.com/v2/droplets?page=2&per_page=200"
                }},
                "meta": {"total": 2}
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/droplets"))
        .and(query_param("page", "2"))
        .respond_with(json(
            200,
            body!({
                "droplets": [droplet(2, "web-2", "off")],
                "links": {},
                "meta": {"total": 2}
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let nodes = require_ok!(driver(&server).list_nodes().await);
    let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["web-1", "web-2"]);
    assert_eq!(nodes[1].state, NodeState::Stopped);
}

#[tokio::test]
async fn create_node_passes_extra_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets"))
        .and(body_partial_json(body!({
            "name": "web-1",
            "size": "s-1vcpu-1gb",
            "image": "debian-12-x64",
            "region": "ams3",
            "ipv6": true
        })))
        .respond_with(json(202, body!({"droplet": droplet(7, "web-1", "new")})))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = CreateNodeRequest {
        name: "web-1".to_string(),
        size: "s-1vcpu-1gb".to_string(),
        image: "debian-12-x64".to_string(),
        location: Some("ams3".to_string()),
        ..CreateNodeRequest::default()
    };
    req.extra.insert("ipv6".to_string(), true.into());

    let node = require_ok!(driver(&server).create_node(&req).await);
    assert_eq!(node.id, "7");
    assert_eq!(node.state, NodeState::Pending);
    assert_eq!(node.public_ips, vec!["203.0.113.10"]);
}

#[tokio::test]
async fn reboot_waits_for_action_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets/7/actions"))
        .and(body_partial_json(body!({"type": "reboot"})))
        .respond_with(json(
            201,
            body!({"action": {"id": 99, "status": "in-progress", "type": "reboot"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actions/99"))
        .respond_with(json(
            200,
            body!({"action": {"id": 99, "status": "in-progress", "type": "reboot"}}),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actions/99"))
        .respond_with(json(
            200,
            body!({"action": {"id": 99, "status": "completed", "type": "reboot"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    require_ok!(driver(&server).reboot_node("7").await);
}

#[tokio::test]
async fn errored_action_fails_the_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets/7/actions"))
        .respond_with(json(
            201,
            body!({"action": {"id": 5, "status": "in-progress", "type": "power_on"}}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actions/5"))
        .respond_with(json(
            200,
            body!({"action": {"id": 5, "status": "errored", "type": "power_on"}}),
        ))
        .mount(&server)
        .await;

    let err = driver(&server).start_node("7").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::OperationFailed { ref operation, ref raw_message, .. }
            if operation == "power_on" && raw_message.contains("errored")
    ));
}

#[tokio::test]
async fn missing_droplet_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets/123"))
        .respond_with(json(
            404,
            body!({"id": "not_found", "message": "The resource you were accessing could not be found."}),
        ))
        .mount(&server)
        .await;

    let err = driver(&server).get_node("123").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ResourceNotFound { ref resource, ref id, .. }
            if resource == "droplet" && id == "123"
    ));
}

#[tokio::test]
async fn unmapped_error_id_keeps_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets/7"))
        .respond_with(json(500, body!({"id": "server_error", "message": "boom"})))
        .mount(&server)
        .await;

    let err = driver(&server).get_node("7").await.unwrap_err();
    assert!(
        matches!(
            err,
            ProviderError::HttpStatus { status: 500, raw_message: Some(ref m), .. }
                if m.contains("server_error") && m.contains("boom")
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn volumes_report_attachment_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumes"))
        .respond_with(json(
            200,
            body!({
                "volumes": [
                    {"id": "v-1", "name": "data", "size_gigabytes": 100, "droplet_ids": [7],
                     "region": {"slug": "ams3", "name": "Amsterdam 3"}},
                    {"id": "v-2", "name": "spare", "size_gigabytes": 10, "droplet_ids": []}
                ],
                "links": {}
            }),
        ))
        .mount(&server)
        .await;

    let volumes = require_ok!(driver(&server).list_volumes().await);
    assert_eq!(volumes[0].state, VolumeState::InUse);
    assert_eq!(volumes[0].extra["region"], "ams3");
    assert_eq!(volumes[1].state, VolumeState::Available);
}

#[tokio::test]
async fn detach_requires_an_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumes/v-2"))
        .respond_with(json(
            200,
            body!({"volume": {"id": "v-2", "name": "spare", "size_gigabytes": 10, "droplet_ids": []}}),
        ))
        .mount(&server)
        .await;

    let err = driver(&server).detach_volume("v-2").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "volume_id"
    ));
}

#[tokio::test]
async fn factory_rejects_empty_token() {
    let result = require_some!(instantiate(
        provider_keys::locators::DIGITAL_OCEAN,
        "DigitalOceanNodeDriver",
        DriverCredentials::new("  "),
        &mock_options("http://127.0.0.1:1"),
    ));
    assert!(matches!(
        result,
        Err(ProviderError::InvalidParameter { ref param, .. }) if param == "credentials"
    ));
}
