//! Pact contract tests for the Vault namespaces API
//!
//! These tests define the contract between the Vault Namespace Controller and Vault.
//! They drive `VaultNamespaceClient` against a Pact mock server.

mod common;

use common::init_rustls;
use pact_consumer::prelude::*;
use serde_json::json;
use vault_namespace_controller::config::{AuthMethod, VaultAuthConfig, VaultConfig};
use vault_namespace_controller::controller::path::NamespacePath;
use vault_namespace_controller::provider::vault::VaultNamespaceClient;
use vault_namespace_controller::provider::{GatewayError, NamespaceGateway};

const TOKEN: &str = "s.test-token";

/// mock_server.url() returns a Url struct - convert to string and strip trailing slash
fn base_url(url: &impl std::fmt::Display) -> String {
    url.to_string().trim_end_matches('/').to_string()
}

fn client(url: &impl std::fmt::Display) -> VaultNamespaceClient {
    VaultNamespaceClient::with_token(&base_url(url), TOKEN).expect("Failed to build vault client")
}

#[tokio::test]
async fn test_vault_namespace_exists_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("list child namespaces of a root namespace", "", |mut i| {
        i.given("namespace admin has child team-a");
        i.request
            .method("GET")
            .path("/v1/sys/namespaces")
            .query_param("list", "true")
            .header("X-Vault-Token", TOKEN)
            .header("X-Vault-Namespace", "admin");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "keys": ["team-a/", "team-b/"]
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    let exists = client
        .exists(&NamespacePath::new("admin/team-a"))
        .await
        .expect("Failed to check namespace");
    assert!(exists);
}

#[tokio::test]
async fn test_vault_namespace_missing_from_list_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("list top-level namespaces", "", |mut i| {
        i.given("only namespace team-b exists");
        i.request
            .method("GET")
            .path("/v1/sys/namespaces")
            .query_param("list", "true")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "keys": ["team-b/"]
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    let exists = client
        .exists(&NamespacePath::new("team-a"))
        .await
        .expect("Failed to check namespace");
    assert!(!exists);
}

#[tokio::test]
async fn test_vault_namespace_parent_without_children_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("list children of a namespace without children", "", |mut i| {
        i.given("namespace admin has no children");
        i.request
            .method("GET")
            .path("/v1/sys/namespaces")
            .query_param("list", "true")
            .header("X-Vault-Token", TOKEN)
            .header("X-Vault-Namespace", "admin");
        i.response
            .status(404)
            .header("content-type", "application/json")
            .json_body(json!({ "errors": [] }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    let exists = client
        .exists(&NamespacePath::new("admin/team-a"))
        .await
        .expect("Failed to check namespace");
    assert!(!exists);
}

#[tokio::test]
async fn test_vault_namespace_malformed_list_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("list namespaces with a malformed response", "", |mut i| {
        i.given("vault returns keys as an object");
        i.request
            .method("GET")
            .path("/v1/sys/namespaces")
            .query_param("list", "true")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "keys": { "team-a/": {} }
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    let err = client
        .exists(&NamespacePath::new("team-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_vault_create_namespace_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("create a child namespace", "", |mut i| {
        i.given("namespace admin exists");
        i.request
            .method("POST")
            .path("/v1/sys/namespaces/team-a")
            .header("X-Vault-Token", TOKEN)
            .header("X-Vault-Namespace", "admin");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "id": "Tn3a8",
                    "path": "admin/team-a/"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    client
        .create(&NamespacePath::new("admin/team-a"))
        .await
        .expect("Failed to create namespace");
}

#[tokio::test]
async fn test_vault_create_namespace_denied_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("create a namespace without permission", "", |mut i| {
        i.given("the token lacks sys/namespaces capabilities");
        i.request
            .method("POST")
            .path("/v1/sys/namespaces/team-a")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(403)
            .header("content-type", "application/json")
            .json_body(json!({ "errors": ["permission denied"] }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    let err = client
        .create(&NamespacePath::new("team-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnexpectedStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_vault_delete_namespace_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder.interaction("delete a top-level namespace", "", |mut i| {
        i.given("namespace team-a exists");
        i.request
            .method("DELETE")
            .path("/v1/sys/namespaces/team-a")
            .header("X-Vault-Token", TOKEN);
        i.response.status(204);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client(&mock_server.url());

    client
        .delete(&NamespacePath::new("team-a"))
        .await
        .expect("Failed to delete namespace");
}

#[tokio::test]
async fn test_vault_approle_login_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Vault-Namespace-Controller", "Vault");

    pact_builder
        .interaction("log in with approle in the admin namespace", "", |mut i| {
            i.given("approle auth is enabled in namespace admin");
            i.request
                .method("POST")
                .path("/v1/auth/approle/login")
                .header("X-Vault-Namespace", "admin")
                .json_body(json!({
                    "role_id": "controller-role",
                    "secret_id": "controller-secret"
                }));
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "auth": {
                        "client_token": TOKEN,
                        "lease_duration": 3600,
                        "renewable": true
                    }
                }));
            i
        })
        .interaction("look up the controller token", "", |mut i| {
            i.given("the controller token is valid");
            i.request
                .method("GET")
                .path("/v1/auth/token/lookup-self")
                .header("X-Vault-Token", TOKEN);
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": {
                        "ttl": 3599
                    }
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let config = VaultConfig {
        address: base_url(&mock_server.url()),
        auth: Some(VaultAuthConfig {
            method: AuthMethod::AppRole {
                role_id: Some("controller-role".to_string()),
                secret_id: Some("controller-secret".to_string()),
                role_id_path: None,
                secret_id_path: None,
            },
            path: None,
            namespace: Some("admin".to_string()),
        }),
        ..VaultConfig::default()
    };

    let client = VaultNamespaceClient::connect(&config)
        .await
        .expect("Failed to log in to vault");
    let ttl = client.token_ttl().await.expect("Failed to look up token");
    assert_eq!(ttl, 3599);
}
