use groups_broker::{BrokerError, GroupsAdaptor, ServiceAccountAuth, ServiceConfig};
use httpmock::prelude::*;
use tempfile::TempDir;

const BOUND_GROUP: &str = "course-talk@discussions-dev.example.edu";

fn test_setup(server: &MockServer) -> (ServiceConfig, TempDir) {
    let dir = TempDir::new().unwrap();

    let credentials = serde_json::json!({
        "client_id": "broker-client",
        "client_secret": "broker-secret",
        "token_uri": server.url("/token")
    });
    std::fs::write(
        dir.path().join("service-credentials.json"),
        credentials.to_string(),
    )
    .unwrap();

    let toml = format!(
        r#"
[credentials]
dir = "{dir}"
file = "service-credentials.json"

[domain]
default_name = "discussions-dev.example.edu"
subject_email = "groups-admin@example.edu"

[profiles.settings]
service = "settings"
application_name = "groups-broker"
base_url = "{base}"
group_email = "{group}"
"#,
        dir = dir.path().display(),
        base = server.base_url(),
        group = BOUND_GROUP,
    );

    (ServiceConfig::from_toml_str(&toml).unwrap(), dir)
}

fn token_mock(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(200).json_body(serde_json::json!({
            "access_token": "test-token-123",
            "token_type": "Bearer",
            "expires_in": 3600
        }));
    })
}

fn settings_adaptor(config: &ServiceConfig) -> GroupsAdaptor<ServiceAccountAuth> {
    let bound = config.bind("settings").unwrap();
    let auth = ServiceAccountAuth::new(config.credentials_path());
    GroupsAdaptor::with_token_provider(bound, auth)
}

#[tokio::test]
async fn test_get_settings_for_bound_group() {
    let server = MockServer::start();
    let _token = token_mock(&server);

    let remote_settings = serde_json::json!({
        "kind": "groupsSettings#groups",
        "email": BOUND_GROUP,
        "description": "UPDATED description at: 2026-08-20T10:00:00Z",
        "whoCanJoin": "INVITED_CAN_JOIN",
        "whoCanPostMessage": "ALL_MEMBERS_CAN_POST"
    });
    // The target group comes from the active profile, never a call argument.
    let settings_mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/settings/v1/groups/{}", BOUND_GROUP))
            .header("authorization", "Bearer test-token-123");
        then.status(200).json_body(remote_settings.clone());
    });

    let (config, _dir) = test_setup(&server);
    let adaptor = settings_adaptor(&config);

    let serialized = adaptor.get_group_settings().await.unwrap().unwrap();

    settings_mock.assert();
    let parsed: serde_json::Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(parsed, remote_settings);
}

#[tokio::test]
async fn test_update_settings_replaces_wholesale() {
    let server = MockServer::start();
    let _token = token_mock(&server);

    let new_settings = serde_json::json!({
        "email": BOUND_GROUP,
        "description": "UPDATED description at: 2026-08-25T12:34:56Z",
        "whoCanJoin": "INVITED_CAN_JOIN",
        "whoCanPostMessage": "ALL_MEMBERS_CAN_POST"
    });
    let update_mock = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("/settings/v1/groups/{}", BOUND_GROUP))
            .json_body(new_settings.clone());
        then.status(200).json_body(new_settings.clone());
    });

    let (config, _dir) = test_setup(&server);
    let adaptor = settings_adaptor(&config);

    let serialized = adaptor
        .update_group_settings(&new_settings)
        .await
        .unwrap()
        .unwrap();

    update_mock.assert();
    let parsed: serde_json::Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(
        parsed["description"],
        "UPDATED description at: 2026-08-25T12:34:56Z"
    );
}

#[tokio::test]
async fn test_update_settings_remote_rejection_is_normalized() {
    let server = MockServer::start();
    let _token = token_mock(&server);
    server.mock(|when, then| {
        when.method(PUT)
            .path(format!("/settings/v1/groups/{}", BOUND_GROUP));
        then.status(400)
            .json_body(serde_json::json!({"error": "badRequest: Invalid setting value"}));
    });

    let (config, _dir) = test_setup(&server);
    let adaptor = settings_adaptor(&config);

    let err = adaptor
        .update_group_settings(&serde_json::json!({"whoCanJoin": "EVERYONE_AND_THEIR_DOG"}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert!(err.to_string().starts_with("update_group_settings: FAILED"));
}

#[tokio::test]
async fn test_binding_settings_profile_without_group_email_fails() {
    let server = MockServer::start();
    let (config, _dir) = test_setup(&server);

    let mut stripped = config.clone();
    stripped
        .profiles
        .get_mut("settings")
        .unwrap()
        .group_email = None;

    let err = stripped.bind("settings").unwrap_err();
    assert!(matches!(err, BrokerError::MissingConfig { .. }));
}
