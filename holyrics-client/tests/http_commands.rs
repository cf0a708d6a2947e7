//! HTTP-level tests for the command client against a mock controller

use std::net::SocketAddr;

use holyrics_client::{ClientError, Command, CommandClient, CommandTransport, ConnectionConfig};
use mockito::{Matcher, Server};
use rstest::rstest;
use serde_json::json;

fn connection_for(server: &Server, token: &str) -> ConnectionConfig {
    let addr: SocketAddr = server.host_with_port().parse().unwrap();
    ConnectionConfig::new(addr.ip().to_string(), addr.port(), token)
}

#[tokio::test]
async fn test_posts_json_options_with_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/GetCurrentPresentation")
        .match_query(Matcher::UrlEncoded("token".into(), "s3cret".into()))
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "include_slides": true })))
        .with_status(200)
        .with_body(r#"{"status":"ok","data":{"id":"p1"}}"#)
        .create_async()
        .await;

    let client = CommandClient::new().unwrap();
    client.set_target(connection_for(&server, "s3cret"));

    let body = client
        .execute(Command::GetCurrentPresentation { include_slides: true })
        .await
        .unwrap();

    assert_eq!(body, r#"{"status":"ok","data":{"id":"p1"}}"#);
    mock.assert_async().await;
}

#[rstest]
#[case(Command::GetAlert, "/api/GetAlert")]
#[case(Command::GetF8, "/api/GetF8")]
#[case(Command::GetF9, "/api/GetF9")]
#[case(Command::GetF10, "/api/GetF10")]
#[case(Command::GetBibleVersions, "/api/GetBibleVersions")]
#[tokio::test]
async fn test_well_known_commands_hit_their_paths(#[case] command: Command, #[case] path: &str) {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path)
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({})))
        .with_body(r#"{"data":null}"#)
        .create_async()
        .await;

    let client = CommandClient::new().unwrap();
    client.set_target(connection_for(&server, "t"));
    client.execute(command).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_still_returns_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/GetAlert")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"status":"error","error":"invalid token"}"#)
        .create_async()
        .await;

    let client = CommandClient::new().unwrap();
    client.set_target(connection_for(&server, "wrong"));

    let body = client.execute(Command::GetAlert).await.unwrap();
    assert!(body.contains("invalid token"));
}

#[tokio::test]
async fn test_target_change_applies_to_next_call() {
    let mut first = Server::new_async().await;
    let mut second = Server::new_async().await;

    let first_mock = first
        .mock("POST", "/api/GetF8")
        .match_query(Matcher::Any)
        .with_body(r#"{"data":true}"#)
        .expect(1)
        .create_async()
        .await;
    let second_mock = second
        .mock("POST", "/api/GetF8")
        .match_query(Matcher::UrlEncoded("token".into(), "new".into()))
        .with_body(r#"{"data":false}"#)
        .expect(1)
        .create_async()
        .await;

    let client = CommandClient::new().unwrap();
    client.set_target(connection_for(&first, "old"));
    assert_eq!(client.execute(Command::GetF8).await.unwrap(), r#"{"data":true}"#);

    client.set_target(connection_for(&second, "new"));
    assert_eq!(client.execute(Command::GetF8).await.unwrap(), r#"{"data":false}"#);

    first_mock.assert_async().await;
    second_mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_target_is_transport_error() {
    // Nothing listens on the discard port on loopback in CI containers
    let client = CommandClient::new().unwrap();
    client.set_target(ConnectionConfig::new("127.0.0.1", 9, ""));

    let result = client.send("GetAlert", &json!({})).await;
    assert!(matches!(result, Err(ClientError::Transport(_))));
}
