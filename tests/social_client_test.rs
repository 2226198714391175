//! Integration tests for the social platform client.

use motd_relay::social::{HttpPoster, SocialPoster};
use wiremock::matchers::{body_json_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_publish_returns_external_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer token-1"))
        .and(body_json_string(r#"{"text":"hello world"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "post-789"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let poster = HttpPoster::new(&format!("{}/api/posts", server.uri()), "token-1");
    let id = poster
        .publish("hello world")
        .await
        .expect("Publish should succeed");
    assert_eq!(id, "post-789");
}

#[tokio::test]
async fn test_publish_rejected_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let poster = HttpPoster::new(&format!("{}/api/posts", server.uri()), "wrong");
    let err = poster.publish("hello").await.expect_err("401 should fail");
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_publish_requires_id_in_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "accepted"
        })))
        .mount(&server)
        .await;

    let poster = HttpPoster::new(&format!("{}/api/posts", server.uri()), "token-1");
    assert!(poster.publish("hello").await.is_err());
}
