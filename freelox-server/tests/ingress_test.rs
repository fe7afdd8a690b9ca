use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::mock_app::{MockApp, SERIAL, body_json, body_string};

#[tokio::test]
async fn test_telemetry_push_updates_state_and_publishes() {
    let app = MockApp::new();

    let payload = app.encrypted_telemetry(3, 2);
    let request = app.push_request("1x1x35076y2x14x0", &payload);

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    // Both assigned endpoints received one signed datagram.
    assert_eq!(app.transport.sent_to(5555).len(), 1);
    assert_eq!(app.transport.sent_to(5556).len(), 1);

    let datagram: serde_json::Value =
        serde_json::from_slice(&app.transport.sent_to(5555)[0]).unwrap();
    assert_eq!(datagram["device"], json!(format!("Device {SERIAL}")));
    assert_eq!(datagram["is_online"], json!(true));
    assert_eq!(datagram["co2"], json!(800));
    assert_eq!(datagram["comfort_level"], json!(3));
    assert_eq!(datagram["operating_mode"], json!(2));
    assert!(datagram["hmac"].is_string());

    // Operator view exposes the full decoded field set.
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!("/api/devices/{SERIAL}/telemetry")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let telemetry = body_json(response).await;
    assert_eq!(telemetry["serial"], json!(SERIAL));
    assert_eq!(telemetry["co2"], json!(800));
    assert_eq!(telemetry["comfort_level"], json!(3));
    assert!(telemetry.get("pressure").is_some());
}

#[tokio::test]
async fn test_unreachable_endpoint_does_not_block_the_other() {
    let app = MockApp::with_transport(
        freelox_server::tests::MockTransport::failing(vec![5556]),
    );

    let payload = app.encrypted_telemetry(2, 1);
    let request = app.push_request("1x1x35076y2x14x0", &payload);

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.transport.sent_to(5555).len(), 1);
    assert_eq!(app.transport.sent_to(5556).len(), 0);
}

#[tokio::test]
async fn test_missing_parameters_are_rejected() {
    let app = MockApp::new();

    let request = axum::http::Request::builder()
        .uri("/apps/data/blucontrol/?s=1x1x35076y2")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_corrupt_payload_is_rejected_without_state_change() {
    let app = MockApp::new();

    let request = app.push_request("1x1x35076y2x14x0", "bm90LXZhbGlkLWNpcGhlcnRleHQ");
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing published, no telemetry retained.
    assert!(app.transport.sent.lock().unwrap().is_empty());
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!("/api/devices/{SERIAL}/telemetry")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_flexible_serial_matching_on_ingress() {
    let app = MockApp::new();

    // Long wire form resolves to the configured short serial.
    let payload = app.encrypted_telemetry(2, 1);
    let request = app.push_request("1x1xFA10035076y2x14x0", &payload);

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.transport.sent_to(5555).len(), 1);
}

#[tokio::test]
async fn test_unknown_serial_is_tracked_for_discovery() {
    let app = MockApp::new();

    let payload = app.encrypted_telemetry(2, 1);
    let request = app.push_request("1x1x99999y2x14x0", &payload);

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.transport.sent.lock().unwrap().is_empty());

    let response = app
        .router
        .clone()
        .oneshot(app.api_get("/api/discovery/unknown-devices"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contacts = body_json(response).await;
    assert_eq!(contacts[0]["serial_no"], json!("99999"));
    assert_eq!(contacts[0]["contact_count"], json!(1));
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let app = MockApp::new();

    let request = axum::http::Request::builder()
        .uri(format!("/api/devices/{SERIAL}/telemetry"))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = axum::http::Request::builder()
        .uri(format!("/api/devices/{SERIAL}/telemetry"))
        .header("Authorization", "Bearer wrong-token")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
