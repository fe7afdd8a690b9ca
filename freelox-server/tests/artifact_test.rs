use axum::http::StatusCode;
use tower::ServiceExt;

mod common;
use common::mock_app::{MockApp, SERIAL, body_json, body_string};

#[tokio::test]
async fn test_inputs_artifact_is_deterministic() {
    let app = MockApp::new();
    let endpoint_id = app.endpoints[0].id;

    let uri = format!(
        "/api/devices/{SERIAL}/artifact?endpoint={endpoint_id}&kind=inputs&fields=co2,supply_temp"
    );

    let first = app
        .router
        .clone()
        .oneshot(app.api_get(&uri))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        first.headers().get("content-type").unwrap(),
        "application/xml; charset=utf-8"
    );
    assert!(
        first
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=")
    );
    let first_xml = body_string(first).await;

    let second = app
        .router
        .clone()
        .oneshot(app.api_get(&uri))
        .await
        .unwrap();
    let second_xml = body_string(second).await;

    assert_eq!(first_xml, second_xml);
    assert!(first_xml.contains("VirtualInUdp"));
    assert!(first_xml.contains("Title=\"CO2\""));
    assert!(first_xml.contains("Zulufttemperatur"));
}

#[tokio::test]
async fn test_unknown_selection_keys_are_omitted() {
    let app = MockApp::new();
    let endpoint_id = app.endpoints[0].id;

    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!(
            "/api/devices/{SERIAL}/artifact?endpoint={endpoint_id}&kind=inputs&fields=co2,definitely_unknown"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let xml = body_string(response).await;
    assert!(xml.contains("Title=\"CO2\""));
    assert!(!xml.contains("definitely_unknown"));
    assert_eq!(xml.matches("VirtualInUdpCmd").count(), 1);
}

#[tokio::test]
async fn test_inputs_artifact_addresses_the_public_ip() {
    let app = MockApp::new();
    let endpoint_id = app.endpoints[0].id;

    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!(
            "/api/devices/{SERIAL}/artifact?endpoint={endpoint_id}&kind=inputs&fields=co2"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let xml = body_string(response).await;
    assert!(xml.contains("Address=\"192.168.7.2\""));
    assert!(!xml.contains("0.0.0.0"));
}

#[tokio::test]
async fn test_outputs_artifact_carries_endpoint_key() {
    let app = MockApp::new();
    let endpoint = &app.endpoints[0];

    let uri = format!(
        "/api/devices/{SERIAL}/artifact?endpoint={}&kind=outputs",
        endpoint.id
    );
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let xml = body_string(response).await;
    assert!(xml.contains("VirtualOut"));
    assert!(xml.contains(&format!("Authorization: Bearer {}", endpoint.api_key)));
    assert!(xml.contains("CmdOn=\"/api/command\""));
    assert!(xml.contains(&format!("&quot;{SERIAL}&quot;")));
}

#[tokio::test]
async fn test_rotated_key_shows_up_in_fresh_artifact() {
    let app = MockApp::new();
    let endpoint = &app.endpoints[0];
    let old_key = endpoint.api_key.clone();

    let response = app
        .router
        .clone()
        .oneshot(app.api_post(
            &format!("/api/endpoints/{}/rotate-key", endpoint.id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = body_json(response).await;
    let new_key = rotated["apiKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let uri = format!(
        "/api/devices/{SERIAL}/artifact?endpoint={}&kind=outputs",
        endpoint.id
    );
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&uri))
        .await
        .unwrap();
    let xml = body_string(response).await;
    assert!(xml.contains(&new_key));
    assert!(!xml.contains(&old_key));
}

#[tokio::test]
async fn test_bad_artifact_requests_are_rejected() {
    let app = MockApp::new();
    let endpoint_id = app.endpoints[0].id;

    // Unknown kind.
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!(
            "/api/devices/{SERIAL}/artifact?endpoint={endpoint_id}&kind=csv"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Endpoint that exists but is not assigned to the device.
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!(
            "/api/devices/{SERIAL}/artifact?endpoint={}&kind=inputs",
            uuid::Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown device serial.
    let response = app
        .router
        .clone()
        .oneshot(app.api_get(&format!(
            "/api/devices/00000/artifact?endpoint={endpoint_id}&kind=inputs"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
