use std::env;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use freelox_server::app::build_app;
use freelox_server::configs::Storage;
use freelox_server::configs::settings::{Auth, Bridge, Logger, Server, Settings, Store};
use freelox_server::models::ControllerEndpoint;
use freelox_server::tests::{MockTransport, telemetry_frame, test_device, test_endpoint};
use uuid::Uuid;

pub const SERIAL: &str = "35076";
pub const CREDENTIAL: &str = "secret-pass";
pub const TOKEN: &str = "test-token";

pub struct MockApp {
    pub router: Router,
    pub storage: Arc<Storage>,
    pub transport: Arc<MockTransport>,
    pub endpoints: Vec<ControllerEndpoint>,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_transport(MockTransport::default())
    }

    pub fn with_transport(transport: MockTransport) -> Self {
        let store_path = env::temp_dir().join(format!("freelox-mock-{}.json", Uuid::new_v4()));
        let settings = Arc::new(Settings {
            server: Server {
                host: "127.0.0.1".to_string(),
                port: 3000,
                public_ip: "192.168.7.2".to_string(),
            },
            logger: Logger {
                level: "debug".to_string(),
            },
            auth: Auth {
                token: TOKEN.to_string(),
            },
            bridge: Bridge {
                command_timeout_secs: 2,
                online_grace_secs: 300,
                heartbeat_interval_secs: 3600,
                publish_timeout_ms: 200,
            },
            store: Store {
                path: store_path.to_string_lossy().into_owned(),
            },
        });

        let storage = Arc::new(Storage::load(&settings.store).unwrap());
        let endpoints = vec![test_endpoint(5555), test_endpoint(5556)];
        for endpoint in &endpoints {
            storage.add_endpoint(endpoint.clone()).unwrap();
        }
        storage
            .add_device(test_device(
                SERIAL,
                endpoints.iter().map(|e| e.id).collect(),
            ))
            .unwrap();

        let transport = Arc::new(transport);
        let (router, _publisher) = build_app(&settings, storage.clone(), transport.clone());

        Self {
            router,
            storage,
            transport,
            endpoints,
        }
    }

    /// Encrypted telemetry reporting the given comfort level and mode.
    pub fn encrypted_telemetry(&self, comfort_level: u8, operating_mode: u8) -> String {
        freelox_protocol::encrypt(CREDENTIAL, &telemetry_frame(comfort_level, operating_mode))
    }

    pub fn push_request(&self, serial_frame: &str, payload: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/apps/data/blucontrol/?s={serial_frame}&b={payload}"))
            .method(Method::GET)
            .body(Body::empty())
            .unwrap()
    }

    pub fn control_request(&self, serial_frame: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/apps/data/blucontrol/control/?s={serial_frame}"))
            .method(Method::GET)
            .body(Body::empty())
            .unwrap()
    }

    pub fn api_get(&self, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .header("Authorization", format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    pub fn api_post(&self, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {TOKEN}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
