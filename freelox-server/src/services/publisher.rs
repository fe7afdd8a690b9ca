use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use freelox_protocol::is_known_field;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value, json};
use sha2::Sha256;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::configs::Storage;
use crate::models::ControllerEndpoint;
use crate::services::registry::{DeviceRegistry, DeviceView};
use crate::services::transport::DatagramTransport;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid endpoint address {0}")]
    BadAddress(String),

    #[error("endpoint unreachable: {0}")]
    Unreachable(#[from] io::Error),

    #[error("send timed out")]
    Timeout,
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub endpoint_id: Uuid,
    pub result: Result<(), PublishError>,
}

/// Fans selected telemetry fields out to every controller endpoint a
/// device is assigned to. Endpoints fail independently: one slow or
/// unreachable target never blocks or suppresses delivery to the
/// others.
pub struct PublishRouter {
    storage: Arc<Storage>,
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn DatagramTransport>,
    send_timeout: Duration,
}

impl PublishRouter {
    pub fn new(
        storage: Arc<Storage>,
        registry: Arc<DeviceRegistry>,
        transport: Arc<dyn DatagramTransport>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            registry,
            transport,
            send_timeout,
        }
    }

    /// Builds the datagram body for one device: metadata plus the
    /// selected known fields. A reported operating mode of 0 means
    /// "running in automatic" and goes out as 1.
    pub fn datagram(view: &DeviceView) -> Map<String, Value> {
        let mut body = Map::new();

        let timestamp = view
            .telemetry
            .as_ref()
            .map(|snapshot| snapshot.received_at)
            .unwrap_or_else(OffsetDateTime::now_utc);

        body.insert("device".to_string(), json!(view.device.name));
        body.insert(
            "timestamp".to_string(),
            json!(timestamp.format(&Rfc3339).unwrap_or_default()),
        );
        body.insert("is_online".to_string(), json!(view.is_online));

        let Some(snapshot) = &view.telemetry else {
            return body;
        };

        for key in &view.device.selected_fields {
            if !is_known_field(key) {
                continue;
            }
            let Some(value) = snapshot.fields.get(key) else {
                continue;
            };

            let mut value = serde_json::to_value(value).unwrap_or(Value::Null);
            if key == "operating_mode" && value == json!(0) {
                value = json!(1);
            }
            body.insert(key.clone(), value);
        }

        body
    }

    /// Publishes one device to all of its enabled endpoints and
    /// reports the per-endpoint outcomes.
    pub async fn publish_serial(&self, serial: &str) -> Vec<PublishOutcome> {
        let Some(view) = self.registry.view(serial) else {
            return Vec::new();
        };
        if !view.device.enabled {
            return Vec::new();
        }
        // An empty selection turns publishing off for the device.
        if view.device.selected_fields.is_empty() {
            return Vec::new();
        }

        let endpoints: Vec<ControllerEndpoint> = self
            .storage
            .endpoints()
            .into_iter()
            .filter(|endpoint| {
                endpoint.enabled && view.device.assigned_endpoints.contains(&endpoint.id)
            })
            .collect();

        if endpoints.is_empty() {
            return Vec::new();
        }

        let body = Self::datagram(&view);
        let device_name = view.device.name.clone();

        let sends = endpoints.into_iter().map(|endpoint| {
            let mut body = body.clone();
            let device_name = device_name.clone();
            async move {
                let result = self.send_to_endpoint(&endpoint, &mut body).await;

                match &result {
                    Ok(()) => {
                        tracing::info!(
                            endpoint = %endpoint.name,
                            target = %format!("{}:{}", endpoint.ip, endpoint.port),
                            device = %device_name,
                            "published datagram"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            endpoint = %endpoint.name,
                            target = %format!("{}:{}", endpoint.ip, endpoint.port),
                            device = %device_name,
                            "publish failed: {e}"
                        );
                    }
                }

                PublishOutcome {
                    endpoint_id: endpoint.id,
                    result,
                }
            }
        });

        futures::future::join_all(sends).await
    }

    async fn send_to_endpoint(
        &self,
        endpoint: &ControllerEndpoint,
        body: &mut Map<String, Value>,
    ) -> Result<(), PublishError> {
        let target: SocketAddr = format!("{}:{}", endpoint.ip, endpoint.port)
            .parse()
            .map_err(|_| PublishError::BadAddress(endpoint.ip.clone()))?;

        let unsigned = Value::Object(body.clone()).to_string();
        body.insert(
            "hmac".to_string(),
            json!(sign(&endpoint.api_key, unsigned.as_bytes())),
        );
        let payload = Value::Object(body.clone()).to_string();

        match tokio::time::timeout(
            self.send_timeout,
            self.transport.send(target, payload.as_bytes()),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PublishError::Unreachable(e)),
            Err(_) => Err(PublishError::Timeout),
        }
    }

    /// Periodic re-publish of every device, with `is_online` going
    /// stale-false once a device misses its push window. Lets the
    /// controller infer staleness without any extra protocol.
    pub fn spawn_heartbeat(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                for serial in router.registry.serials() {
                    router.publish_serial(&serial).await;
                }
            }
        })
    }
}

/// Hex HMAC-SHA256 of the unsigned body under the endpoint's API key.
/// Receivers strip the `hmac` member and verify over the remainder.
fn sign(api_key: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(api_key.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
