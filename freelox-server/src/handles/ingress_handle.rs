use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use freelox_protocol::{decode, decrypt, encrypt};
use serde::Deserialize;

use crate::errors::{ApiError, IngressError};
use crate::services::{DeviceRegistry, DiscoveryTracker, PublishRouter};

#[derive(Clone)]
pub struct IngressState {
    pub registry: Arc<DeviceRegistry>,
    pub discovery: Arc<DiscoveryTracker>,
    pub publisher: Arc<PublishRouter>,
}

#[derive(Debug, Deserialize)]
pub struct IngressQuery {
    /// Serial frame, e.g. `1x1x35076y2x14x0`.
    s: Option<String>,
    /// Encrypted telemetry payload.
    b: Option<String>,
}

pub fn ingress_router(state: IngressState) -> Router {
    // Appliance firmware uses GET and POST interchangeably.
    Router::new()
        .route(
            "/apps/data/blucontrol/",
            get(receive_telemetry).post(receive_telemetry),
        )
        .route(
            "/apps/data/blucontrol/control/",
            get(poll_control).post(poll_control),
        )
        .with_state(state)
}

/// Pulls the serial out of the appliance's framing: the part before
/// the first `y`, after its last `x`.
fn parse_serial(raw: &str) -> Option<String> {
    let head = raw.split('y').next()?;
    let serial = head.rsplit('x').next()?;

    if serial.is_empty() {
        return None;
    }

    Some(serial.to_string())
}

/// Telemetry push: decrypt, decode, retain, publish. Always answers
/// plain `OK`; a correct appliance expects nothing more here.
pub async fn receive_telemetry(
    State(state): State<IngressState>,
    Query(query): Query<IngressQuery>,
) -> Result<&'static str, ApiError> {
    let (Some(s), Some(b)) = (query.s.as_deref(), query.b.as_deref()) else {
        tracing::warn!("ingress push missing s or b parameter");
        return Err(IngressError::MissingParameters.into());
    };

    let reported = parse_serial(s).ok_or(IngressError::InvalidSerialFrame)?;

    let Some(serial) = state.registry.resolve_serial(&reported) else {
        tracing::warn!(serial = %reported, "telemetry push from unpaired device");
        state.discovery.record(&reported);
        return Err(IngressError::UnknownDevice.into());
    };

    let device = state
        .registry
        .device(&serial)
        .ok_or(IngressError::UnknownDevice)?;

    let plaintext = decrypt(&device.credential, b).map_err(|e| {
        tracing::warn!(serial = %serial, "telemetry decrypt failed: {e}");
        IngressError::from(e)
    })?;

    let fields = decode(&plaintext).map_err(|e| {
        tracing::warn!(serial = %serial, "telemetry decode failed: {e}");
        IngressError::from(e)
    })?;

    tracing::info!(
        serial = %serial,
        device = %device.name,
        fields = fields.len(),
        "telemetry received"
    );

    state.registry.record_telemetry(&serial, fields);
    state.publisher.publish_serial(&serial).await;

    Ok("OK")
}

/// Command poll: the appliance asks whether anything is queued. A
/// parked command goes back as an encrypted heartbeat line, exactly
/// once; everything else, including every error, answers `OK` so the
/// appliance never stalls on its poll loop.
pub async fn poll_control(
    State(state): State<IngressState>,
    Query(query): Query<IngressQuery>,
) -> String {
    let Some(reported) = query.s.as_deref().and_then(parse_serial) else {
        return "OK".to_string();
    };

    let Some(serial) = state.registry.resolve_serial(&reported) else {
        state.discovery.record(&reported);
        return "OK".to_string();
    };

    let Some(device) = state.registry.device(&serial) else {
        return "OK".to_string();
    };

    match state.registry.take_heartbeat(&serial) {
        Some(line) => {
            tracing::info!(serial = %serial, device = %device.name, "handing command to device");
            encrypt(&device.credential, line.as_bytes())
        }
        None => "OK".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_parses_from_wire_framings() {
        assert_eq!(parse_serial("1x1x35076y2x14x0"), Some("35076".to_string()));
        assert_eq!(
            parse_serial("ABCxFA10035076y2"),
            Some("FA10035076".to_string())
        );
        assert_eq!(parse_serial("35076y2"), Some("35076".to_string()));
        assert_eq!(parse_serial("35076"), Some("35076".to_string()));
        assert_eq!(parse_serial("x y"), Some(" ".to_string()));
        assert_eq!(parse_serial("xy1"), None);
        assert_eq!(parse_serial(""), None);
    }
}
