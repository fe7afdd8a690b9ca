use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;

use crate::errors::{ApiError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::services::DeviceRegistry;

#[derive(Clone)]
pub struct DeviceState {
    pub registry: Arc<DeviceRegistry>,
}

pub fn device_router(device_state: DeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/devices/:serial/telemetry", get(get_device_telemetry))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(device_state)
}

#[utoipa::path(
    get,
    path = "/api/devices/{serial}/telemetry",
    tag = "device",
    params(
        ("serial" = String, Path, description = "Device serial number")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Latest decoded telemetry"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown device or no telemetry yet")
    )
)]
pub async fn get_device_telemetry(
    Path(serial): Path<String>,
    State(state): State<DeviceState>,
) -> Result<Json<Value>, ApiError> {
    let serial = state
        .registry
        .resolve_serial(&serial)
        .ok_or(DeviceError::DeviceNotFound)?;
    let view = state.registry.view(&serial).ok_or(DeviceError::DeviceNotFound)?;
    let snapshot = view.telemetry.ok_or(DeviceError::NoTelemetry)?;

    // Operator view carries every decoded field, not just the publish
    // selection.
    let mut body = Map::new();
    body.insert("device".to_string(), json!(view.device.name));
    body.insert("serial".to_string(), json!(view.device.serial_no));
    body.insert(
        "timestamp".to_string(),
        json!(snapshot.received_at.format(&Rfc3339).unwrap_or_default()),
    );
    body.insert("is_online".to_string(), json!(view.is_online));

    for (key, value) in snapshot.fields.iter() {
        body.insert(key.clone(), serde_json::to_value(value).unwrap_or(Value::Null));
    }

    Ok(Json(Value::Object(body)))
}
