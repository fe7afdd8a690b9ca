use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::configs::Storage;
use crate::errors::ApiError;
use crate::middlewares::{TokenState, auth};
use crate::models::{Device, UnknownContact};
use crate::services::{DeviceRegistry, DiscoveryTracker};

#[derive(Clone)]
pub struct DiscoveryState {
    pub discovery: Arc<DiscoveryTracker>,
    pub registry: Arc<DeviceRegistry>,
    pub storage: Arc<Storage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoteDeviceRequest {
    pub serial: String,
    pub name: String,
    pub credential: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub assigned_endpoints: Vec<uuid::Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromotedDeviceResponse {
    pub id: String,
    pub name: String,
    pub serial: String,
}

pub fn discovery_router(discovery_state: DiscoveryState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/discovery/unknown-devices", get(get_unknown_devices))
        .route("/api/discovery/add", post(promote_device))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(discovery_state)
}

#[utoipa::path(
    get,
    path = "/api/discovery/unknown-devices",
    tag = "discovery",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Unpaired serials seen by the bridge"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_unknown_devices(
    State(state): State<DiscoveryState>,
) -> Json<Vec<UnknownContact>> {
    Json(state.discovery.list())
}

#[utoipa::path(
    post,
    path = "/api/discovery/add",
    tag = "discovery",
    request_body = PromoteDeviceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Device paired", body = PromotedDeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Serial already paired or store unwritable")
    )
)]
pub async fn promote_device(
    State(state): State<DiscoveryState>,
    Json(body): Json<PromoteDeviceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let device = Device {
        id: body.id.unwrap_or_else(|| body.serial.clone()),
        name: body.name,
        serial_no: body.serial.clone(),
        credential: body.credential,
        enabled: true,
        selected_fields: body.selected_fields,
        assigned_endpoints: body.assigned_endpoints,
    };

    state
        .storage
        .add_device(device.clone())
        .map_err(|e| anyhow!(e))?;
    state.registry.insert_device(device.clone());
    state.discovery.promote(&body.serial);

    tracing::info!(serial = %device.serial_no, device = %device.name, "device paired");

    Ok((
        StatusCode::CREATED,
        Json(json!(PromotedDeviceResponse {
            id: device.id,
            name: device.name,
            serial: device.serial_no,
        })),
    ))
}
