use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Router, middleware};
use serde::Deserialize;
use uuid::Uuid;

use crate::configs::settings::Settings;
use crate::configs::Storage;
use crate::errors::{ApiError, DeviceError, EndpointError};
use crate::middlewares::{TokenState, auth};
use crate::services::artifact::{self, ArtifactKind};
use crate::services::DeviceRegistry;

#[derive(Clone)]
pub struct ArtifactState {
    pub registry: Arc<DeviceRegistry>,
    pub storage: Arc<Storage>,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Deserialize)]
pub struct ArtifactQuery {
    pub endpoint: Uuid,
    pub kind: String,
    /// Comma-separated override of the device's publish selection.
    pub fields: Option<String>,
}

pub fn artifact_router(artifact_state: ArtifactState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/devices/:serial/artifact", get(download_artifact))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(artifact_state)
}

#[utoipa::path(
    get,
    path = "/api/devices/{serial}/artifact",
    tag = "artifact",
    params(
        ("serial" = String, Path, description = "Device serial number"),
        ("endpoint" = Uuid, Query, description = "Target controller endpoint"),
        ("kind" = String, Query, description = "Document kind: inputs or outputs"),
        ("fields" = Option<String>, Query, description = "Comma-separated field override")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "XML import file", content_type = "application/xml"),
        (status = 400, description = "Unknown kind or endpoint not assigned"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown device or endpoint")
    )
)]
pub async fn download_artifact(
    Path(serial): Path<String>,
    Query(query): Query<ArtifactQuery>,
    State(state): State<ArtifactState>,
) -> Result<impl IntoResponse, ApiError> {
    let serial = state
        .registry
        .resolve_serial(&serial)
        .ok_or(DeviceError::DeviceNotFound)?;
    let device = state
        .registry
        .device(&serial)
        .ok_or(DeviceError::DeviceNotFound)?;

    let endpoint = state
        .storage
        .endpoint(query.endpoint)
        .ok_or(EndpointError::EndpointNotFound)?;
    if !device.assigned_endpoints.contains(&endpoint.id) {
        return Err(EndpointError::NotAssigned.into());
    }

    let kind = ArtifactKind::parse(&query.kind)?;

    let selection: Vec<String> = match &query.fields {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect(),
        None => device.selected_fields.clone(),
    };

    let xml = artifact::generate(
        &device,
        &endpoint,
        &state.settings.server.public_ip,
        state.settings.server.port,
        &selection,
        kind,
    );

    let filename = format!("freelox_{}_{}.xml", device.id, kind);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/xml; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        xml,
    ))
}
