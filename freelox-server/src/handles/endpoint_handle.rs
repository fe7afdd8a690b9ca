use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::configs::Storage;
use crate::errors::{ApiError, EndpointError};
use crate::middlewares::{TokenState, auth};

#[derive(Clone)]
pub struct EndpointState {
    pub storage: Arc<Storage>,
}

pub fn endpoint_router(endpoint_state: EndpointState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/endpoints/:endpoint_id/rotate-key", post(rotate_api_key))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(endpoint_state)
}

#[utoipa::path(
    post,
    path = "/api/endpoints/{endpoint_id}/rotate-key",
    tag = "endpoint",
    params(
        ("endpoint_id" = Uuid, Path, description = "Controller endpoint ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "New API key activated"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Endpoint not found")
    )
)]
pub async fn rotate_api_key(
    Path(endpoint_id): Path<Uuid>,
    State(state): State<EndpointState>,
) -> Result<Json<Value>, ApiError> {
    let key = state
        .storage
        .rotate_api_key(endpoint_id)
        .map_err(|e| anyhow!(e))?
        .ok_or(EndpointError::EndpointNotFound)?;

    tracing::info!(endpoint_id = %endpoint_id, "endpoint API key rotated");

    Ok(Json(json!({
        "id": endpoint_id,
        "apiKey": key,
    })))
}
