use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{ApiError, CommandError};
use crate::middlewares::{TokenState, auth};
use crate::services::CommandDispatcher;

#[derive(Clone)]
pub struct CommandState {
    pub dispatcher: Arc<CommandDispatcher>,
}

/// Either the operator form (`serial` plus the values to set) or the
/// Loxone VirtualOut form (`device_id`/`command`/`value`).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CommandRequest {
    Operator(OperatorCommand),
    VirtualOut(VirtualOutCommand),
}

/// Accepted in camelCase (controller templates) and snake_case alike.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorCommand {
    pub serial: String,
    #[serde(default, alias = "comfort_level")]
    pub comfort_level: Option<u8>,
    #[serde(default, alias = "operating_mode")]
    pub operating_mode: Option<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VirtualOutCommand {
    pub device_id: String,
    pub command: String,
    pub value: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub serial: String,
    pub comfort_level: u8,
    pub operating_mode: u8,
}

pub fn command_router(command_state: CommandState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/command", post(submit_command))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(command_state)
}

#[utoipa::path(
    post,
    path = "/api/command",
    tag = "command",
    request_body = CommandRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Command acknowledged by the device", body = CommandResponse),
        (status = 400, description = "Requested value out of range or unknown command name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Device is disabled"),
        (status = 404, description = "Unknown device serial"),
        (status = 409, description = "A command is already pending for this device"),
        (status = 504, description = "Device did not acknowledge in time")
    )
)]
pub async fn submit_command(
    State(state): State<CommandState>,
    Json(body): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let (serial, comfort_level, operating_mode) = match body {
        CommandRequest::Operator(request) => {
            (request.serial, request.comfort_level, request.operating_mode)
        }
        CommandRequest::VirtualOut(request) => match request.command.as_str() {
            "comfortLevel" | "comfort_level" => (request.device_id, Some(request.value), None),
            "operatingMode" | "operating_mode" => (request.device_id, None, Some(request.value)),
            other => {
                return Err(CommandError::UnknownCommandName(other.to_string()).into());
            }
        },
    };

    let confirmed = state
        .dispatcher
        .submit(&serial, comfort_level, operating_mode)
        .await?;

    Ok(Json(CommandResponse {
        serial,
        comfort_level: confirmed.comfort_level(),
        operating_mode: confirmed.operating_mode(),
    }))
}
