pub mod api;
pub mod artifact;
pub mod command;
pub mod device;
pub mod endpoint;
pub mod ingress;

pub use api::ApiError;
pub use artifact::ArtifactError;
pub use command::CommandError;
pub use device::DeviceError;
pub use endpoint::EndpointError;
pub use ingress::IngressError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::IngressError(e) => (e.status_code(), e.to_string(), None),
            ApiError::CommandError(e) => (e.status_code(), e.to_string(), None),
            ApiError::DeviceError(e) => (e.status_code(), e.to_string(), None),
            ApiError::EndpointError(e) => (e.status_code(), e.to_string(), None),
            ApiError::ArtifactError(e) => (e.status_code(), e.to_string(), None),
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        (status, body).into_response()
    }
}
