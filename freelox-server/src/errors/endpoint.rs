use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Endpoint not found")]
    EndpointNotFound,

    #[error("Endpoint is disabled")]
    EndpointDisabled,

    #[error("Device is not assigned to this endpoint")]
    NotAssigned,
}

impl EndpointError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EndpointError::EndpointNotFound => StatusCode::NOT_FOUND,
            EndpointError::EndpointDisabled => StatusCode::FORBIDDEN,
            EndpointError::NotAssigned => StatusCode::BAD_REQUEST,
        }
    }
}
