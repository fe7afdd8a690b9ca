use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Unknown artifact kind: {0}")]
    UnknownKind(String),
}

impl ArtifactError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArtifactError::UnknownKind(_) => StatusCode::BAD_REQUEST,
        }
    }
}
