use super::{ArtifactError, CommandError, DeviceError, EndpointError, IngressError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Ingress error: {0}")]
    IngressError(#[from] IngressError),

    #[error("Command error: {0}")]
    CommandError(#[from] CommandError),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Endpoint error: {0}")]
    EndpointError(#[from] EndpointError),

    #[error("Artifact error: {0}")]
    ArtifactError(#[from] ArtifactError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
