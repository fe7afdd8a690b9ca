use axum::http::StatusCode;
use freelox_protocol::{DecodeError, DecryptError};

#[derive(Debug, thiserror::Error)]
pub enum IngressError {
    #[error("Missing parameters")]
    MissingParameters,

    #[error("Invalid serial frame")]
    InvalidSerialFrame,

    #[error("Unknown device")]
    UnknownDevice,

    #[error("Decryption failed")]
    DecryptFailed(#[from] DecryptError),

    #[error("Payload decode failed")]
    DecodeFailed(#[from] DecodeError),
}

impl IngressError {
    pub fn status_code(&self) -> StatusCode {
        // Everything the device sends malformed is a client error; the
        // bridge never retries on its behalf.
        StatusCode::BAD_REQUEST
    }
}
