use axum::http::StatusCode;
use freelox_protocol::CommandEncodeError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown device")]
    UnknownDevice,

    #[error("Device is disabled")]
    DeviceDisabled,

    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CommandEncodeError),

    #[error("Unknown command name: {0}")]
    UnknownCommandName(String),

    #[error("A command is already pending for this device")]
    Busy,

    #[error("Command was not acknowledged in time")]
    Timeout,
}

impl CommandError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CommandError::UnknownDevice => StatusCode::NOT_FOUND,
            CommandError::DeviceDisabled => StatusCode::FORBIDDEN,
            CommandError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            CommandError::UnknownCommandName(_) => StatusCode::BAD_REQUEST,
            CommandError::Busy => StatusCode::CONFLICT,
            CommandError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}
