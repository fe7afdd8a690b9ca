use std::sync::Arc;
use std::time::Duration;

use freelox_protocol::DeviceCommand;

use crate::errors::CommandError;
use crate::services::registry::DeviceRegistry;

/// Releases the pending-command lock unless the submission completed
/// through acknowledgment, which already released it. Covers timeout,
/// channel loss and caller cancellation alike.
struct ReleaseGuard<'a> {
    registry: &'a DeviceRegistry,
    serial: &'a str,
    armed: bool,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.release_command(self.serial);
        }
    }
}

/// Serializes command issuance per device: validates, parks the
/// command for the device's next control poll, and waits for the next
/// telemetry push to confirm it.
pub struct CommandDispatcher {
    registry: Arc<DeviceRegistry>,
    timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<DeviceRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn submit(
        &self,
        serial: &str,
        comfort_level: Option<u8>,
        operating_mode: Option<u8>,
    ) -> Result<DeviceCommand, CommandError> {
        let serial = self
            .registry
            .resolve_serial(serial)
            .ok_or(CommandError::UnknownDevice)?;

        let (command, ack) =
            self.registry
                .begin_command(&serial, comfort_level, operating_mode, self.timeout)?;

        tracing::info!(serial = %serial, %command, "command pending, awaiting device poll");

        let mut guard = ReleaseGuard {
            registry: &self.registry,
            serial: &serial,
            armed: true,
        };

        match tokio::time::timeout(self.timeout, ack).await {
            Ok(Ok(confirmed)) => {
                // Acknowledgment already released the lock.
                guard.armed = false;
                tracing::info!(serial = %serial, %confirmed, "command acknowledged");
                Ok(confirmed)
            }
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(serial = %serial, %command, "command not acknowledged in time");
                Err(CommandError::Timeout)
            }
        }
    }
}
