use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use freelox_protocol::{DeviceCommand, FieldMap};
use time::OffsetDateTime;
use tokio::sync::oneshot;

use crate::errors::CommandError;
use crate::models::{Device, TelemetrySnapshot};

/// Command lock token; at most one non-terminal pending command per
/// device at any instant.
struct PendingCommand {
    command: DeviceCommand,
    handed_to_device: bool,
    expires_at: Instant,
    ack: Option<oneshot::Sender<DeviceCommand>>,
}

struct DeviceEntry {
    device: Device,
    telemetry: Option<TelemetrySnapshot>,
    last_seen: Option<Instant>,
    /// Last non-zero operating mode the device reported; zero means
    /// "no change" and never overwrites it.
    last_mode: Option<u8>,
    pending: Option<PendingCommand>,
}

impl DeviceEntry {
    fn new(device: Device) -> Self {
        Self {
            device,
            telemetry: None,
            last_seen: None,
            last_mode: None,
            pending: None,
        }
    }

    fn sweep_expired(&mut self, now: Instant) {
        if let Some(pending) = &self.pending {
            if pending.expires_at <= now {
                self.pending = None;
            }
        }
    }
}

/// Read view of a device for publishing and operator queries.
pub struct DeviceView {
    pub device: Device,
    pub telemetry: Option<TelemetrySnapshot>,
    pub is_online: bool,
}

/// In-memory registry of paired devices and their live state.
///
/// The unit of mutual exclusion is the device: all state transitions
/// happen under one short-held lock, and no lock is held across await
/// points.
pub struct DeviceRegistry {
    entries: RwLock<HashMap<String, DeviceEntry>>,
    online_grace: Duration,
}

impl DeviceRegistry {
    pub fn new(devices: Vec<Device>, online_grace: Duration) -> Self {
        let entries = devices
            .into_iter()
            .map(|device| (device.serial_no.clone(), DeviceEntry::new(device)))
            .collect();

        Self {
            entries: RwLock::new(entries),
            online_grace,
        }
    }

    pub fn insert_device(&self, device: Device) {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        entries
            .entry(device.serial_no.clone())
            .or_insert_with(|| DeviceEntry::new(device));
    }

    /// Maps a serial as reported on the wire to the configured one.
    ///
    /// Appliances report serials in several framings (`35076` vs
    /// `FA10035076`), so a purely-numeric side matches as a suffix of
    /// the other.
    pub fn resolve_serial(&self, reported: &str) -> Option<String> {
        let entries = self.entries.read().expect("registry lock poisoned");

        if entries.contains_key(reported) {
            return Some(reported.to_string());
        }

        entries
            .keys()
            .find(|configured| {
                (configured.chars().all(|c| c.is_ascii_digit())
                    && reported.ends_with(configured.as_str()))
                    || (reported.chars().all(|c| c.is_ascii_digit())
                        && !reported.is_empty()
                        && configured.ends_with(reported))
            })
            .cloned()
    }

    pub fn device(&self, serial: &str) -> Option<Device> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.get(serial).map(|entry| entry.device.clone())
    }

    pub fn serials(&self) -> Vec<String> {
        let mut serials: Vec<String> = self
            .entries
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        serials.sort();
        serials
    }

    /// Replaces the device's telemetry wholesale and, when the report
    /// confirms the pending command, fires its acknowledgment and
    /// releases the lock.
    pub fn record_telemetry(&self, serial: &str, fields: FieldMap) -> bool {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let Some(entry) = entries.get_mut(serial) else {
            return false;
        };

        let now = Instant::now();
        entry.sweep_expired(now);

        if let Some(mode) = fields.operating_mode() {
            if mode > 0 {
                entry.last_mode = u8::try_from(mode).ok();
            }
        }

        if let (Some(pending), Some(comfort), Some(mode)) =
            (&entry.pending, fields.comfort_level(), fields.operating_mode())
        {
            if pending.command.matches_report(comfort, mode) {
                if let Some(mut pending) = entry.pending.take() {
                    if let Some(ack) = pending.ack.take() {
                        let _ = ack.send(pending.command);
                    }
                }
            }
        }

        entry.telemetry = Some(TelemetrySnapshot {
            fields,
            received_at: OffsetDateTime::now_utc(),
        });
        entry.last_seen = Some(now);

        true
    }

    pub fn view(&self, serial: &str) -> Option<DeviceView> {
        let entries = self.entries.read().expect("registry lock poisoned");
        let entry = entries.get(serial)?;

        let is_online = entry
            .last_seen
            .is_some_and(|seen| seen.elapsed() < self.online_grace);

        Some(DeviceView {
            device: entry.device.clone(),
            telemetry: entry.telemetry.clone(),
            is_online,
        })
    }

    /// Check-and-set half of command submission: validates and fills
    /// the request, then installs the pending-command lock.
    ///
    /// An absent comfort level defaults to 2; an absent mode to the
    /// last non-zero reported mode, or 1 before any report.
    pub fn begin_command(
        &self,
        serial: &str,
        comfort_level: Option<u8>,
        operating_mode: Option<u8>,
        ttl: Duration,
    ) -> Result<(DeviceCommand, oneshot::Receiver<DeviceCommand>), CommandError> {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let entry = entries.get_mut(serial).ok_or(CommandError::UnknownDevice)?;

        if !entry.device.enabled {
            return Err(CommandError::DeviceDisabled);
        }

        let comfort = comfort_level.unwrap_or(2);
        let mode = operating_mode.or(entry.last_mode).unwrap_or(1);
        let command = DeviceCommand::new(comfort, mode)?;

        let now = Instant::now();
        entry.sweep_expired(now);

        if entry.pending.is_some() {
            return Err(CommandError::Busy);
        }

        let (tx, rx) = oneshot::channel();
        entry.pending = Some(PendingCommand {
            command,
            handed_to_device: false,
            expires_at: now + ttl,
            ack: Some(tx),
        });
        entry.last_mode = Some(command.operating_mode());

        Ok((command, rx))
    }

    /// Hands the pending heartbeat line to the polling device, once.
    /// Further polls while the same command awaits acknowledgment get
    /// nothing.
    pub fn take_heartbeat(&self, serial: &str) -> Option<String> {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let entry = entries.get_mut(serial)?;

        entry.sweep_expired(Instant::now());

        let pending = entry.pending.as_mut()?;
        if pending.handed_to_device {
            return None;
        }

        pending.handed_to_device = true;
        Some(pending.command.to_heartbeat())
    }

    pub fn release_command(&self, serial: &str) {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        if let Some(entry) = entries.get_mut(serial) {
            entry.pending = None;
        }
    }
}
