use std::collections::HashMap;
use std::sync::RwLock;

use time::OffsetDateTime;

use crate::models::UnknownContact;

/// Tracks serials that contact the bridge without being paired, so the
/// operator can promote them into devices.
#[derive(Default)]
pub struct DiscoveryTracker {
    contacts: RwLock<HashMap<String, UnknownContact>>,
}

impl DiscoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, serial: &str) {
        let mut contacts = self.contacts.write().expect("discovery lock poisoned");
        let now = OffsetDateTime::now_utc();

        contacts
            .entry(serial.to_string())
            .and_modify(|contact| {
                contact.last_seen = now;
                contact.contact_count += 1;
            })
            .or_insert_with(|| UnknownContact {
                serial_no: serial.to_string(),
                first_seen: now,
                last_seen: now,
                contact_count: 1,
            });
    }

    pub fn list(&self) -> Vec<UnknownContact> {
        let mut contacts: Vec<UnknownContact> = self
            .contacts
            .read()
            .expect("discovery lock poisoned")
            .values()
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.serial_no.cmp(&b.serial_no));
        contacts
    }

    /// Removes the record when the serial becomes a paired device.
    pub fn promote(&self, serial: &str) -> Option<UnknownContact> {
        self.contacts
            .write()
            .expect("discovery lock poisoned")
            .remove(serial)
    }
}
