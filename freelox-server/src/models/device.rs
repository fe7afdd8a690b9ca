use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_enabled() -> bool {
    true
}

/// Persisted identity of one paired ventilation appliance.
///
/// `credential` is the shared secret the appliance was paired with; it
/// feeds key derivation and must never appear in logs or API output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Operator-assigned stable key.
    pub id: String,
    pub name: String,
    /// Appliance-assigned, immutable once paired.
    pub serial_no: String,
    pub credential: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Field keys published to controllers.
    #[serde(default)]
    pub selected_fields: Vec<String>,
    /// Controller endpoints this device publishes to.
    #[serde(default)]
    pub assigned_endpoints: Vec<Uuid>,
}
