use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_enabled() -> bool {
    true
}

/// One controller publish target. `api_key` authenticates both the
/// signed UDP datagrams and command requests originating from this
/// controller; it can be rotated without recreating the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerEndpoint {
    pub id: Uuid,
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ControllerEndpoint {
    pub fn generate_api_key() -> String {
        Uuid::new_v4().simple().to_string()
    }
}
