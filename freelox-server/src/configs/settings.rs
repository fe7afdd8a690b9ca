use std::path::Path;
use std::{env, fs};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Address the Loxone side reaches the bridge under. Exported
    /// artifacts carry this one, never the bind address.
    #[serde(default = "Server::default_public_ip")]
    pub public_ip: String,
}

impl Server {
    fn default_public_ip() -> String {
        "127.0.0.1".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    /// Operator bearer token for the `/api` surface.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    #[serde(default = "Bridge::default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "Bridge::default_online_grace_secs")]
    pub online_grace_secs: u64,
    #[serde(default = "Bridge::default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "Bridge::default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

impl Bridge {
    fn default_command_timeout_secs() -> u64 {
        60
    }

    fn default_online_grace_secs() -> u64 {
        300
    }

    fn default_heartbeat_interval_secs() -> u64 {
        60
    }

    fn default_publish_timeout_ms() -> u64 {
        1000
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self {
            command_timeout_secs: Self::default_command_timeout_secs(),
            online_grace_secs: Self::default_online_grace_secs(),
            heartbeat_interval_secs: Self::default_heartbeat_interval_secs(),
            publish_timeout_ms: Self::default_publish_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    /// JSON file holding device and endpoint records.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub auth: Auth,
    #[serde(default)]
    pub bridge: Bridge,
    pub store: Store,
}

impl Settings {
    /// Loads `configs/default.toml`, then overlays the `RUN_MODE`
    /// variant on top of it when one exists.
    pub fn new() -> anyhow::Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let base = Self::read_toml(Path::new("configs/default.toml"))?
            .context("configs/default.toml not found")?;

        let settings = match Self::read_toml(Path::new(&format!("configs/{run_mode}.toml")))? {
            Some(overlay) => Self::merge(base, overlay)?,
            None => serde_json::from_value(base)?,
        };

        Ok(settings)
    }

    fn read_toml(path: &Path) -> anyhow::Result<Option<serde_json::Value>> {
        if !path.is_file() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: toml::Value = raw
            .parse()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Ok(Some(serde_json::to_value(parsed)?))
    }

    /// Shallow section merge: a section present in the overlay replaces
    /// the base section wholesale.
    fn merge(left: serde_json::Value, right: serde_json::Value) -> anyhow::Result<Self> {
        let mut left_map = left
            .as_object()
            .map(|map| map.to_owned())
            .context("base settings are not a table")?;

        let mut right_map = right
            .as_object()
            .map(|map| map.to_owned())
            .context("overlay settings are not a table")?;

        right_map.retain(|_, v| !v.is_null());
        left_map.extend(right_map);

        Ok(serde_json::from_value(serde_json::Value::Object(left_map))?)
    }
}
