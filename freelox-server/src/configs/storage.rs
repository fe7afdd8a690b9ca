use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configs::settings::Store;
use crate::models::{ControllerEndpoint, Device};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedConfig {
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    endpoints: Vec<ControllerEndpoint>,
}

/// JSON-file backed store of device and endpoint records.
///
/// A missing file is bootstrapped empty; an unreadable or corrupt file
/// is fatal at startup rather than running with partial state.
pub struct Storage {
    path: PathBuf,
    state: RwLock<PersistedConfig>,
}

impl Storage {
    pub fn load(store: &Store) -> anyhow::Result<Self> {
        let path = PathBuf::from(&store.path);

        let config = if path.is_file() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config store {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("corrupt config store {}", path.display()))?
        } else {
            PersistedConfig::default()
        };

        let storage = Self {
            path,
            state: RwLock::new(config),
        };

        if !storage.path.is_file() {
            let state = storage.state.read().expect("config lock poisoned").clone();
            storage.persist(&state)?;
        }

        Ok(storage)
    }

    pub fn devices(&self) -> Vec<Device> {
        self.state
            .read()
            .expect("config lock poisoned")
            .devices
            .clone()
    }

    pub fn endpoints(&self) -> Vec<ControllerEndpoint> {
        self.state
            .read()
            .expect("config lock poisoned")
            .endpoints
            .clone()
    }

    pub fn endpoint(&self, id: Uuid) -> Option<ControllerEndpoint> {
        self.state
            .read()
            .expect("config lock poisoned")
            .endpoints
            .iter()
            .find(|endpoint| endpoint.id == id)
            .cloned()
    }

    pub fn add_device(&self, device: Device) -> anyhow::Result<()> {
        let mut state = self.state.write().expect("config lock poisoned");
        anyhow::ensure!(
            !state.devices.iter().any(|d| d.serial_no == device.serial_no),
            "device with serial {} already exists",
            device.serial_no
        );

        state.devices.push(device);
        self.persist(&state)
    }

    pub fn add_endpoint(&self, endpoint: ControllerEndpoint) -> anyhow::Result<()> {
        let mut state = self.state.write().expect("config lock poisoned");
        anyhow::ensure!(
            !state.endpoints.iter().any(|e| e.id == endpoint.id),
            "endpoint {} already exists",
            endpoint.id
        );

        state.endpoints.push(endpoint);
        self.persist(&state)
    }

    /// Swaps in a fresh API key for the endpoint. The old key stops
    /// validating the moment this returns; both the swap and the write
    /// happen under one lock.
    pub fn rotate_api_key(&self, id: Uuid) -> anyhow::Result<Option<String>> {
        let mut state = self.state.write().expect("config lock poisoned");

        let Some(endpoint) = state.endpoints.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        let key = ControllerEndpoint::generate_api_key();
        endpoint.api_key = key.clone();

        self.persist(&state)?;

        Ok(Some(key))
    }

    fn persist(&self, state: &PersistedConfig) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, raw)
            .with_context(|| format!("failed to write config store {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace config store {}", self.path.display()))?;

        Ok(())
    }
}
