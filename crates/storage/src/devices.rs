//! Light repository on top of a [`DocumentStore`].
//!
//! Ids come from an atomic counter and are never reused. Each light is one
//! JSON document; `lights:all` indexes the live ids so listing is a fan-out
//! over the index instead of a scan.

use std::sync::Arc;

use lightchat_core::{
    ALL_LIGHTS_SET_KEY, Device, LIGHT_ID_COUNTER_KEY, TEMPERATURE_UNSET, is_valid_temperature,
    light_key, temperature_from_stored, temperature_to_stored,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::StorageError;
use crate::traits::DocumentStore;

/// Document layout as persisted.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLight {
    id: u64,
    name: String,
    #[serde(default)]
    is_on: bool,
    #[serde(default)]
    temperature: Option<i64>,
}

impl From<&Device> for StoredLight {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            is_on: d.is_on,
            temperature: Some(temperature_to_stored(d.temperature)),
        }
    }
}

impl From<StoredLight> for Device {
    fn from(s: StoredLight) -> Self {
        Self {
            id: s.id,
            name: s.name,
            is_on: s.is_on,
            temperature: temperature_from_stored(s.temperature.unwrap_or(TEMPERATURE_UNSET)),
        }
    }
}

fn decode(key: &str, doc: Value) -> Result<Device, StorageError> {
    serde_json::from_value::<StoredLight>(doc).map(Device::from).map_err(|e| {
        StorageError::DataCorruption { context: format!("document {key}"), source: Box::new(e) }
    })
}

pub struct DeviceRepository<S = crate::StorageBackend> {
    store: Arc<S>,
}

impl<S> Clone for DeviceRepository<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: DocumentStore> DeviceRepository<S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Allocate an id, write the document, then index it.
    pub async fn create(&self, name: &str) -> Result<Device, StorageError> {
        let id = self.store.incr(LIGHT_ID_COUNTER_KEY).await?;
        let device = Device::new(id, name);
        let key = light_key(id);
        self.store.put_document(&key, &serde_json::to_value(StoredLight::from(&device))?).await?;
        self.store.set_add(ALL_LIGHTS_SET_KEY, id).await?;
        tracing::info!(id, name, "light created");
        Ok(device)
    }

    /// All indexed lights. Index entries without a readable document are skipped.
    pub async fn list(&self) -> Result<Vec<Device>, StorageError> {
        let ids = self.store.set_members(ALL_LIGHTS_SET_KEY).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| light_key(*id)).collect();
        let docs = self.store.get_documents(&keys).await?;

        let mut lights = Vec::with_capacity(docs.len());
        for (key, doc) in keys.iter().zip(docs) {
            let Some(doc) = doc else {
                tracing::debug!(%key, "index entry without document, skipping");
                continue;
            };
            match decode(key, doc) {
                Ok(device) => lights.push(device),
                Err(e) => tracing::warn!(%key, error = %e, "unreadable light document, skipping"),
            }
        }
        Ok(lights)
    }

    pub async fn get(&self, id: u64) -> Result<Option<Device>, StorageError> {
        let key = light_key(id);
        self.store.get_document(&key).await?.map(|doc| decode(&key, doc)).transpose()
    }

    /// Update only `is_on`, then read back the current state.
    pub async fn set_power(&self, id: u64, is_on: bool) -> Result<Device, StorageError> {
        self.update_field(id, "is_on", json!(is_on)).await
    }

    /// Update only `temperature`; `None` (or `Some(0)`) clears it.
    pub async fn set_temperature(
        &self,
        id: u64,
        temperature: Option<i64>,
    ) -> Result<Device, StorageError> {
        let stored = match temperature {
            None | Some(TEMPERATURE_UNSET) => TEMPERATURE_UNSET,
            Some(value) => {
                let valid = u32::try_from(value).is_ok_and(is_valid_temperature);
                if !valid {
                    return Err(StorageError::InvalidTemperature(value));
                }
                value
            },
        };
        self.update_field(id, "temperature", json!(stored)).await
    }

    /// Remove the index entry first, then the document.
    pub async fn delete(&self, id: u64) -> Result<bool, StorageError> {
        self.store.set_remove(ALL_LIGHTS_SET_KEY, id).await?;
        let existed = self.store.delete_document(&light_key(id)).await?;
        tracing::info!(id, existed, "light deleted");
        Ok(existed)
    }

    async fn update_field(&self, id: u64, field: &str, value: Value) -> Result<Device, StorageError> {
        let key = light_key(id);
        if !self.store.set_field(&key, field, &value).await? {
            return Err(StorageError::DeviceNotFound { id });
        }
        tracing::debug!(id, field, %value, "light field updated");
        self.get(id).await?.ok_or(StorageError::DeviceNotFound { id })
    }
}
