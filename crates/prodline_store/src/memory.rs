//! In-memory store.
//!
//! Holds items, clock entries and configurations in shared maps. Clones share
//! the same state, so a test can keep a handle and inspect what the service
//! wrote.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use prodline_core::{
    ClockEntry, ClockStore, ConfigStore, ItemStore, LineConfiguration, LineError, LineItem,
    LineResult,
};

/// Store backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<HashMap<String, LineItem>>>,
    clock: Arc<RwLock<Vec<ClockEntry>>>,
    configurations: Arc<RwLock<HashMap<String, LineConfiguration>>>,
    /// Every operation fails with this message while set.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a configuration under `config_id`.
    pub fn with_configuration(self, config_id: impl Into<String>, configuration: LineConfiguration) -> Self {
        self.configurations.write().insert(config_id.into(), configuration);
        self
    }

    /// Make every subsequent operation fail with a store error.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn clear_failure(&self) {
        *self.simulate_failure.write() = None;
    }

    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    pub fn clock_len(&self) -> usize {
        self.clock.read().len()
    }

    fn check_failure(&self) -> LineResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(LineError::Store(msg));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("items", &self.items.read().len())
            .field("clock", &self.clock.read().len())
            .field("configurations", &self.configurations.read().len())
            .finish()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get(&self, item_id: &str) -> LineResult<Option<LineItem>> {
        self.check_failure()?;
        Ok(self.items.read().get(item_id).cloned())
    }

    async fn insert(&self, item: &LineItem) -> LineResult<()> {
        self.check_failure()?;
        let mut items = self.items.write();
        if items.contains_key(&item.id) {
            return Err(LineError::ItemExists(item.id.clone()));
        }
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn set(&self, item: &LineItem, expected_version: u64) -> LineResult<()> {
        self.check_failure()?;
        let mut items = self.items.write();
        let stored = items
            .get_mut(&item.id)
            .ok_or_else(|| LineError::ItemNotFound(item.id.clone()))?;

        if stored.version != expected_version {
            return Err(LineError::VersionConflict {
                item: item.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        *stored = item.clone();
        debug!("Stored {} at version {}", item.id, item.version);
        Ok(())
    }

    async fn delete(&self, item_id: &str) -> LineResult<bool> {
        self.check_failure()?;
        Ok(self.items.write().remove(item_id).is_some())
    }

    async fn list(&self) -> LineResult<Vec<LineItem>> {
        self.check_failure()?;
        let mut items: Vec<LineItem> = self.items.read().values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}

#[async_trait]
impl ClockStore for MemoryStore {
    async fn append(&self, entry: &ClockEntry) -> LineResult<()> {
        self.check_failure()?;
        self.clock.write().push(entry.clone());
        Ok(())
    }

    async fn entries_for(&self, item_id: &str) -> LineResult<Vec<ClockEntry>> {
        self.check_failure()?;
        Ok(self
            .clock
            .read()
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn delete_all(&self, item_id: &str) -> LineResult<usize> {
        self.check_failure()?;
        let mut clock = self.clock.write();
        let before = clock.len();
        clock.retain(|e| e.item_id != item_id);
        Ok(before - clock.len())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load_configuration(&self, config_id: &str) -> LineResult<Option<LineConfiguration>> {
        self.check_failure()?;
        Ok(self.configurations.read().get(config_id).cloned())
    }

    async fn write_configuration(&self, config_id: &str, configuration: &LineConfiguration) -> LineResult<()> {
        self.check_failure()?;
        self.configurations
            .write()
            .insert(config_id.to_string(), configuration.clone());
        Ok(())
    }
}
