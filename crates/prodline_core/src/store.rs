//! Persistence contracts the line depends on.
//!
//! The core never talks to storage directly. Concrete stores live in the
//! `prodline_store` crate; anything implementing these traits can back a
//! [`LineService`](crate::service::LineService).

use async_trait::async_trait;

use crate::clock::ClockEntry;
use crate::configuration::LineConfiguration;
use crate::error::LineResult;
use crate::item::LineItem;

/// Storage for line items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch an item by id.
    async fn get(&self, item_id: &str) -> LineResult<Option<LineItem>>;

    /// Store a new item. Fails with `ItemExists` if the id is taken.
    async fn insert(&self, item: &LineItem) -> LineResult<()>;

    /// Replace an item, but only if the stored version is still
    /// `expected_version`. Fails with `VersionConflict` otherwise.
    async fn set(&self, item: &LineItem, expected_version: u64) -> LineResult<()>;

    /// Remove an item. Returns whether it existed.
    async fn delete(&self, item_id: &str) -> LineResult<bool>;

    /// All stored items.
    async fn list(&self) -> LineResult<Vec<LineItem>>;
}

/// Append-only storage for dwell clock entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClockStore: Send + Sync {
    async fn append(&self, entry: &ClockEntry) -> LineResult<()>;

    /// Entries recorded for an item, oldest first.
    async fn entries_for(&self, item_id: &str) -> LineResult<Vec<ClockEntry>>;

    /// Remove every entry for an item. Returns how many were removed.
    async fn delete_all(&self, item_id: &str) -> LineResult<usize>;
}

/// Storage for line configurations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_configuration(&self, config_id: &str) -> LineResult<Option<LineConfiguration>>;

    async fn write_configuration(&self, config_id: &str, configuration: &LineConfiguration) -> LineResult<()>;
}
