//! Dwell clock: when an item entered and left each station.
//!
//! Entries are append-only and keyed by item id. The clock does no
//! analysis of its own; it only timestamps station visits.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LineResult;
use crate::store::ClockStore;

/// Whether a clock entry marks entry to or exit from a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Start,
    Stop,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Start => write!(f, "START"),
            Operation::Stop => write!(f, "STOP"),
        }
    }
}

/// One timestamped station event for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEntry {
    pub item_id: String,
    pub station_id: String,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
}

impl ClockEntry {
    pub fn now(item_id: impl Into<String>, station_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            item_id: item_id.into(),
            station_id: station_id.into(),
            operation,
            timestamp: Utc::now(),
        }
    }
}

/// Records station entry and exit times through a [`ClockStore`].
#[derive(Clone)]
pub struct DwellClock {
    store: Arc<dyn ClockStore>,
}

impl DwellClock {
    pub fn new(store: Arc<dyn ClockStore>) -> Self {
        Self { store }
    }

    pub async fn record_start(&self, item_id: &str, station_id: &str) -> LineResult<ClockEntry> {
        self.record(item_id, station_id, Operation::Start).await
    }

    pub async fn record_stop(&self, item_id: &str, station_id: &str) -> LineResult<ClockEntry> {
        self.record(item_id, station_id, Operation::Stop).await
    }

    /// Raw entries for an item, for administrative tooling.
    pub async fn entries(&self, item_id: &str) -> LineResult<Vec<ClockEntry>> {
        self.store.entries_for(item_id).await
    }

    /// Remove every entry for an item.
    pub async fn delete_all(&self, item_id: &str) -> LineResult<usize> {
        let removed = self.store.delete_all(item_id).await?;
        debug!("Removed {} clock entries for {}", removed, item_id);
        Ok(removed)
    }

    async fn record(&self, item_id: &str, station_id: &str, operation: Operation) -> LineResult<ClockEntry> {
        let entry = ClockEntry::now(item_id, station_id, operation);
        self.store.append(&entry).await?;
        debug!("Clocked {} for {} at station {}", operation, item_id, station_id);
        Ok(entry)
    }
}

impl fmt::Debug for DwellClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DwellClock").finish_non_exhaustive()
    }
}
