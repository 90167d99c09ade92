//! Caller-facing operations of the production line.
//!
//! [`LineService`] runs the read-validate-write sequence for each request:
//! read the persisted item, let the [`ProductionLine`] validate and compute
//! the new item, write it back, and clock the station visit.
//!
//! Writes are conditional on the version that was read, so two requests
//! racing on the same item cannot both commit: the loser gets
//! `VersionConflict`. Failures are never retried here.

use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::{ClockEntry, DwellClock};
use crate::engine::ProductionLine;
use crate::error::{LineError, LineResult};
use crate::item::{LineItem, Transition};
use crate::settings::LineSettings;
use crate::store::{ClockStore, ConfigStore, ItemStore};

/// The production line bound to its stores and operating mode.
#[derive(Clone)]
pub struct LineService {
    line: Arc<ProductionLine>,
    items: Arc<dyn ItemStore>,
    clock: DwellClock,
    live: bool,
}

impl LineService {
    pub fn new(
        line: Arc<ProductionLine>,
        items: Arc<dyn ItemStore>,
        clock_store: Arc<dyn ClockStore>,
        live: bool,
    ) -> Self {
        Self {
            line,
            items,
            clock: DwellClock::new(clock_store),
            live,
        }
    }

    /// Load the configured line and bind it to `store`.
    ///
    /// Fails with `ConfigurationMissing` (Unavailable) when the settings name
    /// a configuration the store does not hold.
    pub async fn load<S>(store: Arc<S>, settings: &LineSettings) -> LineResult<Self>
    where
        S: ItemStore + ClockStore + ConfigStore + 'static,
    {
        let config = store
            .load_configuration(&settings.config_id)
            .await?
            .ok_or_else(|| LineError::ConfigurationMissing(settings.config_id.clone()))?;
        let line = ProductionLine::from_configuration(&config)?;

        if settings.live {
            info!("Line {} running in live mode", settings.config_id);
        }

        Ok(Self::new(Arc::new(line), store.clone(), store, settings.live))
    }

    pub fn line(&self) -> &ProductionLine {
        &self.line
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Create a new item at the START station.
    pub async fn start_production(&self, transition: &Transition) -> LineResult<LineItem> {
        let item_id = transition.require_id()?;

        if self.items.get(item_id).await?.is_some() {
            return Err(LineError::ItemExists(item_id.to_string()));
        }

        let item = self.line.start_production(item_id)?;
        self.items.insert(&item).await?;
        self.clock.record_start(&item.id, &item.current_station_id).await?;

        Ok(item)
    }

    /// Record the outcome chosen at the item's current station.
    pub async fn station_arrive(&self, item_id: &str, transition: &Transition) -> LineResult<LineItem> {
        transition.require_id()?;
        let existing = self.fetch(item_id).await?;

        let item = self.line.from_station(&existing, transition)?;
        self.items.set(&item, existing.version).await?;
        self.clock.record_start(&item.id, &item.current_station_id).await?;

        Ok(item)
    }

    /// Move the item past its current station.
    pub async fn station_depart(&self, item_id: &str, transition: &Transition) -> LineResult<LineItem> {
        transition.require_id()?;
        let existing = self.fetch(item_id).await?;

        let item = self.line.to_next_station(&existing, transition)?;
        self.items.set(&item, existing.version).await?;
        self.clock.record_stop(&item.id, &existing.current_station_id).await?;

        Ok(item)
    }

    pub async fn get_item(&self, item_id: &str) -> LineResult<LineItem> {
        self.fetch(item_id).await
    }

    /// Every item on the line. An empty line is reported as `NothingStored`.
    pub async fn get_all_items(&self) -> LineResult<Vec<LineItem>> {
        let items = self.items.list().await?;
        if items.is_empty() {
            return Err(LineError::NothingStored);
        }
        Ok(items)
    }

    /// Remove an item and its clock entries. Refused in live mode.
    pub async fn delete_item(&self, item_id: &str) -> LineResult<LineItem> {
        if self.live {
            warn!("Refusing to delete {} in live mode", item_id);
            return Err(LineError::LiveMode(format!("delete item {item_id}")));
        }

        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or_else(|| LineError::NothingToDelete(item_id.to_string()))?;

        // Clock entries before the item: a failed call leaves the item in place.
        let removed = self.clock.delete_all(item_id).await?;
        self.items.delete(item_id).await?;
        info!("Deleted {} and {} clock entries", item.id, removed);

        Ok(item)
    }

    /// Raw dwell clock entries for an item.
    pub async fn clock_entries(&self, item_id: &str) -> LineResult<Vec<ClockEntry>> {
        self.clock.entries(item_id).await
    }

    async fn fetch(&self, item_id: &str) -> LineResult<LineItem> {
        self.items
            .get(item_id)
            .await?
            .ok_or_else(|| LineError::ItemNotFound(item_id.to_string()))
    }
}

impl std::fmt::Debug for LineService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineService")
            .field("line", &self.line.version())
            .field("live", &self.live)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::LineConfiguration;
    use crate::error::ErrorKind;
    use crate::station::State;
    use crate::store::{MockClockStore, MockItemStore};

    fn line() -> Arc<ProductionLine> {
        Arc::new(ProductionLine::from_configuration(&LineConfiguration::test_line()).unwrap())
    }

    fn service(items: MockItemStore, clock: MockClockStore, live: bool) -> LineService {
        LineService::new(line(), Arc::new(items), Arc::new(clock), live)
    }

    #[tokio::test]
    async fn test_start_production_inserts_and_clocks() {
        let mut items = MockItemStore::new();
        items.expect_get().returning(|_| Ok(None));
        items
            .expect_insert()
            .withf(|item| item.id == "X" && item.current_station_id == "1001" && item.version == 0)
            .times(1)
            .returning(|_| Ok(()));
        let mut clock = MockClockStore::new();
        clock
            .expect_append()
            .withf(|e| e.station_id == "1001" && e.operation == crate::clock::Operation::Start)
            .times(1)
            .returning(|_| Ok(()));

        let item = service(items, clock, false)
            .start_production(&Transition::new("X"))
            .await
            .unwrap();
        assert_eq!(item.state, State::Created);
    }

    #[tokio::test]
    async fn test_start_production_rejects_existing_item() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .returning(|_| Ok(Some(LineItem::created("X", "1001"))));
        items.expect_insert().never();

        let err = service(items, MockClockStore::new(), false)
            .start_production(&Transition::new("X"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .returning(|_| Err(LineError::Store("disk gone".into())));

        let err = service(items, MockClockStore::new(), false)
            .get_item("X")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_arrive_does_not_clock_on_rejection() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .returning(|_| Ok(Some(LineItem::created("X", "1001"))));
        items.expect_set().never();
        let mut clock = MockClockStore::new();
        clock.expect_append().never();

        let transition = Transition::new("X").at_station("1001").with_state(State::Scraped);
        let err = service(items, clock, false)
            .station_arrive("X", &transition)
            .await
            .unwrap_err();
        assert!(matches!(err, LineError::InvalidAction { .. }));
    }

    #[tokio::test]
    async fn test_stale_write_surfaces_as_conflict() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .returning(|_| Ok(Some(LineItem::created("X", "1001"))));
        items
            .expect_set()
            .withf(|item, expected| item.version == 1 && *expected == 0)
            .returning(|item, expected| {
                Err(LineError::VersionConflict {
                    item: item.id.clone(),
                    expected,
                    found: 3,
                })
            });
        let mut clock = MockClockStore::new();
        clock.expect_append().never();

        let transition = Transition::new("X").at_station("1001").with_state(State::Passed);
        let err = service(items, clock, false)
            .station_depart("X", &transition)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_depart_clocks_stop_at_previous_station() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .returning(|_| Ok(Some(LineItem::created("X", "1001"))));
        items.expect_set().times(1).returning(|_, _| Ok(()));
        let mut clock = MockClockStore::new();
        clock
            .expect_append()
            .withf(|e| e.station_id == "1001" && e.operation == crate::clock::Operation::Stop)
            .times(1)
            .returning(|_| Ok(()));

        let transition = Transition::new("X").at_station("1001").with_state(State::Passed);
        let item = service(items, clock, false)
            .station_depart("X", &transition)
            .await
            .unwrap();
        assert_eq!(item.current_station_id, "1002");
    }

    #[tokio::test]
    async fn test_live_delete_touches_nothing() {
        let mut items = MockItemStore::new();
        items.expect_get().never();
        items.expect_delete().never();
        let mut clock = MockClockStore::new();
        clock.expect_delete_all().never();

        let err = service(items, clock, true).delete_item("X").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_delete_missing_item_is_conflict() {
        let mut items = MockItemStore::new();
        items.expect_get().returning(|_| Ok(None));
        items.expect_delete().never();

        let err = service(items, MockClockStore::new(), false)
            .delete_item("X")
            .await
            .unwrap_err();
        assert!(matches!(err, LineError::NothingToDelete(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_failed_clock_cleanup_can_be_retried() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .times(2)
            .returning(|_| Ok(Some(LineItem::created("X", "1001"))));
        items.expect_delete().times(1).returning(|_| Ok(true));

        let mut clock = MockClockStore::new();
        let mut calls = 0;
        clock.expect_delete_all().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(LineError::Store("clock offline".into()))
            } else {
                Ok(2)
            }
        });

        let service = service(items, clock, false);
        let err = service.delete_item("X").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let deleted = service.delete_item("X").await.unwrap();
        assert_eq!(deleted.id, "X");
    }

    #[tokio::test]
    async fn test_empty_line_is_not_found() {
        let mut items = MockItemStore::new();
        items.expect_list().returning(|| Ok(Vec::new()));

        let err = service(items, MockClockStore::new(), false)
            .get_all_items()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
