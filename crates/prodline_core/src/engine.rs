//! Production line transition engine.
//!
//! [`ProductionLine`] validates and executes item transitions against an
//! immutable snapshot of the station registry and order graph. Every
//! operation is a pure function from the persisted item and the proposed
//! [`Transition`] to a new item or an error; persisting the result and
//! clocking the station visit are left to the caller.
//!
//! # Item lifecycle
//!
//! 1. **Start**: [`ProductionLine::start_production`] creates the item at the
//!    START station in state CREATED.
//! 2. **Arrive**: [`ProductionLine::from_station`] records the outcome chosen
//!    at the current station (pass, fail, retry, scrap).
//! 3. **Depart**: [`ProductionLine::to_next_station`] moves the item to the
//!    successor station, or marks it done when there is none.
//!
//! Advancing after RETRIED or SCRAPED is not forbidden here; whether to keep
//! moving such items is a caller decision.

use tracing::{debug, info};

use crate::configuration::LineConfiguration;
use crate::error::{LineError, LineResult};
use crate::item::{LineItem, Transition};
use crate::order::StationOrder;
use crate::registry::StationRegistry;
use crate::station::Station;

/// Immutable view of one configured production line.
#[derive(Debug, Clone)]
pub struct ProductionLine {
    version: String,
    registry: StationRegistry,
    order: StationOrder,
    start_station_id: String,
    estimated_production_time: f64,
}

impl ProductionLine {
    /// Assemble a line from an already built registry and order graph.
    ///
    /// Fails if no START station is registered or if an edge names a station
    /// the registry does not know.
    pub fn new(registry: StationRegistry, order: StationOrder) -> LineResult<Self> {
        let start_station_id = registry.start_station_id()?.to_string();

        for (from, to) in order.edges() {
            for id in [from, to] {
                if !registry.contains(id) {
                    return Err(LineError::UnknownStation(id.to_string()));
                }
            }
        }

        Ok(Self {
            version: String::new(),
            registry,
            order,
            start_station_id,
            estimated_production_time: 0.0,
        })
    }

    /// Build and validate a line from its persisted configuration.
    pub fn from_configuration(config: &LineConfiguration) -> LineResult<Self> {
        let mut registry = StationRegistry::new();
        for (key, station) in &config.stations {
            if key != &station.id {
                return Err(LineError::InvalidStation {
                    station: key.clone(),
                    message: format!("keyed under '{}' but has id '{}'", key, station.id),
                });
            }
            registry.add_station(station.clone())?;
        }

        config.station_order.validate()?;
        let order = config.station_order.clone();

        let mut line = Self::new(registry, order)?;
        line.version = config.version.clone();
        line.estimated_production_time = config.estimated_production_time;

        info!(
            "Loaded production line {} with {} stations ({} on path)",
            line.version,
            line.registry.len(),
            line.path().len()
        );
        Ok(line)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn order(&self) -> &StationOrder {
        &self.order
    }

    pub fn start_station_id(&self) -> &str {
        &self.start_station_id
    }

    pub fn station(&self, id: &str) -> LineResult<&Station> {
        self.registry.get(id)
    }

    /// Station ids in visiting order, from the START station to the end.
    pub fn path(&self) -> Vec<String> {
        self.order.path_from(&self.start_station_id)
    }

    /// Configured estimate, or the sum of nominal durations along the path.
    pub fn estimated_production_time(&self) -> f64 {
        if self.estimated_production_time > 0.0 {
            return self.estimated_production_time;
        }
        self.path()
            .iter()
            .filter_map(|id| self.station(id).ok())
            .map(|s| s.nominal_duration_seconds)
            .sum()
    }

    /// Create a new item at the START station.
    ///
    /// The caller guarantees no item with this id exists yet.
    pub fn start_production(&self, item_id: &str) -> LineResult<LineItem> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(LineError::MissingId);
        }

        info!("Starting production of {} at station {}", item_id, self.start_station_id);
        Ok(LineItem::created(item_id, self.start_station_id.clone()))
    }

    /// Record the outcome chosen for an item at its current station.
    ///
    /// Never moves the item; only its state changes.
    pub fn from_station(&self, existing: &LineItem, proposed: &Transition) -> LineResult<LineItem> {
        if existing.is_done {
            return Err(LineError::AlreadyDone(existing.id.clone()));
        }
        self.check_id(existing, proposed)?;

        let state = proposed.validate()?;
        let station = self.resolve_station(existing, proposed)?;

        if !station.permits(state) {
            return Err(LineError::InvalidAction {
                station: station.id.clone(),
                state,
            });
        }

        let mut item = existing.clone();
        item.state = state;
        item.version = existing.version + 1;

        debug!("Item {} at station {}: {} -> {}", item.id, station.id, existing.state, state);
        Ok(item)
    }

    /// Move an item past its current station.
    ///
    /// When the current station has no successor the item stays where it is
    /// and is marked done.
    pub fn to_next_station(&self, existing: &LineItem, proposed: &Transition) -> LineResult<LineItem> {
        self.check_id(existing, proposed)?;

        let state = proposed.validate()?;
        let station = self.resolve_station(existing, proposed)?;

        let mut item = existing.clone();
        item.state = state;
        item.version = existing.version + 1;

        match self.order.next_of(&station.id) {
            Some(next) => {
                item.current_station_id = next.to_string();
                item.is_done = false;
                info!("Item {} moved {} -> {} ({})", item.id, station.id, next, state);
            }
            None => {
                item.is_done = true;
                info!("Item {} left the line at station {} ({})", item.id, station.id, state);
            }
        }

        Ok(item)
    }

    fn check_id(&self, existing: &LineItem, proposed: &Transition) -> LineResult<()> {
        if !existing.matches_id(proposed.id.trim()) {
            return Err(LineError::IdMismatch {
                expected: existing.id.clone(),
                proposed: proposed.id.clone(),
            });
        }
        Ok(())
    }

    /// The station a transition refers to, which must be the item's own.
    fn resolve_station(&self, existing: &LineItem, proposed: &Transition) -> LineResult<&Station> {
        let station_id = proposed
            .current_station_id
            .as_deref()
            .unwrap_or(&existing.current_station_id);
        let station = self.station(station_id)?;

        if station.id != existing.current_station_id {
            return Err(LineError::StationMismatch {
                item: existing.id.clone(),
                current: existing.current_station_id.clone(),
                proposed: station.id.clone(),
            });
        }
        Ok(station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{Action, State, StationType};

    fn line() -> ProductionLine {
        ProductionLine::from_configuration(&LineConfiguration::test_line()).unwrap()
    }

    fn arrive(id: &str, station: &str, state: State) -> Transition {
        Transition::new(id).at_station(station).with_state(state)
    }

    #[test]
    fn test_start_production() {
        let line = line();
        let item = line.start_production("X").unwrap();

        assert_eq!(item.id, "X");
        assert_eq!(item.current_station_id, "1001");
        assert_eq!(item.state, State::Created);
        assert!(!item.is_done);
        assert!(matches!(line.start_production(" "), Err(LineError::MissingId)));
    }

    #[test]
    fn test_from_station_accepts_only_allowed_actions() {
        let line = line();
        let item = line.start_production("X").unwrap();

        for state in [State::Passed, State::Failed] {
            let result = line.from_station(&item, &arrive("X", "1001", state)).unwrap();
            assert_eq!(result.state, state);
            assert_eq!(result.current_station_id, "1001");
            assert!(!result.is_done);
            assert_eq!(result.version, item.version + 1);
        }

        for state in [State::Retried, State::Scraped] {
            let result = line.from_station(&item, &arrive("X", "1001", state));
            assert!(matches!(
                result,
                Err(LineError::InvalidAction { station, state: s }) if station == "1001" && s == state
            ));
        }
    }

    #[test]
    fn test_from_station_defaults_to_current_station() {
        let line = line();
        let item = line.start_production("X").unwrap();
        let proposed = Transition::new("X").with_state(State::Passed);

        let result = line.from_station(&item, &proposed).unwrap();
        assert_eq!(result.state, State::Passed);
    }

    #[test]
    fn test_from_station_rejects_done_item_regardless_of_state() {
        let line = line();
        let mut item = line.start_production("X").unwrap();
        item.current_station_id = "1004".to_string();
        item.is_done = true;

        for state in [State::Passed, State::Failed, State::Retried, State::Done] {
            let result = line.from_station(&item, &arrive("X", "1004", state));
            assert!(matches!(result, Err(LineError::AlreadyDone(_))));
        }
        let result = line.from_station(&item, &Transition::new("X"));
        assert!(matches!(result, Err(LineError::AlreadyDone(_))));
    }

    #[test]
    fn test_id_mismatch_is_case_insensitive() {
        let line = line();
        let item = line.start_production("abc").unwrap();

        assert!(line.from_station(&item, &arrive("ABC", "1001", State::Passed)).is_ok());
        assert!(line.to_next_station(&item, &arrive("AbC", "1001", State::Passed)).is_ok());

        let result = line.from_station(&item, &arrive("abd", "1001", State::Passed));
        assert!(matches!(result, Err(LineError::IdMismatch { .. })));
        let result = line.to_next_station(&item, &arrive("abd", "1001", State::Passed));
        assert!(matches!(result, Err(LineError::IdMismatch { .. })));
    }

    #[test]
    fn test_transition_for_other_station_is_rejected() {
        let line = line();
        let item = line.start_production("X").unwrap();

        let result = line.from_station(&item, &arrive("X", "1003", State::Passed));
        assert!(matches!(result, Err(LineError::StationMismatch { .. })));

        let result = line.from_station(&item, &arrive("X", "9999", State::Passed));
        assert!(matches!(result, Err(LineError::StationNotFound(_))));
    }

    #[test]
    fn test_to_next_station_advances() {
        let line = line();
        let item = line.start_production("X").unwrap();
        let item = line.from_station(&item, &arrive("X", "1001", State::Passed)).unwrap();

        let moved = line.to_next_station(&item, &arrive("X", "1001", State::Passed)).unwrap();
        assert_eq!(moved.current_station_id, "1002");
        assert_eq!(moved.state, State::Passed);
        assert!(!moved.is_done);
        assert_eq!(moved.version, 2);
    }

    #[test]
    fn test_to_next_station_at_terminal_marks_done() {
        let line = line();
        let mut item = line.start_production("X").unwrap();
        item.current_station_id = "1004".to_string();

        for state in [State::Passed, State::Failed, State::Scraped] {
            let result = line.to_next_station(&item, &arrive("X", "1004", state)).unwrap();
            assert!(result.is_done);
            assert_eq!(result.current_station_id, "1004");
            assert_eq!(result.state, state);
        }
    }

    #[test]
    fn test_full_chain_completes_after_four_departures() {
        let line = line();
        let mut item = line.start_production("X").unwrap();
        let mut departures = 0;

        while !item.is_done {
            let station = item.current_station_id.clone();
            item = line.from_station(&item, &arrive("X", &station, State::Passed)).unwrap();
            assert!(!item.is_done);
            item = line.to_next_station(&item, &arrive("X", &station, State::Passed)).unwrap();
            departures += 1;
            assert!(departures <= 4);
        }

        assert_eq!(departures, 4);
        assert_eq!(item.current_station_id, "1004");
        assert_eq!(item.state, State::Passed);
        assert_eq!(item.version, 8);
    }

    #[test]
    fn test_advancing_after_retry_is_allowed() {
        let config = LineConfiguration::new("svc")
            .station(
                Station::new("S", "Start", StationType::Start, 1.0)
                    .actions([Action::new("Next", State::Passed), Action::new("Retry", State::Retried)]),
            )
            .station(Station::new("E", "End", StationType::End, 1.0).action(Action::new("Next", State::Passed)))
            .edge("S", "E")
            .unwrap();
        let line = ProductionLine::from_configuration(&config).unwrap();

        let item = line.start_production("X").unwrap();
        let item = line.from_station(&item, &arrive("X", "S", State::Retried)).unwrap();
        let item = line.to_next_station(&item, &arrive("X", "S", State::Retried)).unwrap();
        assert_eq!(item.current_station_id, "E");
        assert_eq!(item.state, State::Retried);
    }

    #[test]
    fn test_configuration_validation() {
        let mut config = LineConfiguration::test_line();
        config.station_order.add_edge("1004", "9999").unwrap();
        assert!(matches!(
            ProductionLine::from_configuration(&config),
            Err(LineError::UnknownStation(id)) if id == "9999"
        ));

        let mut config = LineConfiguration::test_line();
        config.stations.remove("1001");
        assert!(matches!(
            ProductionLine::from_configuration(&config),
            Err(LineError::NoStartStation)
        ));

        let mut config = LineConfiguration::test_line();
        let stray = config.stations["1002"].clone();
        config.stations.insert("1009".to_string(), stray);
        assert!(matches!(
            ProductionLine::from_configuration(&config),
            Err(LineError::InvalidStation { .. })
        ));
    }

    #[test]
    fn test_cyclic_configuration_is_rejected() {
        let config: LineConfiguration = serde_json::from_value(serde_json::json!({
            "version": "cyclic",
            "stations": LineConfiguration::test_line().stations,
            "station_order": {"1001": "1002", "1002": "1003", "1003": "1001"}
        }))
        .unwrap();

        assert!(matches!(
            ProductionLine::from_configuration(&config),
            Err(LineError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_path_and_estimate() {
        let line = line();
        assert_eq!(line.path(), vec!["1001", "1002", "1003", "1004"]);
        assert_eq!(line.estimated_production_time(), 15.0);
        assert_eq!(line.version(), "1.0.0");
        assert_eq!(line.order().next_of("1002"), Some("1003"));
        assert_eq!(line.station("2001").unwrap().permitted_states().len(), 3);
        assert!(matches!(line.station("9999"), Err(LineError::StationNotFound(_))));

        let mut config = LineConfiguration::test_line();
        config.estimated_production_time = 0.0;
        let line = ProductionLine::from_configuration(&config).unwrap();
        assert_eq!(line.estimated_production_time(), 10.0);
    }
}
