//! Station registry for looking up the stations of a line.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{LineError, LineResult};
use crate::station::Station;

/// A registry of the stations configured on a line.
///
/// The registry maps station ids to their definitions and remembers the
/// single START station that items enter through. It is filled once from
/// configuration and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: HashMap<String, Station>,
    start_station: Option<String>,
}

impl StationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            stations: HashMap::new(),
            start_station: None,
        }
    }

    /// Add a station.
    ///
    /// Fails if a station with the same id is already registered, or if the
    /// station is a second START station.
    pub fn add_station(&mut self, station: Station) -> LineResult<()> {
        station.validate()?;

        if self.stations.contains_key(&station.id) {
            return Err(LineError::DuplicateStation(station.id));
        }

        if station.is_start() {
            if let Some(first) = &self.start_station {
                return Err(LineError::MultipleStartStations {
                    first: first.clone(),
                    second: station.id,
                });
            }
            self.start_station = Some(station.id.clone());
        }

        debug!("Registering station: {} ({})", station.id, station.station_type);
        self.stations.insert(station.id.clone(), station);
        Ok(())
    }

    /// Get a station by id.
    pub fn get(&self, id: &str) -> LineResult<&Station> {
        self.stations
            .get(id)
            .ok_or_else(|| LineError::StationNotFound(id.to_string()))
    }

    /// Id of the configured START station.
    pub fn start_station_id(&self) -> LineResult<&str> {
        self.start_station.as_deref().ok_or(LineError::NoStartStation)
    }

    /// Check if a station is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.stations.contains_key(id)
    }

    /// All registered station ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stations.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all registered stations.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Get the number of registered stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
