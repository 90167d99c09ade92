//! Persisted line configuration.
//!
//! This is the only document format the core cares about: a version
//! string, the station map, the station order and an estimated total
//! production time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LineResult;
use crate::order::StationOrder;
use crate::station::{Action, State, Station, StationType};

/// Stations, order and timing of one production line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfiguration {
    pub version: String,
    pub stations: BTreeMap<String, Station>,
    #[serde(default)]
    pub station_order: StationOrder,
    /// Seconds; zero means "derive from the stations on the path".
    #[serde(default)]
    pub estimated_production_time: f64,
}

impl Default for LineConfiguration {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            stations: BTreeMap::new(),
            station_order: StationOrder::new(),
            estimated_production_time: 0.0,
        }
    }
}

impl LineConfiguration {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add a station keyed by its id.
    pub fn station(mut self, station: Station) -> Self {
        self.stations.insert(station.id.clone(), station);
        self
    }

    /// Declare `to` as the successor of `from`.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> LineResult<Self> {
        self.station_order.add_edge(from, to)?;
        Ok(self)
    }

    pub fn with_estimated_time(mut self, seconds: f64) -> Self {
        self.estimated_production_time = seconds;
        self
    }

    pub fn from_yaml(content: &str) -> LineResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> LineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The reference four-station line with a detached service station.
    ///
    /// `1001 (START) -> 1002 -> 1003 -> 1004 (END)`, plus `2001` (SERVICE)
    /// which allows retry and scrap but is not on the path.
    pub fn test_line() -> Self {
        let pass = Action::new("Next", State::Passed);
        let failed = Action::new("Failed", State::Failed);
        let retry = Action::new("Retry", State::Retried);
        let scrap = Action::new("Scrap item", State::Scraped);

        let mut stations = BTreeMap::new();
        for station in [
            Station::new("1001", "Start Station", StationType::Start, 1.0)
                .actions([pass.clone(), failed.clone()]),
            Station::new("1002", "Second Station", StationType::Production, 2.0)
                .actions([pass.clone(), failed.clone()]),
            Station::new("1003", "Third Station", StationType::Production, 3.0)
                .actions([pass.clone(), failed.clone()]),
            Station::new("1004", "End Station", StationType::End, 4.0)
                .actions([pass.clone(), failed]),
            Station::new("2001", "Service Station", StationType::Service, 5.0)
                .actions([pass, retry, scrap]),
        ] {
            stations.insert(station.id.clone(), station);
        }

        let station_order = StationOrder::from(
            [("1001", "1002"), ("1002", "1003"), ("1003", "1004")]
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect::<BTreeMap<_, _>>(),
        );

        Self {
            version: "1.0.0".to_string(),
            stations,
            station_order,
            estimated_production_time: 15.0,
        }
    }
}
