//! Station order graph.
//!
//! Maps each station to the station items visit next. Every station has at
//! most one successor, so following successors from any station walks a single
//! path; a station without an entry is terminal for the line. Retry and
//! scrap are item states, never edges.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LineError, LineResult};

/// Linear successor mapping between station ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationOrder {
    next: BTreeMap<String, String>,
}

impl StationOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a list of `(from, to)` edges.
    pub fn from_edges<I, F, T>(edges: I) -> LineResult<Self>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let mut order = Self::new();
        for (from, to) in edges {
            order.add_edge(from, to)?;
        }
        Ok(order)
    }

    /// Declare `to_id` as the successor of `from_id`.
    ///
    /// Fails if `from_id` already has a successor or if the edge would let an
    /// item loop back to a station it already completed.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> LineResult<()> {
        let from_id = from_id.into();
        let to_id = to_id.into();

        if let Some(existing) = self.next.get(&from_id) {
            return Err(LineError::DuplicateSuccessor {
                station: from_id,
                existing: existing.clone(),
            });
        }

        // Each station has one successor, so walking forward from `to_id`
        // either ends or reaches `from_id`.
        let mut cursor = Some(to_id.as_str());
        while let Some(id) = cursor {
            if id == from_id {
                return Err(LineError::CycleDetected(from_id));
            }
            cursor = self.next.get(id).map(|s| s.as_str());
        }

        debug!("Adding station transition: {} -> {}", from_id, to_id);
        self.next.insert(from_id, to_id);
        Ok(())
    }

    /// Successor of `station_id`, or `None` if it is terminal.
    pub fn next_of(&self, station_id: &str) -> Option<&str> {
        self.next.get(station_id).map(|s| s.as_str())
    }

    /// Station ids visited from `start_id` to the terminal station.
    pub fn path_from(&self, start_id: &str) -> Vec<String> {
        let mut path = vec![start_id.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([start_id]);
        let mut cursor = self.next_of(start_id);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            path.push(id.to_string());
            cursor = self.next_of(id);
        }
        path
    }

    /// Re-check a graph that was deserialized or built from a raw map rather
    /// than edge by edge.
    pub fn validate(&self) -> LineResult<()> {
        Self::from_edges(self.edges()).map(|_| ())
    }

    /// All `(from, to)` edges, ordered by source id.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.next.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}

impl From<BTreeMap<String, String>> for StationOrder {
    /// Wrap a raw successor map without checking it; see [`StationOrder::validate`].
    fn from(next: BTreeMap<String, String>) -> Self {
        Self { next }
    }
}
