//! Line items and the transitions callers propose for them.

use serde::{Deserialize, Serialize};

use crate::error::{LineError, LineResult};
use crate::station::State;

/// The persisted record of one physical item on the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Business key, immutable once created.
    pub id: String,
    pub current_station_id: String,
    pub state: State,
    /// Set once the item has left the last station.
    pub is_done: bool,
    /// Bumped on every committed transition; used for conditional writes.
    #[serde(default)]
    pub version: u64,
}

impl LineItem {
    /// A freshly created item waiting at `station_id`.
    pub fn created(id: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_station_id: station_id.into(),
            state: State::Created,
            is_done: false,
            version: 0,
        }
    }

    /// Whether `other` names this item, ignoring case.
    pub fn matches_id(&self, other: &str) -> bool {
        self.id.eq_ignore_ascii_case(other)
    }
}

/// A caller-supplied proposal to change an item's state or station.
///
/// Carries no history: it is the proposed delta for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default)]
    pub id: String,
    /// Defaults to the item's current station (or the start station on
    /// creation) when omitted.
    #[serde(default)]
    pub current_station_id: Option<String>,
    #[serde(default)]
    pub state: Option<State>,
}

impl Transition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_station_id: None,
            state: None,
        }
    }

    pub fn at_station(mut self, station_id: impl Into<String>) -> Self {
        self.current_station_id = Some(station_id.into());
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Check only that an id is present.
    pub fn require_id(&self) -> LineResult<&str> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(LineError::MissingId);
        }
        Ok(id)
    }

    /// Structural validation for arrive/depart requests.
    ///
    /// Returns the requested state. Reserved states are refused: CREATED is
    /// set on creation and DONE when the item leaves the line.
    pub fn validate(&self) -> LineResult<State> {
        self.require_id()?;
        if matches!(&self.current_station_id, Some(s) if s.trim().is_empty()) {
            return Err(LineError::StationNotFound(String::new()));
        }
        let state = self.state.ok_or(LineError::MissingState)?;
        if state.is_reserved() {
            return Err(LineError::ReservedState(state));
        }
        Ok(state)
    }
}
