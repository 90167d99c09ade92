//! Station definitions and the outcome states they permit.
//!
//! A station is a discrete processing point on the line. Each station
//! declares the actions an operator may take there, and every action
//! names the [`State`] an item enters when that action is applied. The
//! allowed actions are therefore both the validation input and the whole
//! outcome space of a station.
//!
//! # Example
//!
//! ```rust
//! use prodline_core::{Action, State, Station, StationType};
//!
//! let station = Station::new("1002", "Second Station", StationType::Production, 2.0)
//!     .action(Action::new("Next", State::Passed))
//!     .action(Action::new("Failed", State::Failed));
//!
//! assert!(station.permits(State::Passed));
//! assert!(!station.permits(State::Scraped));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LineError, LineResult};

/// Outcome of an item's last transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Created,
    Passed,
    Failed,
    Retried,
    Scraped,
    /// Assigned by the line when an item leaves the last station.
    Done,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Created => "CREATED",
            State::Passed => "PASSED",
            State::Failed => "FAILED",
            State::Retried => "RETRIED",
            State::Scraped => "SCRAPED",
            State::Done => "DONE",
        }
    }

    /// Parse a state name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" => Some(State::Created),
            "PASSED" => Some(State::Passed),
            "FAILED" => Some(State::Failed),
            "RETRIED" => Some(State::Retried),
            "SCRAPED" => Some(State::Scraped),
            "DONE" => Some(State::Done),
            _ => None,
        }
    }

    /// States only the line itself may assign.
    pub fn is_reserved(&self) -> bool {
        matches!(self, State::Created | State::Done)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a station plays on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationType {
    Start,
    Production,
    Service,
    End,
}

impl StationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationType::Start => "START",
            StationType::Production => "PRODUCTION",
            StationType::Service => "SERVICE",
            StationType::End => "END",
        }
    }
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, station-scoped choice that assigns a resulting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub result_state: State,
}

impl Action {
    pub fn new(label: impl Into<String>, result_state: State) -> Self {
        Self {
            label: label.into(),
            result_state,
        }
    }
}

/// A processing point on the production line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub station_type: StationType,
    pub allowed_actions: Vec<Action>,
    pub nominal_duration_seconds: f64,
}

impl Station {
    /// Create a station without any allowed actions.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        station_type: StationType,
        nominal_duration_seconds: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            station_type,
            allowed_actions: Vec::new(),
            nominal_duration_seconds,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.allowed_actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.allowed_actions.extend(actions);
        self
    }

    /// Whether applying `state` at this station is legal.
    pub fn permits(&self, state: State) -> bool {
        self.allowed_actions.iter().any(|a| a.result_state == state)
    }

    /// Outcome states reachable from this station, in declaration order.
    pub fn permitted_states(&self) -> Vec<State> {
        let mut states: Vec<State> = Vec::with_capacity(self.allowed_actions.len());
        for action in &self.allowed_actions {
            if !states.contains(&action.result_state) {
                states.push(action.result_state);
            }
        }
        states
    }

    pub fn is_start(&self) -> bool {
        self.station_type == StationType::Start
    }

    /// Check the station is well-formed.
    pub fn validate(&self) -> LineResult<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id must not be blank"));
        }
        if self.allowed_actions.is_empty() {
            return Err(self.invalid("at least one allowed action is required"));
        }
        if let Some(action) = self.allowed_actions.iter().find(|a| a.result_state.is_reserved()) {
            return Err(self.invalid(format!(
                "action '{}' results in reserved state {}",
                action.label, action.result_state
            )));
        }
        if !self.nominal_duration_seconds.is_finite() || self.nominal_duration_seconds < 0.0 {
            return Err(self.invalid("nominal duration must be a non-negative number"));
        }
        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> LineError {
        LineError::InvalidStation {
            station: self.id.clone(),
            message: message.into(),
        }
    }
}
