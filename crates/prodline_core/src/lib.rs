//! # prodline_core
//!
//! Core transition engine for prodline.
//!
//! This crate models a production line as a set of stations joined by a
//! successor graph, and decides whether a requested item transition is legal.
//!
//! # Architecture
//!
//! - **Stations**: Points on the line with the outcomes an operator may record
//! - **Registry**: Maps station ids to their definitions and knows the START station
//! - **Order**: The successor relation between stations
//! - **Engine**: Pure transition rules over a registry and order snapshot
//! - **Service**: Binds the engine to item, clock and configuration stores
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prodline_core::{LineService, LineSettings, State, Transition};
//!
//! // Any store implementing ItemStore + ClockStore + ConfigStore
//! let service = LineService::load(Arc::new(store), &LineSettings::default()).await?;
//!
//! let item = service.start_production(&Transition::new("X")).await?;
//! let item = service
//!     .station_depart("X", &Transition::new("X").at_station("1001").with_state(State::Passed))
//!     .await?;
//! assert_eq!(item.current_station_id, "1002");
//! ```

pub mod clock;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod item;
pub mod order;
pub mod registry;
pub mod service;
pub mod settings;
pub mod station;
pub mod store;

// Re-export main types for convenience
pub use clock::{ClockEntry, DwellClock, Operation};
pub use configuration::LineConfiguration;
pub use engine::ProductionLine;
pub use error::{ErrorKind, LineError, LineResult};
pub use item::{LineItem, Transition};
pub use order::StationOrder;
pub use registry::StationRegistry;
pub use service::LineService;
pub use settings::LineSettings;
pub use station::{Action, State, Station, StationType};
pub use store::{ClockStore, ConfigStore, ItemStore};
