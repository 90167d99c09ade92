//! # prodline_store
//!
//! Storage backends for the prodline core.
//!
//! Both backends implement [`ItemStore`], [`ClockStore`] and [`ConfigStore`]
//! from `prodline_core`, so either can be handed to
//! [`LineService::load`](prodline_core::LineService::load).
//!
//! - [`MemoryStore`]: in-process maps, for tests and embedding
//! - [`FileStore`]: JSON and YAML files under a data directory
//!
//! [`ItemStore`]: prodline_core::ItemStore
//! [`ClockStore`]: prodline_core::ClockStore
//! [`ConfigStore`]: prodline_core::ConfigStore

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
