//! Supply Lookup - batched, cached part lookups
//!
//! Collects part-number lookups into batches against a remote parts-data
//! service, caches every page of results for the life of the process, and
//! serves read-facing lookups on top of that cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use dispatch::BatchDispatcher;
pub use tasks::spawn_idle_trigger;
