//! Background Tasks Module
//!
//! Tasks that run alongside the HTTP server.
//!
//! # Tasks
//! - Idle trigger: dispatches awaiting items once lookups go quiet

mod idle;

pub use idle::spawn_idle_trigger;
