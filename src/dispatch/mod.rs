//! Dispatch Module
//!
//! Batching of page requests into remote calls.

mod batcher;
mod demux;

pub use batcher::{BatchDispatcher, PageRequest, PageSummary};
pub use demux::assign;
