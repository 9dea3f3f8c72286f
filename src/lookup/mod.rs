//! Lookup Module
//!
//! Read-facing lookups on top of the batch dispatcher: filtering of parts and
//! offers, the bounded wait for results, and the lookup functions.

pub mod filter;
pub mod functions;
pub mod wait;

pub use filter::{AuthorizedSeller, OfferFilter};
pub use functions::{lookup, CellValue, LookupField, LookupRequest, ERROR_PREFIX};
pub use wait::wait_for_result;
