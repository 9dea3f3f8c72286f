//! Request and Response models for the lookup service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{LoginRequest, LookupParams};
pub use responses::{
    ClearResponse, ExhaustedResponse, FeaturesResponse, HealthResponse, LastErrorResponse,
    LoginResponse, LookupResponse, PartsResponse, QueryResponse, StatsResponse, VersionResponse,
};
