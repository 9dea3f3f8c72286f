//! Response DTOs for the lookup service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::DispatchStats;
use crate::dispatch::{PageRequest, PageSummary};
use crate::lookup::CellValue;
use crate::remote::{Part, QueryFeatures};

/// Response body for POST /query/:q
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// The lookup as given
    pub query: String,
    #[serde(flatten)]
    pub request: PageRequest,
}

/// Response body for GET /parts/:q
#[derive(Debug, Clone, Serialize)]
pub struct PartsResponse {
    pub query: String,
    pub parts: Vec<Part>,
    pub exhausted: bool,
    pub pending: bool,
    pub error: Option<String>,
    pub pages: Vec<PageSummary>,
}

/// Response body for GET /error/:q
#[derive(Debug, Clone, Serialize)]
pub struct LastErrorResponse {
    pub query: String,
    pub error: Option<String>,
}

/// Response body for GET /exhausted/:q
#[derive(Debug, Clone, Serialize)]
pub struct ExhaustedResponse {
    pub query: String,
    pub exhausted: bool,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Number of items dropped
    pub dropped: usize,
}

impl ClearResponse {
    pub fn new(dropped: usize) -> Self {
        Self {
            message: format!("Cache cleared, {} items dropped", dropped),
            dropped,
        }
    }
}

/// Response body for GET /lookup/:field/:q
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub query: String,
    pub field: &'static str,
    pub value: CellValue,
}

/// Response body for POST /login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Session status text
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DispatchStats,
    /// items_dispatched / batches
    pub average_batch_size: f64,
}

impl StatsResponse {
    pub fn new(stats: DispatchStats) -> Self {
        let average_batch_size = stats.average_batch_size();
        Self {
            stats,
            average_batch_size,
        }
    }
}

/// Response body for GET /version
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub api_url: String,
}

/// Response body for GET /features
#[derive(Debug, Clone, Serialize)]
pub struct FeaturesResponse {
    pub include_datasheets: bool,
    pub include_lead_time: bool,
    pub summary: String,
}

impl From<QueryFeatures> for FeaturesResponse {
    fn from(features: QueryFeatures) -> Self {
        Self {
            include_datasheets: features.include_datasheets,
            include_lead_time: features.include_lead_time,
            summary: format!(
                "Datasheets: {}; LeadTime: {}",
                u8::from(features.include_datasheets),
                u8::from(features.include_lead_time)
            ),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
