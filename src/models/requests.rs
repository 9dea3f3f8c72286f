//! Request DTOs for the lookup service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::lookup::{AuthorizedSeller, OfferFilter};
use crate::remote::QueryFeatures;

/// Request body for POST /login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub client_id: String,
    pub client_secret: String,
    /// Request datasheet URLs (default: true)
    #[serde(default)]
    pub include_datasheets: Option<bool>,
    /// Request factory lead times (default: true)
    #[serde(default)]
    pub include_lead_time: Option<bool>,
}

impl LoginRequest {
    pub fn features(&self) -> QueryFeatures {
        QueryFeatures {
            include_datasheets: self.include_datasheets.unwrap_or(true),
            include_lead_time: self.include_lead_time.unwrap_or(true),
        }
    }
}

/// Query string for GET /lookup/:field/:q
///
/// `distributors` is a comma separated list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub distributors: String,
    #[serde(default)]
    pub qty: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub authorized: AuthorizedSeller,
}

impl LookupParams {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.qty.is_some_and(|qty| qty < 0) {
            return Some("Quantity cannot be negative".to_string());
        }
        if self.currency.as_deref().is_some_and(|c| c.len() > 3) {
            return Some("Currency must be a 3 letter ISO 4217 code".to_string());
        }
        None
    }

    pub fn filter(&self) -> OfferFilter {
        OfferFilter::new(self.manufacturer.trim())
            .with_distributors(self.distributors.split(',').map(str::to_string).collect())
            .with_authorized(self.authorized)
    }
}
