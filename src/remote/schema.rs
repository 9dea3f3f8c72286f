//! Wire types for the supply GraphQL API.
//!
//! Only the fields requested by the multi-match document are modelled.
//! Optional fields default so that partial payloads (for instance when
//! datasheets or lead times were not requested) still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level GraphQL envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplyResult {
    #[serde(default)]
    pub data: Option<Data>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl SupplyResult {
    /// First GraphQL error message, if the server reported any.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

/// A GraphQL error entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

/// The `data` object of a multi-match response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    #[serde(default)]
    pub sup_multi_match: Option<Vec<MultiMatch>>,
}

/// Result for a single submitted query, correlated by `reference`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiMatch {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

/// A part record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, rename = "v3uid")]
    pub id: String,
    #[serde(default)]
    pub mpn: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub manufacturer: Company,
    #[serde(default)]
    pub best_datasheet: Option<Document>,
    #[serde(default, rename = "octopartUrl")]
    pub detail_url: Option<String>,
    #[serde(default)]
    pub sellers: Vec<Seller>,
}

/// Manufacturer or seller company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub homepage_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub url: String,
}

/// A distributor selling a part, with its offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    #[serde(default)]
    pub company: Company,
    #[serde(default)]
    pub is_authorized: bool,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// A single offer (SKU) from a seller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub factory_lead_days: Option<i64>,
    #[serde(default)]
    pub factory_pack_quantity: Option<i64>,
    #[serde(default)]
    pub inventory_level: i64,
    #[serde(default)]
    pub on_order_quantity: Option<i64>,
    #[serde(default)]
    pub order_multiple: Option<i64>,
    #[serde(default)]
    pub multipack_quantity: Option<i64>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub moq: Option<i64>,
    #[serde(default)]
    pub click_url: Option<String>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prices: Vec<Price>,
}

/// A quantity price break.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
}
