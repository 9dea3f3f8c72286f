//! Request side of the multi-match call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One page request inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartsMatchQuery {
    pub mpn: String,
    pub start: u32,
    pub limit: u32,
    /// Echoed back by the service to correlate the result
    pub reference: String,
}

/// Optional fields the client is entitled to request.
///
/// Self-serve accounts may not have access to datasheets or lead times; the
/// corresponding fields are then left out of the document entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFeatures {
    pub include_datasheets: bool,
    pub include_lead_time: bool,
}

impl Default for QueryFeatures {
    fn default() -> Self {
        Self {
            include_datasheets: true,
            include_lead_time: true,
        }
    }
}

/// Builds the GraphQL multi-match document.
pub fn multi_match_document(features: QueryFeatures) -> String {
    let datasheet = if features.include_datasheets {
        "bestDatasheet { url } "
    } else {
        ""
    };
    let lead_days = if features.include_lead_time {
        "factoryLeadDays "
    } else {
        ""
    };

    format!(
        "query($queries: [SupPartMatchQuery!]!) {{ supMultiMatch(queries: $queries) {{ \
         reference error hits parts {{ v3uid mpn shortDescription \
         manufacturer {{ id name homepageUrl }} {datasheet}octopartUrl \
         sellers {{ offers {{ id sku {lead_days}factoryPackQuantity inventoryLevel \
         onOrderQuantity orderMultiple multipackQuantity packaging moq clickUrl updated \
         prices {{ currency quantity price }} }} \
         company {{ id name homepageUrl }} isAuthorized }} }} }} }}"
    )
}

/// Full JSON request body for a batch.
pub fn request_body(queries: &[PartsMatchQuery], features: QueryFeatures) -> Value {
    json!({
        "query": multi_match_document(features),
        "variables": { "queries": queries },
    })
}
