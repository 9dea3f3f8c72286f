//! Read-facing lookup functions.
//!
//! Each function answers from the cache when it can, otherwise waits
//! (bounded) for more pages and answers from whatever arrived. The answer is
//! always a [`CellValue`]; failures are values too.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::WaitConfig;
use crate::dispatch::BatchDispatcher;
use crate::error::{NO_RESULT, PROCESSING};
use crate::lookup::filter::{self, OfferFilter, Stock};
use crate::lookup::wait::wait_for_result;
use crate::remote::{Offer, Part, QueryFeatures};

/// Prefix of every error value.
pub const ERROR_PREFIX: &str = "ERROR: ";

// == Cell Value ==
/// Result of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(String),
    /// Still waiting on the remote service
    Processing,
}

impl CellValue {
    pub fn no_result() -> Self {
        Self::Error(NO_RESULT.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{}", n),
            Self::Error(msg) => write!(f, "{}{}", ERROR_PREFIX, msg),
            Self::Processing => f.write_str(PROCESSING),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            other => serializer.collect_str(other),
        }
    }
}

// == Lookup Field ==
/// What to read from the lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    DetailUrl,
    DatasheetUrl,
    ShortDescription,
    DistributorPrice,
    AveragePrice,
    DistributorStock,
    DistributorMoq,
    OrderMultiple,
    LeadTime,
    Packaging,
    DistributorUrl,
    DistributorSku,
}

impl LookupField {
    pub const ALL: [LookupField; 12] = [
        Self::DetailUrl,
        Self::DatasheetUrl,
        Self::ShortDescription,
        Self::DistributorPrice,
        Self::AveragePrice,
        Self::DistributorStock,
        Self::DistributorMoq,
        Self::OrderMultiple,
        Self::LeadTime,
        Self::Packaging,
        Self::DistributorUrl,
        Self::DistributorSku,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::DetailUrl => "detail-url",
            Self::DatasheetUrl => "datasheet-url",
            Self::ShortDescription => "description",
            Self::DistributorPrice => "price",
            Self::AveragePrice => "average-price",
            Self::DistributorStock => "stock",
            Self::DistributorMoq => "moq",
            Self::OrderMultiple => "order-multiple",
            Self::LeadTime => "lead-time",
            Self::Packaging => "packaging",
            Self::DistributorUrl => "distributor-url",
            Self::DistributorSku => "sku",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::DetailUrl | Self::DatasheetUrl | Self::ShortDescription => FieldKind::Part,
            Self::Packaging | Self::DistributorUrl | Self::DistributorSku => FieldKind::Offer,
            _ => FieldKind::Offers,
        }
    }
}

impl FromStr for LookupField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown lookup field '{}'", s))
    }
}

enum FieldKind {
    /// Reads the first part of the requested manufacturer
    Part,
    /// Reads the first matching offer
    Offer,
    /// Aggregates every matching offer
    Offers,
}

// == Lookup Request ==
#[derive(Debug, Clone)]
pub struct LookupRequest {
    /// Raw part number or SKU
    pub key: String,
    pub filter: OfferFilter,
    /// Quantity for price breaks
    pub qty: i64,
    pub currency: String,
}

impl LookupRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filter: OfferFilter::default(),
            qty: 1,
            currency: "USD".to_string(),
        }
    }

    pub fn with_filter(mut self, filter: OfferFilter) -> Self {
        self.filter = filter;
        self
    }
}

// == Lookup ==
/// Reads `field` for `request`, fetching more pages if needed.
pub async fn lookup(
    dispatcher: &BatchDispatcher,
    wait: WaitConfig,
    features: QueryFeatures,
    field: LookupField,
    request: &LookupRequest,
) -> CellValue {
    let cached = dispatcher.get_parts(&request.key).await;
    if let Some(value) = evaluate(field, request, features, &cached) {
        return value;
    }

    let parts = wait_for_result(dispatcher, &request.key, wait, |parts| {
        is_satisfied(field, &request.filter, parts)
    })
    .await;

    match evaluate(field, request, features, &parts) {
        Some(value) => value,
        None => failure(dispatcher, &request.key).await,
    }
}

/// True once `parts` holds what `field` needs.
fn is_satisfied(field: LookupField, filter: &OfferFilter, parts: &[Part]) -> bool {
    if filter.first_part(parts).is_none() {
        return false;
    }
    match field.kind() {
        FieldKind::Part => true,
        FieldKind::Offer | FieldKind::Offers => {
            filter.distributors.is_empty() || !filter.offers(parts).is_empty()
        }
    }
}

/// Value of `field` from `parts`, or `None` when nothing matched.
fn evaluate(
    field: LookupField,
    request: &LookupRequest,
    features: QueryFeatures,
    parts: &[Part],
) -> Option<CellValue> {
    match field.kind() {
        FieldKind::Part => {
            let part = request.filter.first_part(parts)?;
            Some(part_value(field, part, features))
        }
        FieldKind::Offer => {
            let offers = request.filter.offers(parts);
            let offer = offers.first()?;
            Some(offer_value(field, offer))
        }
        FieldKind::Offers => {
            let offers = request.filter.offers(parts);
            if offers.is_empty() {
                return None;
            }
            Some(offers_value(field, &offers, request))
        }
    }
}

fn part_value(field: LookupField, part: &Part, features: QueryFeatures) -> CellValue {
    match field {
        LookupField::DetailUrl => CellValue::Text(part.detail_url.clone().unwrap_or_default()),
        LookupField::DatasheetUrl => match filter::datasheet_url(part, features.include_datasheets) {
            Ok(url) => CellValue::Text(url),
            Err(msg) => CellValue::Error(msg.to_string()),
        },
        _ => CellValue::Text(part.short_description.clone().unwrap_or_default()),
    }
}

fn offer_value(field: LookupField, offer: &Offer) -> CellValue {
    match field {
        LookupField::Packaging => CellValue::Text(offer.packaging.clone().unwrap_or_default()),
        LookupField::DistributorUrl => CellValue::Text(offer.click_url.clone().unwrap_or_default()),
        _ => CellValue::Text(offer.sku.clone()),
    }
}

fn offers_value(field: LookupField, offers: &[&Offer], request: &LookupRequest) -> CellValue {
    match field {
        LookupField::DistributorPrice => unit_prices(offers, request)
            .into_iter()
            .reduce(f64::min)
            .map_or_else(CellValue::no_result, CellValue::Number),
        LookupField::AveragePrice => {
            let found = unit_prices(offers, request);
            if found.is_empty() {
                CellValue::no_result()
            } else {
                CellValue::Number(found.iter().sum::<f64>() / found.len() as f64)
            }
        }
        LookupField::DistributorStock => match filter::stock(offers) {
            Some(Stock::Level(level)) => CellValue::Number(level as f64),
            Some(Stock::Label(label)) => CellValue::Text(label.to_string()),
            None => CellValue::no_result(),
        },
        LookupField::DistributorMoq => offers
            .iter()
            .filter_map(|o| o.moq)
            .filter(|moq| *moq > 0)
            .min()
            .map_or_else(CellValue::no_result, |moq| CellValue::Number(moq as f64)),
        LookupField::OrderMultiple => min_or_blank(offers.iter().filter_map(|o| o.order_multiple)),
        _ => min_or_blank(offers.iter().filter_map(|o| o.factory_lead_days)),
    }
}

/// Best price of every offer that has one for the requested currency and quantity.
fn unit_prices(offers: &[&Offer], request: &LookupRequest) -> Vec<f64> {
    offers
        .iter()
        .filter_map(|offer| filter::min_price(offer, &request.currency, request.qty))
        .collect()
}

fn min_or_blank(values: impl Iterator<Item = i64>) -> CellValue {
    values
        .min()
        .map_or_else(|| CellValue::Text(String::new()), |v| CellValue::Number(v as f64))
}

/// Why a lookup has no value: the recorded error, still in flight, or nothing matched.
async fn failure(dispatcher: &BatchDispatcher, raw_key: &str) -> CellValue {
    if let Some(message) = dispatcher.get_last_error(raw_key).await {
        return CellValue::Error(message);
    }
    if dispatcher.is_pending(raw_key).await {
        return CellValue::Processing;
    }
    CellValue::no_result()
}
