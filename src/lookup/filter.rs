//! Part and offer filtering.
//!
//! Manufacturer and distributor names are compared with
//! [`contains_normalized`], so `"TI"` matches `"Texas Instruments"` only if
//! the normalized name contains `"ti"`.

use serde::Deserialize;

use crate::cache::contains_normalized;
use crate::remote::{Offer, Part, Seller};

/// Fallback shown when a part has no datasheet.
pub const DATASHEET_NOT_FOUND: &str = "Datasheet url not found. Please try expanding your search";

const DEFAULT_CURRENCY: &str = "USD";

// == Authorized Seller ==
/// Which sellers to consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AuthorizedSeller {
    #[default]
    Any,
    Yes,
    No,
}

impl AuthorizedSeller {
    /// Reads the first character: `y`/`Y` is `Yes`, `n`/`N` is `No`, anything
    /// else (including empty) is `Any`.
    pub fn parse(raw: &str) -> Self {
        match raw.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('y') => Self::Yes,
            Some('n') => Self::No,
            _ => Self::Any,
        }
    }

    pub fn allows(self, seller: &Seller) -> bool {
        match self {
            Self::Any => true,
            Self::Yes => seller.is_authorized,
            Self::No => !seller.is_authorized,
        }
    }
}

impl From<String> for AuthorizedSeller {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

// == Offer Filter ==
/// Criteria applied to the parts of a lookup.
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// Empty matches every manufacturer
    pub manufacturer: String,
    /// Empty matches every distributor; otherwise any entry may match
    pub distributors: Vec<String>,
    pub authorized: AuthorizedSeller,
}

impl OfferFilter {
    pub fn new(manufacturer: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            ..Default::default()
        }
    }

    pub fn with_distributors(mut self, distributors: Vec<String>) -> Self {
        self.distributors = distributors
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    pub fn with_authorized(mut self, authorized: AuthorizedSeller) -> Self {
        self.authorized = authorized;
        self
    }

    pub fn matches_part(&self, part: &Part) -> bool {
        self.manufacturer.is_empty() || contains_normalized(&part.manufacturer.name, &self.manufacturer)
    }

    pub fn matches_seller(&self, seller: &Seller) -> bool {
        let distributor = self.distributors.is_empty()
            || self
                .distributors
                .iter()
                .any(|d| contains_normalized(&seller.company.name, d));
        distributor && self.authorized.allows(seller)
    }

    /// First part made by the requested manufacturer.
    pub fn first_part<'a>(&self, parts: &'a [Part]) -> Option<&'a Part> {
        parts.iter().find(|part| self.matches_part(part))
    }

    /// Every offer of matching parts from matching sellers, in result order.
    pub fn offers<'a>(&self, parts: &'a [Part]) -> Vec<&'a Offer> {
        parts
            .iter()
            .filter(|part| self.matches_part(part))
            .flat_map(|part| part.sellers.iter())
            .filter(|seller| self.matches_seller(seller))
            .flat_map(|seller| seller.offers.iter())
            .collect()
    }
}

// == Pricing ==
/// Lowest unit price in `currency` among the breaks reachable at `qty`.
///
/// An empty currency means USD and a zero quantity means 1.
pub fn min_price(offer: &Offer, currency: &str, qty: i64) -> Option<f64> {
    let currency = if currency.is_empty() { DEFAULT_CURRENCY } else { currency };
    let qty = if qty == 0 { 1 } else { qty };

    offer
        .prices
        .iter()
        .filter(|p| p.currency.contains(currency) && p.quantity <= qty)
        .map(|p| p.price)
        .fold(None, |min, price| match min {
            Some(m) if m <= price => Some(m),
            _ => Some(price),
        })
}

// == Stock ==
/// Reading of an inventory level.
#[derive(Debug, Clone, PartialEq)]
pub enum Stock {
    Level(i64),
    Label(&'static str),
}

/// Maps the highest inventory level across `offers`, decoding the sentinel
/// values the service uses for non-numeric stock.
pub fn stock(offers: &[&Offer]) -> Option<Stock> {
    let level = offers.iter().map(|o| o.inventory_level).max()?;
    Some(match level {
        -1 => Stock::Label("Non-stocked"),
        -2 => Stock::Label("Yes"),
        -3 => Stock::Label("Unknown"),
        -4 => Stock::Label("RFQ"),
        n => Stock::Level(n),
    })
}

// == Datasheet ==
/// Datasheet URL of `part`; `Ok("")` when datasheets were not requested.
pub fn datasheet_url(part: &Part, include_datasheets: bool) -> Result<String, &'static str> {
    if !include_datasheets {
        return Ok(String::new());
    }
    part.best_datasheet
        .as_ref()
        .map(|doc| doc.url.clone())
        .ok_or(DATASHEET_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Company, Document, Price};

    fn offer(sku: &str, inventory: i64, prices: &[(&str, i64, f64)]) -> Offer {
        Offer {
            sku: sku.to_string(),
            inventory_level: inventory,
            prices: prices
                .iter()
                .map(|(currency, quantity, price)| Price {
                    currency: currency.to_string(),
                    quantity: *quantity,
                    price: *price,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn seller(name: &str, authorized: bool, offers: Vec<Offer>) -> Seller {
        Seller {
            company: Company {
                name: name.to_string(),
                ..Default::default()
            },
            is_authorized: authorized,
            offers,
        }
    }

    fn part(manufacturer: &str, sellers: Vec<Seller>) -> Part {
        Part {
            mpn: "LM317T".to_string(),
            manufacturer: Company {
                name: manufacturer.to_string(),
                ..Default::default()
            },
            sellers,
            ..Default::default()
        }
    }

    #[test]
    fn test_authorized_parse() {
        assert_eq!(AuthorizedSeller::parse("Yes"), AuthorizedSeller::Yes);
        assert_eq!(AuthorizedSeller::parse("y"), AuthorizedSeller::Yes);
        assert_eq!(AuthorizedSeller::parse("NO"), AuthorizedSeller::No);
        assert_eq!(AuthorizedSeller::parse("nope"), AuthorizedSeller::No);
        assert_eq!(AuthorizedSeller::parse("Any"), AuthorizedSeller::Any);
        assert_eq!(AuthorizedSeller::parse(""), AuthorizedSeller::Any);
        assert_eq!(AuthorizedSeller::parse("maybe"), AuthorizedSeller::Any);
    }

    #[test]
    fn test_manufacturer_filter() {
        let parts = vec![part("ON Semiconductor", vec![]), part("Texas Instruments", vec![])];

        let ti = OfferFilter::new("texas");
        assert_eq!(ti.first_part(&parts).unwrap().manufacturer.name, "Texas Instruments");

        let any = OfferFilter::new("");
        assert_eq!(any.first_part(&parts).unwrap().manufacturer.name, "ON Semiconductor");

        assert!(OfferFilter::new("Analog").first_part(&parts).is_none());
    }

    #[test]
    fn test_offers_filtered_by_distributor_and_authorization() {
        let parts = vec![part(
            "Texas Instruments",
            vec![
                seller("Digi-Key", true, vec![offer("dk-1", 10, &[])]),
                seller("Mouser", true, vec![offer("mo-1", 20, &[])]),
                seller("Broker Inc", false, vec![offer("br-1", 30, &[])]),
            ],
        )];

        let all = OfferFilter::new("");
        assert_eq!(all.offers(&parts).len(), 3);

        let digikey = OfferFilter::new("").with_distributors(vec!["digikey".to_string()]);
        let skus: Vec<&str> = digikey.offers(&parts).iter().map(|o| o.sku.as_str()).collect();
        assert_eq!(skus, vec!["dk-1"]);

        let several = OfferFilter::new("")
            .with_distributors(vec!["Mouser".to_string(), "broker".to_string(), " ".to_string()]);
        assert_eq!(several.offers(&parts).len(), 2);

        let unauthorized = OfferFilter::new("").with_authorized(AuthorizedSeller::No);
        let skus: Vec<&str> = unauthorized.offers(&parts).iter().map(|o| o.sku.as_str()).collect();
        assert_eq!(skus, vec!["br-1"]);
    }

    #[test]
    fn test_offers_skip_other_manufacturers() {
        let parts = vec![
            part("Texas Instruments", vec![seller("Digi-Key", true, vec![offer("ti", 1, &[])])]),
            part("STMicro", vec![seller("Digi-Key", true, vec![offer("st", 1, &[])])]),
        ];
        let offers = OfferFilter::new("stmicro").offers(&parts);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].sku, "st");
    }

    #[test]
    fn test_min_price_respects_quantity_and_currency() {
        let o = offer(
            "x",
            0,
            &[("USD", 1, 1.50), ("USD", 10, 1.20), ("USD", 100, 0.90), ("EUR", 1, 1.10)],
        );
        assert_eq!(min_price(&o, "USD", 1), Some(1.50));
        assert_eq!(min_price(&o, "USD", 50), Some(1.20));
        assert_eq!(min_price(&o, "USD", 1000), Some(0.90));
        assert_eq!(min_price(&o, "", 0), Some(1.50));
        assert_eq!(min_price(&o, "EUR", 1), Some(1.10));
        assert_eq!(min_price(&o, "GBP", 1), None);
    }

    #[test]
    fn test_min_price_below_first_break() {
        let o = offer("x", 0, &[("USD", 10, 1.20)]);
        assert_eq!(min_price(&o, "USD", 5), None);
    }

    #[test]
    fn test_stock_sentinels() {
        let cases = [(-1, "Non-stocked"), (-2, "Yes"), (-3, "Unknown"), (-4, "RFQ")];
        for (level, label) in cases {
            let o = offer("x", level, &[]);
            assert_eq!(stock(&[&o]), Some(Stock::Label(label)));
        }

        let low = offer("a", 5, &[]);
        let high = offer("b", 500, &[]);
        assert_eq!(stock(&[&low, &high]), Some(Stock::Level(500)));
        assert_eq!(stock(&[]), None);
    }

    #[test]
    fn test_datasheet_url() {
        let mut p = part("Texas Instruments", vec![]);
        assert_eq!(datasheet_url(&p, true), Err(DATASHEET_NOT_FOUND));
        assert_eq!(datasheet_url(&p, false), Ok(String::new()));

        p.best_datasheet = Some(Document {
            url: "https://example.com/lm317.pdf".to_string(),
        });
        assert_eq!(datasheet_url(&p, true).as_deref(), Ok("https://example.com/lm317.pdf"));
    }
}
