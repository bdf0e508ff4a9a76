//! Canonical merged product view.

use providers::model::Listing;
use serde::Serialize;
use std::collections::BTreeMap;

/// Supplementary fields attached to a product from a non-primary source
/// once matched.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub link: Option<String>,
    pub release_date: Option<String>,
    pub price: Option<f64>,
}

impl Enrichment {
    pub fn from_listing(listing: &Listing) -> Self {
        Enrichment {
            link: listing.url.clone(),
            release_date: None,
            price: listing.price,
        }
    }
}

/// One canonical product: exactly one primary listing plus any matched
/// secondary enrichment, keyed by source name. Built fresh per
/// aggregation pass and discarded with the response.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    #[serde(flatten)]
    pub listing: Listing,

    pub demand_score: u64,

    /// `null` when no secondary source matched, a source-keyed map
    /// otherwise. BTreeMap keeps the serialized key order deterministic.
    #[serde(rename = "_secondary")]
    pub secondary: Option<BTreeMap<String, Enrichment>>,
}

impl Product {
    pub fn new(listing: Listing) -> Self {
        let demand_score = listing.demand;
        Product {
            listing,
            demand_score,
            secondary: None,
        }
    }

    pub fn attach(&mut self, source: &str, enrichment: Enrichment) {
        self.secondary
            .get_or_insert_with(BTreeMap::new)
            .insert(source.to_string(), enrichment);
    }
}

/// One page of merged results. `total` reflects the full filtered set,
/// independent of the slice.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub data: Vec<Product>,
    pub total: usize,
    pub page: usize,
}
