//! Result aggregation: merge, rank, paginate.

use crate::filter::is_noise;
use crate::model::{Enrichment, Product, SearchPage};
use indexmap::IndexMap;
use providers::model::Listing;
use std::collections::HashMap;

/// Combines primary listings and their matched secondary enrichment into
/// the canonical product page.
///
/// Primaries sharing a provider-native id are collapsed first (overlapping
/// sub-queries can return the same item twice; first seen wins), noise
/// listings are dropped before counting, the rest are stable-sorted by
/// demand so provider order breaks ties, then the page window is cut.
pub fn aggregate(
    primaries: Vec<Listing>,
    mut matched: HashMap<String, Listing>,
    page: usize,
    limit: usize,
) -> SearchPage {
    let mut deduped: IndexMap<String, Listing> = IndexMap::with_capacity(primaries.len());
    for listing in primaries {
        deduped.entry(listing.id.clone()).or_insert(listing);
    }

    let mut products: Vec<Product> = deduped
        .into_values()
        .filter(|listing| !is_noise(listing))
        .map(|listing| {
            let mut product = Product::new(listing);
            if let Some(secondary) = matched.remove(&product.listing.id) {
                let source = secondary.source.as_str();
                product.attach(source, Enrichment::from_listing(&secondary));
            }
            product
        })
        .collect();

    products.sort_by(|a, b| b.demand_score.cmp(&a.demand_score));

    let total = products.len();
    let page = page.max(1);
    let start = (page - 1).saturating_mul(limit).min(total);
    let end = start.saturating_add(limit).min(total);
    let data = products.into_iter().skip(start).take(end - start).collect();

    SearchPage { data, total, page }
}
