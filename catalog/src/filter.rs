//! Junk-listing classification.
//!
//! Marketplaces return plenty of things that are not a pair of shoes for
//! sale: empty boxes, display stands, stickers, cleaning kits. Two string
//! heuristics screen them out. Deliberately permissive: an ambiguous
//! listing is kept, because a false drop costs a real result.

use providers::model::Listing;

/// Category/type tags that mark apparel and accessories rather than the
/// product itself.
const APPAREL_CATEGORIES: &[&str] = &[
    "apparel",
    "clothing",
    "accessories",
    "socks",
    "hats",
    "bags",
    "laces",
    "shirts",
    "hoodies",
];

/// Title fragments that mark a non-product listing outright.
const TITLE_BLOCKLIST: &[&str] = &[
    "box only",
    "empty box",
    "replacement box",
    "no shoe",
    "no shoes",
    "display only",
    "shoe tree",
    "sticker",
    "keychain",
    "figurine",
    "collectible card",
    "shoe cleaner",
    "cleaning kit",
    "crease protector",
    "shoe laces",
    "lot of",
    "bulk",
    "pre-owned",
    "preowned",
];

/// Condition markers matched on word boundaries, so "unworn" or "unused"
/// never trip them.
const CONDITION_MARKERS: &[&str] = &["used", "worn"];

/// Phrases that negate a condition marker: the seller is stating the
/// pair is new.
const CONDITION_NEGATIONS: &[&str] = &["never worn", "not worn", "never used"];

/// Phrases that legitimize a "box" mention: the box is packaging for a
/// real pair, not the item being sold.
const BOX_QUALIFIERS: &[&str] = &["with box", "new in box", "deadstock", "og box"];

/// Box mentions that are noise no matter what else the title says.
const BOX_HARD_NOISE: &[&str] = &["box only", "empty", "no shoe"];

/// Classifies a listing as noise (accessory, packaging, collectible,
/// used goods) versus a legitimate product sale.
pub fn is_noise(listing: &Listing) -> bool {
    if let Some(category) = &listing.category {
        let category = category.to_lowercase();
        if APPAREL_CATEGORIES.iter().any(|c| category.contains(c)) {
            return true;
        }
    }

    let title = listing.title.to_lowercase();

    if TITLE_BLOCKLIST.iter().any(|kw| title.contains(kw)) {
        return true;
    }

    if !CONDITION_NEGATIONS.iter().any(|q| title.contains(q))
        && title
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| CONDITION_MARKERS.contains(&word))
    {
        return true;
    }

    if title.contains("box") {
        if BOX_HARD_NOISE.iter().any(|kw| title.contains(kw)) {
            return true;
        }
        if !BOX_QUALIFIERS.iter().any(|q| title.contains(q)) {
            return true;
        }
    }

    false
}
