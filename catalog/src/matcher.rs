//! Cross-source entity matching.
//!
//! Pairs each primary (catalog) listing with at most one secondary
//! (classifieds) listing referring to the same physical product. Exact
//! style-code matching runs first; primaries left over fall through to a
//! token-overlap fuzzy phase over the secondaries not yet consumed.
//!
//! The fuzzy phase is a greedy, order-dependent assignment, not a globally
//! optimal bipartite matching: each primary takes the best remaining
//! candidate in iteration order. Known limitation, traded for simplicity
//! and speed.

use crate::normalize::normalize;
use providers::model::Listing;
use std::collections::HashMap;

const ACCEPT_THRESHOLD: f64 = 0.70;

/// Tokens that carry no product identity: articles, size and shipping
/// jargon, box/condition markers, gender terms, brand filler.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "for", // articles and glue
    "size", "sz", "us", "uk", "eu", "cm", "ship", "ships", "shipping", "free", "fast",
    "box", "new", "in", "with", "ds", "vnds", "nib", "nwb", "brand", "authentic",
    "mens", "womens", "men", "women", "kids", "youth", "gs", "boys", "girls",
    "air", "retro", "shoes", "shoe", "sneaker", "sneakers",
];

/// Model/silhouette keywords that identify a product line. A fuzzy match
/// is only accepted when at least one shared token is either one of these
/// or purely numeric (a model number).
const KEY_TOKENS: &[&str] = &[
    "jordan",
    "dunk",
    "yeezy",
    "foamposite",
    "foam",
    "force",
    "blazer",
    "cortez",
    "vapormax",
    "jumpman",
    "sb",
    "boost",
    "slide",
    "presto",
    "kobe",
    "lebron",
    "kyrie",
    "gel",
    "kayano",
    "ultraboost",
    "samba",
    "gazelle",
    "campus",
    "panda",
    "mocha",
    "chicago",
    "bred",
    "travis",
    "offwhite",
];

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Splits a title into identifying tokens: lowercased, non-alphanumerics
/// stripped, stop words dropped. One-character tokens are dropped unless
/// purely numeric — "1" in a silhouette name is a model number, not noise.
fn tokenize(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.len() > 1 || is_numeric(t))
        .filter(|t| !STOP_WORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Scores a secondary candidate against a primary's tokens. Shared-token
/// ratio over the primary's token count; zero when no shared token is
/// identifying (numeric or in the keyword set).
fn score(primary_tokens: &[String], candidate_title: &str) -> f64 {
    if primary_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate_title);

    let mut shared = 0usize;
    let mut key_token_hit = false;
    for token in primary_tokens {
        if candidate_tokens.iter().any(|c| c == token) {
            shared += 1;
            if is_numeric(token) || KEY_TOKENS.contains(&token.as_str()) {
                key_token_hit = true;
            }
        }
    }

    if !key_token_hit {
        return 0.0;
    }
    shared as f64 / primary_tokens.len() as f64
}

/// Resolves which secondary listing (if any) refers to the same product
/// as each primary. Each secondary is consumed by at most one primary.
/// Absence of a match is not an error; the primary simply goes
/// unenriched.
pub fn match_listings(
    primaries: &[Listing],
    secondaries: &[Listing],
) -> HashMap<String, Listing> {
    let mut assigned: HashMap<String, Listing> = HashMap::new();
    let mut consumed = vec![false; secondaries.len()];

    // Phase 1: exact key match on normalized identifiers, first-seen wins
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (idx, secondary) in secondaries.iter().enumerate() {
        let key = normalize(secondary.style_code.as_deref());
        if !key.is_empty() {
            by_key.entry(key).or_insert(idx);
        }
    }

    for primary in primaries {
        let key = normalize(primary.style_code.as_deref());
        if key.is_empty() {
            continue;
        }
        if let Some(&idx) = by_key.get(&key)
            && !consumed[idx]
        {
            consumed[idx] = true;
            assigned.insert(primary.id.clone(), secondaries[idx].clone());
        }
    }

    // Phase 2: fuzzy fallback for primaries still unmatched, greedy in
    // iteration order over the secondaries not yet consumed
    for primary in primaries {
        if assigned.contains_key(&primary.id) {
            continue;
        }
        let primary_tokens = tokenize(&primary.title);

        let mut best: Option<(usize, f64)> = None;
        for (idx, secondary) in secondaries.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            let s = score(&primary_tokens, &secondary.title);
            if best.is_none_or(|(_, b)| s > b) {
                best = Some((idx, s));
            }
        }

        if let Some((idx, s)) = best
            && s >= ACCEPT_THRESHOLD
        {
            consumed[idx] = true;
            assigned.insert(primary.id.clone(), secondaries[idx].clone());
        }
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::model::Source;

    fn primary(id: &str, title: &str, style_code: Option<&str>) -> Listing {
        let mut l = Listing::new(Source::Marketplace, id, title);
        l.style_code = style_code.map(String::from);
        l
    }

    fn secondary(id: &str, title: &str) -> Listing {
        Listing::new(Source::Classifieds, id, title)
    }

    #[test]
    fn exact_key_match_wins_before_fuzzy() {
        let mut sec = secondary("s1", "totally unrelated title");
        sec.style_code = Some("dd 0587/002".to_string());
        let primaries = vec![primary("p1", "Nike Dunk Low", Some("DD0587-002"))];

        let matched = match_listings(&primaries, &[sec]);
        assert_eq!(matched["p1"].id, "s1");
    }

    #[test]
    fn fuzzy_accepts_strong_token_overlap() {
        let primaries = vec![primary("p1", "Air Jordan 1 Retro High OG", None)];
        let secondaries = vec![secondary("s1", "Jordan 1 High OG New")];

        let matched = match_listings(&primaries, &secondaries);
        assert_eq!(matched["p1"].id, "s1");
    }

    #[test]
    fn fuzzy_rejects_without_an_identifying_token() {
        let primaries = vec![primary("p1", "Nike Dunk Low Panda", None)];
        let secondaries = vec![secondary("s1", "Nike Air Force 1 Low")];

        let matched = match_listings(&primaries, &secondaries);
        assert!(matched.is_empty());

        let tokens = tokenize("Nike Dunk Low Panda");
        assert_eq!(score(&tokens, "Nike Air Force 1 Low"), 0.0);
    }

    #[test]
    fn no_secondary_is_assigned_twice() {
        let primaries = vec![
            primary("p1", "Air Jordan 1 Retro High OG", None),
            primary("p2", "Air Jordan 1 Retro High OG", None),
        ];
        let secondaries = vec![secondary("s1", "Jordan 1 High OG New")];

        let matched = match_listings(&primaries, &secondaries);
        assert_eq!(matched.len(), 1);
        assert!(matched.contains_key("p1"));
        assert!(!matched.contains_key("p2"));
    }

    #[test]
    fn empty_identifier_never_matches_exactly() {
        let mut sec = secondary("s1", "irrelevant");
        sec.style_code = Some(" -/ ".to_string()); // normalizes to empty
        let primaries = vec![primary("p1", "some shoe", Some(" -/ "))];

        let matched = match_listings(&primaries, &[sec]);
        assert!(matched.is_empty());
    }

    #[test]
    fn first_seen_secondary_wins_key_collisions() {
        let mut s1 = secondary("s1", "first");
        s1.style_code = Some("CW2288-111".to_string());
        let mut s2 = secondary("s2", "second");
        s2.style_code = Some("cw2288/111".to_string());
        let primaries = vec![primary("p1", "Air Force 1 Triple White", Some("CW2288-111"))];

        let matched = match_listings(&primaries, &[s1, s2]);
        assert_eq!(matched["p1"].id, "s1");
    }

    #[test]
    fn tokenizer_keeps_numeric_tokens_and_drops_filler() {
        assert_eq!(
            tokenize("Air Jordan 1 Retro High OG mens w/ box"),
            vec!["jordan", "1", "high", "og"]
        );
    }
}
