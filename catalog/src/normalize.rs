//! Identifier normalization.
//!
//! Manufacturer style codes arrive in whatever shape a provider or a
//! seller typed them: "DD 0587/002", "dd0587-002", "DD0587.002". The
//! comparison key strips the separators and folds case so the exact-match
//! phase can use a plain lookup.

/// Canonicalizes a raw identifier into a comparison key. Total over all
/// inputs: `None` and empty strings normalize to the empty string, which
/// the matcher treats as "no identifier" (never matched exactly).
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '/' | '.'))
        .flat_map(char::to_uppercase)
        .collect()
}
