//! Key Normalizer Module
//!
//! Canonicalizes raw lookup strings (part numbers, SKUs, manufacturer and
//! distributor names) so that cosmetic differences never produce a second
//! cache entry.

// == Normalize ==
/// Lowercases the input and strips every character that is not
/// alphanumeric ASCII or the wildcard `*`.
///
/// The function is total and idempotent: `normalize(normalize(x)) == normalize(x)`.
///
/// # Example
/// ```
/// use supply_lookup::cache::normalize;
///
/// assert_eq!(normalize(" INA-225 *"), "ina225*");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '*')
        .collect()
}

// == Contains Normalized ==
/// Returns true if `needle` is empty or its normalized form occurs in the
/// normalized `haystack`.
///
/// Used for manufacturer and distributor matching, where "TI" must match
/// "Texas Instruments"-style names only by substring of the canonical form.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    needle.is_empty() || normalize(haystack).contains(&needle)
}
