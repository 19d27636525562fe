//! Retailer name detection.

/// Fixed allow-list of retailer names the pipeline recognises in deal text.
///
/// Order matters only for multi-store text: the first listed match wins.
const KNOWN_STORES: &[&str] = &[
    "Amazon",
    "Walmart",
    "Target",
    "Best Buy",
    "eBay",
    "Home Depot",
    "Lowe's",
    "Costco",
    "Newegg",
    "Macy's",
    "Kohl's",
    "GameStop",
    "Staples",
    "Office Depot",
    "Wayfair",
    "REI",
    "B&H",
];

/// Case-insensitive substring match of `text` against the retailer
/// allow-list. Returns the canonical store name, not the matched substring.
#[must_use]
pub fn extract_store(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KNOWN_STORES
        .iter()
        .find(|store| lower.contains(&store.to_lowercase()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert_eq!(extract_store("great WALMART clearance find"), Some("Walmart"));
        assert_eq!(extract_store("at best buy today"), Some("Best Buy"));
    }

    #[test]
    fn returns_canonical_name() {
        assert_eq!(extract_store("lowe's has it cheaper"), Some("Lowe's"));
    }

    #[test]
    fn unknown_store_returns_none() {
        assert_eq!(extract_store("local corner shop special"), None);
    }

    #[test]
    fn first_listed_store_wins_on_ties() {
        assert_eq!(
            extract_store("cheaper at Target than at Walmart"),
            Some("Walmart"),
            "allow-list order decides, not text order"
        );
    }
}
