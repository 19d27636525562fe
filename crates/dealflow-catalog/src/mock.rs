//! Deterministic mock catalog results for credential-less environments.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::types::{CatalogDeal, SearchParams};

const DEFAULT_ITEM_COUNT: u32 = 10;
const MAX_ITEM_COUNT: u32 = 50;

/// Generates mock deals that are a pure function of the search parameters.
///
/// Determinism matters: repeated syncs with the same parameters must produce
/// the same ASINs so the dedup stage sees them as already ingested instead
/// of growing the pending table on every call.
pub(crate) fn mock_deals(params: &SearchParams) -> Vec<CatalogDeal> {
    let keywords = params.keywords.as_deref().unwrap_or("deals");
    let category = params.category.as_deref().unwrap_or("general");
    let count = params
        .item_count
        .unwrap_or(DEFAULT_ITEM_COUNT)
        .clamp(1, MAX_ITEM_COUNT);

    let digest = Sha256::digest(format!("{keywords}|{category}").as_bytes());
    let series: String = digest[..4].iter().map(|b| format!("{b:02X}")).collect();

    (0..count)
        .map(|index| {
            let byte = u32::from(digest[(index as usize) % digest.len()]);
            // Spread prices over a plausible range; original is always higher
            // so every mock item looks like a real markdown.
            let price = Decimal::from(999 + byte * 37) / Decimal::ONE_HUNDRED;
            let original_price = Decimal::from(1999 + byte * 73) / Decimal::ONE_HUNDRED;
            let asin = format!("MOCK{series}{index:02}");
            CatalogDeal {
                title: format!("{keywords} pick #{}", index + 1),
                description: Some(format!("Mock catalog result for \"{keywords}\"")),
                discount_percent: dealflow_core::money::discount_percent(price, original_price),
                price,
                original_price,
                image_url: None,
                product_url: format!("https://www.amazon.com/dp/{asin}"),
                category: category.to_owned(),
                asin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_params_same_deals() {
        let params = SearchParams {
            keywords: Some("usb charger".into()),
            item_count: Some(5),
            ..SearchParams::default()
        };
        let a = mock_deals(&params);
        let b = mock_deals(&params);
        assert_eq!(a.len(), 5);
        let asins_a: Vec<_> = a.iter().map(|d| d.asin.clone()).collect();
        let asins_b: Vec<_> = b.iter().map(|d| d.asin.clone()).collect();
        assert_eq!(asins_a, asins_b);
    }

    #[test]
    fn different_keywords_different_asins() {
        let a = mock_deals(&SearchParams {
            keywords: Some("laptops".into()),
            ..SearchParams::default()
        });
        let b = mock_deals(&SearchParams {
            keywords: Some("blenders".into()),
            ..SearchParams::default()
        });
        assert_ne!(a[0].asin, b[0].asin);
    }

    #[test]
    fn every_mock_item_has_a_real_markdown() {
        for deal in mock_deals(&SearchParams::default()) {
            assert!(deal.price < deal.original_price);
            assert!(deal.discount_percent > Decimal::ZERO);
        }
    }

    #[test]
    fn item_count_is_clamped() {
        let deals = mock_deals(&SearchParams {
            item_count: Some(500),
            ..SearchParams::default()
        });
        assert_eq!(deals.len(), MAX_ITEM_COUNT as usize);
    }
}
