//! Price extraction from free-form deal text.

use regex::Regex;
use rust_decimal::Decimal;

/// A price pair pulled out of unstructured text.
///
/// `original_price` is only present when the text contains evidence of a
/// markdown (two money tokens, or an explicit "was/reg" marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceExtraction {
    pub price: Decimal,
    pub original_price: Option<Decimal>,
}

/// Scans `text` for currency-prefixed money tokens and resolves them into a
/// current/original price pair.
///
/// Resolution rules, in order:
/// - exactly one money token → it is the current price;
/// - an explicit original marker (`was $X`, `reg $X`, `originally $X`) pins
///   the original price; the marker always wins;
/// - an explicit current marker (`now $X`, `sale $X`, `only $X`) pins the
///   current price;
/// - otherwise the lowest token is the current price and the highest the
///   original.
///
/// Returns `None` when no money token is found. Comma thousands separators
/// are accepted (`$1,299.99`).
#[must_use]
pub fn extract_prices(text: &str) -> Option<PriceExtraction> {
    let money_re = Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").expect("valid money regex");
    let original_re = Regex::new(
        r"(?i)\b(?:was|reg(?:\.|ular(?:ly)?)?|orig(?:\.|inal(?:ly)?)?)\b[:\s]*\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)",
    )
    .expect("valid original-marker regex");
    let current_re = Regex::new(
        r"(?i)\b(?:now|sale|only)\b[:\s]*\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)",
    )
    .expect("valid current-marker regex");

    let mut tokens: Vec<Decimal> = Vec::new();
    for cap in money_re.captures_iter(text) {
        if let Some(value) = parse_money(&cap[1]) {
            tokens.push(value);
        }
    }
    if tokens.is_empty() {
        return None;
    }
    if tokens.len() == 1 {
        return Some(PriceExtraction {
            price: tokens[0],
            original_price: None,
        });
    }

    let marked_original = original_re.captures(text).and_then(|c| parse_money(&c[1]));
    let marked_current = current_re.captures(text).and_then(|c| parse_money(&c[1]));

    // The explicit original marker always wins; current comes from the
    // current marker when present, else the lowest remaining token.
    if let Some(original) = marked_original {
        let price = marked_current
            .or_else(|| min_excluding_one(&tokens, original))
            .unwrap_or(original);
        return Some(PriceExtraction {
            price,
            original_price: Some(original),
        });
    }

    let lowest = tokens.iter().copied().min().unwrap_or(tokens[0]);
    let highest = tokens.iter().copied().max().unwrap_or(tokens[0]);
    let price = marked_current.unwrap_or(lowest);
    let original_price = if highest > price { Some(highest) } else { None };
    Some(PriceExtraction {
        price,
        original_price,
    })
}

/// Lowest token after removing one occurrence of `excluded` (the token the
/// original marker already claimed).
fn min_excluding_one(tokens: &[Decimal], excluded: Decimal) -> Option<Decimal> {
    let mut skipped = false;
    tokens
        .iter()
        .copied()
        .filter(|&t| {
            if !skipped && t == excluded {
                skipped = true;
                false
            } else {
                true
            }
        })
        .min()
}

fn parse_money(raw: &str) -> Option<Decimal> {
    raw.replace(',', "").parse::<Decimal>().ok()
}
