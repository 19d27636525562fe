//! Coupon code extraction.

use regex::Regex;

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 20;

/// Finds the first coupon code in `text`: a `code`/`coupon`/`promo` keyword
/// followed by a 3–20 character alphanumeric token, normalized to upper case.
///
/// `coupon code SAVE20` and `promo code SAVE20` resolve to `SAVE20`, not to
/// the literal word `code` (the longer keyword alternatives match first).
#[must_use]
pub fn extract_coupon(text: &str) -> Option<String> {
    let re = Regex::new(
        r"(?i)\b(?:coupon\s+code|promo\s+code|code|coupon|promo)\b[:\s]+([A-Za-z0-9]+)",
    )
    .expect("valid coupon regex");

    for cap in re.captures_iter(text) {
        let token = &cap[1];
        if (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&token.len()) {
            return Some(token.to_uppercase());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_code_after_keyword() {
        assert_eq!(extract_coupon("use code SAVE20 now"), Some("SAVE20".into()));
        assert_eq!(extract_coupon("Code: SAVE20"), Some("SAVE20".into()));
    }

    #[test]
    fn coupon_code_keyword_does_not_capture_the_word_code() {
        assert_eq!(
            extract_coupon("apply coupon code FRESH15 at checkout"),
            Some("FRESH15".into())
        );
    }

    #[test]
    fn lowercase_codes_are_upper_cased() {
        assert_eq!(extract_coupon("promo: save5x"), Some("SAVE5X".into()));
    }

    #[test]
    fn tokens_outside_length_bounds_are_skipped() {
        // "GO" is too short; the scan continues to the next keyword match.
        assert_eq!(extract_coupon("code GO, coupon LONGER20"), Some("LONGER20".into()));
        assert_eq!(
            extract_coupon("code ABCDEFGHIJKLMNOPQRSTU"), // 21 chars
            None
        );
    }

    #[test]
    fn no_keyword_returns_none() {
        assert_eq!(extract_coupon("half price this weekend"), None);
    }
}
