//! Title extraction for manually pasted deal text.

use regex::Regex;

/// Stored titles are capped at this many characters.
const MAX_TITLE_LEN: usize = 200;

/// Lines starting with one of these keywords describe deal mechanics, not
/// the product, and are never usable as a title.
const NOISE_KEYWORDS: &[&str] = &["code", "coupon", "expires", "was", "save"];

/// Picks a title out of multi-line pasted text: the first non-trivial line
/// that is not itself a price, a URL, or a noise-keyword line, truncated to
/// [`MAX_TITLE_LEN`] characters.
#[must_use]
pub fn extract_title(text: &str) -> Option<String> {
    let price_line_re =
        Regex::new(r"^\s*\$?\s*[0-9][0-9,]*(?:\.[0-9]{1,2})?\s*$").expect("valid price-line regex");

    for line in text.lines() {
        let line = line.trim();
        if line.len() < 4 {
            continue;
        }
        if price_line_re.is_match(line) {
            continue;
        }
        let lower = line.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
        {
            continue;
        }
        if NOISE_KEYWORDS.iter().any(|kw| lower.starts_with(kw)) {
            continue;
        }
        return Some(truncate_chars(line, MAX_TITLE_LEN));
    }
    None
}

/// Truncate on a char boundary, never mid-codepoint.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_real_line_wins() {
        let text = "\n$19.99\nAnker 20W USB-C Charger\nhttps://example.com/x\n";
        assert_eq!(
            extract_title(text),
            Some("Anker 20W USB-C Charger".to_string())
        );
    }

    #[test]
    fn noise_keyword_lines_are_skipped() {
        let text = "code SAVE20\nexpires tomorrow\nCordless Drill Kit";
        assert_eq!(extract_title(text), Some("Cordless Drill Kit".to_string()));
    }

    #[test]
    fn url_only_text_yields_none() {
        assert_eq!(extract_title("https://example.com/deal\nwww.example.com"), None);
    }

    #[test]
    fn long_lines_truncate_on_char_boundary() {
        let long = "é".repeat(300);
        let got = extract_title(&long).expect("line long enough");
        assert_eq!(got.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(extract_title(""), None);
    }
}
