//! Image URL extraction from embedded markup.

use regex::Regex;

/// Returns the `src` of the first `<img>` tag in `html`.
///
/// This is the last resort in the image lookup chain; the feed adapter
/// checks media-attachment and enclosure fields first and only falls back to
/// scanning entry markup.
#[must_use]
pub fn extract_image(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
        .expect("valid img-src regex");
    re.captures(html).map(|cap| cap[1].to_string())
}
