//! Markup normalization for untrusted feed text.

/// Strips HTML tags and the common named entities from `text`, collapsing
/// runs of whitespace to single spaces.
///
/// This is intentionally not a full HTML parser: feed descriptions carry at
/// most light inline markup, and anything exotic degrades to readable text
/// rather than failing.
#[must_use]
pub fn strip_html(text: &str) -> String {
    let mut no_tags = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                no_tags.push(' ');
            }
            _ if !in_tag => no_tags.push(ch),
            _ => {}
        }
    }

    let decoded = no_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_tags_and_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Big   <b>deal</b></p>\n<br/>today"),
            "Big deal today"
        );
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(
            strip_html("B&amp;H &quot;deal&quot; &#39;now&#39; &lt;50%&gt;"),
            "B&H \"deal\" 'now' <50%>"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_html("already clean"), "already clean");
    }
}
