//! Affiliate tagging of outbound product links.
//!
//! Tagging is best effort. A link we cannot tag (unknown retailer, garbage
//! URL) passes through unchanged so approval never fails on monetization.

use reqwest::Url;

/// Rewrites retailer product URLs to carry the configured affiliate tag.
#[derive(Debug, Clone)]
pub struct AffiliateTagger {
    tag: String,
}

impl AffiliateTagger {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Returns the tagged form of `raw_url`, or the input unchanged when the
    /// retailer is unknown or the URL does not parse.
    ///
    /// An existing `tag` parameter is replaced, never duplicated, so
    /// re-tagging an already-tagged link is idempotent.
    #[must_use]
    pub fn tag_url(&self, raw_url: &str) -> String {
        let Ok(url) = Url::parse(raw_url) else {
            tracing::warn!(url = raw_url, "unparsable product URL left untagged");
            return raw_url.to_owned();
        };
        let Some(host) = url.host_str() else {
            tracing::warn!(url = raw_url, "hostless product URL left untagged");
            return raw_url.to_owned();
        };

        if !is_amazon_host(host) {
            tracing::debug!(host, "retailer has no affiliate program configured");
            return raw_url.to_owned();
        }

        let mut tagged = url.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| name != "tag")
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        tagged.set_query(None);
        {
            let mut pairs = tagged.query_pairs_mut();
            for (name, value) in &kept {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("tag", &self.tag);
        }
        tagged.to_string()
    }
}

/// Matches `amazon.<tld>` and `www.amazon.<tld>` hosts.
fn is_amazon_host(host: &str) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    host == "amazon.com" || host.starts_with("amazon.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_tag_to_amazon_url() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let tagged = tagger.tag_url("https://www.amazon.com/dp/B0EXAMPLE1");
        assert_eq!(
            tagged,
            "https://www.amazon.com/dp/B0EXAMPLE1?tag=dealflow-20"
        );
    }

    #[test]
    fn preserves_existing_query_parameters() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let tagged = tagger.tag_url("https://www.amazon.com/dp/B0EXAMPLE1?th=1&psc=1");
        assert_eq!(
            tagged,
            "https://www.amazon.com/dp/B0EXAMPLE1?th=1&psc=1&tag=dealflow-20"
        );
    }

    #[test]
    fn replaces_foreign_tag_instead_of_duplicating() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let tagged = tagger.tag_url("https://www.amazon.com/dp/B0EXAMPLE1?tag=competitor-21");
        assert_eq!(
            tagged,
            "https://www.amazon.com/dp/B0EXAMPLE1?tag=dealflow-20"
        );
    }

    #[test]
    fn tagging_is_idempotent() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let once = tagger.tag_url("https://www.amazon.com/dp/B0EXAMPLE1");
        let twice = tagger.tag_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn international_amazon_hosts_are_tagged() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let tagged = tagger.tag_url("https://amazon.co.uk/dp/B0EXAMPLE1");
        assert!(tagged.ends_with("tag=dealflow-20"));
    }

    #[test]
    fn unknown_retailer_passes_through() {
        let tagger = AffiliateTagger::new("dealflow-20");
        let url = "https://www.walmart.com/ip/12345";
        assert_eq!(tagger.tag_url(url), url);
    }

    #[test]
    fn unparsable_url_passes_through() {
        let tagger = AffiliateTagger::new("dealflow-20");
        assert_eq!(tagger.tag_url("not a url at all"), "not a url at all");
    }
}
