//! Feed document parsing and per-entry normalization.

use chrono::Utc;
use dealflow_core::money::discount_percent;
use dealflow_extract::{extract_coupon, extract_image, extract_prices, extract_store, strip_html};
use feed_rs::model::Entry;
use sha2::{Digest, Sha256};

use crate::error::FeedError;
use crate::types::FeedCandidate;

/// Result of parsing one feed document.
///
/// `errors` holds one human-readable message per entry that could not be
/// normalized (missing title or link). Callers use it to decide whether the
/// source's error counter should be bumped; a non-empty list never aborts
/// the candidates that did parse.
#[derive(Debug)]
pub struct FeedParseOutcome {
    pub candidates: Vec<FeedCandidate>,
    pub errors: Vec<String>,
}

/// Parses a raw feed document (RSS or Atom) into normalized candidates for
/// a source with the given `category`.
///
/// Entries missing a title or link are recorded in
/// [`FeedParseOutcome::errors`] and skipped. Price, coupon, and store fields
/// are extracted heuristically and may be absent.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] only when the document itself is malformed;
/// individual bad entries never fail the call.
pub fn parse_feed(body: &str, category: &str) -> Result<FeedParseOutcome, FeedError> {
    // feed-rs invents an id for entries that lack one; route that through our
    // own link-hash derivation so the guid stays a pure function of the link.
    // Enclosure links are skipped here to hash the same link map_entry keeps.
    let parser = feed_rs::parser::Builder::new()
        .id_generator(|links, _title, _uri| {
            links
                .iter()
                .find(|l| l.rel.as_deref() != Some("enclosure"))
                .or_else(|| links.first())
                .map(|l| derive_guid(&l.href))
                .unwrap_or_default()
        })
        .build();
    let feed = parser.parse(body.as_bytes())?;

    let mut candidates = Vec::with_capacity(feed.entries.len());
    let mut errors = Vec::new();

    for (index, entry) in feed.entries.into_iter().enumerate() {
        match map_entry(entry, category) {
            Ok(candidate) => candidates.push(candidate),
            Err(reason) => {
                tracing::debug!(index, reason, "skipping feed entry");
                errors.push(format!("entry {index}: {reason}"));
            }
        }
    }

    Ok(FeedParseOutcome { candidates, errors })
}

/// Derives a stable guid for an entry that carries none of its own:
/// the hex SHA-256 of the link, truncated to 32 hex chars.
///
/// Pure function of the link: the same link always derives the same guid,
/// across crawls and across processes.
#[must_use]
pub fn derive_guid(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    let mut out = String::with_capacity(32);
    for byte in &digest[..16] {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn map_entry(entry: Entry, category: &str) -> Result<FeedCandidate, String> {
    let title = entry
        .title
        .as_ref()
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty())
        .ok_or("missing title")?;

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() != Some("enclosure"))
        .map(|l| l.href.clone())
        .filter(|href| !href.is_empty())
        .ok_or("missing link")?;

    let guid = if entry.id.trim().is_empty() {
        derive_guid(&link)
    } else {
        entry.id.clone()
    };

    let raw_body = entry
        .summary
        .as_ref()
        .map(|t| t.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();
    let description = strip_html(&raw_body);

    let haystack = format!("{title} {description}");
    let prices = extract_prices(&haystack);
    let (price, original_price) = match &prices {
        Some(p) => (Some(p.price), p.original_price),
        None => (None, None),
    };
    let discount = match (price, original_price) {
        (Some(p), Some(o)) => Some(discount_percent(p, o)),
        _ => None,
    };

    let image_url = entry_image(&entry, &raw_body);

    let published_at = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(Utc::now);

    Ok(FeedCandidate {
        guid,
        title,
        description,
        link,
        image_url,
        category: category.to_owned(),
        price,
        original_price,
        discount_percent: discount,
        store_name: extract_store(&haystack).map(ToOwned::to_owned),
        coupon_code: extract_coupon(&haystack),
        published_at,
    })
}

/// Image lookup chain: media attachments, then enclosures with an `image/*`
/// MIME type, then a scan of the entry markup for the first `<img>` tag.
fn entry_image(entry: &Entry, raw_body: &str) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            let is_image = content
                .content_type
                .as_ref()
                .is_some_and(|ct| ct.ty().as_str().eq_ignore_ascii_case("image"));
            if is_image {
                if let Some(url) = &content.url {
                    return Some(url.to_string());
                }
            }
        }
        if let Some(thumb) = media.thumbnails.first() {
            return Some(thumb.image.uri.clone());
        }
    }

    // Atom enclosures stay in the link list.
    let enclosure = entry.links.iter().find(|l| {
        l.rel.as_deref() == Some("enclosure")
            && l.media_type
                .as_deref()
                .is_some_and(|mt| mt.starts_with("image/"))
    });
    if let Some(link) = enclosure {
        return Some(link.href.clone());
    }

    extract_image(raw_body)
}
