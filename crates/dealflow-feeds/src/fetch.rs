//! Feed document retrieval.

use crate::error::FeedError;

/// Fetches the raw feed document at `url`.
///
/// The caller supplies the shared `reqwest::Client`, which carries the
/// process-wide timeout and user-agent configuration.
///
/// # Errors
///
/// Returns [`FeedError::Http`] on network failure and
/// [`FeedError::UnexpectedStatus`] on any non-2xx response. Either aborts
/// the source's crawl for this cycle; the source stays due for the next tick.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String, FeedError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response.text().await?)
}
