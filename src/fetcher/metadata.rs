//! The public oEmbed lookup for a watch page.

use crate::config::Endpoints;
use crate::fetcher::Http;
use serde::Deserialize;

/// The fields of the oEmbed document the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicInfo {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Fetches the public metadata for `watch_url`.
///
/// Any failure (network, status, malformed document) yields `None`: this
/// lookup is only a preferred source, never a required one.
pub async fn lookup<H: Http + ?Sized>(
    http: &H,
    endpoints: &Endpoints,
    watch_url: &str,
) -> Option<PublicInfo> {
    let url = endpoints.oembed_url(watch_url);

    let body = match http.get_text(&url).await {
        Ok(body) => body,
        Err(e) => {
            log::debug!("Public metadata lookup failed for {}: {}", watch_url, e);
            return None;
        }
    };

    parse(&body)
}

/// Parses an oEmbed document.
pub fn parse(body: &str) -> Option<PublicInfo> {
    match serde_json::from_str::<PublicInfo>(body) {
        Ok(info) => Some(info),
        Err(e) => {
            log::debug!("Public metadata is not a valid document: {}", e);
            None
        }
    }
}
