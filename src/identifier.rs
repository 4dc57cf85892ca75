//! Extraction of the video identifier from the URL shapes the provider uses.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:https?://)?(?:www\.)?(?:m\.)?(?:youtu\.be/|youtube\.com/(?:(?:watch)?\?(?:.*&)?vi?=|(?:embed|v|vi|user)/))([^?&"'>]+)"#,
    )
    .expect("identifier pattern is valid")
});

/// Returns the identifier segment of a video URL.
///
/// Accepts `youtu.be/<id>`, `youtube.com/watch?v=<id>` and
/// `youtube.com/{embed,v,vi,user}/<id>`, with or without scheme, `www.` or
/// `m.`. The length of the identifier is not checked here.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when no shape matches.
pub fn parse(url: &str) -> Result<String> {
    URL_PATTERN
        .captures(url.trim())
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))
}
