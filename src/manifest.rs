//! Extraction of the downloadable streams from the provider's info payload.
//!
//! The payload is a form-encoded document nobody documents. Everything that
//! depends on its layout lives here, behind [`MediaCandidate`]; when the
//! provider changes the format, this is the only module to touch.
//!
//! The stream listing sits in a `stream_map` field. Its value is encoded
//! twice: once as a field of the payload, and once more for each location
//! inside the listing. Some payloads also carry a JSON-escaped ampersand
//! (`\u0026`) that ends the listing early.

use crate::error::{Error, Result};
use crate::model::candidate::MediaCandidate;
use crate::model::catalog;
use crate::utils::url_decode;
use regex::Regex;
use std::sync::LazyLock;

static STREAM_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)stream_map=([^&]+)(?:&|$)").expect("stream pattern is valid"));

static INNER_AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.*?)\\u0026").expect("ampersand pattern is valid"));

static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)itag=([0-9]+)&url=(.*?)&").expect("segment pattern is valid")
});

static REASON_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)reason=([^&]*)").expect("reason pattern is valid"));

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

const FAILURE_MARKER: &str = "status=fail";
const BOILERPLATE: &str = "Watch on YouTube";

/// Parses the info payload into the cataloged streams it lists.
///
/// Candidates come back in the order the listing names them. Format codes
/// the catalog does not know are dropped; if a code is listed twice, the
/// last location wins. A listing without any known code is not an error.
///
/// # Errors
///
/// When the payload has no stream listing, returns [`Error::ProviderError`]
/// carrying the provider's reason if it reported a failure, and
/// [`Error::NoStreamData`] otherwise.
pub fn parse_manifest(raw: &str) -> Result<Vec<MediaCandidate>> {
    let Some(field) = STREAM_FIELD.captures(raw).and_then(|c| c.get(1)) else {
        log::warn!("No stream listing in the info payload");

        return Err(match provider_error_reason(raw) {
            Some(reason) => Error::ProviderError(reason),
            None => Error::NoStreamData,
        });
    };

    let mut listing = url_decode(field.as_str());
    if let Some(head) = INNER_AMPERSAND.captures(&listing).and_then(|c| c.get(1)) {
        listing = head.as_str().to_string();
    }

    let locations = stream_locations(&listing);
    log::debug!("Stream listing names {} format codes", locations.len());

    let candidates = locations
        .into_iter()
        .filter_map(|(itag, location)| {
            let Some(format) = catalog::lookup(itag) else {
                log::debug!("Skipping unknown format code {}", itag);
                return None;
            };

            Some(MediaCandidate::new(
                format.container,
                format.resolution,
                format.preference,
                location,
            ))
        })
        .collect();

    Ok(candidates)
}

/// Extracts the human readable failure reason from a payload the provider
/// marked as failed.
pub fn provider_error_reason(raw: &str) -> Option<String> {
    if !raw.contains(FAILURE_MARKER) {
        return None;
    }

    let encoded = REASON_FIELD.captures(raw)?.get(1)?.as_str();
    let decoded = url_decode(encoded);
    let reason = MARKUP.replace_all(&decoded, "").replace(BOILERPLATE, "");

    Some(reason.trim().to_string())
}

/// Splits a decoded listing into `(itag, location)` pairs.
fn stream_locations(listing: &str) -> Vec<(u32, String)> {
    let mut locations: Vec<(u32, String)> = Vec::new();

    for segment in listing.split(',') {
        let Some(captures) = SEGMENT.captures(segment) else {
            continue;
        };
        let Ok(itag) = captures[1].parse::<u32>() else {
            continue;
        };
        let location = url_decode(&captures[2]);

        match locations.iter_mut().find(|(known, _)| *known == itag) {
            Some(entry) => entry.1 = location,
            None => locations.push((itag, location)),
        }
    }

    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_known_format() {
        let raw = "status=ok&stream_map=itag%3D18%26url%3Dhttp%253A%252F%252Fexample%252Fv%26&title=x";
        let candidates = parse_manifest(raw).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].container(), "mp4");
        assert_eq!(candidates[0].resolution(), "480p");
        assert_eq!(candidates[0].preference(), 3);
        assert_eq!(candidates[0].location(), "http://example/v");
    }

    #[test]
    fn test_field_at_end_of_payload() {
        let raw = "stream_map=itag%3D18%26url%3Dhttp%253A%252F%252Fexample%252Fv%26";
        let candidates = parse_manifest(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].location(), "http://example/v");
    }

    #[test]
    fn test_field_name_is_case_insensitive() {
        let raw = "URL_ENCODED_FMT_STREAM_MAP=itag%3D22%26url%3Dhttp%253A%252F%252Fhd%26&";
        let candidates = parse_manifest(raw).unwrap();
        assert_eq!(candidates[0].resolution(), "720p");
    }

    #[test]
    fn test_multiple_formats_keep_listing_order() {
        let raw = "stream_map=itag%3D22%26url%3Dhttp%253A%252F%252Fhd%26type%3Dvideo%2Citag%3D17%26url%3Dhttp%253A%252F%252Flow%26type%3Dvideo&";
        let candidates = parse_manifest(raw).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].location(), "http://hd");
        assert_eq!(candidates[0].preference(), 2);
        assert_eq!(candidates[1].location(), "http://low");
        assert_eq!(candidates[1].preference(), 9);
    }

    #[test]
    fn test_unknown_formats_are_dropped() {
        let raw = "stream_map=itag%3D140%26url%3Dhttp%253A%252F%252Faudio%26%2Citag%3D18%26url%3Dhttp%253A%252F%252Fsd%26&";
        let candidates = parse_manifest(raw).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].location(), "http://sd");
    }

    #[test]
    fn test_only_unknown_formats_is_empty_success() {
        let raw = "stream_map=itag%3D140%26url%3Dhttp%253A%252F%252Faudio%26&";
        assert!(parse_manifest(raw).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_format_last_location_wins() {
        let raw = "stream_map=itag%3D18%26url%3Dhttp%253A%252F%252Ffirst%26%2Citag%3D22%26url%3Dhttp%253A%252F%252Fhd%26%2Citag%3D18%26url%3Dhttp%253A%252F%252Fsecond%26&";
        let candidates = parse_manifest(raw).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].location(), "http://second");
        assert_eq!(candidates[1].location(), "http://hd");
    }

    #[test]
    fn test_listing_is_cut_at_escaped_ampersand() {
        let raw = "stream_map=itag%3D18%26url%3Dhttp%253A%252F%252Fsd%26%2Citag%3D22%26url%3Dhttp%253A%252F%252Fhd%26%5Cu0026itag%3D37%26url%3Dhttp%253A%252F%252Ffull%26&";
        let candidates = parse_manifest(raw).unwrap();

        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.preference() != 1));
    }

    #[test]
    fn test_provider_failure_reason() {
        let raw = "status=fail&errorcode=150&reason=This+video+is+%3Cb%3Eunavailable%3C%2Fb%3E.+Watch+on+YouTube";
        match parse_manifest(raw) {
            Err(Error::ProviderError(reason)) => {
                assert_eq!(reason, "This video is unavailable.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_failure_reason_at_end_of_payload() {
        let raw = "status=fail&reason=Not+available+in+your+country";
        assert_eq!(
            provider_error_reason(raw).as_deref(),
            Some("Not available in your country")
        );
    }

    #[test]
    fn test_no_stream_data() {
        assert!(matches!(
            parse_manifest("status=ok&title=whatever"),
            Err(Error::NoStreamData)
        ));
        assert!(matches!(parse_manifest(""), Err(Error::NoStreamData)));
    }

    #[test]
    fn test_failure_marker_without_reason() {
        assert!(matches!(
            parse_manifest("status=fail&errorcode=2"),
            Err(Error::NoStreamData)
        ));
    }

    #[test]
    fn test_no_reason_without_marker() {
        assert_eq!(provider_error_reason("status=ok&reason=ignored"), None);
    }
}
