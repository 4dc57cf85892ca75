//! Utility functions shared by the pipeline stages.

pub mod file_system;

/// Decodes a form-encoded string: `+` becomes a space and `%XX` sequences
/// become bytes. Malformed escapes are kept as they are, invalid UTF-8 is
/// replaced.
pub fn url_decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Encodes a string for use as a single query parameter value.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}
