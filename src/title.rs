//! Derivation of a file-system safe title for a video.

use crate::config::Endpoints;
use crate::fetcher::{Http, metadata};
use crate::model::MediaItem;
use crate::utils::url_decode;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("underscore pattern is valid"));

static HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("hyphen pattern is valid"));

static TITLE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[&?])title=([^&]*)").expect("title pattern is valid"));

/// Accented letters and their ASCII spelling, with the HTML entity naming them.
const ACCENTS: &[(&str, char, &str)] = &[
    ("Agrave", 'À', "A"),
    ("agrave", 'à', "a"),
    ("Egrave", 'È', "E"),
    ("egrave", 'è', "e"),
    ("Igrave", 'Ì', "I"),
    ("igrave", 'ì', "i"),
    ("Ograve", 'Ò', "O"),
    ("ograve", 'ò', "o"),
    ("Ugrave", 'Ù', "U"),
    ("ugrave", 'ù', "u"),
    ("Aacute", 'Á', "A"),
    ("aacute", 'á', "a"),
    ("Eacute", 'É', "E"),
    ("eacute", 'é', "e"),
    ("Iacute", 'Í', "I"),
    ("iacute", 'í', "i"),
    ("Oacute", 'Ó', "O"),
    ("oacute", 'ó', "o"),
    ("Uacute", 'Ú', "U"),
    ("uacute", 'ú', "u"),
    ("Yacute", 'Ý', "Y"),
    ("yacute", 'ý', "y"),
    ("Acirc", 'Â', "A"),
    ("acirc", 'â', "a"),
    ("Ecirc", 'Ê', "E"),
    ("ecirc", 'ê', "e"),
    ("Icirc", 'Î', "I"),
    ("icirc", 'î', "i"),
    ("Ocirc", 'Ô', "O"),
    ("ocirc", 'ô', "o"),
    ("Ucirc", 'Û', "U"),
    ("ucirc", 'û', "u"),
    ("Atilde", 'Ã', "A"),
    ("atilde", 'ã', "a"),
    ("Ntilde", 'Ñ', "N"),
    ("ntilde", 'ñ', "n"),
    ("Otilde", 'Õ', "O"),
    ("otilde", 'õ', "o"),
    ("Auml", 'Ä', "Ae"),
    ("auml", 'ä', "ae"),
    ("Euml", 'Ë', "E"),
    ("euml", 'ë', "e"),
    ("Iuml", 'Ï', "I"),
    ("iuml", 'ï', "i"),
    ("Ouml", 'Ö', "Oe"),
    ("ouml", 'ö', "oe"),
    ("Uuml", 'Ü', "Ue"),
    ("uuml", 'ü', "ue"),
    ("Yuml", 'Ÿ', "Y"),
    ("yuml", 'ÿ', "y"),
    ("Aring", 'Å', "A"),
    ("aring", 'å', "a"),
    ("AElig", 'Æ', "Ae"),
    ("aelig", 'æ', "ae"),
    ("Ccedil", 'Ç', "C"),
    ("ccedil", 'ç', "c"),
    ("OElig", 'Œ', "OE"),
    ("oelig", 'œ', "oe"),
    ("szlig", 'ß', "ss"),
    ("Oslash", 'Ø', "O"),
    ("oslash", 'ø', "o"),
];

/// Entities decoded after the accents. `&quot;` is left to [`canonicalize`].
const BASIC_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Resolves the title of a fetched item.
///
/// The public metadata lookup is preferred; the `title` field of the raw
/// manifest is the fallback. Returns an empty string when neither yields a
/// usable name, which callers must treat as a failure.
pub async fn resolve<H: Http + ?Sized>(http: &H, endpoints: &Endpoints, item: &MediaItem) -> String {
    let watch_url = endpoints.watch_url(item.id());

    if let Some(title) = metadata::lookup(http, endpoints, &watch_url)
        .await
        .and_then(|info| info.title)
    {
        let title = sanitize(&title);
        if !title.is_empty() {
            return title;
        }
        log::debug!("Public title of {} is unusable, trying the manifest", item.id());
    }

    match title_from_manifest(item.raw_manifest()) {
        Some(title) => sanitize(&title),
        None => {
            log::warn!("No title found for {}", item.id());
            String::new()
        }
    }
}

/// Extracts the raw `title` field of an info payload.
pub fn title_from_manifest(raw: &str) -> Option<String> {
    let decoded = url_decode(raw);
    let title = TITLE_FIELD.captures(&decoded)?.get(1)?.as_str();

    Some(title.to_string())
}

/// Transliterates and canonicalizes a title.
pub fn sanitize(title: &str) -> String {
    canonicalize(&transliterate(title))
}

/// Spells accented letters in ASCII and decodes the common HTML entities.
pub fn transliterate(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match ACCENTS.iter().find(|(_, accented, _)| *accented == c) {
            Some((_, _, ascii)) => output.push_str(ascii),
            None => output.push(c),
        }
    }

    for (name, _, ascii) in ACCENTS {
        let entity = format!("&{};", name);
        if output.contains(&entity) {
            output = output.replace(&entity, ascii);
        }
    }

    for (entity, decoded) in BASIC_ENTITIES {
        output = output.replace(entity, decoded);
    }

    output
}

/// Turns a title into a file name stem.
///
/// Only `[A-Za-z0-9_-]` survives; whitespace runs become one underscore,
/// repeated underscores or hyphens collapse, and trailing ones are removed.
/// Applying it twice gives the same result as applying it once.
pub fn canonicalize(input: &str) -> String {
    let stripped = input.trim().replace("&quot;", "");
    let underscored = WHITESPACE.replace_all(&stripped, "_");

    let kept: String = underscored
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    let collapsed = UNDERSCORES.replace_all(&kept, "_");
    let collapsed = HYPHENS.replace_all(&collapsed, "-");

    collapsed.trim_end_matches(['_', '-']).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonicalize_basic() {
        assert_eq!(
            canonicalize("  Rick Astley - Never Gonna Give You Up (Official Video)  "),
            "Rick_Astley_-_Never_Gonna_Give_You_Up_Official_Video"
        );
    }

    #[test]
    fn test_canonicalize_strips_quotes_and_symbols() {
        assert_eq!(canonicalize("&quot;Hello&quot; World!?"), "Hello_World");
        assert_eq!(canonicalize("a -- b"), "a_-_b");
        assert_eq!(canonicalize("tabs\tand\nnewlines"), "tabs_and_newlines");
    }

    #[test]
    fn test_canonicalize_drops_non_ascii() {
        assert_eq!(canonicalize("日本語 title"), "_title");
        assert_eq!(canonicalize("emoji 🎵 song"), "emoji_song");
    }

    #[test]
    fn test_canonicalize_trailing_separators() {
        assert_eq!(canonicalize("ends with -"), "ends_with");
        assert_eq!(canonicalize("ends___"), "ends");
        assert_eq!(canonicalize("!!!"), "");
    }

    proptest! {
        #[test]
        fn test_canonicalize_is_idempotent(input in any::<String>()) {
            let once = canonicalize(&input);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn test_canonicalize_title_like_input_is_idempotent(input in "[ a-zA-Z0-9_&;\\-\\t]{0,40}") {
            let once = canonicalize(&input);
            prop_assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn test_transliterate_characters() {
        assert_eq!(transliterate("Mädchen für Café"), "Maedchen fuer Cafe");
        assert_eq!(transliterate("Straße Æon Œuvre"), "Strasse Aeon OEuvre");
    }

    #[test]
    fn test_transliterate_entities() {
        assert_eq!(transliterate("M&auml;dchen &eacute;t&eacute;"), "Maedchen ete");
        assert_eq!(transliterate("Tom &amp; Jerry&#39;s"), "Tom & Jerry's");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Björk - Jóga (Live)"), "Bjoerk_-_Joga_Live");
        assert_eq!(sanitize("Tom &amp; Jerry"), "Tom_Jerry");
    }

    #[test]
    fn test_title_from_manifest() {
        let raw = "status=ok&title=My+Great+Video%21&length_seconds=10";
        assert_eq!(title_from_manifest(raw).as_deref(), Some("My Great Video!"));
        assert_eq!(sanitize(&title_from_manifest(raw).unwrap()), "My_Great_Video");
    }

    #[test]
    fn test_title_from_manifest_first_field() {
        let raw = "title=First&status=ok";
        assert_eq!(title_from_manifest(raw).as_deref(), Some("First"));
    }

    #[test]
    fn test_title_from_manifest_missing() {
        assert!(title_from_manifest("status=ok&subtitle=nope").is_none());
    }
}
