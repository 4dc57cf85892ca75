//! A single video moving through the acquisition pipeline.

use crate::error::{Error, Result};
use crate::model::candidate::MediaCandidate;
use std::fmt;

/// The fixed length of a provider identifier.
pub const ID_LENGTH: usize = 11;

/// The lifecycle of a video. States only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Identifier parsed, nothing checked yet.
    Added,
    /// The provider knows the identifier.
    Checked,
    /// Manifest parsed and title resolved.
    Fetched,
    /// Media file present on disk.
    Downloaded,
    /// Audio file present on disk.
    Converted,
    /// The caller is done with the video.
    Finished,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Added => "ADDED",
            State::Checked => "CHECKED",
            State::Fetched => "FETCHED",
            State::Downloaded => "DOWNLOADED",
            State::Converted => "CONVERTED",
            State::Finished => "FINISHED",
        };
        write!(f, "{}", name)
    }
}

/// One video acquisition unit.
///
/// Owned by the caller and lent to each pipeline transition in turn.
#[derive(Debug, Clone)]
pub struct MediaItem {
    id: String,
    source_url: String,
    title: String,
    raw_manifest: String,
    candidates: Vec<MediaCandidate>,
    thumbnail_location: Option<String>,
    state: State,
}

impl MediaItem {
    /// Creates an item in the `Added` state.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::MalformedIdentifier`] unless `id` is exactly 11 characters long.
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Result<Self> {
        let id = validate_id(id.into())?;

        Ok(Self {
            id,
            source_url: source_url.into(),
            title: String::new(),
            raw_manifest: String::new(),
            candidates: Vec::new(),
            thumbnail_location: None,
            state: State::Added,
        })
    }

    /// Parses `url` and creates an item for the identifier it holds.
    pub fn from_url(url: &str) -> Result<Self> {
        let id = crate::identifier::parse(url)?;
        Self::new(id, url)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Re-assigns the identifier, with the same validation as [`MediaItem::new`].
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<()> {
        self.id = validate_id(id.into())?;
        Ok(())
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// The file-system safe title, empty until the item is fetched.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw_manifest(&self) -> &str {
        &self.raw_manifest
    }

    /// Re-reads the provider's refusal reason from the stored manifest.
    pub fn provider_error_reason(&self) -> Option<String> {
        crate::manifest::provider_error_reason(&self.raw_manifest)
    }

    /// The candidates in selection order.
    pub fn candidates(&self) -> &[MediaCandidate] {
        &self.candidates
    }

    pub fn thumbnail_location(&self) -> Option<&str> {
        self.thumbnail_location.as_deref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The public watch page of the video.
    pub fn watch_url(&self, base: &str) -> String {
        format!("{}watch?v={}", base, self.id)
    }

    /// Marks the item as finished. Callers do this once every step they
    /// asked for has succeeded.
    pub fn finish(&mut self) -> Result<()> {
        self.advance(State::Finished)
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_raw_manifest(&mut self, raw: String) {
        self.raw_manifest = raw;
    }

    pub(crate) fn set_candidates(&mut self, candidates: Vec<MediaCandidate>) {
        self.candidates = candidates;
    }

    pub(crate) fn set_thumbnail_location(&mut self, location: String) {
        self.thumbnail_location = Some(location);
    }

    /// Moves the item forward to `to`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidTransition`] if `to` is not after the current state.
    pub(crate) fn advance(&mut self, to: State) -> Result<()> {
        if to <= self.state {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }

        log::debug!("Video {} moves from {} to {}", self.id, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Fails unless the item is exactly in `expected`, the start of the transition to `to`.
    pub(crate) fn expect_state(&self, expected: State, to: State) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

fn validate_id(id: String) -> Result<String> {
    if id.chars().count() == ID_LENGTH {
        Ok(id)
    } else {
        Err(Error::MalformedIdentifier(id))
    }
}
