//! A resolved, downloadable stream of a video.

use std::fmt;

/// One stream the provider offers for a video.
///
/// Built by the manifest parser from a catalog entry and a location, and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    container: String,
    resolution: String,
    preference: u32,
    location: String,
}

impl MediaCandidate {
    pub fn new(
        container: impl Into<String>,
        resolution: impl Into<String>,
        preference: u32,
        location: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            resolution: resolution.into(),
            preference,
            location: location.into(),
        }
    }

    /// The file extension of the stream, e.g. `mp4`.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The resolution label, e.g. `720p`.
    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    /// The catalog rank, 1 being the best.
    pub fn preference(&self) -> u32 {
        self.preference
    }

    /// The direct URL of the stream.
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for MediaCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (rank {})",
            self.container, self.resolution, self.preference
        )
    }
}
