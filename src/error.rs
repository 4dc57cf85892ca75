//! The errors that can occur.

use crate::model::item::State;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
///
/// Every pipeline transition fails with exactly one of these, and a failed
/// transition never moves the item forward.
#[derive(Debug, Error)]
pub enum Error {
    /// No known URL shape matched the input.
    #[error("Could not extract a video identifier from URL: {0}")]
    InvalidUrl(String),
    /// The identifier does not have the provider's fixed length.
    #[error("{0} is not a valid video identifier (expected 11 characters)")]
    MalformedIdentifier(String),
    /// The provider rejected the identifier during the status check.
    #[error("Invalid video identifier {id}: status code was {code}")]
    InvalidIdentifier { id: String, code: u16 },
    /// The info payload holds no stream listing and no failure reason.
    #[error("No stream data found in the video info payload")]
    NoStreamData,
    /// The provider refused to serve the video and said why.
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// Neither title source produced a usable file name.
    #[error("Could not derive a title for video {0}")]
    UntitledMedia(String),
    /// The media could not be written to its destination.
    #[error("Saving {path:?} failed: {reason}")]
    DownloadFailed { path: PathBuf, reason: String },
    /// Neither thumbnail endpoint answered with a success status.
    #[error("No thumbnail available for video")]
    ThumbnailUnavailable,
    /// The transcoder binary is not installed on this host.
    #[error("Transcoder not available: {0}")]
    ToolUnavailable(String),
    /// The transcoder ran but produced no output file.
    #[error("Converting into {output:?} failed")]
    ConversionFailed { output: PathBuf },
    /// A configuration value is out of range or unknown.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The item is not in the state the transition starts from.
    #[error("Cannot move a video from state {from} to {to}")]
    InvalidTransition { from: State, to: State },

    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    IO(#[from] std::io::Error),
    /// An error occurred while fetching.
    #[error("An error occurred while fetching: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// An error occurred while parsing the configuration file.
    #[error("An error occurred while parsing the configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
    /// An error occurred due to a timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Whether a caller can reasonably run the failing transition again.
    ///
    /// Missing tools, bad configuration and malformed input need an operator.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::DownloadFailed { .. }
                | Error::Reqwest(_)
                | Error::IO(_)
                | Error::Timeout(_)
                | Error::ConversionFailed { .. }
        )
    }
}
