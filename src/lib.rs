#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod identifier;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod title;
pub mod transcoder;
pub mod utils;

pub use config::{AudioFormat, Config, ConfigBuilder, ConfigFile, Endpoints, MediaKind, ThumbnailSize};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, Http};
pub use model::{MediaCandidate, MediaItem, Quality, State};
pub use pipeline::{
    AcquisitionReport, ConvertOutcome, ConvertReport, DownloadOutcome, DownloadReport, Pipeline,
    ThumbnailOutcome,
};
pub use transcoder::{Ffmpeg, TranscodeJob, Transcoder};
