//! The settings a pipeline run works with.
//!
//! A [`Config`] is an immutable value: it is assembled once through a
//! [`ConfigBuilder`], which validates every setting as it is assigned, and is
//! then handed to the pipeline. Nothing changes it afterwards.

use crate::error::{Error, Result};
use crate::model::Quality;
use crate::utils::{file_system, url_encode};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The lowest accepted audio bitrate, in kbps.
pub const MIN_AUDIO_BITRATE: u32 = 128;
/// The highest accepted audio bitrate, in kbps.
pub const MAX_AUDIO_BITRATE: u32 = 320;

/// The provider URLs the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// The site root, ending with a slash. Watch, info and oEmbed URLs hang off it.
    pub base: String,
    /// The primary thumbnail host, ending with a slash.
    pub thumbnail: String,
    /// The mirror tried when the primary thumbnail host fails.
    pub thumbnail_mirror: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: "https://www.youtube.com/".to_string(),
            thumbnail: "https://img.youtube.com/vi/".to_string(),
            thumbnail_mirror: "https://i1.ytimg.com/vi/".to_string(),
        }
    }
}

impl Endpoints {
    pub fn watch_url(&self, id: &str) -> String {
        format!("{}watch?v={}", self.base, id)
    }

    /// The info payload holding the stream listing.
    pub fn info_url(&self, id: &str) -> String {
        format!(
            "{}get_video_info?video_id={}&el=embedded&ps=default&eurl=&hl=en_US",
            self.base, id
        )
    }

    /// The public oEmbed document of a watch page.
    pub fn oembed_url(&self, watch_url: &str) -> String {
        format!("{}oembed?url={}&format=json", self.base, url_encode(watch_url))
    }

    pub fn thumbnail_url(&self, id: &str, size: ThumbnailSize) -> String {
        format!("{}{}/{}.jpg", self.thumbnail, id, size.token())
    }

    pub fn thumbnail_mirror_url(&self, id: &str, size: ThumbnailSize) -> String {
        format!("{}{}/{}.jpg", self.thumbnail_mirror, id, size.token())
    }
}

/// The size of the preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailSize {
    Small,
    #[default]
    Large,
}

impl ThumbnailSize {
    /// The provider's name for the size.
    pub fn token(&self) -> &'static str {
        match self {
            ThumbnailSize::Small => "default",
            ThumbnailSize::Large => "hqdefault",
        }
    }
}

impl FromStr for ThumbnailSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s" | "small" => Ok(ThumbnailSize::Small),
            "l" | "large" => Ok(ThumbnailSize::Large),
            other => Err(Error::InvalidConfiguration(format!(
                "invalid thumbnail size '{}', expected 'small' or 'large'",
                other
            ))),
        }
    }
}

/// The audio formats the transcoder may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
    Mp4,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Ogg,
        AudioFormat::Mp4,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_lowercase();

        AudioFormat::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = AudioFormat::ALL.iter().map(|f| f.extension()).collect();
                Error::InvalidConfiguration(format!(
                    "invalid audio filetype '{}', valid filetypes are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// What the caller wants out of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    /// Keep the downloaded video.
    #[default]
    Video,
    /// Transcode the download into an audio file.
    Audio,
}

/// The immutable settings of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    quality: Quality,
    thumbnail_size: ThumbnailSize,
    download_thumbnails: bool,
    audio_format: AudioFormat,
    audio_bitrate: u32,
    transcode_logging: bool,
    downloads_dir: PathBuf,
    logs_dir: PathBuf,
    endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: Quality::Highest,
            thumbnail_size: ThumbnailSize::Large,
            download_thumbnails: true,
            audio_format: AudioFormat::Mp3,
            audio_bitrate: MAX_AUDIO_BITRATE,
            transcode_logging: false,
            downloads_dir: PathBuf::from("videos"),
            logs_dir: PathBuf::from("logs"),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn thumbnail_size(&self) -> ThumbnailSize {
        self.thumbnail_size
    }

    pub fn download_thumbnails(&self) -> bool {
        self.download_thumbnails
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    /// The audio bitrate in kbps.
    pub fn audio_bitrate(&self) -> u32 {
        self.audio_bitrate
    }

    pub fn transcode_logging(&self) -> bool {
        self.transcode_logging
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Assembles a [`Config`], validating each setting as it is assigned.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn quality(mut self, quality: Quality) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn thumbnail_size(mut self, size: ThumbnailSize) -> Self {
        self.config.thumbnail_size = size;
        self
    }

    pub fn download_thumbnails(mut self, enabled: bool) -> Self {
        self.config.download_thumbnails = enabled;
        self
    }

    pub fn audio_format(mut self, format: AudioFormat) -> Self {
        self.config.audio_format = format;
        self
    }

    /// Sets the audio bitrate in kbps.
    ///
    /// # Errors
    ///
    /// Fails unless `kbps` is between 128 and 320 inclusive.
    pub fn audio_bitrate(mut self, kbps: u32) -> Result<Self> {
        if !(MIN_AUDIO_BITRATE..=MAX_AUDIO_BITRATE).contains(&kbps) {
            return Err(Error::InvalidConfiguration(format!(
                "audio bitrate must be between {} and {}, got {}",
                MIN_AUDIO_BITRATE, MAX_AUDIO_BITRATE, kbps
            )));
        }

        self.config.audio_bitrate = kbps;
        Ok(self)
    }

    pub fn transcode_logging(mut self, enabled: bool) -> Self {
        self.config.transcode_logging = enabled;
        self
    }

    /// Sets the download directory, creating it if needed.
    pub fn downloads_dir(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        self.config.downloads_dir = file_system::ensure_dir(dir)?;
        Ok(self)
    }

    /// Sets the transcoder log directory, creating it if needed.
    pub fn logs_dir(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        self.config.logs_dir = file_system::ensure_dir(dir)?;
        Ok(self)
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Applies every setting the file defines.
    pub fn apply_file(mut self, file: &ConfigFile) -> Result<Self> {
        if let Some(quality) = file.quality {
            self = self.quality(quality);
        }
        if let Some(size) = &file.thumbnail_size {
            self = self.thumbnail_size(size.parse()?);
        }
        if let Some(enabled) = file.download_thumbnails {
            self = self.download_thumbnails(enabled);
        }
        if let Some(format) = &file.audio_format {
            self = self.audio_format(format.parse()?);
        }
        if let Some(kbps) = file.audio_bitrate {
            self = self.audio_bitrate(kbps)?;
        }
        if let Some(enabled) = file.transcode_logging {
            self = self.transcode_logging(enabled);
        }
        if let Some(dir) = &file.downloads_dir {
            self = self.downloads_dir(dir)?;
        }
        if let Some(dir) = &file.logs_dir {
            self = self.logs_dir(dir)?;
        }
        if let Some(endpoints) = &file.endpoints {
            self = self.endpoints(endpoints.clone());
        }
        Ok(self)
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// The on-disk form of the settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub quality: Option<Quality>,
    pub thumbnail_size: Option<String>,
    pub download_thumbnails: Option<bool>,
    pub audio_format: Option<String>,
    pub audio_bitrate: Option<u32>,
    pub transcode_logging: Option<bool>,
    pub downloads_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub endpoints: Option<Endpoints>,
}

impl ConfigFile {
    /// `<config dir>/tubefetch/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tubefetch").join("config.toml"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the file at `path`. A missing or empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            log::debug!("No configuration file at {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
