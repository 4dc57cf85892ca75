//! The acquisition state machine.
//!
//! A [`Pipeline`] moves a caller-owned [`MediaItem`] through its lifecycle one
//! transition at a time:
//!
//! ```text
//! ADDED --check--> CHECKED --fetch--> FETCHED --download--> DOWNLOADED --convert--> CONVERTED
//! ```
//!
//! Every transition is a single attempt. When one fails, the item keeps the
//! state it had before the call and the caller decides whether to try again.

use crate::config::{Config, MediaKind};
use crate::error::{Error, Result};
use crate::executor::ProcessOutput;
use crate::fetcher::{Fetcher, Http, is_success, thumbnail};
use crate::manifest;
use crate::model::selector::{self, Quality};
use crate::model::{MediaCandidate, MediaItem, State};
use crate::title;
use crate::transcoder::{Ffmpeg, TranscodeJob, Transcoder};
use crate::utils::file_system;
use chrono::NaiveDateTime;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// How the media file of a download came to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched during this run.
    Downloaded,
    /// The destination already existed; nothing was fetched.
    AlreadyPresent,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Downloaded => write!(f, "downloaded"),
            DownloadOutcome::AlreadyPresent => write!(f, "already present"),
        }
    }
}

/// What happened to the preview image. It never fails a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// Thumbnails are turned off.
    Disabled,
    /// The media file was already on disk, so no image was fetched either.
    Skipped,
    Saved(PathBuf),
    /// No endpoint served an image, or writing it failed.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub outcome: DownloadOutcome,
    pub candidate: MediaCandidate,
    pub thumbnail: ThumbnailOutcome,
}

impl DownloadReport {
    /// Whether the media file was fetched in this run.
    pub fn is_fresh(&self) -> bool {
        self.outcome == DownloadOutcome::Downloaded
    }
}

/// How the audio file of a conversion came to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    Converted,
    AlreadyPresent,
}

impl fmt::Display for ConvertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertOutcome::Converted => write!(f, "converted"),
            ConvertOutcome::AlreadyPresent => write!(f, "already present"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub path: PathBuf,
    pub outcome: ConvertOutcome,
    /// Whether the source video was deleted after the transcode.
    pub source_removed: bool,
    /// Where the transcoder diagnostics went, when logging is on.
    pub log: Option<PathBuf>,
}

/// Everything one [`Pipeline::acquire`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub download: DownloadReport,
    pub conversion: Option<ConvertReport>,
}

impl AcquisitionReport {
    /// The files left on disk, in the order they were produced.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = Vec::new();
        let video_kept = self
            .conversion
            .as_ref()
            .is_none_or(|conversion| !conversion.source_removed);

        if video_kept {
            files.push(self.download.path.as_path());
        }
        if let ThumbnailOutcome::Saved(path) = &self.download.thumbnail {
            files.push(path.as_path());
        }
        if let Some(conversion) = &self.conversion {
            files.push(conversion.path.as_path());
        }

        files
    }
}

/// Drives media items through the acquisition lifecycle.
///
/// The pipeline holds no per-item state, so one instance can serve any number
/// of items, concurrently or not.
#[derive(Debug)]
pub struct Pipeline<H: Http, T: Transcoder> {
    config: Config,
    http: H,
    transcoder: T,
}

impl Pipeline<Fetcher, Ffmpeg> {
    /// A pipeline backed by reqwest and the `ffmpeg` found on the `PATH`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP client could not be built.
    pub fn with_defaults(config: Config) -> Result<Self> {
        let http = Fetcher::new(&config.endpoints().base)?;
        Ok(Self::new(config, http, Ffmpeg::default()))
    }
}

impl<H: Http, T: Transcoder> Pipeline<H, T> {
    pub fn new(config: Config, http: H, transcoder: T) -> Self {
        Self {
            config,
            http,
            transcoder,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// ADDED → CHECKED: asks the provider whether it knows the identifier.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidIdentifier`] on a non-success status, or with
    /// the network error if the endpoint could not be reached.
    pub async fn check(&self, item: &mut MediaItem) -> Result<()> {
        item.expect_state(State::Added, State::Checked)?;

        let endpoints = self.config.endpoints();
        let url = endpoints.oembed_url(&endpoints.watch_url(item.id()));

        let code = self.http.status(&url).await?;
        if !is_success(code) {
            return Err(Error::InvalidIdentifier {
                id: item.id().to_string(),
                code,
            });
        }

        log::info!("Video {} exists", item.id());
        item.advance(State::Checked)
    }

    /// CHECKED → FETCHED: retrieves the manifest, extracts the candidates and
    /// resolves the title.
    ///
    /// The raw manifest is kept on the item even when parsing fails, so the
    /// provider's reason can be read back later.
    pub async fn fetch(&self, item: &mut MediaItem) -> Result<()> {
        item.expect_state(State::Checked, State::Fetched)?;

        let endpoints = self.config.endpoints();
        let raw = self.http.get_text(&endpoints.info_url(item.id())).await?;
        item.set_raw_manifest(raw);

        let candidates = manifest::parse_manifest(item.raw_manifest())?;
        if candidates.is_empty() {
            log::warn!("No known stream format listed for {}", item.id());
            return Err(Error::NoStreamData);
        }

        let title = title::resolve(&self.http, endpoints, item).await;
        if title.is_empty() {
            return Err(Error::UntitledMedia(item.id().to_string()));
        }

        log::info!(
            "Video {} is '{}' with {} candidate(s)",
            item.id(),
            title,
            candidates.len()
        );
        item.set_title(title);
        item.set_candidates(candidates);
        item.advance(State::Fetched)
    }

    /// FETCHED → DOWNLOADED with the configured quality policy.
    pub async fn download(&self, item: &mut MediaItem) -> Result<DownloadReport> {
        self.download_with(item, self.config.quality()).await
    }

    /// FETCHED → DOWNLOADED: stores the top candidate under the policy `quality`.
    ///
    /// An existing destination is left untouched and reported as
    /// [`DownloadOutcome::AlreadyPresent`]. A failed transfer removes the
    /// partial file and leaves the item at FETCHED.
    pub async fn download_with(
        &self,
        item: &mut MediaItem,
        quality: Quality,
    ) -> Result<DownloadReport> {
        item.expect_state(State::Fetched, State::Downloaded)?;

        let candidates = selector::select(item.candidates().to_vec(), quality);
        let candidate = candidates.first().cloned().ok_or(Error::NoStreamData)?;

        let stem = media_stem(item, &candidate);
        let path = self
            .config
            .downloads_dir()
            .join(format!("{}.{}", stem, candidate.container()));

        let outcome = self.store(&candidate, &path).await?;
        let thumbnail = match outcome {
            DownloadOutcome::Downloaded => self.thumbnail(item, &stem).await,
            DownloadOutcome::AlreadyPresent => self.skipped_thumbnail(),
        };

        item.set_candidates(candidates);
        item.advance(State::Downloaded)?;

        Ok(DownloadReport {
            path,
            outcome,
            candidate,
            thumbnail,
        })
    }

    /// DOWNLOADED → CONVERTED: transcodes the downloaded media into audio.
    ///
    /// The source video is removed afterwards when `download` fetched it in
    /// the same run.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ToolUnavailable`] when the transcoder is not installed,
    /// and with [`Error::ConversionFailed`] when it cannot be run or leaves no
    /// output behind.
    pub async fn convert(
        &self,
        item: &mut MediaItem,
        download: &DownloadReport,
    ) -> Result<ConvertReport> {
        item.expect_state(State::Downloaded, State::Converted)?;

        if !self.transcoder.available().await {
            return Err(Error::ToolUnavailable(self.transcoder.name()));
        }

        let output = self.config.downloads_dir().join(format!(
            "{}.{}",
            item.title(),
            self.config.audio_format().extension()
        ));

        if file_system::exists(&output).await? {
            log::info!("{:?} already exists, skipping the transcode", output);
            item.advance(State::Converted)?;

            return Ok(ConvertReport {
                path: output,
                outcome: ConvertOutcome::AlreadyPresent,
                source_removed: false,
                log: None,
            });
        }

        let job = TranscodeJob::new(&download.path, &output, self.config.audio_bitrate());
        let result = match self.transcoder.transcode(&job).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("{} could not be run: {}", self.transcoder.name(), e);
                return Err(Error::ConversionFailed { output });
            }
        };

        let log_path = if self.config.transcode_logging() {
            self.write_transcode_log(&result).await
        } else {
            None
        };

        if !file_system::exists(&output).await? {
            log::error!(
                "{} exited with code {} without writing {:?}",
                self.transcoder.name(),
                result.code,
                output
            );
            return Err(Error::ConversionFailed { output });
        }
        if !result.success() {
            log::warn!(
                "{} exited with code {} but wrote {:?}",
                self.transcoder.name(),
                result.code,
                output
            );
        }

        let source_removed = download.is_fresh() && file_system::remove_file(&download.path).await;

        item.advance(State::Converted)?;
        Ok(ConvertReport {
            path: output,
            outcome: ConvertOutcome::Converted,
            source_removed,
            log: log_path,
        })
    }

    /// Runs every transition `kind` needs, starting from the item's current state.
    ///
    /// Audio is always cut from the best available source. The item is left
    /// at DOWNLOADED or CONVERTED; finishing it is up to the caller.
    pub async fn acquire(&self, item: &mut MediaItem, kind: MediaKind) -> Result<AcquisitionReport> {
        if item.state() == State::Added {
            self.check(item).await?;
        }
        if item.state() == State::Checked {
            self.fetch(item).await?;
        }

        let download = match item.state() {
            State::Fetched => {
                let quality = match kind {
                    MediaKind::Video => self.config.quality(),
                    MediaKind::Audio => Quality::Highest,
                };
                self.download_with(item, quality).await?
            }
            State::Downloaded => self.previous_download(item)?,
            state => {
                return Err(Error::InvalidTransition {
                    from: state,
                    to: State::Downloaded,
                });
            }
        };

        let conversion = match kind {
            MediaKind::Video => None,
            MediaKind::Audio => Some(self.convert(item, &download).await?),
        };

        Ok(AcquisitionReport {
            download,
            conversion,
        })
    }

    /// Places the candidate at `path` unless something is already there.
    async fn store(&self, candidate: &MediaCandidate, path: &Path) -> Result<DownloadOutcome> {
        let failed = |reason: String| Error::DownloadFailed {
            path: path.to_path_buf(),
            reason,
        };

        if file_system::exists(path).await? {
            log::info!("{:?} already exists, skipping the download", path);
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        file_system::create_parent_dir(path).map_err(|e| failed(e.to_string()))?;
        let reserved = file_system::reserve_placeholder(path)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !reserved {
            log::info!("{:?} was claimed by another run", path);
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        log::info!("Downloading {} to {:?}", candidate, path);
        if let Err(e) = self.http.get_to_file(candidate.location(), path).await {
            file_system::remove_file(path).await;
            return Err(failed(e.to_string()));
        }

        Ok(DownloadOutcome::Downloaded)
    }

    /// Fetches the preview image next to the media file, best effort.
    async fn thumbnail(&self, item: &mut MediaItem, stem: &str) -> ThumbnailOutcome {
        if !self.config.download_thumbnails() {
            return ThumbnailOutcome::Disabled;
        }

        let destination = self.config.downloads_dir().join(format!("{}.jpg", stem));
        if matches!(file_system::exists(&destination).await, Ok(true)) {
            return ThumbnailOutcome::Saved(destination);
        }

        let location = match item.thumbnail_location() {
            Some(location) => location.to_string(),
            None => {
                let resolved = thumbnail::resolve(
                    &self.http,
                    self.config.endpoints(),
                    item.id(),
                    self.config.thumbnail_size(),
                )
                .await;

                match resolved {
                    Ok(location) => {
                        item.set_thumbnail_location(location.clone());
                        location
                    }
                    Err(e) => {
                        log::warn!("Skipping the thumbnail of {}: {}", item.id(), e);
                        return ThumbnailOutcome::Unavailable;
                    }
                }
            }
        };

        match thumbnail::download(&self.http, &location, &destination).await {
            Ok(path) => ThumbnailOutcome::Saved(path),
            Err(e) => {
                log::warn!("Failed to save the thumbnail of {}: {}", item.id(), e);
                if matches!(file_system::exists(&destination).await, Ok(true)) {
                    file_system::remove_file(&destination).await;
                }
                ThumbnailOutcome::Unavailable
            }
        }
    }

    fn skipped_thumbnail(&self) -> ThumbnailOutcome {
        if self.config.download_thumbnails() {
            ThumbnailOutcome::Skipped
        } else {
            ThumbnailOutcome::Disabled
        }
    }

    /// Rebuilds the report of an item that was downloaded by an earlier call.
    fn previous_download(&self, item: &MediaItem) -> Result<DownloadReport> {
        let candidate = item.candidates().first().cloned().ok_or(Error::NoStreamData)?;

        let path = self.config.downloads_dir().join(format!(
            "{}.{}",
            media_stem(item, &candidate),
            candidate.container()
        ));

        Ok(DownloadReport {
            path,
            outcome: DownloadOutcome::AlreadyPresent,
            candidate,
            thumbnail: self.skipped_thumbnail(),
        })
    }

    async fn write_transcode_log(&self, output: &ProcessOutput) -> Option<PathBuf> {
        let path = transcode_log_path(
            self.config.logs_dir(),
            &chrono::Local::now().naive_local(),
        );

        match append_log(&path, output).await {
            Ok(()) => Some(path),
            Err(e) => {
                log::warn!("Failed to write the transcoder log {:?}: {}", path, e);
                None
            }
        }
    }
}

/// `{title}_-_{resolution}_-_youtubeid-{id}`, shared by the media file and its thumbnail.
pub fn media_stem(item: &MediaItem, candidate: &MediaCandidate) -> String {
    format!(
        "{}_-_{}_-_youtubeid-{}",
        item.title(),
        candidate.resolution(),
        item.id()
    )
}

/// `{logs}/ffmpeg.{YYYYmmddHHMMSS}.log`
pub fn transcode_log_path(logs_dir: &Path, at: &NaiveDateTime) -> PathBuf {
    logs_dir.join(format!("ffmpeg.{}.log", at.format("%Y%m%d%H%M%S")))
}

async fn append_log(path: &Path, output: &ProcessOutput) -> Result<()> {
    file_system::create_parent_dir(path)?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(output.stdout.as_bytes()).await?;
    file.write_all(output.stderr.as_bytes()).await?;
    file.flush().await?;

    Ok(())
}
