//! Conversion of downloaded videos into audio files.

use crate::error::Result;
use crate::executor::{Executor, ProcessOutput};
use async_trait::async_trait;
use std::path::PathBuf;

/// The sample rate of every produced audio file, in Hz.
pub const SAMPLE_RATE: u32 = 44100;
/// The channel count of every produced audio file.
pub const CHANNELS: u32 = 2;

/// One transcode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub channels: u32,
}

impl TranscodeJob {
    /// A stereo job at the standard sample rate.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, bitrate_kbps: u32) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            bitrate_kbps,
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        }
    }
}

/// An external audio transcoder.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether the tool can be run on this host.
    async fn available(&self) -> bool;

    /// Runs the job. A non-zero exit is not an error here: the caller judges
    /// success by the presence of the output file.
    async fn transcode(&self, job: &TranscodeJob) -> Result<ProcessOutput>;

    /// A short name for logs and error messages.
    fn name(&self) -> String;
}

/// The ffmpeg command line tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The arguments ffmpeg is called with for `job`.
    pub fn arguments(job: &TranscodeJob) -> Vec<String> {
        vec![
            "-i".to_string(),
            job.input.display().to_string(),
            "-ar".to_string(),
            job.sample_rate.to_string(),
            "-ab".to_string(),
            format!("{}k", job.bitrate_kbps),
            "-ac".to_string(),
            job.channels.to_string(),
            job.output.display().to_string(),
        ]
    }

    fn executor(&self, args: Vec<String>) -> Executor {
        Executor {
            executable_path: self.binary.clone(),
            timeout: None,
            args,
        }
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn available(&self) -> bool {
        match self.executor(vec!["-version".to_string()]).execute().await {
            Ok(output) => output.success(),
            Err(e) => {
                log::debug!("{:?} could not be run: {}", self.binary, e);
                false
            }
        }
    }

    async fn transcode(&self, job: &TranscodeJob) -> Result<ProcessOutput> {
        log::info!("Transcoding {:?} into {:?}", job.input, job.output);

        self.executor(Self::arguments(job)).execute().await
    }

    fn name(&self) -> String {
        self.binary.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let job = TranscodeJob::new("videos/in.mp4", "videos/out.mp3", 192);

        assert_eq!(
            Ffmpeg::arguments(&job),
            vec![
                "-i",
                "videos/in.mp4",
                "-ar",
                "44100",
                "-ab",
                "192k",
                "-ac",
                "2",
                "videos/out.mp3"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let ffmpeg = Ffmpeg::new("surely-not-an-installed-ffmpeg");
        assert!(!ffmpeg.available().await);
        assert_eq!(ffmpeg.name(), "surely-not-an-installed-ffmpeg");
    }
}
