use clap::Parser;
use futures_util::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{LevelFilter, error, info, warn};
use std::path::PathBuf;
use tubefetch::{Config, ConfigFile, Fetcher, Ffmpeg, MediaItem, MediaKind, Pipeline};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Clone)]
#[command(name = "tubefetch", version, about)]
pub struct Cli {
    /// Watch URLs of the videos to fetch.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Settings file, instead of the one in the user config directory.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "output-dir", short)]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "logs-dir")]
    pub logs_dir: Option<PathBuf>,

    #[arg(
        long = "quality",
        short,
        value_parser = clap::builder::PossibleValuesParser::new(["highest", "lowest"])
    )]
    pub quality: Option<String>,

    #[arg(
        long = "thumbnail-size",
        value_parser = clap::builder::PossibleValuesParser::new(["small", "large"])
    )]
    pub thumbnail_size: Option<String>,

    #[arg(long = "no-thumbnails", action = clap::ArgAction::SetTrue)]
    pub no_thumbnails: bool,

    /// Convert every video to an audio file.
    #[arg(long = "audio", short, action = clap::ArgAction::SetTrue)]
    pub audio: bool,

    #[arg(
        long = "format",
        short,
        value_parser = clap::builder::PossibleValuesParser::new(["mp3", "wav", "ogg", "mp4"])
    )]
    pub format: Option<String>,

    /// Audio bitrate in kbps.
    #[arg(long = "bitrate", short, value_parser = clap::value_parser!(u32).range(128..=320))]
    pub bitrate: Option<u32>,

    #[arg(long = "log-ffmpeg", action = clap::ArgAction::SetTrue)]
    pub log_ffmpeg: bool,

    #[arg(long = "concurrent-downloads", short, default_value_t = 4)]
    pub concurrent_downloads: usize,

    #[arg(
        long = "verbosity",
        short,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "error", "none", "full"
        ])
    )]
    pub verbosity: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Cli::parse();
    let multi = init_logging(&args.verbosity)?;

    let config = build_config(&args)?;
    let kind = if args.audio {
        MediaKind::Audio
    } else {
        MediaKind::Video
    };
    let pipeline = Pipeline::with_defaults(config)?;

    let items: Vec<MediaItem> = args
        .urls
        .iter()
        .filter_map(|url| match MediaItem::from_url(url) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                None
            }
        })
        .collect();
    if items.is_empty() {
        return Err("None of the given URLs points to a video.".into());
    }

    let total = items.len();
    let bar = multi.add(ProgressBar::new(total as u64));
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let results: Vec<bool> = stream::iter(items)
        .map(|mut item| {
            let pipeline = &pipeline;
            let bar = &bar;
            async move {
                bar.set_message(item.id().to_string());
                let ok = process(pipeline, &mut item, kind).await;
                bar.inc(1);
                ok
            }
        })
        .buffer_unordered(args.concurrent_downloads.max(1))
        .collect()
        .await;

    let failed = results.iter().filter(|ok| !**ok).count();
    bar.finish_with_message(format!("{} done, {} failed", total - failed, failed));

    if failed > 0 {
        return Err(format!("{} of {} videos failed", failed, total).into());
    }
    Ok(())
}

/// Runs one video through the pipeline and reports what came out of it.
async fn process(pipeline: &Pipeline<Fetcher, Ffmpeg>, item: &mut MediaItem, kind: MediaKind) -> bool {
    match pipeline.acquire(item, kind).await {
        Ok(report) => {
            if let Err(e) = item.finish() {
                error!("{}: {}", item.id(), e);
                return false;
            }

            info!("{} '{}': video {}", item.id(), item.title(), report.download.outcome);
            if let Some(conversion) = &report.conversion {
                info!("{} '{}': audio {}", item.id(), item.title(), conversion.outcome);
            }
            for file in report.files() {
                info!("  {}", file.display());
            }
            true
        }
        Err(e) => {
            error!("{} stopped at {}: {}", item.id(), item.state(), e);
            if e.is_retryable() {
                info!("{} may succeed if run again", item.id());
            }
            false
        }
    }
}

fn build_config(args: &Cli) -> Result<Config, BoxError> {
    let file = match &args.config {
        Some(path) if !path.is_file() => {
            return Err(format!("Configuration file {} not found.", path.display()).into());
        }
        Some(path) => ConfigFile::load(path)?,
        None => match ConfigFile::default_path() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        },
    };

    let mut builder = Config::builder().apply_file(&file)?;

    if let Some(dir) = &args.output_dir {
        builder = builder.downloads_dir(dir)?;
    }
    if let Some(dir) = &args.logs_dir {
        builder = builder.logs_dir(dir)?;
    }
    if let Some(quality) = &args.quality {
        builder = builder.quality(quality.parse()?);
    }
    if let Some(size) = &args.thumbnail_size {
        builder = builder.thumbnail_size(size.parse()?);
    }
    if args.no_thumbnails {
        builder = builder.download_thumbnails(false);
    }
    if let Some(format) = &args.format {
        builder = builder.audio_format(format.parse()?);
    }
    if let Some(kbps) = args.bitrate {
        builder = builder.audio_bitrate(kbps)?;
    }
    if args.log_ffmpeg {
        builder = builder.transcode_logging(true);
    }

    Ok(builder.build())
}

/// Installs the logger behind the progress bars so their lines do not interleave.
fn init_logging(verbosity: &str) -> Result<MultiProgress, BoxError> {
    let level = match verbosity {
        "none" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "debug" => LevelFilter::Debug,
        "full" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::from_default_env();
    if level == LevelFilter::Trace {
        builder.filter_level(level);
    } else {
        // Dependencies only speak up when something is wrong.
        builder.filter_level(level.min(LevelFilter::Warn));
        builder.filter_module("tubefetch", level);
    }
    let logger = builder.build();

    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);

    Ok(multi)
}
