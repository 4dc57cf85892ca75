//! Tools for fetching the preview image of a video.

use crate::config::{Endpoints, ThumbnailSize};
use crate::error::{Error, Result};
use crate::fetcher::{Http, is_success};
use crate::utils::file_system;
use std::path::{Path, PathBuf};

/// Finds a thumbnail location that answers with a success status.
///
/// The primary image host is tried first, then its mirror, both with the same
/// identifier and size.
///
/// # Errors
///
/// Returns [`Error::ThumbnailUnavailable`] if neither host serves the image.
pub async fn resolve<H: Http + ?Sized>(
    http: &H,
    endpoints: &Endpoints,
    id: &str,
    size: ThumbnailSize,
) -> Result<String> {
    let candidates = [
        endpoints.thumbnail_url(id, size),
        endpoints.thumbnail_mirror_url(id, size),
    ];

    for location in candidates {
        match http.status(&location).await {
            Ok(code) if is_success(code) => {
                log::debug!("Thumbnail found at {}", location);
                return Ok(location);
            }
            Ok(code) => log::debug!("Thumbnail host answered {} for {}", code, location),
            Err(e) => log::debug!("Thumbnail host unreachable for {}: {}", location, e),
        }
    }

    Err(Error::ThumbnailUnavailable)
}

/// Downloads the thumbnail at `location` to `destination`.
///
/// # Errors
///
/// This function will return an error if the image could not be fetched or written.
pub async fn download<H: Http + ?Sized>(
    http: &H,
    location: &str,
    destination: &Path,
) -> Result<PathBuf> {
    log::debug!("Downloading thumbnail {} to {:?}", location, destination);

    http.get_to_file(location, destination).await?;
    file_system::set_permissions(destination, file_system::MEDIA_MODE)?;

    Ok(destination.to_path_buf())
}
