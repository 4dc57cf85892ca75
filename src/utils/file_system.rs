//! Tools for working with the file system.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};

/// The permissions given to downloaded media: owner writable, world readable.
pub const MEDIA_MODE: u32 = 0o644;

/// Whether something exists at `path`.
pub async fn exists(path: impl AsRef<Path>) -> Result<bool> {
    Ok(tokio::fs::try_exists(path).await?)
}

/// Creates a new file at the given destination, or truncates the existing one.
///
/// # Arguments
///
/// * `destination` - The path to create the file at.
pub async fn create_file(destination: impl AsRef<Path>) -> Result<File> {
    let mut open_options = OpenOptions::new();
    open_options.write(true);
    open_options.create(true);
    open_options.truncate(true);

    #[cfg(not(target_os = "windows"))]
    {
        open_options.mode(MEDIA_MODE);
    }

    let file = open_options.open(destination).await?;
    Ok(file)
}

/// Reserves `destination` by creating an empty placeholder there.
///
/// Creation is exclusive, so of two runs racing for the same path only one
/// gets `true`. `false` means the path was already taken.
pub async fn reserve_placeholder(destination: impl AsRef<Path>) -> Result<bool> {
    let destination = destination.as_ref();

    let mut open_options = OpenOptions::new();
    open_options.write(true);
    open_options.create_new(true);

    match open_options.open(destination).await {
        Ok(_) => {
            set_permissions(destination, MEDIA_MODE)?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::IO(e)),
    }
}

/// Creates a directory and its parents. If it already exists, nothing is done.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if the path exists but is not a
/// directory, or cannot be created.
pub fn ensure_dir(destination: impl AsRef<Path>) -> Result<PathBuf> {
    let destination = destination.as_ref();

    std::fs::create_dir_all(destination).map_err(|e| {
        Error::InvalidConfiguration(format!(
            "can neither find nor create directory {:?}: {}",
            destination, e
        ))
    })?;

    Ok(destination.to_path_buf())
}

/// Creates the parent directory of the given destination.
/// If the parent directory already exists, nothing is done.
///
/// # Arguments
///
/// * `destination` - The path to create the parent directory for.
pub fn create_parent_dir(destination: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = destination.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

/// Sets the permission bits of the given file.
#[cfg(not(target_os = "windows"))]
pub fn set_permissions(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path.as_ref())?.permissions();

    perms.set_mode(mode);
    std::fs::set_permissions(path, perms)?;

    Ok(())
}

/// No-op implementation for Windows, which has no permission bits.
#[cfg(target_os = "windows")]
pub fn set_permissions(_path: impl AsRef<Path>, _mode: u32) -> Result<()> {
    Ok(())
}

/// Removes a file and logs any errors.
/// Does not propagate errors to avoid interrupting the execution flow.
///
/// # Returns
///
/// `true` if the file was successfully deleted, `false` otherwise
pub async fn remove_file(file_path: impl AsRef<Path> + std::fmt::Debug) -> bool {
    let result = tokio::fs::remove_file(&file_path).await;

    if let Err(ref e) = result {
        log::warn!("Failed to remove file {:?}: {}", file_path, e);
    }

    result.is_ok()
}
