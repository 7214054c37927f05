//! IPA archive creation.
//!
//! Compresses a whole working directory back into an IPA (ZIP) archive.
//! Entry names are relative to the working directory, so the `Payload/`
//! layout produced by [`extract_archive`](super::extract_archive) is kept.
//!
//! # Examples
//!
//! ```no_run
//! use ipamod::ipa::{create_archive, CompressionLevel};
//!
//! create_archive("MyApp_tmp", "MyApp_mod.ipa", CompressionLevel::DEFAULT)?;
//! # Ok::<(), ipamod::Error>(())
//! ```

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for IPA creation.
///
/// # Examples
///
/// ```
/// use ipamod::ipa::CompressionLevel;
///
/// let custom = CompressionLevel::new(3);
/// assert_eq!(custom.level(), 3);
/// assert_eq!(CompressionLevel::new(42).level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0). Entries are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default compression (level 6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum compression (level 9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(self) -> SimpleFileOptions {
        if self.0 == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.0)))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Compress every entry under `source_dir` into a new archive at `output_path`.
///
/// The root directory itself is not stored; directories, files and symlinks
/// below it are, in sorted order, with Unix permissions preserved. An existing
/// file at `output_path` is truncated.
///
/// # Errors
///
/// Returns [`Error::Io`] if `source_dir` is not a directory or any file cannot
/// be read, and [`Error::Zip`] if the archive cannot be written.
pub fn create_archive(
    source_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<()> {
    let source_dir = source_dir.as_ref();
    let output_path = output_path.as_ref();

    if !source_dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Not a directory: {}", source_dir.display()),
        )));
    }

    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = compression_level.file_options();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            Error::Io(io::Error::other(format!("Failed to walk directory: {e}")))
        })?;

        let path = entry.path();
        let archive_path = archive_entry_name(path, source_dir)?;
        let metadata = fs::symlink_metadata(path)?;

        if metadata.is_dir() {
            zip.add_directory(format!("{archive_path}/"), options)?;
        } else if metadata.file_type().is_symlink() {
            let target = fs::read_link(path)?;
            zip.add_symlink(archive_path.as_str(), target.to_string_lossy(), options)?;
        } else {
            #[cfg(unix)]
            let options = {
                use std::os::unix::fs::PermissionsExt;
                options.unix_permissions(metadata.permissions().mode())
            };

            zip.start_file(archive_path.as_str(), options)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut zip)?;
        }

        debug!("Packed {}", archive_path);
    }

    zip.finish()?.flush()?;

    Ok(())
}

/// Archive entry name for `path`: relative to `root`, `/`-separated.
fn archive_entry_name(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Failed to compute relative path",
        ))
    })?;

    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    Ok(parts.join("/"))
}
