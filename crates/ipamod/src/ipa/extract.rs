//! IPA extraction.
//!
//! Expands an IPA archive into a working directory and locates the
//! application bundle under `Payload/`.

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Top-level directory that holds the application bundle.
pub const PAYLOAD_DIR: &str = "Payload";

#[cfg(unix)]
const OWNER_WRITE: u32 = 0o200;

/// Extract every entry of an IPA archive into `dest_dir`.
///
/// The destination is created if needed and is not cleared first; entries
/// already present on disk are overwritten. Directory entries, Unix
/// permissions and symlinks are preserved, except that extracted files always
/// stay writable by their owner.
///
/// # Errors
///
/// Returns [`Error::Zip`] if the archive cannot be read and [`Error::Io`] if
/// writing any entry fails.
pub fn extract_archive(ipa_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<()> {
    let ipa_path = ipa_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    let file = File::open(ipa_path)?;
    let mut archive = ZipArchive::new(file)?;

    fs::create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => {
                warn!("Skipping unsafe archive entry {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        let unix_mode = entry.unix_mode();

        #[cfg(unix)]
        if unix_mode.is_some_and(|mode| (mode & 0o170000) == 0o120000) {
            let mut target = String::new();
            entry.read_to_string(&mut target)?;

            if outpath.symlink_metadata().is_ok() {
                fs::remove_file(&outpath)?;
            }

            std::os::unix::fs::symlink(&target, &outpath)?;
            debug!("Extracted symlink {} -> {}", outpath.display(), target);
            continue;
        }

        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = unix_mode {
                let mode = (mode & 0o7777) | OWNER_WRITE;
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }

        debug!("Extracted {}", outpath.display());
    }

    Ok(())
}

/// Find the application bundle directory inside `<work_dir>/Payload/`.
///
/// The first directory entry in listing order is returned. Listing order is
/// filesystem-defined, so this is only deterministic when `Payload/` holds
/// exactly one directory.
///
/// # Errors
///
/// Returns [`Error::BundleNotFound`] if `Payload/` is missing or contains no
/// directories.
pub fn find_app_bundle(work_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let payload_dir = work_dir.as_ref().join(PAYLOAD_DIR);

    if !payload_dir.is_dir() {
        return Err(Error::BundleNotFound(payload_dir));
    }

    let mut bundles = Vec::new();
    for entry in fs::read_dir(&payload_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            bundles.push(path);
        }
    }

    if bundles.len() > 1 {
        warn!(
            "Found {} directories in {}, using {}",
            bundles.len(),
            payload_dir.display(),
            bundles[0].display()
        );
    }

    bundles
        .into_iter()
        .next()
        .ok_or(Error::BundleNotFound(payload_dir))
}
