//! IPA handling module.
//!
//! Provides unpacking into a working directory and repacking of the whole
//! working tree, behind the [`ArchiveCodec`] seam.

pub mod archive;
pub mod extract;

pub use archive::{create_archive, CompressionLevel};
pub use extract::{extract_archive, find_app_bundle, PAYLOAD_DIR};

use crate::{Error, Result};
use std::path::Path;

/// Expands and compresses archive files.
pub trait ArchiveCodec {
    /// Expand `archive` into `dest_dir`, keeping the full entry tree.
    fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<()>;

    /// Compress everything under `source_dir` into a new file at `archive`.
    fn pack(&self, source_dir: &Path, archive: &Path) -> Result<()>;
}

impl<T: ArchiveCodec + ?Sized> ArchiveCodec for &T {
    fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        (**self).unpack(archive, dest_dir)
    }

    fn pack(&self, source_dir: &Path, archive: &Path) -> Result<()> {
        (**self).pack(source_dir, archive)
    }
}

/// [`ArchiveCodec`] for ZIP-based IPA files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec {
    compression_level: CompressionLevel,
}

impl ZipCodec {
    pub fn new(compression_level: CompressionLevel) -> Self {
        Self { compression_level }
    }
}

impl ArchiveCodec for ZipCodec {
    fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        extract_archive(archive, dest_dir).map_err(|e| Error::ArchiveUnpack {
            archive: archive.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn pack(&self, source_dir: &Path, archive: &Path) -> Result<()> {
        create_archive(source_dir, archive, self.compression_level).map_err(|e| {
            Error::ArchivePack {
                archive: archive.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }
}
