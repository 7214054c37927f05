//! IPA modification pipeline.
//!
//! [`Modifier`] runs the four stages of a modification in strict sequence:
//!
//! 1. load the JSON configuration,
//! 2. unpack the IPA into `<name>_tmp/` next to it and load the app manifest,
//! 3. apply the [transformations](crate::transform),
//! 4. write the manifest back and pack the tree as `<name>_mod.ipa`.
//!
//! The working directory is left on disk unless [`Modifier::cleanup`] is set.

use crate::config::Config;
use crate::ipa::{find_app_bundle, ArchiveCodec, CompressionLevel, ZipCodec};
use crate::manifest::{Manifest, ManifestCodec, PlistCodec, INFO_PLIST};
use crate::transform::{self, TransformReport};
use crate::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const WORK_DIR_SUFFIX: &str = "_tmp";
const IPA_EXTENSION: &str = ".ipa";
const OUTPUT_SUFFIX: &str = "_mod.ipa";
const STAGING_EXTENSION: &str = ".zip";

/// Working directory for `ipa_path`: `<parent>/<stem>_tmp`.
pub fn work_dir_for(ipa_path: &Path) -> PathBuf {
    let stem = ipa_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    ipa_path.with_file_name(format!("{stem}{WORK_DIR_SUFFIX}"))
}

/// Output archive for `ipa_path`: a trailing `.ipa` becomes `_mod.ipa`.
///
/// Names without the `.ipa` extension get `_mod.ipa` appended, so the output
/// never replaces the input.
pub fn output_path_for(ipa_path: &Path) -> PathBuf {
    let name = ipa_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(IPA_EXTENSION).unwrap_or(&name);

    ipa_path.with_file_name(format!("{base}{OUTPUT_SUFFIX}"))
}

/// Unpacked IPA state shared by the transform and pack stages.
#[derive(Debug, Clone)]
pub struct UnpackedIpa {
    pub work_dir: PathBuf,
    pub bundle_dir: PathBuf,
    pub manifest: Manifest,
}

impl UnpackedIpa {
    pub fn manifest_path(&self) -> PathBuf {
        self.bundle_dir.join(INFO_PLIST)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The packed `_mod.ipa` file.
    pub output: PathBuf,
    /// The working directory, removed if cleanup was requested.
    pub work_dir: PathBuf,
    pub changes: TransformReport,
}

/// IPA modifier with builder pattern API.
///
/// # Example
///
/// ```no_run
/// use ipamod::Modifier;
///
/// let outcome = Modifier::new("MyApp.ipa", "config.json")
///     .compression_level(9)
///     .cleanup(true)
///     .run()?;
/// # Ok::<(), ipamod::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Modifier<A = ZipCodec, M = PlistCodec> {
    ipa_path: PathBuf,
    config_path: PathBuf,
    archive_codec: A,
    manifest_codec: M,
    cleanup: bool,
}

impl Modifier {
    /// Create a modifier using ZIP and property list codecs.
    pub fn new(ipa_path: impl AsRef<Path>, config_path: impl AsRef<Path>) -> Self {
        Self::with_codecs(ipa_path, config_path, ZipCodec::default(), PlistCodec)
    }

    /// Set ZIP compression level for the output IPA (0-9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.archive_codec = ZipCodec::new(CompressionLevel::new(level));
        self
    }
}

impl<A: ArchiveCodec, M: ManifestCodec> Modifier<A, M> {
    /// Create a modifier with explicit codecs.
    pub fn with_codecs(
        ipa_path: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
        archive_codec: A,
        manifest_codec: M,
    ) -> Self {
        Self {
            ipa_path: ipa_path.as_ref().to_path_buf(),
            config_path: config_path.as_ref().to_path_buf(),
            archive_codec,
            manifest_codec,
            cleanup: false,
        }
    }

    /// Remove the working directory after a successful pack.
    ///
    /// Off by default: the working directory is kept after the run.
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn work_dir(&self) -> PathBuf {
        work_dir_for(&self.ipa_path)
    }

    pub fn output_path(&self) -> PathBuf {
        output_path_for(&self.ipa_path)
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Any stage error ends the run. Side effects of completed steps (the
    /// working directory, eagerly written plugin manifests) stay on disk, but
    /// no output archive is produced unless the pack stage is reached.
    pub fn run(&self) -> Result<Outcome> {
        let config = Config::load(&self.config_path)?;

        let mut unpacked = self.unpack()?;
        info!("Loaded IPA {}", unpacked.manifest.summary());

        let changes = transform::apply(
            &mut unpacked.manifest,
            &self.manifest_codec,
            &unpacked.bundle_dir,
            &config,
        )?;

        let output = self.pack(&unpacked)?;

        if self.cleanup {
            fs::remove_dir_all(&unpacked.work_dir)?;
            debug!("Removed {}", unpacked.work_dir.display());
        }

        Ok(Outcome {
            output,
            work_dir: unpacked.work_dir,
            changes,
        })
    }

    /// Unpack the IPA into its working directory and load the app manifest.
    pub fn unpack(&self) -> Result<UnpackedIpa> {
        info!("Unpacking IPA");

        let work_dir = self.work_dir();
        self.archive_codec.unpack(&self.ipa_path, &work_dir)?;

        let bundle_dir = find_app_bundle(&work_dir)?;
        debug!("Found app bundle {}", bundle_dir.display());

        let manifest = self.manifest_codec.read(&bundle_dir.join(INFO_PLIST))?;

        Ok(UnpackedIpa {
            work_dir,
            bundle_dir,
            manifest,
        })
    }

    /// Write the app manifest back and pack the working directory.
    ///
    /// Returns the path of the packed IPA. An existing file at that path is
    /// replaced.
    pub fn pack(&self, unpacked: &UnpackedIpa) -> Result<PathBuf> {
        self.manifest_codec
            .write(&unpacked.manifest_path(), &unpacked.manifest)?;

        let output = self.output_path();
        let pack_error = |e: std::io::Error| Error::ArchivePack {
            archive: output.clone(),
            reason: e.to_string(),
        };

        if output.exists() {
            fs::remove_file(&output).map_err(pack_error)?;
        }

        let mut staging = OsString::from(output.as_os_str());
        staging.push(STAGING_EXTENSION);
        let staging = PathBuf::from(staging);

        self.archive_codec.pack(&unpacked.work_dir, &staging)?;
        fs::rename(&staging, &output).map_err(pack_error)?;

        info!(
            "Packed IPA to {}",
            output
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default()
        );

        Ok(output)
    }
}
