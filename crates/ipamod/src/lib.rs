//! Patch iOS IPA archives.
//!
//! An IPA is unpacked next to itself, its bundle identity, plugin identifiers
//! and icons are rewritten according to a JSON configuration, and the tree is
//! packed again as `<name>_mod.ipa`.
//!
//! ```no_run
//! use ipamod::Modifier;
//!
//! let outcome = Modifier::new("MyApp.ipa", "config.json").run()?;
//! println!("{}", outcome.output.display());
//! # Ok::<(), ipamod::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod ipa;
pub mod manifest;
pub mod modifier;
pub mod transform;

pub use config::{Config, PluginSpec};
pub use error::{Error, Severity};
pub use ipa::{ArchiveCodec, CompressionLevel, ZipCodec};
pub use manifest::{Manifest, ManifestCodec, ManifestFormat, PlistCodec};
pub use modifier::{output_path_for, work_dir_for, Modifier, Outcome};

pub type Result<T> = std::result::Result<T, Error>;
