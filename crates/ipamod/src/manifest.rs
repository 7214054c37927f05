//! Bundle manifest (`Info.plist`) handling.
//!
//! A [`Manifest`] is an owned, ordered dictionary loaded wholesale from a
//! property list. It remembers which encoding it was decoded from so that
//! [`PlistCodec`] writes it back the same way.

use crate::{Error, Result};
use plist::{Dictionary, Value};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// `CFBundleIdentifier` key.
pub const BUNDLE_IDENTIFIER: &str = "CFBundleIdentifier";
/// `CFBundleName` key.
pub const BUNDLE_NAME: &str = "CFBundleName";
/// `CFBundleDisplayName` key.
pub const BUNDLE_DISPLAY_NAME: &str = "CFBundleDisplayName";
/// `CFBundleShortVersionString` key.
pub const BUNDLE_SHORT_VERSION: &str = "CFBundleShortVersionString";

/// Manifest file name inside every bundle.
pub const INFO_PLIST: &str = "Info.plist";

const BINARY_PLIST_MAGIC: &[u8] = b"bplist";

/// Property list encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    /// XML property list.
    #[default]
    Xml,
    /// Binary property list (`bplist00`).
    Binary,
}

impl ManifestFormat {
    /// Detect the encoding from the leading bytes of a property list.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(BINARY_PLIST_MAGIC) {
            ManifestFormat::Binary
        } else {
            ManifestFormat::Xml
        }
    }
}

/// In-memory bundle manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Dictionary,
    format: ManifestFormat,
}

impl Manifest {
    /// Create a manifest from an existing dictionary.
    pub fn new(entries: Dictionary, format: ManifestFormat) -> Self {
        Self { entries, format }
    }

    /// Decode a manifest from property list bytes (XML or binary).
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, String> {
        let value = Value::from_reader(Cursor::new(data)).map_err(|e| e.to_string())?;
        let entries = value
            .into_dictionary()
            .ok_or_else(|| "root object is not a dictionary".to_string())?;

        Ok(Self {
            entries,
            format: ManifestFormat::detect(data),
        })
    }

    /// Encode the manifest in its original encoding.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, plist::Error> {
        let root = Value::Dictionary(self.entries.clone());
        let mut buf = Vec::new();
        match self.format {
            ManifestFormat::Xml => root.to_writer_xml(&mut buf)?,
            ManifestFormat::Binary => root.to_writer_binary(&mut buf)?,
        }
        Ok(buf)
    }

    pub fn format(&self) -> ManifestFormat {
        self.format
    }

    pub fn entries(&self) -> &Dictionary {
        &self.entries
    }

    /// String value stored under `key`, if any.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_string)
    }

    /// Store a string under `key`, replacing any previous value of any type.
    ///
    /// Returns the previous value.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) -> Option<Value> {
        self.entries
            .insert(key.to_string(), Value::String(value.into()))
    }

    /// One-line `name identifier vversion` description used in progress output.
    pub fn summary(&self) -> String {
        format!(
            "{} {} v{}",
            self.get_str(BUNDLE_NAME).unwrap_or("?"),
            self.get_str(BUNDLE_IDENTIFIER).unwrap_or("?"),
            self.get_str(BUNDLE_SHORT_VERSION).unwrap_or("?"),
        )
    }
}

/// Reads and writes manifests on disk.
pub trait ManifestCodec {
    /// Load the manifest stored at `path`.
    fn read(&self, path: &Path) -> Result<Manifest>;

    /// Replace the manifest stored at `path`.
    fn write(&self, path: &Path, manifest: &Manifest) -> Result<()>;
}

impl<T: ManifestCodec + ?Sized> ManifestCodec for &T {
    fn read(&self, path: &Path) -> Result<Manifest> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        (**self).write(path, manifest)
    }
}

/// [`ManifestCodec`] backed by the `plist` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlistCodec;

impl ManifestCodec for PlistCodec {
    fn read(&self, path: &Path) -> Result<Manifest> {
        let data = fs::read(path).map_err(|e| Error::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Manifest::from_bytes(&data).map_err(|reason| Error::ManifestParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn write(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        let write_error = |reason: String| Error::ManifestWrite {
            path: path.to_path_buf(),
            reason,
        };

        let data = manifest.to_bytes().map_err(|e| write_error(e.to_string()))?;
        fs::write(path, data).map_err(|e| write_error(e.to_string()))
    }
}
