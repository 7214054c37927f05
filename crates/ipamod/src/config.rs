//! Modification configuration.
//!
//! The configuration is a JSON object read once per run. Only the top-level
//! shape is checked when loading; recognised keys are decoded lazily by the
//! stage that consumes them, and unknown keys are ignored.
//!
//! ```json
//! {
//!   "bundleId": "com.example.app",
//!   "bundleName": "Example",
//!   "bundleDisplayName": "Example App",
//!   "plugins": [{ "name": "Share.appex", "bundleId": "com.example.app.share" }],
//!   "icons": "icons/"
//! }
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the replacement `CFBundleIdentifier`.
pub const BUNDLE_ID_KEY: &str = "bundleId";
/// Key holding the replacement `CFBundleName`.
pub const BUNDLE_NAME_KEY: &str = "bundleName";
/// Key holding the replacement `CFBundleDisplayName`.
pub const BUNDLE_DISPLAY_NAME_KEY: &str = "bundleDisplayName";
/// Key holding the ordered plugin rewrites.
pub const PLUGINS_KEY: &str = "plugins";
/// Key holding the replacement icon directory.
pub const ICONS_KEY: &str = "icons";

/// One plugin whose `CFBundleIdentifier` should be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSpec {
    /// Directory name under `PlugIns/`, e.g. `Share.appex`.
    pub name: String,
    /// New bundle identifier for the plugin.
    pub bundle_id: String,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if the content is not a JSON object, and
    /// [`Error::Io`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_slice(&bytes)
    }

    /// Parse configuration from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let values: Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self { values })
    }

    /// Returns `true` if the configuration has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String value of a bundle property key, if present.
    pub fn bundle_property(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(Error::invalid_config(
                key,
                format!("expected a string, found {other}"),
            )),
        }
    }

    /// Ordered plugin rewrites, if the `plugins` key is present.
    ///
    /// The key must hold an array. Records are decoded one at a time as the
    /// iterator reaches them, so a malformed record fails at its own position.
    pub fn plugins(&self) -> Result<Option<impl Iterator<Item = Result<PluginSpec>> + '_>> {
        let Some(value) = self.values.get(PLUGINS_KEY) else {
            return Ok(None);
        };
        let Value::Array(records) = value else {
            return Err(Error::invalid_config(
                PLUGINS_KEY,
                format!("expected an array, found {value}"),
            ));
        };

        Ok(Some(records.iter().enumerate().map(|(i, record)| {
            PluginSpec::deserialize(record)
                .map_err(|e| Error::invalid_config(&format!("{PLUGINS_KEY}[{i}]"), e))
        })))
    }

    /// Replacement icon directory, if the `icons` key is present.
    pub fn icons(&self) -> Result<Option<PathBuf>> {
        match self.values.get(ICONS_KEY) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(PathBuf::from(s))),
            Some(other) => Err(Error::invalid_config(
                ICONS_KEY,
                format!("expected a directory path, found {other}"),
            )),
        }
    }
}
