//! Error types for IPA modification.
//!
//! This module defines the [`enum@Error`] enum covering every failure of the
//! unpack, transform and pack stages, and the [`Severity`] tag that tells a
//! caller whether a failure is an expected soft failure or a hard abort.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use std::path::PathBuf;
use thiserror::Error;

/// Maximum length (exclusive) accepted for `CFBundleName`.
pub const MAX_BUNDLE_NAME_LEN: usize = 16;

/// How a failed run should be treated by the caller.
///
/// # Examples
///
/// ```
/// use ipamod::{Error, Severity};
///
/// let err = Error::PluginNotFound("Widget.appex".into());
/// assert_eq!(err.severity(), Severity::Recoverable);
///
/// let err = Error::BundleNameTooLong { value: "A very long app name".into(), len: 20 };
/// assert_eq!(err.severity(), Severity::Fatal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected failure. Report it in one line and exit with a failure status.
    Recoverable,

    /// The run must stop immediately and never reach the pack stage.
    Fatal,

    /// A failure the pipeline does not anticipate, such as a raw I/O error.
    Unexpected,
}

/// Error type for IPA modification.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Use [`Error::severity`] to decide how to surface a failure.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed outside of any codec.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The configuration file is not a well-formed JSON object.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A recognised configuration key holds a value of the wrong shape.
    #[error("Invalid configuration value for `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// Extracting the input archive failed.
    #[error("Failed to unpack {}: {reason}", archive.display())]
    ArchiveUnpack { archive: PathBuf, reason: String },

    /// No application bundle directory exists under `Payload/`.
    #[error("Failed to detect app bundle inside {}", .0.display())]
    BundleNotFound(PathBuf),

    /// A property list could not be decoded.
    #[error("Failed to parse manifest {}: {reason}", path.display())]
    ManifestParse { path: PathBuf, reason: String },

    /// A property list could not be encoded or written.
    #[error("Failed to write manifest {}: {reason}", path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    /// A configured plugin has no `Info.plist` inside `PlugIns/`.
    #[error("Plugin plist was missing for {0}")]
    PluginNotFound(String),

    /// Writing or renaming the output archive failed.
    #[error("Failed to pack {}: {reason}", archive.display())]
    ArchivePack { archive: PathBuf, reason: String },

    /// `CFBundleName` replacement is too long to be accepted.
    #[error(
        "Invalid length of CFBundleName ({len}), must be < {max}: {value}",
        max = MAX_BUNDLE_NAME_LEN
    )]
    BundleNameTooLong { value: String, len: usize },
}

impl Error {
    /// Classify this error for the caller.
    pub fn severity(&self) -> Severity {
        match self {
            Error::BundleNameTooLong { .. } => Severity::Fatal,
            Error::Io(_) | Error::Zip(_) => Severity::Unexpected,
            Error::ConfigParse(_)
            | Error::InvalidConfig { .. }
            | Error::ArchiveUnpack { .. }
            | Error::BundleNotFound(_)
            | Error::ManifestParse { .. }
            | Error::ManifestWrite { .. }
            | Error::PluginNotFound(_)
            | Error::ArchivePack { .. } => Severity::Recoverable,
        }
    }

    /// Shorthand for `severity() == Severity::Recoverable`.
    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }

    pub(crate) fn invalid_config(key: &str, reason: impl ToString) -> Self {
        Error::InvalidConfig {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.severity(), Severity::Unexpected);

        let missing = Error::BundleNotFound(PathBuf::from("work/Payload"));
        assert!(missing.is_recoverable());

        let too_long = Error::BundleNameTooLong {
            value: "SixteenCharsLong".into(),
            len: 16,
        };
        assert_eq!(too_long.severity(), Severity::Fatal);
        assert!(!too_long.is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::PluginNotFound("Share.appex".into());
        assert_eq!(err.to_string(), "Plugin plist was missing for Share.appex");

        let err = Error::invalid_config("plugins", "expected a sequence");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for `plugins`: expected a sequence"
        );

        let err = Error::BundleNameTooLong {
            value: "ABCDEFGHIJKLMNOPQ".into(),
            len: 17,
        };
        assert!(err.to_string().contains("must be < 16"));
    }

    #[test]
    fn test_config_parse_from_json_error() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::ConfigParse(_)));
        assert!(err.is_recoverable());
    }
}
