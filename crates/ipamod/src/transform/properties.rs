//! Bundle identity rewrites on the main `Info.plist`.

use crate::config::{Config, BUNDLE_DISPLAY_NAME_KEY, BUNDLE_ID_KEY, BUNDLE_NAME_KEY};
use crate::error::MAX_BUNDLE_NAME_LEN;
use crate::manifest::{Manifest, BUNDLE_DISPLAY_NAME, BUNDLE_IDENTIFIER, BUNDLE_NAME};
use crate::{Error, Result};
use tracing::info;

/// `(manifest key, config key)` pairs, applied in this order.
pub const BUNDLE_PROPERTIES: [(&str, &str); 3] = [
    (BUNDLE_IDENTIFIER, BUNDLE_ID_KEY),
    (BUNDLE_NAME, BUNDLE_NAME_KEY),
    (BUNDLE_DISPLAY_NAME, BUNDLE_DISPLAY_NAME_KEY),
];

/// A manifest key that was overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub key: &'static str,
    pub value: String,
}

/// Overwrite the identity keys of `manifest` with the values present in `config`.
///
/// Keys absent from the configuration are left untouched. Rewrites are applied
/// in [`BUNDLE_PROPERTIES`] order, so a failure leaves earlier rewrites in place.
///
/// # Errors
///
/// Returns [`Error::BundleNameTooLong`] if the new `CFBundleName` has
/// [`MAX_BUNDLE_NAME_LEN`] characters or more, and [`Error::InvalidConfig`] if
/// a configured value is not a string.
pub fn apply_bundle_properties(
    manifest: &mut Manifest,
    config: &Config,
) -> Result<Vec<PropertyChange>> {
    let mut changes = Vec::new();

    for (plist_key, config_key) in BUNDLE_PROPERTIES {
        let Some(value) = config.bundle_property(config_key)? else {
            continue;
        };

        if plist_key == BUNDLE_NAME {
            let len = value.chars().count();
            if len >= MAX_BUNDLE_NAME_LEN {
                return Err(Error::BundleNameTooLong {
                    value: value.to_string(),
                    len,
                });
            }
        }

        manifest.set_string(plist_key, value);
        info!("- Modifying Info.plist key {:<19} to {}", plist_key, value);

        changes.push(PropertyChange {
            key: plist_key,
            value: value.to_string(),
        });
    }

    Ok(changes)
}
