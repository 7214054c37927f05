//! Bundle transformations.
//!
//! Three steps run in order against the unpacked bundle: identity property
//! rewrites on the in-memory main manifest, plugin identifier rewrites
//! (persisted immediately), and icon replacement. None of them is rolled back
//! if a later step fails.

pub mod icons;
pub mod plugins;
pub mod properties;

pub use icons::{apply_icons, canonical_icon_name, IconReport};
pub use plugins::{apply_plugins, PluginChange};
pub use properties::{apply_bundle_properties, PropertyChange};

use crate::config::Config;
use crate::manifest::{Manifest, ManifestCodec};
use crate::Result;
use std::path::Path;

/// Everything changed by [`apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub properties: Vec<PropertyChange>,
    pub plugins: Vec<PluginChange>,
    pub icons: Option<IconReport>,
}

impl TransformReport {
    /// Returns `true` if no step changed anything.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.plugins.is_empty() && self.icons.is_none()
    }
}

/// Run all transformation steps in order.
pub fn apply<M>(
    manifest: &mut Manifest,
    codec: &M,
    bundle_dir: &Path,
    config: &Config,
) -> Result<TransformReport>
where
    M: ManifestCodec + ?Sized,
{
    let properties = apply_bundle_properties(manifest, config)?;
    let plugins = apply_plugins(codec, bundle_dir, config)?;
    let icons = apply_icons(bundle_dir, config)?;

    Ok(TransformReport {
        properties,
        plugins,
        icons,
    })
}
