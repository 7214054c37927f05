//! Plugin (app extension) identifier rewrites.

use crate::config::Config;
use crate::manifest::{ManifestCodec, BUNDLE_IDENTIFIER, INFO_PLIST};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory inside the app bundle holding plugin bundles.
pub const PLUGINS_DIR: &str = "PlugIns";

/// A plugin whose identifier was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginChange {
    pub name: String,
    pub bundle_id: String,
}

/// Path of a plugin's manifest inside `bundle_dir`.
pub fn plugin_manifest_path(bundle_dir: &Path, plugin_name: &str) -> PathBuf {
    bundle_dir
        .join(PLUGINS_DIR)
        .join(plugin_name)
        .join(INFO_PLIST)
}

/// Rewrite `CFBundleIdentifier` of every configured plugin, in order.
///
/// Each plugin manifest is written back as soon as it is modified. Processing
/// stops at the first plugin without a manifest or with a malformed record;
/// plugins handled before it stay rewritten on disk.
///
/// # Errors
///
/// Returns [`Error::PluginNotFound`] for a missing plugin manifest,
/// [`Error::InvalidConfig`] for a malformed record and any codec error from
/// reading or writing a manifest.
pub fn apply_plugins<M>(codec: &M, bundle_dir: &Path, config: &Config) -> Result<Vec<PluginChange>>
where
    M: ManifestCodec + ?Sized,
{
    let Some(plugins) = config.plugins()? else {
        return Ok(Vec::new());
    };

    let mut changes = Vec::new();

    for plugin in plugins {
        let plugin = plugin?;
        let plist_path = plugin_manifest_path(bundle_dir, &plugin.name);

        if !plist_path.exists() {
            return Err(Error::PluginNotFound(plugin.name));
        }

        let mut manifest = codec.read(&plist_path)?;
        manifest.set_string(BUNDLE_IDENTIFIER, plugin.bundle_id.as_str());

        info!("- Modifying plugin {}", plugin.name);
        info!(
            "  - Info.plist key {:<19} to {}",
            BUNDLE_IDENTIFIER, plugin.bundle_id
        );

        codec.write(&plist_path, &manifest)?;

        changes.push(PluginChange {
            name: plugin.name,
            bundle_id: plugin.bundle_id,
        });
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PlistCodec;
    use std::fs;
    use tempfile::TempDir;

    const PLUGIN_PLIST: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.test.app.plugin</string>
    <key>NSExtension</key>
    <dict>
        <key>NSExtensionPointIdentifier</key>
        <string>com.apple.share-services</string>
    </dict>
</dict>
</plist>"#;

    fn create_bundle(dir: &Path, plugins: &[&str]) -> PathBuf {
        let bundle = dir.join("Payload/Test.app");
        for name in plugins {
            let plugin_dir = bundle.join(PLUGINS_DIR).join(name);
            fs::create_dir_all(&plugin_dir).unwrap();
            fs::write(plugin_dir.join(INFO_PLIST), PLUGIN_PLIST).unwrap();
        }
        fs::create_dir_all(&bundle).unwrap();
        bundle
    }

    fn identifier(bundle: &Path, plugin: &str) -> String {
        let manifest = PlistCodec
            .read(&plugin_manifest_path(bundle, plugin))
            .unwrap();
        manifest.get_str(BUNDLE_IDENTIFIER).unwrap().to_string()
    }

    #[test]
    fn test_no_plugins_key_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &[]);

        let changes = apply_plugins(&PlistCodec, &bundle, &Config::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_plugins_rewritten_and_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &["Share.appex", "Widget.appex"]);
        let config = Config::from_slice(
            br#"{"plugins": [
                {"name": "Share.appex", "bundleId": "com.new.app.share"},
                {"name": "Widget.appex", "bundleId": "com.new.app.widget"}
            ]}"#,
        )
        .unwrap();

        let changes = apply_plugins(&PlistCodec, &bundle, &config).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(identifier(&bundle, "Share.appex"), "com.new.app.share");
        assert_eq!(identifier(&bundle, "Widget.appex"), "com.new.app.widget");

        // Other keys survive the rewrite
        let manifest = PlistCodec
            .read(&plugin_manifest_path(&bundle, "Share.appex"))
            .unwrap();
        assert!(manifest.entries().contains_key("NSExtension"));
    }

    #[test]
    fn test_missing_plugin_first_stops_everything() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &["Share.appex"]);
        let config = Config::from_slice(
            br#"{"plugins": [
                {"name": "Missing.appex", "bundleId": "com.new.app.missing"},
                {"name": "Share.appex", "bundleId": "com.new.app.share"}
            ]}"#,
        )
        .unwrap();

        let result = apply_plugins(&PlistCodec, &bundle, &config);

        assert!(matches!(result, Err(Error::PluginNotFound(ref name)) if name == "Missing.appex"));
        assert_eq!(identifier(&bundle, "Share.appex"), "com.test.app.plugin");
    }

    #[test]
    fn test_missing_plugin_last_keeps_earlier_rewrites() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &["Share.appex"]);
        let config = Config::from_slice(
            br#"{"plugins": [
                {"name": "Share.appex", "bundleId": "com.new.app.share"},
                {"name": "Missing.appex", "bundleId": "com.new.app.missing"}
            ]}"#,
        )
        .unwrap();

        let result = apply_plugins(&PlistCodec, &bundle, &config);

        assert!(matches!(result, Err(Error::PluginNotFound(_))));
        assert_eq!(identifier(&bundle, "Share.appex"), "com.new.app.share");
    }

    #[test]
    fn test_malformed_plugin_record() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &["Share.appex"]);
        let config = Config::from_slice(br#"{"plugins": [{"name": "Share.appex"}]}"#).unwrap();

        let result = apply_plugins(&PlistCodec, &bundle, &config);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_malformed_record_keeps_earlier_rewrites() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = create_bundle(temp_dir.path(), &["Share.appex", "Widget.appex"]);
        let config = Config::from_slice(
            br#"{"plugins": [
                {"name": "Share.appex", "bundleId": "com.new.app.share"},
                {"name": "Widget.appex", "bundleId": 42}
            ]}"#,
        )
        .unwrap();

        let result = apply_plugins(&PlistCodec, &bundle, &config);

        assert!(matches!(result, Err(Error::InvalidConfig { ref key, .. }) if key == "plugins[1]"));
        assert_eq!(identifier(&bundle, "Share.appex"), "com.new.app.share");
        assert_eq!(identifier(&bundle, "Widget.appex"), "com.test.app.plugin");
    }
}
