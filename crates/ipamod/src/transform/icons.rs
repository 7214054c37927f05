//! App icon replacement.
//!
//! Icon sets exported as `AppIcon[-ipad]-<size>[@<scale>x].png` are renamed to
//! the names the bundle expects, e.g. `AppIcon-ipad-76@2x.png` becomes
//! `AppIcon76x76@2x~ipad.png`.

use crate::config::Config;
use crate::Result;
use glob::Pattern;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Files matching this pattern are icon resources.
pub const ICON_GLOB: &str = "AppIcon*.png";

/// Compiled asset catalog copied along with the icons.
pub const ASSET_CATALOG: &str = "Assets.car";

/// Placeholder emitted for an absent scale, removed after dash replacement.
const MISSING_SCALE: &str = "None";

static ICON_PATTERN: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(ICON_GLOB).expect("icon glob is valid"));

static ICON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AppIcon(-ipad)?-([0-9.]+)(@(\d+)x)?\.png").expect("icon name regex is valid")
});

/// Result of an icon replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconReport {
    /// Old icon files deleted from the bundle.
    pub removed: Vec<PathBuf>,
    /// `(source file name, installed file name)` pairs.
    pub installed: Vec<(String, String)>,
    /// Whether `Assets.car` was replaced.
    pub asset_catalog: bool,
}

/// Bundle-internal name for an exported icon file, or `None` if the name does
/// not follow the export convention.
///
/// ```
/// use ipamod::transform::canonical_icon_name;
///
/// assert_eq!(canonical_icon_name("AppIcon-60.png").as_deref(), Some("AppIcon60x60.png"));
/// assert_eq!(
///     canonical_icon_name("AppIcon-ipad-76@2x.png").as_deref(),
///     Some("AppIcon76x76@2x~ipad.png"),
/// );
/// assert_eq!(canonical_icon_name("Icon-60.png"), None);
/// ```
pub fn canonical_icon_name(file_name: &str) -> Option<String> {
    let caps = ICON_NAME_RE.captures(file_name)?;

    let platform = caps.get(1).map_or("", |m| m.as_str());
    let size = &caps[2];
    let scale = caps.get(4).map_or(MISSING_SCALE, |m| m.as_str());

    // Dashes first, then the placeholder.
    let name = format!("AppIcon{size}x{size}@{scale}x{platform}.png")
        .replace('-', "~")
        .replace(&format!("@{MISSING_SCALE}x"), "");

    Some(name)
}

/// Replace the bundle's icons with the ones from the configured icon directory.
///
/// Does nothing and returns `None` when `icons` is not configured. Otherwise
/// every `AppIcon*.png` in `bundle_dir` is deleted, each exported icon is
/// copied in under its [canonical name](canonical_icon_name), and
/// `Assets.car` is copied over if the icon directory has one. A missing icon
/// directory is treated as empty.
pub fn apply_icons(bundle_dir: &Path, config: &Config) -> Result<Option<IconReport>> {
    let Some(icons_dir) = config.icons()? else {
        return Ok(None);
    };

    let mut report = IconReport::default();

    for old_icon in bundle_icons(bundle_dir)? {
        fs::remove_file(&old_icon)?;
        debug!("Removed {}", old_icon.display());
        report.removed.push(old_icon);
    }

    if !icons_dir.is_dir() {
        warn!("Icon directory {} not found", icons_dir.display());
    }

    for source in source_icons(&icons_dir)? {
        let Some(file_name) = source.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(target_name) = canonical_icon_name(file_name) else {
            debug!("Skipping {}", file_name);
            continue;
        };

        fs::copy(&source, bundle_dir.join(&target_name))?;
        debug!("Installed {} as {}", file_name, target_name);
        report.installed.push((file_name.to_string(), target_name));
    }

    let car_file = icons_dir.join(ASSET_CATALOG);
    if car_file.is_file() {
        fs::copy(&car_file, bundle_dir.join(ASSET_CATALOG))?;
        report.asset_catalog = true;
    }

    info!(
        "- Replaced {} icons ({} removed{})",
        report.installed.len(),
        report.removed.len(),
        if report.asset_catalog { ", Assets.car updated" } else { "" }
    );

    Ok(Some(report))
}

/// Entries directly inside `bundle_dir` to delete before installing icons.
///
/// Symlinks are listed as links and never followed.
fn bundle_icons(bundle_dir: &Path) -> Result<Vec<PathBuf>> {
    matching_entries(bundle_dir, |entry| Ok(!entry.file_type()?.is_dir()))
}

/// Files directly inside `icons_dir` to install, following symlinks.
fn source_icons(icons_dir: &Path) -> Result<Vec<PathBuf>> {
    matching_entries(icons_dir, |entry| Ok(entry.path().is_file()))
}

/// Entries directly inside `dir` whose name matches [`ICON_GLOB`] and that
/// pass `keep`, sorted. A missing `dir` has no entries.
fn matching_entries<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&fs::DirEntry) -> io::Result<bool>,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| ICON_PATTERN.matches(name));

        if matches && keep(&entry)? {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
