use std::path::{Path, PathBuf};

use crate::config::ExtensionConfig;

fn is_help_for(path: &Path, stem: &str, ext_cfg: &ExtensionConfig) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    file_name.starts_with(stem) && ext_cfg.is_help(ext)
}

/// First help artifact in `directory` whose file name starts with `stem`.
///
/// Entries are taken in raw directory-listing order, which differs between
/// platforms and filesystems: with several candidates (`Pump.chm`,
/// `PumpDriver.chm`) the one returned is not guaranteed to be the same
/// everywhere. An unreadable directory yields `None`.
pub fn find_help(stem: &str, directory: &Path, ext_cfg: &ExtensionConfig) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(directory) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(dir = %directory.display(), error = %e, "cannot list directory for help lookup");
            return None;
        }
    };

    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .find(|p| is_help_for(p, stem, ext_cfg))
}

/// Same lookup over a listing the caller already holds (first match wins).
pub fn find_help_in(stem: &str, listing: &[PathBuf], ext_cfg: &ExtensionConfig) -> Option<PathBuf> {
    listing.iter().find(|p| is_help_for(p, stem, ext_cfg)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, "").unwrap();
        p
    }

    #[test]
    fn absent_when_no_file_shares_the_prefix() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Other.chm");
        touch(tmp.path(), "Pump.hsl");
        assert_eq!(find_help("Pump", tmp.path(), &ExtensionConfig::default()), None);
    }

    #[test]
    fn single_qualifying_file_is_found() {
        let tmp = TempDir::new().unwrap();
        let chm = touch(tmp.path(), "Pump_Help.CHM");
        touch(tmp.path(), "Pump.hsl");
        touch(tmp.path(), "Pump.txt");
        assert_eq!(find_help("Pump", tmp.path(), &ExtensionConfig::default()), Some(chm));
    }

    #[test]
    fn missing_directory_yields_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_help("Pump", &tmp.path().join("nope"), &ExtensionConfig::default()), None);
    }

    #[test]
    fn listing_lookup_takes_first_in_given_order() {
        let dir = Path::new("/lib");
        let listing = vec![
            dir.join("Arm.hsl"),
            dir.join("ArmDriver.chm"),
            dir.join("Arm.chm"),
        ];
        let ext = ExtensionConfig::default();
        assert_eq!(find_help_in("Arm", &listing, &ext), Some(dir.join("ArmDriver.chm")));
        assert_eq!(find_help_in("Pump", &listing, &ext), None);
    }
}
