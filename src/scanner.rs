use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ScanConfig;
use crate::error::IndexError;

/// Compile the exclude list into walker overrides. A pattern that does not
/// parse is logged and left out; the rest of the list still applies.
fn excluded_dir_overrides(root: &Path, exclude_dir_names: &[String]) -> Override {
    let mut ob = OverrideBuilder::new(root);

    // Exclude both the directory entry and its descendants, otherwise the
    // walker still descends into the directory.
    for d in exclude_dir_names {
        let d = d.trim().trim_matches('/');
        if d.is_empty() {
            continue;
        }
        for glob in [format!("!**/{d}"), format!("!**/{d}/**")] {
            if let Err(e) = ob.add(&glob) {
                tracing::warn!(pattern = d, error = %e, "skipping bad exclude pattern");
                break;
            }
        }
    }

    ob.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "exclude patterns failed to compile, walking without them");
        Override::empty()
    })
}

/// All regular files of one directory, in file-name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Result of one walk: the non-empty directories plus how many entries the
/// walker could not read.
#[derive(Debug, Default)]
pub struct TreeScan {
    pub listings: Vec<DirListing>,
    pub skipped: usize,
}

/// Walk `root` recursively and group its files by parent directory.
///
/// Directories come out in walk pre-order: a directory always precedes its
/// subdirectories, and siblings are name-sorted. This holds no matter how a
/// subdirectory's name sorts against the files next to it. Directories with no
/// files are dropped. Unreadable entries are logged, counted and skipped.
pub fn scan_tree(root: &Path, opts: &ScanConfig) -> TreeScan {
    let overrides = excluded_dir_overrides(root, &opts.exclude_dir_names);
    let walker = WalkBuilder::new(root)
        .standard_filters(opts.respect_ignore_files)
        .follow_links(opts.follow_links)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut scan = TreeScan::default();
    let mut slot_by_dir: HashMap<PathBuf, usize> = HashMap::new();

    for item in walker {
        let dent = match item {
            Ok(d) => d,
            Err(e) => {
                let err = IndexError::DirectoryRead(e);
                tracing::warn!(error = %err, "skipping unreadable entry");
                scan.skipped += 1;
                continue;
            }
        };

        let Some(ft) = dent.file_type() else {
            continue;
        };

        // The walker yields a directory before anything inside it, so taking
        // the slot here fixes the parent-before-child order.
        let (dir, file) = if ft.is_dir() {
            (dent.into_path(), None)
        } else if ft.is_file() {
            let path = dent.into_path();
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            (dir, Some(path))
        } else {
            continue;
        };

        let listings = &mut scan.listings;
        let slot = *slot_by_dir.entry(dir.clone()).or_insert_with(|| {
            listings.push(DirListing { dir, files: Vec::new() });
            listings.len() - 1
        });
        if let Some(path) = file {
            listings[slot].files.push(path);
        }
    }

    scan.listings.retain(|l| !l.files.is_empty());
    scan
}


/// `path` relative to `base`, falling back to `path` itself when it is not
/// under `base`.
pub fn path_relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
