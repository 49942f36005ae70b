//! Picks the one file that speaks for each stem of a directory.
//!
//! A library unit usually exists in several forms side by side
//! (`Foo.hsl`, `Foo.hs_`, `Foo.hsi`). Only one of them is indexed so the same
//! function set is never reported twice.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ExtensionConfig;
use crate::extractor::{extract_file, Signature, SignatureExtractor};

/// Winner for one stem: the parsed file and what it yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStem {
    pub stem: String,
    pub source_path: PathBuf,
    pub signatures: Vec<Signature>,
}

/// Stem and extension of `path`, or `None` for files the resolver never looks at.
fn split_eligible<'a>(path: &'a Path, ext_cfg: &ExtensionConfig) -> Option<(&'a str, usize)> {
    let file_name = path.file_name()?.to_str()?;
    if ext_cfg.is_reserved(file_name) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    let rank = ext_cfg.rank(ext)?;
    Some((stem, rank))
}

pub struct StemResolver<'a> {
    extensions: &'a ExtensionConfig,
    extractor: &'a dyn SignatureExtractor,
}

impl<'a> StemResolver<'a> {
    pub fn new(extensions: &'a ExtensionConfig, extractor: &'a dyn SignatureExtractor) -> Self {
        Self { extensions, extractor }
    }

    /// Resolve every stem in one directory listing.
    ///
    /// Candidates are tried primary first, then the textual extensions in
    /// configured order; the first one that yields signatures wins and the rest
    /// are never read. When none yields anything the highest-precedence file
    /// still resolves, with no signatures. Stems keep the order in which they
    /// first appear in `entries`.
    pub fn resolve(&self, entries: &[PathBuf]) -> Vec<ResolvedStem> {
        let mut order: Vec<&str> = Vec::new();
        let mut candidates: HashMap<&str, Vec<(usize, &Path)>> = HashMap::new();

        for path in entries {
            let Some((stem, rank)) = split_eligible(path, self.extensions) else {
                continue;
            };
            let group = candidates.entry(stem).or_default();
            if group.is_empty() {
                order.push(stem);
            }
            group.push((rank, path.as_path()));
        }

        order
            .into_iter()
            .filter_map(|stem| {
                let mut group = candidates.remove(stem)?;
                group.sort_by_key(|(rank, path)| (*rank, *path));
                Some(self.resolve_group(stem, &group))
            })
            .collect()
    }

    fn resolve_group(&self, stem: &str, group: &[(usize, &Path)]) -> ResolvedStem {
        let fallback = group[0].1;

        for (_, path) in group {
            let signatures = match extract_file(self.extractor, path) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "file contributes no records");
                    continue;
                }
            };
            if !signatures.is_empty() {
                tracing::debug!(stem, winner = %path.display(), count = signatures.len(), "resolved stem");
                return ResolvedStem {
                    stem: stem.to_string(),
                    source_path: path.to_path_buf(),
                    signatures,
                };
            }
        }

        tracing::debug!(stem, winner = %fallback.display(), "stem has no signatures");
        ResolvedStem {
            stem: stem.to_string(),
            source_path: fallback.to_path_buf(),
            signatures: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PatternExtractor;
    use tempfile::TempDir;

    const ONE_FN: &str = "function FromHsl() variable\n{\n}\n";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    fn listing(dir: &Path) -> Vec<PathBuf> {
        let mut v: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        v.sort();
        v
    }

    fn resolve(dir: &Path) -> Vec<ResolvedStem> {
        let ext = ExtensionConfig::default();
        let extractor = PatternExtractor::default();
        StemResolver::new(&ext, &extractor).resolve(&listing(dir))
    }

    #[test]
    fn primary_beats_textual_forms() {
        let tmp = TempDir::new().unwrap();
        let hsl = write(tmp.path(), "Pump.hsl", ONE_FN);
        write(tmp.path(), "Pump.hs_", "function FromHs_() variable\n{\n}\n");
        write(tmp.path(), "Pump.hsi", "function FromHsi() variable\n{\n}\n");

        let resolved = resolve(tmp.path());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].stem, "Pump");
        assert_eq!(resolved[0].source_path, hsl);
        assert_eq!(resolved[0].signatures[0].name, "FromHsl");
    }

    #[test]
    fn compiled_adjacent_form_beats_interface() {
        let tmp = TempDir::new().unwrap();
        let hs_ = write(tmp.path(), "Arm.hs_", "function FromHs_() variable\n{\n}\n");
        write(tmp.path(), "Arm.hsi", "function FromHsi() variable\n{\n}\n");

        let resolved = resolve(tmp.path());
        assert_eq!(resolved[0].source_path, hs_);
        assert_eq!(resolved[0].signatures[0].name, "FromHs_");
    }

    #[test]
    fn empty_primary_defers_to_textual_form() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Lib.hsl", "// encrypted or stub\n");
        let hsi = write(tmp.path(), "Lib.hsi", "function Api(a) Num\n{\n}\n");

        let resolved = resolve(tmp.path());
        assert_eq!(resolved[0].source_path, hsi);
        assert_eq!(resolved[0].signatures.len(), 1);
    }

    #[test]
    fn all_empty_resolves_to_primary_without_records() {
        let tmp = TempDir::new().unwrap();
        let hsl = write(tmp.path(), "Empty.hsl", "");
        write(tmp.path(), "Empty.hsi", "// nothing\n");

        let resolved = resolve(tmp.path());
        assert_eq!(resolved[0].source_path, hsl);
        assert!(resolved[0].signatures.is_empty());
    }

    #[test]
    fn reserved_and_foreign_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "~Pump.hsl", ONE_FN);
        write(tmp.path(), "Pump.chm", "help");
        write(tmp.path(), "notes.txt", ONE_FN);

        assert!(resolve(tmp.path()).is_empty());
    }

    #[test]
    fn stems_keep_listing_order_and_resolution_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "B.hsi", ONE_FN);
        write(tmp.path(), "A.hsl", ONE_FN);
        write(tmp.path(), "B.hsl", ONE_FN);

        let first = resolve(tmp.path());
        let stems: Vec<_> = first.iter().map(|r| r.stem.as_str()).collect();
        assert_eq!(stems, ["A", "B"]);
        assert_eq!(first[1].source_path, tmp.path().join("B.hsl"));
        assert_eq!(first, resolve(tmp.path()));
    }

    #[test]
    fn extension_match_ignores_case() {
        let tmp = TempDir::new().unwrap();
        let upper = write(tmp.path(), "Tip.HSL", ONE_FN);
        write(tmp.path(), "Tip.hsi", "function Other() Num\n{\n}\n");

        let resolved = resolve(tmp.path());
        assert_eq!(resolved[0].source_path, upper);
    }
}
