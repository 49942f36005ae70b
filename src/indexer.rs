use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{Config, StemScope};
use crate::error::IndexError;
use crate::extractor::PatternExtractor;
use crate::help::find_help_in;
use crate::resolver::{ResolvedStem, StemResolver};
use crate::scanner::{path_relative_to, scan_tree};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub arguments: String,
    pub return_type: String,
    /// File the signature was scraped from (the resolved file for its stem).
    pub source_path: PathBuf,
    /// `source_path` relative to the indexed root.
    pub relative_path: PathBuf,
    /// 1-indexed line of the `function` keyword in `source_path`.
    pub line_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_path: Option<PathBuf>,
}

/// Every function of one tree, in resolution order. Built per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub root: PathBuf,
    pub functions: Vec<FunctionRecord>,
}

impl Index {
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionRecord> {
        self.functions.iter()
    }

    /// Keep functions whose name contains the filter, ignoring case.
    /// `foo|bar` keeps names matching either term; a blank filter keeps all.
    pub fn filter(&self, filter: &str) -> Index {
        let terms: Vec<String> = filter
            .split('|')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return self.clone();
        }

        let functions = self
            .functions
            .iter()
            .filter(|f| {
                let name = f.name.to_lowercase();
                terms.iter().any(|t| name.contains(t.as_str()))
            })
            .cloned()
            .collect();

        Index {
            root: self.root.clone(),
            functions,
        }
    }
}

struct Resolution {
    resolved: ResolvedStem,
    help_path: Option<PathBuf>,
}

/// Walk `root`, resolve each stem to one file, scrape it and link help.
///
/// Only an invalid root is an error. Unreadable files and directories are
/// logged and contribute nothing.
pub fn build_index(root: &Path, cfg: &Config) -> Result<Index, IndexError> {
    if !root.is_dir() {
        return Err(IndexError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    let extractor = PatternExtractor::new(cfg.extract.brace_mode);
    let resolver = StemResolver::new(&cfg.extensions, &extractor);
    let scan = scan_tree(root, &cfg.scan);
    let listings = scan.listings;

    // Keyed by stem (global scope) or by dir + stem; a replaced entry keeps its slot.
    let mut slots: Vec<Resolution> = Vec::new();
    let mut slot_by_key: HashMap<(Option<PathBuf>, String), usize> = HashMap::new();

    for listing in &listings {
        for resolved in resolver.resolve(&listing.files) {
            let help_path = find_help_in(&resolved.stem, &listing.files, &cfg.extensions);
            let key = match cfg.stem_scope {
                StemScope::Global => (None, resolved.stem.clone()),
                StemScope::Directory => (Some(listing.dir.clone()), resolved.stem.clone()),
            };
            let next = Resolution { resolved, help_path };

            match slot_by_key.get(&key) {
                Some(&slot) => {
                    let prev = &slots[slot];
                    if next.resolved.signatures.is_empty() && !prev.resolved.signatures.is_empty() {
                        tracing::debug!(
                            stem = %next.resolved.stem,
                            kept = %prev.resolved.source_path.display(),
                            "later duplicate stem has no signatures"
                        );
                        continue;
                    }
                    tracing::debug!(
                        stem = %next.resolved.stem,
                        replaced = %prev.resolved.source_path.display(),
                        by = %next.resolved.source_path.display(),
                        "duplicate stem, later wins"
                    );
                    slots[slot] = next;
                }
                None => {
                    slot_by_key.insert(key, slots.len());
                    slots.push(next);
                }
            }
        }
    }

    let functions: Vec<FunctionRecord> = slots
        .into_iter()
        .flat_map(|Resolution { resolved, help_path }| {
            let relative_path = path_relative_to(&resolved.source_path, root);
            let source_path = resolved.source_path;
            resolved.signatures.into_iter().map(move |sig| FunctionRecord {
                name: sig.name,
                arguments: sig.arguments,
                return_type: sig.return_type,
                source_path: source_path.clone(),
                relative_path: relative_path.clone(),
                line_number: sig.line_number,
                help_path: help_path.clone(),
            })
        })
        .collect();

    tracing::info!(
        root = %root.display(),
        directories = listings.len(),
        skipped = scan.skipped,
        functions = functions.len(),
        "index built"
    );

    Ok(Index {
        root: root.to_path_buf(),
        functions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BraceMode;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, content).unwrap();
        p
    }

    fn sig(name: &str) -> String {
        format!("function {name}() variable\n{{\n}}\n")
    }

    #[test]
    fn invalid_roots_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = build_index(&tmp.path().join("missing"), &Config::default()).unwrap_err();
        assert!(err.is_invalid_root());

        let file = write(tmp.path(), "a.hsl", &sig("A"));
        let err = build_index(&file, &Config::default()).unwrap_err();
        assert!(matches!(err, IndexError::InvalidRoot { .. }));
    }

    #[test]
    fn empty_directory_gives_empty_index() {
        let tmp = TempDir::new().unwrap();
        let index = build_index(tmp.path(), &Config::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.root, tmp.path());
    }

    #[test]
    fn records_carry_paths_lines_and_help() {
        let tmp = TempDir::new().unwrap();
        let hsl = write(tmp.path(), "Lib/Pump.hsl", "// Pump\n\nfunction Aspirate(vol) Num\n{\n}\n");
        write(tmp.path(), "Lib/Pump.hsi", &sig("Stale"));
        let chm = write(tmp.path(), "Lib/Pump.chm", "");

        let index = build_index(tmp.path(), &Config::default()).unwrap();
        assert_eq!(
            index.functions,
            vec![FunctionRecord {
                name: "Aspirate".into(),
                arguments: "vol".into(),
                return_type: "Num".into(),
                source_path: hsl,
                relative_path: PathBuf::from("Lib").join("Pump.hsl"),
                line_number: 3,
                help_path: Some(chm),
            }]
        );
    }

    #[test]
    fn global_scope_later_directory_wins_but_keeps_slot() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/Dup.hsl", &sig("Old"));
        write(tmp.path(), "b/Other.hsl", &sig("Other"));
        let newer = write(tmp.path(), "c/Dup.hsl", &sig("New"));

        let index = build_index(tmp.path(), &Config::default()).unwrap();
        let names: Vec<_> = index.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["New", "Other"]);
        assert_eq!(index.functions[0].source_path, newer);
    }

    #[test]
    fn deeper_duplicate_wins_however_the_subdirectory_sorts() {
        for sub in ["a", "A", "z", "Z"] {
            let tmp = TempDir::new().unwrap();
            write(tmp.path(), "Dup.hsl", &sig("Shallow"));
            let deep = write(tmp.path(), &format!("{sub}/Dup.hsl"), &sig("Deep"));

            let index = build_index(tmp.path(), &Config::default()).unwrap();
            let names: Vec<_> = index.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, ["Deep"], "subdirectory {sub:?}");
            assert_eq!(index.functions[0].source_path, deep);
        }
    }

    #[test]
    fn malformed_exclude_pattern_does_not_abort_the_build() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Lib/Pump.hsl", &sig("Aspirate"));

        let mut cfg = Config::default();
        cfg.scan.exclude_dir_names = vec!["[bad".into()];
        let index = build_index(tmp.path(), &cfg).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.functions[0].name, "Aspirate");
    }

    #[test]
    fn later_empty_duplicate_does_not_erase_records() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/Dup.hsl", &sig("Keep"));
        write(tmp.path(), "b/Dup.hsi", "// stub\n");

        let index = build_index(tmp.path(), &Config::default()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.functions[0].name, "Keep");
    }

    #[test]
    fn directory_scope_keeps_same_stem_in_each_directory() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/Dup.hsl", &sig("First"));
        write(tmp.path(), "b/Dup.hsl", &sig("Second"));

        let cfg = Config {
            stem_scope: StemScope::Directory,
            ..Config::default()
        };
        let index = build_index(tmp.path(), &cfg).unwrap();
        let names: Vec<_> = index.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn brace_mode_flows_into_extraction() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Inline.hsl", "function Quick(a) Num {\n}\n");

        assert!(build_index(tmp.path(), &Config::default()).unwrap().is_empty());

        let mut cfg = Config::default();
        cfg.extract.brace_mode = BraceMode::SameLine;
        assert_eq!(build_index(tmp.path(), &cfg).unwrap().len(), 1);
    }

    #[test]
    fn filter_is_case_insensitive_with_or_terms() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "Mix.hsl",
            &format!("{}{}{}", sig("PumpInit"), sig("ArmMove"), sig("Reset")),
        );
        let index = build_index(tmp.path(), &Config::default()).unwrap();
        assert_eq!(index.len(), 3);

        let names = |i: &Index| i.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&index.filter("pump")), ["PumpInit"]);
        assert_eq!(names(&index.filter("PUMP | move")), ["PumpInit", "ArmMove"]);
        assert_eq!(index.filter("  ").len(), 3);
        assert!(index.filter("zzz").is_empty());
    }
}
