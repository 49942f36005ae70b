use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-name conventions of a Hamilton library tree.
///
/// Extensions are stored without the leading dot and compared
/// ASCII-case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Authoritative extension when several files share a stem.
    pub primary: String,
    /// Textual alternates, highest precedence first.
    pub sources: Vec<String>,
    /// Extension of companion help documents.
    pub help: String,
    /// Files whose name starts with this are editor backups / temp files.
    pub reserved_prefix: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            primary: "hsl".to_string(),
            sources: vec!["hs_".to_string(), "hsi".to_string()],
            help: "chm".to_string(),
            reserved_prefix: "~".to_string(),
        }
    }
}

impl ExtensionConfig {
    /// Precedence rank of `ext` (0 = primary), or `None` when not eligible.
    pub fn rank(&self, ext: &str) -> Option<usize> {
        std::iter::once(&self.primary)
            .chain(self.sources.iter())
            .position(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn is_help(&self, ext: &str) -> bool {
        self.help.eq_ignore_ascii_case(ext)
    }

    pub fn is_reserved(&self, file_name: &str) -> bool {
        !self.reserved_prefix.is_empty() && file_name.starts_with(self.reserved_prefix.as_str())
    }
}

/// Where the block-opening `{` may sit relative to the signature.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BraceMode {
    /// `{` must start after a line break (`function F() Num\n{`).
    #[default]
    NextLine,
    /// Any whitespace before `{`, including none on the same line.
    SameLine,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub brace_mode: BraceMode,
}

/// Controls directory walking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory *names* to skip anywhere in the tree (e.g. ".git", "Backup").
    ///
    /// These are compared against path components, not full paths.
    pub exclude_dir_names: Vec<String>,
    /// Honour `.gitignore` / `.ignore` files and skip hidden entries.
    pub respect_ignore_files: bool,
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dir_names: vec![".git".to_string()],
            respect_ignore_files: false,
            follow_links: false,
        }
    }
}

/// How stems from different directories relate to each other.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StemScope {
    /// One interpretation per stem name across the whole tree; later wins.
    #[default]
    Global,
    /// Stems are only grouped within their own directory.
    Directory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extensions: ExtensionConfig,
    pub extract: ExtractConfig,
    /// Settings that govern file discovery and exclusion.
    pub scan: ScanConfig,
    pub stem_scope: StemScope,
}

pub const DEFAULT_CONFIG_FILE: &str = ".hslfind.json";

/// Load configuration.
///
/// An explicit path must exist and parse. Without one, `.hslfind.json` in
/// `cwd` is used when present; a malformed file there falls back to defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        return serde_json::from_str::<Config>(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()));
    }

    let primary = cwd.join(DEFAULT_CONFIG_FILE);
    let Ok(text) = std::fs::read_to_string(&primary) else {
        return Ok(Config::default());
    };

    Ok(serde_json::from_str::<Config>(&text).unwrap_or_else(|e| {
        tracing::warn!(path = %primary.display(), error = %e, "ignoring malformed config");
        Config::default()
    }))
}
